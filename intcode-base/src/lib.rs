//! # Intcode Virtual Machine
//!
//! This crate contains base things of intcode. A program goes through 4 stages
//! to be executed:
//!
//! 1. [`program`] -- parser stage. Parses comma separated source text to a [`Program`].
//! 2. [`memory`] -- virtual environment. Dense copy of the program plus sparse cells beyond it.
//! 3. [`decode`] -- splits instruction words into [`OPCodeKind`]s and parameter modes.
//! 4. [`runner`] -- executes decoded instructions and suspends around every input/output.
//!
//! [`network`] builds on top of stage 4 and wires several runners into chains and
//! feedback rings.
//!
//! # Example
//! Instruction list can be found in [`OPCodeKind`] enum.
//!
//! ```
//! # use intcode_base::{program::Program, runner::{Runner, YieldReason}};
//! #
//! // reads a value, doubles it, prints it
//! let program: Program = "3,9,1002,9,2,9,4,9,99,0".parse().unwrap();
//!
//! let mut output = Vec::new();
//! let memory = Runner::new(&program)
//!     .with_input(|| 21)
//!     .with_output(|v| output.push(v))
//!     .run()
//!     .unwrap();
//!
//! assert_eq!(output, [42]);
//! assert_eq!(memory.get(9), 42);
//! ```
//!
//! Step-wise execution yields a [`Suspension`] at every input/output boundary:
//!
//! ```
//! # use intcode_base::{program::Program, runner::{Runner, YieldReason}};
//! let program: Program = "104,7,99".parse().unwrap();
//! let mut runner = Runner::new(&program);
//!
//! assert_eq!(runner.resume().unwrap().reason, YieldReason::AboutToOutput);
//! assert_eq!(runner.resume().unwrap().reason, YieldReason::AfterOutput);
//! assert_eq!(runner.resume().unwrap().reason, YieldReason::Halted);
//! ```
//!
//! # Encoding
//!
//! Every instruction word stores its opcode in the two low decimal digits. The
//! digits above are parameter modes, one per parameter, starting at the hundreds.
//!
//! | Mode | Name      | Value parameter            | Destination parameter |
//! |------|-----------|----------------------------|-----------------------|
//! | 0    | position  | `mem[word]`                | writes `mem[word]`    |
//! | 1    | immediate | `word`                     | invalid               |
//! | 2    | relative  | `mem[base + word]`         | writes `mem[base + word]` |
//!
//! `base` is the relative base register, changed only by `rbs`.

#![cfg_attr(feature = "no-std", no_std)]
extern crate alloc;

// doc imports
#[allow(unused_imports)]
use {memory::*, opcode::*, program::*, runner::*};

pub mod decode;
pub mod io;
pub mod memory;
pub mod network;
pub mod opcode;
pub mod program;
pub mod runner;
