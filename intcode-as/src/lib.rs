//! # Intcode assembler
//!
//! Source goes through 3 stages, like in any other assembler:
//!
//! 1. [`lex`] -- splits text to [`lex::Token`]s.
//! 2. [`tree`] -- groups tokens of every line to a [`tree::SyntaxItem`].
//! 3. [`writer`] -- assigns offsets to labels and variables, then emits intcode.
//!
//! [`assemble`] runs all of them.
//!
//! # Syntax
//!
//! ```text
//! # comment
//! var name          # memory cell, starts with 0
//! var name = -12    # or a number
//! var name = other  # name is not resolved, it also starts with 0
//! label:
//! add name 1 -> name
//! ```
//!
//! Numbers and `@label`s are passed in immediate mode, bare names are variables
//! in position mode. Destinations are written as `-> variable`. If a program
//! has variables, it starts with a jump to its first instruction, so
//! variables can be declared right at the top.
//!
//! # Example
//! ```
//! # use intcode_base::runner::Runner;
//! let source = "
//!     var x
//!     in -> x
//!     mul x x -> x
//!     out x
//!     end
//! ";
//! let program = intcode_as::assemble(source).unwrap();
//! assert_eq!(program.words(), &[1105, 1, 4, 0, 3, 3, 2, 3, 3, 3, 4, 3, 99]);
//!
//! let mut output = Vec::new();
//! Runner::new(&program)
//!     .with_input(|| 12)
//!     .with_output(|v| output.push(v))
//!     .run()
//!     .unwrap();
//! assert_eq!(output, [144]);
//! ```

#![cfg_attr(feature = "no-std", no_std)]
extern crate alloc;

use alloc::vec::Vec;

use intcode_base::program::Program;
use thiserror::Error;
use tracing::debug;

/// Lexer implementation
pub mod lex;
/// Syntax tree implementation
pub mod tree;
/// Writer to intcode
pub mod writer;

use crate::{lex::Lex, tree::SyntaxTree, writer::Context};

/// Assembles source text to a program.
pub fn assemble(source: &str) -> Result<Program, Error<'_>> {
    let tokens = Lex::new(source).collect::<Result<Vec<_>, _>>()?;
    let tree = SyntaxTree::new(&tokens)?;
    let ctx = Context::new().populate(&tree.0)?;
    let words = ctx.generate(&tree.0)?;

    debug!(
        statements = tree.0.len(),
        labels = ctx.labels.len(),
        variables = ctx.variables.len(),
        words = words.len(),
        "program assembled"
    );

    Ok(Program::new(words))
}

/// Error of any assembler stage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error<'a> {
    #[error(transparent)]
    Lex(#[from] lex::Error),
    // borrowed errors can not be a `source()`, so no `#[from]` here
    #[error("{0}")]
    Syntax(tree::SyntaxError<'a>),
    #[error("{0}")]
    Bytecode(writer::BytecodeError<'a>),
}

impl<'a> From<tree::SyntaxError<'a>> for Error<'a> {
    fn from(e: tree::SyntaxError<'a>) -> Self {
        Self::Syntax(e)
    }
}

impl<'a> From<writer::BytecodeError<'a>> for Error<'a> {
    fn from(e: writer::BytecodeError<'a>) -> Self {
        Self::Bytecode(e)
    }
}

impl Error<'_> {
    /// Line where error occurred.
    pub fn line(&self) -> usize {
        match self {
            Self::Lex(e) => e.line,
            Self::Syntax(e) => e.line,
            Self::Bytecode(e) => e.line,
        }
    }
}
