//! Drivers that wire several runners together.
//!
//! Every instance runs its own copy of the program. Instances talk only through
//! [`Pipe`]s: output of instance `i` is input of instance `i + 1`.
//!
//! ```
//! # use intcode_base::{network, program::Program};
//! let program: Program = "3,15,3,16,1002,16,10,16,1,16,15,15,4,15,99,0,0".parse().unwrap();
//!
//! assert_eq!(network::run_chain(&program, &[4, 3, 2, 1, 0]), Ok(43210));
//! ```

use alloc::vec::Vec;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    io::Pipe,
    program::Program,
    runner::{ExecError, Runner},
};

/// Runs one instance per phase setting, one after another. Every instance
/// reads its phase and then the output of the previous one (`0` for the
/// first). Returns output of the last instance.
pub fn run_chain(program: &Program, phases: &[i64]) -> Result<i64, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::Empty);
    }

    let mut signal = 0;
    for (index, phase) in phases.iter().enumerate() {
        let input = Pipe::with_values([*phase, signal]);
        let output = Pipe::new();

        Runner::new(program)
            .with_input(input)
            .with_output(output.clone())
            .run()
            .map_err(|source| NetworkError::Exec { index, source })?;

        signal = output.drain().pop().ok_or(NetworkError::NoOutput { index })?;
        trace!(index, phase, signal, "chain stage finished");
    }

    Ok(signal)
}

/// Runs instances in a ring, the last one feeding the first.
///
/// Each input pipe starts with its phase setting, the first one also gets `0`.
/// Instances are advanced round-robin; an instance is left alone while it waits
/// for input that is not there yet. When the last instance halts the value
/// waiting in the first pipe is returned.
///
/// ```
/// # use intcode_base::{network, program::Program};
/// let program: Program = "3,26,1001,26,-4,26,3,27,1002,27,2,27,1,27,26,\
///     27,4,27,1001,28,-1,28,1005,28,6,99,0,0,5".parse().unwrap();
///
/// assert_eq!(network::run_feedback_loop(&program, &[9, 8, 7, 6, 5]), Ok(139629729));
/// ```
pub fn run_feedback_loop(program: &Program, phases: &[i64]) -> Result<i64, NetworkError> {
    if phases.is_empty() {
        return Err(NetworkError::Empty);
    }

    let count = phases.len();
    let pipes: Vec<Pipe> = phases.iter().map(|phase| Pipe::with_values([*phase])).collect();
    pipes[0].push(0);

    let mut amps: Vec<Runner> = (0..count)
        .map(|idx| {
            Runner::new(program)
                .with_input(pipes[idx].clone())
                .with_output(pipes[(idx + 1) % count].clone())
        })
        .collect();

    let mut rounds = 0usize;
    loop {
        rounds += 1;
        let mut progressed = false;
        for (index, amp) in amps.iter_mut().enumerate() {
            let steps = drive(amp, &pipes[index]).map_err(|source| NetworkError::Exec { index, source })?;
            progressed |= steps > 0;
        }
        trace!(rounds, progressed, "feedback round finished");

        if amps[count - 1].is_halted() {
            debug!(rounds, "feedback loop halted");
            return pipes[0].pop().ok_or(NetworkError::NoOutput { index: count - 1 });
        }
        if !progressed {
            return Err(NetworkError::Deadlock);
        }
    }
}

/// Resumes `amp` until it halts or waits for input `pipe` cannot give.
/// Returns count of suspensions passed.
fn drive(amp: &mut Runner, pipe: &Pipe) -> Result<usize, ExecError> {
    let mut steps = 0;
    while !amp.is_halted() {
        if amp.is_awaiting_input() && pipe.is_empty() {
            break;
        }
        amp.resume()?;
        steps += 1;
    }

    Ok(steps)
}

/// Represents error that may occur while driving several instances.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("no phase settings given")]
    Empty,
    #[error("instance #{index} failed: {source}")]
    Exec {
        index: usize,
        #[source]
        source: ExecError,
    },
    #[error("instance #{index} produced no output")]
    NoOutput { index: usize },
    /// Every instance waits for input, and no one can provide it
    #[error("every instance is waiting for input")]
    Deadlock,
}
