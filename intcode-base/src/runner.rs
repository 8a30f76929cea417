//! Simple portable intcode runner
//!
//! It decodes instructions from [`Memory`] and runs them, suspending around
//! every input and output. See [`Runner`] docs for more.

use core::mem;
use alloc::boxed::Box;

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    decode::{self, Expression},
    io::{InputSource, OutputSink},
    memory::Memory,
    opcode::{Effect, IoClass},
    program::Program,
};

/// Why runner stopped and gave control back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum YieldReason {
    /// Next instruction is `in`. It reads input on next [`Runner::resume`].
    AboutToInput,
    /// `in` was executed
    AfterInput,
    /// Next instruction is `out`. It writes output on next [`Runner::resume`].
    AboutToOutput,
    /// `out` was executed
    AfterOutput,
    /// `end` was executed, nothing more to run
    Halted,
}

/// Returned by [`Runner::resume`]: reason and memory at the moment of suspension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Suspension<'a> {
    pub reason: YieldReason,
    pub memory: &'a Memory,
}

#[derive(Clone, Debug)]
enum State {
    Running,
    /// Decoded I/O instruction waiting for the next resume
    Pending(Expression),
    Halted,
    Faulted(ExecError),
}

/// Intcode simple runner
///
/// Runner owns a copy of program memory, the instruction pointer and
/// relative base. It executes instructions until it reaches a suspension
/// point: right before and right after `in`/`out`, and `end`.
///
/// # Example
/// ```
/// # use intcode_base::{runner::{Runner, YieldReason}, program::Program, io::Pipe};
/// #
/// let program: Program = "3,0,4,0,99".parse().unwrap(); // echo
/// let input = Pipe::new();
/// let mut output = Vec::new();
///
/// let mut runner = Runner::new(&program)
///     .with_input(input.clone())
///     .with_output(|v| output.push(v));
///
/// // runner stops before `in`, so there is a chance to provide input
/// assert_eq!(runner.resume().unwrap().reason, YieldReason::AboutToInput);
/// input.push(42);
///
/// loop {
///     let reason = runner.resume().unwrap().reason;
///     if reason == YieldReason::Halted {
///         break;
///     }
/// }
/// let memory = runner.into_memory();
/// assert_eq!(memory.get(0), 42);
/// assert_eq!(output, [42]);
/// ```
pub struct Runner<'a> {
    memory: Memory,
    ip: usize,
    relative_base: i64,
    state: State,
    input: Option<Box<dyn InputSource + 'a>>,
    output: Option<Box<dyn OutputSink + 'a>>,
}

impl<'a> Runner<'a> {
    /// Creates new runner. Memory is copied from the program.
    pub fn new(program: &Program) -> Self {
        debug!(len = program.len(), "runner created");
        Self {
            memory: Memory::from(program),
            ip: 0,
            relative_base: 0,
            state: State::Running,
            input: None,
            output: None,
        }
    }

    /// Attaches input source, builder style.
    pub fn with_input(mut self, input: impl InputSource + 'a) -> Self {
        self.connect_input(input);
        self
    }
    /// Attaches output sink, builder style.
    pub fn with_output(mut self, output: impl OutputSink + 'a) -> Self {
        self.connect_output(output);
        self
    }
    pub fn connect_input(&mut self, input: impl InputSource + 'a) {
        self.input = Some(Box::new(input));
    }
    pub fn connect_output(&mut self, output: impl OutputSink + 'a) {
        self.output = Some(Box::new(output));
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }
    pub fn into_memory(self) -> Memory {
        self.memory
    }
    pub fn instruction_pointer(&self) -> usize {
        self.ip
    }
    pub fn relative_base(&self) -> i64 {
        self.relative_base
    }
    pub fn is_halted(&self) -> bool {
        matches!(self.state, State::Halted)
    }
    /// `true` if runner stopped at [`YieldReason::AboutToInput`] and next
    /// resume will read input.
    pub fn is_awaiting_input(&self) -> bool {
        matches!(&self.state, State::Pending(expr) if expr.kind.io_class() == IoClass::Input)
    }

    /// Runs until next suspension point.
    ///
    /// After [`YieldReason::Halted`] every call returns [`YieldReason::Halted`]
    /// again. After an error every call returns the same error.
    ///
    /// ```
    /// # use intcode_base::{runner::*, program::Program};
    /// #
    /// let program = Program::from(vec![4, 3, 99, -7]);
    /// let mut output = None;
    /// let mut runner = Runner::new(&program).with_output(|v| output = Some(v));
    ///
    /// let reasons: Vec<_> = (0..4).map(|_| runner.resume().map(|s| s.reason)).collect();
    /// assert_eq!(reasons, [
    ///     Ok(YieldReason::AboutToOutput),
    ///     Ok(YieldReason::AfterOutput),
    ///     Ok(YieldReason::Halted),
    ///     Ok(YieldReason::Halted),
    /// ]);
    /// drop(runner);
    /// assert_eq!(output, Some(-7));
    /// ```
    pub fn resume(&mut self) -> Result<Suspension<'_>, ExecError> {
        let reason = match mem::replace(&mut self.state, State::Running) {
            State::Halted => {
                self.state = State::Halted;
                YieldReason::Halted
            }
            State::Faulted(e) => {
                self.state = State::Faulted(e.clone());
                return Err(e);
            }
            State::Pending(expr) => match self.execute(&expr) {
                Ok(()) if expr.kind.io_class() == IoClass::Input => YieldReason::AfterInput,
                Ok(()) => YieldReason::AfterOutput,
                Err(e) => return Err(self.fault(e)),
            },
            State::Running => match self.advance() {
                Ok(reason) => reason,
                Err(e) => return Err(self.fault(e)),
            },
        };

        trace!(?reason, ip = self.ip, relative_base = self.relative_base, "suspended");
        if reason == YieldReason::Halted {
            debug!(ip = self.ip, "runner halted");
        }

        Ok(Suspension {
            reason,
            memory: &self.memory,
        })
    }

    /// Runs program to the end and returns final memory.
    ///
    /// ```
    /// # use intcode_base::{runner::Runner, program::Program};
    /// let program: Program = "1,9,10,3,2,3,11,0,99,30,40,50".parse().unwrap();
    /// let memory = Runner::new(&program).run().unwrap();
    ///
    /// assert_eq!(memory.as_slice(), &[3500, 9, 10, 70, 2, 3, 11, 0, 99, 30, 40, 50]);
    /// ```
    pub fn run(mut self) -> Result<Memory, ExecError> {
        while self.resume()?.reason != YieldReason::Halted {}

        Ok(self.memory)
    }

    fn fault(&mut self, e: ExecError) -> ExecError {
        debug!(error = %e, "runner faulted");
        self.state = State::Faulted(e.clone());
        e
    }

    /// Executes instructions until one of them needs suspension.
    fn advance(&mut self) -> Result<YieldReason, ExecError> {
        loop {
            let expr = decode::decode(&self.memory, &mut self.ip, self.relative_base)?;

            match expr.kind.io_class() {
                IoClass::Input => {
                    self.state = State::Pending(expr);
                    return Ok(YieldReason::AboutToInput);
                }
                IoClass::Output => {
                    self.state = State::Pending(expr);
                    return Ok(YieldReason::AboutToOutput);
                }
                IoClass::Internal => {
                    self.execute(&expr)?;
                    if self.is_halted() {
                        return Ok(YieldReason::Halted);
                    }
                }
            }
        }
    }

    fn execute(&mut self, expr: &Expression) -> Result<(), ExecError> {
        match expr.kind.apply(expr.values()) {
            Effect::Write(v) => self.write_dest(expr, v)?,
            Effect::Input => {
                let Some(input) = self.input.as_mut() else {
                    return Err(ExecError {
                        kind: ExecErrorKind::InputNotConnected,
                        address: expr.address,
                    });
                };
                let Some(v) = input.read() else {
                    return Err(ExecError {
                        kind: ExecErrorKind::InputExhausted,
                        address: expr.address,
                    });
                };
                self.write_dest(expr, v)?;
            }
            Effect::Output(v) => {
                if let Some(output) = self.output.as_mut() {
                    output.write(v);
                }
            }
            Effect::Jump(target) => {
                self.ip = usize::try_from(target).map_err(|_| ExecError {
                    kind: ExecErrorKind::NegativeAddress(target),
                    address: expr.address,
                })?;
            }
            Effect::AdjustBase(v) => self.relative_base = self.relative_base.wrapping_add(v),
            Effect::Halt => self.state = State::Halted,
            Effect::Idle => {}
        }

        Ok(())
    }

    fn write_dest(&mut self, expr: &Expression, v: i64) -> Result<(), ExecError> {
        let Some(dest) = expr.dest else {
            return Err(ExecError {
                kind: ExecErrorKind::MissingDestination,
                address: expr.address,
            });
        };
        let address = dest.resolve(self.relative_base).map_err(|address| ExecError {
            kind: ExecErrorKind::NegativeAddress(address),
            address: expr.address,
        })?;
        self.memory.set(address, v);

        Ok(())
    }
}

/// Yields suspension reasons up to and including [`YieldReason::Halted`] or
/// the first error.
///
/// ```
/// # use intcode_base::{runner::*, program::Program};
/// let program = Program::from(vec![104, 1, 104, 2, 99]);
/// let reasons: Result<Vec<_>, _> = Runner::new(&program).collect();
///
/// assert_eq!(reasons.unwrap(), [
///     YieldReason::AboutToOutput, YieldReason::AfterOutput,
///     YieldReason::AboutToOutput, YieldReason::AfterOutput,
///     YieldReason::Halted,
/// ]);
/// ```
impl Iterator for Runner<'_> {
    type Item = Result<YieldReason, ExecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if matches!(self.state, State::Halted | State::Faulted(_)) {
            return None;
        }
        Some(self.resume().map(|s| s.reason))
    }
}

/// Runs program without input and output connected.
pub fn run(program: &Program) -> Result<Memory, ExecError> {
    Runner::new(program).run()
}

/// Represents error that may occurs while running.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} @ {address}")]
pub struct ExecError {
    pub kind: ExecErrorKind,
    /// Address of instruction that failed
    pub address: usize,
}

/// Represents a error kind that may occur while running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ExecErrorKind {
    /// Opcode is not in instruction set
    #[error("invalid opcode in instruction word {0}")]
    InvalidOpcode(i64),
    /// Parameter mode digit is not 0, 1 or 2, or destination is immediate
    #[error("invalid parameter mode {0}")]
    InvalidParamMode(i64),
    /// `in` executed without input source
    #[error("input is not connected")]
    InputNotConnected,
    /// Input source has no more values
    #[error("input is exhausted")]
    InputExhausted,
    /// Memory ends in the middle of instruction
    #[error("incomplete instruction")]
    IncompleteInstruction,
    /// Instruction pointer went past the end of program without `end`
    #[error("instruction pointer is past the end of program")]
    HaltedAccess,
    #[error("negative address {0}")]
    NegativeAddress(i64),
    /// Instruction produced a value but has no destination parameter
    #[error("instruction has no destination")]
    MissingDestination,
}

#[cfg(test)]
#[rustfmt::skip]
mod tests {
    use alloc::{collections::VecDeque, string::ToString, vec, vec::Vec};
    use super::*;
    use crate::io::Pipe;

    fn program(words: &[i64]) -> Program {
        Program::from(words)
    }

    fn run_with_input(words: &[i64], input: i64) -> Vec<i64> {
        let mut output = Vec::new();
        Runner::new(&program(words))
            .with_input(move || input)
            .with_output(|v| output.push(v))
            .run()
            .unwrap();
        output
    }

    #[test]
    fn validate_memory() {
        let cases: [(&[i64], &[i64]); 5] = [
            (&[1, 0, 0, 0, 99],              &[2, 0, 0, 0, 99]),
            (&[2, 3, 0, 3, 99],              &[2, 3, 0, 6, 99]),
            (&[2, 4, 4, 5, 99, 0],           &[2, 4, 4, 5, 99, 9801]),
            (&[1, 1, 1, 4, 99, 5, 6, 0, 99], &[30, 1, 1, 4, 2, 5, 6, 0, 99]),
            (&[1002, 4, 3, 4, 33],           &[1002, 4, 3, 4, 99]),
        ];

        for (words, expected) in cases {
            let memory = run(&program(words)).unwrap();
            assert_eq!(memory.as_slice(), expected, "program: {words:?}");
        }
    }

    #[test]
    fn determinism() {
        let p = program(&[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
        assert_eq!(run(&p), run(&p));
    }

    #[test]
    fn comparisons() {
        let cases: [(&[i64], i64, i64); 8] = [
            (&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], 8, 1), // position, input == 8
            (&[3, 9, 8, 9, 10, 9, 4, 9, 99, -1, 8], 3, 0),
            (&[3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8], 3, 1), // position, input < 8
            (&[3, 9, 7, 9, 10, 9, 4, 9, 99, -1, 8], 8, 0),
            (&[3, 3, 1108, -1, 8, 3, 4, 3, 99],     8, 1), // immediate, input == 8
            (&[3, 3, 1108, -1, 8, 3, 4, 3, 99],     3, 0),
            (&[3, 3, 1107, -1, 8, 3, 4, 3, 99],     3, 1), // immediate, input < 8
            (&[3, 3, 1107, -1, 8, 3, 4, 3, 99],     8, 0),
        ];

        for (words, input, expected) in cases {
            assert_eq!(run_with_input(words, input), vec![expected], "program: {words:?}, input: {input}");
        }
    }

    #[test]
    fn jumps() {
        let position = [3, 12, 6, 12, 15, 1, 13, 14, 13, 4, 13, 99, -1, 0, 1, 9];
        let immediate = [3, 3, 1105, -1, 9, 1101, 0, 0, 12, 4, 12, 99, 1];

        for words in [&position[..], &immediate[..]] {
            assert_eq!(run_with_input(words, 0), vec![0]);
            assert_eq!(run_with_input(words, 5), vec![1]);
        }
    }

    #[test]
    fn larger_example() {
        let words = [
            3, 21, 1008, 21, 8, 20, 1005, 20, 22, 107, 8, 21, 20, 1006, 20, 31, 1106, 0, 36, 98, 0,
            0, 1002, 21, 125, 20, 4, 20, 1105, 1, 46, 104, 999, 1105, 1, 46, 1101, 1000, 1, 20, 4,
            20, 1105, 1, 46, 98, 99,
        ];

        assert_eq!(run_with_input(&words, 7), vec![999]);
        assert_eq!(run_with_input(&words, 8), vec![1000]);
        assert_eq!(run_with_input(&words, 9), vec![1001]);
    }

    #[test]
    fn quine() {
        let words = [109, 1, 204, -1, 1001, 100, 1, 100, 1008, 100, 16, 101, 1006, 101, 0, 99];
        let mut output = Vec::new();
        let memory = Runner::new(&program(&words))
            .with_output(|v| output.push(v))
            .run()
            .unwrap();

        assert_eq!(output, words);
        assert_eq!(memory.get(100), 16);
    }

    #[test]
    fn large_numbers() {
        let mut output = Vec::new();
        run_into(&[1102, 34915192, 34915192, 7, 4, 7, 99, 0], &mut output);
        assert_eq!(output.len(), 1);
        assert_eq!(output[0].to_string().len(), 16);

        output.clear();
        run_into(&[104, 1125899906842624, 99], &mut output);
        assert_eq!(output, vec![1125899906842624]);
    }

    fn run_into(words: &[i64], output: &mut Vec<i64>) {
        Runner::new(&program(words))
            .with_output(|v| output.push(v))
            .run()
            .unwrap();
    }

    #[test]
    fn relative_writes() {
        // rbs 10; in -> [base+0]; out [base+0]; end
        let words = [109, 10, 203, 0, 204, 0, 99];
        assert_eq!(run_with_input(&words, -3), vec![-3]);

        let memory = Runner::new(&program(&words)).with_input(|| 77).run().unwrap();
        assert_eq!(memory.get(10), 77);
        assert_eq!(memory.to_vec().len(), 11);
    }

    #[test]
    fn suspension_order() {
        let input = Pipe::with_values([4]);
        let output = Pipe::new();
        let mut runner = Runner::new(&program(&[3, 0, 4, 0, 99]))
            .with_input(input.clone())
            .with_output(output.clone());

        assert!(!runner.is_awaiting_input());
        assert_eq!(runner.resume().unwrap().reason, YieldReason::AboutToInput);
        assert!(runner.is_awaiting_input());

        let s = runner.resume().unwrap();
        assert_eq!((s.reason, s.memory.get(0)), (YieldReason::AfterInput, 4));
        assert!(input.is_empty());

        let s = runner.resume().unwrap();
        assert_eq!(s.reason, YieldReason::AboutToOutput);
        assert!(output.is_empty());
        assert_eq!(runner.resume().unwrap().reason, YieldReason::AfterOutput);
        assert_eq!(output.pop(), Some(4));

        assert_eq!(runner.resume().unwrap().reason, YieldReason::Halted);
        assert!(runner.is_halted());
        assert_eq!(runner.instruction_pointer(), 5);
        assert_eq!(runner.next(), None);
    }

    #[test]
    fn erroneous_runs() {
        let cases: [(&[i64], ExecErrorKind, usize); 7] = [
            (&[1, 0, 0, 0],      ExecErrorKind::HaltedAccess,          4),
            (&[],                ExecErrorKind::HaltedAccess,          0),
            (&[1, 0, 0, 0, 50],  ExecErrorKind::InvalidOpcode(50),     4),
            (&[301, 0, 0, 0],    ExecErrorKind::InvalidParamMode(3),   0),
            (&[3, 0, 99],        ExecErrorKind::InputNotConnected,     0),
            (&[1105, 1, -1],     ExecErrorKind::NegativeAddress(-1),   0),
            (&[1101, 1, 1],      ExecErrorKind::IncompleteInstruction, 0),
        ];

        for (words, kind, address) in cases {
            assert_eq!(run(&program(words)), Err(ExecError { kind, address }), "program: {words:?}");
        }

        let exhausted = Runner::new(&program(&[3, 0, 3, 0, 99]))
            .with_input(VecDeque::from(vec![1]))
            .run();
        assert_eq!(exhausted, Err(ExecError { kind: ExecErrorKind::InputExhausted, address: 2 }));
    }

    #[test]
    fn write_without_destination() {
        let p = program(&[1101, 1, 2, 0, 99]);
        let mut runner = Runner::new(&p);
        let mut ip = 0;
        let mut expr = decode::decode(&runner.memory, &mut ip, 0).unwrap();
        expr.dest = None;

        assert_eq!(runner.write_dest(&expr, 3), Err(ExecError { kind: ExecErrorKind::MissingDestination, address: 0 }));
        assert_eq!(runner.memory.get(0), 1101);
    }

    #[test]
    fn fault_is_sticky() {
        let p = program(&[42]);
        let mut runner = Runner::new(&p);
        let expected = Err(ExecError { kind: ExecErrorKind::InvalidOpcode(42), address: 0 });

        assert_eq!(runner.resume().map(|s| s.reason), expected);
        assert_eq!(runner.resume().map(|s| s.reason), expected);
        assert_eq!(runner.next(), None);
    }
}
