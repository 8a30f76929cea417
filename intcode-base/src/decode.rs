//! Instruction decoder.
//!
//! Turns the instruction word at the instruction pointer, and the parameter
//! words after it, into an [`Expression`].
//!
//! # Examples
//!
//! ```
//! # use intcode_base::{decode::*, memory::Memory, opcode::OPCodeKind};
//! let memory = Memory::new(vec![1002, 4, 3, 4, 33]);
//! let mut ip = 0;
//!
//! let expr = decode(&memory, &mut ip, 0).unwrap();
//!
//! assert_eq!(expr.kind, OPCodeKind::Mul);
//! assert_eq!(expr.values(), &[33, 3]);
//! assert_eq!(expr.dest.map(|d| d.resolve(0)), Some(Ok(4)));
//! assert_eq!(ip, 4);
//! ```

use crate::{
    memory::Memory,
    opcode::{OPCodeKind, ParamKind, MAX_PARAMS},
    runner::{ExecError, ExecErrorKind},
};

/// Parameter addressing mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum ParamMode {
    /// Parameter is an address
    Position = 0,
    /// Parameter is the value itself
    Immediate = 1,
    /// Parameter is an offset from relative base
    Relative = 2,
}

impl ParamMode {
    pub fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Self::Position),
            1 => Some(Self::Immediate),
            2 => Some(Self::Relative),
            _ => None,
        }
    }
}

/// Raw instruction word: opcode in two low decimal digits, parameter modes above.
///
/// ```
/// # use intcode_base::decode::{InstructionWord, ParamMode};
/// let word = InstructionWord(21107);
///
/// assert_eq!(word.opcode(), 7);
/// assert_eq!(word.mode(0), Ok(ParamMode::Immediate));
/// assert_eq!(word.mode(1), Ok(ParamMode::Immediate));
/// assert_eq!(word.mode(2), Ok(ParamMode::Relative));
/// assert_eq!(word.mode(3), Ok(ParamMode::Position)); // not stated
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct InstructionWord(pub i64);

impl InstructionWord {
    #[inline]
    pub fn opcode(self) -> i64 {
        self.0 % 100
    }
    /// Mode digit of parameter `idx`, zero when not stated.
    pub fn mode_digit(self, idx: usize) -> i64 {
        u32::try_from(idx + 2)
            .ok()
            .and_then(|exp| 10i64.checked_pow(exp))
            .map_or(0, |div| self.0 / div % 10)
    }
    /// Mode of parameter `idx`. Returns the digit itself if it is not a known mode.
    pub fn mode(self, idx: usize) -> Result<ParamMode, i64> {
        let digit = self.mode_digit(idx);
        ParamMode::from_digit(digit).ok_or(digit)
    }
}

/// Destination parameter, not resolved yet.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Destination {
    /// [`ParamMode::Position`] or [`ParamMode::Relative`]
    pub mode: ParamMode,
    pub raw: i64,
}

impl Destination {
    /// Resolves to an address using relative base. On failure returns the
    /// (negative) address that could not be used.
    pub fn resolve(self, relative_base: i64) -> Result<usize, i64> {
        let address = match self.mode {
            ParamMode::Relative => relative_base.saturating_add(self.raw),
            _ => self.raw,
        };
        usize::try_from(address).map_err(|_| address)
    }
}

/// Fully decoded instruction.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Expression {
    pub kind: OPCodeKind,
    /// Address of instruction word
    pub address: usize,
    values: [i64; MAX_PARAMS],
    values_len: usize,
    pub dest: Option<Destination>,
}

impl Expression {
    /// Resolved [`ParamKind::Value`] parameters.
    pub fn values(&self) -> &[i64] {
        &self.values[..self.values_len]
    }
}

/// Converts a resolved address to memory index.
fn address(address: i64, at: usize) -> Result<usize, ExecError> {
    usize::try_from(address).map_err(|_| ExecError {
        kind: ExecErrorKind::NegativeAddress(address),
        address: at,
    })
}

/// Decodes instruction at `*ip` and moves `ip` past it.
///
/// Instruction word and all of its parameters must lie inside the dense part
/// of memory (see [`Memory::len`]).
pub fn decode(memory: &Memory, ip: &mut usize, relative_base: i64) -> Result<Expression, ExecError> {
    let start = *ip;
    if start >= memory.len() {
        return Err(ExecError {
            kind: ExecErrorKind::HaltedAccess,
            address: start,
        });
    }

    let word = InstructionWord(memory.get(start));
    *ip += 1;

    let Some(kind) = OPCodeKind::from_raw(word.opcode()) else {
        return Err(ExecError {
            kind: ExecErrorKind::InvalidOpcode(word.0),
            address: start,
        });
    };

    let mut expr = Expression {
        kind,
        address: start,
        values: [0; MAX_PARAMS],
        values_len: 0,
        dest: None,
    };

    for (idx, param) in kind.params().iter().enumerate() {
        if *ip >= memory.len() {
            return Err(ExecError {
                kind: ExecErrorKind::IncompleteInstruction,
                address: start,
            });
        }
        let raw = memory.get(*ip);
        *ip += 1;

        let mode = word.mode(idx).map_err(|digit| ExecError {
            kind: ExecErrorKind::InvalidParamMode(digit),
            address: start,
        })?;

        match param {
            ParamKind::Value => {
                let value = match mode {
                    ParamMode::Position => memory.get(address(raw, start)?),
                    ParamMode::Immediate => raw,
                    ParamMode::Relative => memory.get(address(relative_base.saturating_add(raw), start)?),
                };
                expr.values[expr.values_len] = value;
                expr.values_len += 1;
            }
            ParamKind::Dest => {
                if mode == ParamMode::Immediate {
                    return Err(ExecError {
                        kind: ExecErrorKind::InvalidParamMode(mode as i64),
                        address: start,
                    });
                }
                expr.dest = Some(Destination { mode, raw });
            }
        }
    }

    Ok(expr)
}
