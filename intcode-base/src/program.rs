//! Program source parser.
//!
//! # Examples
//!
//! ```
//! # use intcode_base::program::{Program, ParseError, ParseErrorKind};
//! let program = Program::parse("1,9,10,3,2,3,11,0,99,30,40,50").unwrap();
//! assert_eq!(program.words(), &[1, 9, 10, 3, 2, 3, 11, 0, 99, 30, 40, 50]);
//!
//! assert_eq!(
//!     Program::parse("1,x,99"),
//!     Err(ParseError { kind: ParseErrorKind::InvalidNumber, index: 1, start: 2, end: 3 })
//! );
//! ```

use core::{fmt, str::FromStr};
use alloc::vec::Vec;

use thiserror::Error;

/// Intcode program. Initial contents of memory from address `0`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Program(Vec<i64>);

impl Program {
    pub fn new(words: Vec<i64>) -> Self {
        Self(words)
    }

    /// Parses comma separated signed integers. Each token is trimmed, a source
    /// that is empty after trimming gives an empty program.
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Ok(Self::default());
        }
        // positions are reported relative to `source`
        let lead = source.len() - source.trim_start().len();

        let mut words = Vec::new();
        let mut start = lead;
        for (index, token) in trimmed.split(',').enumerate() {
            let end = start + token.len();
            let value = token.trim();
            if value.is_empty() {
                return Err(ParseError { kind: ParseErrorKind::EmptyToken, index, start, end });
            }
            match value.parse::<i64>() {
                Ok(v) => words.push(v),
                Err(_) => {
                    return Err(ParseError { kind: ParseErrorKind::InvalidNumber, index, start, end });
                }
            }
            start = end + 1;
        }

        Ok(Self(words))
    }

    pub fn words(&self) -> &[i64] {
        &self.0
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn into_inner(self) -> Vec<i64> {
        self.0
    }
}

impl FromStr for Program {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Vec<i64>> for Program {
    fn from(v: Vec<i64>) -> Self {
        Self(v)
    }
}
impl From<&[i64]> for Program {
    fn from(v: &[i64]) -> Self {
        Self(v.to_vec())
    }
}
impl AsRef<[i64]> for Program {
    fn as_ref(&self) -> &[i64] {
        &self.0
    }
}

/// Renders the program back to source text.
///
/// ```
/// # use intcode_base::program::Program;
/// let program = Program::from(vec![1105, 1, -7, 99]);
/// assert_eq!(program.to_string(), "1105,1,-7,99");
/// ```
impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words = self.0.iter();
        if let Some(first) = words.next() {
            write!(f, "{first}")?;
        }
        for word in words {
            write!(f, ",{word}")?;
        }
        Ok(())
    }
}

/// Represents error that may occurs while parsing.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at token #{index} ({start}..{end})")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// Index of the comma separated token
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// Represents a error kind that may occur while parsing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Nothing between two commas
    #[error("empty token")]
    EmptyToken,
    /// Token is not a signed 64-bit integer
    #[error("invalid number")]
    InvalidNumber,
}
