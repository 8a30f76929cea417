use alloc::vec::Vec;
use hashbrown::HashMap;
use thiserror::Error;

use intcode_base::{
    decode::ParamMode,
    opcode::{OPCodeKind, MAX_PARAMS},
};

use crate::tree::{Argument, Statement, SyntaxItem};

/// Cells taken by the jump over variable storage.
pub const HEADER_LEN: usize = 3;

/// Represents script context of known labels and variables.
///
/// Offsets are counted without header. Labels and variables live in separate
/// namespaces, so `done:` and `var done` do not clash.
///
/// # Example
/// ```
/// # use intcode_as::{writer::Context, tree::{Argument, Statement, SyntaxItem}};
/// # use intcode_base::opcode::OPCodeKind;
/// #
/// let items = [
///     SyntaxItem::Variable("x", 7),
///     SyntaxItem::Instruction(OPCodeKind::Out, [Argument::Variable("x"); 3]),
///     SyntaxItem::Instruction(OPCodeKind::End, [Argument::Number(0); 3]),
/// ].map(|item| Statement { line: 1, item });
///
/// let ctx = Context::new().populate(&items).unwrap();
///
/// assert_eq!(ctx.generate(&items), Ok(vec![
///     1105, 1, 4, // jump over `x`
///     7,          // x
///     4, 3,       // out x
///     99,         // end
/// ]));
/// ```
#[derive(Default, Clone, Debug)]
pub struct Context<'a> {
    pub labels: HashMap<&'a str, usize>,
    pub variables: HashMap<&'a str, usize>,

    /// Offset of first instruction
    pub code_start: Option<usize>,

    pub count: usize,
}

impl<'a> Context<'a> {
    /// Creates empty context
    pub fn new() -> Self {
        Default::default()
    }

    /// Populates context with declarations and moves offset past every item.
    /// It using builder pattern, so several item lists can be chained.
    ///
    /// # Example
    /// ```
    /// # use intcode_as::{writer::Context, tree::{Statement, SyntaxItem}};
    /// #
    /// let defs = [
    ///     SyntaxItem::Variable("a", 0),
    ///     SyntaxItem::Label("a"),
    ///     SyntaxItem::Variable("b", 2),
    /// ].map(|item| Statement { line: 1, item });
    ///
    /// let ctx = Context::new().populate(&defs).unwrap();
    ///
    /// assert_eq!(ctx.count, 2);
    /// assert_eq!(ctx.labels.get("a"), Some(&1));
    /// assert_eq!(ctx.variables.get("b"), Some(&1));
    /// ```
    pub fn populate<'b, I>(mut self, v: I) -> Result<Self, BytecodeError<'a>>
    where
        I: IntoIterator<Item = &'b Statement<'a>>,
        'a: 'b,
    {
        for Statement { line, item } in v {
            let line = *line;
            match item {
                SyntaxItem::Label(label) => {
                    if self.labels.insert(*label, self.count).is_some() {
                        return Err(BytecodeError {
                            line,
                            kind: BytecodeErrorKind::DuplicateLabel(*label),
                        });
                    }
                }
                SyntaxItem::Variable(var, _) => {
                    if self.variables.insert(*var, self.count).is_some() {
                        return Err(BytecodeError {
                            line,
                            kind: BytecodeErrorKind::DuplicateVariable(*var),
                        });
                    }
                }
                SyntaxItem::Instruction(_, _) => {
                    if self.code_start.is_none() {
                        self.code_start = Some(self.count);
                    }
                }
            }
            self.count += item.width();
        }

        Ok(self)
    }

    /// Offset added to every resolved address: [`HEADER_LEN`] if program has variables.
    pub fn jump_offset(&self) -> usize {
        if self.variables.is_empty() {
            0
        } else {
            HEADER_LEN
        }
    }

    /// Generates intcode by known context without mutating it.
    /// See more in [`Context`].
    pub fn generate<'b, I>(&self, v: I) -> Result<Vec<i64>, BytecodeError<'a>>
    where
        I: IntoIterator<Item = &'b Statement<'a>>,
        'a: 'b,
    {
        let mut buffer = Vec::with_capacity(self.count + self.jump_offset());

        if self.jump_offset() != 0 {
            // `1` is always true, so it is `goto code_start`
            let target = self.code_start.unwrap_or(self.count) + HEADER_LEN;
            buffer.push(instruction_word(OPCodeKind::Tjmp, &[true, true]));
            buffer.push(1);
            buffer.push(target as i64);
        }

        for Statement { line, item } in v {
            let line = *line;
            match item {
                SyntaxItem::Label(_) => {}

                SyntaxItem::Variable(_, value) => buffer.push(*value),

                SyntaxItem::Instruction(kind, _) => {
                    let args = item.instruction_args();

                    let mut immediate = [false; MAX_PARAMS];
                    for (idx, arg) in args.iter().enumerate() {
                        immediate[idx] = matches!(arg, Argument::Number(_) | Argument::Label(_));
                    }
                    buffer.push(instruction_word(*kind, &immediate[..args.len()]));

                    for arg in args {
                        buffer.push(match arg {
                            Argument::Number(v) => *v,
                            Argument::Label(label) => self.label(*label, line)?,
                            Argument::Variable(var) => self.variable(*var, line)?,
                        });
                    }
                }
            }
        }

        Ok(buffer)
    }

    fn label(&self, label: &'a str, line: usize) -> Result<i64, BytecodeError<'a>> {
        match self.labels.get(label) {
            Some(offset) => Ok((offset + self.jump_offset()) as i64),
            None => Err(BytecodeError {
                line,
                kind: BytecodeErrorKind::InvalidLabel(label),
            }),
        }
    }

    fn variable(&self, var: &'a str, line: usize) -> Result<i64, BytecodeError<'a>> {
        match self.variables.get(var) {
            Some(offset) => Ok((offset + self.jump_offset()) as i64),
            None => Err(BytecodeError {
                line,
                kind: BytecodeErrorKind::UndeclaredVariable(var),
            }),
        }
    }
}

/// Opcode plus an immediate mode digit for every `true` in `immediate`.
///
/// ```
/// # use intcode_as::writer::instruction_word;
/// # use intcode_base::opcode::OPCodeKind;
/// assert_eq!(instruction_word(OPCodeKind::Mul, &[false, true, false]), 1002);
/// assert_eq!(instruction_word(OPCodeKind::End, &[]), 99);
/// ```
pub fn instruction_word(kind: OPCodeKind, immediate: &[bool]) -> i64 {
    immediate
        .iter()
        .enumerate()
        .filter(|(_, imm)| **imm)
        .fold(kind.as_raw(), |word, (idx, _)| {
            word + ParamMode::Immediate as i64 * 10i64.pow(idx as u32 + 2)
        })
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind} at line {line}")]
pub struct BytecodeError<'a> {
    pub line: usize,
    pub kind: BytecodeErrorKind<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum BytecodeErrorKind<'a> {
    #[error("label `{0}` is declared twice")]
    DuplicateLabel(&'a str),
    #[error("variable `{0}` is declared twice")]
    DuplicateVariable(&'a str),
    #[error("unknown label `{0}`")]
    InvalidLabel(&'a str),
    #[error("undeclared variable `{0}`")]
    UndeclaredVariable(&'a str),
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use super::*;

    fn statements<'a, const N: usize>(items: [SyntaxItem<'a>; N]) -> Vec<Statement<'a>> {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, item)| Statement { line: idx + 1, item })
            .collect()
    }

    fn ins(kind: OPCodeKind, args: &[Argument<'static>]) -> SyntaxItem<'static> {
        let mut a = [Argument::Number(0); 3];
        a[..args.len()].copy_from_slice(args);
        SyntaxItem::Instruction(kind, a)
    }

    #[test]
    fn normal_fragment() {
        use Argument::{Label as L, Number as N, Variable as V};

        let items = statements([
            SyntaxItem::Label("start"),
            ins(OPCodeKind::In, &[V("x")]),
            SyntaxItem::Variable("x", -5),
            SyntaxItem::Variable("ptr", 0),
            SyntaxItem::Variable("back", 9),
            ins(OPCodeKind::Add, &[V("x"), N(2), V("x")]),
            ins(OPCodeKind::Tjmp, &[V("x"), L("start")]),
            ins(OPCodeKind::Lt, &[N(1), N(2), V("ptr")]),
            ins(OPCodeKind::End, &[]),
        ]);
        #[rustfmt::skip]
        let expected = vec![
            1105, 1, 3,        // header, code starts right away
            3, 5,              // start: in -> x
            -5, 0, 9,          // x, ptr, back
            1001, 5, 2, 5,     // add x 2 -> x
            1005, 5, 3,        // tjmp x @start
            1107, 1, 2, 6,     // lt 1 2 -> ptr
            99,
        ];

        let ctx = Context::new().populate(&items).unwrap();

        assert_eq!(ctx.count, 17);
        assert_eq!(ctx.code_start, Some(0));
        assert_eq!(ctx.generate(&items), Ok(expected));
    }

    #[test]
    fn without_variables() {
        let items = statements([
            SyntaxItem::Label("top"),
            ins(OPCodeKind::Out, &[Argument::Number(1)]),
            ins(OPCodeKind::Tjmp, &[Argument::Number(1), Argument::Label("top")]),
        ]);

        let ctx = Context::new().populate(&items).unwrap();

        assert_eq!(ctx.jump_offset(), 0);
        assert_eq!(ctx.generate(&items), Ok(vec![104, 1, 1105, 1, 0]));
    }

    #[test]
    fn instruction_words() {
        #[rustfmt::skip]
        let cases: [(OPCodeKind, &[bool], i64); 6] = [
            (OPCodeKind::Add,  &[false, false, false], 1),
            (OPCodeKind::Add,  &[true, true, false],   1101),
            (OPCodeKind::Fjmp, &[false, true],         1006),
            (OPCodeKind::Out,  &[true],                104),
            (OPCodeKind::Eq,   &[true, false, false],  108),
            (OPCodeKind::Rbs,  &[false],               9),
        ];

        for (kind, immediate, word) in cases {
            assert_eq!(instruction_word(kind, immediate), word, "{kind:?} {immediate:?}");
        }
    }

    #[test]
    fn erroneous_fragments() {
        #[rustfmt::skip]
        let cases = [
            (2, statements([SyntaxItem::Label("a"), SyntaxItem::Label("a")]),                       BytecodeErrorKind::DuplicateLabel("a")),
            (2, statements([SyntaxItem::Variable("a", 0), SyntaxItem::Variable("a", 1)]), BytecodeErrorKind::DuplicateVariable("a")),
            (1, statements([ins(OPCodeKind::Tjmp, &[Argument::Number(1), Argument::Label("nope")])]),  BytecodeErrorKind::InvalidLabel("nope")),
            (1, statements([ins(OPCodeKind::In, &[Argument::Variable("x")])]),                      BytecodeErrorKind::UndeclaredVariable("x")),
        ];

        for (line, items, kind) in cases {
            let expected = Err(BytecodeError { line, kind });
            let actual = Context::new().populate(&items).and_then(|ctx| ctx.generate(&items));

            assert_eq!(actual, expected, "items: {items:?}");
        }
    }
}
