use alloc::vec::Vec;

use intcode_base::opcode::{OPCodeKind, ParamKind, MAX_PARAMS};
use thiserror::Error;

use crate::lex::Token;

/// Argument of instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Argument<'a> {
    /// Literal, passed in immediate mode
    Number(i64),
    /// Address of label, passed in immediate mode
    Label(&'a str),
    /// Variable cell, passed in position mode. The only kind of destination.
    Variable(&'a str),
}

/// Syntax tree (line) item. Unit of [`SyntaxTree`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyntaxItem<'a> {
    /// Label declaration. It takes no space and points to the next cell:
    ///
    /// ```text
    /// loop:
    ///     add it 1 -> it
    /// ```
    Label(&'a str),
    /// Variable declaration, one memory cell with its initial value. Only
    /// numbers are stored, `var done` and `var done = other` both start with `0`:
    ///
    /// ```text
    /// var it = 1
    /// var done
    /// ```
    Variable(&'a str, i64),
    /// Instruction with its arguments. Only first [`OPCodeKind::args_count`]
    /// arguments are meaningful, see [`SyntaxItem::instruction_args`]:
    ///
    /// ```text
    /// fjmp done @loop
    /// ```
    Instruction(OPCodeKind, [Argument<'a>; MAX_PARAMS]),
}

impl<'a> SyntaxItem<'a> {
    /// Gets instruction args, empty for non-instruction items.
    ///
    /// ```
    /// # use intcode_as::tree::{SyntaxItem, Argument};
    /// # use intcode_base::opcode::OPCodeKind;
    /// #
    /// let item = SyntaxItem::Instruction(OPCodeKind::Out, [Argument::Number(1); 3]);
    ///
    /// assert_eq!(item.instruction_args(), &[Argument::Number(1)]);
    /// assert_eq!(SyntaxItem::Label("foo").instruction_args(), &[]);
    /// ```
    pub fn instruction_args(&self) -> &[Argument<'a>] {
        match self {
            Self::Instruction(kind, args) => &args[..kind.args_count()],
            _ => &[],
        }
    }

    /// Count of memory cells item takes.
    pub fn width(&self) -> usize {
        match self {
            Self::Label(_) => 0,
            Self::Variable(_, _) => 1,
            Self::Instruction(kind, _) => kind.width(),
        }
    }
}

/// [`SyntaxItem`] with source line it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Statement<'a> {
    /// 1-based line number
    pub line: usize,
    pub item: SyntaxItem<'a>,
}

/// Syntax tree. Represents just a vector of [`Statement`]. Can be obtained from:
///
/// 1. [`SyntaxTree::new`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyntaxTree<'a>(pub Vec<Statement<'a>>);

impl<'a> SyntaxTree<'a> {
    /// Parses tokens from iterator. Every line holds exactly one statement,
    /// blank and comment-only lines are skipped.
    ///
    /// # Examples
    /// ```
    /// use intcode_as::{tree::{SyntaxTree, SyntaxItem, Argument}, lex::Token};
    /// use intcode_base::opcode::OPCodeKind;
    ///
    /// let tokens = [
    ///     Token::Ident("var"), Token::Ident("x"), Token::Equals, Token::Number(4), Token::Newline,
    ///     Token::Comment("# twice"), Token::Newline,
    ///     Token::Ident("twice"), Token::Colon, Token::Newline,
    ///     Token::Ident("mul"), Token::Ident("x"), Token::Number(2), Token::Arrow, Token::Ident("x"),
    /// ];
    ///
    /// let v = SyntaxTree::new(&tokens).map(|f| f.0.into_iter().map(|s| (s.line, s.item)).collect::<Vec<_>>());
    /// assert_eq!(v, Ok(vec![
    ///     (1, SyntaxItem::Variable("x", 4)),
    ///     (3, SyntaxItem::Label("twice")),
    ///     (4, SyntaxItem::Instruction(OPCodeKind::Mul, [
    ///         Argument::Variable("x"), Argument::Number(2), Argument::Variable("x"),
    ///     ])),
    /// ]));
    /// ```
    ///
    /// ```
    /// # use intcode_as::{tree::{SyntaxTree, SyntaxError, SyntaxErrorKind}, lex::Token};
    /// #
    /// let tokens = [Token::Newline, Token::Ident("add"), Token::Number(1)];
    /// let v = SyntaxTree::new(&tokens).map(|f| f.0);
    ///
    /// assert_eq!(v, Err(SyntaxError { line: 2, kind: SyntaxErrorKind::IncompleteStatement }))
    /// ```
    ///
    /// See also: [`SyntaxError`]
    pub fn new<'b, I>(iter: I) -> Result<Self, SyntaxError<'a>>
    where
        I: IntoIterator<Item = &'b Token<'a>>,
        'a: 'b,
    {
        let mut v = Vec::new();
        let mut tokens = Vec::new();
        let mut line = 1;
        let mut iter = iter.into_iter();

        loop {
            let token = iter.next();
            match token {
                Some(Token::Comment(_)) => continue,
                Some(Token::Newline) | None => {
                    let item = parse_line(&tokens).map_err(|kind| SyntaxError { line, kind })?;
                    if let Some(item) = item {
                        v.push(Statement { line, item });
                    }
                    tokens.clear();

                    let Some(_) = token else { break };
                    line += 1;
                }
                Some(token) => tokens.push(*token),
            }
        }

        Ok(Self(v))
    }
}

fn parse_line<'a>(tokens: &[Token<'a>]) -> Result<Option<SyntaxItem<'a>>, SyntaxErrorKind<'a>> {
    let item = match tokens {
        [] => return Ok(None),

        [Token::Ident(label), Token::Colon] => SyntaxItem::Label(*label),
        [Token::Ident(_), Token::Colon, ..] | [Token::Colon, ..] => {
            return Err(SyntaxErrorKind::LabelSyntax)
        }

        [Token::Ident("var"), rest @ ..] => match rest {
            [Token::Ident(name)] => SyntaxItem::Variable(*name, 0),
            [Token::Ident(name), Token::Equals, Token::Number(v)] => SyntaxItem::Variable(*name, *v),
            // name initializer is accepted, but not resolved
            [Token::Ident(name), Token::Equals, Token::Ident(_)] => SyntaxItem::Variable(*name, 0),
            _ => return Err(SyntaxErrorKind::VariableSyntax),
        },

        [Token::Ident(mnemonic), rest @ ..] => {
            let Some(kind) = OPCodeKind::from_name(mnemonic) else {
                return Err(SyntaxErrorKind::InvalidInstruction(*mnemonic));
            };
            parse_instruction(kind, rest)?
        }

        _ => return Err(SyntaxErrorKind::UnexpectedToken),
    };

    Ok(Some(item))
}

fn parse_instruction<'a>(kind: OPCodeKind, tokens: &[Token<'a>]) -> Result<SyntaxItem<'a>, SyntaxErrorKind<'a>> {
    let mut args = [Argument::Number(0); MAX_PARAMS];
    let mut iter = tokens.iter();

    for (idx, param) in kind.params().iter().enumerate() {
        args[idx] = match param {
            ParamKind::Value => match iter.next() {
                Some(Token::Number(v)) => Argument::Number(*v),
                Some(Token::LabelRef(label)) => Argument::Label(*label),
                Some(Token::Ident(var)) => Argument::Variable(*var),
                Some(_) => return Err(SyntaxErrorKind::InvalidArgument(idx)),
                None => return Err(SyntaxErrorKind::IncompleteStatement),
            },
            ParamKind::Dest => match (iter.next(), iter.next()) {
                (Some(Token::Arrow), Some(Token::Ident(var))) => Argument::Variable(*var),
                (None, _) | (Some(Token::Arrow), None) => return Err(SyntaxErrorKind::IncompleteStatement),
                _ => return Err(SyntaxErrorKind::InvalidArgument(idx)),
            },
        };
    }

    if iter.next().is_some() {
        return Err(SyntaxErrorKind::TrailingTokens);
    }

    Ok(SyntaxItem::Instruction(kind, args))
}

/// Syntax error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}")]
pub struct SyntaxError<'a> {
    pub line: usize,
    pub kind: SyntaxErrorKind<'a>,
}

/// Kind of syntax error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind<'a> {
    /// Label line is not exactly `name:`
    #[error("invalid label declaration")]
    LabelSyntax,
    /// Invalid `var` syntax
    #[error("invalid `var` syntax")]
    VariableSyntax,
    /// Unknown mnemonic
    #[error("invalid instruction `{0}`")]
    InvalidInstruction(&'a str),
    /// Argument does not fit its parameter (ex. destination without `->`)
    #[error("invalid argument #{}", .0 + 1)]
    InvalidArgument(usize),
    /// Line ends before all parameters are given
    #[error("incomplete statement")]
    IncompleteStatement,
    /// Tokens after complete instruction
    #[error("unexpected tokens after instruction")]
    TrailingTokens,
    /// Line does not start with ident
    #[error("unexpected token")]
    UnexpectedToken,
}
