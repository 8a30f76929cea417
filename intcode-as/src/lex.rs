use thiserror::Error;

/// Represents a token.
/// See [`Lex`] for more info.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token<'a> {
    /// Comment. Example: `# foo`
    Comment(&'a str),
    /// End of line
    Newline,
    /// Any ident. Example: `foo_bar`, `mul`, `var`
    Ident(&'a str),
    /// Label reference. Example: `@loop`
    LabelRef(&'a str),
    /// Any number. Example: `10`, `-1`
    Number(i64),
    /// `->`
    Arrow,
    /// `:`
    Colon,
    /// `=`
    Equals,
}

/// intcode-as lexer.
/// Represents an iterator over [`Token`]s.
///
/// # Example
/// ```
/// # use intcode_as::lex::{Lex, Token, Error};
/// #
/// let fragment = "add it -1 -> it";
/// let tokens: Result<Vec<Token>, Error> = Lex::new(fragment).collect();
///
/// assert_eq!(tokens, Ok(vec![
///     Token::Ident("add"), Token::Ident("it"), Token::Number(-1), Token::Arrow, Token::Ident("it"),
/// ]));
/// ```
pub struct Lex<'a> {
    v: &'a str,
    pos: usize,
    line: usize,
    line_start: usize,
}

impl<'a> Lex<'a> {
    /// Create new lexer by string.
    pub fn new(v: &'a str) -> Self {
        Self {
            v,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    fn eat_while(&self, f: impl Fn(char) -> bool) -> usize {
        self.v[self.pos..]
            .chars()
            .take_while(|c| f(*c))
            .map(char::len_utf8)
            .sum()
    }

    fn error(&self, start: usize, kind: ErrorKind) -> Error {
        Error {
            line: self.line,
            column: start - self.line_start + 1,
            kind,
        }
    }
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Iterator for Lex<'a> {
    type Item = Result<Token<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pos += self.eat_while(|c| matches!(c, ' ' | '\t' | '\r'));

        let start = self.pos;
        let c = self.v[self.pos..].chars().next()?;
        self.pos += c.len_utf8();

        match c {
            '\n' => {
                self.line += 1;
                self.line_start = self.pos;
                Some(Ok(Token::Newline))
            }
            ':' => Some(Ok(Token::Colon)),
            '=' => Some(Ok(Token::Equals)),

            '#' => {
                self.pos += self.eat_while(|c| c != '\n');
                Some(Ok(Token::Comment(&self.v[start..self.pos])))
            }

            '@' => {
                let len = self.eat_while(is_ident);
                if len == 0 {
                    return Some(Err(self.error(start, ErrorKind::EmptyLabelReference)));
                }
                self.pos += len;

                Some(Ok(Token::LabelRef(&self.v[start + 1..self.pos])))
            }

            '-' if self.v[self.pos..].starts_with('>') => {
                self.pos += 1;
                Some(Ok(Token::Arrow))
            }

            '-' | '0'..='9' => {
                // eats trailing letters too, so `12ab` is one invalid number
                self.pos += self.eat_while(is_ident);

                let number = self.v[start..self.pos]
                    .parse()
                    .map(Token::Number)
                    .map_err(|_| self.error(start, ErrorKind::InvalidNumber));
                Some(number)
            }

            'a'..='z' | 'A'..='Z' | '_' => {
                self.pos += self.eat_while(is_ident);
                Some(Ok(Token::Ident(&self.v[start..self.pos])))
            }

            _ => Some(Err(self.error(start, ErrorKind::UnexpectedToken))),
        }
    }
}

/// Represents a lexer error. Line and column are 1-based, column counts bytes.
///
/// # Example
/// ```
/// # use intcode_as::lex::{Lex, Error, ErrorKind};
/// #
/// let fragment = "var x\nadd x, 1 -> x";
/// // arguments are separated by whitespace only
/// let result: Result<Vec<_>, _> = Lex::new(fragment).collect();
///
/// assert_eq!(result, Err(Error { line: 2, column: 6, kind: ErrorKind::UnexpectedToken }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at {line}:{column}")]
pub struct Error {
    pub line: usize,
    pub column: usize,
    pub kind: ErrorKind,
}

/// Represents a kind of lexer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    /// Unexpected token
    #[error("unexpected token")]
    UnexpectedToken,
    /// Not a 64-bit signed decimal number (ex. `12ab`, `-`)
    #[error("invalid number")]
    InvalidNumber,
    /// `@` without label name
    #[error("label reference without name")]
    EmptyLabelReference,
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;
    use super::*;

    #[test]
    fn normal_fragment() {
        let fragment = "
            # Comment.
            var it = -1
            loop:\tadd it 1 -> it   # inline
            fjmp it @loop\r
            out 9223372036854775807
            ";
        #[rustfmt::skip]
        let expected = [
            Token::Newline,
            Token::Comment("# Comment."), Token::Newline,
            Token::Ident("var"), Token::Ident("it"), Token::Equals, Token::Number(-1), Token::Newline,
            Token::Ident("loop"), Token::Colon,
                Token::Ident("add"), Token::Ident("it"), Token::Number(1), Token::Arrow, Token::Ident("it"),
                Token::Comment("# inline"), Token::Newline,
            Token::Ident("fjmp"), Token::Ident("it"), Token::LabelRef("loop"), Token::Newline,
            Token::Ident("out"), Token::Number(i64::MAX), Token::Newline,
        ];

        let actual = {
            let actual: Result<Vec<_>, _> = Lex::new(fragment).collect();

            match actual {
                Ok(v) => v,
                Err(e) => panic!("got error while parsing: {e}"),
            }
        };

        assert_eq!(&actual, &expected);
    }

    #[test]
    fn erroneous_fragments() {
        #[rustfmt::skip]
        let fragments = [
            ("! out 1",          1, 1, ErrorKind::UnexpectedToken),
            ("add a, b -> c",    1, 6, ErrorKind::UnexpectedToken),
            ("end\nend\n  end;", 3, 6, ErrorKind::UnexpectedToken),
            ("out ü",            1, 5, ErrorKind::UnexpectedToken),

            ("out 12ab",                1, 5, ErrorKind::InvalidNumber),
            ("out - 1",                 1, 5, ErrorKind::InvalidNumber),
            ("var x = 99999999999999999999", 1, 9, ErrorKind::InvalidNumber),

            ("fjmp x @",   1, 8, ErrorKind::EmptyLabelReference),
            ("fjmp x @ l", 1, 8, ErrorKind::EmptyLabelReference),
        ];

        for (fragment, line, column, kind) in fragments {
            let actual: Result<Vec<_>, _> = Lex::new(fragment).collect();

            assert_eq!(
                actual,
                Err(Error { line, column, kind }),
                "fragment: `{fragment}`"
            );
        }
    }

    #[test]
    fn error_display() {
        let error = Error { line: 4, column: 2, kind: ErrorKind::InvalidNumber };
        assert_eq!(alloc::string::ToString::to_string(&error), "invalid number at 4:2");
    }
}
