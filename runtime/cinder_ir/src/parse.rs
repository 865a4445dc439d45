//! Reader for the type-expression vocabulary.
//!
//! Accepts the s-expression forms printed by [`TypeExprDisplay`], plus the
//! `struct`/`union` spellings of `record`/`variant`.
//!
//! [`TypeExprDisplay`]: crate::TypeExprDisplay

use crate::{ensure_sufficient_stack, Field, ScalarName, StringInterner, TypeExpr};

/// Deepest form nesting the reader accepts.
pub const MAX_NESTING: usize = 512;

/// Error from [`parse_type`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected end of type expression")]
    UnexpectedEnd,
    #[error("unexpected `{found}` at offset {offset}")]
    Unexpected { found: String, offset: usize },
    #[error("unknown type form `{0}`")]
    UnknownForm(String),
    #[error("invalid array length `{0}`")]
    InvalidLength(String),
    #[error("trailing input at offset {0}")]
    Trailing(usize),
    #[error("type expression nested deeper than {max} at offset {0}", max = MAX_NESTING)]
    TooDeep(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Token<'a> {
    Open,
    Close,
    Atom(&'a str),
}

impl Token<'_> {
    fn text(self) -> String {
        match self {
            Token::Open => "(".to_owned(),
            Token::Close => ")".to_owned(),
            Token::Atom(s) => s.to_owned(),
        }
    }
}

fn tokenize(src: &str) -> Vec<(Token<'_>, usize)> {
    let mut tokens = Vec::new();
    let bytes = src.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' => {
                tokens.push((Token::Open, i));
                i += 1;
            }
            b')' => {
                tokens.push((Token::Close, i));
                i += 1;
            }
            b if b.is_ascii_whitespace() => i += 1,
            _ => {
                let start = i;
                while i < bytes.len()
                    && !bytes[i].is_ascii_whitespace()
                    && bytes[i] != b'('
                    && bytes[i] != b')'
                {
                    i += 1;
                }
                tokens.push((Token::Atom(&src[start..i]), start));
            }
        }
    }
    tokens
}

struct Parser<'a, 'i> {
    tokens: Vec<(Token<'a>, usize)>,
    pos: usize,
    depth: usize,
    interner: &'i StringInterner,
}

impl<'a> Parser<'a, '_> {
    fn peek(&self) -> Option<Token<'a>> {
        self.tokens.get(self.pos).map(|&(t, _)| t)
    }

    fn next(&mut self) -> Result<(Token<'a>, usize), ParseError> {
        let tok = self
            .tokens
            .get(self.pos)
            .copied()
            .ok_or(ParseError::UnexpectedEnd)?;
        self.pos += 1;
        Ok(tok)
    }

    fn expect_close(&mut self) -> Result<(), ParseError> {
        match self.next()? {
            (Token::Close, _) => Ok(()),
            (tok, offset) => Err(ParseError::Unexpected {
                found: tok.text(),
                offset,
            }),
        }
    }

    fn atom(&mut self) -> Result<&'a str, ParseError> {
        match self.next()? {
            (Token::Atom(s), _) => Ok(s),
            (tok, offset) => Err(ParseError::Unexpected {
                found: tok.text(),
                offset,
            }),
        }
    }

    fn ty(&mut self) -> Result<TypeExpr, ParseError> {
        match self.next()? {
            (Token::Atom(s), _) => Ok(self.named(s)),
            (Token::Open, offset) => {
                if self.depth == MAX_NESTING {
                    return Err(ParseError::TooDeep(offset));
                }
                self.depth += 1;
                let head = self.atom()?;
                let expr = ensure_sufficient_stack(|| self.form(head));
                self.depth -= 1;
                expr
            }
            (Token::Close, offset) => Err(ParseError::Unexpected {
                found: ")".to_owned(),
                offset,
            }),
        }
    }

    fn named(&self, s: &str) -> TypeExpr {
        if s == "void" {
            return TypeExpr::Void;
        }
        match ScalarName::from_name(s) {
            Some(scalar) => TypeExpr::Scalar(scalar),
            None => TypeExpr::Named(self.interner.intern(s)),
        }
    }

    /// Parse the rest of a compound form after its head symbol.
    fn form(&mut self, head: &str) -> Result<TypeExpr, ParseError> {
        let expr = match head {
            "array" => {
                let elem = self.ty()?;
                let len = match self.peek() {
                    Some(Token::Atom(n)) => {
                        self.pos += 1;
                        Some(
                            n.parse::<u64>()
                                .map_err(|_| ParseError::InvalidLength(n.to_owned()))?,
                        )
                    }
                    _ => None,
                };
                TypeExpr::Array {
                    elem: Box::new(elem),
                    len,
                }
            }
            "pointer" => TypeExpr::Pointer(Box::new(self.ty()?)),
            "c-function" => {
                let ret = self.ty()?;
                let mut params = Vec::new();
                if self.peek() == Some(Token::Open) {
                    self.pos += 1;
                    while self.peek() != Some(Token::Close) {
                        params.push(self.ty()?);
                    }
                    self.expect_close()?;
                }
                TypeExpr::CFunction {
                    ret: Box::new(ret),
                    params,
                }
            }
            "record" | "struct" => TypeExpr::Record(self.fields()?),
            "variant" | "union" => TypeExpr::Variant(self.fields()?),
            "enum" => {
                let mut names = Vec::new();
                while self.peek() != Some(Token::Close) {
                    let name = self.atom()?;
                    names.push(self.interner.intern(name));
                }
                TypeExpr::Enum(names)
            }
            other => return Err(ParseError::UnknownForm(other.to_owned())),
        };
        self.expect_close()?;
        Ok(expr)
    }

    fn fields(&mut self) -> Result<Vec<Field>, ParseError> {
        let mut fields = Vec::new();
        while self.peek() != Some(Token::Close) {
            match self.next()? {
                (Token::Open, _) => {}
                (tok, offset) => {
                    return Err(ParseError::Unexpected {
                        found: tok.text(),
                        offset,
                    })
                }
            }
            let name = self.atom()?;
            let name = self.interner.intern(name);
            let ty = self.ty()?;
            self.expect_close()?;
            fields.push(Field { name, ty });
        }
        Ok(fields)
    }
}

/// Parse one type expression from `src`.
///
/// Symbols that are neither scalar names nor `void` become
/// [`TypeExpr::Named`] references to opaque host types.
pub fn parse_type(src: &str, interner: &StringInterner) -> Result<TypeExpr, ParseError> {
    let mut parser = Parser {
        tokens: tokenize(src),
        pos: 0,
        depth: 0,
        interner,
    };
    let expr = parser.ty()?;
    if let Some(&(_, offset)) = parser.tokens.get(parser.pos) {
        return Err(ParseError::Trailing(offset));
    }
    Ok(expr)
}
