use std::fmt;

use crate::{
    ast::{Node, NodeKind, NumberKind},
    lexer,
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Lexes and parses the provided source, producing one [`Node`] per
/// top-level form. Tokens are written into the provided buffer.
pub fn parse_program(src: &str, tokens: &mut Vec<Token>) -> Result<Vec<Node>> {
    assert!(tokens.is_empty());
    lexer::lex(src, tokens);
    parse(src, tokens)
}

/// Parses an already-lexed token sequence. The source is needed to recover
/// lexeme text; a sequence missing its end-of-input terminator is treated
/// as ending at the end of `src`.
pub fn parse(src: &str, tokens: &[Token]) -> Result<Vec<Node>> {
    Parser {
        src,
        tokens,
        cursor: 0,
    }
    .parse_forms()
}

/// The bracket closer the parser is currently looking for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Closer {
    Paren,
    Vect,
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok [Token],
    cursor: usize,
}

impl Parser<'_, '_> {
    /// Parses forms at depth zero until end of input.
    fn parse_forms(mut self) -> Result<Vec<Node>> {
        let mut forms = Vec::new();
        loop {
            let token = self.advance();
            if token.is_eof() {
                return Ok(forms);
            }
            forms.push(self.parse_form(token)?);
        }
    }

    /// Parses the single form starting at `token`.
    fn parse_form(&mut self, token: Token) -> Result<Node> {
        let span = token.span();
        let kind = match token.kind {
            TokenKind::Ident => NodeKind::Ident(self.text(token).into()),
            TokenKind::Str => NodeKind::Str(self.text(token).into()),
            TokenKind::Int => self.number(token, NumberKind::Int),
            TokenKind::Float => self.number(token, NumberKind::Float),
            TokenKind::Complex => self.number(token, NumberKind::Complex),

            TokenKind::LParen => {
                let (mut children, end) = self.parse_seq(Closer::Paren)?;
                let span = span.to(end);
                if children.is_empty() {
                    return Ok(Node::nil(span));
                }
                let callee = Box::new(children.remove(0));
                return Ok(Node {
                    kind: NodeKind::Call {
                        callee,
                        args: children,
                    },
                    span,
                });
            }
            TokenKind::LVect => {
                let (elems, end) = self.parse_seq(Closer::Vect)?;
                return Ok(Node {
                    kind: NodeKind::Vector(elems),
                    span: span.to(end),
                });
            }

            // A closer reaching this point matches no pending opener of its
            // kind: either at depth zero or under the other bracket kind.
            TokenKind::RParen | TokenKind::RVect => {
                return Err(span.wrap(Error::UnexpectedCloser { found: token.kind }));
            }

            // Quoting markers wrap the following form in its reader call.
            TokenKind::Quote => return self.quoted(token, "quote"),
            TokenKind::Quasiquote => return self.quoted(token, "quasiquote"),
            TokenKind::Unquote => return self.quoted(token, "unquote"),
            TokenKind::UnquoteSplice => return self.quoted(token, "unquote-splice"),

            TokenKind::Eof => return Err(span.wrap(Error::UnexpectedEof)),
            TokenKind::Error(error) => return Err(span.wrap(Error::Lexer(error))),
        };
        Ok(Node { kind, span })
    }

    /// Parses a sequence of forms until the expected closer, which is
    /// consumed. Returns the forms and the closer's span.
    fn parse_seq(&mut self, closer: Closer) -> Result<(Vec<Node>, Span)> {
        let mut nodes = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::RParen if closer == Closer::Paren => {
                    return Ok((nodes, token.span()));
                }
                TokenKind::RVect if closer == Closer::Vect => {
                    return Ok((nodes, token.span()));
                }
                TokenKind::Eof => return Err(token.span().wrap(Error::UnexpectedEof)),
                _ => nodes.push(self.parse_form(token)?),
            }
        }
    }

    fn quoted(&mut self, marker: Token, wrapper: &str) -> Result<Node> {
        let next = self.advance();
        let form = self.parse_form(next)?;
        let span = marker.span().to(form.span);
        Ok(Node {
            kind: NodeKind::Call {
                callee: Box::new(Node::ident(wrapper, marker.span())),
                args: vec![form],
            },
            span,
        })
    }

    fn number(&self, token: Token, kind: NumberKind) -> NodeKind {
        NodeKind::Number {
            text: self.text(token).into(),
            kind,
        }
    }

    fn text(&self, token: Token) -> &str {
        token.span().substr(self.src)
    }

    /// Returns the current token and advances. Sequences lacking a
    /// terminator yield end-of-input tokens forever.
    fn advance(&mut self) -> Token {
        let token = self
            .tokens
            .get(self.cursor)
            .copied()
            .unwrap_or_else(|| Token::eof_for(self.src));
        self.cursor += 1;
        token
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A closing bracket that matches no pending opener of its kind.
    UnexpectedCloser { found: TokenKind },
    /// Input ended inside a bracketed form or right after a quote marker.
    UnexpectedEof,
    /// A scan error token was encountered.
    Lexer(lexer::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnexpectedCloser { found } => {
                let closer = match found {
                    TokenKind::RParen => ")",
                    TokenKind::RVect => "]",
                    other => return write!(f, "unexpected {other:?}"),
                };
                write!(f, "unexpected {closer:?}")
            }
            Error::UnexpectedEof => write!(f, "unexpected end of input"),
            Error::Lexer(error) => write!(f, "{error}"),
        }
    }
}
