//! A compiler pipeline for a small parenthesized surface language,
//! lowering programs into a Go syntax tree: text → tokens → surface AST →
//! target AST. Rendering the target AST back to source text is left to the
//! host environment.

use std::fmt;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a surface AST.
pub mod parser;

/// The generator takes the surface AST, resolving special forms and
/// operators, and maps it into the target AST.
pub mod gen;

pub mod ast;
pub mod go;
pub mod token;

pub mod util {
    pub mod fmt;
}

use token::{Span, Spanned, Token};

/// Scans the source into its token sequence.
pub fn scan(src: &str) -> Vec<Token> {
    lexer::lex_in_new(src)
}

/// Runs the whole pipeline over one input. `name` identifies the input in
/// diagnostics.
pub fn compile(name: &str, src: &str) -> Result<go::File, Error> {
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    let forms = parser::parse_program(src, &mut tokens)
        .map_err(|error| Error::parse(name, error))?;
    gen::generate(&forms).map_err(|error| Error::gen(name, error))
}

/// A pipeline failure, carrying the input name and source offset of the
/// offending form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub name: Box<str>,
    pub span: Span,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Parse(parser::Error),
    Gen(gen::Error),
}

impl Error {
    fn parse(name: &str, error: Spanned<parser::Error>) -> Error {
        Error {
            name: name.into(),
            span: error.span,
            kind: ErrorKind::Parse(error.inner),
        }
    }

    fn gen(name: &str, error: Spanned<gen::Error>) -> Error {
        Error {
            name: name.into(),
            span: error.span,
            kind: ErrorKind::Gen(error.inner),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: ", self.name, self.span)?;
        match &self.kind {
            ErrorKind::Parse(error) => write!(f, "{error}"),
            ErrorKind::Gen(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}
