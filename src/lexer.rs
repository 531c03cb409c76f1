use std::{fmt, iter::Peekable};

use crate::token::{Span, Token, TokenKind};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided string, producing the tokens into the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) {
    Lexer::new(src, tokens).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnclosedString,
    UnclosedBracket,
    UnexpectedCloser,
    BadNumber,
    UnexpectedChar,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnclosedString => write!(f, "unterminated quoted string"),
            Error::UnclosedBracket => write!(f, "unclosed bracket at end of input"),
            Error::UnexpectedCloser => write!(f, "closing bracket without matching opener"),
            Error::BadNumber => write!(f, "bad number syntax"),
            Error::UnexpectedChar => write!(f, "unrecognized character"),
        }
    }
}

/// The scanner.
///
/// Each scanning routine consumes the characters of exactly one lexeme and
/// decides the token kind; whitespace and comments produce no token at all.
/// The token sequence always ends with a single `Eof` token, unless a scan
/// error cuts it short with a final `Error` token.
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
    paren_depth: u32,
    vect_depth: u32,
}

impl Lexer<'_, '_> {
    /// Scans the source string until the input is exhausted or a scan error
    /// is hit. Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        loop {
            let Some(next) = self.scan_token_kind() else {
                continue;
            };
            let done = matches!(next, TokenKind::Eof | TokenKind::Error(_));
            self.produce(next);
            if done {
                break;
            }
        }
    }

    /// Dispatches on the current character. Returns `None` for trivia
    /// (whitespace and comments), which emit nothing.
    fn scan_token_kind(&mut self) -> Option<TokenKind> {
        use TokenKind::*;
        let kind = match self.mark_advance() {
            '\0' => self.end_of_input(),
            '(' => {
                self.paren_depth += 1;
                LParen
            }
            ')' => match self.paren_depth.checked_sub(1) {
                Some(depth) => {
                    self.paren_depth = depth;
                    RParen
                }
                None => Error(self::Error::UnexpectedCloser),
            },
            '[' => {
                self.vect_depth += 1;
                LVect
            }
            ']' => match self.vect_depth.checked_sub(1) {
                Some(depth) => {
                    self.vect_depth = depth;
                    RVect
                }
                None => Error(self::Error::UnexpectedCloser),
            },
            '"' => self.string(),
            '\'' => Quote,
            '`' => Quasiquote,
            ',' => match self.peek() {
                '@' => self.advance_with(UnquoteSplice),
                _ => Unquote,
            },
            '#' => self.boolean(),
            ';' => {
                self.comment();
                return None;
            }
            '+' | '-' => {
                if self.peek().is_ascii_digit() {
                    self.number()
                } else {
                    self.identifier()
                }
            }
            c if c.is_ascii_digit() => self.number(),
            c if is_identifier_char(c) => self.identifier(),
            c if c.is_whitespace() => {
                self.whitespace();
                return None;
            }
            _ => Error(self::Error::UnexpectedChar),
        };
        Some(kind)
    }

    /// Decides between a clean end of input and a dangling bracket. The
    /// depth counters exist solely for this check.
    fn end_of_input(&self) -> TokenKind {
        if self.paren_depth > 0 || self.vect_depth > 0 {
            TokenKind::Error(Error::UnclosedBracket)
        } else {
            TokenKind::Eof
        }
    }

    /// Scans a string literal. Escape sequences are passed through
    /// undecoded: the token's text keeps the raw lexeme, quotes included,
    /// which is exactly the form the backend's string literals carry.
    fn string(&mut self) -> TokenKind {
        loop {
            match self.advance() {
                '\0' => return TokenKind::Error(Error::UnclosedString),
                '"' => return TokenKind::Str,
                '\\' => {
                    if self.advance() == '\0' {
                        return TokenKind::Error(Error::UnclosedString);
                    }
                }
                _ => {}
            }
        }
    }

    fn identifier(&mut self) -> TokenKind {
        while is_identifier_char(self.peek()) {
            self.advance();
        }
        TokenKind::Ident
    }

    /// Scans `#t` or `#f`. These are the only two lexemes a `#` may start;
    /// both are emitted as plain identifier tokens.
    fn boolean(&mut self) -> TokenKind {
        match self.advance() {
            't' | 'f' if !is_identifier_char(self.peek()) => TokenKind::Ident,
            _ => TokenKind::Error(Error::UnexpectedChar),
        }
    }

    /// Scans a numeric literal. The optional leading sign has already been
    /// consumed by the dispatcher. A `.` continuation promotes to a float;
    /// an explicit sign continuation must close with `i` and promotes to a
    /// complex. Numbers must end at a delimiter: an identifier character
    /// straight after the numeric run is an error.
    fn number(&mut self) -> TokenKind {
        self.digits();
        match self.peek() {
            '.' => {
                self.advance();
                if self.digits() == 0 {
                    return TokenKind::Error(Error::BadNumber);
                }
                self.delimited(TokenKind::Float)
            }
            '+' | '-' => {
                self.advance();
                if self.digits() == 0 || self.peek() != 'i' {
                    return TokenKind::Error(Error::BadNumber);
                }
                self.advance();
                self.delimited(TokenKind::Complex)
            }
            _ => self.delimited(TokenKind::Int),
        }
    }

    fn digits(&mut self) -> usize {
        let mut count = 0;
        while self.peek().is_ascii_digit() {
            self.advance();
            count += 1;
        }
        count
    }

    /// Produces `kind` only if the numeric run is properly delimited.
    fn delimited(&mut self, kind: TokenKind) -> TokenKind {
        if is_identifier_char(self.peek()) {
            TokenKind::Error(Error::BadNumber)
        } else {
            kind
        }
    }

    fn whitespace(&mut self) {
        while self.peek().is_whitespace() {
            self.advance();
        }
    }

    fn comment(&mut self) {
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
    }
}

impl Lexer<'_, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
            paren_depth: 0,
            vect_depth: 0,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.current_lo = self.cursor;
        self.advance()
    }

    /// Returns the next character and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.tokens.push(Token::new(kind, self.span()));
    }
}

/// Identifier characters: alphanumerics plus the operator and path
/// punctuation the surface language treats as symbol constituents. `:`
/// is included so keyword-style markers (`:as`) lex as identifiers.
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric()
        || matches!(
            c,
            '-' | '.' | '/' | '>' | '<' | '=' | '+' | '*' | '&' | '_' | '!' | ':'
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn tests_with_span() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "(+ 1 2)" => [
                (LParen, 0..1),
                (Ident, 1..2),
                (Int, 3..4),
                (Int, 5..6),
                (RParen, 6..7),
                (Eof, 7..7),
            ],
            "(def answer 42)" => [
                (LParen, 0..1),
                (Ident, 1..4),
                (Ident, 5..11),
                (Int, 12..14),
                (RParen, 14..15),
                (Eof, 15..15),
            ],
            "[1 2.5 1+2i]" => [
                (LVect, 0..1),
                (Int, 1..2),
                (Float, 3..6),
                (Complex, 7..11),
                (RVect, 11..12),
                (Eof, 12..12),
            ],
            "-5 +7 - +" => [
                (Int, 0..2),
                (Int, 3..5),
                (Ident, 6..7),
                (Ident, 8..9),
                (Eof, 9..9),
            ],
            "foo-bar my.ns/fun <= >= = !" => [
                (Ident, 0..7),
                (Ident, 8..17),
                (Ident, 18..20),
                (Ident, 21..23),
                (Ident, 24..25),
                (Ident, 26..27),
                (Eof, 27..27),
            ],
            "#t #f" => [
                (Ident, 0..2),
                (Ident, 3..5),
                (Eof, 5..5),
            ],
            r#""hi" "a\"b""# => [
                (Str, 0..4),
                (Str, 5..11),
                (Eof, 11..11),
            ],
            "'x `y ,z ,@w" => [
                (Quote, 0..1),
                (Ident, 1..2),
                (Quasiquote, 3..4),
                (Ident, 4..5),
                (Unquote, 6..7),
                (Ident, 7..8),
                (UnquoteSplice, 9..11),
                (Ident, 11..12),
                (Eof, 12..12),
            ],
            "1 ; a comment (unread)\n2" => [
                (Int, 0..1),
                (Int, 23..24),
                (Eof, 24..24),
            ],
            "; only a comment" => [(Eof, 16..16)],
            "" => [(Eof, 0..0)],
        });

        for (input, tokens) in cases {
            let lexed = lex_in_new(input);
            assert_eq!(lexed, tokens.as_slice(), "input: {input:?}");
        }
    }

    #[test]
    fn error_cases() {
        use TokenKind::*;
        let cases = cases!(match .. {
            "(foo" => [
                (LParen, 0..1),
                (Ident, 1..4),
                (Error(super::Error::UnclosedBracket), 4..4),
            ],
            "[a [b]" => [
                (LVect, 0..1),
                (Ident, 1..2),
                (LVect, 3..4),
                (Ident, 4..5),
                (RVect, 5..6),
                (Error(super::Error::UnclosedBracket), 6..6),
            ],
            ")" => [(Error(super::Error::UnexpectedCloser), 0..1)],
            "(]" => [
                (LParen, 0..1),
                (Error(super::Error::UnexpectedCloser), 1..2),
            ],
            r#""oops"# => [(Error(super::Error::UnclosedString), 0..5)],
            r#""oops\"# => [(Error(super::Error::UnclosedString), 0..6)],
            "123abc" => [(Error(super::Error::BadNumber), 0..3)],
            "1." => [(Error(super::Error::BadNumber), 0..2)],
            "1+2" => [(Error(super::Error::BadNumber), 0..3)],
            "1+2if" => [(Error(super::Error::BadNumber), 0..4)],
            "#x" => [(Error(super::Error::UnexpectedChar), 0..2)],
            "%" => [(Error(super::Error::UnexpectedChar), 0..1)],
        });

        for (input, tokens) in cases {
            let lexed = lex_in_new(input);
            assert_eq!(lexed, tokens.as_slice(), "input: {input:?}");
        }
    }

    /// The stream ends in `Eof` exactly when both bracket depths are zero
    /// at the end of input.
    #[test]
    fn bracket_balance() {
        let balanced = ["", "()", "[]", "(foo [1 2] (bar))", "[[()]]"];
        for input in balanced {
            let last = lex_in_new(input).pop().unwrap();
            assert_eq!(last.kind, TokenKind::Eof, "input: {input:?}");
        }

        let unbalanced = ["(", "[", "(()", "([a b]", "[[]"];
        for input in unbalanced {
            let last = lex_in_new(input).pop().unwrap();
            assert_eq!(
                last.kind,
                TokenKind::Error(Error::UnclosedBracket),
                "input: {input:?}"
            );
        }
    }

    macro_rules! cases {
        (match .. {
            $($str:expr => [$(($kind:expr, $range:expr)),* $(,)?]),* $(,)?
        }) => {{
            &[$((
                $str,
                vec![
                    $(Token::new($kind, Span::new_of_bounds($range.start..$range.end))),*
                ],
            )),*]
        }};
    }
    use cases;
}
