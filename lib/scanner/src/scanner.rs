use itertools::{Either, Itertools};
use log::trace;

mod cursor;
pub use cursor::{Cursor, Line};

pub mod token;
pub use token::{Token, TokenData, TokenType};
use TokenData::*;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ScanErrorType {
    #[error("Unexpected character: {0}")]
    UnexpectedCharacter(char),
    #[error("Unterminated string.")]
    UnterminatedString,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error: {error}")]
pub struct ScanError {
    pub error: ScanErrorType,
    pub line: Line,
}

/// Lazily scans a source buffer. Errors are yielded in place and scanning continues after them,
/// the stream always ends with a single `Eof` token.
#[derive(Debug, Clone)]
pub struct TokenStream<'a> {
    cursor: Cursor<'a>,
    reached_eof: bool,
}

impl<'a> TokenStream<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { cursor: Cursor::new(source), reached_eof: false }
    }

    fn make_token(&self, data: TokenData<'a>, start: &Cursor<'a>) -> Token<'a> {
        Token::new(data, start.slice_until(&self.cursor), start.line())
    }

    fn error(&self, error: ScanErrorType) -> ScanError {
        ScanError { error, line: self.cursor.line() }
    }

    fn one_or_two_char_token(
        &mut self,
        second: char,
        two: TokenData<'a>,
        one: TokenData<'a>,
    ) -> TokenData<'a> {
        if self.cursor.consume_if_matches(second) {
            two
        } else {
            one
        }
    }

    fn string(&mut self, start: &Cursor<'a>) -> Result<Token<'a>, ScanError> {
        self.cursor.consume_while(|c| c != '"');
        if !self.cursor.consume_if_matches('"') {
            return Err(self.error(ScanErrorType::UnterminatedString));
        }

        // Strings spanning several lines belong to the line of the closing quote.
        let lexeme = start.slice_until(&self.cursor);
        Ok(Token::new(Str(&lexeme[1..lexeme.len() - 1]), lexeme, self.cursor.line()))
    }

    fn number(&mut self, start: &Cursor<'a>) -> Token<'a> {
        self.cursor.consume_while(|c| c.is_ascii_digit());

        if self.cursor.peek() == Some('.')
            && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit())
        {
            self.cursor.next();
            self.cursor.consume_while(|c| c.is_ascii_digit());
        }

        // Digits with an optional fractional digit run always form a valid f64.
        let value = start.slice_until(&self.cursor).parse().unwrap();
        self.make_token(Number(value), start)
    }

    fn identifier(&mut self, start: &Cursor<'a>) -> Token<'a> {
        self.cursor.consume_while(|c| c.is_ascii_alphanumeric() || c == '_');
        let data = token::keyword(start.slice_until(&self.cursor)).unwrap_or(Identifier);
        self.make_token(data, start)
    }
}

impl<'a> Iterator for TokenStream<'a> {
    type Item = Result<Token<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.cursor.clone();
            let Some(c) = self.cursor.next() else {
                if self.reached_eof {
                    return None;
                }
                self.reached_eof = true;
                return Some(Ok(Token::eof(self.cursor.line())));
            };

            let data = match c {
                '(' => LeftParen,
                ')' => RightParen,
                '{' => LeftBrace,
                '}' => RightBrace,
                ',' => Comma,
                '.' => Dot,
                '-' => Minus,
                '+' => Plus,
                ';' => Semicolon,
                '*' => Star,

                '!' => self.one_or_two_char_token('=', BangEqual, Bang),
                '=' => self.one_or_two_char_token('=', EqualEqual, Equal),
                '<' => self.one_or_two_char_token('=', LessEqual, Less),
                '>' => self.one_or_two_char_token('=', GreaterEqual, Greater),

                '/' => {
                    if self.cursor.consume_if_matches('/') {
                        // Comment
                        self.cursor.consume_while(|c| c != '\n');
                        continue;
                    }
                    Slash
                }

                ' ' | '\r' | '\t' | '\n' => continue,

                '"' => return Some(self.string(&start)),
                d if d.is_ascii_digit() => return Some(Ok(self.number(&start))),
                a if a.is_ascii_alphabetic() || a == '_' => {
                    return Some(Ok(self.identifier(&start)))
                }

                c => return Some(Err(self.error(ScanErrorType::UnexpectedCharacter(c)))),
            };

            let token = self.make_token(data, &start);
            trace!("Scanned {:?}", token);
            return Some(Ok(token));
        }
    }
}

/// Scans the whole source, collecting tokens and errors separately.
pub fn scan(source: &str) -> (Vec<Token<'_>>, Vec<ScanError>) {
    TokenStream::new(source).partition_map(|result| match result {
        Ok(token) => Either::Left(token),
        Err(error) => Either::Right(error),
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn token(data: TokenData<'static>, lexeme: &'static str, line: usize) -> Token<'static> {
        Token::new(data, lexeme, Line(line))
    }

    fn eof(line: usize) -> Token<'static> {
        Token::eof(Line(line))
    }

    fn tokens(source: &str) -> Vec<Token<'_>> {
        let (tokens, errors) = scan(source);
        assert_eq!(errors, vec![]);
        tokens
    }

    #[test]
    fn string_literals() {
        assert_eq!(
            tokens("\"hello world\""),
            vec![token(Str("hello world"), "\"hello world\"", 1), eof(1)]
        );

        assert_eq!(
            tokens("\"hello\nworld\" x"),
            vec![
                token(Str("hello\nworld"), "\"hello\nworld\"", 2),
                token(Identifier, "x", 2),
                eof(2)
            ]
        );

        assert_eq!(
            tokens("\"a\nb\"\n"),
            vec![token(Str("a\nb"), "\"a\nb\"", 2), eof(3)]
        );
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = scan("var a;\n\"hello\nworld");
        assert_eq!(
            errors,
            vec![ScanError { error: ScanErrorType::UnterminatedString, line: Line(3) }]
        );
        assert_eq!(
            tokens,
            vec![token(Var, "var", 1), token(Identifier, "a", 1), token(Semicolon, ";", 1), eof(3)]
        );
        assert_eq!(errors[0].to_string(), "[line 3] Error: Unterminated string.");
    }

    #[test]
    fn two_char_tokens() {
        assert_eq!(
            tokens("! != = == < <= > >= !!=="),
            vec![
                token(Bang, "!", 1),
                token(BangEqual, "!=", 1),
                token(Equal, "=", 1),
                token(EqualEqual, "==", 1),
                token(Less, "<", 1),
                token(LessEqual, "<=", 1),
                token(Greater, ">", 1),
                token(GreaterEqual, ">=", 1),
                token(Bang, "!", 1),
                token(BangEqual, "!=", 1),
                token(Equal, "=", 1),
                eof(1),
            ]
        );
    }

    #[test]
    fn single_char_tokens() {
        assert_eq!(
            tokens("=(){},.-+;*/!<>"),
            vec![
                token(Equal, "=", 1),
                token(LeftParen, "(", 1),
                token(RightParen, ")", 1),
                token(LeftBrace, "{", 1),
                token(RightBrace, "}", 1),
                token(Comma, ",", 1),
                token(Dot, ".", 1),
                token(Minus, "-", 1),
                token(Plus, "+", 1),
                token(Semicolon, ";", 1),
                token(Star, "*", 1),
                token(Slash, "/", 1),
                token(Bang, "!", 1),
                token(Less, "<", 1),
                token(Greater, ">", 1),
                eof(1),
            ]
        );
    }

    #[test]
    fn comments() {
        assert_eq!(
            tokens("a // comment\nb // trailing"),
            vec![token(Identifier, "a", 1), token(Identifier, "b", 2), eof(2)]
        );
    }

    #[test]
    fn numbers() {
        assert_eq!(
            tokens("123 1.5 2.50 7. .5"),
            vec![
                token(Number(123.0), "123", 1),
                token(Number(1.5), "1.5", 1),
                token(Number(2.5), "2.50", 1),
                token(Number(7.0), "7", 1),
                token(Dot, ".", 1),
                token(Dot, ".", 1),
                token(Number(5.0), "5", 1),
                eof(1),
            ]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            tokens("var _foo1 = nil; orchid or"),
            vec![
                token(Var, "var", 1),
                token(Identifier, "_foo1", 1),
                token(Equal, "=", 1),
                token(Nil, "nil", 1),
                token(Semicolon, ";", 1),
                token(Identifier, "orchid", 1),
                token(Or, "or", 1),
                eof(1),
            ]
        );
    }

    #[test]
    fn unexpected_characters_do_not_stop_scanning() {
        let (tokens, errors) = scan("@a\n$ b");
        assert_eq!(
            errors,
            vec![
                ScanError { error: ScanErrorType::UnexpectedCharacter('@'), line: Line(1) },
                ScanError { error: ScanErrorType::UnexpectedCharacter('$'), line: Line(2) },
            ]
        );
        assert_eq!(tokens, vec![token(Identifier, "a", 1), token(Identifier, "b", 2), eof(2)]);
        assert_eq!(errors[1].to_string(), "[line 2] Error: Unexpected character: $");
    }

    #[test]
    fn stream_ends_after_eof() {
        let mut stream = TokenStream::new("");
        assert_eq!(stream.next(), Some(Ok(eof(1))));
        assert_eq!(stream.next(), None);
        assert_eq!(stream.next(), None);
    }
}
