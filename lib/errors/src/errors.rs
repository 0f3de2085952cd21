use std::fmt::Display;

use itertools::Itertools;
use scanner::{Line, ScanError, Token, TokenType};

/// A diagnostic produced while scanning or parsing.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
#[error("[line {line}] Error{}: {message}", .at.as_ref().map(|at| format!(" at {at}")).unwrap_or_default())]
pub struct SyntaxError {
    pub line: Line,
    pub at: Option<String>,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: Line, message: impl ToString) -> Self {
        Self { line, at: None, message: message.to_string() }
    }

    /// Attributes the error to `token`, rendered as `at end` for the end of input.
    pub fn at(token: &Token, message: impl ToString) -> Self {
        let at = match token.ty() {
            TokenType::Eof => "end".to_string(),
            _ => format!("'{}'", token.lexeme()),
        };
        Self { line: token.line(), at: Some(at), message: message.to_string() }
    }
}

impl From<ScanError> for SyntaxError {
    fn from(error: ScanError) -> Self {
        Self::new(error.line, error.error)
    }
}

/// Every syntax error of one scan/parse pass, in the order they were reported.
#[derive(
    thiserror::Error, Debug, Default, Clone, PartialEq, derive_more::Deref, derive_more::DerefMut,
)]
pub struct SyntaxErrors(pub Vec<SyntaxError>);

impl SyntaxErrors {
    pub fn push(&mut self, error: impl Into<SyntaxError>) {
        self.0.push(error.into());
    }

    /// Orders the errors by line, keeping the report order within a line.
    pub fn sorted_by_line(mut self) -> Self {
        self.0.sort_by_key(|e| e.line);
        self
    }
}

impl From<SyntaxError> for SyntaxErrors {
    fn from(e: SyntaxError) -> Self {
        Self(vec![e])
    }
}

impl<E: Into<SyntaxError>> Extend<E> for SyntaxErrors {
    fn extend<T: IntoIterator<Item = E>>(&mut self, iter: T) {
        self.0.extend(iter.into_iter().map(Into::into))
    }
}

impl Display for SyntaxErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0.iter().join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::{ScanErrorType, TokenData};

    use super::*;

    #[test]
    fn display() {
        let semicolon = Token::new(TokenData::Semicolon, ";", Line(3));
        assert_eq!(
            SyntaxError::at(&semicolon, "Expect expression.").to_string(),
            "[line 3] Error at ';': Expect expression."
        );

        assert_eq!(
            SyntaxError::at(&Token::eof(Line(7)), "Expect ';' after value.").to_string(),
            "[line 7] Error at end: Expect ';' after value."
        );

        assert_eq!(
            SyntaxError::new(Line(1), "Unterminated string.").to_string(),
            "[line 1] Error: Unterminated string."
        );
    }

    #[test]
    fn collects_scan_errors_and_sorts_by_line() {
        let mut errors = SyntaxErrors::default();
        errors.push(SyntaxError::at(&Token::eof(Line(4)), "Expect expression."));
        errors.extend([
            ScanError { error: ScanErrorType::UnexpectedCharacter('@'), line: Line(2) },
            ScanError { error: ScanErrorType::UnterminatedString, line: Line(4) },
        ]);

        assert_eq!(
            errors.sorted_by_line().to_string(),
            [
                "[line 2] Error: Unexpected character: @",
                "[line 4] Error at end: Expect expression.",
                "[line 4] Error: Unterminated string.",
            ]
            .join("\n")
        );
    }
}
