use std::fmt::{self, Display, Formatter};

use scanner::Token;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    Binary { left: Box<Expr<'a>>, operator: Token<'a>, right: Box<Expr<'a>> },
    // Same shape as `Binary`, but the right operand is only evaluated when needed.
    Logical { left: Box<Expr<'a>>, operator: Token<'a>, right: Box<Expr<'a>> },
    Grouping(Box<Expr<'a>>),
    Unary { operator: Token<'a>, right: Box<Expr<'a>> },
    Literal(LiteralValue<'a>),
    Variable(Token<'a>),
    Assign { name: Token<'a>, value: Box<Expr<'a>> },
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { left, operator, right } | Expr::Logical { left, operator, right } => {
                write!(f, "({} {} {})", operator.lexeme(), left, right)
            }
            Expr::Grouping(expression) => write!(f, "(group {})", expression),
            Expr::Unary { operator, right } => write!(f, "({} {})", operator.lexeme(), right),
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name.lexeme()),
            Expr::Assign { name, value } => write!(f, "({} {})", name.lexeme(), value),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue<'a> {
    Number(f64),
    Str(&'a str),
    Boolean(bool),
    Nil,
}

impl Display for LiteralValue<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            // f64's Display is already the shortest form that round-trips: 1.0 => "1", 2.50 => "2.5"
            LiteralValue::Number(n) => write!(f, "{n}"),
            LiteralValue::Str(s) => write!(f, "{s}"),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Nil => write!(f, "nil"),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use scanner::{Line, TokenData};

    use super::*;

    fn number(n: f64) -> Box<Expr<'static>> {
        Box::new(Expr::Literal(LiteralValue::Number(n)))
    }

    #[test]
    fn literals() {
        assert_eq!(LiteralValue::Number(1.0).to_string(), "1");
        assert_eq!(LiteralValue::Number(2.5).to_string(), "2.5");
        assert_eq!(LiteralValue::Number(0.125).to_string(), "0.125");
        assert_eq!(LiteralValue::Str("hi there").to_string(), "hi there");
        assert_eq!(LiteralValue::Boolean(false).to_string(), "false");
        assert_eq!(LiteralValue::Nil.to_string(), "nil");
    }

    #[test]
    fn nested_expression() {
        // -123 * (45.67)
        let expr = Expr::Binary {
            left: Box::new(Expr::Unary {
                operator: Token::new(TokenData::Minus, "-", Line(1)),
                right: number(123.0),
            }),
            operator: Token::new(TokenData::Star, "*", Line(1)),
            right: Box::new(Expr::Grouping(number(45.67))),
        };
        assert_eq!(expr.to_string(), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn assignment_and_logical() {
        let expr = Expr::Assign {
            name: Token::new(TokenData::Identifier, "a", Line(1)),
            value: Box::new(Expr::Logical {
                left: Box::new(Expr::Variable(Token::new(TokenData::Identifier, "b", Line(1)))),
                operator: Token::new(TokenData::Or, "or", Line(1)),
                right: Box::new(Expr::Literal(LiteralValue::Nil)),
            }),
        };
        assert_eq!(expr.to_string(), "(a (or b nil))");
    }
}
