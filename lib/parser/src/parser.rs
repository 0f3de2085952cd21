use std::iter::Peekable;

use errors::{SyntaxError, SyntaxErrors};
use log::{debug, trace};
use scanner::{Token, TokenData, TokenType};

mod expr;
pub use expr::{Expr, LiteralValue};

mod stmt;
pub use stmt::Stmt;

use TokenType::*;

type Result<T> = std::result::Result<T, SyntaxError>;

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum ParserErrorType {
    #[error("Expect expression.")]
    ExpectedExpression,
    #[error("Expect end of expression.")]
    ExpectedEndOfExpression,
    #[error("Expect '(' after '{0}'.")]
    ExpectedLeftParen(&'static str),
    #[error("Expect ')' after {0}.")]
    ExpectedRightParen(&'static str),
    #[error("Expect '}}' after {0}.")]
    ExpectedRightBrace(&'static str),
    #[error("Expect ';' after {0}.")]
    ExpectedSemicolonAfter(&'static str),
    #[error("Expect variable name.")]
    ExpectedVariableName,
    #[error("Invalid assignment target.")]
    InvalidAssignmentTarget,
}

impl ParserErrorType {
    fn at(self, token: &Token) -> SyntaxError {
        SyntaxError::at(token, self)
    }
}

/// Recursive-descent parser over a scanned token sequence.
///
/// Errors inside a declaration are collected and parsing resumes at the next statement boundary,
/// so one pass reports every independent syntax error.
#[derive(Debug)]
pub struct Parser<'a> {
    tokens: Peekable<std::vec::IntoIter<Token<'a>>>,
    // Number of tokens consumed so far, used to guarantee progress when synchronizing.
    consumed: usize,
    errors: SyntaxErrors,
}

impl<'a> Parser<'a> {
    pub fn new(mut tokens: Vec<Token<'a>>) -> Self {
        if tokens.last().map(Token::ty) != Some(Eof) {
            let line = tokens.last().map(Token::line).unwrap_or(scanner::Line(1));
            tokens.push(Token::eof(line));
        }
        Self { tokens: tokens.into_iter().peekable(), consumed: 0, errors: SyntaxErrors::default() }
    }

    pub fn parse(mut self) -> (Vec<Stmt<'a>>, SyntaxErrors) {
        let mut stmts = Vec::new();
        while self.peek() != Eof {
            stmts.extend(self.declaration());
        }

        debug!("Parsed {} statements with {} errors", stmts.len(), self.errors.len());
        (stmts, self.errors)
    }

    /// Parses a single expression that must span the whole input.
    pub fn parse_expression(mut self) -> std::result::Result<Expr<'a>, SyntaxErrors> {
        let result = self.expression().and_then(|expr| {
            self.consume_or_error(Eof, ParserErrorType::ExpectedEndOfExpression)?;
            Ok(expr)
        });

        match result {
            Ok(expr) if self.errors.is_empty() => Ok(expr),
            Ok(_) => Err(self.errors),
            Err(e) => {
                self.errors.push(e);
                Err(self.errors)
            }
        }
    }

    fn declaration(&mut self) -> Option<Stmt<'a>> {
        let start = self.consumed;
        let result = if self.consume(Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                trace!("Hit error: {}, syncing...", e);
                self.errors.push(e);
                self.synchronize(start);
                None
            }
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt<'a>> {
        let name = self.consume_or_error(Identifier, ParserErrorType::ExpectedVariableName)?;

        let initializer = match self.consume(Equal) {
            Some(_) => Some(self.expression()?),
            None => None,
        };

        self.consume_or_error(
            Semicolon,
            ParserErrorType::ExpectedSemicolonAfter("variable declaration"),
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt<'a>> {
        match self.peek() {
            Print => {
                self.advance();
                self.print_statement()
            }
            LeftBrace => {
                self.advance();
                Ok(Stmt::Block(self.block()?))
            }
            If => {
                self.advance();
                self.if_statement()
            }
            While => {
                self.advance();
                self.while_statement()
            }
            For => {
                self.advance();
                self.for_statement()
            }
            _ => self.expression_statement(),
        }
    }

    /// `for` has no node of its own, it is rewritten into a block holding the initializer and a
    /// `while` loop whose body runs the original body followed by the increment.
    fn for_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("for"))?;

        let initializer = if self.consume(Semicolon).is_some() {
            None
        } else if self.consume(Var).is_some() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.peek() == Semicolon {
            Expr::Literal(LiteralValue::Boolean(true))
        } else {
            self.expression()?
        };
        self.consume_or_error(
            Semicolon,
            ParserErrorType::ExpectedSemicolonAfter("loop condition"),
        )?;

        let increment = if self.peek() == RightParen { None } else { Some(self.expression()?) };
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("for clauses"))?;

        let body = self.statement()?;

        let while_stmt = Stmt::While {
            condition,
            body: Box::new(Stmt::Block(
                [Some(body), increment.map(Stmt::Expression)].into_iter().flatten().collect(),
            )),
        };

        Ok(Stmt::Block([initializer, Some(while_stmt)].into_iter().flatten().collect()))
    }

    fn while_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("while"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("condition"))?;

        let body = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn if_statement(&mut self) -> Result<Stmt<'a>> {
        self.consume_or_error(LeftParen, ParserErrorType::ExpectedLeftParen("if"))?;
        let condition = self.expression()?;
        self.consume_or_error(RightParen, ParserErrorType::ExpectedRightParen("if condition"))?;

        let then_branch = Box::new(self.statement()?);

        // Binds to the innermost `if`, since the nested statement() call gets to see it first.
        let else_branch = match self.consume(Else) {
            Some(_) => Some(Box::new(self.statement()?)),
            None => None,
        };

        Ok(Stmt::If { condition, then_branch, else_branch })
    }

    fn block(&mut self) -> Result<Vec<Stmt<'a>>> {
        let mut stmts = Vec::new();

        while !matches!(self.peek(), RightBrace | Eof) {
            stmts.extend(self.declaration());
        }

        self.consume_or_error(RightBrace, ParserErrorType::ExpectedRightBrace("block"))?;
        Ok(stmts)
    }

    fn print_statement(&mut self) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfter("value"))?;
        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt<'a>> {
        let value = self.expression()?;
        self.consume_or_error(Semicolon, ParserErrorType::ExpectedSemicolonAfter("expression"))?;
        Ok(Stmt::Expression(value))
    }

    fn expression(&mut self) -> Result<Expr<'a>> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr<'a>> {
        let expr = self.or()?;

        let Some(equals) = self.consume(Equal) else {
            return Ok(expr);
        };

        let value = Box::new(self.assignment()?);
        match expr {
            Expr::Variable(name) => Ok(Expr::Assign { name, value }),
            expr => {
                // Not worth synchronizing over, the parser is still in a consistent state.
                self.errors.push(ParserErrorType::InvalidAssignmentTarget.at(&equals));
                Ok(expr)
            }
        }
    }

    fn or(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.and()?;

        while let Some(operator) = self.consume(Or) {
            let right = Box::new(self.and()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn and(&mut self) -> Result<Expr<'a>> {
        let mut expr = self.equality()?;

        while let Some(operator) = self.consume(And) {
            let right = Box::new(self.equality()?);
            expr = Expr::Logical { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr<'a>> {
        self.left_associative(&[BangEqual, EqualEqual], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr<'a>> {
        self.left_associative(&[Greater, GreaterEqual, Less, LessEqual], Self::term)
    }

    fn term(&mut self) -> Result<Expr<'a>> {
        self.left_associative(&[Minus, Plus], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr<'a>> {
        self.left_associative(&[Slash, Star], Self::unary)
    }

    fn left_associative(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr<'a>>,
    ) -> Result<Expr<'a>> {
        let mut expr = operand(self)?;

        while operators.contains(&self.peek()) {
            let operator = self.advance();
            let right = Box::new(operand(self)?);
            expr = Expr::Binary { left: Box::new(expr), operator, right };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr<'a>> {
        if let Minus | Bang = self.peek() {
            let operator = self.advance();
            let right = Box::new(self.unary()?);
            return Ok(Expr::Unary { operator, right });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr<'a>> {
        let literal = match self.peek_token().data.clone() {
            TokenData::False => LiteralValue::Boolean(false),
            TokenData::True => LiteralValue::Boolean(true),
            TokenData::Nil => LiteralValue::Nil,
            TokenData::Number(n) => LiteralValue::Number(n),
            TokenData::Str(s) => LiteralValue::Str(s),
            TokenData::Identifier => return Ok(Expr::Variable(self.advance())),
            TokenData::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume_or_error(
                    RightParen,
                    ParserErrorType::ExpectedRightParen("expression"),
                )?;
                return Ok(Expr::Grouping(Box::new(expr)));
            }
            _ => return Err(ParserErrorType::ExpectedExpression.at(self.peek_token())),
        };

        self.advance();
        Ok(Expr::Literal(literal))
    }

    /// Discards tokens up to and including the next `;`, or up to the next token that starts a
    /// statement. At least one token is discarded if the failed declaration consumed none.
    fn synchronize(&mut self, declaration_start: usize) {
        if self.consumed == declaration_start {
            self.advance();
        }

        loop {
            trace!("Syncing... {:?}", self.peek_token());
            match self.peek() {
                Semicolon => {
                    self.advance();
                    return;
                }
                Class | Fun | Var | For | If | While | Print | Return | Eof => return,
                _ => {
                    self.advance();
                }
            }
        }
    }
}

// Helpers
impl<'a> Parser<'a> {
    fn peek_token(&mut self) -> &Token<'a> {
        self.tokens.peek().unwrap_or_else(|| unreachable!("Eof is never consumed"))
    }

    fn peek(&mut self) -> TokenType {
        self.peek_token().ty()
    }

    /// Consumes the next token. At the end of input, the `Eof` token is returned again and again.
    fn advance(&mut self) -> Token<'a> {
        if self.peek() == Eof {
            return self.peek_token().clone();
        }

        self.consumed += 1;
        self.tokens.next().unwrap_or_else(|| unreachable!("Eof is never consumed"))
    }

    fn consume(&mut self, token_type: TokenType) -> Option<Token<'a>> {
        (self.peek() == token_type).then(|| self.advance())
    }

    fn consume_or_error(
        &mut self,
        token_type: TokenType,
        error: ParserErrorType,
    ) -> Result<Token<'a>> {
        match self.consume(token_type) {
            Some(token) => Ok(token),
            None => Err(error.at(self.peek_token())),
        }
    }
}

/// Parses a whole program, see [`Parser::parse`].
pub fn parse(tokens: Vec<Token<'_>>) -> (Vec<Stmt<'_>>, SyntaxErrors) {
    Parser::new(tokens).parse()
}
