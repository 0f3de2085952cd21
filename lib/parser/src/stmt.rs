use std::fmt::{self, Display, Formatter};

use itertools::Itertools;
use scanner::Token;

use crate::Expr;

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    Expression(Expr<'a>),
    Print(Expr<'a>),
    Var { name: Token<'a>, initializer: Option<Expr<'a>> },
    Block(Vec<Stmt<'a>>),
    If { condition: Expr<'a>, then_branch: Box<Stmt<'a>>, else_branch: Option<Box<Stmt<'a>>> },
    While { condition: Expr<'a>, body: Box<Stmt<'a>> },
}

impl Display for Stmt<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expression(expr) => write!(f, "(; {})", expr),
            Stmt::Print(expr) => write!(f, "(print {})", expr),
            Stmt::Var { name, initializer: None } => write!(f, "(var {})", name.lexeme()),
            Stmt::Var { name, initializer: Some(init) } => {
                write!(f, "(var {} {})", name.lexeme(), init)
            }
            Stmt::Block(stmts) if stmts.is_empty() => write!(f, "(block)"),
            Stmt::Block(stmts) => write!(f, "(block {})", stmts.iter().join(" ")),
            Stmt::If { condition, then_branch, else_branch: None } => {
                write!(f, "(if {} {})", condition, then_branch)
            }
            Stmt::If { condition, then_branch, else_branch: Some(else_branch) } => {
                write!(f, "(if-else {} {} {})", condition, then_branch, else_branch)
            }
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
        }
    }
}
