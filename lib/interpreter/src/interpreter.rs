use std::{cell::RefCell, io::Write, rc::Rc};

use errors::SyntaxErrors;
use log::{debug, trace};
use parser::{Expr, Stmt};
use scanner::{Line, Token, TokenType};

mod value;
pub use value::Value;

mod environment;
pub use environment::Environment;

#[derive(thiserror::Error, Debug)]
pub enum RuntimeErrorType {
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operands must be two numbers or two strings.")]
    OperandsMustBeNumbersOrStrings,
    #[error("Undefined variable '{0}'.")]
    UndefinedVariable(String),
}

#[derive(thiserror::Error, Debug)]
#[error("{error}")]
pub struct RuntimeError {
    error: RuntimeErrorType,
    line: Line,
}

impl RuntimeError {
    /// Attributes the error to the line of the operator or variable reference that caused it.
    pub fn new(error: RuntimeErrorType, token: &Token) -> Self {
        Self { error, line: token.line() }
    }

    pub fn error(&self) -> &RuntimeErrorType {
        &self.error
    }

    pub fn line(&self) -> Line {
        self.line
    }
}

#[derive(thiserror::Error, Debug)]
pub enum InterpretError {
    #[error("{0}")]
    Syntax(#[from] SyntaxErrors),
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, InterpretError>;

/// Tree-walking interpreter. `print` output goes to `output`, globals survive between runs.
#[derive(Debug)]
pub struct Interpreter<W: Write> {
    environment: Rc<RefCell<Environment>>,
    output: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(output: W) -> Self {
        Self::with_environment(Environment::new(), output)
    }

    pub fn with_environment(globals: Environment, output: W) -> Self {
        Self { environment: Rc::new(RefCell::new(globals)), output }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Scans, parses and runs `source`. Nothing is executed if there is any syntax error.
    pub fn run_source(&mut self, source: &str) -> Result<()> {
        let (tokens, scan_errors) = scanner::scan(source);
        let (stmts, parse_errors) = parser::parse(tokens);

        if !scan_errors.is_empty() || !parse_errors.is_empty() {
            let mut errors = SyntaxErrors::default();
            errors.extend(scan_errors);
            errors.extend(parse_errors.0);
            return Err(errors.sorted_by_line().into());
        }

        self.interpret(&stmts)
    }

    /// Executes `stmts` in order, stopping at the first runtime error.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            self.execute(stmt)?;
        }
        Ok(())
    }

    /// Runs `stmts` with `environment` as the current scope, then returns to the previous scope,
    /// also when a statement fails.
    pub fn execute_block(&mut self, stmts: &[Stmt], environment: Environment) -> Result<()> {
        let mut scope = EnclosedScope::enter(self, environment);

        for stmt in stmts {
            scope.interpreter.execute(stmt)?;
        }

        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                trace!("Defining {} = {:?}", name.lexeme(), value);
                self.environment.borrow_mut().define(name.lexeme(), value);
            }
            Stmt::Block(stmts) => {
                let environment = Environment::with_enclosing(self.environment.clone());
                self.execute_block(stmts, environment)?;
            }
            Stmt::If { condition, then_branch, else_branch } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
            }
        }
        Ok(())
    }

    pub fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, RuntimeError> {
        use RuntimeErrorType::*;

        match expr {
            Expr::Literal(literal) => Ok(literal.into()),

            Expr::Grouping(expr) => self.evaluate(expr),

            Expr::Variable(name) => self.environment.borrow().get(name),

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment.borrow_mut().assign(name, value.clone())?;
                Ok(value)
            }

            Expr::Unary { operator, right } => {
                let right = self.evaluate(right)?;
                match operator.ty() {
                    TokenType::Minus => right
                        .negate()
                        .ok_or_else(|| RuntimeError::new(OperandMustBeNumber, operator)),
                    TokenType::Bang => Ok((!right.is_truthy()).into()),
                    _ => unreachable!("Not a unary operator: {}", operator.lexeme()),
                }
            }

            Expr::Logical { left, operator, right } => {
                let left = self.evaluate(left)?;
                let short_circuit = match operator.ty() {
                    TokenType::Or => left.is_truthy(),
                    TokenType::And => !left.is_truthy(),
                    _ => unreachable!("Not a logical operator: {}", operator.lexeme()),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Binary { left, operator, right } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;

                let result = match operator.ty() {
                    TokenType::Plus => left.add(&right).ok_or(OperandsMustBeNumbersOrStrings),
                    TokenType::Minus => {
                        left.numeric(&right, |a, b| a - b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::Star => {
                        left.numeric(&right, |a, b| a * b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::Slash => {
                        left.numeric(&right, |a, b| a / b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::Greater => {
                        left.numeric(&right, |a, b| a > b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::GreaterEqual => {
                        left.numeric(&right, |a, b| a >= b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::Less => {
                        left.numeric(&right, |a, b| a < b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::LessEqual => {
                        left.numeric(&right, |a, b| a <= b).ok_or(OperandsMustBeNumbers)
                    }
                    TokenType::EqualEqual => Ok(left.equals(&right).into()),
                    TokenType::BangEqual => Ok((!left.equals(&right)).into()),
                    _ => unreachable!("Not a binary operator: {}", operator.lexeme()),
                };

                result.map_err(|error| RuntimeError::new(error, operator))
            }
        }
    }
}

/// Swaps a new environment in for the duration of a block and puts the previous one back on drop.
struct EnclosedScope<'i, W: Write> {
    interpreter: &'i mut Interpreter<W>,
    previous: Rc<RefCell<Environment>>,
}

impl<'i, W: Write> EnclosedScope<'i, W> {
    fn enter(interpreter: &'i mut Interpreter<W>, environment: Environment) -> Self {
        debug!("Entering block scope");
        let previous =
            std::mem::replace(&mut interpreter.environment, Rc::new(RefCell::new(environment)));
        Self { interpreter, previous }
    }
}

impl<W: Write> Drop for EnclosedScope<'_, W> {
    fn drop(&mut self) {
        debug!("Leaving block scope");
        std::mem::swap(&mut self.interpreter.environment, &mut self.previous);
    }
}
