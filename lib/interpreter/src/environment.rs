use std::{cell::RefCell, collections::HashMap, rc::Rc};

use scanner::Token;

use crate::{value::Value, RuntimeError, RuntimeErrorType};

/// Variable bindings of one scope, linked to the scope it is nested in.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Self { values: HashMap::new(), enclosing: Some(enclosing) }
    }

    /// Always binds in this scope, silently replacing an earlier binding of the same name.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        match self.values.get(name.lexeme()) {
            Some(value) => Ok(value.clone()),
            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name),
                None => Err(undefined_variable(name)),
            },
        }
    }

    /// Updates the nearest scope that already binds `name`, never creating a binding.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name.lexeme()) {
            *slot = value;
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),
            None => Err(undefined_variable(name)),
        }
    }
}

fn undefined_variable(name: &Token) -> RuntimeError {
    RuntimeError::new(RuntimeErrorType::UndefinedVariable(name.lexeme().to_string()), name)
}
