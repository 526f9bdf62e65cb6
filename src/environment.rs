use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// Shared handle to a scope.  Closures, bound methods and the interpreter's
/// current scope all alias the same record; writes are visible to every holder.
pub type EnvRef = Rc<RefCell<Environment>>;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Insert-or-overwrite in this scope only.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}' = {}", name, value);
        self.values.insert(name.to_string(), value);
    }

    /// Walks the chain outward; exhausting it is an undefined-variable error.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// The scope exactly `distance` enclosing links above `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> EnvRef {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: Option<EnvRef> = current.borrow().enclosing.clone();
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }

        current
    }

    /// Reads `name` from the scope `distance` hops out, without walking further.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
        let scope: EnvRef = Self::ancestor(env, distance);
        let value: Option<Value> = scope.borrow().values.get(&name.lexeme).cloned();

        value.ok_or_else(|| undefined(name))
    }

    pub fn assign_at(
        env: &EnvRef,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let scope: EnvRef = Self::ancestor(env, distance);
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(undefined(name)),
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Token {
        Token::synthetic(name, 1)
    }

    #[test]
    fn lookup_walks_enclosing_chain() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::child_of(&globals);

        let value = inner.borrow().get(&ident("a")).unwrap();
        assert_eq!(value, Value::Number(1.0));
    }

    #[test]
    fn missing_name_is_undefined_variable() {
        let env = Environment::new();
        let err = env.get(&ident("nope")).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'nope'.");
    }

    #[test]
    fn assign_at_writes_exact_scope() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("x", Value::Number(1.0));
        let inner: EnvRef = Environment::child_of(&outer);
        inner.borrow_mut().define("x", Value::Number(2.0));

        Environment::assign_at(&inner, 1, &ident("x"), Value::Number(10.0)).unwrap();

        assert_eq!(
            Environment::get_at(&inner, 0, &ident("x")).unwrap(),
            Value::Number(2.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 1, &ident("x")).unwrap(),
            Value::Number(10.0)
        );
    }

    #[test]
    fn child_scopes_alias_their_parent() {
        let shared: EnvRef = Rc::new(RefCell::new(Environment::new()));
        shared.borrow_mut().define("n", Value::Number(0.0));
        let a: EnvRef = Environment::child_of(&shared);
        let b: EnvRef = Environment::child_of(&shared);

        a.borrow_mut().assign(&ident("n"), Value::Number(5.0)).unwrap();

        assert_eq!(b.borrow().get(&ident("n")).unwrap(), Value::Number(5.0));
    }
}
