use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use log::debug;

use crate::callable::Callable;
use crate::environment::{EnvRef, Environment};
use crate::instance::Instance;
use crate::interpreter::{Flow, IResult, Interpreter};
use crate::stmt::FunctionDecl;
use crate::token::Token;
use crate::value::Value;

/// A closure: a declaration plus the scope that was active where it was
/// declared.
#[derive(Clone)]
pub struct Function(Rc<FunctionImpl>);

pub struct FunctionImpl {
    pub declaration: Rc<FunctionDecl>,
    pub closure: EnvRef,
    pub is_initializer: bool,
}

impl Function {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Function(Rc::new(FunctionImpl {
            declaration,
            closure,
            is_initializer,
        }))
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    /// A new closure over the same body whose scope chain gains one layer
    /// binding `this` to `instance`.
    pub fn bind(&self, instance: Instance) -> Function {
        let environment: EnvRef = Environment::child_of(&self.closure);
        environment
            .borrow_mut()
            .define("this", Value::Instance(instance));

        Function::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> IResult<Value> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: EnvRef = Environment::child_of(&self.closure);
        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        // An initializer always yields its instance, even after `return;`.
        if self.is_initializer {
            return Environment::get_at(&self.closure, 0, &Token::synthetic("this", paren.line));
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Next => Ok(Value::Nil),
        }
    }
}

impl Deref for Function {
    type Target = FunctionImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Function {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

// Closures can reach themselves through their scope; print the name only.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name())
    }
}
