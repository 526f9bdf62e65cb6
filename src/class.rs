use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use log::debug;

use crate::callable::Callable;
use crate::function::Function;
use crate::instance::Instance;
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Name of the constructor method.
pub const INITIALIZER: &str = "init";

#[derive(Clone)]
pub struct Class(Rc<ClassImpl>);

pub struct ClassImpl {
    pub name: String,
    pub superclass: Option<Class>,
    pub methods: HashMap<String, Function>,
}

impl Class {
    pub fn new(name: &str, superclass: Option<Class>, methods: HashMap<String, Function>) -> Self {
        Class(Rc::new(ClassImpl {
            name: name.to_string(),
            superclass,
            methods,
        }))
    }

    /// Own table first, then each superclass in turn; first match wins.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        let mut class: Option<&Class> = Some(self);

        while let Some(current) = class {
            if let Some(method) = current.methods.get(name) {
                return Some(method.clone());
            }
            class = current.superclass.as_ref();
        }

        None
    }
}

impl Callable for Class {
    /// The initializer's arity, or zero without one.
    fn arity(&self) -> usize {
        self.find_method(INITIALIZER)
            .map_or(0, |init| init.arity())
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> IResult<Value> {
        debug!("Instantiating class '{}'", self.name);

        let instance: Instance = Instance::new(self.clone());

        if let Some(initializer) = self.find_method(INITIALIZER) {
            initializer
                .bind(instance.clone())
                .call(interpreter, arguments, paren)?;
        }

        Ok(Value::Instance(instance))
    }
}

impl Deref for Class {
    type Target = ClassImpl;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.name)
    }
}
