use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::class::Class;
use crate::error::RuntimeError;
use crate::interpreter::IResult;
use crate::token::Token;
use crate::value::Value;

#[derive(Clone)]
pub struct Instance(Rc<InstanceImpl>);

pub struct InstanceImpl {
    class: Class,
    fields: RefCell<HashMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Class) -> Self {
        Instance(Rc::new(InstanceImpl {
            class,
            fields: RefCell::new(HashMap::new()),
        }))
    }

    /// Fields shadow methods; a method is returned bound to this instance.
    pub fn get(&self, name: &Token) -> IResult<Value> {
        if let Some(value) = self.0.fields.borrow().get(&name.lexeme) {
            return Ok(value.clone());
        }

        match self.0.class.find_method(&name.lexeme) {
            Some(method) => Ok(Value::Function(method.bind(self.clone()))),
            None => Err(RuntimeError::new(
                name,
                format!("Undefined property '{}'.", name.lexeme),
            )),
        }
    }

    /// Creates the field on first write.
    pub fn set(&self, name: &Token, value: Value) {
        self.0
            .fields
            .borrow_mut()
            .insert(name.lexeme.clone(), value);
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.0.class.name)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({})", self.0.class.name)
    }
}
