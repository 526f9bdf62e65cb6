use std::fmt;

use chrono::Utc;
use log::debug;

use crate::callable::Callable;
use crate::error::RuntimeError;
use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// A host function exposed to scripts.
#[derive(Debug, Clone)]
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Result<Value, String>,
}

impl NativeFunction {
    /// `clock()`: seconds since the Unix epoch, with millisecond resolution.
    pub fn clock() -> Self {
        NativeFunction {
            name: "clock",
            arity: 0,
            func: |_args: &[Value]| {
                let millis: i64 = Utc::now().timestamp_millis();
                Ok(Value::Number(millis as f64 / 1000.0))
            },
        }
    }
}

/// Host functions defined in every fresh global environment.
pub fn builtins() -> Vec<NativeFunction> {
    vec![NativeFunction::clock()]
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> IResult<Value> {
        debug!("Calling native function '{}'", self.name);
        (self.func)(&arguments).map_err(|message| RuntimeError::new(paren, message))
    }
}

impl PartialEq for NativeFunction {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.arity == other.arity
    }
}

impl fmt::Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn>")
    }
}
