use crate::interpreter::{IResult, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Anything a call expression can invoke: closures, classes and host
/// functions.  The interpreter checks `arity` before calling.
pub trait Callable {
    fn arity(&self) -> usize;

    /// `paren` is the call's closing parenthesis, used to locate errors.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> IResult<Value>;
}
