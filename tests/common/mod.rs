#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::{Reporter, RuntimeError};
use rox::interpreter::Interpreter;
use rox::session::Session;

/// A `print` sink the test keeps a handle to after the interpreter takes it.
#[derive(Clone, Default)]
pub struct SharedOutput(Rc<RefCell<Vec<u8>>>);

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Records diagnostics in the same text form `StderrReporter` prints.
#[derive(Default)]
pub struct CollectingReporter {
    pub diagnostics: Vec<String>,
}

impl Reporter for CollectingReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        self.diagnostics
            .push(format!("[line {}] Error{}: {}", line, location, message));
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        self.diagnostics.push(error.to_string());
    }
}

pub fn session() -> (Session<CollectingReporter>, SharedOutput) {
    let output = SharedOutput::default();
    let interpreter = Interpreter::with_output(output.clone());

    (
        Session::with_interpreter(interpreter, CollectingReporter::default()),
        output,
    )
}

/// Runs `source` in a fresh session, returning printed output and diagnostics.
pub fn run(source: &str) -> (String, Vec<String>) {
    let (mut session, output) = session();
    session.run(source);

    (output.contents(), session.reporter().diagnostics.clone())
}
