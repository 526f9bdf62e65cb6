//! Host driver: one persistent [`Interpreter`] fed whole programs or REPL
//! lines, with diagnostics routed to a [`Reporter`].

use log::{debug, info};

use crate::error::{LoxError, Reporter};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

pub struct Session<R: Reporter> {
    interpreter: Interpreter,
    reporter: R,
    had_error: bool,
    had_runtime_error: bool,
}

impl<R: Reporter> Session<R> {
    pub fn new(reporter: R) -> Self {
        Self::with_interpreter(Interpreter::new(), reporter)
    }

    pub fn with_interpreter(interpreter: Interpreter, reporter: R) -> Self {
        Session {
            interpreter,
            reporter,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Scans, parses, resolves and executes `source`.
    ///
    /// Any lexical, syntax or resolution error stops the run before
    /// execution. A runtime error abandons the remaining statements. Either
    /// way the interpreter's globals keep whatever earlier statements defined.
    pub fn run(&mut self, source: &str) {
        info!("Running {} byte(s) of source", source.len());

        let (tokens, lex_errors): (Vec<Token>, Vec<LoxError>) = Scanner::new(source).scan_all();
        let (statements, parse_errors): (Vec<Stmt>, Vec<LoxError>) = Parser::new(tokens).parse();

        let mut failed: bool = false;
        for error in lex_errors.iter().chain(parse_errors.iter()) {
            self.report(error);
            failed = true;
        }

        if failed {
            debug!("Compile errors; skipping resolution and execution");
            return;
        }

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            for error in &errors {
                self.report(error);
            }
            debug!("{} resolution error(s); skipping execution", errors.len());
            return;
        }

        if let Err(error) = self.interpreter.interpret(&statements) {
            debug!("Runtime error: {}", error.message);
            self.report(&LoxError::Runtime(error));
        }
    }

    /// Raises the flag matching the error's phase, then forwards it.
    fn report(&mut self, error: &LoxError) {
        if error.is_compile_time() {
            self.had_error = true;
        } else {
            self.had_runtime_error = true;
        }
        error.report(&mut self.reporter);
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Clears both flags; the REPL calls this between lines.
    pub fn reset_errors(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}
