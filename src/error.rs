//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! All subsystems (scanner, parser, resolver, runtime, CLI) convert their
//! internal failure modes into one of the variants defined here.  Compile-time
//! diagnostics carry a line and a location fragment (` at 'x'`, ` at end` or
//! empty); runtime failures carry the offending [`Token`].
//!
//! The module **does not** print diagnostics itself except through a
//! [`Reporter`], the sink a host installs into a
//! [`Session`](crate::session::Session).

use std::io;
use thiserror::Error;

use log::debug;

use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        location: String,
        line: usize,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        location: String,
        line: usize,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**, positioned at `token`.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Helper constructor for the **resolver**, positioned at `token`.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            location: location_of(token),
            line: token.line,
        }
    }

    /// Forward this error to the matching `Reporter` callback.
    pub fn report(&self, reporter: &mut dyn Reporter) {
        match self {
            LoxError::Lex { message, line } => reporter.report(*line, "", message),

            LoxError::Parse {
                message,
                location,
                line,
            }
            | LoxError::Resolve {
                message,
                location,
                line,
            } => reporter.report(*line, location, message),

            LoxError::Runtime(error) => reporter.runtime_error(error),

            other => reporter.report(0, "", &other.to_string()),
        }
    }

    /// Compile-time errors (lex/parse/resolve) suppress execution of a run.
    pub fn is_compile_time(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }
}

/// `" at end"` for the end-of-input token, `" at 'lexeme'"` otherwise.
fn location_of(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Failure raised while executing a program; `token` locates it.
#[derive(Debug, Clone, Error)]
#[error("{message}\n[line {}]", .token.line)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!("Creating Runtime error: line={}, msg={}", token.line, message);

        RuntimeError {
            token: token.clone(),
            message,
        }
    }
}

/// Diagnostic sink supplied by the host.
pub trait Reporter {
    /// A line-addressed lexer, parser or resolver diagnostic.
    fn report(&mut self, line: usize, location: &str, message: &str);

    /// A runtime failure that aborted the current run.
    fn runtime_error(&mut self, error: &RuntimeError);
}

/// Writes diagnostics to standard error in the classic `jlox` format.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, line: usize, location: &str, message: &str) {
        eprintln!("[line {}] Error{}: {}", line, location, message);
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("{}", error);
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;
