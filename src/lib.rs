//! Lispy - a minimal S-expression language
//!
//! This crate provides the evaluator for a small Lisp: a tagged value model, a chain of
//! lexical environments, and a recursive evaluator with four special forms, closures and a
//! library of primitive builtins. A reader, a printer and a read-eval-print session are
//! provided around that core.
//!
//! ```scheme
//! (define x 10)                 ; => 10
//! ((lambda (y) (* y y)) 5)      ; => 25
//! (head (list 1 2 3))           ; => 1
//! (if (> 3 2) 1 0)              ; => 1
//! (eval (quote (+ 1 2)))        ; => 3
//! (define (add a b) (+ a b))    ; => (lambda (a b) ...)
//! 'sym                          ; => sym
//! ```
//!
//! ## Strict Typing
//!
//! - Numbers are IEEE-754 doubles; there is no other numeric type
//! - `if` requires an actual boolean condition (no "truthiness")
//! - Every builtin checks its arity and the tags of its arguments
//! - Errors abort the evaluation; they are never turned into values
//!
//! ## Modules
//!
//! - `ast`: The tagged [`ast::Value`] type and its printed form
//! - `evaluator`: Environments and the evaluation algorithm
//! - `builtinops`: Primitive operations registered into the global environment
//! - `scheme`: S-expression reader (feature `scheme`)
//! - `session`: Persistent read-eval-print session (feature `scheme`)

use crate::evaluator::Arity;
use thiserror::Error;

/// Maximum parsing depth to prevent stack overflow in the recursive-descent reader
pub const MAX_PARSE_DEPTH: usize = 128;

/// Categorizes the different kinds of reading errors.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad tokens, malformed expressions)
    InvalidSyntax,
    /// Input ended before the expression was complete (empty input, unclosed parens)
    Incomplete,
    /// Expression nesting exceeded the maximum parse depth
    TooDeeplyNested,
    /// Extra input found after a complete, valid expression
    TrailingContent,
    /// Numeric literal that does not convert to a finite double
    InvalidNumber,
}

/// A structured error providing detailed information about a reading failure.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub message: String,
    /// Context snippet from the input showing where the error occurred (max 100 chars)
    pub context: Option<String>,
    /// The problematic token or character encountered, if identifiable
    pub found: Option<String>,
}

impl ParseError {
    pub fn new(
        kind: ParseErrorKind,
        message: impl Into<String>,
        context: Option<String>,
        found: Option<String>,
    ) -> Self {
        ParseError {
            kind,
            message: message.into(),
            context,
            found,
        }
    }

    /// Create a simple ParseError with a kind and message but no context
    pub fn from_message(kind: ParseErrorKind, message: impl Into<String>) -> Self {
        Self::new(kind, message, None, None)
    }

    /// Create a ParseError with context extracted from input at a given byte offset
    pub fn with_context(
        kind: ParseErrorKind,
        message: impl Into<String>,
        input: &str,
        error_offset: usize,
    ) -> Self {
        const MAX_CONTEXT: usize = 100;

        let error_offset = error_offset.min(input.len());
        let found = input[error_offset..]
            .split_whitespace()
            .next()
            .map(str::to_owned);

        let char_offset = input[..error_offset].chars().count();
        let context_start = char_offset.saturating_sub(20);
        let context_str: String = input
            .chars()
            .skip(context_start)
            .take(MAX_CONTEXT)
            .collect();

        let mut display_context = String::new();
        if context_start > 0 {
            display_context.push_str("[...]");
        }
        display_context.push_str(&context_str);
        if context_start + context_str.chars().count() < input.chars().count() {
            display_context.push_str("[...]");
        }

        let display_context = display_context.replace('\n', "\\n").replace('\r', "");

        Self::new(kind, message, Some(display_context), found)
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(found) = &self.found {
            write!(f, "\nFound: {found}")?;
        }
        if let Some(context) = &self.context {
            write!(f, "\nContext: {context}")?;
        }
        Ok(())
    }
}

/// Error types for the interpreter
///
/// The first error raised aborts the whole evaluation and is returned to the top-level caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("ReadError: {0}")]
    ReadError(ParseError),
    /// Malformed special form
    #[error("SyntaxError: {0}")]
    SyntaxError(String),
    #[error("TypeError: {0}")]
    TypeError(String),
    #[error("NameError: undefined variable '{0}'")]
    NameError(String),
    #[error("ArityError: {callee} expected {expected} argument(s), got {got}")]
    ArityError {
        callee: String,
        expected: Arity,
        got: usize,
    },
    #[error("DivisionByZero: division by zero")]
    DivisionByZero,
    /// Head of an application evaluated to something that cannot be called
    #[error("UnknownProcedure: {0} is not a procedure")]
    UnknownProcedure(String),
    /// `head`/`tail` applied to `()`
    #[error("EmptyList: {0} applied to an empty list")]
    EmptyList(String),
    #[error("DepthExceeded: evaluation depth limit exceeded (max: {0})")]
    DepthExceeded(usize),
}

impl Error {
    pub fn arity_error(callee: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::ArityError {
            callee: callee.into(),
            expected,
            got,
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Error::SyntaxError(message.into())
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Error::TypeError(message.into())
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Self {
        Error::ReadError(error)
    }
}

pub mod ast;
pub mod builtinops;
pub mod evaluator;
mod stack;

#[cfg(feature = "scheme")]
pub mod scheme;

#[cfg(feature = "scheme")]
pub mod session;

pub use ast::Value;
pub use evaluator::{EvalConfig, Environment, create_global_env, eval};
