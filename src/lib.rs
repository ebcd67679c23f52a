//! Tatu - a small S-expression scripting language
//!
//! This crate provides a tree-walking interpreter for Tatu, a dynamically typed
//! S-expression language with lexical closures, mutable shared containers and
//! explicit self tail calls through `recur`.
//!
//! ```text
//! (def fact (n acc)
//!   (if (= n 0)
//!       acc
//!       (recur (- n 1) (* acc n))))
//!
//! (fact 5 1)              ; 120
//! (+ "a" 1 "b")           ; "a1b"
//! (var v (vector 1 2 3))
//! (vec:push v 4)          ; v is mutated in place
//! ```
//!
//! ## Strict Typing
//!
//! - No truthiness: `if`, `while`, `and`, `or` and `not` require actual booleans
//! - Comparisons require operands of the same type
//! - Every operator and native function validates its arity before running
//!
//! ## Pipeline
//!
//! Source text goes through the [`scanner`] (tokens), the [`parser`] (AST nodes,
//! rewritten by [`sugar`] and validated by [`analysis`]), the [`builder`]
//! (flattens top-level `include` forms) and finally the [`evaluator`].
//!
//! ## Modules
//!
//! - `location`: source positions attached to tokens, nodes and errors
//! - `ast`: tokens and AST nodes
//! - `scanner`, `parser`, `sugar`, `analysis`: text to validated AST
//! - `builder`: program assembly with include resolution
//! - `value`, `environment`: the runtime data model
//! - `evaluator`: strict/tail evaluation and the `recur` trampoline
//! - `builtinops`: operator table and the native function registry
//! - `stdlib`: `math:`, `str:`, `vec:`, `map:`, `time:`, `json:`, `regex:` and `fs:` natives
//! - `pretty`: colored token, AST and error dumps for the command line

use std::fmt;

use crate::builtinops::Arity;
use crate::location::Location;

pub mod analysis;
pub mod ast;
pub mod builder;
pub mod builtinops;
pub mod environment;
pub mod evaluator;
pub mod location;
pub mod parser;
pub mod pretty;
pub mod scanner;
pub mod stdlib;
pub mod sugar;
pub mod value;

/// Maximum list nesting accepted by the parser
pub const MAX_PARSE_DEPTH: usize = 256;

/// Maximum nesting of evaluations (sub-expressions plus non-`recur` calls)
/// before evaluation is aborted with a [`ErrorKind::LimitExceeded`] error.
/// Tail calls written with `recur` do not count against this limit.
pub const MAX_EVAL_DEPTH: usize = 20_000;

/// Largest string, in bytes, a native may build in one call
pub const MAX_STRING_LEN: usize = 1 << 30;

/// Categorizes the different kinds of parsing errors.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ParseErrorKind {
    /// Invalid or unexpected syntax (bad characters, stray parentheses)
    InvalidSyntax,
    /// Input ended before the expression was complete (unterminated string, unclosed parens)
    Incomplete,
    /// Expression nesting exceeded [`MAX_PARSE_DEPTH`]
    TooDeeplyNested,
    /// A special form or operator with the wrong shape, caught before evaluation
    InvalidForm,
}

/// What went wrong, independent of where.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ErrorKind {
    #[error("{message}")]
    Parse {
        kind: ParseErrorKind,
        message: String,
    },
    #[error("unknown symbol `{0}`")]
    UnboundSymbol(String),
    #[error("symbol `{0}` already defined")]
    AlreadyDefined(String),
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("{0}")]
    Type(String),
    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: Arity,
        got: usize,
    },
    /// Domain errors raised by native functions (division by zero, bounds, ...)
    #[error("{0}")]
    Eval(String),
    #[error("recur can only be used in tail position of a function")]
    RecurOutsideTail,
    #[error("{0}")]
    Io(String),
    #[error("{0}")]
    LimitExceeded(String),
}

/// Error type for the interpreter: an [`ErrorKind`] plus the source location
/// of the failing form, when known.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    pub kind: ErrorKind,
    pub location: Option<Location>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Error {
            kind,
            location: None,
        }
    }

    pub fn parse(kind: ParseErrorKind, message: impl Into<String>, location: &Location) -> Self {
        Error::new(ErrorKind::Parse {
            kind,
            message: message.into(),
        })
        .at(location)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Type(message.into()))
    }

    pub fn eval_error(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Eval(message.into()))
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        Error::new(ErrorKind::Io(message.into()))
    }

    pub fn arity_error(name: impl Into<String>, expected: Arity, got: usize) -> Self {
        Error::new(ErrorKind::Arity {
            name: name.into(),
            expected,
            got,
        })
    }

    /// Attach `location` unless the error already carries one. The innermost
    /// failing form is the most useful place to point at.
    #[must_use]
    pub fn at(mut self, location: &Location) -> Self {
        if self.location.is_none() {
            self.location = Some(location.clone());
        }
        self
    }

    /// The parse error kind, if this is a parse error
    pub fn parse_kind(&self) -> Option<ParseErrorKind> {
        match &self.kind {
            ErrorKind::Parse { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Render the error next to the offending source line:
    ///
    /// ```text
    /// Error on line 1, column 4, file `main.tatu`:
    ///
    /// (+ 1 "a" true)
    ///    ↑
    ///    └─ `+` expects NUMBER at argument 3, got BOOL
    /// ```
    pub fn render(&self, source: &str) -> String {
        let Some(location) = &self.location else {
            return self.to_string();
        };
        let line = location.start.line;
        let column = location.start.column;
        let raw_line = source
            .lines()
            .nth(line.saturating_sub(1))
            .unwrap_or_default();
        let padding = " ".repeat(column.saturating_sub(1));

        format!(
            "Error on line {line}, column {column}, file `{}`:\n\n{raw_line}\n{padding}↑\n{padding}└─ {}",
            location.file, self.kind
        )
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error::new(kind)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.location {
            Some(location) => write!(
                f,
                "[Line {}][Column {}] Error: {}",
                location.start.line, location.start.column, self.kind
            ),
            None => write!(f, "Error: {}", self.kind),
        }
    }
}

impl std::error::Error for Error {}

/// Parse and evaluate `source` in a fresh interpreter, returning the value
/// of the last top-level expression (`nil` for an empty program).
///
/// `include` forms are resolved relative to the current directory.
///
/// ```
/// let result = tatu::run("(+ 1 2 3)").unwrap();
/// assert_eq!(result.to_string(), "6");
/// ```
pub fn run(source: &str) -> Result<value::Value, Error> {
    let program = builder::ProgramBuilder::new().build_from_source(source, "<input>")?;
    let mut interpreter = evaluator::Interpreter::new();
    interpreter.eval_program(&program.nodes)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::location::Position;
    use std::sync::Arc;

    fn location(line: usize, column: usize) -> Location {
        let position = Position {
            line,
            column,
            offset: 0,
        };
        Location {
            file: Arc::from("main.tatu"),
            start: position,
            end: position,
        }
    }

    #[test]
    fn test_error_display() {
        let test_cases = vec![
            (
                Error::new(ErrorKind::UnboundSymbol("foo".into())).at(&location(3, 7)),
                "[Line 3][Column 7] Error: unknown symbol `foo`",
            ),
            (
                Error::arity_error("lambda", Arity::Exact(2), 3),
                "Error: `lambda` expects 2 argument(s), got 3",
            ),
            (
                Error::arity_error("str:slice", Arity::Range(2, 3), 1),
                "Error: `str:slice` expects 2 to 3 argument(s), got 1",
            ),
            (
                Error::new(ErrorKind::RecurOutsideTail).at(&location(1, 1)),
                "[Line 1][Column 1] Error: recur can only be used in tail position of a function",
            ),
        ];

        for (i, (error, expected)) in test_cases.iter().enumerate() {
            assert_eq!(error.to_string(), *expected, "Test case #{}", i + 1);
        }
    }

    #[test]
    fn test_innermost_location_wins() {
        let error = Error::type_error("boom")
            .at(&location(2, 5))
            .at(&location(1, 1));
        assert_eq!(error.location.unwrap().start.line, 2);
    }

    #[test]
    fn test_render_points_at_column() {
        let source = "(var x 1)\n(+ x true)";
        let error =
            Error::type_error("`+` expects NUMBER at argument 2, got BOOL").at(&location(2, 6));
        let rendered = error.render(source);
        assert_eq!(
            rendered,
            "Error on line 2, column 6, file `main.tatu`:\n\n(+ x true)\n     ↑\n     └─ `+` expects NUMBER at argument 2, got BOOL"
        );
    }

    #[test]
    fn test_run_facade() {
        assert_eq!(run("(+ 1 2 3)").unwrap().to_string(), "6");
        assert_eq!(run("").unwrap(), value::Value::Nil);
        assert!(run("(undefined-thing)").is_err());
    }
}
