//! Source positions for tokens, AST nodes and errors.

use std::fmt;
use std::sync::Arc;

/// A point in a source file. `line` and `column` are 1-based and count
/// characters; `offset` is the byte offset from the start of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Position {
            line,
            column,
            offset,
        }
    }

    /// The position of the first character of a file
    pub fn start() -> Self {
        Position::new(1, 1, 0)
    }
}

/// A span in a named source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub file: Arc<str>,
    pub start: Position,
    pub end: Position,
}

impl Location {
    pub fn new(file: Arc<str>, start: Position, end: Position) -> Self {
        Location { file, start, end }
    }

    /// A span covering both `self` and `other` (which must be in the same file)
    #[must_use]
    pub fn to(&self, other: &Location) -> Location {
        Location::new(self.file.clone(), self.start, other.end)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.start.line, self.start.column)
    }
}
