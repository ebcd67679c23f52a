//! Terminal dumps of tokens, AST trees and errors for the command line.
//!
//! Output is plain text unless colors are enabled; the binary enables them
//! when stdout is a terminal.

use std::fmt::Write;

use crate::Error;
use crate::ast::{Node, NodeKind, Token, TokenKind};
use crate::location::Location;
use crate::value::format_number;

/// ANSI color codes (256-color palette)
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const CYAN: &str = "\x1b[38;5;81m";
    pub const GREEN: &str = "\x1b[38;5;84m";
    pub const PURPLE: &str = "\x1b[38;5;141m";
    pub const RED: &str = "\x1b[38;5;210m";
    pub const PINK: &str = "\x1b[38;5;212m";
    pub const ORANGE: &str = "\x1b[38;5;215m";
    pub const YELLOW: &str = "\x1b[38;5;228m";
    pub const DARK_GRAY: &str = "\x1b[38;5;242m";
    pub const LIGHT_GRAY: &str = "\x1b[38;5;247m";
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Pretty {
    colors: bool,
}

impl Pretty {
    pub fn new(colors: bool) -> Self {
        Pretty { colors }
    }

    fn paint(self, color: &'static str) -> &'static str {
        if self.colors { color } else { "" }
    }

    fn span(self, location: &Location) -> String {
        format!(
            "{} => start({}:{}) end({}:{}) file({}){}",
            self.paint(colors::DARK_GRAY),
            location.start.line,
            location.start.column,
            location.end.line,
            location.end.column,
            location.file,
            self.paint(colors::RESET)
        )
    }

    pub fn header(self, version: &str, file: &str) -> String {
        format!(
            "{}>>> Running tatu {}({version}){} - {file}{}",
            self.paint(colors::PURPLE),
            self.paint(colors::DARK_GRAY),
            self.paint(colors::GREEN),
            self.paint(colors::RESET)
        )
    }

    pub fn result_banner(self) -> String {
        format!("{}>>> Result:{}", self.paint(colors::PINK), self.paint(colors::RESET))
    }

    /// One line per token: kind, lexeme (newlines escaped) and span
    pub fn token(self, token: &Token) -> String {
        let color = match token.kind {
            TokenKind::LeftParen | TokenKind::RightParen => colors::PURPLE,
            TokenKind::Number(_) => colors::GREEN,
            TokenKind::String(_) => colors::ORANGE,
            TokenKind::Bool(_) => colors::PINK,
            TokenKind::Nil => colors::LIGHT_GRAY,
            TokenKind::Symbol(_) => colors::CYAN,
            TokenKind::Eof => colors::YELLOW,
        };
        format!(
            "{}({}: `{}`){}",
            self.paint(color),
            token.kind.name(),
            token.lexeme.replace('\n', "\\n"),
            self.span(&token.location)
        )
    }

    /// Tree dump of a program, one node per line
    pub fn ast(self, nodes: &[Node]) -> String {
        let mut out = String::new();
        for node in nodes {
            self.node(&mut out, node, 0);
        }
        out
    }

    fn node(self, out: &mut String, node: &Node, depth: usize) {
        let _ = match &node.kind {
            NodeKind::Number(n) => {
                write!(out, "{}(Number {})", self.paint(colors::GREEN), format_number(*n))
            }
            NodeKind::String(s) => write!(out, "{}(String {s:?})", self.paint(colors::ORANGE)),
            NodeKind::Bool(b) => write!(out, "{}(Bool {b})", self.paint(colors::PINK)),
            NodeKind::Symbol(name) => write!(out, "{}(Symbol {name})", self.paint(colors::CYAN)),
            NodeKind::Nil => write!(out, "{}(Nil)", self.paint(colors::LIGHT_GRAY)),
            NodeKind::List(items) if items.is_empty() => {
                write!(out, "{}(List)", self.paint(colors::PURPLE))
            }
            NodeKind::List(items) => {
                let indent = "    ".repeat(depth);
                let purple = self.paint(colors::PURPLE);
                let _ = writeln!(out, "{purple}(List");
                for (i, item) in items.iter().enumerate() {
                    let connector = if i + 1 == items.len() { "└─ " } else { "├─ " };
                    let _ = write!(out, "{indent} {purple}{connector}");
                    self.node(out, item, depth + 1);
                }
                write!(out, "{indent}{purple})")
            }
        };
        let _ = writeln!(out, "{}", self.span(&node.location));
    }

    /// The error report, with the offending source line when available
    pub fn error(self, error: &Error, source: Option<&str>) -> String {
        let report = match source {
            Some(source) => error.render(source),
            None => error.to_string(),
        };
        format!("{}>>> {report}{}", self.paint(colors::RED), self.paint(colors::RESET))
    }
}
