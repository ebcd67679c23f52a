//! Tokens and AST nodes.
//!
//! The scanner produces a flat sequence of [`Token`]s, the parser turns them into
//! [`Node`]s. Nodes form a closed set of atom kinds plus one composite `List`
//! kind, and every node carries the [`Location`] it was read from so that the
//! evaluator can point errors back at the source.
//!
//! Helper constructors such as [`num`], [`sym`] and [`list`] build nodes with a
//! synthetic location; they are mostly useful in tests and for the forms that
//! [`crate::sugar`] synthesizes.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::location::{Location, Position};

/// Token categories produced by the scanner
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LeftParen,
    RightParen,
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    Symbol(String),
    Eof,
}

impl TokenKind {
    /// Upper-case category name, used in token dumps
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::LeftParen => "LEFT_PAREN",
            TokenKind::RightParen => "RIGHT_PAREN",
            TokenKind::Number(_) => "NUMBER",
            TokenKind::String(_) => "STRING",
            TokenKind::Bool(_) => "BOOL",
            TokenKind::Nil => "NIL",
            TokenKind::Symbol(_) => "SYMBOL",
            TokenKind::Eof => "EOF",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// The exact source text of the token (empty for `Eof`)
    pub lexeme: String,
    pub location: Location,
}

/// Node kinds of the AST
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Number(f64),
    String(String),
    Bool(bool),
    Symbol(String),
    Nil,
    /// Shared, so cloning a list node (e.g. a closure body) is shallow
    List(Rc<Vec<Node>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub location: Location,
}

impl Node {
    pub fn new(kind: NodeKind, location: Location) -> Self {
        Node { kind, location }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// The head symbol of a non-empty list, e.g. `var` for `(var x 1)`
    pub fn head_symbol(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Node::as_symbol)
    }

    /// Replace the location of this node. Nodes synthesized by desugaring take
    /// the location of the form the user actually wrote.
    #[must_use]
    pub fn with_location(mut self, location: &Location) -> Self {
        self.location = location.clone();
        self
    }
}

/// The node kind names used in AST dumps and messages
impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Number(_) => "NumberExpr",
            NodeKind::String(_) => "StringExpr",
            NodeKind::Bool(_) => "BoolExpr",
            NodeKind::Symbol(_) => "SymbolExpr",
            NodeKind::Nil => "NilExpr",
            NodeKind::List(_) => "ListExpr",
        };
        write!(f, "{name}")
    }
}

/// Prints the node back as source text
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Number(n) => write!(f, "{}", crate::value::format_number(*n)),
            NodeKind::String(s) => write!(f, "{s:?}"),
            NodeKind::Bool(b) => write!(f, "{b}"),
            NodeKind::Symbol(s) => write!(f, "{s}"),
            NodeKind::Nil => write!(f, "nil"),
            NodeKind::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Special forms: list heads the evaluator handles itself, with access to the
/// unevaluated argument nodes and the current environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Begin,
    Var,
    Set,
    If,
    While,
    Lambda,
    Recur,
    Vector,
    Map,
    And,
    Or,
    Include,
}

impl SpecialForm {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "begin" => SpecialForm::Begin,
            "var" => SpecialForm::Var,
            "set" => SpecialForm::Set,
            "if" => SpecialForm::If,
            "while" => SpecialForm::While,
            "lambda" => SpecialForm::Lambda,
            "recur" => SpecialForm::Recur,
            "vector" => SpecialForm::Vector,
            "map" => SpecialForm::Map,
            "and" => SpecialForm::And,
            "or" => SpecialForm::Or,
            "include" => SpecialForm::Include,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            SpecialForm::Begin => "begin",
            SpecialForm::Var => "var",
            SpecialForm::Set => "set",
            SpecialForm::If => "if",
            SpecialForm::While => "while",
            SpecialForm::Lambda => "lambda",
            SpecialForm::Recur => "recur",
            SpecialForm::Vector => "vector",
            SpecialForm::Map => "map",
            SpecialForm::And => "and",
            SpecialForm::Or => "or",
            SpecialForm::Include => "include",
        }
    }
}

fn synthetic_location() -> Location {
    Location::new(Arc::from("<synthetic>"), Position::start(), Position::start())
}

/// Helper for building number nodes
pub fn num(n: f64) -> Node {
    Node::new(NodeKind::Number(n), synthetic_location())
}

/// Helper for building string nodes
pub fn string(s: &str) -> Node {
    Node::new(NodeKind::String(s.to_owned()), synthetic_location())
}

/// Helper for building symbol nodes
pub fn sym(name: &str) -> Node {
    Node::new(NodeKind::Symbol(name.to_owned()), synthetic_location())
}

/// Helper for building list nodes
pub fn list(items: Vec<Node>) -> Node {
    Node::new(NodeKind::List(Rc::new(items)), synthetic_location())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_display_round_trips_source() {
        let test_cases = vec![
            (num(42.0), "42"),
            (num(-1.5), "-1.5"),
            (string("a\"b"), "\"a\\\"b\""),
            (sym("vec:push"), "vec:push"),
            (
                list(vec![sym("+"), num(1.0), list(vec![sym("f"), string("x")])]),
                "(+ 1 (f \"x\"))",
            ),
            (list(vec![]), "()"),
        ];

        for (i, (node, expected)) in test_cases.iter().enumerate() {
            assert_eq!(node.to_string(), *expected, "Test case #{}", i + 1);
        }
    }

    #[test]
    fn test_special_form_names() {
        for name in ["begin", "var", "set", "if", "while", "lambda", "recur", "vector", "map", "and", "or", "include"] {
            let form = SpecialForm::from_name(name).unwrap_or_else(|| panic!("{name} is a special form"));
            assert_eq!(form.name(), name);
        }
        assert_eq!(SpecialForm::from_name("def"), None);
        assert_eq!(SpecialForm::from_name("+"), None);
    }

    #[test]
    fn test_head_symbol() {
        assert_eq!(list(vec![sym("var"), sym("x"), num(1.0)]).head_symbol(), Some("var"));
        assert_eq!(list(vec![num(1.0)]).head_symbol(), None);
        assert_eq!(list(vec![]).head_symbol(), None);
        assert_eq!(sym("x").head_symbol(), None);
    }
}
