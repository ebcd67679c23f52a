//! Recursive descent parser: tokens to AST nodes.
//!
//! ```text
//! <program> ::= <expr>*
//! <expr>    ::= <atom> | <list>
//! <list>    ::= "(" <expr>* ")"
//! <atom>    ::= <number> | <string> | <bool> | <symbol> | "nil"
//! ```
//!
//! Every list is desugared ([`crate::sugar`]) and structurally validated
//! ([`crate::analysis`]) as soon as it is closed, so the evaluator only ever
//! sees well-formed special forms.

use std::rc::Rc;

use crate::ast::{Node, NodeKind, Token, TokenKind};
use crate::location::{Location, Position};
use crate::{Error, MAX_PARSE_DEPTH, ParseErrorKind, analysis, sugar};

pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with an `Eof` token, as produced by the scanner
    pub fn new(tokens: &'a [Token]) -> Self {
        Parser { tokens, current: 0 }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.current)
    }

    fn is_at_end(&self) -> bool {
        self.peek()
            .is_none_or(|token| token.kind == TokenKind::Eof)
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek()?;
        self.current += 1;
        Some(token)
    }

    pub fn parse_program(mut self) -> Result<Vec<Node>, Error> {
        let mut program = Vec::new();
        while !self.is_at_end() {
            program.push(self.parse_expression(0)?);
        }
        Ok(program)
    }

    fn parse_expression(&mut self, depth: usize) -> Result<Node, Error> {
        let Some(token) = self.advance() else {
            return Err(Error::parse(
                ParseErrorKind::Incomplete,
                "expected expression",
                &self.end_location(),
            ));
        };

        let kind = match &token.kind {
            TokenKind::Number(n) => NodeKind::Number(*n),
            TokenKind::String(s) => NodeKind::String(s.clone()),
            TokenKind::Bool(b) => NodeKind::Bool(*b),
            TokenKind::Symbol(s) => NodeKind::Symbol(s.clone()),
            TokenKind::Nil => NodeKind::Nil,
            TokenKind::LeftParen => return self.parse_list(token, depth + 1),
            TokenKind::RightParen | TokenKind::Eof => {
                return Err(Error::parse(
                    ParseErrorKind::InvalidSyntax,
                    "expected expression",
                    &token.location,
                ));
            }
        };

        Ok(Node::new(kind, token.location.clone()))
    }

    fn parse_list(&mut self, open: &'a Token, depth: usize) -> Result<Node, Error> {
        if depth > MAX_PARSE_DEPTH {
            return Err(Error::parse(
                ParseErrorKind::TooDeeplyNested,
                format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                &open.location,
            ));
        }

        let mut items = Vec::new();
        loop {
            match self.peek() {
                None
                | Some(Token {
                    kind: TokenKind::Eof,
                    ..
                }) => {
                    return Err(Error::parse(
                        ParseErrorKind::Incomplete,
                        "unclosed parenthesis",
                        &open.location,
                    ));
                }
                Some(
                    close @ Token {
                        kind: TokenKind::RightParen,
                        ..
                    },
                ) => {
                    self.current += 1;
                    let location = open.location.to(&close.location);
                    let list = Node::new(NodeKind::List(Rc::new(items)), location);
                    let list = sugar::desugar(list)?;
                    analysis::validate(&list)?;
                    return Ok(list);
                }
                Some(_) => items.push(self.parse_expression(depth)?),
            }
        }
    }

    fn end_location(&self) -> Location {
        match self.tokens.last() {
            Some(token) => token.location.clone(),
            None => Location::new("<input>".into(), Position::start(), Position::start()),
        }
    }
}

/// Parse a token stream into top-level nodes
pub fn parse(tokens: &[Token]) -> Result<Vec<Node>, Error> {
    Parser::new(tokens).parse_program()
}

/// Scan and parse `source` in one step
pub fn parse_source(source: &str, file: &str) -> Result<Vec<Node>, Error> {
    let tokens = crate::scanner::scan(source, file)?;
    parse(&tokens)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Test result variants for parsing tests
    #[derive(Debug)]
    enum ParseTestResult {
        /// Parsing should succeed and print back as this source
        Success(&'static str),
        /// Parsing should fail with an error containing this string
        SpecificError(&'static str),
    }
    use ParseTestResult::*;

    fn run_parse_tests(test_cases: Vec<(&str, ParseTestResult)>) {
        for (i, (input, expected)) in test_cases.iter().enumerate() {
            let test_id = format!("Parse test #{}", i + 1);
            let result = parse_source(input, "test.tatu");

            match (result, expected) {
                (Ok(nodes), Success(printed)) => {
                    let actual: Vec<String> = nodes.iter().map(ToString::to_string).collect();
                    assert_eq!(actual.join(" "), *printed, "{test_id}: {input}");
                }
                (Err(e), SpecificError(text)) => {
                    let message = e.to_string();
                    assert!(
                        message.contains(text),
                        "{test_id}: error should contain '{text}', got: {message}"
                    );
                }
                (Ok(nodes), SpecificError(text)) => {
                    panic!("{test_id}: expected error containing '{text}', got {nodes:?}")
                }
                (Err(e), Success(printed)) => {
                    panic!("{test_id}: expected {printed}, got error {e}")
                }
            }
        }
    }

    #[test]
    fn test_parse_data_driven() {
        run_parse_tests(vec![
            // === ATOMS AND LISTS ===
            ("42", Success("42")),
            ("1 \"two\" true nil x", Success("1 \"two\" true nil x")),
            ("()", Success("()")),
            ("(f (g 1) (h))", Success("(f (g 1) (h))")),
            ("((lambda (x) x) 1)", Success("((lambda (x) x) 1)")),
            ("(1 2 3)", Success("(1 2 3)")), // not a function: reported at runtime
            // === SUGAR ===
            (
                "(def inc (x) (+ x 1))",
                Success("(var inc (lambda (x) (+ x 1)))"),
            ),
            (
                "(for (var i 0) (< i 3) (set i (+ i 1)) (print i))",
                Success("(begin (var i 0) (while (< i 3) (begin (print i) (set i (+ i 1)))))"),
            ),
            (
                "(switch ((< x 0) \"neg\") ((= x 0) \"zero\") (default \"pos\"))",
                Success("(if (< x 0) \"neg\" (if (= x 0) \"zero\" \"pos\"))"),
            ),
            // === STRUCTURAL ERRORS ===
            (")", SpecificError("expected expression")),
            ("(+ 1 2", SpecificError("unclosed parenthesis")),
            ("(begin (print 1)", SpecificError("[Line 1][Column 1]")),
            ("(var 1 2)", SpecificError("invalid `var` name: expected identifier")),
            ("(if true)", SpecificError("invalid `if` format")),
            ("(+ 1)", SpecificError("invalid `+` format: expected at least two operands")),
            ("(lambda (x 1) x)", SpecificError("invalid `lambda` param")),
            ("(def f x)", SpecificError("invalid `def` expression")),
        ]);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = format!("{}{}", "(".repeat(MAX_PARSE_DEPTH + 1), ")".repeat(MAX_PARSE_DEPTH + 1));
        let error = parse_source(&deep, "deep.tatu").unwrap_err();
        assert_eq!(error.parse_kind(), Some(ParseErrorKind::TooDeeplyNested));

        let ok = format!("{}{}", "(".repeat(MAX_PARSE_DEPTH), ")".repeat(MAX_PARSE_DEPTH));
        assert_eq!(parse_source(&ok, "deep.tatu").unwrap().len(), 1);
    }

    #[test]
    fn test_incomplete_input_is_distinguishable() {
        for input in ["(begin", "(print \"abc", "(f (g 1)"] {
            let error = parse_source(input, "repl").unwrap_err();
            assert_eq!(error.parse_kind(), Some(ParseErrorKind::Incomplete), "{input}");
        }
        let error = parse_source("(f))", "repl").unwrap_err();
        assert_eq!(error.parse_kind(), Some(ParseErrorKind::InvalidSyntax));
    }

    #[test]
    fn test_list_location_spans_parentheses() {
        let nodes = parse_source("\n  (f 1)", "loc.tatu").unwrap();
        let location = &nodes[0].location;
        assert_eq!((location.start.line, location.start.column), (2, 3));
        assert_eq!((location.end.line, location.end.column), (2, 8));
    }
}
