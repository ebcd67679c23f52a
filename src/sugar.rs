//! Syntactic sugar, rewritten into core special forms right after parsing:
//!
//! ```text
//! (def name (params) body)              => (var name (lambda (params) body))
//! (for init cond step body)             => (begin init (while cond (begin body step)))
//! (switch (c1 v1) ... (default d))      => (if c1 v1 (if ... d))
//! ```
//!
//! The parser desugars lists bottom-up, so the operands of a sugar form have
//! already been rewritten when the form itself is. Synthesized nodes take the
//! location of the operand they stand for, and are validated like any other
//! list.

use std::rc::Rc;

use crate::ast::{Node, NodeKind};
use crate::location::Location;
use crate::{Error, ParseErrorKind, analysis};

fn invalid(message: &str, location: &Location) -> Error {
    Error::parse(ParseErrorKind::InvalidForm, message, location)
}

fn symbol(name: &str, location: &Location) -> Node {
    Node::new(NodeKind::Symbol(name.to_owned()), location.clone())
}

/// Build a list node and validate it as if the user had written it
fn synthesize(items: Vec<Node>, location: &Location) -> Result<Node, Error> {
    let node = Node::new(NodeKind::List(Rc::new(items)), location.clone());
    analysis::validate(&node)?;
    Ok(node)
}

/// Rewrite `node` if it is a sugar form, otherwise return it unchanged
pub fn desugar(node: Node) -> Result<Node, Error> {
    match node.head_symbol() {
        Some("def") => def_to_var(node),
        Some("for") => for_to_while(node),
        Some("switch") => switch_to_if(node),
        _ => Ok(node),
    }
}

fn into_items(node: Node) -> (Vec<Node>, Location) {
    match node.kind {
        NodeKind::List(items) => {
            let items = Rc::try_unwrap(items).unwrap_or_else(|shared| (*shared).clone());
            (items, node.location)
        }
        _ => (Vec::new(), node.location),
    }
}

fn def_to_var(node: Node) -> Result<Node, Error> {
    let (items, location) = into_items(node);
    let Ok([keyword, name, params, body]) = <[Node; 4]>::try_from(items) else {
        return Err(invalid(
            "invalid `def` expression: expected (def <identifier> (<params>) <body>)",
            &location,
        ));
    };

    let lambda_location = params.location.clone();
    let lambda = synthesize(
        vec![symbol("lambda", &lambda_location), params, body],
        &lambda_location,
    )?;
    synthesize(vec![symbol("var", &keyword.location), name, lambda], &location)
}

fn for_to_while(node: Node) -> Result<Node, Error> {
    let (items, location) = into_items(node);
    let Ok([keyword, init, condition, step, body]) = <[Node; 5]>::try_from(items) else {
        return Err(invalid(
            "invalid `for` expression: expected (for <init> <condition> <step> <body>)",
            &location,
        ));
    };

    let loop_location = condition.location.clone();
    let loop_body = synthesize(
        vec![symbol("begin", &loop_location), body, step],
        &loop_location,
    )?;
    let while_loop = synthesize(
        vec![symbol("while", &loop_location), condition, loop_body],
        &loop_location,
    )?;
    synthesize(
        vec![symbol("begin", &keyword.location), init, while_loop],
        &location,
    )
}

fn switch_to_if(node: Node) -> Result<Node, Error> {
    let (mut items, location) = into_items(node);
    if items.len() < 3 {
        return Err(invalid(
            "invalid `switch` expression: expected (switch (<condition> <value>)* (default <value>))",
            &location,
        ));
    }

    let cases = items.split_off(1);
    let mut cases = cases.into_iter().rev();

    let Some(default_case) = cases.next() else {
        return Err(invalid("invalid `switch` expression", &location));
    };
    let default_location = default_case.location.clone();
    let mut result = match <[Node; 2]>::try_from(into_items(default_case).0) {
        Ok([keyword, value]) if keyword.as_symbol() == Some("default") => value,
        _ => {
            return Err(invalid(
                "invalid default case: expected (default <value>)",
                &default_location,
            ));
        }
    };

    for case in cases {
        let case_location = case.location.clone();
        let Ok([condition, value]) = <[Node; 2]>::try_from(into_items(case).0) else {
            return Err(invalid(
                "invalid case expression: expected (<condition> <value>)",
                &case_location,
            ));
        };
        let if_location = condition.location.clone();
        result = synthesize(
            vec![symbol("if", &if_location), condition, value, result],
            &location,
        )?;
    }

    Ok(result)
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::parser::parse_source;
    use pretty_assertions::assert_eq;

    fn desugared(source: &str) -> String {
        parse_source(source, "sugar.tatu").unwrap()[0].to_string()
    }

    #[test]
    fn test_rewrites() {
        let test_cases = vec![
            ("(def f () 1)", "(var f (lambda () 1))"),
            (
                "(def f (a b) (def g (x) x))",
                "(var f (lambda (a b) (var g (lambda (x) x))))",
            ),
            ("(switch (true 1) (default 2))", "(if true 1 2)"),
            (
                "(for (var i 0) (< i 10) (set i (+ i 1)) i)",
                "(begin (var i 0) (while (< i 10) (begin i (set i (+ i 1)))))",
            ),
        ];

        for (i, (source, expected)) in test_cases.iter().enumerate() {
            assert_eq!(desugared(source), *expected, "Test case #{}", i + 1);
        }
    }

    #[test]
    fn test_invalid_sugar() {
        let test_cases = vec![
            ("(def f (x))", "invalid `def` expression"),
            ("(def 1 (x) x)", "invalid `var` name"),
            ("(def f x x)", "invalid `lambda` params"),
            ("(for (var i 0) (< i 1) i)", "invalid `for` expression"),
            ("(switch)", "invalid `switch` expression"),
            ("(switch (default 7))", "invalid `switch` expression"),
            ("(switch (true 1) (else 2))", "invalid default case"),
            ("(switch (true) (default 2))", "invalid case expression"),
        ];

        for (i, (source, expected)) in test_cases.iter().enumerate() {
            let error = parse_source(source, "sugar.tatu").unwrap_err();
            assert!(
                error.to_string().contains(expected),
                "Test case #{}: expected '{expected}', got '{error}'",
                i + 1
            );
            assert_eq!(error.parse_kind(), Some(ParseErrorKind::InvalidForm));
        }
    }

    #[test]
    fn test_synthesized_nodes_keep_user_locations() {
        let nodes = parse_source("(def f (x)\n  (+ x 1))", "sugar.tatu").unwrap();
        let items = nodes[0].as_list().unwrap();
        assert_eq!(items[0].location.start.column, 2); // `var` replaces `def`
        let lambda = items[2].as_list().unwrap();
        assert_eq!(lambda[0].location.start.column, 8); // `lambda` sits on the params
        assert_eq!(lambda[2].location.start.line, 2);
    }
}
