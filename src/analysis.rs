//! Structural validation of special forms and fixed-shape operators.
//!
//! Runs on every list right after desugaring. Only the *shape* of a form is
//! checked here (operand counts, identifiers where identifiers are required);
//! types are checked at evaluation time. A list whose head is not a known
//! keyword is a function call and is accepted as is.

use crate::ast::{Node, NodeKind};
use crate::{Error, ParseErrorKind};

fn invalid(message: impl Into<String>, node: &Node) -> Error {
    Error::parse(ParseErrorKind::InvalidForm, message, &node.location)
}

/// Validate a single list node (its children were validated when they were parsed)
pub fn validate(node: &Node) -> Result<(), Error> {
    let Some(items) = node.as_list() else {
        return Ok(());
    };
    let Some(head) = items.first().and_then(Node::as_symbol) else {
        return Ok(());
    };
    // operand count, not counting the head
    let operands = items.len() - 1;

    match head {
        "+" if operands < 2 => Err(invalid(
            "invalid `+` format: expected at least two operands",
            node,
        )),
        "-" | "*" | "/" | "%" => validate_arithmetic(head, operands, node),
        "=" | "<" | "<=" | ">" | ">=" if operands != 2 => Err(invalid(
            format!("invalid `{head}` format: expected exactly two operands"),
            node,
        )),
        "and" | "or" if operands < 2 => Err(invalid(
            format!("invalid `{head}` format: expected at least two operands"),
            node,
        )),
        "not" if operands != 1 => Err(invalid(
            "invalid `not` format: expected exactly one operand",
            node,
        )),
        "include" => validate_include(items, node),
        "begin" if operands < 1 => Err(invalid(
            "invalid `begin` format: expected at least one expression",
            node,
        )),
        "var" | "set" => validate_binding(head, items, node),
        "if" if !(2..=3).contains(&operands) => Err(invalid(
            "invalid `if` format: expected (if <condition> <then> [<else>])",
            node,
        )),
        "while" if operands != 2 => Err(invalid(
            "invalid `while` format: expected (while <condition> <body>)",
            node,
        )),
        "lambda" => validate_lambda(items, node),
        "map" => validate_map(items, node),
        "print" if operands < 1 => Err(invalid(
            "invalid `print` format: expected at least one expression",
            node,
        )),
        _ => Ok(()),
    }
}

fn validate_arithmetic(operator: &str, operands: usize, node: &Node) -> Result<(), Error> {
    match (operator, operands) {
        (_, 0) => Err(invalid(
            format!("invalid `{operator}` format: expected at least one operand"),
            node,
        )),
        // unary minus
        ("-", _) => Ok(()),
        ("%", 2) => Ok(()),
        ("%", _) => Err(invalid(
            "invalid `%` format: expected exactly two operands",
            node,
        )),
        (_, 1) => Err(invalid(
            format!("invalid `{operator}` format: expected at least two operands"),
            node,
        )),
        _ => Ok(()),
    }
}

fn validate_include(items: &[Node], node: &Node) -> Result<(), Error> {
    match items {
        [_, path] if matches!(path.kind, NodeKind::String(_)) => Ok(()),
        [_, path] => Err(invalid("invalid `include` argument: expected string", path)),
        _ => Err(invalid(
            "invalid `include` format: expected (include <string>)",
            node,
        )),
    }
}

fn validate_binding(keyword: &str, items: &[Node], node: &Node) -> Result<(), Error> {
    match items {
        [_, name, _] if name.as_symbol().is_some() => Ok(()),
        [_, name, _] => Err(invalid(
            format!("invalid `{keyword}` name: expected identifier"),
            name,
        )),
        _ => Err(invalid(
            format!("invalid `{keyword}` format: expected ({keyword} <identifier> <expr>)"),
            node,
        )),
    }
}

fn validate_lambda(items: &[Node], node: &Node) -> Result<(), Error> {
    let [_, params, _] = items else {
        return Err(invalid(
            "invalid `lambda` format: expected (lambda (<params>) <body>)",
            node,
        ));
    };
    let Some(params) = params.as_list() else {
        return Err(invalid("invalid `lambda` params: expected list", params));
    };

    let mut seen: Vec<&str> = Vec::with_capacity(params.len());
    for param in params {
        let Some(name) = param.as_symbol() else {
            return Err(invalid("invalid `lambda` param: expected identifier", param));
        };
        if seen.contains(&name) {
            return Err(invalid(
                format!("invalid `lambda` param: duplicate parameter `{name}`"),
                param,
            ));
        }
        seen.push(name);
    }
    Ok(())
}

fn validate_map(items: &[Node], node: &Node) -> Result<(), Error> {
    if items.len() % 2 != 1 {
        return Err(invalid(
            "invalid `map` format: expected (map <key> <value> ...)",
            node,
        ));
    }
    for key in items[1..].iter().step_by(2) {
        if !matches!(key.kind, NodeKind::Symbol(_) | NodeKind::String(_)) {
            return Err(invalid(
                "invalid `map` key: expected identifier or string",
                key,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_source;

    #[test]
    fn test_validation_data_driven() {
        // (source, expected error fragment or None for valid)
        let test_cases: Vec<(&str, Option<&str>)> = vec![
            // === OPERATORS ===
            ("(+ 1 2)", None),
            ("(+ 1)", Some("invalid `+` format: expected at least two operands")),
            ("(- 1)", None),
            ("(- 5 1 1)", None),
            ("(-)", Some("invalid `-` format: expected at least one operand")),
            ("(* 2)", Some("invalid `*` format: expected at least two operands")),
            ("(/ 2)", Some("invalid `/` format: expected at least two operands")),
            ("(% 5 2)", None),
            ("(% 5 2 1)", Some("invalid `%` format: expected exactly two operands")),
            ("(% 5)", Some("invalid `%` format: expected exactly two operands")),
            ("(< 1 2)", None),
            ("(= 1 2 3)", Some("invalid `=` format: expected exactly two operands")),
            ("(and true)", Some("invalid `and` format")),
            ("(or true false true)", None),
            ("(not true false)", Some("invalid `not` format")),
            ("(print)", Some("invalid `print` format")),
            // === SPECIAL FORMS ===
            ("(include \"lib.tatu\")", None),
            ("(include lib)", Some("invalid `include` argument: expected string")),
            ("(include)", Some("invalid `include` format")),
            ("(begin)", Some("invalid `begin` format")),
            ("(var x)", Some("invalid `var` format: expected (var <identifier> <expr>)")),
            ("(set \"x\" 1)", Some("invalid `set` name: expected identifier")),
            ("(if true 1 2)", None),
            ("(if true 1 2 3)", Some("invalid `if` format")),
            ("(while true)", Some("invalid `while` format")),
            ("(lambda () 1)", None),
            ("(lambda (x) 1 2)", Some("invalid `lambda` format")),
            ("(lambda x 1)", Some("invalid `lambda` params: expected list")),
            ("(lambda (x x) 1)", Some("duplicate parameter `x`")),
            ("(vector)", None),
            ("(map)", None),
            ("(map a 1 \"b\" 2)", None),
            ("(map a)", Some("invalid `map` format")),
            ("(map 1 2)", Some("invalid `map` key")),
            // === CALLS ===
            ("(f)", None),
            ("((lambda (x) x) 1)", None),
            ("(\"str\" 1)", None),
            // operator shapes are checked by name, even under a shadowing binding
            ("(def f (print) (print))", Some("invalid `print` format")),
            ("(begin (var + 1) (+ 1))", Some("invalid `+` format")),
        ];

        for (i, (source, expected)) in test_cases.iter().enumerate() {
            match (parse_source(source, "analysis.tatu"), expected) {
                (Ok(_), None) => {}
                (Err(e), Some(text)) => assert!(
                    e.to_string().contains(text),
                    "Test case #{}: {source}: expected '{text}', got '{e}'",
                    i + 1
                ),
                (Ok(_), Some(text)) => {
                    panic!("Test case #{}: {source}: expected error '{text}'", i + 1)
                }
                (Err(e), None) => panic!("Test case #{}: {source}: unexpected error {e}", i + 1),
            }
        }
    }

    #[test]
    fn test_error_points_at_offending_operand() {
        let Err(error) = parse_source("(var\n  10 1)", "analysis.tatu") else {
            panic!("expected error");
        };
        let location = error.location.as_ref().map(|l| (l.start.line, l.start.column));
        assert_eq!(location, Some((2, 3)));
    }
}
