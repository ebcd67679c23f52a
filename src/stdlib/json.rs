//! `json:` natives, backed by `serde_json`.
//!
//! | JSON            | Value                                   |
//! |-----------------|-----------------------------------------|
//! | `null`          | NIL                                     |
//! | `true`/`false`  | BOOL                                    |
//! | number          | NUMBER (integral values encode as ints) |
//! | string          | STRING                                  |
//! | array           | VECTOR                                  |
//! | object          | MAP (encoded with sorted keys)          |
//!
//! Functions cannot be encoded.

use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::value::Value;
use crate::{Error, MAX_PARSE_DEPTH};

/// Largest magnitude at which every integer is exactly representable in f64
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

fn value_to_json(value: &Value, depth: usize) -> Result<serde_json::Value, Error> {
    if depth >= MAX_PARSE_DEPTH {
        // also what a cyclic container runs into
        return Err(Error::eval_error(format!(
            "`json:encode` value too deeply nested (max depth: {MAX_PARSE_DEPTH})"
        )));
    }
    match value {
        Value::Nil => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER => {
            #[allow(clippy::cast_possible_truncation)] // integral and in range
            let i = *n as i64;
            Ok(serde_json::Value::from(i))
        }
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .ok_or_else(|| {
                Error::eval_error(format!("`json:encode` cannot encode number {n}"))
            }),
        Value::String(s) => Ok(serde_json::Value::String(s.to_string())),
        Value::Vector(elements) => elements
            .borrow()
            .iter()
            .map(|e| value_to_json(e, depth + 1))
            .collect::<Result<Vec<_>, _>>()
            .map(serde_json::Value::Array),
        Value::Map(entries) => {
            let mut object = serde_json::Map::new();
            for (key, value) in entries.borrow().iter() {
                object.insert(key.clone(), value_to_json(value, depth + 1)?);
            }
            Ok(serde_json::Value::Object(object))
        }
        Value::Function(_) | Value::NativeFunction(_) => Err(Error::type_error(format!(
            "`json:encode` unsupported type: cannot convert {} to JSON",
            value.value_type()
        ))),
    }
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::from(s),
        serde_json::Value::Array(items) => {
            Value::vector(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(object) => Value::map(
            object
                .into_iter()
                .map(|(key, value)| (key, json_to_value(value)))
                .collect(),
        ),
    }
}

fn json_encode(values: &[Value]) -> Result<Value, Error> {
    let json = value_to_json(Args::new("json:encode", values).get(0)?, 0)?;
    let encoded = serde_json::to_string(&json)
        .map_err(|e| Error::eval_error(format!("`json:encode` failed to encode: {e}")))?;
    Ok(Value::from(encoded))
}

fn json_decode(values: &[Value]) -> Result<Value, Error> {
    let text = Args::new("json:decode", values).string(0)?;
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| Error::eval_error(format!("`json:decode` failed to decode: {e}")))?;
    Ok(json_to_value(json))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "json:encode",
        arity: Arity::Exact(1),
        func: json_encode,
    },
    BuiltinOp {
        name: "json:decode",
        arity: Arity::Exact(1),
        func: json_decode,
    },
];

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::builtinops::NativeRegistry;
    use crate::value::{map_of, val};

    fn call(name: &str, args: &[Value]) -> Result<Value, Error> {
        let mut registry = NativeRegistry::empty();
        registry.register_ops(OPS);
        registry.get(name).unwrap().call(args)
    }

    #[test]
    fn test_encode() {
        let test_cases = vec![
            (Value::Nil, "null"),
            (val(true), "true"),
            (val(30), "30"),
            (val(-2.5), "-2.5"),
            (val("a\"b"), r#""a\"b""#),
            (val(vec![val(1), Value::Nil, val("x")]), r#"[1,null,"x"]"#),
            (
                map_of(vec![("name", val("John")), ("age", val(30))]),
                r#"{"age":30,"name":"John"}"#,
            ),
        ];
        for (i, (value, expected)) in test_cases.into_iter().enumerate() {
            assert_eq!(
                call("json:encode", &[value]).unwrap(),
                val(expected),
                "Test case #{}",
                i + 1
            );
        }
    }

    #[test]
    fn test_decode() {
        let test_cases = vec![
            ("null", "<nil>"),
            ("[1, 2.5, \"a\", true]", "(1 2.5 a true)"),
            (r#"{"b": {"c": [1]}, "a": null}"#, "[a <nil> b [c (1)]]"),
        ];
        for (i, (text, expected)) in test_cases.into_iter().enumerate() {
            assert_eq!(
                call("json:decode", &[val(text)]).unwrap().to_string(),
                expected,
                "Test case #{}",
                i + 1
            );
        }
        assert!(call("json:decode", &[val("{broken")]).is_err());
        assert!(call("json:decode", &[val(1)]).is_err());
    }

    #[test]
    fn test_unencodable_values() {
        let native = Value::NativeFunction(crate::value::NativeFunction::new(
            "id",
            Arity::Exact(1),
            |args| Ok(args[0].clone()),
        ));
        assert!(call("json:encode", &[native]).is_err());
        assert!(call("json:encode", &[val(f64::NAN)]).is_err());

        let cyclic = val(vec![val(1)]);
        if let Value::Vector(elements) = &cyclic {
            elements.borrow_mut().push(cyclic.clone());
        }
        assert!(call("json:encode", &[cyclic.clone()]).is_err());
        if let Value::Vector(elements) = &cyclic {
            elements.borrow_mut().clear();
        }
    }
}
