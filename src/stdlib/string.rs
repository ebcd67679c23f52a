//! `str:` natives. Lengths and indices count characters, not bytes, and no
//! function mutates its input.

use crate::{Error, MAX_STRING_LEN};
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::stdlib::number_from_usize;
use crate::value::Value;

fn str_len(values: &[Value]) -> Result<Value, Error> {
    let s = Args::new("str:len", values).string(0)?;
    Ok(number_from_usize(s.chars().count()))
}

fn str_contains(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:contains", values);
    Ok(Value::Bool(args.string(0)?.contains(args.string(1)?)))
}

/// Character index of the first occurrence, or -1
fn str_index(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:index", values);
    let (haystack, needle) = (args.string(0)?, args.string(1)?);
    match haystack.find(needle) {
        Some(byte_index) => Ok(number_from_usize(haystack[..byte_index].chars().count())),
        None => Ok(Value::Number(-1.0)),
    }
}

fn str_upper(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(Args::new("str:upper", values).string(0)?.to_uppercase()))
}

fn str_lower(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(Args::new("str:lower", values).string(0)?.to_lowercase()))
}

fn str_trim(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(Args::new("str:trim", values).string(0)?.trim()))
}

/// `(str:slice s start end)`, end exclusive
fn str_slice(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:slice", values);
    let chars: Vec<char> = args.string(0)?.chars().collect();
    let (start, end) = (args.integer(1)?, args.integer(2)?);
    let len = chars.len();

    let in_bounds = |i: i64| usize::try_from(i).ok().filter(|&i| i <= len);
    let Some(start_index) = in_bounds(start) else {
        return Err(Error::eval_error(format!(
            "`str:slice` start index out of bounds: {start} (string length: {len})"
        )));
    };
    let Some(end_index) = in_bounds(end) else {
        return Err(Error::eval_error(format!(
            "`str:slice` end index out of bounds: {end} (string length: {len})"
        )));
    };
    if start_index > end_index {
        return Err(Error::eval_error(format!(
            "`str:slice` start index ({start}) cannot be greater than end index ({end})"
        )));
    }

    Ok(Value::from(chars[start_index..end_index].iter().collect::<String>()))
}

/// An empty separator splits into single characters
fn str_split(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:split", values);
    let (s, separator) = (args.string(0)?, args.string(1)?);
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::from(c.to_string())).collect()
    } else {
        s.split(separator).map(Value::from).collect()
    };
    Ok(Value::vector(parts))
}

fn str_join(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:join", values);
    let elements = args.vector(0)?.borrow();
    let separator = args.string(1)?;

    let mut parts = Vec::with_capacity(elements.len());
    for (i, element) in elements.iter().enumerate() {
        let Value::String(s) = element else {
            return Err(Error::type_error(format!(
                "`str:join` expects vector of strings, got {} at index {i}",
                element.value_type()
            )));
        };
        parts.push(s.as_ref());
    }
    Ok(Value::from(parts.join(separator)))
}

fn str_replace(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:replace", values);
    let (s, from, to) = (args.string(0)?, args.string(1)?, args.string(2)?);
    Ok(Value::from(s.replace(from, to)))
}

fn str_starts(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:starts", values);
    Ok(Value::Bool(args.string(0)?.starts_with(args.string(1)?)))
}

fn str_ends(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:ends", values);
    Ok(Value::Bool(args.string(0)?.ends_with(args.string(1)?)))
}

fn str_reverse(values: &[Value]) -> Result<Value, Error> {
    let s = Args::new("str:reverse", values).string(0)?;
    Ok(Value::from(s.chars().rev().collect::<String>()))
}

fn str_repeat(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:repeat", values);
    let (s, count) = (args.string(0)?, args.integer(1)?);
    let Ok(count) = usize::try_from(count) else {
        return Err(Error::eval_error(format!(
            "`str:repeat` count cannot be negative: {count}"
        )));
    };
    match s.len().checked_mul(count) {
        Some(len) if len <= MAX_STRING_LEN => Ok(Value::from(s.repeat(count))),
        _ => Err(Error::eval_error(format!(
            "`str:repeat` result too large: {count} copies of {} bytes (max: {MAX_STRING_LEN} bytes)",
            s.len()
        ))),
    }
}

fn str_concat(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("str:concat", values);
    let mut result = String::new();
    for i in 0..args.len() {
        result.push_str(args.string(i)?);
    }
    Ok(Value::from(result))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "str:len",
        arity: Arity::Exact(1),
        func: str_len,
    },
    BuiltinOp {
        name: "str:contains",
        arity: Arity::Exact(2),
        func: str_contains,
    },
    BuiltinOp {
        name: "str:index",
        arity: Arity::Exact(2),
        func: str_index,
    },
    BuiltinOp {
        name: "str:upper",
        arity: Arity::Exact(1),
        func: str_upper,
    },
    BuiltinOp {
        name: "str:lower",
        arity: Arity::Exact(1),
        func: str_lower,
    },
    BuiltinOp {
        name: "str:trim",
        arity: Arity::Exact(1),
        func: str_trim,
    },
    BuiltinOp {
        name: "str:slice",
        arity: Arity::Exact(3),
        func: str_slice,
    },
    BuiltinOp {
        name: "str:split",
        arity: Arity::Exact(2),
        func: str_split,
    },
    BuiltinOp {
        name: "str:join",
        arity: Arity::Exact(2),
        func: str_join,
    },
    BuiltinOp {
        name: "str:replace",
        arity: Arity::Exact(3),
        func: str_replace,
    },
    BuiltinOp {
        name: "str:starts",
        arity: Arity::Exact(2),
        func: str_starts,
    },
    BuiltinOp {
        name: "str:ends",
        arity: Arity::Exact(2),
        func: str_ends,
    },
    BuiltinOp {
        name: "str:reverse",
        arity: Arity::Exact(1),
        func: str_reverse,
    },
    BuiltinOp {
        name: "str:repeat",
        arity: Arity::Exact(2),
        func: str_repeat,
    },
    BuiltinOp {
        name: "str:concat",
        arity: Arity::AtLeast(0),
        func: str_concat,
    },
];
