//! `map:` natives. Keys are always strings; `map:set`, `map:delete` and
//! `map:merge` mutate the map in place and return it.

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::stdlib::number_from_usize;
use crate::value::{Value, format_number};

fn map_len(values: &[Value]) -> Result<Value, Error> {
    let map = Args::new("map:len", values).map(0)?;
    Ok(number_from_usize(map.borrow().len()))
}

/// Value for the key, or nil
fn map_get(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:get", values);
    let (map, key) = (args.map(0)?, args.string(1)?);
    Ok(map.borrow().get(key).cloned().unwrap_or(Value::Nil))
}

/// Follows a path of STRING keys and integer indices through nested maps and
/// vectors. A missing key, an index out of range or a step into a value of
/// the wrong kind yields nil.
fn map_get_in(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:get-in", values);
    let path = args.vector(1)?.borrow();
    let mut current = args.get(0)?.clone();

    for (i, step) in path.iter().enumerate() {
        let next = match (step, &current) {
            (Value::String(key), Value::Map(map)) => map.borrow().get(key.as_ref()).cloned(),
            (Value::String(_), _) => None,
            (Value::Number(n), current) => {
                if n.fract() != 0.0 || !n.is_finite() {
                    return Err(Error::type_error(format!(
                        "`map:get-in` expects integer index at path position {i}, got {}",
                        format_number(*n)
                    )));
                }
                match current {
                    #[allow(clippy::cast_possible_truncation)] // integral by the check above
                    Value::Vector(elements) if *n >= 0.0 => {
                        elements.borrow().get(*n as usize).cloned()
                    }
                    _ => None,
                }
            }
            (other, _) => {
                return Err(Error::type_error(format!(
                    "`map:get-in` expects STRING or NUMBER in path at position {i}, got {}",
                    other.value_type()
                )));
            }
        };
        match next {
            Some(value) => current = value,
            None => return Ok(Value::Nil),
        }
    }

    Ok(current)
}

fn map_set(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:set", values);
    let (map, key, value) = (args.map(0)?, args.string(1)?, args.get(2)?.clone());
    let _old = map.borrow_mut().insert(key.to_owned(), value);
    Ok(args.get(0)?.clone())
}

fn map_delete(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:delete", values);
    let (map, key) = (args.map(0)?, args.string(1)?);
    let _removed = map.borrow_mut().remove(key);
    Ok(args.get(0)?.clone())
}

fn sorted_entries(values: &[Value], name: &'static str) -> Result<Vec<(String, Value)>, Error> {
    let map = Args::new(name, values).map(0)?.borrow();
    let mut entries: Vec<(String, Value)> =
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries)
}

fn map_keys(values: &[Value]) -> Result<Value, Error> {
    let entries = sorted_entries(values, "map:keys")?;
    Ok(Value::vector(
        entries.into_iter().map(|(k, _)| Value::from(k)).collect(),
    ))
}

fn map_values(values: &[Value]) -> Result<Value, Error> {
    let entries = sorted_entries(values, "map:values")?;
    Ok(Value::vector(entries.into_iter().map(|(_, v)| v).collect()))
}

/// Copies every entry of the second map into the first
fn map_merge(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:merge", values);
    let target = args.map(0)?;
    let source = args.map(1)?.borrow().clone();
    target.borrow_mut().extend(source);
    Ok(args.get(0)?.clone())
}

fn map_has(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("map:has", values);
    let (map, key) = (args.map(0)?, args.string(1)?);
    Ok(Value::Bool(map.borrow().contains_key(key)))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "map:len",
        arity: Arity::Exact(1),
        func: map_len,
    },
    BuiltinOp {
        name: "map:get",
        arity: Arity::Exact(2),
        func: map_get,
    },
    BuiltinOp {
        name: "map:get-in",
        arity: Arity::Exact(2),
        func: map_get_in,
    },
    BuiltinOp {
        name: "map:set",
        arity: Arity::Exact(3),
        func: map_set,
    },
    BuiltinOp {
        name: "map:delete",
        arity: Arity::Exact(2),
        func: map_delete,
    },
    BuiltinOp {
        name: "map:keys",
        arity: Arity::Exact(1),
        func: map_keys,
    },
    BuiltinOp {
        name: "map:values",
        arity: Arity::Exact(1),
        func: map_values,
    },
    BuiltinOp {
        name: "map:merge",
        arity: Arity::Exact(2),
        func: map_merge,
    },
    BuiltinOp {
        name: "map:has",
        arity: Arity::Exact(2),
        func: map_has,
    },
];
