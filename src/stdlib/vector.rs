//! `vec:` natives.
//!
//! Vectors are shared handles: `vec:set`, `vec:delete`, `vec:push`, `vec:pop`,
//! `vec:concat`, `vec:reverse` and `vec:sort` mutate in place and return the
//! same vector, so the change is visible through every reference to it.
//! `vec:slice` is the only function that returns a copy.

use std::cmp::Ordering;

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::stdlib::number_from_usize;
use crate::value::{Value, ValueType};

/// Index argument `index` of `args`, checked against `len`
fn checked_index(args: &Args<'_>, index: usize, len: usize) -> Result<usize, Error> {
    let n = args.integer(index)?;
    usize::try_from(n).ok().filter(|&i| i < len).ok_or_else(|| {
        Error::eval_error(format!(
            "`{}` index out of bounds: {n} (vector length: {len})",
            args.name()
        ))
    })
}

/// Equality used by `vec:contains` and `vec:find`: primitives by value,
/// containers and functions never match
fn primitive_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        _ => false,
    }
}

fn vec_len(values: &[Value]) -> Result<Value, Error> {
    let vector = Args::new("vec:len", values).vector(0)?;
    Ok(number_from_usize(vector.borrow().len()))
}

fn vec_get(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:get", values);
    let elements = args.vector(0)?.borrow();
    let index = checked_index(&args, 1, elements.len())?;
    Ok(elements[index].clone())
}

fn vec_set(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:set", values);
    let vector = args.vector(0)?;
    let value = args.get(2)?.clone();
    let index = checked_index(&args, 1, vector.borrow().len())?;
    // the replaced element is dropped after the borrow ends
    let _old = std::mem::replace(&mut vector.borrow_mut()[index], value);
    Ok(args.get(0)?.clone())
}

fn vec_delete(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:delete", values);
    let vector = args.vector(0)?;
    let index = checked_index(&args, 1, vector.borrow().len())?;
    let _removed = vector.borrow_mut().remove(index);
    Ok(args.get(0)?.clone())
}

fn vec_push(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:push", values);
    args.vector(0)?.borrow_mut().push(args.get(1)?.clone());
    Ok(args.get(0)?.clone())
}

fn vec_pop(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:pop", values);
    let popped = args.vector(0)?.borrow_mut().pop();
    if popped.is_none() {
        return Err(Error::eval_error("`vec:pop` cannot pop from empty vector"));
    }
    Ok(args.get(0)?.clone())
}

/// `(vec:slice v start end)`, end exclusive; returns a new vector
fn vec_slice(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:slice", values);
    let elements = args.vector(0)?.borrow();
    let (start, end) = (args.integer(1)?, args.integer(2)?);
    let len = elements.len();

    let in_bounds = |i: i64| usize::try_from(i).ok().filter(|&i| i <= len);
    let Some(start_index) = in_bounds(start) else {
        return Err(Error::eval_error(format!(
            "`vec:slice` start index out of bounds: {start} (vector length: {len})"
        )));
    };
    let Some(end_index) = in_bounds(end) else {
        return Err(Error::eval_error(format!(
            "`vec:slice` end index out of bounds: {end} (vector length: {len})"
        )));
    };
    if start_index > end_index {
        return Err(Error::eval_error(format!(
            "`vec:slice` start index ({start}) cannot be greater than end index ({end})"
        )));
    }

    Ok(Value::vector(elements[start_index..end_index].to_vec()))
}

/// Appends the elements of the second vector to the first
fn vec_concat(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:concat", values);
    let target = args.vector(0)?;
    // copied first, both arguments may be the same vector
    let extra = args.vector(1)?.borrow().clone();
    target.borrow_mut().extend(extra);
    Ok(args.get(0)?.clone())
}

fn vec_contains(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:contains", values);
    let needle = args.get(1)?;
    let found = args.vector(0)?.borrow().iter().any(|e| primitive_eq(e, needle));
    Ok(Value::Bool(found))
}

/// Index of the first matching element, or nil
fn vec_find(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:find", values);
    let needle = args.get(1)?;
    let position = args
        .vector(0)?
        .borrow()
        .iter()
        .position(|e| primitive_eq(e, needle));
    Ok(position.map_or(Value::Nil, number_from_usize))
}

fn vec_reverse(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:reverse", values);
    args.vector(0)?.borrow_mut().reverse();
    Ok(args.get(0)?.clone())
}

/// Sorts NUMBER, STRING or BOOL elements (`false` before `true`) in place.
/// All elements must share one of those types.
fn vec_sort(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("vec:sort", values);
    let vector = args.vector(0)?;
    let mut elements = vector.borrow_mut();

    let Some(first) = elements.first().map(Value::value_type) else {
        drop(elements);
        return Ok(args.get(0)?.clone());
    };
    if !matches!(first, ValueType::Number | ValueType::String | ValueType::Bool) {
        return Err(Error::type_error(format!(
            "`vec:sort` cannot sort {first} values"
        )));
    }
    if let Some((i, other)) = elements
        .iter()
        .enumerate()
        .find(|(_, e)| e.value_type() != first)
    {
        return Err(Error::type_error(format!(
            "`vec:sort` expects all elements to be {first}, got {} at index {i}",
            other.value_type()
        )));
    }

    elements.sort_by(|a, b| match (a, b) {
        (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    });
    drop(elements);
    Ok(args.get(0)?.clone())
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "vec:len",
        arity: Arity::Exact(1),
        func: vec_len,
    },
    BuiltinOp {
        name: "vec:get",
        arity: Arity::Exact(2),
        func: vec_get,
    },
    BuiltinOp {
        name: "vec:set",
        arity: Arity::Exact(3),
        func: vec_set,
    },
    BuiltinOp {
        name: "vec:delete",
        arity: Arity::Exact(2),
        func: vec_delete,
    },
    BuiltinOp {
        name: "vec:push",
        arity: Arity::Exact(2),
        func: vec_push,
    },
    BuiltinOp {
        name: "vec:pop",
        arity: Arity::Exact(1),
        func: vec_pop,
    },
    BuiltinOp {
        name: "vec:slice",
        arity: Arity::Exact(3),
        func: vec_slice,
    },
    BuiltinOp {
        name: "vec:concat",
        arity: Arity::Exact(2),
        func: vec_concat,
    },
    BuiltinOp {
        name: "vec:contains",
        arity: Arity::Exact(2),
        func: vec_contains,
    },
    BuiltinOp {
        name: "vec:find",
        arity: Arity::Exact(2),
        func: vec_find,
    },
    BuiltinOp {
        name: "vec:reverse",
        arity: Arity::Exact(1),
        func: vec_reverse,
    },
    BuiltinOp {
        name: "vec:sort",
        arity: Arity::Exact(1),
        func: vec_sort,
    },
];
