//! Runtime values.
//!
//! [`Value`] is a closed set of variants. Scalars (`Number`, `String`, `Bool`,
//! `Nil`) are immutable. `Vector` and `Map` are shared, mutable containers:
//! cloning a `Value::Vector` clones the handle, not the elements, so a mutation
//! through one variable is visible through every other reference to the same
//! container. Functions are either closures over an [`Environment`] or host
//! natives that only ever see their argument values.
//!
//! Ergonomic helpers such as [`val`] and the `From` conversions make it easy to
//! build values from Rust literals in tests and native functions.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::{Error, MAX_PARSE_DEPTH};
use crate::ast::Node;
use crate::builtinops::Arity;
use crate::environment::Environment;

/// The canonical signature of host-implemented functions
pub type NativeFn = dyn Fn(&[Value]) -> Result<Value, Error>;

/// Type tags, as shown in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Number,
    String,
    Bool,
    Nil,
    Vector,
    Map,
    Function,
    NativeFunction,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Number => "NUMBER",
            ValueType::String => "STRING",
            ValueType::Bool => "BOOL",
            ValueType::Nil => "NIL",
            ValueType::Vector => "VECTOR",
            ValueType::Map => "MAP",
            ValueType::Function => "FUNC",
            ValueType::NativeFunction => "NATIVE_FUNC",
        };
        write!(f, "{name}")
    }
}

/// A user-defined function: parameter names and body, plus the environment
/// that was active when the `lambda` form was evaluated.
pub struct Closure {
    pub params: Vec<String>,
    pub body: Node,
    pub env: Rc<Environment>,
}

/// A host function registered in the native registry
#[derive(Clone)]
pub struct NativeFunction {
    pub name: Rc<str>,
    pub arity: Arity,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Rc<str>>,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, Error> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            arity,
            func: Rc::new(func),
        }
    }

    /// Check the argument count against the declared arity, then run the function
    pub fn call(&self, args: &[Value]) -> Result<Value, Error> {
        self.arity.validate(&self.name, args.len())?;
        (self.func)(args)
    }
}

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(Rc<str>),
    Bool(bool),
    Nil,
    Vector(Rc<RefCell<Vec<Value>>>),
    Map(Rc<RefCell<HashMap<String, Value>>>),
    Function(Rc<Closure>),
    NativeFunction(NativeFunction),
}

impl Value {
    pub fn vector(elements: Vec<Value>) -> Self {
        Value::Vector(Rc::new(RefCell::new(elements)))
    }

    pub fn map(entries: HashMap<String, Value>) -> Self {
        Value::Map(Rc::new(RefCell::new(entries)))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Bool(_) => ValueType::Bool,
            Value::Nil => ValueType::Nil,
            Value::Vector(_) => ValueType::Vector,
            Value::Map(_) => ValueType::Map,
            Value::Function(_) => ValueType::Function,
            Value::NativeFunction(_) => ValueType::NativeFunction,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Function(_) | Value::NativeFunction(_))
    }

    fn is_container(&self) -> bool {
        matches!(self, Value::Vector(_) | Value::Map(_))
    }

    /// Identity of the shared container, used to detect cycles when printing
    fn container_ptr(&self) -> Option<*const ()> {
        match self {
            Value::Vector(v) => Some(Rc::as_ptr(v).cast()),
            Value::Map(m) => Some(Rc::as_ptr(m).cast()),
            _ => None,
        }
    }

    /// `open` holds the containers being printed, outermost first. Cycles and
    /// nesting deeper than [`MAX_PARSE_DEPTH`] print as `(...)` / `[...]`.
    fn write_canonical(&self, f: &mut fmt::Formatter<'_>, open: &mut Vec<*const ()>) -> fmt::Result {
        if let Some(ptr) = self.container_ptr() {
            if open.len() >= MAX_PARSE_DEPTH || open.contains(&ptr) {
                return match self {
                    Value::Map(_) => write!(f, "[...]"),
                    _ => write!(f, "(...)"),
                };
            }
            open.push(ptr);
        }

        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n))?,
            Value::String(s) => write!(f, "{s}")?,
            Value::Bool(b) => write!(f, "{b}")?,
            Value::Nil => write!(f, "<nil>")?,
            Value::Vector(elements) => {
                write!(f, "(")?;
                for (i, element) in elements.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    element.write_canonical(f, open)?;
                }
                write!(f, ")")?;
            }
            Value::Map(entries) => {
                let entries = entries.borrow();
                let mut keys: Vec<&String> = entries.keys().collect();
                keys.sort();
                write!(f, "[")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{key} ")?;
                    if let Some(value) = entries.get(key) {
                        value.write_canonical(f, open)?;
                    }
                }
                write!(f, "]")?;
            }
            Value::Function(_) => write!(f, "Function()")?,
            Value::NativeFunction(_) => write!(f, "NativeFunction()")?,
        }

        if self.container_ptr().is_some() {
            open.pop();
        }
        Ok(())
    }
}

/// Containers are released iteratively: the elements of a container this value
/// holds the last handle to are moved onto a worklist instead of being dropped
/// recursively, so arbitrarily deep nesting cannot overflow the stack.
impl Drop for Value {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        take_elements(self, &mut pending);
        while let Some(mut value) = pending.pop() {
            take_elements(&mut value, &mut pending);
        }
    }
}

fn take_elements(value: &mut Value, pending: &mut Vec<Value>) {
    match value {
        Value::Vector(elements) if Rc::strong_count(elements) == 1 => {
            if let Ok(mut elements) = elements.try_borrow_mut() {
                pending.extend(elements.drain(..).filter(Value::is_container));
            }
        }
        Value::Map(entries) if Rc::strong_count(entries) == 1 => {
            if let Ok(mut entries) = entries.try_borrow_mut() {
                pending.extend(entries.drain().map(|(_, value)| value).filter(Value::is_container));
            }
        }
        _ => {}
    }
}

/// Canonical number rendering: integral values print without a fractional
/// part, other values are rounded to 10 decimal places to hide binary
/// floating point noise, then printed in the shortest form (switching to
/// exponent notation below `1e-4` and from `1e6` up).
pub fn format_number(n: f64) -> String {
    if n == 0.0 {
        return "0".to_owned();
    }
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "+Inf" } else { "-Inf" }.to_owned();
    }
    if n == n.trunc() {
        return format!("{n:.0}");
    }

    let rounded: f64 = format!("{n:.10}").parse().unwrap_or(n);
    if rounded == 0.0 {
        return "0".to_owned();
    }

    let scientific = format!("{rounded:e}");
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return format!("{rounded}");
    };
    let exponent: i32 = exponent.parse().unwrap_or_default();
    if exponent < -4 || exponent >= 6 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
    } else {
        format!("{rounded}")
    }
}

/// The canonical rendering used by `print`, `to-string`, string
/// concatenation with `+` and the REPL. Strings print without quotes.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_canonical(f, &mut Vec::new())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Nil => write!(f, "Nil"),
            Value::Vector(_) | Value::Map(_) => write!(f, "{}({self})", self.value_type()),
            Value::Function(closure) => write!(f, "Function(params={:?})", closure.params),
            Value::NativeFunction(native) => write!(f, "NativeFunction({})", native.name),
        }
    }
}

/// Structural equality for host code and tests. The language's own `=`
/// operator is stricter (see `builtinops`): it rejects containers and functions.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Vector(a), Value::Vector(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::NativeFunction(a), Value::NativeFunction(b)) => a.name == b.name,
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($($num_type:ty),*) => {
        $(
            impl From<$num_type> for Value {
                fn from(n: $num_type) -> Self {
                    Value::Number(f64::from(n))
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, u8, u16, u32, f32, f64);

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::vector(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::vector(arr.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(option: Option<T>) -> Self {
        option.map_or(Value::Nil, Into::into)
    }
}

/// Helper for creating Values from anything convertible
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper for creating map values from key/value pairs
pub fn map_of<K: Into<String>, V: Into<Value>>(entries: Vec<(K, V)>) -> Value {
    Value::map(
        entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting_data_driven() {
        let test_cases = vec![
            (0.0, "0"),
            (-0.0, "0"),
            (42.0, "42"),
            (-7.0, "-7"),
            (1e21, "1000000000000000000000"),
            (0.5, "0.5"),
            (-2.25, "-2.25"),
            (0.1 + 0.2, "0.3"),
            (1.0 / 3.0, "0.3333333333"),
            (2.000_000_000_01, "2"),
            (0.0001, "0.0001"),
            (0.000_012_5, "1.25e-05"),
            (1_234_567.5, "1.2345675e+06"),
            (123_456.5, "123456.5"),
            (1e-12, "0"),
            (f64::NAN, "NaN"),
            (f64::INFINITY, "+Inf"),
            (f64::NEG_INFINITY, "-Inf"),
        ];

        for (i, (n, expected)) in test_cases.iter().enumerate() {
            assert_eq!(format_number(*n), *expected, "Test case #{}: {n}", i + 1);
        }
    }

    #[test]
    fn test_rendering() {
        let test_cases = vec![
            (val("plain"), "plain"),
            (val(true), "true"),
            (Value::Nil, "<nil>"),
            (val(vec![val(1), val("a"), val(vec![val(2.5)])]), "(1 a (2.5))"),
            (val(Vec::<Value>::new()), "()"),
            (map_of(vec![("b", val(2)), ("a", val("x"))]), "[a x b 2]"),
            (map_of(Vec::<(&str, Value)>::new()), "[]"),
        ];

        for (i, (value, expected)) in test_cases.iter().enumerate() {
            assert_eq!(value.to_string(), *expected, "Test case #{}", i + 1);
        }
    }

    #[test]
    fn test_cyclic_containers_render() {
        let v = val(vec![val(1)]);
        if let Value::Vector(elements) = &v {
            elements.borrow_mut().push(v.clone());
        }
        assert_eq!(v.to_string(), "(1 (...))");

        // break the cycle so the test does not leak
        if let Value::Vector(elements) = &v {
            elements.borrow_mut().clear();
        }
    }

    #[test]
    fn test_deeply_nested_containers() {
        let mut chain = val(1);
        for i in 0..200_000 {
            chain = if i % 2 == 0 { val(vec![chain]) } else { map_of(vec![("k", chain)]) };
        }
        let rendered = chain.to_string();
        assert!(rendered.starts_with("[k ([k ("), "{}", &rendered[..16]);
        assert!(rendered.contains("(...)") || rendered.contains("[...]"));
        assert!(rendered.len() < 8 * MAX_PARSE_DEPTH);
        drop(chain);

        // still reachable through another handle, so not emptied
        let shared = val(vec![val(7)]);
        let outer = val(vec![shared.clone(), val(vec![val(8)])]);
        drop(outer);
        assert_eq!(shared.to_string(), "(7)");
    }

    #[test]
    fn test_aliasing() {
        let a = val(vec![val(1)]);
        let b = a.clone();
        if let Value::Vector(elements) = &b {
            elements.borrow_mut().push(val(2));
        }
        assert_eq!(a.to_string(), "(1 2)");
        assert_eq!(a, b);
    }

    #[test]
    fn test_value_types() {
        let native = Value::NativeFunction(NativeFunction::new("id", Arity::Exact(1), |args| {
            Ok(args[0].clone())
        }));
        let test_cases = vec![
            (val(1), "NUMBER"),
            (val("s"), "STRING"),
            (val(false), "BOOL"),
            (Value::Nil, "NIL"),
            (val([1, 2]), "VECTOR"),
            (map_of(vec![("k", 1)]), "MAP"),
            (native, "NATIVE_FUNC"),
        ];

        for (value, expected) in test_cases {
            assert_eq!(value.value_type().to_string(), expected);
        }
    }

    #[test]
    fn test_native_call_checks_arity() {
        let native = NativeFunction::new("id", Arity::Exact(1), |args| Ok(args[0].clone()));
        assert_eq!(native.call(&[val(3)]), Ok(val(3)));
        let error = native.call(&[]).err().map(|e| e.to_string());
        assert_eq!(error.as_deref(), Some("Error: `id` expects 1 argument(s), got 0"));
    }
}
