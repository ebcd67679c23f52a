//! Built-in operations and the native function registry.
//!
//! Everything that is called like a function but implemented by the host lives
//! here: the operators (`+ - * / %`, `= < <= > >=`, `not`), `print`, the type
//! predicates and conversions, and, through [`crate::stdlib`], the namespaced
//! natives such as `str:len` or `vec:push`.
//!
//! ```text
//! (+ 1 2 3)           ; 6
//! (+ "a" 1 "b")       ; "a1b"  (any STRING operand means concatenation)
//! (- 5)               ; -5
//! (= "a" "a")         ; true
//! (< 1 "a")           ; error: `<` cannot compare NUMBER and STRING
//! (is-int 2.5)        ; false
//! ```
//!
//! ## Strict Typing
//!
//! - Arithmetic requires NUMBER operands (except the string form of `+`)
//! - Comparisons require both operands to have the same type
//! - `=` works on NUMBER, STRING, BOOL and NIL only; VECTOR, MAP and functions
//!   have no defined equality and are rejected
//! - `not` requires a BOOL
//!
//! ## Natives are pure
//!
//! A native only sees its argument values: it cannot read or change variables.
//! The registry is built once when the interpreter is created and is read-only
//! afterwards. Lexical bindings shadow natives of the same name because the
//! evaluator consults the environment chain first.
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** with the signature `fn(&[Value]) -> Result<Value, Error>`,
//!    using [`Args`] to extract typed arguments
//! 2. **Add a [`BuiltinOp`]** entry with its name and arity to the module's `OPS` table
//! 3. **Add tests** covering edge cases and error conditions

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;
use std::{cell::RefCell, collections::hash_map::Entry};

use crate::Error;
use crate::value::{NativeFunction, Value, ValueType, format_number};

/// Number of arguments a callable accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Exactly n arguments
    Exact(usize),
    /// At least n arguments
    AtLeast(usize),
    /// Between min and max arguments (inclusive)
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }

    /// Check `count` arguments passed to `name`
    pub fn validate(self, name: &str, count: usize) -> Result<(), Error> {
        if self.accepts(count) {
            Ok(())
        } else {
            Err(Error::arity_error(name, self, count))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::AtLeast(n) => write!(f, "at least {n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
        }
    }
}

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The name the operation is called by
    pub name: &'static str,
    /// Expected number of arguments, checked before `func` runs
    pub arity: Arity,
    pub func: fn(&[Value]) -> Result<Value, Error>,
}

impl BuiltinOp {
    pub fn to_native(&self) -> NativeFunction {
        NativeFunction::new(self.name, self.arity, self.func)
    }
}

/// Typed access to the arguments of a native call. Every accessor reports a
/// type error naming the native and the 1-based argument position.
#[derive(Clone, Copy)]
pub struct Args<'a> {
    name: &'static str,
    values: &'a [Value],
}

impl<'a> Args<'a> {
    pub fn new(name: &'static str, values: &'a [Value]) -> Self {
        Args { name, values }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&'a Value, Error> {
        self.values.get(index).ok_or_else(|| {
            Error::eval_error(format!(
                "`{}` expects an argument at position {}",
                self.name,
                index + 1
            ))
        })
    }

    /// A type error for argument `index`
    pub fn expected(&self, expected: &str, index: usize) -> Error {
        let found = self
            .values
            .get(index)
            .map_or(ValueType::Nil, Value::value_type);
        Error::type_error(format!(
            "`{}` expects {expected} at argument {}, got {found}",
            self.name,
            index + 1
        ))
    }

    pub fn number(&self, index: usize) -> Result<f64, Error> {
        match self.get(index)? {
            Value::Number(n) => Ok(*n),
            _ => Err(self.expected("NUMBER", index)),
        }
    }

    /// A NUMBER without fractional part
    pub fn integer(&self, index: usize) -> Result<i64, Error> {
        let n = self.number(index)?;
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(Error::type_error(format!(
                "`{}` expects integer NUMBER at argument {}, got {}",
                self.name,
                index + 1,
                format_number(n)
            )));
        }
        #[allow(clippy::cast_possible_truncation)] // integral by the check above
        let n = n as i64;
        Ok(n)
    }

    pub fn string(&self, index: usize) -> Result<&'a str, Error> {
        match self.get(index)? {
            Value::String(s) => Ok(s),
            _ => Err(self.expected("STRING", index)),
        }
    }

    pub fn bool(&self, index: usize) -> Result<bool, Error> {
        match self.get(index)? {
            Value::Bool(b) => Ok(*b),
            _ => Err(self.expected("BOOL", index)),
        }
    }

    pub fn vector(&self, index: usize) -> Result<&'a Rc<RefCell<Vec<Value>>>, Error> {
        match self.get(index)? {
            Value::Vector(v) => Ok(v),
            _ => Err(self.expected("VECTOR", index)),
        }
    }

    pub fn map(&self, index: usize) -> Result<&'a Rc<RefCell<HashMap<String, Value>>>, Error> {
        match self.get(index)? {
            Value::Map(m) => Ok(m),
            _ => Err(self.expected("MAP", index)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Value> {
        self.values.iter()
    }
}

//
// Operator Implementations
//

fn builtin_add(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("+", values);
    if args.iter().any(|value| matches!(value, Value::String(_))) {
        let concatenated: String = args.iter().map(ToString::to_string).collect();
        return Ok(Value::from(concatenated));
    }

    let mut total = 0.0;
    for (i, value) in args.iter().enumerate() {
        match value {
            Value::Number(n) => total += n,
            _ => return Err(args.expected("NUMBER or STRING", i)),
        }
    }
    Ok(Value::Number(total))
}

fn builtin_sub(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("-", values);
    let first = args.number(0)?;
    if args.len() == 1 {
        return Ok(Value::Number(-first));
    }

    let mut result = first;
    for i in 1..args.len() {
        result -= args.number(i)?;
    }
    Ok(Value::Number(result))
}

fn builtin_mul(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("*", values);
    let mut product = args.number(0)?;
    for i in 1..args.len() {
        product *= args.number(i)?;
    }
    Ok(Value::Number(product))
}

fn builtin_div(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("/", values);
    let mut quotient = args.number(0)?;
    for i in 1..args.len() {
        let divisor = args.number(i)?;
        if divisor == 0.0 {
            return Err(Error::eval_error("`/` division by zero"));
        }
        quotient /= divisor;
    }
    Ok(Value::Number(quotient))
}

fn builtin_mod(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("%", values);
    let (left, right) = (args.number(0)?, args.number(1)?);
    if right == 0.0 {
        return Err(Error::eval_error("`%` modulo by zero"));
    }
    // truncated remainder, sign follows the dividend
    Ok(Value::Number(left % right))
}

fn same_type<'a>(name: &str, values: &'a [Value]) -> Result<(&'a Value, &'a Value), Error> {
    let [left, right] = values else {
        return Err(Error::arity_error(name, Arity::Exact(2), values.len()));
    };
    if left.value_type() != right.value_type() {
        return Err(Error::type_error(format!(
            "`{name}` cannot compare {} and {}",
            left.value_type(),
            right.value_type()
        )));
    }
    Ok((left, right))
}

fn builtin_eq(values: &[Value]) -> Result<Value, Error> {
    let equal = match same_type("=", values)? {
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Nil, Value::Nil) => true,
        (other, _) => {
            return Err(Error::type_error(format!(
                "`=` cannot compare {} values",
                other.value_type()
            )));
        }
    };
    Ok(Value::Bool(equal))
}

/// Ordering of two NUMBER or two STRING operands; `None` when unordered (NaN)
fn compare_ordered(name: &str, values: &[Value]) -> Result<Option<Ordering>, Error> {
    match same_type(name, values)? {
        (Value::Number(a), Value::Number(b)) => Ok(a.partial_cmp(b)),
        (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
        (other, _) => Err(Error::type_error(format!(
            "`{name}` cannot compare {} values",
            other.value_type()
        ))),
    }
}

// Macro to generate ordering comparison functions
macro_rules! ordering_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(values: &[Value]) -> Result<Value, Error> {
            let ordering = compare_ordered($op_str, values)?;
            Ok(Value::Bool(matches!(ordering, Some(o) if o $op Ordering::Equal)))
        }
    };
}

ordering_comparison!(builtin_lt, <, "<");
ordering_comparison!(builtin_le, <=, "<=");
ordering_comparison!(builtin_gt, >, ">");
ordering_comparison!(builtin_ge, >=, ">=");

fn builtin_not(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(!Args::new("not", values).bool(0)?))
}

/// Writes the renderings of all arguments, without separators, then a newline
fn builtin_print(values: &[Value]) -> Result<Value, Error> {
    let mut line: String = values.iter().map(ToString::to_string).collect();
    line.push('\n');

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(line.as_bytes())
        .and_then(|()| stdout.flush())
        .map_err(|e| Error::io_error(format!("`print` failed: {e}")))?;
    Ok(Value::Nil)
}

//
// Type Predicates and Conversions
//

macro_rules! type_predicate {
    ($name:ident, $pattern:pat) => {
        fn $name(values: &[Value]) -> Result<Value, Error> {
            Ok(Value::Bool(matches!(values, [$pattern])))
        }
    };
}

type_predicate!(builtin_is_bool, Value::Bool(_));
type_predicate!(builtin_is_number, Value::Number(_));
type_predicate!(builtin_is_string, Value::String(_));
type_predicate!(builtin_is_vector, Value::Vector(_));
type_predicate!(builtin_is_map, Value::Map(_));
type_predicate!(builtin_is_nil, Value::Nil);
type_predicate!(builtin_is_function, Value::Function(_) | Value::NativeFunction(_));

fn builtin_is_int(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::Bool(
        matches!(values, [Value::Number(n)] if n.is_finite() && n.fract() == 0.0),
    ))
}

fn builtin_to_string(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("to-string", values);
    match args.get(0)? {
        value @ Value::String(_) => Ok(value.clone()),
        value @ (Value::Number(_) | Value::Bool(_) | Value::Nil) => {
            Ok(Value::from(value.to_string()))
        }
        other => Err(Error::type_error(format!(
            "`to-string` cannot convert {} to STRING",
            other.value_type()
        ))),
    }
}

fn builtin_to_number(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("to-number", values);
    match args.get(0)? {
        value @ Value::Number(_) => Ok(value.clone()),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Number).map_err(|_| {
            Error::eval_error(format!("`to-number` cannot parse STRING '{s}' to NUMBER"))
        }),
        Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::Nil => Ok(Value::Number(0.0)),
        other => Err(Error::type_error(format!(
            "`to-number` cannot convert {} to NUMBER",
            other.value_type()
        ))),
    }
}

fn builtin_to_bool(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("to-bool", values);
    match args.get(0)? {
        value @ Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => Ok(Value::Bool(*n != 0.0)),
        Value::String(s) => Ok(Value::Bool(!s.is_empty())),
        Value::Nil => Ok(Value::Bool(false)),
        other => Err(Error::type_error(format!(
            "`to-bool` cannot convert {} to BOOL",
            other.value_type()
        ))),
    }
}

/// Core operations, always registered
pub(crate) const OPS: &[BuiltinOp] = &[
    // Arithmetic operations
    BuiltinOp {
        name: "+",
        arity: Arity::AtLeast(2),
        func: builtin_add,
    },
    BuiltinOp {
        name: "-",
        arity: Arity::AtLeast(1),
        func: builtin_sub,
    },
    BuiltinOp {
        name: "*",
        arity: Arity::AtLeast(2),
        func: builtin_mul,
    },
    BuiltinOp {
        name: "/",
        arity: Arity::AtLeast(2),
        func: builtin_div,
    },
    BuiltinOp {
        name: "%",
        arity: Arity::Exact(2),
        func: builtin_mod,
    },
    // Comparison operations
    BuiltinOp {
        name: "=",
        arity: Arity::Exact(2),
        func: builtin_eq,
    },
    BuiltinOp {
        name: "<",
        arity: Arity::Exact(2),
        func: builtin_lt,
    },
    BuiltinOp {
        name: "<=",
        arity: Arity::Exact(2),
        func: builtin_le,
    },
    BuiltinOp {
        name: ">",
        arity: Arity::Exact(2),
        func: builtin_gt,
    },
    BuiltinOp {
        name: ">=",
        arity: Arity::Exact(2),
        func: builtin_ge,
    },
    // Logical operations
    BuiltinOp {
        name: "not",
        arity: Arity::Exact(1),
        func: builtin_not,
    },
    // Output
    BuiltinOp {
        name: "print",
        arity: Arity::AtLeast(1),
        func: builtin_print,
    },
    // Type predicates
    BuiltinOp {
        name: "is-bool",
        arity: Arity::Exact(1),
        func: builtin_is_bool,
    },
    BuiltinOp {
        name: "is-number",
        arity: Arity::Exact(1),
        func: builtin_is_number,
    },
    BuiltinOp {
        name: "is-int",
        arity: Arity::Exact(1),
        func: builtin_is_int,
    },
    BuiltinOp {
        name: "is-string",
        arity: Arity::Exact(1),
        func: builtin_is_string,
    },
    BuiltinOp {
        name: "is-vector",
        arity: Arity::Exact(1),
        func: builtin_is_vector,
    },
    BuiltinOp {
        name: "is-map",
        arity: Arity::Exact(1),
        func: builtin_is_map,
    },
    BuiltinOp {
        name: "is-nil",
        arity: Arity::Exact(1),
        func: builtin_is_nil,
    },
    BuiltinOp {
        name: "is-function",
        arity: Arity::Exact(1),
        func: builtin_is_function,
    },
    // Conversions
    BuiltinOp {
        name: "to-string",
        arity: Arity::Exact(1),
        func: builtin_to_string,
    },
    BuiltinOp {
        name: "to-number",
        arity: Arity::Exact(1),
        func: builtin_to_number,
    },
    BuiltinOp {
        name: "to-bool",
        arity: Arity::Exact(1),
        func: builtin_to_bool,
    },
];

/// Flat name to native function table consulted by the evaluator after the
/// environment chain.
#[derive(Clone, Default)]
pub struct NativeRegistry {
    natives: HashMap<String, NativeFunction>,
}

impl NativeRegistry {
    /// A registry without any natives
    pub fn empty() -> Self {
        NativeRegistry::default()
    }

    /// Operators, `print`, type predicates and conversions
    pub fn core() -> Self {
        let mut registry = NativeRegistry::empty();
        registry.register_ops(OPS);
        registry
    }

    /// The core natives plus every enabled standard library module
    pub fn standard() -> Self {
        let mut registry = NativeRegistry::core();
        for ops in crate::stdlib::modules() {
            registry.register_ops(ops);
        }
        registry
    }

    pub fn register_ops(&mut self, ops: &[BuiltinOp]) {
        for op in ops {
            self.register(op.to_native());
        }
    }

    /// Add or replace a native
    pub fn register(&mut self, native: NativeFunction) {
        match self.natives.entry(native.name.to_string()) {
            Entry::Occupied(mut slot) => {
                tracing::debug!(name = %native.name, "replacing native function");
                slot.insert(native);
            }
            Entry::Vacant(slot) => {
                slot.insert(native);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&NativeFunction> {
        self.natives.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.natives.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.natives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.natives.is_empty()
    }

    /// All registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.natives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::value::{map_of, val};

    /// Micro-helper for success cases in comprehensive tests
    fn success<T: Into<Value>>(value: T) -> Option<Value> {
        Some(val(value))
    }

    /// Invoke a builtin through the registry, arity check included
    fn call_builtin(name: &str, args: &[Value]) -> Result<Value, Error> {
        let registry = NativeRegistry::core();
        let native = registry
            .get(name)
            .unwrap_or_else(|| panic!("builtin not found: {name}"));
        native.call(args)
    }

    fn run_builtin_tests(test_cases: Vec<(&str, Vec<Value>, Option<Value>)>) {
        for (i, (name, args, expected)) in test_cases.into_iter().enumerate() {
            let result = call_builtin(name, &args);
            match expected {
                Some(expected) => assert_eq!(
                    result.as_ref().ok(),
                    Some(&expected),
                    "Test case #{} ({name} {args:?}): got {result:?}",
                    i + 1
                ),
                None => assert!(
                    result.is_err(),
                    "Test case #{} ({name} {args:?}): expected error, got {result:?}",
                    i + 1
                ),
            }
        }
    }

    #[test]
    fn test_arity() {
        use Arity::*;

        assert!(Exact(2).accepts(2));
        assert!(!Exact(2).accepts(1));
        assert!(AtLeast(1).accepts(5));
        assert!(!AtLeast(1).accepts(0));
        assert!(Range(1, 3).accepts(3));
        assert!(!Range(1, 3).accepts(4));

        assert_eq!(Exact(1).to_string(), "1");
        assert_eq!(AtLeast(2).to_string(), "at least 2");
        assert_eq!(Range(2, 3).to_string(), "2 to 3");
        assert_eq!(
            AtLeast(2).validate("+", 1).unwrap_err().to_string(),
            "Error: `+` expects at least 2 argument(s), got 1"
        );
    }

    #[test]
    #[expect(clippy::too_many_lines)] // Comprehensive test coverage is intentionally thorough
    fn test_builtins_data_driven() {
        let vector = val([1, 2]);
        let test_cases = vec![
            // === ARITHMETIC ===
            ("+", vec![val(1), val(2), val(3)], success(6)),
            ("+", vec![val(0.1), val(0.2)], success(0.1 + 0.2)),
            ("+", vec![val("a"), val(1), val("b")], success("a1b")),
            ("+", vec![val(1.5), val("x")], success("1.5x")),
            ("+", vec![val("v="), val(true), Value::Nil], success("v=true<nil>")),
            ("+", vec![val(1), val(true)], None),
            ("+", vec![val(1)], None),
            ("-", vec![val(5)], success(-5)),
            ("-", vec![val(10), val(3), val(2)], success(5)),
            ("-", vec![val("a")], None),
            ("*", vec![val(2), val(3), val(4)], success(24)),
            ("*", vec![val(2)], None),
            ("/", vec![val(10), val(4)], success(2.5)),
            ("/", vec![val(1), val(0)], None),
            ("%", vec![val(10), val(3)], success(1)),
            ("%", vec![val(-7), val(3)], success(-1)),
            ("%", vec![val(5.5), val(2)], success(1.5)),
            ("%", vec![val(1), val(0)], None),
            // === EQUALITY ===
            ("=", vec![val(1), val(1)], success(true)),
            ("=", vec![val("a"), val("b")], success(false)),
            ("=", vec![val(true), val(true)], success(true)),
            ("=", vec![Value::Nil, Value::Nil], success(true)),
            ("=", vec![val(1), val("1")], None),
            ("=", vec![vector.clone(), vector.clone()], None),
            ("=", vec![map_of(vec![("a", 1)]), map_of(vec![("a", 1)])], None),
            // === ORDERING ===
            ("<", vec![val(1), val(2)], success(true)),
            ("<=", vec![val(2), val(2)], success(true)),
            (">", vec![val("b"), val("a")], success(true)),
            (">=", vec![val("a"), val("b")], success(false)),
            ("<", vec![val(f64::NAN), val(1)], success(false)),
            ("<", vec![val(1), val("a")], None),
            ("<", vec![val(true), val(false)], None),
            ("<", vec![Value::Nil, Value::Nil], None),
            // === LOGIC ===
            ("not", vec![val(true)], success(false)),
            ("not", vec![val(0)], None),
            ("not", vec![], None),
            // === TYPES ===
            ("is-bool", vec![val(false)], success(true)),
            ("is-number", vec![val("1")], success(false)),
            ("is-int", vec![val(3)], success(true)),
            ("is-int", vec![val(3.5)], success(false)),
            ("is-int", vec![val("3")], success(false)),
            ("is-string", vec![val("")], success(true)),
            ("is-vector", vec![vector.clone()], success(true)),
            ("is-map", vec![vector.clone()], success(false)),
            ("is-nil", vec![Value::Nil], success(true)),
            ("is-function", vec![val(1)], success(false)),
            // === CONVERSIONS ===
            ("to-string", vec![val(42)], success("42")),
            ("to-string", vec![val(0.5)], success("0.5")),
            ("to-string", vec![val(true)], success("true")),
            ("to-string", vec![Value::Nil], success("<nil>")),
            ("to-string", vec![val("s")], success("s")),
            ("to-string", vec![vector.clone()], None),
            ("to-number", vec![val("42")], success(42)),
            ("to-number", vec![val("-1.5")], success(-1.5)),
            ("to-number", vec![val("abc")], None),
            ("to-number", vec![val(true)], success(1)),
            ("to-number", vec![Value::Nil], success(0)),
            ("to-bool", vec![val(0)], success(false)),
            ("to-bool", vec![val("x")], success(true)),
            ("to-bool", vec![val("")], success(false)),
            ("to-bool", vec![Value::Nil], success(false)),
            ("to-bool", vec![vector], None),
        ];

        run_builtin_tests(test_cases);
    }

    #[test]
    fn test_error_messages() {
        let test_cases = vec![
            ("+", vec![val(1), val(true)], "`+` expects NUMBER or STRING at argument 2, got BOOL"),
            ("-", vec![val(1), val("a")], "`-` expects NUMBER at argument 2, got STRING"),
            ("/", vec![val(1), val(0)], "`/` division by zero"),
            ("%", vec![val(1), val(0)], "`%` modulo by zero"),
            ("<", vec![val(1), val("a")], "`<` cannot compare NUMBER and STRING"),
            ("=", vec![val([1]), val([1])], "`=` cannot compare VECTOR values"),
            ("not", vec![val(1)], "`not` expects BOOL at argument 1, got NUMBER"),
            ("is-nil", vec![], "`is-nil` expects 1 argument(s), got 0"),
        ];

        for (name, args, expected) in test_cases {
            let error = call_builtin(name, &args).unwrap_err();
            assert_eq!(error.to_string(), format!("Error: {expected}"));
        }
    }

    #[test]
    fn test_registry() {
        let core = NativeRegistry::core();
        assert_eq!(core.len(), OPS.len());
        assert!(core.contains("+"));
        assert!(!core.contains("str:len"));

        let standard = NativeRegistry::standard();
        assert!(standard.contains("str:len"));
        assert!(standard.contains("vec:push"));
        assert!(standard.len() > core.len());

        let names = standard.names();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);

        let mut custom = NativeRegistry::empty();
        assert!(custom.is_empty());
        custom.register(NativeFunction::new("answer", Arity::Exact(0), |_| Ok(val(42))));
        assert_eq!(custom.get("answer").unwrap().call(&[]).unwrap(), val(42));
    }
}
