//! `math:` natives.

use rand::Rng;

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::value::Value;

// Macro for the single-argument functions that map a NUMBER to a NUMBER
macro_rules! unary_math {
    ($name:ident, $op_str:expr, $f:expr) => {
        fn $name(values: &[Value]) -> Result<Value, Error> {
            let n = Args::new($op_str, values).number(0)?;
            Ok(Value::Number($f(n)))
        }
    };
}

unary_math!(math_abs, "math:abs", f64::abs);
unary_math!(math_floor, "math:floor", f64::floor);
unary_math!(math_ceil, "math:ceil", f64::ceil);
unary_math!(math_round, "math:round", f64::round);
unary_math!(math_sin, "math:sin", f64::sin);
unary_math!(math_cos, "math:cos", f64::cos);
unary_math!(math_tan, "math:tan", f64::tan);
unary_math!(math_exp, "math:exp", f64::exp);

fn math_pi(_: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(std::f64::consts::PI))
}

fn math_e(_: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(std::f64::consts::E))
}

fn math_sqrt(values: &[Value]) -> Result<Value, Error> {
    let n = Args::new("math:sqrt", values).number(0)?;
    if n < 0.0 {
        return Err(Error::eval_error(
            "`math:sqrt` cannot compute a negative number",
        ));
    }
    Ok(Value::Number(n.sqrt()))
}

fn math_log(values: &[Value]) -> Result<Value, Error> {
    let n = Args::new("math:log", values).number(0)?;
    if n <= 0.0 {
        return Err(Error::eval_error("`math:log` requires a positive number"));
    }
    Ok(Value::Number(n.ln()))
}

fn math_min(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("math:min", values);
    Ok(Value::Number(args.number(0)?.min(args.number(1)?)))
}

fn math_max(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("math:max", values);
    Ok(Value::Number(args.number(0)?.max(args.number(1)?)))
}

fn math_pow(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("math:pow", values);
    Ok(Value::Number(args.number(0)?.powf(args.number(1)?)))
}

/// `(math:between value min max)`, inclusive on both ends
fn math_between(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("math:between", values);
    let (value, min, max) = (args.number(0)?, args.number(1)?, args.number(2)?);
    Ok(Value::Bool(value >= min && value <= max))
}

/// Random integer in `[floor(min), floor(max)]`
fn math_rand(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("math:rand", values);
    let (min, max) = (args.number(0)?.floor(), args.number(1)?.floor());
    if !min.is_finite() || !max.is_finite() {
        return Err(Error::eval_error("`math:rand` bounds must be finite"));
    }
    if min > max {
        return Err(Error::eval_error(format!(
            "`math:rand` min ({min}) cannot be greater than max ({max})"
        )));
    }

    #[allow(clippy::cast_possible_truncation)] // floored and finite
    let (min, max) = (min as i64, max as i64);
    let n = rand::thread_rng().gen_range(min..=max);
    #[allow(clippy::cast_precision_loss)]
    let n = n as f64;
    Ok(Value::Number(n))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "math:pi",
        arity: Arity::Exact(0),
        func: math_pi,
    },
    BuiltinOp {
        name: "math:e",
        arity: Arity::Exact(0),
        func: math_e,
    },
    BuiltinOp {
        name: "math:abs",
        arity: Arity::Exact(1),
        func: math_abs,
    },
    BuiltinOp {
        name: "math:floor",
        arity: Arity::Exact(1),
        func: math_floor,
    },
    BuiltinOp {
        name: "math:ceil",
        arity: Arity::Exact(1),
        func: math_ceil,
    },
    BuiltinOp {
        name: "math:round",
        arity: Arity::Exact(1),
        func: math_round,
    },
    BuiltinOp {
        name: "math:sin",
        arity: Arity::Exact(1),
        func: math_sin,
    },
    BuiltinOp {
        name: "math:cos",
        arity: Arity::Exact(1),
        func: math_cos,
    },
    BuiltinOp {
        name: "math:tan",
        arity: Arity::Exact(1),
        func: math_tan,
    },
    BuiltinOp {
        name: "math:sqrt",
        arity: Arity::Exact(1),
        func: math_sqrt,
    },
    BuiltinOp {
        name: "math:log",
        arity: Arity::Exact(1),
        func: math_log,
    },
    BuiltinOp {
        name: "math:exp",
        arity: Arity::Exact(1),
        func: math_exp,
    },
    BuiltinOp {
        name: "math:min",
        arity: Arity::Exact(2),
        func: math_min,
    },
    BuiltinOp {
        name: "math:max",
        arity: Arity::Exact(2),
        func: math_max,
    },
    BuiltinOp {
        name: "math:pow",
        arity: Arity::Exact(2),
        func: math_pow,
    },
    BuiltinOp {
        name: "math:between",
        arity: Arity::Exact(3),
        func: math_between,
    },
    BuiltinOp {
        name: "math:rand",
        arity: Arity::Exact(2),
        func: math_rand,
    },
];

#[cfg(test)]
#[expect(clippy::unwrap_used)] // test code OK
mod tests {
    use super::*;
    use crate::builtinops::NativeRegistry;
    use crate::value::val;

    fn call(name: &str, args: &[Value]) -> Result<Value, Error> {
        let mut registry = NativeRegistry::empty();
        registry.register_ops(OPS);
        registry.get(name).unwrap().call(args)
    }

    #[test]
    fn test_math_data_driven() {
        let test_cases: Vec<(&str, Vec<Value>, Option<Value>)> = vec![
            ("math:abs", vec![val(-5)], Some(val(5))),
            ("math:floor", vec![val(3.7)], Some(val(3))),
            ("math:floor", vec![val(-3.2)], Some(val(-4))),
            ("math:ceil", vec![val(3.2)], Some(val(4))),
            ("math:round", vec![val(2.5)], Some(val(3))),
            ("math:round", vec![val(-2.5)], Some(val(-3))),
            ("math:sin", vec![val(0)], Some(val(0))),
            ("math:cos", vec![val(0)], Some(val(1))),
            ("math:sqrt", vec![val(16)], Some(val(4))),
            ("math:sqrt", vec![val(-1)], None),
            ("math:log", vec![val(1)], Some(val(0))),
            ("math:log", vec![val(0)], None),
            ("math:exp", vec![val(0)], Some(val(1))),
            ("math:min", vec![val(3), val(5)], Some(val(3))),
            ("math:max", vec![val(3), val(5)], Some(val(5))),
            ("math:pow", vec![val(2), val(10)], Some(val(1024))),
            ("math:between", vec![val(5), val(1), val(10)], Some(val(true))),
            ("math:between", vec![val(10), val(1), val(10)], Some(val(true))),
            ("math:between", vec![val(11), val(1), val(10)], Some(val(false))),
            ("math:abs", vec![val("5")], None),
            ("math:pow", vec![val(2)], None),
            ("math:rand", vec![val(5), val(1)], None),
        ];

        for (i, (name, args, expected)) in test_cases.into_iter().enumerate() {
            let result = call(name, &args);
            match expected {
                Some(expected) => assert_eq!(result.unwrap(), expected, "Test case #{}", i + 1),
                None => assert!(result.is_err(), "Test case #{}: {name}", i + 1),
            }
        }
    }

    #[test]
    fn test_constants() {
        assert_eq!(call("math:pi", &[]).unwrap().to_string(), "3.1415926536");
        assert_eq!(call("math:e", &[]).unwrap().to_string(), "2.7182818285");
    }

    #[test]
    fn test_rand_stays_in_range() {
        for _ in 0..100 {
            let Value::Number(n) = call("math:rand", &[val(1), val(3)]).unwrap() else {
                panic!("expected number");
            };
            assert!((1.0..=3.0).contains(&n) && n.fract() == 0.0, "{n}");
        }
        assert_eq!(call("math:rand", &[val(7), val(7)]).unwrap(), val(7));
    }
}
