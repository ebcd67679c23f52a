//! `regex:` natives. Patterns use the `regex` crate syntax; replacements may
//! refer to capture groups as `$1` or `${name}`.

use ::regex::Regex;

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::value::Value;

fn compile(args: &Args<'_>, index: usize) -> Result<Regex, Error> {
    let pattern = args.string(index)?;
    Regex::new(pattern).map_err(|e| {
        Error::eval_error(format!("`{}` invalid regex pattern: {e}", args.name()))
    })
}

fn regex_matches(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("regex:matches", values);
    let text = args.string(0)?;
    Ok(Value::Bool(compile(&args, 1)?.is_match(text)))
}

/// First match, or "" when there is none
fn regex_find(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("regex:find", values);
    let text = args.string(0)?;
    let found = compile(&args, 1)?.find(text).map_or("", |m| m.as_str());
    Ok(Value::from(found))
}

fn regex_replace(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("regex:replace", values);
    let (text, replacement) = (args.string(0)?, args.string(2)?);
    let replaced = compile(&args, 1)?.replace_all(text, replacement).into_owned();
    Ok(Value::from(replaced))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "regex:matches",
        arity: Arity::Exact(2),
        func: regex_matches,
    },
    BuiltinOp {
        name: "regex:find",
        arity: Arity::Exact(2),
        func: regex_find,
    },
    BuiltinOp {
        name: "regex:replace",
        arity: Arity::Exact(3),
        func: regex_replace,
    },
];
