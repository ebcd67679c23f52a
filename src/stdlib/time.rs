//! `time:` natives. Timestamps are unix seconds (fractions are truncated) and
//! every calendar computation is done in UTC.
//!
//! `time:format` and `time:parse` take layouts written with these tokens:
//!
//! | Token  | Meaning               | Example   |
//! |--------|-----------------------|-----------|
//! | `YYYY` | year                  | `2025`    |
//! | `YY`   | two digit year        | `25`      |
//! | `MMMM` | month name            | `January` |
//! | `MMM`  | abbreviated month     | `Jan`     |
//! | `MM`   | month, zero padded    | `01`      |
//! | `DD`   | day, zero padded      | `21`      |
//! | `HH`   | hour (24h)            | `14`      |
//! | `hh`   | hour (12h)            | `02`      |
//! | `mm`   | minute                | `25`      |
//! | `ss`   | second                | `23`      |
//! | `SSS`  | milliseconds          | `000`     |
//! | `A`    | AM/PM                 | `PM`      |
//! | `dddd` | weekday name          | `Tuesday` |
//! | `ddd`  | abbreviated weekday   | `Tue`     |
//!
//! Any other character is copied literally.

use std::fmt::Write;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::value::Value;

/// Layout tokens and their strftime equivalents, longest first
const LAYOUT_TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("MMMM", "%B"),
    ("dddd", "%A"),
    ("MMM", "%b"),
    ("SSS", "%3f"),
    ("ddd", "%a"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("hh", "%I"),
    ("mm", "%M"),
    ("ss", "%S"),
    ("A", "%p"),
];

/// Translate a user layout to a strftime pattern
fn translate_layout(layout: &str) -> String {
    let mut pattern = String::with_capacity(layout.len() * 2);
    let mut rest = layout;
    'outer: while let Some(c) = rest.chars().next() {
        for (token, specifier) in LAYOUT_TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                pattern.push_str(specifier);
                rest = after;
                continue 'outer;
            }
        }
        if c == '%' {
            pattern.push_str("%%");
        } else {
            pattern.push(c);
        }
        rest = &rest[c.len_utf8()..];
    }
    pattern
}

fn timestamp(args: &Args<'_>, index: usize) -> Result<i64, Error> {
    let n = args.number(index)?.trunc();
    if !n.is_finite() || n.abs() > 1e15 {
        return Err(Error::eval_error(format!(
            "`{}` timestamp out of range: {n}",
            args.name()
        )));
    }
    #[allow(clippy::cast_possible_truncation)] // bounded above
    let n = n as i64;
    Ok(n)
}

fn datetime(args: &Args<'_>, index: usize) -> Result<DateTime<Utc>, Error> {
    let seconds = timestamp(args, index)?;
    DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
        Error::eval_error(format!(
            "`{}` timestamp out of range: {seconds}",
            args.name()
        ))
    })
}

fn seconds_value(seconds: i64) -> Value {
    #[allow(clippy::cast_precision_loss)] // timestamps are bounded well below 2^53
    let seconds = seconds as f64;
    Value::Number(seconds)
}

fn time_now(_: &[Value]) -> Result<Value, Error> {
    Ok(seconds_value(Utc::now().timestamp()))
}

fn time_unix(values: &[Value]) -> Result<Value, Error> {
    Ok(Value::Number(Args::new("time:unix", values).number(0)?))
}

// Macro for the calendar field extractors
macro_rules! time_field {
    ($name:ident, $op_str:expr, $field:expr) => {
        fn $name(values: &[Value]) -> Result<Value, Error> {
            let dt = datetime(&Args::new($op_str, values), 0)?;
            Ok(Value::from($field(&dt)))
        }
    };
}

time_field!(time_year, "time:year", |dt: &DateTime<Utc>| dt.year());
time_field!(time_month, "time:month", |dt: &DateTime<Utc>| dt.month());
time_field!(time_day, "time:day", |dt: &DateTime<Utc>| dt.day());
time_field!(time_hour, "time:hour", |dt: &DateTime<Utc>| dt.hour());
time_field!(time_minute, "time:minute", |dt: &DateTime<Utc>| dt.minute());
time_field!(time_second, "time:second", |dt: &DateTime<Utc>| dt.second());

fn time_format(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("time:format", values);
    let dt = datetime(&args, 0)?;
    let pattern = translate_layout(args.string(1)?);

    let mut formatted = String::new();
    write!(formatted, "{}", dt.format(&pattern))
        .map_err(|_| Error::eval_error("`time:format` invalid layout"))?;
    Ok(Value::from(formatted))
}

/// Parses a date or date-time; a layout without time fields means midnight
fn time_parse(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("time:parse", values);
    let (text, layout) = (args.string(0)?, args.string(1)?);
    let pattern = translate_layout(layout);

    let parsed = NaiveDateTime::parse_from_str(text, &pattern).or_else(|error| {
        NaiveDate::parse_from_str(text, &pattern)
            .map(|date| date.and_time(NaiveTime::MIN))
            .map_err(|_| error)
    });
    match parsed {
        Ok(dt) => Ok(seconds_value(dt.and_utc().timestamp())),
        Err(e) => Err(Error::eval_error(format!(
            "`time:parse` failed to parse: {e}"
        ))),
    }
}

fn shift(name: &'static str, values: &[Value], sign: i64) -> Result<Value, Error> {
    let args = Args::new(name, values);
    let base = timestamp(&args, 0)?;
    let delta = timestamp(&args, 1)?;
    Ok(seconds_value(base + sign * delta))
}

fn time_add(values: &[Value]) -> Result<Value, Error> {
    shift("time:add", values, 1)
}

fn time_sub(values: &[Value]) -> Result<Value, Error> {
    shift("time:sub", values, -1)
}

/// Seconds from the second timestamp to the first
fn time_diff(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("time:diff", values);
    Ok(seconds_value(timestamp(&args, 0)? - timestamp(&args, 1)?))
}

fn time_is_leap(values: &[Value]) -> Result<Value, Error> {
    let year = Args::new("time:is-leap", values).integer(0)?;
    Ok(Value::Bool(
        (year % 4 == 0 && year % 100 != 0) || year % 400 == 0,
    ))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "time:now",
        arity: Arity::Exact(0),
        func: time_now,
    },
    BuiltinOp {
        name: "time:unix",
        arity: Arity::Exact(1),
        func: time_unix,
    },
    BuiltinOp {
        name: "time:year",
        arity: Arity::Exact(1),
        func: time_year,
    },
    BuiltinOp {
        name: "time:month",
        arity: Arity::Exact(1),
        func: time_month,
    },
    BuiltinOp {
        name: "time:day",
        arity: Arity::Exact(1),
        func: time_day,
    },
    BuiltinOp {
        name: "time:hour",
        arity: Arity::Exact(1),
        func: time_hour,
    },
    BuiltinOp {
        name: "time:minute",
        arity: Arity::Exact(1),
        func: time_minute,
    },
    BuiltinOp {
        name: "time:second",
        arity: Arity::Exact(1),
        func: time_second,
    },
    BuiltinOp {
        name: "time:format",
        arity: Arity::Exact(2),
        func: time_format,
    },
    BuiltinOp {
        name: "time:parse",
        arity: Arity::Exact(2),
        func: time_parse,
    },
    BuiltinOp {
        name: "time:add",
        arity: Arity::Exact(2),
        func: time_add,
    },
    BuiltinOp {
        name: "time:sub",
        arity: Arity::Exact(2),
        func: time_sub,
    },
    BuiltinOp {
        name: "time:diff",
        arity: Arity::Exact(2),
        func: time_diff,
    },
    BuiltinOp {
        name: "time:is-leap",
        arity: Arity::Exact(1),
        func: time_is_leap,
    },
];
