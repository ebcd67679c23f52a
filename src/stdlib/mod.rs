//! Standard library natives, grouped by namespace prefix.
//!
//! Each submodule exposes an `OPS` table of [`BuiltinOp`] entries which the
//! [`NativeRegistry`](crate::builtinops::NativeRegistry) registers at
//! interpreter construction. Names use a `namespace:function` convention:
//!
//! | Module   | Prefix   | Notes                                               |
//! |----------|----------|-----------------------------------------------------|
//! | `math`   | `math:`  | constants, rounding, trigonometry, `math:rand`      |
//! | `string` | `str:`   | character based, never mutates                      |
//! | `vector` | `vec:`   | mutates in place and returns the same vector        |
//! | `map`    | `map:`   | mutates in place and returns the same map           |
//! | `time`   | `time:`  | UTC, unix seconds as NUMBER                         |
//! | `fs`     | `fs:`    | file system access                                  |
//! | `json`   | `json:`  | feature `json`                                      |
//! | `regex`  | `regex:` | feature `regex`                                     |

use crate::builtinops::BuiltinOp;

pub mod fs;
#[cfg(feature = "json")]
pub mod json;
pub mod map;
pub mod math;
#[cfg(feature = "regex")]
pub mod regex;
pub mod string;
pub mod time;
pub mod vector;

/// The operation tables of every enabled module
pub fn modules() -> Vec<&'static [BuiltinOp]> {
    let mut modules: Vec<&'static [BuiltinOp]> = vec![
        math::OPS,
        string::OPS,
        vector::OPS,
        map::OPS,
        time::OPS,
        fs::OPS,
    ];
    #[cfg(feature = "json")]
    modules.push(json::OPS);
    #[cfg(feature = "regex")]
    modules.push(regex::OPS);
    modules
}

/// Convert a length or index to a NUMBER value
pub(crate) fn number_from_usize(n: usize) -> crate::value::Value {
    #[allow(clippy::cast_precision_loss)] // lengths stay far below 2^53
    let n = n as f64;
    crate::value::Value::Number(n)
}
