//! `fs:` natives over the host file system. Failures are reported as `Io`
//! errors carrying the operating system message.

use std::fs;
use std::io::Write;
use std::path::Path;

use crate::Error;
use crate::builtinops::{Args, Arity, BuiltinOp};
use crate::value::Value;

fn io_failure(name: &str, action: &str, error: &std::io::Error) -> Error {
    Error::io_error(format!("`{name}` failed to {action}: {error}"))
}

fn fs_read(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:read", values).string(0)?;
    let content =
        fs::read_to_string(path).map_err(|e| io_failure("fs:read", "read file", &e))?;
    Ok(Value::from(content))
}

/// Splits on `\n`; a trailing newline yields a final empty line
fn fs_read_lines(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:read-lines", values).string(0)?;
    let content =
        fs::read_to_string(path).map_err(|e| io_failure("fs:read-lines", "read file", &e))?;
    Ok(Value::vector(content.split('\n').map(Value::from).collect()))
}

fn fs_write(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("fs:write", values);
    let (path, content) = (args.string(0)?, args.string(1)?);
    fs::write(path, content).map_err(|e| io_failure("fs:write", "write file", &e))?;
    Ok(Value::Nil)
}

fn fs_append(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("fs:append", values);
    let (path, content) = (args.string(0)?, args.string(1)?);
    let mut file = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| io_failure("fs:append", "open file", &e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| io_failure("fs:append", "append to file", &e))?;
    Ok(Value::Nil)
}

fn fs_exists(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:exists", values).string(0)?;
    let exists = Path::new(path)
        .try_exists()
        .map_err(|e| io_failure("fs:exists", "check file", &e))?;
    Ok(Value::Bool(exists))
}

/// Entry names of a directory, sorted
fn fs_list(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:list", values).string(0)?;
    let failure = |e: std::io::Error| io_failure("fs:list", "list directory", &e);

    let mut names = Vec::new();
    for entry in fs::read_dir(path).map_err(failure)? {
        let entry = entry.map_err(failure)?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    names.sort();
    Ok(Value::vector(names.into_iter().map(Value::from).collect()))
}

/// Creates the directory and any missing parents
fn fs_mkdir(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:mkdir", values).string(0)?;
    fs::create_dir_all(path).map_err(|e| io_failure("fs:mkdir", "create directory", &e))?;
    Ok(Value::Nil)
}

fn fs_move(values: &[Value]) -> Result<Value, Error> {
    let args = Args::new("fs:move", values);
    let (from, to) = (args.string(0)?, args.string(1)?);
    fs::rename(from, to).map_err(|e| io_failure("fs:move", "move file", &e))?;
    Ok(Value::Nil)
}

/// Removes a file or a whole directory tree; a missing path is not an error
fn fs_delete(values: &[Value]) -> Result<Value, Error> {
    let path = Path::new(Args::new("fs:delete", values).string(0)?);
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    };
    result.map_err(|e| io_failure("fs:delete", "delete", &e))?;
    Ok(Value::Nil)
}

fn fs_is_dir(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:is-dir", values).string(0)?;
    let metadata = fs::metadata(path).map_err(|e| io_failure("fs:is-dir", "check path", &e))?;
    Ok(Value::Bool(metadata.is_dir()))
}

fn fs_size(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:size", values).string(0)?;
    let metadata =
        fs::metadata(path).map_err(|e| io_failure("fs:size", "get file info", &e))?;
    #[allow(clippy::cast_precision_loss)]
    let size = metadata.len() as f64;
    Ok(Value::Number(size))
}

/// Last path element, ignoring trailing separators. `""` gives `"."` and a
/// path made only of separators gives `"/"`.
fn fs_basename(values: &[Value]) -> Result<Value, Error> {
    let path = Args::new("fs:basename", values).string(0)?;
    if path.is_empty() {
        return Ok(Value::from("."));
    }
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(Value::from("/"));
    }
    let base = trimmed.rsplit('/').next().unwrap_or(trimmed);
    Ok(Value::from(base))
}

fn fs_temp_dir(_: &[Value]) -> Result<Value, Error> {
    Ok(Value::from(std::env::temp_dir().to_string_lossy().into_owned()))
}

pub(crate) const OPS: &[BuiltinOp] = &[
    BuiltinOp {
        name: "fs:read",
        arity: Arity::Exact(1),
        func: fs_read,
    },
    BuiltinOp {
        name: "fs:read-lines",
        arity: Arity::Exact(1),
        func: fs_read_lines,
    },
    BuiltinOp {
        name: "fs:write",
        arity: Arity::Exact(2),
        func: fs_write,
    },
    BuiltinOp {
        name: "fs:append",
        arity: Arity::Exact(2),
        func: fs_append,
    },
    BuiltinOp {
        name: "fs:exists",
        arity: Arity::Exact(1),
        func: fs_exists,
    },
    BuiltinOp {
        name: "fs:list",
        arity: Arity::Exact(1),
        func: fs_list,
    },
    BuiltinOp {
        name: "fs:mkdir",
        arity: Arity::Exact(1),
        func: fs_mkdir,
    },
    BuiltinOp {
        name: "fs:move",
        arity: Arity::Exact(2),
        func: fs_move,
    },
    BuiltinOp {
        name: "fs:delete",
        arity: Arity::Exact(1),
        func: fs_delete,
    },
    BuiltinOp {
        name: "fs:is-dir",
        arity: Arity::Exact(1),
        func: fs_is_dir,
    },
    BuiltinOp {
        name: "fs:size",
        arity: Arity::Exact(1),
        func: fs_size,
    },
    BuiltinOp {
        name: "fs:basename",
        arity: Arity::Exact(1),
        func: fs_basename,
    },
    BuiltinOp {
        name: "fs:temp-dir",
        arity: Arity::Exact(0),
        func: fs_temp_dir,
    },
];
