//! Runs every `tests/programs/**/*.tatu` file and compares the value of its
//! last top-level expression with the trailing `; Expect: <value>` comment.
//!
//! String results are compared in escaped form (`\n`, `\t`, `\"` ...).
//! Files under a `lib/` directory are include targets, not programs.

use std::fs;
use std::path::{Path, PathBuf};

use tatu::builder::ProgramBuilder;
use tatu::evaluator::Interpreter;
use tatu::value::Value;

const EXPECT_PREFIX: &str = "; Expect: ";

fn collect_programs(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            if path.file_name().is_some_and(|name| name != "lib") {
                collect_programs(&path, files)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "tatu") {
            files.push(path);
        }
    }
    Ok(())
}

fn escape(result: &str) -> String {
    result
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\t', "\\t")
        .replace('\r', "\\r")
        .replace('"', "\\\"")
}

/// The text between the last `; Expect: ` and the end of its line
fn expected_value(source: &str) -> Result<&str, String> {
    let start = source
        .rfind(EXPECT_PREFIX)
        .ok_or("missing `; Expect:` comment")?
        + EXPECT_PREFIX.len();
    let rest = &source[start..];
    Ok(rest.find('\n').map_or(rest, |end| &rest[..end]).trim_end_matches('\r'))
}

fn run_program(path: &Path) -> Result<(), String> {
    let source = fs::read_to_string(path).map_err(|e| format!("reading test file: {e}"))?;
    let expected = expected_value(&source)?;

    let program = ProgramBuilder::new()
        .build_from_file(path)
        .map_err(|e| format!("building source: {e}"))?;
    let value = Interpreter::new()
        .eval_program(&program.nodes)
        .map_err(|e| format!("evaluating program: {e}"))?;

    let actual = match &value {
        Value::String(s) => escape(s),
        other => other.to_string(),
    };
    if actual == expected {
        Ok(())
    } else {
        Err(format!("expected: `{expected}`, found: `{actual}`"))
    }
}

#[test]
fn test_programs() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("programs");
    let mut files = Vec::new();
    if let Err(e) = collect_programs(&root, &mut files) {
        panic!("exploring .tatu test files: {e}");
    }
    files.sort();
    assert!(!files.is_empty(), "no .tatu programs found in {}", root.display());

    let failures: Vec<String> = files
        .iter()
        .filter_map(|file| {
            let name = file.strip_prefix(&root).unwrap_or(file).display().to_string();
            run_program(file).err().map(|error| format!("{name}: {error}"))
        })
        .collect();

    assert!(
        failures.is_empty(),
        "{} of {} programs failed:\n{}",
        failures.len(),
        files.len(),
        failures.join("\n")
    );
}

#[test]
fn test_expected_value_extraction() {
    assert_eq!(expected_value("(+ 1 2)\n; Expect: 3\n"), Ok("3"));
    assert_eq!(expected_value("; Expect: 1\n; Expect: two words"), Ok("two words"));
    assert!(expected_value("(+ 1 2)").is_err());
    assert_eq!(escape("a\"b\nc"), "a\\\"b\\nc");
}

#[test]
fn test_run_facade_matches_builder() {
    let source = "(def twice (f x) (f (f x))) (twice (lambda (n) (* n 3)) 2)";
    let direct = tatu::run(source).map(|v| v.to_string());
    assert_eq!(direct, Ok("18".to_string()));
}
