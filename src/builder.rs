//! Program assembly: scanning, parsing and `include` resolution.
//!
//! Every top-level `(include "path")` is replaced in place by the top-level
//! expressions of the referenced file. Paths are resolved relative to the
//! directory of the including file. A builder remembers every file it has
//! built, so including the same file twice (or circularly) is a silent no-op.
//!
//! ```text
//! ; main.tatu                 ; lib/math.tatu
//! (include "lib/math.tatu")   (def square (x) (* x x))
//! (square 4)
//!
//! => (var square (lambda (x) (* x x)))
//!    (square 4)
//! ```
//!
//! Includes below the top level are left untouched and fail at evaluation time.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::ast::{Node, NodeKind, SpecialForm, Token};
use crate::{Error, parser, scanner};

/// A fully assembled program
#[derive(Debug, Clone)]
pub struct Program {
    /// Tokens of every built file, in build order
    pub tokens: Vec<Token>,
    /// Top-level expressions with includes spliced in
    pub nodes: Vec<Node>,
    /// Absolute paths of the files that make up the program
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ProgramBuilder {
    parsed_files: HashSet<PathBuf>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        ProgramBuilder::default()
    }

    /// Has this builder already built `path`?
    pub fn was_built(&self, path: &Path) -> bool {
        self.parsed_files.contains(&full_path(path))
    }

    pub fn build_from_file(&mut self, path: impl AsRef<Path>) -> Result<Program, Error> {
        let path = full_path(path.as_ref());
        let source = read_source(&path)?;
        self.build_from_source(&source, path)
    }

    /// Build `source` as if it were the contents of `name`; includes are
    /// resolved relative to the directory of `name`
    pub fn build_from_source(
        &mut self,
        source: &str,
        name: impl AsRef<Path>,
    ) -> Result<Program, Error> {
        let path = full_path(name.as_ref());
        self.parsed_files.insert(path.clone());
        debug!(file = %path.display(), "building");

        let mut tokens = scanner::scan(source, &*path.to_string_lossy())?;
        let top_level = parser::parse(&tokens)?;
        let mut files = vec![path.clone()];

        let mut nodes = Vec::with_capacity(top_level.len());
        for node in top_level {
            let Some(include) = include_path(&node) else {
                nodes.push(node);
                continue;
            };

            let included = resolve_ref_path(&path, include);
            if self.parsed_files.contains(&included) {
                debug!(file = %included.display(), "skipping already included file");
                continue;
            }

            debug!(file = %included.display(), from = %path.display(), "including");
            let source = read_source(&included).map_err(|error| error.at(&node.location))?;
            let program = self.build_from_source(&source, &included)?;
            tokens.extend(program.tokens);
            nodes.extend(program.nodes);
            files.extend(program.files);
        }

        Ok(Program {
            tokens,
            nodes,
            files,
        })
    }
}

fn read_source(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path)
        .map_err(|e| Error::io_error(format!("missing file `{}`: {e}", path.display())))
}

/// The path of a top-level `(include "path")` form
fn include_path(node: &Node) -> Option<&str> {
    match node.as_list()? {
        [head, path] if head.as_symbol() == Some(SpecialForm::Include.name()) => {
            match &path.kind {
                NodeKind::String(path) => Some(path),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Absolute, lexically normalized version of `path`
fn full_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    clean(&absolute)
}

/// Resolve `destination` against the directory containing `reference`
fn resolve_ref_path(reference: &Path, destination: &str) -> PathBuf {
    let destination = Path::new(destination);
    if destination.is_absolute() {
        return clean(destination);
    }
    let directory = reference.parent().unwrap_or(Path::new(""));
    full_path(&directory.join(destination))
}

/// Remove `.` components and fold `..` into their parent, without touching
/// the file system
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() && !cleaned.has_root() {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}
