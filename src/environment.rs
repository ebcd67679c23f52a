//! Lexical scopes.
//!
//! An [`Environment`] is one scope (a function activation or a `begin` block)
//! with a link to its enclosing scope. Closures hold an `Rc` to the scope they
//! were created in, so a scope lives as long as any closure that can still see
//! it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;
use crate::{Error, ErrorKind};

#[derive(Default)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment::default()
    }

    pub fn with_parent(parent: Rc<Environment>) -> Self {
        Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        }
    }

    /// Create a binding in this scope. Fails if the name is already bound
    /// here; bindings in enclosing scopes are shadowed, not replaced.
    pub fn define(&self, name: &str, value: Value) -> Result<Value, Error> {
        let mut bindings = self.bindings.borrow_mut();
        if bindings.contains_key(name) {
            return Err(ErrorKind::AlreadyDefined(name.to_owned()).into());
        }
        bindings.insert(name.to_owned(), value.clone());
        Ok(value)
    }

    /// Replace the value of the nearest existing binding of `name`.
    /// Returns `false` (and changes nothing) if no scope in the chain binds it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = self;
        loop {
            if let Some(slot) = scope.bindings.borrow_mut().get_mut(name) {
                *slot = value;
                return true;
            }
            match &scope.parent {
                Some(parent) => scope = parent,
                None => return false,
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut scope = self;
        loop {
            if let Some(value) = scope.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            scope = scope.parent.as_deref()?;
        }
    }

    /// The bindings of this scope only, sorted by name
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut bindings: Vec<_> = self
            .bindings
            .borrow()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        bindings.sort_by(|a, b| a.0.cmp(&b.0));
        bindings
    }

    /// Drop every binding of this scope. Closures stored in a scope keep that
    /// scope alive through their captured environment, so clearing is how the
    /// interpreter releases such cycles when it is dropped.
    pub fn clear(&self) {
        // dropped outside the borrow, a dropped value may reach this scope again
        let bindings = std::mem::take(&mut *self.bindings.borrow_mut());
        drop(bindings);
    }
}
