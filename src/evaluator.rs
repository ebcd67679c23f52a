//! Tree-walking evaluation with explicit self tail calls.
//!
//! Every expression is evaluated in one of two modes:
//!
//! - **strict** ([`Interpreter::eval_strict`]): the caller needs a concrete
//!   value. A `recur` reaching this point is an error.
//! - **tail** ([`Interpreter::eval_tail`]): the result becomes the enclosing
//!   function's return value, so a `recur` may pass through as [`Tail::Recur`]
//!   and is resolved by the closure call trampoline.
//!
//! Tail position is threaded through `begin` (last expression), both branches
//! of `if`, and a function body. Everything else (operands, arguments,
//! conditions, `while` bodies, `var`/`set` values) is strict.
//!
//! ```text
//! (def sum (n acc)
//!   (if (= n 0)
//!       acc
//!       (recur (- n 1) (+ acc n))))   ; constant stack: the trampoline loops
//!
//! (def count (n)
//!   (if (= n 0) 0 (+ 1 (count (- n 1)))))  ; plain recursion: bounded by the depth limit
//! ```
//!
//! Only `recur` is optimized. Plain self calls, calls to other functions and
//! mutual recursion grow the evaluation depth and fail with a
//! [`ErrorKind::LimitExceeded`] error once [`Limits::max_eval_depth`] is
//! reached.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::ast::{Node, NodeKind, SpecialForm};
use crate::builtinops::{Arity, NativeRegistry};
use crate::environment::Environment;
use crate::location::Location;
use crate::value::{Closure, NativeFunction, Value};
use crate::{Error, ErrorKind, MAX_EVAL_DEPTH};

/// Minimum stack space to keep available before recursing (100KB red zone).
const RED_ZONE: usize = 100 * 1024;

/// Stack space to allocate when growing (1MB).
const STACK_PER_RECURSION: usize = 1024 * 1024;

/// Grow the stack before running `f` if less than [`RED_ZONE`] remains
#[inline]
fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

/// Result of evaluating in tail position
#[derive(Debug)]
pub enum Tail {
    Value(Value),
    /// A pending `recur`: rebind the enclosing function's parameters to
    /// `args` and run its body again
    Recur { args: Vec<Value>, location: Location },
}

/// Resource limits for one interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum nesting of evaluations (sub-expressions plus non-`recur` calls)
    pub max_eval_depth: usize,
    /// Maximum number of evaluation steps per top-level expression;
    /// `None` means unlimited
    pub max_steps: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_eval_depth: MAX_EVAL_DEPTH,
            max_steps: None,
        }
    }
}

/// Configures an [`Interpreter`]. Natives can only be registered here: the
/// registry is frozen once the interpreter is built.
///
/// ```
/// use tatu::builtinops::Arity;
/// use tatu::evaluator::Interpreter;
/// use tatu::value::Value;
///
/// let mut interpreter = Interpreter::builder()
///     .native("answer", Arity::Exact(0), |_| Ok(Value::Number(42.0)))
///     .build();
/// let nodes = tatu::parser::parse_source("(+ (answer) 1)", "doc.tatu").unwrap();
/// assert_eq!(interpreter.eval_program(&nodes).unwrap(), Value::Number(43.0));
/// ```
pub struct InterpreterBuilder {
    stdlib: bool,
    natives: Vec<NativeFunction>,
    limits: Limits,
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        InterpreterBuilder {
            stdlib: true,
            natives: Vec::new(),
            limits: Limits::default(),
        }
    }
}

impl InterpreterBuilder {
    pub fn new() -> Self {
        InterpreterBuilder::default()
    }

    /// Register a host function. A later registration with the same name
    /// replaces built-in natives of that name.
    #[must_use]
    pub fn native(
        mut self,
        name: &str,
        arity: Arity,
        func: impl Fn(&[Value]) -> Result<Value, Error> + 'static,
    ) -> Self {
        self.natives.push(NativeFunction::new(name, arity, func));
        self
    }

    /// Only the core operators, `print` and the type natives; no `math:`,
    /// `str:`, `vec:` ... modules
    #[must_use]
    pub fn without_stdlib(mut self) -> Self {
        self.stdlib = false;
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub fn max_eval_depth(mut self, depth: usize) -> Self {
        self.limits.max_eval_depth = depth;
        self
    }

    #[must_use]
    pub fn max_steps(mut self, steps: u64) -> Self {
        self.limits.max_steps = Some(steps);
        self
    }

    pub fn build(self) -> Interpreter {
        let mut registry = if self.stdlib {
            NativeRegistry::standard()
        } else {
            NativeRegistry::core()
        };
        for native in self.natives {
            registry.register(native);
        }
        debug!(
            natives = registry.len(),
            max_eval_depth = self.limits.max_eval_depth,
            max_steps = ?self.limits.max_steps,
            "interpreter created"
        );

        Interpreter {
            globals: Rc::new(Environment::new()),
            natives: registry,
            limits: self.limits,
            steps: 0,
        }
    }
}

/// Evaluation state: the global scope, the frozen native registry and the limits
pub struct Interpreter {
    globals: Rc<Environment>,
    natives: NativeRegistry,
    limits: Limits,
    steps: u64,
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

impl Drop for Interpreter {
    fn drop(&mut self) {
        // closures stored in globals capture the globals: break those cycles
        self.globals.clear();
    }
}

impl Interpreter {
    /// An interpreter with the full standard library and default limits
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    pub fn natives(&self) -> &NativeRegistry {
        &self.natives
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Evaluate top-level expressions in order in the global scope and return
    /// the value of the last one (nil for an empty program). The first error
    /// aborts the program.
    pub fn eval_program(&mut self, nodes: &[Node]) -> Result<Value, Error> {
        let mut last = Value::Nil;
        for node in nodes {
            last = self.eval(node)?;
        }
        Ok(last)
    }

    /// Evaluate one top-level expression in the global scope
    pub fn eval(&mut self, node: &Node) -> Result<Value, Error> {
        let globals = Rc::clone(&self.globals);
        self.eval_strict(node, &globals)
    }

    /// Evaluate `node` in `env`, requiring a concrete value
    pub fn eval_strict(&mut self, node: &Node, env: &Rc<Environment>) -> Result<Value, Error> {
        self.steps = 0;
        self.strict(node, env, 0)
    }

    /// Evaluate `node` in `env` in tail position: a `recur` is returned, not resolved
    pub fn eval_tail(&mut self, node: &Node, env: &Rc<Environment>) -> Result<Tail, Error> {
        self.steps = 0;
        self.tail(node, env, 0)
    }

    fn strict(&mut self, node: &Node, env: &Rc<Environment>, depth: usize) -> Result<Value, Error> {
        match self.tail(node, env, depth)? {
            Tail::Value(value) => Ok(value),
            Tail::Recur { location, .. } => Err(Error::new(ErrorKind::RecurOutsideTail).at(&location)),
        }
    }

    fn tail(&mut self, node: &Node, env: &Rc<Environment>, depth: usize) -> Result<Tail, Error> {
        if depth >= self.limits.max_eval_depth {
            return Err(Error::new(ErrorKind::LimitExceeded(format!(
                "evaluation depth limit exceeded (max: {})",
                self.limits.max_eval_depth
            )))
            .at(&node.location));
        }
        self.count_step(node)?;

        ensure_sufficient_stack(|| self.dispatch(node, env, depth))
            .map_err(|error| error.at(&node.location))
    }

    fn count_step(&mut self, node: &Node) -> Result<(), Error> {
        self.steps += 1;
        match self.limits.max_steps {
            Some(max) if self.steps > max => Err(Error::new(ErrorKind::LimitExceeded(format!(
                "evaluation step limit exceeded (max: {max})"
            )))
            .at(&node.location)),
            _ => Ok(()),
        }
    }

    fn dispatch(&mut self, node: &Node, env: &Rc<Environment>, depth: usize) -> Result<Tail, Error> {
        let value = match &node.kind {
            NodeKind::Number(n) => Value::Number(*n),
            NodeKind::String(s) => Value::from(s.as_str()),
            NodeKind::Bool(b) => Value::Bool(*b),
            NodeKind::Nil => Value::Nil,
            NodeKind::Symbol(name) => self.resolve(name, env)?,
            NodeKind::List(items) => return self.eval_list(node, items, env, depth),
        };
        Ok(Tail::Value(value))
    }

    /// Lexical scopes first, then the native registry
    fn resolve(&self, name: &str, env: &Environment) -> Result<Value, Error> {
        if let Some(value) = env.lookup(name) {
            return Ok(value);
        }
        self.natives
            .get(name)
            .map(|native| Value::NativeFunction(native.clone()))
            .ok_or_else(|| ErrorKind::UnboundSymbol(name.to_owned()).into())
    }

    fn eval_list(
        &mut self,
        node: &Node,
        items: &[Node],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Tail, Error> {
        let Some((head, operands)) = items.split_first() else {
            return Ok(Tail::Value(Value::Nil));
        };

        match head.as_symbol().and_then(SpecialForm::from_name) {
            Some(form) => self.eval_special_form(form, node, operands, env, depth),
            None => self.eval_call(node, head, operands, env, depth),
        }
    }

    fn eval_special_form(
        &mut self,
        form: SpecialForm,
        node: &Node,
        operands: &[Node],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Tail, Error> {
        let value = match (form, operands) {
            (SpecialForm::Begin, [init @ .., last]) => {
                let scope = Rc::new(Environment::with_parent(Rc::clone(env)));
                for expr in init {
                    self.strict(expr, &scope, depth + 1)?;
                }
                return self.tail(last, &scope, depth + 1);
            }

            (SpecialForm::Var, [name, expr]) => {
                let name_str = symbol_name(form, name)?;
                let value = self.strict(expr, env, depth + 1)?;
                env.define(name_str, value)
                    .map_err(|error| error.at(&name.location))?
            }

            (SpecialForm::Set, [name, expr]) => {
                let name_str = symbol_name(form, name)?;
                let value = self.strict(expr, env, depth + 1)?;
                if !env.assign(name_str, value.clone()) {
                    return Err(Error::new(ErrorKind::UndefinedVariable(name_str.to_owned()))
                        .at(&name.location));
                }
                value
            }

            (SpecialForm::If, [condition, then_branch, rest @ ..]) if rest.len() <= 1 => {
                return if self.condition(condition, env, depth)? {
                    self.tail(then_branch, env, depth + 1)
                } else {
                    match rest.first() {
                        Some(else_branch) => self.tail(else_branch, env, depth + 1),
                        None => Ok(Tail::Value(Value::Nil)),
                    }
                };
            }

            (SpecialForm::While, [condition, body]) => {
                let mut last = Value::Nil;
                while self.condition(condition, env, depth)? {
                    last = self.strict(body, env, depth + 1)?;
                }
                last
            }

            (SpecialForm::Lambda, [params, body]) => {
                let Some(param_nodes) = params.as_list() else {
                    return Err(malformed(form, node));
                };
                let params = param_nodes
                    .iter()
                    .map(|param| symbol_name(form, param).map(str::to_owned))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::Function(Rc::new(Closure {
                    params,
                    body: body.clone(),
                    env: Rc::clone(env),
                }))
            }

            (SpecialForm::Recur, args) => {
                let args = self.eval_args(args, env, depth)?;
                return Ok(Tail::Recur {
                    args,
                    location: node.location.clone(),
                });
            }

            (SpecialForm::Vector, elements) => Value::vector(self.eval_args(elements, env, depth)?),

            (SpecialForm::Map, entries) if entries.len() % 2 == 0 => {
                let mut map = std::collections::HashMap::with_capacity(entries.len() / 2);
                for pair in entries.chunks_exact(2) {
                    let key = match &pair[0].kind {
                        NodeKind::Symbol(key) | NodeKind::String(key) => key.clone(),
                        _ => return Err(malformed(form, &pair[0])),
                    };
                    let value = self.strict(&pair[1], env, depth + 1)?;
                    map.insert(key, value);
                }
                Value::map(map)
            }

            (SpecialForm::And | SpecialForm::Or, operands) if !operands.is_empty() => {
                self.eval_logic(form, operands, env, depth)?
            }

            (SpecialForm::Include, _) => {
                return Err(Error::eval_error(
                    "include not resolved: `include` is only allowed at the top level of a file",
                ));
            }

            _ => return Err(malformed(form, node)),
        };
        Ok(Tail::Value(value))
    }

    /// Strictly evaluate a condition that must be a BOOL
    fn condition(&mut self, node: &Node, env: &Rc<Environment>, depth: usize) -> Result<bool, Error> {
        match self.strict(node, env, depth + 1)? {
            Value::Bool(b) => Ok(b),
            other => Err(Error::type_error(format!(
                "expected BOOL, found {}",
                other.value_type()
            ))
            .at(&node.location)),
        }
    }

    /// `and` stops at the first false, `or` at the first true
    fn eval_logic(
        &mut self,
        form: SpecialForm,
        operands: &[Node],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Value, Error> {
        let stop_at = form == SpecialForm::Or;
        for operand in operands {
            match self.strict(operand, env, depth + 1)? {
                Value::Bool(b) if b == stop_at => return Ok(Value::Bool(b)),
                Value::Bool(_) => {}
                other => {
                    return Err(Error::type_error(format!(
                        "`{}` expects BOOL, found {}",
                        form.name(),
                        other.value_type()
                    ))
                    .at(&operand.location));
                }
            }
        }
        Ok(Value::Bool(!stop_at))
    }

    /// Strictly evaluate expressions left to right
    fn eval_args(
        &mut self,
        nodes: &[Node],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Vec<Value>, Error> {
        nodes
            .iter()
            .map(|node| self.strict(node, env, depth + 1))
            .collect()
    }

    fn eval_call(
        &mut self,
        node: &Node,
        callee_node: &Node,
        arg_nodes: &[Node],
        env: &Rc<Environment>,
        depth: usize,
    ) -> Result<Tail, Error> {
        let callee = self.strict(callee_node, env, depth + 1)?;
        if !callee.is_callable() {
            return Err(Error::type_error(format!(
                "expression is not a function, got {}",
                callee.value_type()
            ))
            .at(&callee_node.location));
        }
        let args = self.eval_args(arg_nodes, env, depth)?;

        match &callee {
            Value::NativeFunction(native) => {
                trace!(name = %native.name, args = args.len(), "calling native");
                native
                    .call(&args)
                    .map(Tail::Value)
                    .map_err(|error| error.at(&node.location))
            }
            Value::Function(closure) => self
                .call_closure(closure, args, &node.location, depth)
                .map(Tail::Value),
            _ => Err(Error::type_error("expression is not a function").at(&callee_node.location)),
        }
    }

    /// The trampoline: run the body, and as long as it ends in `recur`, rebind
    /// the parameters and run it again in the same Rust frame.
    fn call_closure(
        &mut self,
        closure: &Closure,
        mut args: Vec<Value>,
        location: &Location,
        depth: usize,
    ) -> Result<Value, Error> {
        let arity = Arity::Exact(closure.params.len());
        arity
            .validate("lambda", args.len())
            .map_err(|error| error.at(location))?;
        trace!(params = ?closure.params, "calling closure");

        let mut iterations: u64 = 0;
        loop {
            let activation = Rc::new(Environment::with_parent(Rc::clone(&closure.env)));
            for (param, arg) in closure.params.iter().zip(args) {
                activation.define(param, arg)?;
            }

            match self.tail(&closure.body, &activation, depth + 1)? {
                Tail::Value(value) => {
                    if iterations > 0 {
                        trace!(iterations, "trampoline finished");
                    }
                    return Ok(value);
                }
                Tail::Recur {
                    args: next,
                    location: recur_location,
                } => {
                    arity
                        .validate("recur", next.len())
                        .map_err(|error| error.at(&recur_location))?;
                    iterations += 1;
                    args = next;
                }
            }
        }
    }
}

fn malformed(form: SpecialForm, node: &Node) -> Error {
    Error::eval_error(format!("invalid `{}` expression", form.name())).at(&node.location)
}

fn symbol_name(form: SpecialForm, node: &Node) -> Result<&str, Error> {
    node.as_symbol().ok_or_else(|| malformed(form, node))
}
