use crate::Error;
use crate::ast::{Builtin, BuiltinFn, Closure, Value};
use crate::builtinops::get_builtin_ops;
use crate::stack::ensure_sufficient_stack;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::{debug, trace};

/// Expected number of arguments for a callable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    /// Inclusive bounds
    Range(usize, usize),
    Any,
}

impl Arity {
    /// Check an argument count, naming the callee in the error
    pub fn validate(self, callee: &str, got: usize) -> Result<(), Error> {
        let ok = match self {
            Arity::Exact(n) => got == n,
            Arity::Range(min, max) => (min..=max).contains(&got),
            Arity::Any => true,
        };
        if ok {
            Ok(())
        } else {
            Err(Error::arity_error(callee, self, got))
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{n}"),
            Arity::Range(min, max) => write!(f, "{min} to {max}"),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

struct Frame {
    bindings: RefCell<HashMap<Rc<str>, Value>>,
    parent: Option<Environment>,
}

/// Environment for variable bindings
///
/// A handle to one frame of the lookup chain. Cloning the handle shares the frame, which is how
/// a closure keeps the frame it was created in alive after the call that created it returns.
#[derive(Clone)]
pub struct Environment(Rc<Frame>);

impl Environment {
    /// Create a root frame with no parent and no bindings
    pub fn new() -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        }))
    }

    /// Create an empty frame whose parent is `self`
    pub fn new_child(&self) -> Self {
        Environment(Rc::new(Frame {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(self.clone()),
        }))
    }

    /// Bind `name` in this frame only, overwriting an earlier binding. Returns the bound value.
    pub fn define(&self, name: impl Into<Rc<str>>, value: Value) -> Value {
        self.0
            .bindings
            .borrow_mut()
            .insert(name.into(), value.clone());
        value
    }

    /// Find the innermost binding of `name`, walking outward through the parents
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut frame = Some(self);
        while let Some(env) = frame {
            if let Some(value) = env.0.bindings.borrow().get(name) {
                return Some(value.clone());
            }
            frame = env.0.parent.as_ref();
        }
        None
    }

    /// Like [`Environment::get`], but an unbound name is a `NameError`
    pub fn lookup(&self, name: &str) -> Result<Value, Error> {
        self.get(name)
            .ok_or_else(|| Error::NameError(name.to_owned()))
    }

    pub fn parent(&self) -> Option<&Environment> {
        self.0.parent.as_ref()
    }

    /// Number of frames from this one up to the root (the root alone is 1)
    pub fn depth(&self) -> usize {
        std::iter::successors(Some(self), |env| env.parent()).count()
    }

    /// Check if two handles refer to the same frame
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Register a native function in this frame.
    ///
    /// The function receives the evaluated arguments and the calling [`Context`]; the argument
    /// count is checked against `arity` before it is called.
    ///
    /// # Example
    /// ```
    /// use lispy::ast::{Value, val};
    /// use lispy::evaluator::{Arity, Context, create_global_env, eval};
    /// use lispy::Error;
    ///
    /// fn answer(_args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    ///     Ok(val(42))
    /// }
    ///
    /// let env = create_global_env();
    /// env.register_builtin_function("answer", Arity::Exact(0), answer);
    /// let call = Value::list(vec![Value::symbol("answer")]);
    /// assert_eq!(eval(&call, &env), Ok(val(42)));
    /// ```
    pub fn register_builtin_function(&self, name: &str, arity: Arity, func: BuiltinFn) {
        self.define(name, Value::Builtin(Builtin::new(name, arity, func)));
    }

    /// Get all bindings visible from this frame
    /// Returns a Vec of (name, value) pairs sorted by name; inner bindings shadow outer ones
    pub fn get_all_bindings(&self) -> Vec<(String, Value)> {
        let mut bindings = HashMap::new();

        // Start with parent bindings (so they can be overridden by local bindings)
        if let Some(parent) = &self.0.parent {
            for (name, value) in parent.get_all_bindings() {
                bindings.insert(name, value);
            }
        }

        for (name, value) in self.0.bindings.borrow().iter() {
            bindings.insert(name.to_string(), value.clone());
        }

        let mut result: Vec<_> = bindings.into_iter().collect();
        result.sort_by(|a, b| a.0.cmp(&b.0));
        result
    }
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl fmt::Debug for Environment {
    // Values are left out: a frame usually holds closures that point back at it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self
            .0
            .bindings
            .borrow()
            .keys()
            .map(ToString::to_string)
            .collect();
        names.sort();
        f.debug_struct("Environment")
            .field("bindings", &names)
            .field("depth", &self.depth())
            .finish()
    }
}

/// Evaluation limits imposed by the host
///
/// The default sets no limit: recursion is bounded only by available memory, since the native
/// stack grows on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalConfig {
    /// Maximum nesting of `eval` calls before `Error::DepthExceeded`
    pub max_depth: Option<usize>,
}

/// The calling context handed to every builtin: the caller's environment and the current
/// evaluation depth.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    env: &'a Environment,
    depth: usize,
    max_depth: Option<usize>,
}

impl<'a> Context<'a> {
    pub(crate) fn root(env: &'a Environment, config: &EvalConfig) -> Self {
        Context {
            env,
            depth: 0,
            max_depth: config.max_depth,
        }
    }

    pub fn env(&self) -> &'a Environment {
        self.env
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Evaluate `expr` in the calling environment, one level deeper
    pub fn eval(&self, expr: &Value) -> Result<Value, Error> {
        eval_with_depth_tracking(expr, &self.nested())
    }

    fn nested(&self) -> Context<'a> {
        Context {
            depth: self.depth + 1,
            ..*self
        }
    }

    fn in_frame<'b>(&self, env: &'b Environment) -> Context<'b> {
        Context {
            env,
            depth: self.depth + 1,
            max_depth: self.max_depth,
        }
    }
}

/// Evaluate an expression with no depth limit (public API)
pub fn eval(expr: &Value, env: &Environment) -> Result<Value, Error> {
    eval_with_config(expr, env, &EvalConfig::default())
}

/// Evaluate an expression with explicit limits
pub fn eval_with_config(expr: &Value, env: &Environment, config: &EvalConfig) -> Result<Value, Error> {
    eval_with_depth_tracking(expr, &Context::root(env, config))
}

/// Evaluate the elements of a list as an s-expression: a special form or an application
pub fn eval_sexpr(list: &[Value], env: &Environment) -> Result<Value, Error> {
    eval_list(list, &Context::root(env, &EvalConfig::default()))
}

/// Apply a callable to already-evaluated arguments
pub fn apply(func: &Value, args: &[Value], env: &Environment) -> Result<Value, Error> {
    apply_in(func, args, &Context::root(env, &EvalConfig::default()))
}

/// Evaluate an expression with depth tracking to bound runaway recursion
fn eval_with_depth_tracking(expr: &Value, ctx: &Context<'_>) -> Result<Value, Error> {
    if let Some(max_depth) = ctx.max_depth
        && ctx.depth >= max_depth
    {
        return Err(Error::DepthExceeded(max_depth));
    }
    match expr {
        // Self-evaluating forms (the empty list is not: it is an empty expression)
        Value::Number(_) | Value::Bool(_) | Value::Builtin(_) | Value::Closure(_) => {
            Ok(expr.clone())
        }

        Value::Symbol(name) => ctx.env.lookup(name),

        Value::List(elements) => ensure_sufficient_stack(|| eval_list(elements, ctx)),
    }
}

/// Helper function to evaluate argument expressions left to right
fn eval_args(args: &[Value], ctx: &Context<'_>) -> Result<Vec<Value>, Error> {
    let ctx = ctx.nested();
    args.iter()
        .map(|arg| eval_with_depth_tracking(arg, &ctx))
        .collect()
}

/// Evaluate a list expression: special forms first, then application
fn eval_list(elements: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    let [head, rest @ ..] = elements else {
        return Err(Error::syntax_error("empty expression"));
    };

    // Special form names are matched before lookup, so they cannot be shadowed
    if let Value::Symbol(name) = head {
        let special_form: Option<SpecialForm> = match &**name {
            "quote" => Some(eval_quote),
            "define" => Some(eval_define),
            "lambda" => Some(eval_lambda),
            "if" => Some(eval_if),
            _ => None,
        };
        if let Some(special_form) = special_form {
            trace!(form = %name, depth = ctx.depth, "special form");
            return special_form(rest, ctx);
        }
    }

    let func = eval_with_depth_tracking(head, &ctx.nested())?;
    if !func.is_callable() {
        return Err(Error::UnknownProcedure(func.to_string()));
    }

    let args = eval_args(rest, ctx)?;
    apply_in(&func, &args, ctx)
}

fn apply_in(func: &Value, args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    trace!(callee = %func, args = args.len(), depth = ctx.depth, "apply");
    match func {
        Value::Builtin(builtin) => builtin.call(args, ctx),
        Value::Closure(closure) => {
            let params = closure.params();
            if params.len() != args.len() {
                return Err(Error::arity_error(
                    func.to_string(),
                    Arity::Exact(params.len()),
                    args.len(),
                ));
            }

            // One fresh frame per call, parented to the captured environment
            let frame = closure.env().new_child();
            for (param, arg) in params.iter().zip(args) {
                frame.define(Rc::clone(param), arg.clone());
            }

            eval_with_depth_tracking(closure.body(), &ctx.in_frame(&frame))
        }
        other => Err(Error::UnknownProcedure(other.to_string())),
    }
}

/// Special forms receive their unevaluated operands
type SpecialForm = fn(&[Value], &Context<'_>) -> Result<Value, Error>;

/// Evaluate quote special form
fn eval_quote(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    match args {
        [expr] => Ok(expr.clone()),
        _ => Err(Error::syntax_error(format!(
            "quote expects exactly 1 operand, got {}",
            args.len()
        ))),
    }
}

/// Evaluate define special form
///
/// `(define name expr)` binds the value of `expr`; `(define (name params...) body)` binds a
/// closure. Both write into the current frame and return the bound value.
fn eval_define(args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    match args {
        [Value::Symbol(name), expr] => {
            let value = eval_with_depth_tracking(expr, &ctx.nested())?;
            debug!(name = %name, value = %value, "define");
            Ok(ctx.env.define(Rc::clone(name), value))
        }
        [Value::List(target), body] => match target.split_first() {
            Some((Value::Symbol(name), params)) => {
                let params = parameter_names("define", params)?;
                let closure = Closure::new(params, body.clone(), ctx.env.clone());
                debug!(name = %name, "define function");
                Ok(ctx.env.define(Rc::clone(name), Value::Closure(Rc::new(closure))))
            }
            Some((other, _)) => Err(Error::type_error(format!(
                "define: function name must be a symbol, got {}",
                other.type_name()
            ))),
            None => Err(Error::syntax_error(
                "define: function definition requires a name",
            )),
        },
        [_, _] => Err(Error::syntax_error("invalid definition target")),
        _ => Err(Error::syntax_error(format!(
            "define expects exactly 2 operands, got {}",
            args.len()
        ))),
    }
}

/// Evaluate lambda special form
fn eval_lambda(args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    match args {
        [Value::List(param_list), body] => {
            let params = parameter_names("lambda", param_list)?;

            // Only fixed-arity parameter lists are supported; `(lambda args body)` is rejected
            // below as a non-list parameter specification.
            Ok(Value::Closure(Rc::new(Closure::new(
                params,
                body.clone(),
                ctx.env.clone(),
            ))))
        }
        [other, _] => Err(Error::type_error(format!(
            "lambda parameters must be a list, got {}",
            other.type_name()
        ))),
        _ => Err(Error::syntax_error(format!(
            "lambda expects exactly 2 operands, got {}",
            args.len()
        ))),
    }
}

/// Evaluate if special form
fn eval_if(args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    let (condition_expr, then_expr, else_expr) = match args {
        [condition, then_expr] => (condition, then_expr, None),
        [condition, then_expr, else_expr] => (condition, then_expr, Some(else_expr)),
        _ => {
            return Err(Error::syntax_error(format!(
                "if expects 2 or 3 operands, got {}",
                args.len()
            )));
        }
    };

    let nested = ctx.nested();
    match eval_with_depth_tracking(condition_expr, &nested)? {
        Value::Bool(true) => eval_with_depth_tracking(then_expr, &nested),
        Value::Bool(false) => match else_expr {
            Some(else_expr) => eval_with_depth_tracking(else_expr, &nested),
            None => Ok(crate::ast::nil()),
        },
        other => Err(Error::type_error(format!(
            "if condition must be a boolean, got {}",
            other.type_name()
        ))),
    }
}

/// Collect parameter names, rejecting non-symbols
fn parameter_names(form: &str, params: &[Value]) -> Result<Vec<Rc<str>>, Error> {
    let mut names: Vec<Rc<str>> = Vec::with_capacity(params.len());
    for param in params {
        match param {
            // Repeated names bind positionally; the last argument wins
            Value::Symbol(name) => names.push(Rc::clone(name)),
            other => {
                return Err(Error::type_error(format!(
                    "{form}: parameters must be symbols, got {}",
                    other.type_name()
                )));
            }
        }
    }
    Ok(names)
}

/// Create a global environment with every builtin from the registry bound by name
pub fn create_global_env() -> Environment {
    let env = Environment::new();

    for builtin_op in get_builtin_ops() {
        env.define(
            builtin_op.id,
            Value::Builtin(Builtin::new(builtin_op.id, builtin_op.arity, builtin_op.func)),
        );
    }

    debug!(builtins = get_builtin_ops().len(), "global environment created");
    env
}
