//! Built-in operations registry.
//!
//! Every primitive function of the language is listed once in a static table together with its
//! identifier and arity. [`create_global_env`](crate::evaluator::create_global_env) binds each
//! entry into a fresh global environment; nothing is registered implicitly.
//!
//! ```scheme
//! (+ 1 2 3)                   ; arithmetic
//! (<> 1 2)                    ; comparison
//! (join (list 1) (list 2))    ; list construction
//! (eval (quote (* 2 3)))      ; evaluation of data as code
//! ```
//!
//! ## Functions vs Special Forms
//!
//! - **Functions**: Evaluate all arguments before application (e.g., `+`, `head`, `eval`)
//! - **Special Forms**: Control evaluation of their operands (`quote`, `define`, `lambda`, `if`)
//!
//! Special forms are handled directly by the evaluator and are not in this registry.
//!
//! ## Error Handling
//!
//! - **Type Safety**: Operations reject incorrect types (e.g., `(+ 1 #t)` errors)
//! - **No Coercion**: there are no "truthiness" conversions
//! - **Arity Checking**: argument counts are validated before the function runs
//!
//! ## Adding New Operations
//!
//! 1. **Implement the function** following the signature
//!    `fn(args: &[Value], ctx: &Context<'_>) -> Result<Value, Error>`
//! 2. **Add to BUILTIN_OPS** with its identifier and arity
//! 3. **Add tests** covering edge cases and error conditions

use crate::Error;
use crate::ast::{BuiltinFn, NumberType, Value};
use crate::evaluator::{Arity, Context};

/// Definition of a built-in operation
#[derive(Debug, Clone, Copy)]
pub struct BuiltinOp {
    /// The identifier the operation is bound to in the global environment
    pub id: &'static str,
    /// Expected number of arguments
    pub arity: Arity,
    /// The implementation, called with already-evaluated arguments
    pub func: BuiltinFn,
}

impl PartialEq for BuiltinOp {
    fn eq(&self, other: &Self) -> bool {
        // Compare operations by their id, which uniquely identifies them
        self.id == other.id
    }
}

//
// Builtin Function Implementations
//

fn number_arg(op: &str, value: &Value) -> Result<NumberType, Error> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(Error::type_error(format!(
            "{op}: expected number, got {}",
            other.type_name()
        ))),
    }
}

fn list_arg<'a>(op: &str, value: &'a Value) -> Result<&'a [Value], Error> {
    match value {
        Value::List(elements) => Ok(&**elements),
        other => Err(Error::type_error(format!(
            "{op}: expected list, got {}",
            other.type_name()
        ))),
    }
}

// Macro to generate numeric comparison functions
macro_rules! numeric_comparison {
    ($name:ident, $op:tt, $op_str:expr) => {
        fn $name(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
            let [left, right] = args else {
                return Err(Error::arity_error($op_str, Arity::Exact(2), args.len()));
            };
            let left = number_arg($op_str, left)?;
            let right = number_arg($op_str, right)?;
            Ok(Value::Bool(left $op right))
        }
    };
}

// Generate all comparison functions
numeric_comparison!(builtin_eq, ==, "=");
numeric_comparison!(builtin_ne, !=, "<>");
numeric_comparison!(builtin_lt, <, "<");
numeric_comparison!(builtin_gt, >, ">");
numeric_comparison!(builtin_le, <=, "<=");
numeric_comparison!(builtin_ge, >=, ">=");

fn builtin_add(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let mut sum: NumberType = 0.0;
    for arg in args {
        sum += number_arg("+", arg)?;
    }
    Ok(Value::Number(sum))
}

fn builtin_mul(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let mut product: NumberType = 1.0;
    for arg in args {
        product *= number_arg("*", arg)?;
    }
    Ok(Value::Number(product))
}

fn builtin_sub(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    match args {
        [operand] => Ok(Value::Number(-number_arg("-", operand)?)),
        [left, right] => Ok(Value::Number(
            number_arg("-", left)? - number_arg("-", right)?,
        )),
        _ => Err(Error::arity_error("-", Arity::Range(1, 2), args.len())),
    }
}

fn builtin_div(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let [dividend, divisor] = args else {
        return Err(Error::arity_error("/", Arity::Exact(2), args.len()));
    };
    let dividend = number_arg("/", dividend)?;
    let divisor = number_arg("/", divisor)?;
    if divisor == 0.0 {
        return Err(Error::DivisionByZero);
    }
    Ok(Value::Number(dividend / divisor))
}

fn builtin_list(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    Ok(Value::list(args))
}

fn builtin_head(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error("head", Arity::Exact(1), args.len()));
    };
    match list_arg("head", list)? {
        [first, ..] => Ok(first.clone()),
        [] => Err(Error::EmptyList("head".to_owned())),
    }
}

fn builtin_tail(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let [list] = args else {
        return Err(Error::arity_error("tail", Arity::Exact(1), args.len()));
    };
    match list_arg("tail", list)? {
        [_, rest @ ..] => Ok(Value::list(rest)),
        [] => Err(Error::EmptyList("tail".to_owned())),
    }
}

fn builtin_join(args: &[Value], _ctx: &Context<'_>) -> Result<Value, Error> {
    let mut joined = Vec::new();
    for arg in args {
        joined.extend_from_slice(list_arg("join", arg)?);
    }
    Ok(Value::list(joined))
}

/// Evaluates its (already evaluated) argument once more, in the caller's environment
fn builtin_eval(args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
    let [expr] = args else {
        return Err(Error::arity_error("eval", Arity::Exact(1), args.len()));
    };
    ctx.eval(expr)
}

/// Global registry of all built-in operations.
///
/// A single contiguous table for ease of auditing; the global environment is built from it.
static BUILTIN_OPS: &[BuiltinOp] = &[
    // Arithmetic operations
    BuiltinOp {
        id: "+",
        arity: Arity::Any,
        func: builtin_add,
    },
    BuiltinOp {
        id: "-",
        arity: Arity::Range(1, 2),
        func: builtin_sub,
    },
    BuiltinOp {
        id: "*",
        arity: Arity::Any,
        func: builtin_mul,
    },
    BuiltinOp {
        id: "/",
        arity: Arity::Exact(2),
        func: builtin_div,
    },
    // Comparison operations
    BuiltinOp {
        id: "<",
        arity: Arity::Exact(2),
        func: builtin_lt,
    },
    BuiltinOp {
        id: ">",
        arity: Arity::Exact(2),
        func: builtin_gt,
    },
    BuiltinOp {
        id: "<=",
        arity: Arity::Exact(2),
        func: builtin_le,
    },
    BuiltinOp {
        id: ">=",
        arity: Arity::Exact(2),
        func: builtin_ge,
    },
    BuiltinOp {
        id: "=",
        arity: Arity::Exact(2),
        func: builtin_eq,
    },
    BuiltinOp {
        id: "<>",
        arity: Arity::Exact(2),
        func: builtin_ne,
    },
    // List operations
    BuiltinOp {
        id: "list",
        arity: Arity::Any,
        func: builtin_list,
    },
    BuiltinOp {
        id: "head",
        arity: Arity::Exact(1),
        func: builtin_head,
    },
    BuiltinOp {
        id: "tail",
        arity: Arity::Exact(1),
        func: builtin_tail,
    },
    BuiltinOp {
        id: "join",
        arity: Arity::Any,
        func: builtin_join,
    },
    // Evaluation
    BuiltinOp {
        id: "eval",
        arity: Arity::Exact(1),
        func: builtin_eval,
    },
];

/// Get all builtin operations
pub fn get_builtin_ops() -> &'static [BuiltinOp] {
    BUILTIN_OPS
}
