//! This module defines the tagged [`Value`] type that flows through the whole interpreter:
//! the reader produces it, the evaluator consumes and returns it, and its [`Display`]
//! implementation is the printer. Lists are used both as code (s-expressions) and as quoted
//! data. Heap payloads are reference counted, so values are shared between environments and
//! argument lists instead of being deep-copied. Ergonomic helper functions such as [`val`],
//! [`sym`] and [`nil`] are provided for building values in code and tests.
//!
//! [`Display`]: std::fmt::Display

use crate::Error;
use crate::evaluator::{Arity, Context, Environment};
use std::rc::Rc;

/// Type alias for number values in interpreter
pub type NumberType = f64;

/// Allowed non-alphanumeric characters in symbol names
pub(crate) const SYMBOL_SPECIAL_CHARS: &str = "+-*/_<=>?!";

/// Check if a string is a valid symbol name
/// Valid: non-empty, first char is an ASCII letter or one of SYMBOL_SPECIAL_CHARS,
/// remaining chars may also be ASCII digits
#[cfg_attr(not(any(feature = "scheme", test)), expect(dead_code))]
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let is_initial = |c: char| c.is_ascii_alphabetic() || SYMBOL_SPECIAL_CHARS.contains(c);

    let mut chars = name.chars();
    match chars.next() {
        None => false,
        // A sign followed by a digit reads as a number, never as a symbol
        Some('+' | '-') if chars.clone().next().is_some_and(|c| c.is_ascii_digit()) => false,
        Some(first) => is_initial(first) && chars.all(|c| is_initial(c) || c.is_ascii_digit()),
    }
}

/// Signature shared by every native primitive.
///
/// Builtins receive the already-evaluated arguments and the calling [`Context`], which gives
/// access to the caller's environment and lets a builtin re-enter the evaluator.
pub type BuiltinFn = fn(&[Value], &Context<'_>) -> Result<Value, Error>;

/// A native primitive, identified by the name it was registered under.
#[derive(Clone)]
pub struct Builtin {
    name: Rc<str>,
    arity: Arity,
    func: BuiltinFn,
}

impl Builtin {
    pub fn new(name: &str, arity: Arity, func: BuiltinFn) -> Self {
        Builtin {
            name: Rc::from(name),
            arity,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Check the argument count against the declared arity, then run the primitive
    pub(crate) fn call(&self, args: &[Value], ctx: &Context<'_>) -> Result<Value, Error> {
        self.arity.validate(&self.name, args.len())?;
        (self.func)(args, ctx)
    }
}

/// A user-defined function: parameter names, an unevaluated body and the environment that was
/// active where the function was created.
pub struct Closure {
    params: Vec<Rc<str>>,
    body: Value,
    env: Environment,
}

impl Closure {
    pub(crate) fn new(params: Vec<Rc<str>>, body: Value, env: Environment) -> Self {
        Closure { params, body, env }
    }

    pub fn params(&self) -> &[Rc<str>] {
        &self.params
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// The captured environment; kept alive for as long as the closure is
    pub fn env(&self) -> &Environment {
        &self.env
    }
}

/// Core value type in interpreter
///
/// To build a value, use the ergonomic helper functions:
/// - `val(42)` for numbers, `val(true)` for booleans, `sym("name")` for symbols, `nil()` for
///   the empty list
/// - `val([1, 2, 3])` for homogeneous lists
/// - `val(vec![sym("op"), val(42)])` for mixed lists
#[derive(Clone)]
pub enum Value {
    /// IEEE-754 double precision numbers
    Number(NumberType),
    Bool(bool),
    /// Symbols (identifiers); never mutated after construction
    Symbol(Rc<str>),
    /// Native primitives, compared by registered name
    Builtin(Builtin),
    /// User-defined functions, compared by identity
    Closure(Rc<Closure>),
    /// Lists: s-expressions when evaluated, data when quoted
    List(Rc<[Value]>),
}

impl Value {
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Rc::from(name))
    }

    /// Build a list value, taking ownership of the elements
    pub fn list(elements: impl Into<Rc<[Value]>>) -> Self {
        Value::List(elements.into())
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Value::Builtin(_))
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Value::Closure(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    /// Check if a value is the empty list
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::List(list) if list.is_empty())
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Value::Builtin(_) | Value::Closure(_))
    }

    pub fn as_number(&self) -> Option<NumberType> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Human-readable tag name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Bool(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::Builtin(_) => "builtin",
            Value::Closure(_) => "closure",
            Value::List(_) => "list",
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "Number({n})"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Symbol(s) => write!(f, "Symbol({s})"),
            Value::Builtin(b) => write!(f, "Builtin({})", b.name),
            // The captured environment is left out: it may contain this very closure.
            Value::Closure(c) => write!(f, "Closure(params={:?}, body={:?})", c.params, c.body),
            Value::List(list) => {
                write!(f, "List(")?;
                for (i, v) in list.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{v:?}")?;
                }
                write!(f, ")")
            }
        }
    }
}

// From trait implementations for Value - enables .into() conversion
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($num_type:ty) => {
        impl From<$num_type> for Value {
            fn from(n: $num_type) -> Self {
                Value::Number(n as NumberType)
            }
        }
    };
}

impl_from_number!(i8);
impl_from_number!(i16);
impl_from_number!(i32);
impl_from_number!(u8);
impl_from_number!(u16);
impl_from_number!(u32);
impl_from_number!(f32);
impl_from_number!(NumberType);

impl From<Builtin> for Value {
    fn from(b: Builtin) -> Self {
        Value::Builtin(b)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Value {
    fn from(arr: [T; N]) -> Self {
        Value::List(arr.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(slice: &[T]) -> Self {
        Value::List(slice.iter().cloned().map(Into::into).collect())
    }
}

// Fallible conversions from `Value` back into primitive Rust types.

impl TryFrom<&Value> for NumberType {
    type Error = Error;

    fn try_from(value: &Value) -> Result<NumberType, Error> {
        value
            .as_number()
            .ok_or_else(|| Error::type_error(format!("expected number, got {}", value.type_name())))
    }
}

impl TryFrom<&Value> for bool {
    type Error = Error;

    fn try_from(value: &Value) -> Result<bool, Error> {
        value
            .as_bool()
            .ok_or_else(|| Error::type_error(format!("expected boolean, got {}", value.type_name())))
    }
}

/// Helper function for creating symbols - works great in mixed lists!
pub fn sym<S: AsRef<str>>(name: S) -> Value {
    Value::symbol(name.as_ref())
}

/// Helper function for creating Values - works great in mixed lists!
/// Accepts any type that can be converted to Value
pub fn val<T: Into<Value>>(value: T) -> Value {
    value.into()
}

/// Helper function for creating the empty list
pub fn nil() -> Value {
    Value::List(Rc::new([]))
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{}", if *b { "#t" } else { "#f" }),
            Value::Symbol(s) => write!(f, "{s}"),
            Value::Builtin(_) => write!(f, "<builtin function>"),
            Value::Closure(c) => write!(f, "(lambda ({}) ...)", c.params.join(" ")),
            Value::List(elements) => {
                write!(f, "(")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, ")")
            }
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Builtin(a), Value::Builtin(b)) => a.name == b.name,
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false, // Different variants are never equal
        }
    }
}

#[cfg(test)]
mod helper_function_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_helper_functions_data_driven() {
        let test_cases = vec![
            (val(42), Value::Number(42.0)),
            (val(-17), Value::Number(-17.0)),
            (val(2.5), Value::Number(2.5)),
            (val(255u8), Value::Number(255.0)),
            (val(-32768i16), Value::Number(-32768.0)),
            (val(true), Value::Bool(true)),
            (sym("foo-bar?"), Value::Symbol(Rc::from("foo-bar?"))),
            (sym(String::from("test")), Value::Symbol(Rc::from("test"))),
            (nil(), Value::list(Vec::<Value>::new())),
            (
                val([1, 2, 3]),
                Value::list(vec![
                    Value::Number(1.0),
                    Value::Number(2.0),
                    Value::Number(3.0),
                ]),
            ),
            (
                val(vec![sym("operation"), val(42), val(false)]),
                Value::list(vec![
                    Value::symbol("operation"),
                    Value::Number(42.0),
                    Value::Bool(false),
                ]),
            ),
        ];

        for (i, (actual, expected)) in test_cases.iter().enumerate() {
            assert_eq!(actual, expected, "Test case {} failed", i + 1);
        }
    }

    #[test]
    fn test_display_forms() {
        let add = Builtin::new("+", Arity::Any, |_, _| Ok(nil()));
        let closure = Value::Closure(Rc::new(Closure::new(
            vec![Rc::from("x"), Rc::from("y")],
            val(vec![sym("+"), sym("x"), sym("y")]),
            Environment::new(),
        )));

        let cases = vec![
            (val(10), "10"),
            (val(2.5), "2.5"),
            (val(-0.5), "-0.5"),
            (val(true), "#t"),
            (val(false), "#f"),
            (sym("head"), "head"),
            (nil(), "()"),
            (val([1, 2, 3]), "(1 2 3)"),
            (val(vec![sym("a"), val([val(1), val([2])])]), "(a (1 (2)))"),
            (Value::Builtin(add), "<builtin function>"),
            (closure, "(lambda (x y) ...)"),
        ];

        for (value, expected) in cases {
            assert_eq!(format!("{value}"), expected);
        }
    }

    #[test]
    fn test_predicates_and_accessors() {
        let number = val(3);
        assert!(number.is_number());
        assert_eq!(number.as_number(), Some(3.0));
        assert_eq!(number.as_bool(), None);
        assert_eq!(number.type_name(), "number");

        let list = val([1, 2]);
        assert!(list.is_list());
        assert!(!list.is_nil());
        assert!(nil().is_nil());
        assert_eq!(list.as_list().map(<[Value]>::len), Some(2));

        assert_eq!(sym("x").as_symbol(), Some("x"));
        assert!(!sym("x").is_callable());

        assert_eq!(NumberType::try_from(&val(4)), Ok(4.0));
        assert!(matches!(
            NumberType::try_from(&val(true)),
            Err(Error::TypeError(_))
        ));
        assert_eq!(bool::try_from(&val(false)), Ok(false));
        assert!(matches!(bool::try_from(&nil()), Err(Error::TypeError(_))));
    }

    #[test]
    fn test_equality_semantics() {
        // Builtins compare by registered name
        let a = Value::Builtin(Builtin::new("list", Arity::Any, |_, _| Ok(nil())));
        let b = Value::Builtin(Builtin::new("list", Arity::Exact(1), |_, _| Ok(val(1))));
        let c = Value::Builtin(Builtin::new("join", Arity::Any, |_, _| Ok(nil())));
        assert_eq!(a, b);
        assert_ne!(a, c);

        // Closures compare by identity, not structure
        let env = Environment::new();
        let make = || {
            Value::Closure(Rc::new(Closure::new(
                vec![Rc::from("x")],
                sym("x"),
                env.clone(),
            )))
        };
        let first = make();
        let second = make();
        assert_eq!(first, first.clone());
        assert_ne!(first, second);

        // NaN is not equal to itself, following IEEE-754
        assert_ne!(val(f64::NAN), val(f64::NAN));
        assert_ne!(val(1), val(true));
        assert_ne!(nil(), val(false));
    }

    #[test]
    fn test_symbol_validity() {
        for valid in ["x", "+", "-", "<=", "head", "list->vec", "a1", "_tmp", "!", "?q"] {
            assert!(is_valid_symbol(valid), "{valid} should be a valid symbol");
        }
        for invalid in ["", "1abc", "9", "-42name", "+5", "a b", "#t", "x.y", "é"] {
            assert!(!is_valid_symbol(invalid), "{invalid} should be rejected");
        }
    }
}
