//! S-expression reader.
//!
//! Turns source text into [`Value`]s: numbers, `#t`/`#f`, symbols, parenthesized lists and the
//! `'x` shorthand for `(quote x)`. Line comments starting with `;` are skipped when
//! [`ParseConfig::handle_comments`] is set.

use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, not_line_ending, one_of, satisfy},
    combinator::{cut, not, opt, recognize, value},
    error::ErrorKind,
    multi::many0_count,
    sequence::{pair, preceded, terminated},
};
use tracing::trace;

use crate::ast::{NumberType, SYMBOL_SPECIAL_CHARS, Value, is_valid_symbol};
use crate::{Error, MAX_PARSE_DEPTH, ParseError, ParseErrorKind};

/// Reader options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
    /// Skip `;` line comments
    pub handle_comments: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        ParseConfig {
            handle_comments: true,
        }
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || SYMBOL_SPECIAL_CHARS.contains(c)
}

/// Convert nom parsing errors to structured reader errors
fn to_parse_error(input: &str, error: nom::Err<nom::error::Error<&str>>) -> ParseError {
    match error {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let position = input.len().saturating_sub(e.input.len());
            let (kind, message) = match e.code {
                ErrorKind::TooLarge => (
                    ParseErrorKind::TooDeeplyNested,
                    format!("expression too deeply nested (max depth: {MAX_PARSE_DEPTH})"),
                ),
                ErrorKind::Float => (ParseErrorKind::InvalidNumber, "invalid number".to_owned()),
                _ if position >= input.len() => (
                    ParseErrorKind::Incomplete,
                    "unexpected end of input".to_owned(),
                ),
                _ => {
                    let remaining_chars: String = input[position..].chars().take(10).collect();
                    (
                        ParseErrorKind::InvalidSyntax,
                        format!("invalid syntax near '{remaining_chars}'"),
                    )
                }
            };
            ParseError::with_context(kind, message, input, position)
        }
        nom::Err::Incomplete(_) => {
            ParseError::from_message(ParseErrorKind::Incomplete, "incomplete input")
        }
    }
}

/// Parse a line comment (`;` to end of line)
fn parse_comment(input: &str) -> IResult<&str, &str> {
    recognize(pair(char(';'), not_line_ending)).parse(input)
}

/// Skip whitespace, and comments if enabled
fn skip_trivia(input: &str, config: ParseConfig) -> IResult<&str, ()> {
    if config.handle_comments {
        value((), many0_count(alt((multispace1, parse_comment)))).parse(input)
    } else {
        value((), multispace0).parse(input)
    }
}

/// Parse a number: `[+-]?[0-9]+(\.[0-9]+)?`
fn parse_number(input: &str) -> IResult<&str, Value> {
    let (remaining, number_str) = terminated(
        recognize((
            opt(one_of("+-")),
            digit1,
            opt(pair(char('.'), digit1)),
        )),
        // `1abc` is neither a number nor a symbol
        not(satisfy(is_symbol_char)),
    )
    .parse(input)?;

    // Out of range in either direction is rejected: overflow to infinity, or a nonzero literal
    // too small for a normal double
    let in_range = |n: NumberType| {
        n.is_finite()
            && (n.abs() >= NumberType::MIN_POSITIVE
                || !number_str.bytes().any(|b| matches!(b, b'1'..=b'9')))
    };
    match number_str.parse::<NumberType>() {
        Ok(n) if in_range(n) => Ok((remaining, Value::Number(n))),
        _ => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Float,
        ))),
    }
}

/// Parse a boolean (#t or #f)
fn parse_bool(input: &str) -> IResult<&str, Value> {
    terminated(
        alt((
            value(Value::Bool(true), tag("#t")),
            value(Value::Bool(false), tag("#f")),
        )),
        not(satisfy(is_symbol_char)),
    )
    .parse(input)
}

/// Parse a symbol (identifier)
fn parse_symbol(input: &str) -> IResult<&str, Value> {
    let (remaining, candidate) = take_while1(is_symbol_char).parse(input)?;

    if is_valid_symbol(candidate) {
        Ok((remaining, Value::symbol(candidate)))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Alpha,
        )))
    }
}

/// Parse a parenthesized list. Once the opening paren is consumed, errors are not backtracked.
fn parse_list(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Value> {
    let (mut input, _) = char('(').parse(input)?;
    let mut elements = Vec::new();

    loop {
        let (remaining, ()) = skip_trivia(input, config)?;
        if let Some(remaining) = remaining.strip_prefix(')') {
            return Ok((remaining, Value::list(elements)));
        }

        let (remaining, element) =
            cut(|input| parse_sexpr(input, config, depth + 1)).parse(remaining)?;
        elements.push(element);
        input = remaining;
    }
}

/// Parse quoted expression ('expr -> (quote expr))
fn parse_quote(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Value> {
    let (input, expr) = preceded(
        char('\''),
        cut(|input| parse_sexpr(input, config, depth + 1)),
    )
    .parse(input)?;

    Ok((input, Value::list([Value::symbol("quote"), expr])))
}

/// Parse an S-expression, rejecting nesting deeper than `MAX_PARSE_DEPTH`
fn parse_sexpr(input: &str, config: ParseConfig, depth: usize) -> IResult<&str, Value> {
    if depth >= MAX_PARSE_DEPTH {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::TooLarge,
        )));
    }
    let (input, ()) = skip_trivia(input, config)?;
    alt((
        |input| parse_quote(input, config, depth),
        |input| parse_list(input, config, depth),
        parse_number,
        parse_bool,
        parse_symbol,
    ))
    .parse(input)
}

/// Parse exactly one S-expression from input, with comments enabled.
pub fn parse_scheme(input: &str) -> Result<Value, Error> {
    parse_scheme_with_config(input, ParseConfig::default())
}

/// Parse exactly one S-expression from input.
///
/// Surrounding whitespace is allowed; anything else after the expression is an error of kind
/// [`ParseErrorKind::TrailingContent`].
pub fn parse_scheme_with_config(input: &str, config: ParseConfig) -> Result<Value, Error> {
    let (remaining, value) = terminated(
        |input| parse_sexpr(input, config, 0),
        |input| skip_trivia(input, config),
    )
    .parse(input)
    .map_err(|e| to_parse_error(input, e))?;

    if !remaining.is_empty() {
        let position = input.len() - remaining.len();
        return Err(ParseError::with_context(
            ParseErrorKind::TrailingContent,
            format!("unexpected remaining input: '{}'", remaining.trim_end()),
            input,
            position,
        )
        .into());
    }

    trace!(expr = %value, "parsed");
    Ok(value)
}

/// Parse a sequence of S-expressions (a whole program), with comments enabled.
pub fn parse_program(input: &str) -> Result<Vec<Value>, Error> {
    parse_program_with_config(input, ParseConfig::default())
}

/// Parse a sequence of S-expressions. Empty input yields an empty program.
pub fn parse_program_with_config(input: &str, config: ParseConfig) -> Result<Vec<Value>, Error> {
    let mut expressions = Vec::new();
    let mut remaining = input;

    loop {
        let (rest, ()) = skip_trivia(remaining, config).map_err(|e| to_parse_error(input, e))?;
        if rest.is_empty() {
            break;
        }
        let (rest, expr) =
            parse_sexpr(rest, config, 0).map_err(|e| to_parse_error(input, e))?;
        expressions.push(expr);
        remaining = rest;
    }

    trace!(count = expressions.len(), "parsed program");
    Ok(expressions)
}
