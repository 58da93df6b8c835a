//! Persistent read-eval-print session.
//!
//! A [`Session`] owns one global environment; every line or program it runs sees the definitions
//! made by the ones before it. The `lispy` binary drives it line by line from the terminal or
//! once for a whole file.

use crate::Error;
use crate::ast::Value;
use crate::evaluator::{EvalConfig, Environment, create_global_env, eval_with_config};
use crate::scheme::{ParseConfig, parse_program_with_config, parse_scheme_with_config};
use tracing::debug;

/// Banner printed when the interactive loop starts
pub const BANNER: &str = "Lispy Version 0.1.0\nPress Ctrl+d to Exit\n";

/// Prompt shown before every line
pub const PROMPT: &str = "lispy> ";

pub const HELP_TEXT: &str = "\
Commands:
  :help      - Show this help message
  :env       - Show current environment bindings
  :quit      - Exit the interpreter
  :exit      - Exit the interpreter
  Ctrl+D     - Exit the interpreter

Special forms:
  (quote x) or 'x           - x, unevaluated
  (define name expr)        - bind a value
  (define (name args) body) - bind a function
  (lambda (args) body)      - anonymous function
  (if cond then [else])     - cond must be #t or #f

Builtins:
  Arithmetic: + - * /
  Comparison: < > <= >= = <>
  Lists:      list head tail join
  Evaluation: eval
";

/// REPL commands, entered as `:name`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Env,
    Quit,
}

impl Command {
    /// Recognize a command line; anything else is source text
    pub fn parse(line: &str) -> Option<Command> {
        match line.trim() {
            ":help" => Some(Command::Help),
            ":env" => Some(Command::Env),
            ":quit" | ":exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Interpreter state shared across lines
#[derive(Debug)]
pub struct Session {
    env: Environment,
    parse_config: ParseConfig,
    eval_config: EvalConfig,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(ParseConfig::default(), EvalConfig::default())
    }

    pub fn with_config(parse_config: ParseConfig, eval_config: EvalConfig) -> Self {
        debug!(?parse_config, ?eval_config, "session created");
        Session {
            env: create_global_env(),
            parse_config,
            eval_config,
        }
    }

    /// The global environment of this session
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// See [`Command::parse`]
    pub fn command(line: &str) -> Option<Command> {
        Command::parse(line)
    }

    /// Read one expression from `line` and evaluate it in the global environment.
    ///
    /// Blank lines (and lines holding only a comment) produce `Ok(None)`.
    pub fn eval_line(&self, line: &str) -> Result<Option<Value>, Error> {
        if self.is_blank(line) {
            return Ok(None);
        }
        debug!(line, "eval line");
        let expr = parse_scheme_with_config(line, self.parse_config)?;
        eval_with_config(&expr, &self.env, &self.eval_config).map(Some)
    }

    /// Read a whole program and evaluate its expressions in order, stopping at the first error.
    ///
    /// Nothing is evaluated if the program does not read.
    pub fn run_source(&self, source: &str) -> Result<Vec<Value>, Error> {
        let program = parse_program_with_config(source, self.parse_config)?;
        debug!(expressions = program.len(), "run source");
        program
            .iter()
            .map(|expr| eval_with_config(expr, &self.env, &self.eval_config))
            .collect()
    }

    fn is_blank(&self, line: &str) -> bool {
        let line = line.trim_start();
        line.is_empty() || (self.parse_config.handle_comments && line.starts_with(';'))
    }

    /// Listing of the visible bindings: builtin names in columns, then user definitions
    pub fn describe_environment(&self) -> String {
        let bindings = self.env.get_all_bindings();

        // Separate built-in functions from user-defined values
        let mut builtins = Vec::new();
        let mut user_defined = Vec::new();
        for (name, value) in bindings {
            match value {
                Value::Builtin(_) => builtins.push(name),
                _ => user_defined.push((name, value)),
            }
        }

        let mut lines = Vec::new();
        if !builtins.is_empty() {
            lines.push(format!("Built-in functions ({}):", builtins.len()));
            // Four columns
            for row in builtins.chunks(4) {
                let row: String = row.iter().map(|name| format!("  {name:<10}")).collect();
                lines.push(row.trim_end().to_owned());
            }
        }

        if user_defined.is_empty() {
            lines.push("No user-defined values.".to_owned());
        } else {
            lines.push(format!("User-defined values ({}):", user_defined.len()));
            for (name, value) in user_defined {
                lines.push(format!("  {name} = {value}"));
            }
        }

        lines.join("\n")
    }
}

impl Default for Session {
    fn default() -> Self {
        Session::new()
    }
}
