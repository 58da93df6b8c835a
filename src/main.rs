use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use lispy::EvalConfig;
use lispy::scheme::ParseConfig;
use lispy::session::{BANNER, Command, HELP_TEXT, PROMPT, Session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

/// Interpreter for a small Lisp
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Program to run; starts an interactive session when omitted
    file: Option<PathBuf>,
    /// Maximum evaluation depth; unlimited when omitted
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,
    /// Treat `;` as an ordinary character instead of starting a comment
    #[arg(long, default_value_t = false)]
    no_comments: bool,
    /// Do not print the banner
    #[arg(short, long, default_value_t = false)]
    quiet: bool,
    /// Log filter, e.g. `lispy=debug` (overrides RUST_LOG)
    #[arg(long, value_name = "FILTER")]
    log: Option<String>,
}

/// Log to stderr, filtered by `--log` or `RUST_LOG`; silent when neither is given
fn init_tracing(filter: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        None => return,
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log.as_deref());
    debug!(?args, "starting");

    let session = Session::with_config(
        ParseConfig {
            handle_comments: !args.no_comments,
        },
        EvalConfig {
            max_depth: args.max_depth,
        },
    );

    match &args.file {
        Some(path) => run_file(&session, path),
        None => run_repl(&session, args.quiet),
    }
}

fn run_file(session: &Session, path: &Path) -> ExitCode {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("Error: cannot read {}: {err}", path.display());
            return ExitCode::FAILURE;
        }
    };

    match session.run_source(&source) {
        Ok(results) => {
            for result in results {
                println!("{result}");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl(session: &Session, quiet: bool) -> ExitCode {
    if !quiet {
        println!("{BANNER}");
    }

    let mut rl = match DefaultEditor::new() {
        Ok(rl) => rl,
        Err(err) => {
            eprintln!("Error: could not initialize line editor: {err}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line.as_str());

                match Session::command(&line) {
                    Some(Command::Help) => {
                        println!("{HELP_TEXT}");
                        continue;
                    }
                    Some(Command::Env) => {
                        println!("{}", session.describe_environment());
                        continue;
                    }
                    Some(Command::Quit) => break,
                    None => {}
                }

                match session.eval_line(&line) {
                    Ok(Some(value)) => println!("{value}"),
                    Ok(None) => {}
                    Err(err) => println!("Error: {err}"),
                }
            }
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}
