//! End-to-end sessions through the public API: read, evaluate and print.
#![cfg(feature = "scheme")]
#![expect(clippy::unwrap_used)] // test code OK

use lispy::scheme::ParseConfig;
use lispy::session::Session;
use lispy::{Error, EvalConfig};
use pretty_assertions::assert_eq;

/// Run `lines` in one session, returning the printed result (or error) of each
fn transcript(lines: &[&str]) -> Vec<String> {
    let session = Session::new();
    lines
        .iter()
        .map(|line| match session.eval_line(line) {
            Ok(Some(value)) => value.to_string(),
            Ok(None) => String::new(),
            Err(err) => format!("Error: {err}"),
        })
        .collect()
}

#[test]
fn test_literal_session() {
    let lines = [
        "(define x 10)",
        "x",
        "((lambda (y) (* y y)) 5)",
        "(head (list 1 2 3))",
        "(if (> 3 2) 1 0)",
        "(eval (quote (+ 1 2)))",
    ];
    assert_eq!(transcript(&lines), ["10", "10", "25", "1", "1", "3"]);
}

#[test]
fn test_printed_forms() {
    let lines = [
        "(list 1 2.5 -3)",
        "'(a (b #t) ())",
        "(define (add a b) (+ a b))",
        "add",
        "+",
        "(if #f 1)",
        "(/ 1 4)",
        "''x",
    ];
    assert_eq!(
        transcript(&lines),
        [
            "(1 2.5 -3)",
            "(a (b #t) ())",
            "(lambda (a b) ...)",
            "(lambda (a b) ...)",
            "<builtin function>",
            "()",
            "0.25",
            "(quote x)",
        ]
    );
}

#[test]
fn test_errors_are_reported_and_session_continues() {
    let lines = [
        "(define n 3)",
        "(undefined 1)",
        "(/ n 0)",
        "(head '())",
        "(if n 1 2)",
        "(5 6)",
        "(- 1 2 3)",
        "(+ 1",
        "n",
    ];
    let output = transcript(&lines);
    assert_eq!(output[0], "3");
    assert_eq!(output[1], "Error: NameError: undefined variable 'undefined'");
    assert_eq!(output[2], "Error: DivisionByZero: division by zero");
    assert_eq!(output[3], "Error: EmptyList: head applied to an empty list");
    assert!(output[4].starts_with("Error: TypeError:"), "{}", output[4]);
    assert_eq!(output[5], "Error: UnknownProcedure: 5 is not a procedure");
    assert_eq!(
        output[6],
        "Error: ArityError: - expected 1 to 2 argument(s), got 3"
    );
    assert!(
        output[7].starts_with("Error: ReadError: unexpected end of input"),
        "{}",
        output[7]
    );
    assert_eq!(output[8], "3");
}

#[test]
fn test_closures_and_list_program() {
    let session = Session::new();
    let program = r"
        ; adders built from closures
        (define (make-adder n) (lambda (x) (+ x n)))
        (define add2 (make-adder 2))
        (define add10 (make-adder 10))
        (add2 1)
        (add10 1)

        ; lists carry no length, so the count is passed along
        (define (map-n f xs n)
          (if (= n 0)
              (list)
              (join (list (f (head xs))) (map-n f (tail xs) (- n 1)))))
        (map-n add2 '(1 2 3) 3)
        (define (sum-n xs n) (if (= n 0) 0 (+ (head xs) (sum-n (tail xs) (- n 1)))))
        (sum-n (map-n add10 '(1 2 3) 3) 3)
    ";

    let printed: Vec<String> = session
        .run_source(program)
        .unwrap()
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(&printed[3..5], ["3", "11"]);
    assert_eq!(printed[6], "(3 4 5)");
    assert_eq!(printed[8], "36");

    // Walking past the end of the list is reported, not skipped
    let err = session.eval_line("(sum-n '(1 2) 3)").unwrap_err();
    assert_eq!(err, Error::EmptyList("head".to_owned()));
}

#[test]
fn test_late_binding_of_globals() {
    let session = Session::new();
    session
        .run_source(
            "
            (define (area r) (* pi (* r r)))
            (define (twice-area r) (* 2 (area r)))
            ",
        )
        .unwrap();

    // `pi` is unbound until defined; closures resolve it at call time
    assert_eq!(
        session.eval_line("(twice-area 1)"),
        Err(Error::NameError("pi".to_owned()))
    );

    session.eval_line("(define pi 3)").unwrap();
    assert_eq!(
        session.eval_line("(twice-area 2)").unwrap().unwrap().to_string(),
        "24"
    );
}

#[test]
fn test_deep_recursion() {
    let session = Session::new();
    session
        .eval_line("(define (down n) (if (= n 0) 0 (down (- n 1))))")
        .unwrap();
    assert_eq!(session.eval_line("(down 20000)").unwrap().unwrap().to_string(), "0");
    session
        .eval_line("(define (sum-to n) (if (= n 0) 0 (+ n (sum-to (- n 1)))))")
        .unwrap();
    assert_eq!(
        session.eval_line("(sum-to 5000)").unwrap().unwrap().to_string(),
        "12502500"
    );
}

#[test]
fn test_host_depth_limit() {
    let session = Session::with_config(
        ParseConfig::default(),
        EvalConfig {
            max_depth: Some(1_000),
        },
    );
    session.eval_line("(define (spin) (spin))").unwrap();
    assert_eq!(session.eval_line("(spin)"), Err(Error::DepthExceeded(1_000)));
    // The session is still usable afterwards
    assert_eq!(session.eval_line("(+ 1 1)").unwrap().unwrap().to_string(), "2");
}
