//! End-to-end tests: compile skt source with `sktc` and run it on the VM.

use skt_vm::{execute, BufferHooks};
use std::sync::atomic::AtomicBool;

fn compile(source: &str) -> skt_core::Program {
    let result = sktc::compile(source);
    assert!(
        result.lex_errors.is_empty() && result.parse_errors.is_empty(),
        "front-end errors: {:?} {:?}",
        result.lex_errors,
        result.parse_errors
    );
    result.program.unwrap_or_else(|| {
        panic!(
            "no program generated; semantic errors: {:?}",
            result.analysis.map(|a| a.errors)
        )
    })
}

fn run(source: &str, input: &[&str]) -> (BufferHooks, bool) {
    let program = compile(source);
    let mut hooks = BufferHooks::with_input(input);
    let outcome = execute(&program, &mut hooks, None);
    (hooks, outcome.success)
}

#[test]
fn test_read_double_write() {
    let (hooks, success) = run("main { int n; cin >> n; cout << n * 2; }", &["21"]);
    assert!(success);
    assert_eq!(hooks.output, "42\n");
}

#[test]
fn test_widened_assignment_prints_float() {
    let (hooks, success) = run(
        "main { int x; float a; x = 5; a = x; cout << a; }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "5.0\n");
}

#[test]
fn test_while_loop_counts_down() {
    let (hooks, success) = run(
        "main { int n; n = 3; while n > 0 { cout << n; n--; } }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "3\n2\n1\n");
}

#[test]
fn test_do_while_runs_at_least_once() {
    let (hooks, success) = run(
        "main { int n; n = 0; do { cout << \"vuelta\"; n++; } while n < 0; }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "vuelta\n");
}

#[test]
fn test_if_else_branching() {
    let source = "main { int n; cin >> n; if n % 2 == 0 { cout << \"par\"; } else { cout << \"impar\"; } }";
    let (hooks, _) = run(source, &["4"]);
    assert_eq!(hooks.output, "par\n");
    let (hooks, _) = run(source, &["7"]);
    assert_eq!(hooks.output, "impar\n");
}

#[test]
fn test_chained_cout_items_share_one_newline() {
    let (hooks, success) = run(
        "main { int a, b; a = 1; b = 2; cout << a << \" y \" << b; }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "1 y 2\n");
}

#[test]
fn test_multiple_reads_in_one_statement() {
    let (hooks, success) = run(
        "main { int a; float b; cin >> a >> b; cout << a << \" \" << b; }",
        &["3", "0.5"],
    );
    assert!(success);
    assert_eq!(hooks.output, "3 0.5\n");
}

#[test]
fn test_division_by_zero_recovers_with_zero() {
    let (hooks, success) = run(
        "main { int a, b; a = 7; b = 0; cout << a / b; }",
        &[],
    );
    assert!(success);
    assert!(hooks.errors.contains("division by zero"));
    assert_eq!(hooks.output, "0\n");
}

#[test]
fn test_bad_input_recovers_with_zero() {
    let (hooks, success) = run(
        "main { int n; cin >> n; cout << n + 1; }",
        &["no soy un numero"],
    );
    assert!(success);
    assert!(!hooks.errors.is_empty());
    assert_eq!(hooks.output, "1\n");
}

#[test]
fn test_booleans_print_as_words() {
    let (hooks, success) = run(
        "main { bool listo; listo = true; cout << listo << \" \" << !listo; }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "true false\n");
}

#[test]
fn test_power_operator_is_right_associative_end_to_end() {
    let (hooks, success) = run("main { cout << 2 ^ 3 ^ 2; }", &[]);
    assert!(success);
    // 2 ^ (3 ^ 2) = 512, not (2 ^ 3) ^ 2 = 64
    assert_eq!(hooks.output, "512\n");
}

#[test]
fn test_compound_assignments() {
    let (hooks, success) = run(
        "main { int n; n = 10; n += 5; n -= 3; n *= 2; n /= 4; n %= 4; cout << n; }",
        &[],
    );
    assert!(success);
    // ((10 + 5 - 3) * 2 / 4) % 4 = 6 % 4 = 2
    assert_eq!(hooks.output, "2\n");
}

#[test]
fn test_string_variables_roundtrip() {
    let (hooks, success) = run(
        "main { string saludo; saludo = \"hola\"; cout << saludo << \"!\"; }",
        &[],
    );
    assert!(success);
    assert_eq!(hooks.output, "hola!\n");
}

#[test]
fn test_cancellation_flag_stops_execution() {
    let program = compile("main { int n; n = 0; while n < 1000000 { n++; } }");
    let cancel = AtomicBool::new(true);
    let mut hooks = BufferHooks::new();
    let outcome = execute(&program, &mut hooks, Some(&cancel));
    assert!(!outcome.success);
    assert!(outcome.error.unwrap().contains("cancelled"));
}

#[test]
fn test_nested_control_flow() {
    let (hooks, success) = run(
        "main {\n\
         \tint i, j;\n\
         \ti = 0;\n\
         \twhile i < 3 {\n\
         \t\tj = 0;\n\
         \t\tdo {\n\
         \t\t\tif (i + j) % 2 == 0 {\n\
         \t\t\t\tcout << i << j;\n\
         \t\t\t}\n\
         \t\t\tj++;\n\
         \t\t} while j < 2;\n\
         \t\ti++;\n\
         \t}\n\
         }",
        &[],
    );
    assert!(success);
    // pairs (i, j) with even sum: (0,0), (1,1), (2,0)
    assert_eq!(hooks.output, "00\n11\n20\n");
}
