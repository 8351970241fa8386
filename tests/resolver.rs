//! Resolver tests: every static rule, and the fact that diagnostics
//! accumulate instead of stopping at the first.

use runic::error::Reporter;
use runic::interpreter::Interpreter;
use runic::parser::Parser;
use runic::resolver::Resolver;
use runic::scanner::Scanner;

/// Scan, parse and resolve; returns the collected diagnostics.
fn resolve(source: &str) -> Vec<String> {
    let mut reporter = Reporter::new();

    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    assert!(
        !reporter.had_error(),
        "source must parse cleanly for a resolver test: {:?}",
        reporter.diagnostics()
    );

    let mut sink: Vec<u8> = Vec::new();
    let mut interpreter = Interpreter::new(&mut sink);

    Resolver::new(&mut interpreter, &mut reporter).resolve(&statements);

    reporter.diagnostics().to_vec()
}

fn assert_clean(source: &str) {
    let diagnostics = resolve(source);

    assert!(
        diagnostics.is_empty(),
        "expected no diagnostics, got: {:?}",
        diagnostics
    );
}

fn assert_reports(source: &str, message: &str) {
    let diagnostics = resolve(source);

    assert!(
        diagnostics.iter().any(|d| d.contains(message)),
        "expected a diagnostic containing {:?}, got: {:?}",
        message,
        diagnostics
    );
}

#[test]
fn return_at_top_level_is_rejected() {
    assert_reports("return 1;", "Cannot return from top-level code.");
}

#[test]
fn return_inside_a_function_is_fine() {
    assert_clean("fun f() { return 1; }");
}

#[test]
fn return_inside_a_lambda_is_fine() {
    assert_clean("var f = lambda (x) { return x; };");
}

#[test]
fn break_outside_a_loop_is_rejected() {
    assert_reports("break;", "Cannot use break when not in a loop.");
}

#[test]
fn break_inside_a_while_is_fine() {
    assert_clean("while (true) { break; }");
}

#[test]
fn break_inside_a_for_is_fine() {
    assert_clean("for (var i = 0; i < 3; i = i + 1) { break; }");
}

#[test]
fn break_may_not_cross_a_function_boundary() {
    assert_reports(
        "while (true) { fun f() { break; } }",
        "Cannot use break when not in a loop.",
    );
}

#[test]
fn this_outside_a_class_is_rejected() {
    assert_reports("print this;", "Cannot use 'this' outside a class.");
}

#[test]
fn this_inside_a_free_function_is_rejected() {
    assert_reports(
        "fun f() { return this; }",
        "Cannot use 'this' outside a class.",
    );
}

#[test]
fn this_inside_a_method_is_fine() {
    assert_clean("class A { m() { return this; } }");
}

#[test]
fn this_inside_a_class_method_is_fine() {
    assert_clean("class A { class m() { return this; } }");
}

#[test]
fn value_return_from_initializer_is_rejected() {
    assert_reports(
        "class A { init() { return 1; } }",
        "Cannot return a value from an instance initializer.",
    );
}

#[test]
fn bare_return_from_initializer_is_fine() {
    assert_clean("class A { init() { return; } }");
}

#[test]
fn self_referential_initializer_is_rejected() {
    assert_reports(
        "{ var a = a; }",
        "Cannot read local variable in its own initializer.",
    );
}

#[test]
fn global_initializer_may_reference_an_earlier_global() {
    assert_clean("var a = 1; var b = a;");
}

#[test]
fn duplicate_local_is_rejected() {
    assert_reports(
        "{ var a = 1; var a = 2; }",
        "Variable with the same name already declared in this scope.",
    );
}

#[test]
fn duplicate_global_is_permitted() {
    assert_clean("var a = 1; var a = 2;");
}

#[test]
fn duplicate_parameter_is_rejected() {
    assert_reports(
        "fun f(a, a) {}",
        "Variable with the same name already declared in this scope.",
    );
}

#[test]
fn class_inheriting_from_itself_is_rejected() {
    assert_reports("class A < A {}", "A class cannot inherit from itself.");
}

#[test]
fn class_inheriting_from_another_is_fine() {
    assert_clean("class A {} class B < A {}");
}

#[test]
fn shadowing_in_a_nested_block_is_fine() {
    assert_clean("{ var a = 1; { var a = 2; print a; } }");
}

#[test]
fn diagnostics_accumulate_across_the_pass() {
    let diagnostics = resolve("return 1; break; print this;");

    assert_eq!(diagnostics.len(), 3);
}
