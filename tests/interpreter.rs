//! End-to-end tests: source in, exact stdout (or diagnostic) out.

use runic::error::Reporter;
use runic::interpreter::Interpreter;

struct Run {
    output: String,
    diagnostics: Vec<String>,
    had_error: bool,
    had_runtime_error: bool,
}

fn run_source(source: &str) -> Run {
    let mut out: Vec<u8> = Vec::new();
    let mut reporter = Reporter::new();

    {
        let mut interpreter = Interpreter::new(&mut out);
        runic::run(source, &mut interpreter, &mut reporter);
    }

    Run {
        output: String::from_utf8(out).expect("interpreter output is UTF-8"),
        diagnostics: reporter.diagnostics().to_vec(),
        had_error: reporter.had_error(),
        had_runtime_error: reporter.had_runtime_error(),
    }
}

fn assert_output(source: &str, expected: &str) {
    let run = run_source(source);

    assert!(
        !run.had_error && !run.had_runtime_error,
        "unexpected diagnostics: {:?}",
        run.diagnostics
    );
    assert_eq!(run.output, expected);
}

fn assert_runtime_error(source: &str, message: &str) {
    let run = run_source(source);

    assert!(
        run.had_runtime_error,
        "expected a runtime error, got output {:?} and diagnostics {:?}",
        run.output, run.diagnostics
    );
    assert!(
        run.diagnostics.iter().any(|d| d.contains(message)),
        "expected a diagnostic containing {:?}, got: {:?}",
        message,
        run.diagnostics
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Literals, operators, printing
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn hello_world() {
    assert_output("print \"Hello, world.\";", "Hello, world.\n");
}

#[test]
fn arithmetic_precedence() {
    assert_output("print 1 + 2 * 3;", "7\n");
}

#[test]
fn integral_numbers_print_without_a_fraction() {
    assert_output("print 7.0; print 2.5; print 8 / 2;", "7\n2.5\n4\n");
}

#[test]
fn string_concatenation_stringifies_either_side() {
    assert_output("print \"a\" + 1;", "a1\n");
    assert_output("print 1 + \"a\";", "1a\n");
    assert_output("print \"a\" + \"b\";", "ab\n");
    assert_output("print \"v=\" + nil;", "v=nil\n");
    assert_output("print true + \"!\";", "true!\n");
}

#[test]
fn plus_on_incompatible_operands_fails() {
    assert_runtime_error(
        "print nil + 1;",
        "Operands must both be numbers or one of them a string.",
    );
}

#[test]
fn division_by_zero_fails() {
    assert_runtime_error("print 1 / 0;", "Cannot divide by zero.");
}

#[test]
fn comparison_requires_numbers() {
    assert_runtime_error("print \"a\" < \"b\";", "Operands must be numbers.");
}

#[test]
fn unary_minus_requires_a_number() {
    assert_runtime_error("print -\"x\";", "Operand must be a number.");
}

#[test]
fn unary_bang_negates_truthiness() {
    assert_output("print !nil; print !0; print !\"\";", "true\nfalse\nfalse\n");
}

#[test]
fn equality_never_crosses_types() {
    assert_output(
        "print 1 == 1; print \"a\" == \"a\"; print nil == nil; \
         print 1 == \"1\"; print nil == false;",
        "true\ntrue\ntrue\nfalse\nfalse\n",
    );
}

#[test]
fn zero_and_empty_string_are_truthy() {
    assert_output("print 0 ? \"t\" : \"f\"; print \"\" ? \"t\" : \"f\";", "t\nt\n");
}

#[test]
fn ternary_evaluates_exactly_one_branch() {
    assert_output(
        "fun t() { print \"then\"; return 1; } \
         fun e() { print \"else\"; return 2; } \
         print false ? t() : e();",
        "else\n2\n",
    );
}

#[test]
fn comma_returns_the_right_operand() {
    assert_output("print (1, 2);", "2\n");
}

#[test]
fn logical_operators_return_the_operand_unconverted() {
    assert_output("print nil or \"default\"; print 1 and 2;", "default\n2\n");
}

#[test]
fn and_short_circuits_observably() {
    assert_output(
        "fun side() { print \"evaluated\"; return true; } \
         print false and side();",
        "false\n",
    );
}

#[test]
fn or_short_circuits_observably() {
    assert_output(
        "fun side() { print \"evaluated\"; return true; } \
         print true or side();",
        "true\n",
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Variables, scopes, control flow
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn block_scoping_and_shadowing() {
    assert_output(
        "var a = 1; { var a = 2; print a; } print a;",
        "2\n1\n",
    );
}

#[test]
fn uninitialized_variables_are_nil() {
    assert_output("var a; print a;", "nil\n");
}

#[test]
fn globals_may_be_redefined() {
    assert_output("var a = 1; var a = 2; print a;", "2\n");
}

#[test]
fn undefined_variable_read_fails() {
    assert_runtime_error("print x;", "Undefined variable 'x'.");
}

#[test]
fn undefined_variable_assignment_fails() {
    assert_runtime_error("b = 1;", "Undefined variable 'b'.");
}

#[test]
fn assignment_is_an_expression() {
    assert_output("var a = 1; print a = 2; print a;", "2\n2\n");
}

#[test]
fn if_else() {
    assert_output(
        "if (2 + 2 == 4) print \"yes\"; else print \"no\"; \
         if (2 + 2 == 5) print \"yes\"; else print \"no\";",
        "yes\nno\n",
    );
}

#[test]
fn while_loop() {
    assert_output(
        "var i = 0; while (i < 3) { print i; i = i + 1; }",
        "0\n1\n2\n",
    );
}

#[test]
fn while_condition_is_reevaluated_each_iteration() {
    assert_output(
        "var i = 0; \
         fun bump() { i = i + 1; return i < 3; } \
         while (bump()) print i;",
        "1\n2\n",
    );
}

#[test]
fn break_terminates_the_loop_cleanly() {
    assert_output(
        "var i = 0; while (true) { i = i + 1; if (i == 3) break; } print i;",
        "3\n",
    );
}

#[test]
fn break_exits_only_the_innermost_loop() {
    assert_output(
        "var total = 0; \
         for (var i = 0; i < 2; i = i + 1) { \
             while (true) { total = total + 1; break; } \
         } \
         print total;",
        "2\n",
    );
}

#[test]
fn for_loop() {
    assert_output("for (var i = 0; i < 3; i = i + 1) print i;", "0\n1\n2\n");
}

// ─────────────────────────────────────────────────────────────────────────
// Functions, closures, lambdas
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn closure_counter() {
    assert_output(
        "fun make() { var i = 0; fun inc() { i = i + 1; return i; } return inc; } \
         var c = make(); print c(); print c(); print c();",
        "1\n2\n3\n",
    );
}

#[test]
fn closures_capture_bindings_not_values() {
    assert_output(
        "var x = \"before\"; \
         fun show() { print x; } \
         x = \"after\"; \
         show();",
        "after\n",
    );
}

#[test]
fn two_closures_share_one_environment() {
    assert_output(
        "fun pair() { \
             var n = 0; \
             fun up() { n = n + 1; return n; } \
             fun down() { n = n - 1; return n; } \
             print up(); print up(); print down(); \
         } \
         pair();",
        "1\n2\n1\n",
    );
}

#[test]
fn implicit_return_is_nil() {
    assert_output("fun f() {} print f();", "nil\n");
}

#[test]
fn return_unwinds_the_rest_of_the_body() {
    assert_output(
        "fun f() { return 1; print \"unreached\"; } print f();",
        "1\n",
    );
}

#[test]
fn recursion() {
    assert_output(
        "fun fib(n) { if (n < 2) return n; return fib(n - 1) + fib(n - 2); } \
         print fib(10);",
        "55\n",
    );
}

#[test]
fn function_display() {
    assert_output("fun f() {} print f;", "<fn f>\n");
}

#[test]
fn native_display_and_call() {
    assert_output("print clock;", "<native func>\n");
    assert_output("print clock() > 0;", "true\n");
}

#[test]
fn arity_mismatch_fails() {
    assert_runtime_error(
        "fun f(a, b) { return a; } f(1);",
        "Expected 2 arguments but got 1.",
    );
}

#[test]
fn calling_a_non_callable_fails() {
    assert_runtime_error("\"x\"();", "Can only call functions and classes.");
}

#[test]
fn lambda_basics() {
    assert_output(
        "var f = lambda (x) { return x + 1; }; print f(1); print f;",
        "2\n<fn>\n",
    );
}

#[test]
fn lambdas_capture_the_global_environment() {
    assert_output(
        "var g = 1; \
         fun make() { var local = 2; return lambda () { return g; }; } \
         print make()();",
        "1\n",
    );
}

#[test]
fn lambdas_do_not_capture_enclosing_locals() {
    assert_runtime_error(
        "fun make() { var local = 2; return lambda () { return local; }; } \
         var f = make(); \
         f();",
        "Undefined variable 'local'.",
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Classes, instances, inheritance
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn instance_fields_and_methods() {
    assert_output(
        "class A { greet() { print \"hi \" + this.name; } } \
         var a = A(); a.name = \"x\"; a.greet();",
        "hi x\n",
    );
}

#[test]
fn initializer_binds_this() {
    assert_output(
        "class A { init(n) { this.n = n; } } \
         var a = A(7); print a.n;",
        "7\n",
    );
}

#[test]
fn bare_return_in_initializer_yields_this() {
    assert_output(
        "class A { init(n) { if (n == 0) { this.tag = \"zero\"; return; } this.tag = \"other\"; } } \
         print A(0).tag; print A(1).tag;",
        "zero\nother\n",
    );
}

#[test]
fn class_and_instance_display() {
    assert_output("class Point {} print Point; print Point();", "Point::class\nPoint instance\n");
}

#[test]
fn constructing_with_wrong_arity_fails() {
    assert_runtime_error(
        "class A { init(n) {} } A();",
        "Expected 1 arguments but got 0.",
    );
}

#[test]
fn fields_shadow_methods() {
    assert_output(
        "class A { m() { return \"method\"; } } \
         var a = A(); \
         print a.m(); \
         a.m = lambda () { return \"field\"; }; \
         print a.m();",
        "method\nfield\n",
    );
}

#[test]
fn extracted_methods_stay_bound() {
    assert_output(
        "class Person { init(name) { this.name = name; } \
                        greet() { return \"hi \" + this.name; } } \
         var p = Person(\"x\"); \
         var m = p.greet; \
         print m();",
        "hi x\n",
    );
}

#[test]
fn unknown_property_fails() {
    assert_runtime_error(
        "class A {} var a = A(); a.missing;",
        "No such property found: 'missing'.",
    );
}

#[test]
fn setting_a_field_on_a_non_instance_fails() {
    assert_runtime_error("var x = 1; x.y = 2;", "Only instances have fields.");
}

#[test]
fn reading_a_property_on_a_non_instance_fails() {
    assert_runtime_error("var x = 1; x.y;", "Only instances have properties.");
}

#[test]
fn methods_inherit_through_the_superclass_chain() {
    assert_output(
        "class A { init(n) { this.n = n; } } \
         class B < A { show() { print this.n; } } \
         var b = B(7); b.show();",
        "7\n",
    );
}

#[test]
fn subclass_methods_override() {
    assert_output(
        "class A { m() { return \"A\"; } } \
         class B < A { m() { return \"B\"; } } \
         print B().m(); print A().m();",
        "B\nA\n",
    );
}

#[test]
fn class_methods_dispatch_on_the_class_value() {
    assert_output(
        "class Math { class square(n) { return n * n; } } \
         print Math.square(3);",
        "9\n",
    );
}

#[test]
fn class_methods_are_inherited() {
    assert_output(
        "class A { class hello() { return \"hi\"; } } \
         class B < A {} \
         print B.hello();",
        "hi\n",
    );
}

#[test]
fn unknown_class_method_fails() {
    assert_runtime_error(
        "class A {} A.nope();",
        "No such static method found: nope.",
    );
}

#[test]
fn superclass_must_be_a_class() {
    assert_runtime_error(
        "var NotClass = 1; class B < NotClass {}",
        "Superclass must be a class.",
    );
}

// ─────────────────────────────────────────────────────────────────────────
// Pipeline behavior
// ─────────────────────────────────────────────────────────────────────────

#[test]
fn compile_errors_suppress_execution() {
    let run = run_source("print \"reached\"; print 1");

    assert!(run.had_error);
    assert_eq!(run.output, "");
}

#[test]
fn resolver_errors_suppress_execution() {
    let run = run_source("print \"reached\"; break;");

    assert!(run.had_error);
    assert_eq!(run.output, "");
}

#[test]
fn runtime_errors_stop_the_program() {
    let run = run_source("print 1; print x; print 2;");

    assert!(run.had_runtime_error);
    assert_eq!(run.output, "1\n");
}

#[test]
fn runtime_error_format_carries_the_line() {
    let run = run_source("print 1;\nprint x;");

    assert!(run
        .diagnostics
        .iter()
        .any(|d| d.contains("Undefined variable 'x'.") && d.contains("[line 2]")));
}

#[test]
fn state_persists_across_pipeline_runs() {
    // The REPL drives the pipeline once per line over one interpreter.
    let mut out: Vec<u8> = Vec::new();
    let mut reporter = Reporter::new();

    {
        let mut interpreter = Interpreter::new(&mut out);

        runic::run("var a = 1; fun bump() { a = a + 1; }", &mut interpreter, &mut reporter);
        reporter.clear();

        runic::run("bump(); print a;", &mut interpreter, &mut reporter);
    }

    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(String::from_utf8(out).unwrap(), "2\n");
}

#[test]
fn errors_clear_between_pipeline_runs() {
    let mut out: Vec<u8> = Vec::new();
    let mut reporter = Reporter::new();

    {
        let mut interpreter = Interpreter::new(&mut out);

        runic::run("print oops;", &mut interpreter, &mut reporter);
        assert!(reporter.had_runtime_error());
        reporter.clear();

        runic::run("print \"recovered\";", &mut interpreter, &mut reporter);
    }

    assert!(!reporter.had_error() && !reporter.had_runtime_error());
    assert_eq!(String::from_utf8(out).unwrap(), "recovered\n");
}
