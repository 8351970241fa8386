//! Parser tests: golden prefix-form strings for precedence and
//! associativity, the `for` desugaring, and diagnostic behavior.

use runic::ast::Stmt;
use runic::ast_printer::AstPrinter;
use runic::error::Reporter;
use runic::parser::Parser;
use runic::scanner::Scanner;

fn parse(source: &str) -> (Vec<Stmt>, Reporter) {
    let mut reporter = Reporter::new();
    let tokens = Scanner::new(source).scan_tokens(&mut reporter);
    let statements = Parser::new(tokens, &mut reporter).parse();

    (statements, reporter)
}

/// Parse a single statement and render it in prefix form.
fn printed(source: &str) -> String {
    let (statements, reporter) = parse(source);

    assert!(
        !reporter.had_error(),
        "unexpected diagnostics: {:?}",
        reporter.diagnostics()
    );
    assert_eq!(statements.len(), 1, "expected exactly one statement");

    AstPrinter::print_stmt(&statements[0])
}

fn diagnostics_of(source: &str) -> Vec<String> {
    let (_, reporter) = parse(source);

    reporter.diagnostics().to_vec()
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(printed("1 + 2 * 3;"), "(; (+ 1.0 (* 2.0 3.0)))");
}

#[test]
fn unary_binds_tighter_than_multiplication() {
    assert_eq!(printed("-1 * 2;"), "(; (* (- 1.0) 2.0))");
}

#[test]
fn unary_is_right_associative() {
    assert_eq!(printed("!!true;"), "(; (! (! true)))");
}

#[test]
fn addition_is_left_associative() {
    assert_eq!(printed("1 - 2 - 3;"), "(; (- (- 1.0 2.0) 3.0))");
}

#[test]
fn comparison_binds_tighter_than_equality() {
    assert_eq!(printed("1 < 2 == true;"), "(; (== (< 1.0 2.0) true))");
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(printed("(1 + 2) * 3;"), "(; (* (group (+ 1.0 2.0)) 3.0))");
}

#[test]
fn logical_or_is_lower_than_and() {
    assert_eq!(printed("a or b and c;"), "(; (or a (and b c)))");
}

#[test]
fn ternary_is_right_associative() {
    assert_eq!(
        printed("a ? b : c ? d : e;"),
        "(; (?: a b (?: c d e)))"
    );
}

#[test]
fn ternary_middle_parses_at_full_expression_precedence() {
    assert_eq!(printed("a ? b, c : d;"), "(; (?: a (, b c) d))");
}

#[test]
fn comma_is_left_associative_and_lowest() {
    assert_eq!(printed("1, 2, 3;"), "(; (, (, 1.0 2.0) 3.0))");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(printed("a = b = c;"), "(; (= a (= b c)))");
}

#[test]
fn assignment_binds_lower_than_ternary() {
    assert_eq!(printed("a = b ? c : d;"), "(; (= a (?: b c d)))");
}

#[test]
fn call_and_member_access_chain_left() {
    assert_eq!(printed("a.b(1).c;"), "(; (. (call (. a b) 1.0) c))");
}

#[test]
fn property_assignment_becomes_set() {
    assert_eq!(printed("a.b = 2;"), "(; (.= a b 2.0))");
}

#[test]
fn call_arguments_stay_separate_despite_comma_operator() {
    assert_eq!(printed("f(1, 2);"), "(; (call f 1.0 2.0))");
}

#[test]
fn lambda_expression() {
    assert_eq!(
        printed("var f = lambda (x) { return x; };"),
        "(var f (lambda (x)))"
    );
}

#[test]
fn class_declaration_with_superclass() {
    assert_eq!(
        printed("class A < B { m() {} class s() {} }"),
        "(class A < B)"
    );
}

#[test]
fn for_desugars_to_while_in_a_block() {
    assert_eq!(
        printed("for (var i = 0; i < 3; i = i + 1) print i;"),
        "(block (var i 0.0) (while (< i 3.0) (block (print i) (; (= i (+ i 1.0))))))"
    );
}

#[test]
fn for_with_all_clauses_missing() {
    assert_eq!(printed("for (;;) break;"), "(while true (break))");
}

#[test]
fn for_without_increment_keeps_plain_body() {
    assert_eq!(
        printed("for (; a;) print a;"),
        "(while a (print a))"
    );
}

#[test]
fn if_with_else() {
    assert_eq!(
        printed("if (a) print 1; else print 2;"),
        "(if a (print 1.0) (print 2.0))"
    );
}

#[test]
fn invalid_assignment_target_is_reported_without_aborting() {
    let (statements, reporter) = parse("1 = 2; print 3;");

    assert!(reporter.had_error());
    assert!(reporter.diagnostics()[0].contains("Invalid assignment target."));

    // Parsing continued past the bad statement.
    assert_eq!(statements.len(), 2);
}

#[test]
fn leading_binary_operator_is_diagnosed() {
    let diagnostics = diagnostics_of("* 2;");

    assert!(diagnostics
        .iter()
        .any(|d| d.contains("Expected a left operand.")));
}

#[test]
fn leading_equality_operator_is_diagnosed() {
    let diagnostics = diagnostics_of("== 2;");

    assert!(diagnostics
        .iter()
        .any(|d| d.contains("Expected a left operand.")));
}

#[test]
fn leading_minus_is_legal_unary() {
    assert_eq!(printed("-2;"), "(; (- 2.0))");
}

#[test]
fn argument_limit_is_enforced() {
    let args: Vec<String> = (0..33).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    let diagnostics = diagnostics_of(&source);

    assert!(diagnostics
        .iter()
        .any(|d| d.contains("Cannot have more than 32 arguments.")));
}

#[test]
fn parameter_limit_is_enforced() {
    let params: Vec<String> = (0..33).map(|i| format!("p{}", i)).collect();
    let source = format!("fun f({}) {{}}", params.join(", "));

    let diagnostics = diagnostics_of(&source);

    assert!(diagnostics
        .iter()
        .any(|d| d.contains("Cannot have more than 32 parameters.")));
}

#[test]
fn thirty_two_arguments_are_fine() {
    let args: Vec<String> = (0..32).map(|i| i.to_string()).collect();
    let source = format!("f({});", args.join(", "));

    let (_, reporter) = parse(&source);

    assert!(!reporter.had_error());
}

#[test]
fn recovery_resumes_at_the_next_statement() {
    let (statements, reporter) = parse("var = 1; print 2;");

    assert!(reporter.had_error());
    assert!(reporter.diagnostics()[0].contains("Expect variable name."));

    // The print statement after the bad declaration still parses.
    assert_eq!(statements.len(), 1);
    assert_eq!(AstPrinter::print_stmt(&statements[0]), "(print 2.0)");
}

#[test]
fn error_at_eof_reports_at_end() {
    let diagnostics = diagnostics_of("print 1");

    assert!(diagnostics[0].contains("at end"));
    assert!(diagnostics[0].contains("Expect ';' after value."));
}

#[test]
fn missing_colon_in_ternary_is_reported() {
    let diagnostics = diagnostics_of("a ? b;");

    assert!(diagnostics
        .iter()
        .any(|d| d.contains("Expect ':' in conditional expression.")));
}

#[test]
fn super_has_no_expression_form() {
    let diagnostics = diagnostics_of("super.m();");

    assert!(diagnostics.iter().any(|d| d.contains("Expect expression.")));
}

#[test]
fn parse_always_yields_a_statement_list() {
    let (statements, reporter) = parse("fun (broken; var ok = 1;");

    assert!(reporter.had_error());

    // Partial output rather than nothing.
    assert_eq!(statements.len(), 1);
}
