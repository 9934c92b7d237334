mod common;

use common::{parse, parse_errors};

use rlox::ast_printer::AstPrinter;
use rlox::expr::Expr;
use rlox::stmt::Stmt;

/// Parse a single expression statement and render it in prefix form.
fn print_expression(source: &str) -> String {
    let statements = parse(source);

    match &statements[..] {
        [Stmt::Expression(expr)] => AstPrinter.print(expr),
        other => panic!("expected a single expression statement, got {:?}", other),
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(print_expression("1 + 2 * 3;"), "(+ 1.0 (* 2.0 3.0))");
}

#[test]
fn unary_binds_tighter_than_factor() {
    assert_eq!(print_expression("-1 * 2;"), "(* (- 1.0) 2.0)");
    assert_eq!(print_expression("!!true;"), "(! (! true))");
}

#[test]
fn comparison_binds_tighter_than_equality() {
    assert_eq!(
        print_expression("1 < 2 == 3 >= 4;"),
        "(== (< 1.0 2.0) (>= 3.0 4.0))"
    );
}

#[test]
fn logical_operators_nest_or_over_and() {
    assert_eq!(
        print_expression("a or b and c;"),
        "(or a (and b c))"
    );
}

#[test]
fn grouping_overrides_precedence() {
    assert_eq!(print_expression("(1 + 2) * 3;"), "(* (group (+ 1.0 2.0)) 3.0)");
}

#[test]
fn assignment_is_right_associative() {
    assert_eq!(print_expression("a = b = 1;"), "(= a (= b 1.0))");
}

#[test]
fn calls_and_property_chains() {
    assert_eq!(
        print_expression("f(1)(2).field.method(3);"),
        "(call (. (. (call (call f 1.0) 2.0) field) method) 3.0)"
    );
}

#[test]
fn set_expression_from_property_assignment() {
    assert_eq!(
        print_expression("point.x = 1;"),
        "(= (. point x) 1.0)"
    );
}

#[test]
fn for_desugars_to_init_while_increment() {
    let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;");

    // Block [ Var, While(cond, Block[ Print, Expression(increment) ]) ]
    let outer = match &statements[..] {
        [Stmt::Block(outer)] => outer,
        other => panic!("expected outer block, got {:?}", other),
    };

    assert!(matches!(outer[0], Stmt::Var { .. }));

    let (condition, body) = match &outer[1] {
        Stmt::While { condition, body } => (condition, body),
        other => panic!("expected while, got {:?}", other),
    };

    assert_eq!(AstPrinter.print(condition), "(< i 3.0)");

    match body.as_ref() {
        Stmt::Block(inner) => {
            assert!(matches!(inner[0], Stmt::Print(_)));
            assert!(matches!(inner[1], Stmt::Expression(Expr::Assign { .. })));
        }
        other => panic!("expected desugared body block, got {:?}", other),
    }
}

#[test]
fn for_without_condition_loops_on_true() {
    let statements = parse("for (;;) print 1;");

    match &statements[..] {
        [Stmt::While { condition, .. }] => {
            assert_eq!(AstPrinter.print(condition), "true");
        }
        other => panic!("expected bare while, got {:?}", other),
    }
}

#[test]
fn class_declaration_with_superclass_and_methods() {
    let statements = parse("class B < A { method() { return 1; } init(x) {} }");

    match &statements[..] {
        [Stmt::Class {
            name,
            superclass,
            methods,
        }] => {
            assert_eq!(name.lexeme, "B");
            assert!(matches!(superclass, Some(Expr::Variable { .. })));
            assert_eq!(methods.len(), 2);
            assert_eq!(methods[0].name.lexeme, "method");
            assert_eq!(methods[1].name.lexeme, "init");
            assert_eq!(methods[1].params.len(), 1);
        }
        other => panic!("expected class declaration, got {:?}", other),
    }
}

#[test]
fn missing_semicolon_is_located_at_the_offending_token() {
    let errors = parse_errors("print 1\nprint 2;");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 2] Error at 'print': Expect ';' after value."
    );
}

#[test]
fn error_at_end_of_input() {
    let errors = parse_errors("print 1");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at end: Expect ';' after value."
    );
}

#[test]
fn synchronization_collects_multiple_errors() {
    let errors = parse_errors("var = 1;\nprint 2;\nvar = 3;");

    assert_eq!(errors.len(), 2);

    for e in &errors {
        assert!(e.to_string().contains("Expect variable name."), "{}", e);
    }
}

#[test]
fn invalid_assignment_target_reports_without_unwinding() {
    let errors = parse_errors("1 + 2 = 3;");

    assert_eq!(errors.len(), 1);
    assert_eq!(
        errors[0].to_string(),
        "[line 1] Error at '=': Invalid assignment target."
    );
}

#[test]
fn more_than_255_arguments_is_reported() {
    let arguments = (0..=255)
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let source = format!("f({});", arguments);

    let errors = parse_errors(&source);

    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("Can't have more than 255 arguments."));
}

#[test]
fn more_than_255_parameters_is_reported() {
    let params = (0..=255)
        .map(|i| format!("p{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let source = format!("fun f({}) {{}}", params);

    let errors = parse_errors(&source);

    assert_eq!(errors.len(), 1);
    assert!(errors[0]
        .to_string()
        .contains("Can't have more than 255 parameters."));
}

#[test]
fn same_tokens_parse_to_the_same_tree() {
    let a = format!("{:?}", parse("fun f(a, b) { return a + b; } print f(1, 2);"));
    let b = format!("{:?}", parse("fun f(a, b) { return a + b; } print f(1, 2);"));

    assert_eq!(a, b);
}
