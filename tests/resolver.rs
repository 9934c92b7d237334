mod common;

use common::resolve_errors;

fn expect_single_error(source: &str, message: &str) {
    let errors = resolve_errors(source);

    assert_eq!(errors.len(), 1, "errors: {:?}", errors);
    assert_eq!(errors[0].to_string(), message);
}

#[test]
fn local_self_reference_in_initializer_is_rejected() {
    expect_single_error(
        "{ var a = a; }",
        "[line 1] Error at 'a': Can't read local variable in its own initializer.",
    );
}

#[test]
fn global_self_reference_is_not_a_static_error() {
    // Globals are late-bound; the resolver leaves them alone.
    assert!(resolve_errors("var a = a;").is_empty());
}

#[test]
fn shadowed_outer_variable_does_not_trip_the_initializer_check() {
    assert!(resolve_errors("var a = 1; { var b = a; }").is_empty());
}

#[test]
fn redeclaration_in_the_same_local_scope_is_rejected() {
    expect_single_error(
        "{ var a = 1; var a = 2; }",
        "[line 1] Error at 'a': Already a variable with this name in this scope.",
    );
}

#[test]
fn redeclaration_at_global_scope_is_allowed() {
    assert!(resolve_errors("var a = 1; var a = 2;").is_empty());
}

#[test]
fn duplicate_parameter_names_are_rejected() {
    expect_single_error(
        "fun f(a, a) {}",
        "[line 1] Error at 'a': Already a variable with this name in this scope.",
    );
}

#[test]
fn top_level_return_is_rejected() {
    expect_single_error(
        "return 1;",
        "[line 1] Error at 'return': Can't return from top-level code.",
    );
}

#[test]
fn return_inside_a_function_is_fine() {
    assert!(resolve_errors("fun f() { return 1; }").is_empty());
}

#[test]
fn returning_a_value_from_an_initializer_is_rejected() {
    expect_single_error(
        "class C { init() { return 1; } }",
        "[line 1] Error at 'return': Can't return a value from an initializer.",
    );
}

#[test]
fn bare_return_in_an_initializer_is_fine() {
    assert!(resolve_errors("class C { init() { return; } }").is_empty());
}

#[test]
fn this_outside_a_class_is_rejected() {
    expect_single_error(
        "print this;",
        "[line 1] Error at 'this': Can't use 'this' outside of a class.",
    );
}

#[test]
fn this_in_a_standalone_function_is_rejected() {
    expect_single_error(
        "fun f() { return this; }",
        "[line 1] Error at 'this': Can't use 'this' outside of a class.",
    );
}

#[test]
fn super_outside_a_class_is_rejected() {
    expect_single_error(
        "print super.method;",
        "[line 1] Error at 'super': Can't use 'super' outside of a class.",
    );
}

#[test]
fn super_without_a_superclass_is_rejected() {
    expect_single_error(
        "class C { method() { super.method(); } }",
        "[line 1] Error at 'super': Can't use 'super' in a class with no superclass.",
    );
}

#[test]
fn class_inheriting_from_itself_is_rejected() {
    expect_single_error(
        "class Oops < Oops {}",
        "[line 1] Error at 'Oops': A class can't inherit from itself.",
    );
}

#[test]
fn all_violations_are_collected_in_one_pass() {
    let errors = resolve_errors("return 1;\nprint this;\n{ var a = 1; var a = 2; }");

    assert_eq!(errors.len(), 3);
    assert!(errors[0].to_string().contains("Can't return from top-level code."));
    assert!(errors[1].to_string().contains("Can't use 'this' outside of a class."));
    assert!(errors[2]
        .to_string()
        .contains("Already a variable with this name in this scope."));
}

#[test]
fn methods_may_share_names_with_locals_elsewhere() {
    let source = "
        class Stack {
            push(x) { this.top = x; }
            pop() { return this.top; }
        }
        var push = 1;
        print push;
    ";

    assert!(resolve_errors(source).is_empty());
}
