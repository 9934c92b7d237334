#![allow(dead_code)]

use rlox::error::LoxError;
use rlox::interpreter::Interpreter;
use rlox::parser::Parser;
use rlox::resolver::Resolver;
use rlox::scanner::Scanner;
use rlox::stmt::Stmt;
use rlox::token::Token;

/// Scan a source string, failing the test on any lexical error.
pub fn scan(source: &str) -> Vec<Token> {
    Scanner::new(source.as_bytes())
        .collect::<Result<Vec<_>, _>>()
        .expect("unexpected lexical error")
}

/// Scan and parse, failing the test on any syntax error.
pub fn parse(source: &str) -> Vec<Stmt> {
    let mut parser = Parser::new(scan(source), 0);
    parser.parse().expect("unexpected syntax error")
}

/// Full pipeline with captured output; any runtime error fails the test.
pub fn run(source: &str) -> String {
    let (output, result) = try_run(source);

    if let Err(e) = result {
        panic!("unexpected runtime error: {}", e);
    }

    output
}

/// Full pipeline with captured output, returning the interpreter's verdict
/// so tests can assert on runtime error text.
pub fn try_run(source: &str) -> (String, Result<(), LoxError>) {
    let statements = parse(source);

    let mut interpreter = Interpreter::with_output(Vec::new());

    let mut resolver = Resolver::new(&mut interpreter);
    resolver
        .resolve(&statements)
        .expect("unexpected resolve error");

    let result = interpreter.interpret(&statements);

    let output = String::from_utf8(interpreter.into_output()).expect("output is not UTF-8");

    (output, result)
}

/// Run just the static passes, returning every resolution error.
pub fn resolve_errors(source: &str) -> Vec<LoxError> {
    let statements = parse(source);

    let mut interpreter = Interpreter::with_output(Vec::new());
    let mut resolver = Resolver::new(&mut interpreter);

    match resolver.resolve(&statements) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    }
}

/// Scan and parse, returning every syntax error.
pub fn parse_errors(source: &str) -> Vec<LoxError> {
    let mut parser = Parser::new(scan(source), 0);

    match parser.parse() {
        Ok(_) => Vec::new(),
        Err(errors) => errors,
    }
}
