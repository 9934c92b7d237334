use std::fs;
use std::io::{self, Write};
use std::path::Path;

use log::info;
use rustyline::error::ReadlineError;
use rustyline::Editor;

use crate::error::Result;
use crate::expr::ExprId;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// The front door: owns the long-lived interpreter and the error flags
/// that drive exit codes.
///
/// One instance serves a whole REPL session, so global bindings, the
/// resolver side table, and the expression-id watermark all persist from
/// line to line.  Scanner, parser and resolver instances are per-input.
pub struct Lox<W: Write> {
    interpreter: Interpreter<W>,
    next_expr_id: ExprId,
    had_error: bool,
    had_runtime_error: bool,
}

impl Lox<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Lox<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Lox<W> {
    pub fn with_output(output: W) -> Self {
        Lox {
            interpreter: Interpreter::with_output(output),
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Hand back the interpreter's output sink (a test's capture buffer).
    pub fn into_output(self) -> W {
        self.interpreter.into_output()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Run a script file once.  Raw bytes go straight to the scanner; only
    /// ASCII is significant outside string literals.
    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        let source = fs::read(path)?;

        info!("Running file {:?} ({} bytes)", path, source.len());

        self.run(&source);

        Ok(())
    }

    /// Interactive session: one pipeline run per line, with the error flag
    /// reset so a typo doesn't poison the rest of the session.
    pub fn run_prompt(&mut self) {
        let mut editor = Editor::<()>::new();

        loop {
            match editor.readline("> ") {
                Ok(line) => {
                    editor.add_history_entry(line.as_str());

                    self.run(line.as_bytes());

                    self.had_error = false;
                }

                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,

                Err(e) => {
                    eprintln!("{}", e);
                    break;
                }
            }
        }
    }

    /// The full pipeline over one source buffer.  Every diagnostic goes to
    /// stderr; the interpreter only runs when scanning, parsing and
    /// resolution all came back clean.
    pub fn run(&mut self, source: &[u8]) {
        let mut tokens: Vec<Token> = Vec::new();

        for result in Scanner::new(source) {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => {
                    eprintln!("{}", e);
                    self.had_error = true;
                }
            }
        }

        let mut parser = Parser::new(tokens, self.next_expr_id);
        let parsed = parser.parse();
        self.next_expr_id = parser.next_id();

        let statements = match parsed {
            Ok(statements) => statements,

            Err(errors) => {
                for e in &errors {
                    eprintln!("{}", e);
                }

                self.had_error = true;
                return;
            }
        };

        if self.had_error {
            return;
        }

        let mut resolver = Resolver::new(&mut self.interpreter);

        if let Err(errors) = resolver.resolve(&statements) {
            for e in &errors {
                eprintln!("{}", e);
            }

            self.had_error = true;
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            eprintln!("{}", e);
            self.had_runtime_error = true;
        }
    }
}
