use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;

use crate::callable::LoxFunction;
use crate::class::{LoxClass, LoxInstance};
use crate::environment::Environment;
use crate::error::{LoxError, Result};
use crate::expr::{Expr, ExprId};
use crate::stmt::Stmt;
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Non-local exits threaded through the `Err` channel.
///
/// `Return` unwinds an arbitrary number of `execute`/`evaluate` frames and
/// terminates at the nearest enclosing `LoxFunction::call`; `Error` keeps
/// unwinding to `interpret`.  `execute_block` restores the environment on
/// both paths.
#[derive(Debug)]
pub(crate) enum Unwind {
    Return(Value),
    Error(LoxError),
}

impl From<LoxError> for Unwind {
    fn from(error: LoxError) -> Self {
        Unwind::Error(error)
    }
}

impl From<io::Error> for Unwind {
    fn from(error: io::Error) -> Self {
        Unwind::Error(LoxError::Io(error))
    }
}

impl Unwind {
    fn into_error(self) -> LoxError {
        match self {
            Unwind::Error(e) => e,

            // The resolver rejects top-level `return`.
            Unwind::Return(_) => unreachable!("return unwound past every function call"),
        }
    }
}

/// Tree-walking evaluator.
///
/// Long-lived: the driver keeps one instance across REPL lines so globals
/// and the resolver's side table persist.  Output is `Write`-generic so
/// tests capture `print` instead of reading the process's stdout.
pub struct Interpreter<W: Write> {
    globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
    output: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(output: W) -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));

        globals.borrow_mut().define(
            "clock",
            Value::NativeFunction {
                name: "clock",
                arity: 0,
                func: clock_native,
            },
        );

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output,
        }
    }

    /// Hand back the output sink (a test's capture buffer).
    pub fn into_output(self) -> W {
        self.output
    }

    /// Resolver callback: this expression binds `depth` frames up from its
    /// use site.  Unrecorded expressions resolve against globals.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        debug!("Noting local: id={}, depth={}", id, depth);
        self.locals.insert(id, depth);
    }

    /// Run a resolved program.  The first runtime error aborts execution.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for statement in statements {
            if let Err(unwind) = self.execute(statement) {
                return Err(unwind.into_error());
            }
        }

        Ok(())
    }

    // ── Statement execution ─────────────────────────────────────────────

    fn execute(&mut self, stmt: &Stmt) -> std::result::Result<(), Unwind> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;

                Ok(())
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                writeln!(self.output, "{}", value)?;

                Ok(())
            }

            Stmt::Var { name, initializer } => {
                let value: Value = if let Some(expr) = initializer {
                    self.evaluate(expr)?
                } else {
                    Value::Nil
                };

                self.environment.borrow_mut().define(&name.lexeme, value);

                Ok(())
            }

            Stmt::Block(statements) => self.execute_block(
                statements,
                Environment::with_enclosing(Rc::clone(&self.environment)),
            ),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)?;
                }

                Ok(())
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }

            Stmt::Function(declaration) => {
                // The closure captures the environment current at the
                // declaration, not at the call.
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));

                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Err(Unwind::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // Two-stage binding: the name exists (as nil) while the
                // superclass and methods are evaluated, then the finished
                // class is assigned over it.
                self.environment
                    .borrow_mut()
                    .define(&name.lexeme, Value::Nil);

                let superclass_value = match superclass {
                    Some(expr) => match self.evaluate(expr)? {
                        Value::Class(class) => Some(class),

                        _ => {
                            let line = match expr {
                                Expr::Variable { name, .. } => name.line,
                                _ => name.line,
                            };

                            return Err(LoxError::runtime(line, "Superclass must be a class.")
                                .into());
                        }
                    },

                    None => None,
                };

                let method_closure = match &superclass_value {
                    Some(superclass) => {
                        let mut environment =
                            Environment::with_enclosing(Rc::clone(&self.environment));
                        environment.define("super", Value::Class(Rc::clone(superclass)));
                        Rc::new(RefCell::new(environment))
                    }

                    None => Rc::clone(&self.environment),
                };

                let mut method_map: HashMap<String, LoxFunction> = HashMap::new();

                for method in methods {
                    let is_initializer = method.name.lexeme == "init";

                    method_map.insert(
                        method.name.lexeme.clone(),
                        LoxFunction::new(
                            Rc::clone(method),
                            Rc::clone(&method_closure),
                            is_initializer,
                        ),
                    );
                }

                let class = LoxClass::new(name.lexeme.clone(), superclass_value, method_map);

                self.environment.borrow_mut().assign(
                    &name.lexeme,
                    Value::Class(Rc::new(class)),
                    name.line,
                )?;

                Ok(())
            }
        }
    }

    /// Execute `statements` in `environment`, restoring the previous
    /// environment on every exit path — normal completion, `return`
    /// unwinds, and runtime errors alike.
    pub(crate) fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Environment,
    ) -> std::result::Result<(), Unwind> {
        let previous: Rc<RefCell<Environment>> = Rc::clone(&self.environment);

        self.environment = Rc::new(RefCell::new(environment));

        let mut result = Ok(());

        for statement in statements {
            result = self.execute(statement);

            if result.is_err() {
                break;
            }
        }

        self.environment = previous;

        result
    }

    // ── Expression evaluation ───────────────────────────────────────────

    fn evaluate(&mut self, expr: &Expr) -> std::result::Result<Value, Unwind> {
        match expr {
            Expr::Literal(token) => Ok(self.evaluate_literal(token)?),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => self.evaluate_logical(left, operator, right),

            Expr::Variable { id, name } => Ok(self.look_up_variable(*id, name)?),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => self.environment.borrow_mut().assign_at(
                        distance,
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,

                    None => self.globals.borrow_mut().assign(
                        &name.lexeme,
                        value.clone(),
                        name.line,
                    )?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => self.evaluate_call(callee, paren, arguments),

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => Ok(LoxInstance::get(&instance, name)?),

                _ => Err(LoxError::runtime(name.line, "Only instances have properties.").into()),
            },

            Expr::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                Value::Instance(instance) => {
                    let value = self.evaluate(value)?;

                    instance.borrow_mut().set(&name.lexeme, value.clone());

                    Ok(value)
                }

                _ => Err(LoxError::runtime(name.line, "Only instances have fields.").into()),
            },

            Expr::This { id, keyword } => Ok(self.look_up_variable(*id, keyword)?),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_literal(&self, token: &Token) -> Result<Value> {
        match &token.token_type {
            TokenType::NUMBER(n) => Ok(Value::Number(*n)),

            TokenType::STRING(s) => Ok(Value::String(s.clone())),

            TokenType::TRUE => Ok(Value::Bool(true)),

            TokenType::FALSE => Ok(Value::Bool(false)),

            TokenType::NIL => Ok(Value::Nil),

            _ => Err(LoxError::runtime(token.line, "Invalid literal.")),
        }
    }

    fn evaluate_unary(
        &mut self,
        operator: &Token,
        right: &Expr,
    ) -> std::result::Result<Value, Unwind> {
        let value: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match value {
                Value::Number(n) => Ok(Value::Number(-n)),

                _ => Err(LoxError::runtime(operator.line, "Operand must be a number.").into()),
            },

            TokenType::BANG => Ok(Value::Bool(!value.is_truthy())),

            _ => Err(LoxError::runtime(operator.line, "Invalid unary operator.").into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> std::result::Result<Value, Unwind> {
        // Strictly left before right.
        let left_val: Value = self.evaluate(left)?;
        let right_val: Value = self.evaluate(right)?;

        match operator.token_type {
            TokenType::PLUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),

                (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),

                _ => Err(LoxError::runtime(
                    operator.line,
                    "Operands must be two numbers or two strings.",
                )
                .into()),
            },

            TokenType::MINUS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a - b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::STAR => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a * b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::SLASH => match (left_val, right_val) {
                // IEEE-754 semantics; dividing by zero yields an infinity.
                (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a / b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::GREATER => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a > b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::GREATER_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a >= b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::LESS => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a < b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::LESS_EQUAL => match (left_val, right_val) {
                (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(a <= b)),

                _ => Err(numbers_required(operator)),
            },

            TokenType::EQUAL_EQUAL => Ok(Value::Bool(left_val.lox_eq(&right_val))),

            TokenType::BANG_EQUAL => Ok(Value::Bool(!left_val.lox_eq(&right_val))),

            _ => Err(LoxError::runtime(operator.line, "Invalid binary operator.").into()),
        }
    }

    /// `and`/`or` short-circuit and yield the deciding operand itself, not
    /// a coerced boolean.
    fn evaluate_logical(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> std::result::Result<Value, Unwind> {
        let left_val: Value = self.evaluate(left)?;

        match operator.token_type {
            TokenType::OR => {
                if left_val.is_truthy() {
                    return Ok(left_val);
                }
            }

            _ => {
                if !left_val.is_truthy() {
                    return Ok(left_val);
                }
            }
        }

        self.evaluate(right)
    }

    fn evaluate_call(
        &mut self,
        callee: &Expr,
        paren: &Token,
        arguments: &[Expr],
    ) -> std::result::Result<Value, Unwind> {
        let callee_val = self.evaluate(callee)?;

        let mut args: Vec<Value> = Vec::with_capacity(arguments.len());

        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        match callee_val {
            Value::Function(function) => {
                check_arity(paren, function.arity(), args.len())?;

                Ok(function.call(self, args)?)
            }

            Value::Class(class) => {
                check_arity(paren, class.arity(), args.len())?;

                Ok(LoxClass::call(&class, self, args)?)
            }

            Value::NativeFunction { arity, func, .. } => {
                check_arity(paren, arity, args.len())?;

                Ok(func(&args)?)
            }

            _ => Err(
                LoxError::runtime(paren.line, "Can only call functions and classes.").into(),
            ),
        }
    }

    fn evaluate_super(
        &mut self,
        id: ExprId,
        keyword: &Token,
        method: &Token,
    ) -> std::result::Result<Value, Unwind> {
        let distance = match self.locals.get(&id) {
            Some(&distance) => distance,

            None => {
                return Err(LoxError::runtime(keyword.line, "Undefined variable 'super'.").into())
            }
        };

        let superclass = self
            .environment
            .borrow()
            .get_at(distance, "super", keyword.line)?;

        // The resolver nests the `this` scope directly inside `super`.
        let object = self
            .environment
            .borrow()
            .get_at(distance - 1, "this", keyword.line)?;

        match (superclass, object) {
            (Value::Class(superclass), Value::Instance(instance)) => {
                match superclass.find_method(&method.lexeme) {
                    Some(found) => Ok(Value::Function(Rc::new(found.bind(instance)))),

                    None => Err(LoxError::runtime(
                        method.line,
                        format!("Undefined property '{}'.", method.lexeme),
                    )
                    .into()),
                }
            }

            _ => Err(LoxError::runtime(keyword.line, "Undefined variable 'super'.").into()),
        }
    }

    /// The resolver's dichotomy: distance-indexed local access when a
    /// depth was recorded, plain global lookup otherwise.
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => self
                .environment
                .borrow()
                .get_at(distance, &name.lexeme, name.line),

            None => self.globals.borrow().get(&name.lexeme, name.line),
        }
    }
}

fn numbers_required(operator: &Token) -> Unwind {
    LoxError::runtime(operator.line, "Operands must be numbers.").into()
}

fn check_arity(paren: &Token, expected: usize, got: usize) -> Result<()> {
    if expected != got {
        return Err(LoxError::runtime(
            paren.line,
            format!("Expected {} arguments but got {}.", expected, got),
        ));
    }

    Ok(())
}

fn clock_native(_args: &[Value]) -> Result<Value> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| LoxError::runtime(0, format!("Clock error: {}", e)))?
        .as_secs_f64();

    Ok(Value::Number(timestamp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn statements(source: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(source.as_bytes())
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        Parser::new(tokens, 0).parse().unwrap()
    }

    fn resolved_interpreter(program: &[Stmt]) -> Interpreter<Vec<u8>> {
        let mut interpreter = Interpreter::with_output(Vec::new());
        Resolver::new(&mut interpreter).resolve(program).unwrap();
        interpreter
    }

    #[test]
    fn environment_is_restored_when_a_block_errors() {
        let program = statements("var a = 1; { var a = 2; print missing; }");
        let mut interpreter = resolved_interpreter(&program);

        assert!(interpreter.interpret(&program).is_err());

        // Back at the globals frame, with the outer binding intact.
        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));
        let value = interpreter.globals.borrow().get("a", 1).unwrap();
        assert!(matches!(value, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn environment_is_restored_when_return_unwinds_nested_blocks() {
        let program = statements("fun f() { { { return 7; } } } var r = f();");
        let mut interpreter = resolved_interpreter(&program);

        interpreter.interpret(&program).unwrap();

        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));
        let value = interpreter.globals.borrow().get("r", 1).unwrap();
        assert!(matches!(value, Value::Number(n) if n == 7.0));
    }

    #[test]
    fn locals_table_routes_lookups_past_shadowing_globals() {
        // The inner function resolves `x` to the enclosing function frame,
        // not to the global `x` defined later.
        let program = statements(
            "fun outer() { var x = 1; fun inner() { return x; } return inner; } \
             var f = outer(); var x = 99; var got = f();",
        );
        let mut interpreter = resolved_interpreter(&program);

        interpreter.interpret(&program).unwrap();

        let value = interpreter.globals.borrow().get("got", 1).unwrap();
        assert!(matches!(value, Value::Number(n) if n == 1.0));
    }
}
