//! Static resolution pass.
//!
//! A single AST walk that:
//! 1. **Builds lexical scopes**: maintains a stack of `HashMap<String, bool>`
//!    tracking declared (`false`) and fully defined (`true`) names in each
//!    nested block or function.
//! 2. **Enforces static rules**: redeclaration in the same scope, reading a
//!    variable in its own initializer, `return` outside functions, returning
//!    a value from `init`, and illegal `this`/`super` placement.
//! 3. **Records binding distances**: for every resolvable occurrence
//!    (`Variable`, `Assign`, `This`, `Super`), calls back into the
//!    interpreter to note the lexical depth of the binding, so the runtime
//!    can climb exactly that many environment frames instead of searching.
//!
//! Errors accumulate; the pass never stops early, so one run reports every
//! violation in the input.  The caller gates execution on the result.

use std::collections::HashMap;
use std::io::Write;
use std::mem;

use log::{debug, info};

use crate::error::LoxError;
use crate::expr::{Expr, ExprId};
use crate::interpreter::Interpreter;
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;

/// What kind of function body we are inside.  Validates `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// What kind of class body we are inside.  Validates `this` and `super`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

pub struct Resolver<'i, W: Write> {
    interpreter: &'i mut Interpreter<W>,
    scopes: Vec<HashMap<String, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<LoxError>,
}

impl<'i, W: Write> Resolver<'i, W> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter<W>) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    /// Walk all top-level statements.  `Ok` means the program is statically
    /// sound and may run; `Err` carries every violation found.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<(), Vec<LoxError>> {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }

        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(mem::take(&mut self.errors))
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();

                for s in statements {
                    self.resolve_stmt(s);
                }

                self.end_scope();
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                // 1. Enter the class context and bind the class name so
                //    method bodies can refer to it.
                let enclosing_class = self.current_class;
                self.current_class = ClassType::Class;

                self.declare(name);
                self.define(name);

                // 2. A class shadowing its own superclass name is a cycle.
                if let Some(Expr::Variable {
                    name: super_name, ..
                }) = superclass
                {
                    if super_name.lexeme == name.lexeme {
                        self.error(super_name, "A class can't inherit from itself.");
                    }
                }

                // 3. Resolve the superclass reference and open the `super`
                //    scope; it must sit immediately outside the `this`
                //    scope so the runtime finds `this` one frame in.
                if let Some(superclass) = superclass {
                    self.current_class = ClassType::Subclass;
                    self.resolve_expr(superclass);

                    self.begin_scope();
                    self.scope_insert("super", true);
                }

                // 4. Open the implicit `this` scope for methods.
                self.begin_scope();
                self.scope_insert("this", true);

                // 5. Resolve each method body; `init` gets its own context
                //    so `return <value>` inside it is rejected.
                for method in methods {
                    let declaration = if method.name.lexeme == "init" {
                        FunctionType::Initializer
                    } else {
                        FunctionType::Method
                    };

                    self.resolve_function(method, declaration);
                }

                // 6. Close `this`, then `super` if we opened it.
                self.end_scope();

                if superclass.is_some() {
                    self.end_scope();
                }

                self.current_class = enclosing_class;
            }

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::Function(declaration) => {
                // Declare and define eagerly so the function can recurse.
                self.declare(&declaration.name);
                self.define(&declaration.name);

                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);

                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(value);
                }
            }

            Stmt::Var { name, initializer } => {
                // Declaration before definition is what makes reading a
                // variable inside its own initializer detectable.
                self.declare(name);

                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer);
                }

                self.define(name);
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => {
                self.resolve_expr(inner);
            }

            Expr::Unary { right, .. } => {
                self.resolve_expr(right);
            }

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);

                for argument in arguments {
                    self.resolve_expr(argument);
                }
            }

            Expr::Get { object, .. } => {
                // Property names are looked up dynamically; only the
                // object expression resolves.
                self.resolve_expr(object);
            }

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'super' outside of a class.");
                } else if self.current_class != ClassType::Subclass {
                    self.error(keyword, "Can't use 'super' in a class with no superclass.");
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function's parameters and body, under the
    /// given context (`Function`, `Method`, or `Initializer`).
    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();

        for param in &declaration.params {
            self.declare(param);
            self.define(param);
        }

        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }

        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn scope_insert(&mut self, name: &str, defined: bool) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), defined);
        }
    }

    /// Marks the name as declared but not yet usable.  Globals are exempt
    /// from redeclaration checks.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.error(name, "Already a variable with this name in this scope.");
                return;
            }

            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        self.scope_insert(&name.lexeme, true);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Binding-distance helper
    // ─────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at its lexical depth, or leave it
    /// unrecorded so the runtime falls back to the globals frame.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }

    fn error<S: Into<String>>(&mut self, token: &Token, message: S) {
        self.errors.push(LoxError::resolve(token, message));
    }
}
