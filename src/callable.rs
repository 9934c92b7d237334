use std::cell::RefCell;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::class::LoxInstance;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::{Interpreter, Unwind};
use crate::stmt::FunctionDecl;
use crate::value::Value;

/// A user-declared function or method, closed over the environment that was
/// current at its declaration site.
///
/// The closure frame is shared, not copied: every call chains a fresh frame
/// onto it, so sibling closures observe each other's mutations of captured
/// variables.
#[derive(Clone)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(
        declaration: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        LoxFunction {
            declaration,
            closure,
            is_initializer,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// Produce a copy of this method whose closure has `this` bound to the
    /// given instance, one frame inside the original closure.
    pub fn bind(&self, instance: Rc<RefCell<LoxInstance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
            is_initializer: self.is_initializer,
        }
    }

    /// Invoke the function body in a fresh frame chained onto the closure.
    ///
    /// A `return` anywhere in the body unwinds to exactly here.  An
    /// initializer always evaluates to its instance, whether it returns
    /// early or falls off the end.
    pub fn call<W: Write>(
        &self,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(Value::Nil)
                }
            }

            Err(Unwind::Return(value)) => {
                if self.is_initializer {
                    self.bound_this()
                } else {
                    Ok(value)
                }
            }

            Err(Unwind::Error(e)) => Err(e),
        }
    }

    fn bound_this(&self) -> Result<Value> {
        self.closure
            .borrow()
            .get_at(0, "this", self.declaration.name.line)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoxFunction")
            .field("name", &self.declaration.name.lexeme)
            .field("arity", &self.declaration.params.len())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}
