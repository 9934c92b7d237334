use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::callable::LoxFunction;
use crate::error::{LoxError, Result};
use crate::interpreter::Interpreter;
use crate::token::Token;
use crate::value::Value;

/// A class value: a name, an optional superclass, and a method table.
/// Method lookup walks this class first, then the superclass chain.
#[derive(Debug)]
pub struct LoxClass {
    pub name: String,
    pub superclass: Option<Rc<LoxClass>>,
    methods: HashMap<String, LoxFunction>,
}

impl LoxClass {
    pub fn new(
        name: String,
        superclass: Option<Rc<LoxClass>>,
        methods: HashMap<String, LoxFunction>,
    ) -> Self {
        LoxClass {
            name,
            superclass,
            methods,
        }
    }

    pub fn find_method(&self, name: &str) -> Option<LoxFunction> {
        if let Some(method) = self.methods.get(name) {
            return Some(method.clone());
        }

        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }

    /// A class called as a constructor takes whatever its `init` takes.
    pub fn arity(&self) -> usize {
        self.find_method("init").map_or(0, |init| init.arity())
    }

    /// Calling a class allocates an instance and runs `init` bound to it,
    /// when one exists.  The instance is the result either way.
    pub fn call<W: Write>(
        class: &Rc<LoxClass>,
        interpreter: &mut Interpreter<W>,
        arguments: Vec<Value>,
    ) -> Result<Value> {
        let instance = Rc::new(RefCell::new(LoxInstance::new(Rc::clone(class))));

        if let Some(initializer) = class.find_method("init") {
            initializer
                .bind(Rc::clone(&instance))
                .call(interpreter, arguments)?;
        }

        Ok(Value::Instance(instance))
    }
}

/// A bag of fields plus a back-reference to the class for method lookup.
#[derive(Debug)]
pub struct LoxInstance {
    pub class: Rc<LoxClass>,
    fields: HashMap<String, Value>,
}

impl LoxInstance {
    pub fn new(class: Rc<LoxClass>) -> Self {
        LoxInstance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields shadow methods.  A method hit is bound to the instance so a
    /// later call sees the right `this`.
    pub fn get(instance: &Rc<RefCell<LoxInstance>>, name: &Token) -> Result<Value> {
        if let Some(value) = instance.borrow().fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        let method = instance.borrow().class.find_method(&name.lexeme);

        if let Some(method) = method {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(instance)))));
        }

        Err(LoxError::runtime(
            name.line,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Writes never fail; assigning to a fresh name creates the field.
    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }
}
