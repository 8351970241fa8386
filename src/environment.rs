//! Lexical environments: identifier→value maps chained through an optional
//! enclosing link.  Closures share environments, so frames are
//! `Rc<RefCell<_>>` and live as long as any callable or call frame holds
//! them.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in this frame.  Redefinition is permitted; the globals
    /// frame relies on this.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    /// Look up a name, walking the enclosing chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value.clone());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow().get(name),

            None => None,
        }
    }

    /// Assign to an existing name, walking the enclosing chain.  Returns
    /// false when the name is bound nowhere.
    pub fn assign(&mut self, name: &str, value: Value) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            return true;
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value),

            None => false,
        }
    }

    /// The frame exactly `distance` links up the chain.
    pub fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut environment: Rc<RefCell<Environment>> = Rc::clone(env);

        for _ in 0..distance {
            let enclosing: Option<Rc<RefCell<Environment>>> =
                environment.borrow().enclosing.clone();

            environment = enclosing?;
        }

        Some(environment)
    }

    /// Read a name directly in the frame `distance` links up, without any
    /// further chain walk.  The resolver guarantees the name is there.
    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &str) -> Option<Value> {
        let frame: Rc<RefCell<Environment>> = Environment::ancestor(env, distance)?;

        let value: Option<Value> = frame.borrow().values.get(name).cloned();

        value
    }

    /// Write a name directly in the frame `distance` links up.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
    ) -> bool {
        match Environment::ancestor(env, distance) {
            Some(frame) => {
                frame.borrow_mut().values.insert(name.to_string(), value);
                true
            }

            None => false,
        }
    }
}
