//! Classes and instances.
//!
//! A class value carries its instance-method table and its class-method
//! table directly; property access on the class value itself consults the
//! class-method table.  Both lookups walk the superclass chain, so a
//! subclass inherits instance methods and class-level methods alike.
//! Instances hold a mutable field map; fields shadow methods on lookup.

use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::callable::Function;
use crate::value::Value;

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub superclass: Option<Rc<Class>>,
    methods: HashMap<String, Rc<Function>>,
    class_methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn new(
        name: String,
        superclass: Option<Rc<Class>>,
        methods: HashMap<String, Rc<Function>>,
        class_methods: HashMap<String, Rc<Function>>,
    ) -> Self {
        Class {
            name,
            superclass,
            methods,
            class_methods,
        }
    }

    /// Instance-method lookup through the superclass chain.
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Rc::clone(method));
        }

        match &self.superclass {
            Some(superclass) => superclass.find_method(name),

            None => None,
        }
    }

    /// Class-method lookup through the superclass chain.
    pub fn find_class_method(&self, name: &str) -> Option<Rc<Function>> {
        if let Some(method) = self.class_methods.get(name) {
            return Some(Rc::clone(method));
        }

        match &self.superclass {
            Some(superclass) => superclass.find_class_method(name),

            None => None,
        }
    }

    /// Constructing a class takes as many arguments as its initializer.
    pub fn arity(&self) -> usize {
        match self.find_method("init") {
            Some(initializer) => initializer.arity(),

            None => 0,
        }
    }
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: HashMap::new(),
        }
    }

    /// Raw field read; method lookup is the interpreter's job because it
    /// needs the `Rc` handle to bind `this`.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.get(name).cloned()
    }

    /// Fields may be added dynamically; an existing field is overwritten.
    pub fn set_field(&mut self, name: &str, value: Value) {
        debug!("Setting field '{}' on {} instance", name, self.class.name);

        self.fields.insert(name.to_string(), value);
    }
}
