//! Environments: chained, mutable frames of bindings
//!
//! The runtime is single-threaded, so frames are shared through
//! `Rc<RefCell<_>>` and mutated in place.

use crate::error::{Message, RResult};
use crate::value::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::rc::Rc;

struct Frame {
    name: Option<String>,
    parent: Option<Environment>,
    bindings: BTreeMap<String, Value>,
    locked: bool,
    locked_bindings: HashSet<String>,
    /// Set only on the root of every search path
    empty: bool,
}

/// Handle to a frame; clones share the frame
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Frame>>);

impl Environment {
    /// Anonymous environment enclosed by `parent`
    pub fn new(parent: Option<Environment>) -> Self {
        Self::build(None, parent)
    }

    /// Environment with a name reported by `environmentName`
    pub fn named(name: impl Into<String>, parent: Option<Environment>) -> Self {
        Self::build(Some(name.into()), parent)
    }

    /// The empty environment, which accepts no bindings
    pub fn empty() -> Self {
        let env = Self::build(Some("R_EmptyEnv".to_string()), None);
        env.0.borrow_mut().empty = true;
        env
    }

    fn build(name: Option<String>, parent: Option<Environment>) -> Self {
        Environment(Rc::new(RefCell::new(Frame {
            name,
            parent,
            bindings: BTreeMap::new(),
            locked: false,
            locked_bindings: HashSet::new(),
            empty: false,
        })))
    }

    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) {
        self.0.borrow_mut().name = Some(name.into());
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    pub fn set_parent(&self, parent: Option<Environment>) {
        self.0.borrow_mut().parent = parent;
    }

    pub fn is_empty_env(&self) -> bool {
        self.0.borrow().empty
    }

    pub fn len(&self) -> usize {
        self.0.borrow().bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Binding in this frame only
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.0.borrow().bindings.get(name).cloned()
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Walk the chain; returns the value and the frame holding it
    pub fn lookup(&self, name: &str) -> Option<(Value, Environment)> {
        let mut current = Some(self.clone());
        while let Some(env) = current {
            if let Some(value) = env.get_local(name) {
                return Some((value, env));
            }
            current = env.parent();
        }
        None
    }

    /// Create or update a binding in this frame
    pub fn define(&self, name: &str, value: Value) -> RResult<()> {
        if self.is_empty_env() {
            return Err(Message::EnvAssignEmpty.into());
        }
        let mut frame = self.0.borrow_mut();
        if frame.locked_bindings.contains(name) {
            return Err(Message::EnvChangeBinding(name.to_string()).into());
        }
        if frame.locked && !frame.bindings.contains_key(name) {
            return Err(Message::EnvAddBindings.into());
        }
        frame.bindings.insert(name.to_string(), value);
        Ok(())
    }

    /// Replace an existing binding found along the chain, else define globally
    /// in `fallback`
    pub fn assign_inherited(&self, name: &str, value: Value, fallback: &Environment) -> RResult<()> {
        match self.lookup(name) {
            Some((_, owner)) => owner.define(name, value),
            None => fallback.define(name, value),
        }
    }

    /// Remove a binding; `Ok(false)` when absent
    pub fn remove(&self, name: &str) -> RResult<bool> {
        let mut frame = self.0.borrow_mut();
        if !frame.bindings.contains_key(name) {
            return Ok(false);
        }
        if frame.locked {
            return Err(Message::EnvRemoveBindings.into());
        }
        frame.bindings.remove(name);
        frame.locked_bindings.remove(name);
        Ok(true)
    }

    /// Binding names in sorted order; dot-names only with `all`
    pub fn names(&self, all: bool) -> Vec<String> {
        self.0
            .borrow()
            .bindings
            .keys()
            .filter(|name| all || !name.starts_with('.'))
            .cloned()
            .collect()
    }

    /// Snapshot of all bindings in name order
    pub fn bindings(&self) -> Vec<(String, Value)> {
        self.0
            .borrow()
            .bindings
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Forbid new bindings; optionally lock every existing one
    pub fn lock(&self, bindings: bool) {
        let mut frame = self.0.borrow_mut();
        frame.locked = true;
        if bindings {
            let names: Vec<String> = frame.bindings.keys().cloned().collect();
            frame.locked_bindings.extend(names);
        }
    }

    pub fn is_locked(&self) -> bool {
        self.0.borrow().locked
    }

    pub fn lock_binding(&self, name: &str) -> RResult<()> {
        let mut frame = self.0.borrow_mut();
        if !frame.bindings.contains_key(name) {
            return Err(Message::ObjectNotFound(name.to_string()).into());
        }
        frame.locked_bindings.insert(name.to_string());
        Ok(())
    }

    pub fn unlock_binding(&self, name: &str) {
        self.0.borrow_mut().locked_bindings.remove(name);
    }

    pub fn is_binding_locked(&self, name: &str) -> bool {
        self.0.borrow().locked_bindings.contains(name)
    }

    /// Address used when printing anonymous environments
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "<environment: {}>", name),
            None => write!(f, "<environment: {:#x}>", self.address()),
        }
    }
}
