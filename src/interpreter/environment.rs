//! Lexical environments.
//!
//! A flat stack of scopes. Block scopes see through to their parents;
//! a function-call scope is a boundary: lookups inside it see the call's
//! own scopes and the globals (scope 0), never the caller's locals.

use crate::value::Value;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Value,
    pub constant: bool,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: FxHashMap<String, Binding>,
    /// True for the base scope of a function call.
    boundary: bool,
}

#[derive(Debug)]
pub struct Environment {
    scopes: Vec<Scope>,
}

/// What [`Environment::assign`] ran into.
pub enum AssignOutcome {
    Assigned,
    NotDeclared,
    Constant,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn push_function_scope(&mut self) {
        self.scopes.push(Scope {
            bindings: FxHashMap::default(),
            boundary: true,
        });
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1);
        self.scopes.pop();
    }

    /// Define in the innermost scope. Returns false if the name is already
    /// bound there.
    pub fn define(&mut self, name: &str, value: Value, constant: bool) -> bool {
        let scope = self.scopes.last_mut().expect("environment has no scopes");
        if scope.bindings.contains_key(name) {
            return false;
        }
        scope.bindings.insert(name.to_string(), Binding { value, constant });
        true
    }

    /// Python-style binding: rebind the visible variable if there is one,
    /// otherwise define in the innermost scope. Returns true if this
    /// created a new binding.
    pub fn define_or_assign(&mut self, name: &str, value: Value) -> bool {
        match self.assign(name, value.clone()) {
            AssignOutcome::Assigned => false,
            _ => {
                let scope = self.scopes.last_mut().expect("environment has no scopes");
                scope.bindings.insert(
                    name.to_string(),
                    Binding {
                        value,
                        constant: false,
                    },
                );
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        for scope in self.visible_scopes() {
            if let Some(binding) = scope.bindings.get(name) {
                return Some(&binding.value);
            }
        }
        None
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn assign(&mut self, name: &str, value: Value) -> AssignOutcome {
        let indices: Vec<usize> = self.visible_scope_indices();
        for index in indices {
            if let Some(binding) = self.scopes[index].bindings.get_mut(name) {
                if binding.constant {
                    return AssignOutcome::Constant;
                }
                binding.value = value;
                return AssignOutcome::Assigned;
            }
        }
        AssignOutcome::NotDeclared
    }

    /// Deep-cloned snapshot of every visible variable, innermost binding
    /// winning for shadowed names. This is what frames capture.
    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        let mut snapshot = BTreeMap::new();
        for scope in self.visible_scopes() {
            for (name, binding) in &scope.bindings {
                snapshot
                    .entry(name.clone())
                    .or_insert_with(|| binding.value.deep_clone());
            }
        }
        snapshot
    }

    /// Scopes visible from the innermost one: walk outward until (and
    /// including) a function boundary, then jump to the globals.
    fn visible_scopes(&self) -> impl Iterator<Item = &Scope> {
        self.visible_scope_indices().into_iter().map(|i| &self.scopes[i])
    }

    fn visible_scope_indices(&self) -> Vec<usize> {
        let mut indices = Vec::new();
        for index in (0..self.scopes.len()).rev() {
            indices.push(index);
            if self.scopes[index].boundary {
                break;
            }
        }
        if *indices.last().unwrap_or(&0) != 0 {
            indices.push(0);
        }
        indices
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
