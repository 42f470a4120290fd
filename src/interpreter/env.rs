// Lexical environment of one activation

use crate::memory::value::Value;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Default)]
struct ScopeData {
    shadowed: Vec<(String, Value)>,
    declared: Vec<String>,
}

/// Variables visible to one activation, with block scoping
///
/// Declarations in a nested scope shadow outer ones and are undone when the
/// scope is popped. Declarations at function level (no open scope) simply
/// overwrite.
#[derive(Debug, Clone, Default)]
pub struct Env {
    vars: FxHashMap<String, Value>,
    scope_stack: Vec<ScopeData>,
}

impl Env {
    pub fn new() -> Self {
        Env::default()
    }

    /// Enter a new scope
    pub fn push_scope(&mut self) {
        self.scope_stack.push(ScopeData::default());
    }

    /// Exit the current scope
    pub fn pop_scope(&mut self) {
        if let Some(scope) = self.scope_stack.pop() {
            // Remove variables declared in this scope
            for name in scope.declared {
                self.vars.remove(&name);
            }

            // Restore shadowed variables
            for (name, value) in scope.shadowed {
                self.vars.insert(name, value);
            }
        }
    }

    /// Declare a variable in the innermost scope
    pub fn declare(&mut self, name: String, value: Value) {
        let previous = self.vars.insert(name.clone(), value);
        if let Some(scope) = self.scope_stack.last_mut() {
            match previous {
                // Redeclaring within the same scope keeps the original shadow record
                Some(_) if scope.declared.contains(&name) => {}
                Some(old) => scope.shadowed.push((name, old)),
                None => scope.declared.push(name),
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.vars.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn depth(&self) -> usize {
        self.scope_stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shadowing_restored_on_pop() {
        let mut env = Env::new();
        env.declare("x".to_string(), Value::Int(1));
        env.push_scope();
        env.declare("x".to_string(), Value::Int(2));
        env.declare("y".to_string(), Value::Int(3));
        assert_eq!(env.get("x"), Some(&Value::Int(2)));
        env.pop_scope();
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
        assert!(!env.contains("y"));
    }

    #[test]
    fn test_redeclare_in_same_scope() {
        let mut env = Env::new();
        env.declare("x".to_string(), Value::Int(1));
        env.push_scope();
        env.declare("t".to_string(), Value::Int(5));
        env.declare("t".to_string(), Value::Int(6));
        env.pop_scope();
        assert!(!env.contains("t"));
        assert_eq!(env.get("x"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_assignment_through_get_mut() {
        let mut env = Env::new();
        env.declare("n".to_string(), Value::Int(1));
        env.push_scope();
        if let Some(slot) = env.get_mut("n") {
            *slot = Value::Int(9);
        }
        env.pop_scope();
        assert_eq!(env.get("n"), Some(&Value::Int(9)));
    }
}
