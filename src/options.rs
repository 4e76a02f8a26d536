//! Resolved-by-most-recent-wins option stack (§3, §5).
//!
//! Modeled as an explicit value threaded through harvest/parse/execute
//! rather than module-level state, per the "Global/module state" design
//! note in §9.

use std::collections::BTreeMap;

/// A single option value. Lists are kept distinct from scalars because `rm`
/// accumulates a list of literal substrings while `timeout`/`geometry`/etc.
/// are scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<String>),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            OptionValue::Float(f) => Some(*f),
            OptionValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }
}

/// One scope in the option stack: global, profile, file, or example. Scopes
/// are pushed on entering an example's parse and popped on exit (§4.3).
#[derive(Debug, Clone, Default)]
pub struct OptionScope {
    values: BTreeMap<String, OptionValue>,
}

impl OptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: OptionValue) -> &mut Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }
}

/// Default core option set documented in SPEC_FULL.md §A.3.
pub fn default_scope() -> OptionScope {
    let mut scope = OptionScope::new();
    scope
        .set("norm_ws", OptionValue::Bool(false))
        .set("tags", OptionValue::Bool(true))
        .set("rm", OptionValue::List(Vec::new()))
        .set("timeout", OptionValue::Float(2.0))
        .set("geometry", OptionValue::Str("24x80".to_string()))
        .set("term", OptionValue::Str("dumb".to_string()))
        .set("x.dfl_timeout", OptionValue::Float(10.0))
        .set("x.delaybeforesend", OptionValue::Float(0.0))
        .set("stop_on_timeout", OptionValue::Bool(false))
        .set("stop_on_silence", OptionValue::Bool(false));
    scope
}

/// The stack of option scopes. Lookup resolves most-recent-wins: the
/// top-most scope that defines a key shadows every scope below it.
#[derive(Debug, Clone)]
pub struct OptionStack {
    scopes: Vec<OptionScope>,
}

impl Default for OptionStack {
    fn default() -> Self {
        Self {
            scopes: vec![default_scope()],
        }
    }
}

impl OptionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn get_bool(&self, name: &str) -> bool {
        self.get(name).and_then(OptionValue::as_bool).unwrap_or(false)
    }

    pub fn get_float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(OptionValue::as_float)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    pub fn get_list(&self, name: &str) -> &[String] {
        self.get(name).and_then(OptionValue::as_list).unwrap_or(&[])
    }

    /// Push a scope and return a guard that pops it on drop, giving the
    /// "released on all exit paths, including failure" property from §5
    /// without callers having to remember to pop manually.
    pub fn push_scope(&mut self, scope: OptionScope) -> ScopeGuard<'_> {
        self.scopes.push(scope);
        ScopeGuard { stack: self }
    }

    fn pop(&mut self) {
        // The base scope (index 0, the documented defaults) is never popped.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }
}

/// Drop guard returned by [`OptionStack::push_scope`]. Popping on drop keeps
/// the stack balanced even if the caller returns early via `?`.
pub struct ScopeGuard<'a> {
    stack: &'a mut OptionStack,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.stack.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn most_recent_scope_wins() {
        let mut stack = OptionStack::new();
        assert_eq!(stack.get_bool("norm_ws"), false);
        {
            let mut scope = OptionScope::new();
            scope.set("norm_ws", OptionValue::Bool(true));
            let _guard = stack.push_scope(scope);
            assert_eq!(stack.get_bool("norm_ws"), true);
        }
        assert_eq!(stack.get_bool("norm_ws"), false);
    }

    #[test]
    fn unset_key_falls_through_to_base_scope() {
        let mut stack = OptionStack::new();
        let mut scope = OptionScope::new();
        scope.set("tags", OptionValue::Bool(false));
        let _guard = stack.push_scope(scope);
        assert_eq!(stack.get_bool("tags"), false);
        assert_eq!(stack.get_float("timeout"), Some(2.0));
    }

    #[test]
    fn guard_pops_even_on_early_return() {
        fn do_work(stack: &mut OptionStack) -> Option<()> {
            let mut scope = OptionScope::new();
            scope.set("rm", OptionValue::List(vec!["x".into()]));
            let _guard = stack.push_scope(scope);
            None? // early return through the guard
        }
        let mut stack = OptionStack::new();
        let _ = do_work(&mut stack);
        assert!(stack.get_list("rm").is_empty());
    }
}
