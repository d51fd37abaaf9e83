//! A registry and a flag store wired together.

use gk_core::{ComparisonOp, NodeId, Predicate, Registry, RegistryConfig, SourceId, Value};

use crate::error::FlagResult;
use crate::flag::FlagValue;
use crate::store::{FlagSnapshot, FlagStore};

/// Owns the condition registry and the flags it observes.
///
/// Flag writes made through the session notify the registry, so predicates
/// built with [`flag_predicate`](Self::flag_predicate) react to them.
#[derive(Debug, Default)]
pub struct Session {
    registry: Registry,
    flags: FlagStore,
}

impl Session {
    /// Create an empty session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty session whose registry uses `config`.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            registry: Registry::with_config(config),
            flags: FlagStore::new(),
        }
    }

    /// The condition registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the condition registry.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The flag store.
    pub fn flags(&self) -> &FlagStore {
        &self.flags
    }

    /// Define a boolean flag.
    pub fn define_bool(&mut self, key: impl Into<String>, default: bool) -> FlagResult<()> {
        self.flags.define_bool(key, default)
    }

    /// Define an integer flag bounded to `min..=max`.
    pub fn define_int(
        &mut self,
        key: impl Into<String>,
        default: i64,
        min: i64,
        max: i64,
    ) -> FlagResult<()> {
        self.flags.define_int(key, default, min, max)
    }

    /// The event source observing `key`, created on first use.
    pub fn flag_source(&mut self, key: &str) -> FlagResult<SourceId> {
        self.flags.bind(key, &mut self.registry)
    }

    /// Add a predicate comparing flag `key` against `target`.
    pub fn flag_predicate(
        &mut self,
        key: &str,
        op: ComparisonOp,
        target: impl Into<Value>,
    ) -> FlagResult<NodeId> {
        let source = self.flag_source(key)?;
        let node = self
            .registry
            .add_predicate(Predicate::new(target).observing(source).with_op(op))?;
        Ok(node)
    }

    /// Write a flag. Returns `true` if the value changed.
    pub fn set_flag(&mut self, key: &str, value: impl Into<FlagValue>) -> FlagResult<bool> {
        self.flags.set(key, value, &mut self.registry)
    }

    /// Add `by` to an integer flag.
    pub fn increment(&mut self, key: &str, by: i64) -> FlagResult<i64> {
        self.flags.increment(key, by, &mut self.registry)
    }

    /// Subtract `by` from an integer flag.
    pub fn decrement(&mut self, key: &str, by: i64) -> FlagResult<i64> {
        self.flags.decrement(key, by, &mut self.registry)
    }

    /// Flip a boolean flag.
    pub fn toggle(&mut self, key: &str) -> FlagResult<bool> {
        self.flags.toggle(key, &mut self.registry)
    }

    /// Restore one flag to its default.
    pub fn reset_flag(&mut self, key: &str) -> FlagResult<bool> {
        self.flags.reset(key, &mut self.registry)
    }

    /// Restore every flag to its default.
    pub fn reset_flags(&mut self) -> FlagResult<()> {
        self.flags.reset_all(&mut self.registry)
    }

    /// Load saved flag values.
    pub fn restore_flags(&mut self, snapshot: &FlagSnapshot) -> FlagResult<()> {
        self.flags.restore(snapshot, &mut self.registry)
    }

    /// Re-raise every bound flag's current value.
    pub fn publish_flags(&mut self) -> FlagResult<()> {
        self.flags.publish_all(&mut self.registry)
    }

    /// Evaluate a node.
    pub fn evaluate(&self, node: NodeId) -> bool {
        self.registry.evaluate(node)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use gk_core::Composite;

    use super::*;

    fn session() -> Session {
        let mut session = Session::new();
        session.define_int("gold", 0, 0, 999).unwrap();
        session.define_bool("met_king", false).unwrap();
        session
    }

    #[test]
    fn flag_writes_drive_predicates() {
        let mut session = session();
        let rich = session
            .flag_predicate("gold", ComparisonOp::GreaterOrEqual, 50_i64)
            .unwrap();
        session.registry_mut().subscribe(rich, |_| {}).unwrap();

        session.set_flag("gold", 49_i64).unwrap();
        assert!(!session.evaluate(rich));
        session.increment("gold", 1).unwrap();
        assert!(session.evaluate(rich));
    }

    #[test]
    fn quest_gate_opens_once() {
        let mut session = session();
        let rich = session
            .flag_predicate("gold", ComparisonOp::GreaterOrEqual, 100_i64)
            .unwrap();
        let met = session
            .flag_predicate("met_king", ComparisonOp::Equals, true)
            .unwrap();
        let gate = session
            .registry_mut()
            .add_composite(Composite::all([rich, met]))
            .unwrap();
        let opened = Rc::new(Cell::new(0));
        let counter = Rc::clone(&opened);
        session
            .registry_mut()
            .subscribe(gate, move |_| counter.set(counter.get() + 1))
            .unwrap();

        session.set_flag("gold", 150_i64).unwrap();
        assert_eq!(opened.get(), 0);
        session.toggle("met_king").unwrap();
        assert_eq!(opened.get(), 1);
        assert!(session.evaluate(gate));
    }

    #[test]
    fn flag_source_is_shared() {
        let mut session = session();
        let a = session.flag_source("gold").unwrap();
        let b = session.flag_source("gold").unwrap();
        assert_eq!(a, b);
        assert!(session.flag_predicate("nope", ComparisonOp::Equals, 1_i64).is_err());
        assert!(session.flag_predicate("gold", ComparisonOp::Equals, true).is_err());
    }

    #[test]
    fn publish_catches_up_late_subscribers() {
        let mut session = session();
        session.set_flag("gold", 500_i64).unwrap();
        let rich = session
            .flag_predicate("gold", ComparisonOp::GreaterThan, 100_i64)
            .unwrap();
        session.registry_mut().subscribe(rich, |_| {}).unwrap();
        assert!(!session.evaluate(rich));

        session.publish_flags().unwrap();
        assert!(session.evaluate(rich));
    }

    #[test]
    fn reset_and_restore() {
        let mut session = session();
        session.set_flag("gold", 10_i64).unwrap();
        let saved = session.flags().snapshot();
        session.reset_flags().unwrap();
        assert_eq!(session.flags().get_int("gold").unwrap(), 0);
        session.restore_flags(&saved).unwrap();
        assert_eq!(session.flags().get_int("gold").unwrap(), 10);
        assert!(!session.reset_flag("met_king").unwrap());
        assert_eq!(session.decrement("gold", 3).unwrap(), 7);
    }
}
