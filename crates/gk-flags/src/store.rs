//! Key-addressed flag storage with change notification.

use std::collections::{BTreeMap, HashMap};

use gk_core::{EventSink, Registry, SourceId};

use crate::error::{FlagError, FlagResult};
use crate::flag::{Flag, FlagKind, FlagValue};

/// Flag values keyed by name, as saved and restored.
pub type FlagSnapshot = BTreeMap<String, FlagValue>;

/// Stores flags and notifies their event sources when values change.
///
/// Writes go through an [`EventSink`] so that predicates observing a flag
/// see every change as an ordinary event.
#[derive(Debug, Clone, Default)]
pub struct FlagStore {
    flags: HashMap<String, Flag>,
    // Definition order, for stable listings.
    order: Vec<String>,
}

impl FlagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Definitions
    // -----------------------------------------------------------------------

    /// Add a flag definition.
    pub fn define(&mut self, flag: Flag) -> FlagResult<()> {
        if self.flags.contains_key(flag.key()) {
            return Err(FlagError::DuplicateFlag(flag.key().to_string()));
        }
        self.order.push(flag.key().to_string());
        self.flags.insert(flag.key().to_string(), flag);
        Ok(())
    }

    /// Define a boolean flag.
    pub fn define_bool(&mut self, key: impl Into<String>, default: bool) -> FlagResult<()> {
        self.define(Flag::boolean(key, default))
    }

    /// Define an integer flag bounded to `min..=max`.
    pub fn define_int(
        &mut self,
        key: impl Into<String>,
        default: i64,
        min: i64,
        max: i64,
    ) -> FlagResult<()> {
        self.define(Flag::integer(key, default, min, max)?)
    }

    /// Get a flag definition.
    pub fn flag(&self, key: &str) -> Option<&Flag> {
        self.flags.get(key)
    }

    /// All flags in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Flag> {
        self.order.iter().filter_map(|key| self.flags.get(key))
    }

    /// Number of defined flags.
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    /// Whether no flags are defined.
    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Create the event source observing `key`, or return the existing one.
    pub fn bind(&mut self, key: &str, registry: &mut Registry) -> FlagResult<SourceId> {
        let flag = self.flag_mut(key)?;
        if let Some(source) = flag.source {
            return Ok(source);
        }
        let source = registry.add_source(flag.kind().value_kind(), format!("flag:{key}"));
        flag.source = Some(source);
        log::debug!("bound flag {key} to {source}");
        Ok(source)
    }

    /// The event source bound to `key`, if any.
    pub fn source(&self, key: &str) -> Option<SourceId> {
        self.flags.get(key).and_then(Flag::source)
    }

    fn flag_mut(&mut self, key: &str) -> FlagResult<&mut Flag> {
        self.flags
            .get_mut(key)
            .ok_or_else(|| FlagError::UnknownFlag(key.to_string()))
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The current value of a flag.
    pub fn get(&self, key: &str) -> Option<FlagValue> {
        self.flags.get(key).map(Flag::value)
    }

    /// The current value of a boolean flag.
    pub fn get_bool(&self, key: &str) -> FlagResult<bool> {
        match self.require(key)? {
            FlagValue::Bool(b) => Ok(b),
            FlagValue::Int(_) => Err(self.mismatch(key, FlagKind::Int, FlagKind::Bool)),
        }
    }

    /// The current value of an integer flag.
    pub fn get_int(&self, key: &str) -> FlagResult<i64> {
        match self.require(key)? {
            FlagValue::Int(n) => Ok(n),
            FlagValue::Bool(_) => Err(self.mismatch(key, FlagKind::Bool, FlagKind::Int)),
        }
    }

    fn require(&self, key: &str) -> FlagResult<FlagValue> {
        self.get(key)
            .ok_or_else(|| FlagError::UnknownFlag(key.to_string()))
    }

    fn mismatch(&self, key: &str, expected: FlagKind, requested: FlagKind) -> FlagError {
        FlagError::KindMismatch {
            key: key.to_string(),
            expected,
            found: requested.value_kind(),
        }
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Write a flag value, clamping integers to their bounds.
    ///
    /// Returns `true` if the stored value changed; observers are only
    /// notified in that case. The new value is raised before it is stored,
    /// so a failed raise leaves the flag unchanged.
    pub fn set(
        &mut self,
        key: &str,
        value: impl Into<FlagValue>,
        sink: &mut impl EventSink,
    ) -> FlagResult<bool> {
        let flag = self.flag_mut(key)?;
        let Some(next) = flag.coerce(value.into())? else {
            return Ok(false);
        };
        if let Some(source) = flag.source {
            sink.raise(source, next.into())?;
        }
        flag.commit(next);
        log::debug!("flag {key} = {next}");
        Ok(true)
    }

    /// Write a boolean flag.
    pub fn set_bool(&mut self, key: &str, value: bool, sink: &mut impl EventSink) -> FlagResult<bool> {
        self.set(key, value, sink)
    }

    /// Write an integer flag.
    pub fn set_int(&mut self, key: &str, value: i64, sink: &mut impl EventSink) -> FlagResult<bool> {
        self.set(key, value, sink)
    }

    /// Add `by` to an integer flag. Returns the clamped result.
    pub fn increment(&mut self, key: &str, by: i64, sink: &mut impl EventSink) -> FlagResult<i64> {
        let current = self.get_int(key)?;
        self.set(key, current.saturating_add(by), sink)?;
        self.get_int(key)
    }

    /// Subtract `by` from an integer flag. Returns the clamped result.
    pub fn decrement(&mut self, key: &str, by: i64, sink: &mut impl EventSink) -> FlagResult<i64> {
        let current = self.get_int(key)?;
        self.set(key, current.saturating_sub(by), sink)?;
        self.get_int(key)
    }

    /// Flip a boolean flag. Returns the new value.
    pub fn toggle(&mut self, key: &str, sink: &mut impl EventSink) -> FlagResult<bool> {
        let next = !self.get_bool(key)?;
        self.set(key, next, sink)?;
        Ok(next)
    }

    /// Restore a flag to its default.
    pub fn reset(&mut self, key: &str, sink: &mut impl EventSink) -> FlagResult<bool> {
        let default = self.flag_mut(key)?.default_value();
        self.set(key, default, sink)
    }

    /// Restore every flag to its default.
    pub fn reset_all(&mut self, sink: &mut impl EventSink) -> FlagResult<()> {
        for key in self.order.clone() {
            self.reset(&key, sink)?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Current values of every flag.
    pub fn snapshot(&self) -> FlagSnapshot {
        self.iter()
            .map(|flag| (flag.key().to_string(), flag.value()))
            .collect()
    }

    /// Write every value in `snapshot`. Keys without a definition are
    /// skipped with a warning.
    pub fn restore(&mut self, snapshot: &FlagSnapshot, sink: &mut impl EventSink) -> FlagResult<()> {
        for (key, value) in snapshot {
            if !self.flags.contains_key(key) {
                log::warn!("ignoring saved value for undefined flag {key}");
                continue;
            }
            self.set(key, *value, sink)?;
        }
        Ok(())
    }

    /// Raise the current value of every bound flag, so that listening
    /// predicates catch up with state written before they subscribed.
    pub fn publish_all(&self, sink: &mut impl EventSink) -> FlagResult<()> {
        for flag in self.iter() {
            if let Some(source) = flag.source {
                sink.raise(source, flag.value().into())?;
            }
        }
        Ok(())
    }
}
