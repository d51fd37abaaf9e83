//! Flag definitions and values.

use std::fmt;

use gk_core::{SourceId, Value, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::{FlagError, FlagResult};

/// The kind of value a flag holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    /// A boolean flag.
    Bool,
    /// A bounded integer flag.
    Int,
}

impl FlagKind {
    /// The event value kind used when the flag is observed.
    pub fn value_kind(self) -> ValueKind {
        match self {
            Self::Bool => ValueKind::Bool,
            Self::Int => ValueKind::Int,
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
        }
    }
}

/// The current value of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    /// A boolean value.
    Bool(bool),
    /// An integer value.
    Int(i64),
}

impl FlagValue {
    /// The kind of this value.
    pub fn kind(self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::Int(_) => FlagKind::Int,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
        }
    }
}

impl From<FlagValue> for Value {
    fn from(value: FlagValue) -> Self {
        match value {
            FlagValue::Bool(b) => Value::Bool(b),
            FlagValue::Int(n) => Value::Int(n),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

/// A named piece of world state.
#[derive(Debug, Clone)]
pub struct Flag {
    key: String,
    value: FlagValue,
    default: FlagValue,
    min: i64,
    max: i64,
    pub(crate) source: Option<SourceId>,
}

impl Flag {
    /// A boolean flag starting at `default`.
    pub fn boolean(key: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.into(),
            value: FlagValue::Bool(default),
            default: FlagValue::Bool(default),
            min: i64::MIN,
            max: i64::MAX,
            source: None,
        }
    }

    /// An integer flag bounded to `min..=max`. The default is clamped too.
    pub fn integer(key: impl Into<String>, default: i64, min: i64, max: i64) -> FlagResult<Self> {
        let key = key.into();
        if min > max {
            return Err(FlagError::InvalidBounds { key, min, max });
        }
        let default = FlagValue::Int(default.clamp(min, max));
        Ok(Self {
            key,
            value: default,
            default,
            min,
            max,
            source: None,
        })
    }

    /// The flag's key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The current value.
    pub fn value(&self) -> FlagValue {
        self.value
    }

    /// The value the flag starts at and resets to.
    pub fn default_value(&self) -> FlagValue {
        self.default
    }

    /// The kind of value the flag holds.
    pub fn kind(&self) -> FlagKind {
        self.value.kind()
    }

    /// Bounds of an integer flag.
    pub fn bounds(&self) -> Option<(i64, i64)> {
        match self.kind() {
            FlagKind::Int => Some((self.min, self.max)),
            FlagKind::Bool => None,
        }
    }

    /// The event source observing this flag, once bound.
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    /// Clamp `value` to the flag's bounds without storing it.
    ///
    /// Returns the value that would be stored if it differs from the
    /// current one.
    pub(crate) fn coerce(&self, value: FlagValue) -> FlagResult<Option<FlagValue>> {
        let next = match (self.kind(), value) {
            (FlagKind::Bool, FlagValue::Bool(b)) => FlagValue::Bool(b),
            (FlagKind::Int, FlagValue::Int(n)) => FlagValue::Int(n.clamp(self.min, self.max)),
            (expected, found) => {
                return Err(FlagError::KindMismatch {
                    key: self.key.clone(),
                    expected,
                    found: found.kind().value_kind(),
                });
            }
        };
        Ok((next != self.value).then_some(next))
    }

    /// Store a value returned by [`coerce`](Self::coerce).
    pub(crate) fn commit(&mut self, value: FlagValue) {
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_default_is_clamped() {
        let flag = Flag::integer("reputation", 500, -100, 100).unwrap();
        assert_eq!(flag.value(), FlagValue::Int(100));
        assert_eq!(flag.default_value(), FlagValue::Int(100));
        assert_eq!(flag.bounds(), Some((-100, 100)));
    }

    #[test]
    fn inverted_bounds_rejected() {
        let err = Flag::integer("broken", 0, 10, 1).unwrap_err();
        assert!(matches!(err, FlagError::InvalidBounds { min: 10, max: 1, .. }));
    }

    #[test]
    fn coerce_clamps_and_reports_changes() {
        let mut flag = Flag::integer("gold", 0, 0, 999).unwrap();
        assert_eq!(flag.coerce(FlagValue::Int(5000)).unwrap(), Some(FlagValue::Int(999)));
        assert_eq!(flag.value(), FlagValue::Int(0));
        flag.commit(FlagValue::Int(999));
        assert_eq!(flag.coerce(FlagValue::Int(1000)).unwrap(), None);
        assert_eq!(flag.coerce(FlagValue::Int(-3)).unwrap(), Some(FlagValue::Int(0)));
    }

    #[test]
    fn coerce_rejects_wrong_kind() {
        let flag = Flag::boolean("met_king", false);
        assert!(flag.bounds().is_none());
        let err = flag.coerce(FlagValue::Int(1)).unwrap_err();
        assert!(matches!(
            err,
            FlagError::KindMismatch {
                expected: FlagKind::Bool,
                found: ValueKind::Int,
                ..
            }
        ));
    }

    #[test]
    fn flag_values_convert_to_event_values() {
        assert_eq!(Value::from(FlagValue::Bool(true)), Value::Bool(true));
        assert_eq!(Value::from(FlagValue::Int(-2)), Value::Int(-2));
    }
}
