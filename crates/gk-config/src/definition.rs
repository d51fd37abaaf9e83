//! The serde schema of definition files.

use std::fs;
use std::path::Path;

use gk_core::{Combinator, ComparisonOp, ValueKind};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// A complete definition: flags, named events, and conditions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Definition {
    /// Flag definitions.
    #[serde(default)]
    pub flags: Vec<FlagDef>,
    /// Named event sources that are not backed by a flag.
    #[serde(default)]
    pub events: Vec<EventDef>,
    /// Conditions. Composites may only reference conditions listed earlier.
    #[serde(default)]
    pub conditions: Vec<ConditionDef>,
}

impl Definition {
    /// Parse a definition from JSON text.
    pub fn parse(text: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a definition file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("loaded definition from {}", path.display());
        Self::parse(&text)
    }
}

/// A flag definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", deny_unknown_fields)]
pub enum FlagDef {
    /// A boolean flag.
    Bool {
        /// Flag key.
        key: String,
        /// Initial value.
        #[serde(default)]
        default: bool,
    },
    /// A bounded integer flag.
    Int {
        /// Flag key.
        key: String,
        /// Initial value, clamped to the bounds.
        #[serde(default)]
        default: i64,
        /// Lower bound. Unbounded when absent.
        #[serde(default)]
        min: Option<i64>,
        /// Upper bound. Unbounded when absent.
        #[serde(default)]
        max: Option<i64>,
    },
}

impl FlagDef {
    /// The flag's key.
    pub fn key(&self) -> &str {
        match self {
            Self::Bool { key, .. } | Self::Int { key, .. } => key,
        }
    }
}

/// A named event source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventDef {
    /// Event name.
    pub name: String,
    /// The kind of value the event carries.
    pub kind: ValueKind,
}

/// A condition definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum ConditionDef {
    /// A comparison against a flag or event.
    Predicate {
        /// Condition name.
        name: String,
        /// Observed flag key.
        #[serde(default)]
        flag: Option<String>,
        /// Observed event name.
        #[serde(default)]
        event: Option<String>,
        /// Comparison operator.
        #[serde(default)]
        op: ComparisonOp,
        /// Target value as a JSON scalar.
        #[serde(default)]
        target: Option<serde_json::Value>,
        /// Negate the result.
        #[serde(default)]
        inverted: bool,
    },
    /// An AND/OR combination of earlier conditions.
    Composite {
        /// Condition name.
        name: String,
        /// How children are combined.
        combinator: Combinator,
        /// Names of child conditions.
        #[serde(default)]
        children: Vec<String>,
        /// Negate the result.
        #[serde(default)]
        inverted: bool,
    },
    /// A fixed result.
    Constant {
        /// Condition name.
        name: String,
        /// The result.
        value: bool,
    },
}

impl ConditionDef {
    /// The condition's name.
    pub fn name(&self) -> &str {
        match self {
            Self::Predicate { name, .. } | Self::Composite { name, .. } | Self::Constant { name, .. } => {
                name
            }
        }
    }
}
