//! Error types for loading and compiling definitions.

use std::path::PathBuf;

use gk_core::{GkError, ValueKind};
use gk_flags::FlagError;
use thiserror::Error;

/// Result type for definition loading and compilation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors found while loading or compiling a definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The definition file could not be read.
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file that failed to load.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The definition is not valid JSON for the schema.
    #[error("invalid definition: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two entries of the same section share a name.
    #[error("duplicate {section} name: \"{name}\"")]
    DuplicateName {
        /// Which section the names collide in.
        section: &'static str,
        /// The repeated name.
        name: String,
    },

    /// A predicate names a flag that is not defined.
    #[error("condition \"{condition}\" observes unknown flag \"{flag}\"")]
    UnknownFlag {
        /// The offending condition.
        condition: String,
        /// The missing flag key.
        flag: String,
    },

    /// A predicate names an event that is not defined.
    #[error("condition \"{condition}\" observes unknown event \"{event}\"")]
    UnknownEvent {
        /// The offending condition.
        condition: String,
        /// The missing event name.
        event: String,
    },

    /// A composite names a child that is not defined before it.
    #[error("condition \"{condition}\" references unknown child \"{child}\"")]
    UnknownChild {
        /// The offending composite.
        condition: String,
        /// The missing child name.
        child: String,
    },

    /// A predicate names both a flag and an event.
    #[error("condition \"{0}\" observes both a flag and an event")]
    AmbiguousSource(String),

    /// A predicate's target does not fit the observed kind.
    #[error("condition \"{condition}\" expects a {expected} target, found {found}")]
    InvalidTarget {
        /// The offending condition.
        condition: String,
        /// The kind of the observed source.
        expected: ValueKind,
        /// The target as written.
        found: String,
    },

    /// A flag definition was rejected.
    #[error(transparent)]
    Flag(#[from] FlagError),

    /// The condition graph rejected a node.
    #[error(transparent)]
    Graph(#[from] GkError),
}
