//! JSON definitions for Gatekeeper.
//!
//! A definition file declares flags, named events, and a list of conditions.
//! [`compile`] validates it and builds a [`gk_flags::Session`] together with
//! a [`Catalog`] that maps the declared names to their handles.

use std::path::Path;

use gk_core::RegistryConfig;

/// Definition compiler.
pub mod compiler;
/// The serde schema of definition files.
pub mod definition;
/// Error types for loading and compiling definitions.
pub mod error;

/// Re-export compiler types.
pub use compiler::{Blueprint, Catalog, compile, compile_with};
/// Re-export schema types.
pub use definition::{ConditionDef, Definition, EventDef, FlagDef};
/// Re-export error types.
pub use error::{ConfigError, ConfigResult};

/// Load a definition file and compile it.
pub fn load(path: &Path, config: RegistryConfig) -> ConfigResult<Blueprint> {
    let def = Definition::load(path)?;
    compile_with(&def, config)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn load_compiles_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gates.json");
        fs::write(
            &path,
            r#"{ "conditions": [ { "name": "open", "type": "constant", "value": true } ] }"#,
        )
        .unwrap();

        let bp = load(&path, RegistryConfig::default()).unwrap();
        let open = bp.condition("open").unwrap();
        assert!(bp.session.evaluate(open));
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load(&path, RegistryConfig::default()),
            Err(ConfigError::Parse(_))
        ));
    }
}
