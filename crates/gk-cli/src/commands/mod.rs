pub mod check;
pub mod eval;
pub mod flags;

use std::path::Path;

use gk_config::Blueprint;
use gk_core::RegistryConfig;

/// Load and compile a definition file.
fn load(file: &Path) -> Result<Blueprint, String> {
    gk_config::load(file, RegistryConfig::default()).map_err(|e| e.to_string())
}

/// Split `name=value` into its parts. The value is `None` without an `=`.
fn split_assignment(arg: &str) -> (&str, Option<&str>) {
    match arg.split_once('=') {
        Some((name, value)) => (name.trim(), Some(value)),
        None => (arg.trim(), None),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}
