use crate::compare::Tolerance;

/// Configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Tolerance for float equality in predicates.
    pub tolerance: Tolerance,
    /// Log a warning whenever a missing reference is read or forced.
    pub warn_on_missing: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::default(),
            warn_on_missing: true,
        }
    }
}

impl RegistryConfig {
    /// Set the float equality tolerance.
    pub fn with_tolerance(mut self, relative: f64, absolute: f64) -> Self {
        self.tolerance = Tolerance { relative, absolute };
        self
    }

    /// Enable or disable warnings for missing references.
    pub fn with_missing_warnings(mut self, enabled: bool) -> Self {
        self.warn_on_missing = enabled;
        self
    }
}
