//! Solver configuration. Passed explicitly; there is no process-wide state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Maximum dependency depth below a target. `None` means unbounded.
    pub max_depth: Option<usize>,
    /// Reject a request whose closure holds two structurally different
    /// nodes under the same name.
    pub strict_names: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self { max_depth: None, strict_names: true }
    }
}

impl SolverConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_strict_names(mut self, strict: bool) -> Self {
        self.strict_names = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let cfg = SolverConfig::from_json_str(r#"{"max_depth": 64}"#).unwrap();
        assert_eq!(cfg, SolverConfig::default().with_max_depth(64));
        assert!(cfg.strict_names);
    }

    #[test]
    fn test_unknown_shape_is_rejected() {
        assert!(SolverConfig::from_json_str(r#"{"max_depth": "deep"}"#).is_err());
    }
}
