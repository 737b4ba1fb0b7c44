//! Engine configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Rule selection for the synchronous lint pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LintConfig {
    /// Rule ids that are not run (e.g., ["not-equal-style"])
    pub disabled_rules: Vec<String>,
}

impl LintConfig {
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        !self
            .disabled_rules
            .iter()
            .any(|disabled| disabled.eq_ignore_ascii_case(rule_id))
    }
}

/// Debounce and cost bounds for the deep-parse path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoordinatorConfig {
    /// Quiet period after the last text change before a deep parse is requested
    pub debounce_ms: u64,
    /// Texts longer than this (in bytes) are never sent to the worker
    pub max_length: usize,
}

impl CoordinatorConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            max_length: 100_000,
        }
    }
}
