use std::time::SystemTime;

use serde::{Deserialize, Serialize};

/// Generic metadata shared by every check variant.
///
/// Supplied by the orchestrator and copied into the variant at init time;
/// immutable once constructed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Unique identifier for this check.
    pub id: String,
    /// Human-readable title for the check.
    pub name: String,
    /// Group this check is part of.
    pub group: String,
    /// Weight this check has relative to others.
    pub score_weight: f64,
}

/// Outcome of a single probe attempt.
///
/// Built fresh per run; never mutated after being handed to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckResult {
    /// When the probe was performed.
    pub timestamp: SystemTime,
    pub id: String,
    pub name: String,
    pub group: String,
    pub score_weight: f64,
    /// Check-type tag, e.g. "ssh" or "vnc".
    pub check_type: String,
    pub passed: bool,
    /// Success detail, or the specific failure cause.
    pub message: String,
}

impl CheckResult {
    /// Create a result skeleton for one run of a check.
    pub fn new(config: &CheckConfig, check_type: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            id: config.id.clone(),
            name: config.name.clone(),
            group: config.group.clone(),
            score_weight: config.score_weight,
            check_type: check_type.to_string(),
            passed: false,
            message: String::new(),
        }
    }

    /// Mark the probe as passed.
    pub fn pass(mut self, message: impl Into<String>) -> Self {
        self.passed = true;
        self.message = message.into();
        self
    }

    /// Mark the probe as failed with its cause.
    pub fn fail(mut self, message: impl Into<String>) -> Self {
        self.passed = false;
        self.message = message.into();
        self
    }
}
