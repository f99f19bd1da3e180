//! Injection settings
//!
//! The supervising process hands the engine one settings object at injection
//! time. Missing keys take their defaults and unknown keys are ignored, so a
//! bare `{"optimize_events": true}` is a complete configuration.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Global name of the sink function the supervisor binds into the page.
pub const DEFAULT_BINDING: &str = "__osn_fingerprint_report__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Report each `(api, method)` pair at most once per page lifetime.
    pub optimize_events: bool,
    /// Global name of the sink function.
    pub binding: String,
    /// Swallow instrumentation faults without diagnostics.
    pub silent_errors: bool,
    /// Attach the page call stack to each event.
    pub capture_stack: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            optimize_events: false,
            binding: DEFAULT_BINDING.to_string(),
            silent_errors: true,
            capture_stack: true,
        }
    }
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn with_optimize_events(mut self, enabled: bool) -> Self {
        self.optimize_events = enabled;
        self
    }

    pub fn with_binding(mut self, binding: impl Into<String>) -> Self {
        self.binding = binding.into();
        self
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.binding.trim().is_empty() {
            return Err(SettingsError::EmptyBinding);
        }
        Ok(())
    }
}
