//! Config Module for the Example Playground
//!
//! Debounce windows, sandbox limits and pretty-printer settings. Every field
//! has a default so partial JSON files are accepted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaygroundConfig {
    /// Quiet period after the last edit before the pipeline re-runs.
    pub recompute_debounce_ms: u64,
    /// Quiet period before an error report is published.
    pub error_debounce_ms: u64,
    /// Evaluation steps a single run may take before it is aborted.
    pub max_steps: u64,
    /// Nested call/render depth a single run may reach.
    pub max_call_depth: usize,
    /// Element and child-array nesting a single mount may reach.
    pub max_mount_depth: usize,
    /// Longest string a run may build, in UTF-16 code units.
    pub max_string_length: usize,
    /// Longest array a run may build.
    pub max_array_length: usize,
    pub repo_url: String,
    pub pretty: PrettyOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrettyOptions {
    pub indent_size: usize,
    pub indent_char: char,
    pub end_with_newline: bool,
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        PlaygroundConfig {
            recompute_debounce_ms: 100,
            error_debounce_ms: 800,
            max_steps: 1_000_000,
            max_call_depth: 96,
            max_mount_depth: 512,
            max_string_length: 1 << 24,
            max_array_length: 1 << 20,
            repo_url: "https://github.com/Semantic-Org/Semantic-UI-React".to_string(),
            pretty: PrettyOptions::default(),
        }
    }
}

impl Default for PrettyOptions {
    fn default() -> Self {
        PrettyOptions {
            indent_size: 2,
            indent_char: ' ',
            end_with_newline: false,
        }
    }
}

impl PlaygroundConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source,
        })?;
        Self::from_json_str(&data)
    }

    pub fn recompute_window(&self) -> Duration {
        Duration::from_millis(self.recompute_debounce_ms)
    }

    pub fn error_window(&self) -> Duration {
        Duration::from_millis(self.error_debounce_ms)
    }
}

impl PrettyOptions {
    pub fn indent_unit(&self) -> String {
        std::iter::repeat(self.indent_char)
            .take(self.indent_size)
            .collect()
    }
}
