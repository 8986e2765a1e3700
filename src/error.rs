//! Error Module for the Example Playground
//!
//! Every failure a pipeline run can report ends up as a `PipelineError`.
//! Panels only ever see the rendered message, routed through the debounced
//! error channel.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of one rewrite → transpile → execute run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    /// The transform stage rejected the assembled program.
    #[error("{message}")]
    Syntax { message: String },

    /// The evaluated value is not a renderable element.
    #[error("Default export is not a valid element. Type:{type_tag}")]
    InvalidExport { type_tag: String },

    /// No default export could be located in the snippet body.
    #[error("Default export is not a valid example")]
    MissingDefaultExport,

    /// An exception escaped construction, rendering or evaluation.
    #[error("{message}")]
    Evaluation { message: String },
}

/// Coarse classification used by panel snapshots and batch reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Syntax,
    InvalidExport,
    Evaluation,
}

impl PipelineError {
    pub fn syntax(message: impl Into<String>) -> Self {
        PipelineError::Syntax {
            message: message.into(),
        }
    }

    pub fn evaluation(message: impl Into<String>) -> Self {
        PipelineError::Evaluation {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Syntax { .. } => ErrorKind::Syntax,
            PipelineError::InvalidExport { .. } | PipelineError::MissingDefaultExport => {
                ErrorKind::InvalidExport
            }
            PipelineError::Evaluation { .. } => ErrorKind::Evaluation,
        }
    }
}

/// Failure to load a snippet from an example store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Example not found: {0}")]
    NotFound(String),

    #[error("Failed to read example {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to load a playground configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = PipelineError::InvalidExport {
            type_tag: "[object Number]".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Default export is not a valid element. Type:[object Number]"
        );
        assert_eq!(
            PipelineError::MissingDefaultExport.to_string(),
            "Default export is not a valid example"
        );
        assert_eq!(PipelineError::syntax("Unexpected token").to_string(), "Unexpected token");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(PipelineError::MissingDefaultExport.kind(), ErrorKind::InvalidExport);
        assert_eq!(PipelineError::evaluation("boom").kind(), ErrorKind::Evaluation);
    }
}
