//! Batch Renderer for the Example Playground
//!
//! Renders every example of a store in parallel and reports, per example,
//! either the markup digest or the pipeline error. Pipelines share only the
//! registry description; each run builds its own sandbox.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

use crate::cache::{digest, MarkupCache};
use crate::error::ErrorKind;
use crate::pipeline::Pipeline;
use crate::store::ExampleStore;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    pub path: String,
    pub markup: Option<String>,
    pub markup_digest: Option<String>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub cached: bool,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
    pub rendered: usize,
    pub failed: usize,
    pub elapsed_ms: u128,
}

impl BatchReport {
    pub fn entry(&self, path: &str) -> Option<&BatchEntry> {
        self.entries.iter().find(|e| e.path == path)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Render all examples of `store`, reusing `cache` hits when given.
pub fn render_all(
    store: &dyn ExampleStore,
    pipeline: &Pipeline,
    cache: Option<&MarkupCache>,
) -> BatchReport {
    let start = Instant::now();

    let sources: Vec<(String, Result<String, String>)> = store
        .paths()
        .into_iter()
        .map(|path| {
            let source = store.load(&path).map_err(|err| err.to_string());
            (path, source)
        })
        .collect();

    let entries: Vec<BatchEntry> = sources
        .par_iter()
        .map(|(path, source)| match source {
            Ok(source) => render_one(path, source, pipeline, cache),
            Err(message) => BatchEntry {
                path: path.clone(),
                markup: None,
                markup_digest: None,
                error: Some(message.clone()),
                error_kind: None,
                cached: false,
            },
        })
        .collect();

    let failed = entries.iter().filter(|e| !e.is_ok()).count();
    let report = BatchReport {
        rendered: entries.len() - failed,
        failed,
        entries,
        elapsed_ms: start.elapsed().as_millis(),
    };
    info!(
        rendered = report.rendered,
        failed = report.failed,
        elapsed_ms = report.elapsed_ms as u64,
        "batch render finished"
    );
    report
}

fn render_one(path: &str, source: &str, pipeline: &Pipeline, cache: Option<&MarkupCache>) -> BatchEntry {
    if let Some(markup) = cache.and_then(|c| c.get(path, source)) {
        return BatchEntry {
            path: path.to_string(),
            markup_digest: Some(digest(&markup)),
            markup: Some(markup),
            error: None,
            error_kind: None,
            cached: true,
        };
    }

    match pipeline.run(path, source) {
        Ok(artifact) => {
            if let Some(cache) = cache {
                cache.set(path, source, &artifact.markup);
            }
            BatchEntry {
                path: path.to_string(),
                markup_digest: Some(digest(&artifact.markup)),
                markup: Some(artifact.markup),
                error: None,
                error_kind: None,
                cached: false,
            }
        }
        Err(err) => {
            warn!(path = %path, error = %err, "example failed to render");
            BatchEntry {
                path: path.to_string(),
                markup: None,
                markup_digest: None,
                error: Some(err.to_string()),
                error_kind: Some(err.kind()),
                cached: false,
            }
        }
    }
}
