//! Pipeline Module for the Example Playground
//!
//! rewrite → transpile → execute for one snippet. A `Pipeline` owns its
//! registry explicitly; nothing is read from module-level state.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::PlaygroundConfig;
use crate::engine::{execute, Artifact, ExecutionContext};
use crate::error::PipelineError;
use crate::interpreter::Limits;
use crate::registry::SymbolRegistry;
use crate::sandbox::{rewrite_snippet, RewrittenProgram};
use crate::transpile::{transpile, TranspileConfig};

/// Output of the rewrite and transpile stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledProgram {
    pub program: RewrittenProgram,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    registry: SymbolRegistry,
    transpile: TranspileConfig,
    limits: Limits,
}

impl Pipeline {
    pub fn new(registry: SymbolRegistry, config: &PlaygroundConfig) -> Self {
        Pipeline {
            registry,
            transpile: TranspileConfig::default(),
            limits: Limits::from_config(config),
        }
    }

    /// Standard registry with default settings.
    pub fn standard() -> Self {
        Self::new(SymbolRegistry::standard(), &PlaygroundConfig::default())
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    #[instrument(level = "debug", skip_all)]
    pub fn compile(&self, source: &str) -> Result<CompiledProgram, PipelineError> {
        let program = rewrite_snippet(source)?;
        debug!(
            export = %program.export_name,
            symbols = ?program.symbols,
            skipped = program.skipped_imports.len(),
            "snippet rewritten"
        );
        let code = transpile(&program.code, &self.transpile)?;
        Ok(CompiledProgram { program, code })
    }

    /// Run the whole pipeline for the snippet identified by `snippet_key`.
    #[instrument(skip(self, source), fields(key = %snippet_key))]
    pub fn run(&self, snippet_key: &str, source: &str) -> Result<Artifact, PipelineError> {
        let result = self.compile(source).and_then(|compiled| {
            let ctx = ExecutionContext {
                registry: &self.registry,
                snippet_key,
                symbols: &compiled.program.symbols,
                limits: self.limits,
            };
            execute(&compiled.code, &ctx)
        });
        match &result {
            Ok(artifact) => debug!(steps = artifact.steps, bytes = artifact.markup.len(), "pipeline succeeded"),
            Err(err) => warn!(kind = ?err.kind(), error = %err, "pipeline failed"),
        }
        result
    }
}
