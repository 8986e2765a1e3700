//! # Example Playground
//!
//! Live "edit and preview" pipeline for documentation examples.
//!
//! ## Pipeline
//!
//! 1. **Import rewrite** (`imports`): the leading `import` block becomes
//!    `const` bindings against uppercase registry symbols
//!    (`semantic-ui-react` → `SEMANTIC_UI_REACT`).
//! 2. **Body extraction** (`body`): the `export default` marker is stripped and
//!    the export name captured.
//! 3. **Assembly** (`sandbox`): bindings and body are wrapped in
//!    `(function() { ... return Name }())`.
//! 4. **Transpile** (`transpile`): JSX is lowered to `__jsx(...)` calls.
//! 5. **Execute** (`engine`): the program runs in the sandbox interpreter whose
//!    only ambient names are the intrinsics, the pragmas and the registry
//!    symbols the program references. The result is mounted (`render`) and
//!    serialized (`markup`).
//!
//! Panels (`panel`) debounce edits (recompute window) and error reports
//! (error window) independently; the batch renderer (`batch`) renders a
//! whole example store in parallel.
//!
//! ## Error Taxonomy
//!
//! - Skipped imports are never fatal; they are logged at debug level.
//! - `PipelineError::Syntax`: the transform stage rejected the program.
//! - `PipelineError::InvalidExport`: the default export is not an element.
//! - `PipelineError::Evaluation`: an exception escaped evaluation or mounting,
//!   including exhausted step or call-depth limits.

pub mod batch;
pub mod body;
pub mod cache;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod imports;
pub mod interpreter;
pub mod intrinsics;
pub mod library;
pub mod markup;
pub mod panel;
pub mod pipeline;
pub mod pretty;
pub mod registry;
pub mod render;
pub mod sandbox;
pub mod store;
pub mod transpile;
pub mod value;

#[cfg(test)]
mod interpreter_tests;
#[cfg(test)]
mod panel_tests;
#[cfg(test)]
mod pipeline_tests;

pub use config::{PlaygroundConfig, PrettyOptions};
pub use engine::Artifact;
pub use error::{ConfigError, ErrorKind, PipelineError, StoreError};
pub use markup::{render_to_static_markup, Node};
pub use panel::{Clipboard, ExamplePanel, PanelSnapshot, PanelStatus};
pub use pipeline::{CompiledProgram, Pipeline};
pub use registry::{HostValue, SymbolRegistry};
pub use sandbox::{rewrite_snippet, RewrittenProgram};
pub use store::{DirectoryExampleStore, ExampleStore, MemoryExampleStore};
