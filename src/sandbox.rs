//! Sandbox Assembler for the Example Playground
//!
//! Rewrites a snippet into a single self-invoking expression:
//!
//! ```text
//! (function() {
//! const React = REACT;
//! ...body...
//! return ButtonExample
//! }())
//! ```

use serde::{Deserialize, Serialize};

use crate::body::{extract_body, ExtractedBody};
use crate::error::PipelineError;
use crate::imports::{rewrite_imports, ImportBlock, ParseSkip, RewrittenImports};

/// The synthesized program for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewrittenProgram {
    pub code: String,
    pub export_name: String,
    /// Symbols the bindings reference, in first-use order.
    pub symbols: Vec<String>,
    pub skipped_imports: Vec<ParseSkip>,
}

impl RewrittenProgram {
    pub fn references(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }
}

pub fn assemble(
    imports: &RewrittenImports,
    body: &ExtractedBody,
) -> Result<RewrittenProgram, PipelineError> {
    let export_name = body
        .export_name()
        .ok_or(PipelineError::MissingDefaultExport)?
        .to_string();

    let code = format!(
        "(function() {{\n{}{}\nreturn {}\n}}())",
        imports.bindings, body.body, export_name
    );

    Ok(RewrittenProgram {
        code,
        export_name,
        symbols: imports.symbols.clone(),
        skipped_imports: imports.skipped.clone(),
    })
}

/// Import rewrite, body extraction and assembly in one step.
pub fn rewrite_snippet(source: &str) -> Result<RewrittenProgram, PipelineError> {
    let (block, imports): (ImportBlock, RewrittenImports) = rewrite_imports(source);
    let body = extract_body(&source[block.end..]);
    assemble(&imports, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_return() {
        let program =
            rewrite_snippet("import React from 'react'\n\nconst Foo = () => <div />\nexport default Foo;\nconst bar = 2\n")
                .unwrap();

        assert!(program.code.starts_with("(function() {\nconst React = REACT;\n"));
        assert!(program.code.ends_with("\nreturn Foo\n}())"));
        assert_eq!(program.export_name, "Foo");
        assert!(program.references("REACT"));
    }

    #[test]
    fn test_missing_export_is_reported() {
        let err = rewrite_snippet("const x = 1\n").unwrap_err();
        assert_eq!(err, PipelineError::MissingDefaultExport);
    }

    #[test]
    fn test_no_imports_constant_export() {
        let program = rewrite_snippet("export default 42").unwrap();
        assert_eq!(program.code, "(function() {\n\nreturn 42\n}())");
    }
}
