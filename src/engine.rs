//! Engine Module for the Example Playground
//!
//! Runs compiled program text in the sandbox interpreter and turns the result
//! into a mounted artifact. The only ambient bindings are the interpreter
//! intrinsics, the JSX pragmas and the registry symbols the program names.
//!
//! Evaluation runs on a dedicated thread with a large stack so that deeply
//! nested snippets hit the call-depth limit before the host stack.

use oxc_allocator::Allocator;
use oxc_parser::Parser;
use serde::{Deserialize, Serialize};
use std::thread;
use tracing::debug;

use crate::error::PipelineError;
use crate::interpreter::{Fault, Interpreter, Limits};
use crate::library::create_element;
use crate::markup::{render_to_static_markup, Node};
use crate::registry::SymbolRegistry;
use crate::render::mount;
use crate::transpile::{TranspileConfig, JSX_FRAGMENT_PRAGMA, JSX_PRAGMA};
use crate::value::{ObjectKind, Value};

const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Result of one successful run: the mounted tree and its markup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub root: Node,
    pub markup: String,
    /// Display name of the default export when it was a component.
    pub component: Option<String>,
    pub steps: u64,
}

/// Everything a run needs besides the compiled text.
pub struct ExecutionContext<'r> {
    pub registry: &'r SymbolRegistry,
    pub snippet_key: &'r str,
    pub symbols: &'r [String],
    pub limits: Limits,
}

/// Evaluate `compiled` and mount its default export.
pub fn execute(compiled: &str, ctx: &ExecutionContext<'_>) -> Result<Artifact, PipelineError> {
    thread::scope(|scope| {
        let handle = thread::Builder::new()
            .name("playground-eval".to_string())
            .stack_size(EVAL_STACK_SIZE)
            .spawn_scoped(scope, || evaluate(compiled, ctx));
        match handle {
            Ok(handle) => handle
                .join()
                .unwrap_or_else(|_| Err(PipelineError::evaluation("Evaluation aborted"))),
            // No spare thread: run inline and rely on the depth limit.
            Err(err) => {
                debug!(error = %err, "evaluating on the calling thread");
                evaluate(compiled, ctx)
            }
        }
    })
}

fn evaluate(compiled: &str, ctx: &ExecutionContext<'_>) -> Result<Artifact, PipelineError> {
    let allocator = Allocator::default();
    let source_type = TranspileConfig::default().source_type().with_jsx(false);
    let ret = Parser::new(&allocator, compiled, source_type).parse();
    if !ret.errors.is_empty() || ret.panicked {
        let message = ret
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        return Err(PipelineError::syntax(message));
    }
    let program = allocator.alloc(ret.program);

    let mut interp = Interpreter::new(ctx.limits);
    install_pragmas(&interp);
    ctx.registry
        .materialize(ctx.symbols, ctx.snippet_key, interp.global());

    let value = interp.run_program(program).map_err(into_pipeline_error)?;
    let (element, component) = classify(&mut interp, value)?;
    let root = mount(&mut interp, &element).map_err(into_pipeline_error)?;
    let steps = interp.steps();
    debug!(steps, component = ?component, "sandbox run finished");

    Ok(Artifact {
        markup: render_to_static_markup(&root),
        root,
        component,
        steps,
    })
}

fn install_pragmas(interp: &Interpreter<'_>) {
    let global = interp.global();
    global.declare(JSX_PRAGMA, Value::native("createElement", create_element), false);
    global.declare(JSX_FRAGMENT_PRAGMA, Value::object(ObjectKind::Fragment), false);
}

/// Callable exports become `<Export />`; anything else must already be an element.
fn classify<'a>(
    interp: &mut Interpreter<'a>,
    value: Value<'a>,
) -> Result<(Value<'a>, Option<String>), PipelineError> {
    let (element, component) = if value.is_callable() {
        let name = match interp.get(&value, "name") {
            Ok(Value::String(name)) if !name.is_empty() => Some(name.to_string()),
            _ => None,
        };
        let element = create_element(interp, Value::Undefined, vec![value])
            .map_err(into_pipeline_error)?;
        (element, name)
    } else {
        (value, None)
    };

    if !element.is_element() {
        return Err(PipelineError::InvalidExport {
            type_tag: element.type_tag(),
        });
    }
    Ok((element, component))
}

fn into_pipeline_error(fault: Fault<'_>) -> PipelineError {
    PipelineError::evaluation(fault.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(compiled: &str, symbols: &[&str]) -> Result<Artifact, PipelineError> {
        let registry = SymbolRegistry::standard();
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
        let ctx = ExecutionContext {
            registry: &registry,
            snippet_key: "elements/Button/Types/ButtonExample",
            symbols: &symbols,
            limits: Limits::default(),
        };
        execute(compiled, &ctx)
    }

    #[test]
    fn test_function_export_is_mounted() {
        let artifact = run(
            "(function() { const A = () => __jsx('p', null, 'hi'); return A }())",
            &[],
        )
        .unwrap();
        assert_eq!(artifact.markup, "<p>hi</p>");
        assert_eq!(artifact.component.as_deref(), Some("A"));
    }

    #[test]
    fn test_non_element_is_invalid_export() {
        let err = run("(function() { return 42 }())", &[]).unwrap_err();
        assert_eq!(err.to_string(), "Default export is not a valid element. Type:[object Number]");
    }

    #[test]
    fn test_thrown_error_message() {
        let err = run("(function() { throw new Error('boom') }())", &[]).unwrap_err();
        assert_eq!(err, PipelineError::evaluation("boom"));
    }

    #[test]
    fn test_registry_symbols_only_when_named() {
        let err = run("(function() { return LODASH }())", &[]).unwrap_err();
        assert_eq!(err, PipelineError::evaluation("LODASH is not defined"));
    }

    #[test]
    fn test_infinite_loop_hits_step_budget() {
        let err = run("(function() { while (true) {} }())", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::Evaluation { .. }));
    }

    #[test]
    fn test_runaway_recursion_hits_depth_limit() {
        let err = run("(function() { function f() { return f() } return f() }())", &[]).unwrap_err();
        assert_eq!(err, PipelineError::evaluation("Maximum call stack size exceeded"));
    }
}
