use crate::batch::render_all;
use crate::cache::{digest, MarkupCache};
use crate::config::PlaygroundConfig;
use crate::error::{ErrorKind, PipelineError};
use crate::pipeline::Pipeline;
use crate::registry::SymbolRegistry;
use crate::store::MemoryExampleStore;

fn markup_of(source: &str) -> String {
    match Pipeline::standard().run("docs/Test/Example", source) {
        Ok(artifact) => artifact.markup,
        Err(err) => panic!("pipeline failed: {}", err),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILE STAGE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_compile_emits_one_binding_per_import_in_order() {
    let compiled = Pipeline::standard()
        .compile("import faker from 'faker'\nimport _ from 'lodash'\nimport React from 'react'\n\nexport default () => <p />\n")
        .unwrap();

    let code = &compiled.program.code;
    let faker = code.find("const faker = FAKER;").unwrap();
    let lodash = code.find("const _ = LODASH;").unwrap();
    let react = code.find("const React = REACT;").unwrap();
    assert!(faker < lodash && lodash < react);
    assert_eq!(compiled.program.symbols, vec!["FAKER", "LODASH", "REACT"]);
}

#[test]
fn test_compile_returns_named_export() {
    let compiled = Pipeline::standard()
        .compile("import React from 'react'\nconst Foo = () => <div />\n\nexport default Foo;\n")
        .unwrap();

    assert_eq!(compiled.program.export_name, "Foo");
    assert!(compiled.program.code.ends_with("return Foo\n}())"));
    assert!(compiled.code.contains("__jsx(\"div\""));
}

#[test]
fn test_compile_reports_skipped_imports() {
    let compiled = Pipeline::standard()
        .compile("import 'semantic-ui-css/semantic.css'\nimport React from 'react'\nexport default () => <b>ok</b>\n")
        .unwrap();
    assert_eq!(compiled.program.skipped_imports.len(), 1);
}

#[test]
fn test_broken_jsx_is_a_syntax_error() {
    let err = Pipeline::standard()
        .run("docs/Broken", "import React from 'react'\nexport default () => <div>\n")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(!err.to_string().is_empty());
}

#[test]
fn test_missing_default_export() {
    let err = Pipeline::standard()
        .run("docs/NoExport", "const x = 1\n")
        .unwrap_err();
    assert_eq!(err, PipelineError::MissingDefaultExport);
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXECUTE STAGE
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_constant_export_is_invalid() {
    let err = Pipeline::standard()
        .run("docs/Number", "export default 42")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidExport);
    assert_eq!(
        err.to_string(),
        "Default export is not a valid element. Type:[object Number]"
    );
}

#[test]
fn test_class_extending_namespace_component() {
    let source = "import Foo from 'semantic-ui-react'\n\nexport default class X extends Foo.Component {\n  render() { return <div /> }\n}\n";
    assert_eq!(markup_of(source), "<div></div>");
}

#[test]
fn test_class_component_with_state_field() {
    let source = r#"import React, { Component } from 'react'

export default class Toggle extends Component {
  state = { on: true }

  render() {
    return <span>{this.state.on ? 'on' : 'off'}</span>
  }
}
"#;
    assert_eq!(markup_of(source), "<span>on</span>");
}

#[test]
fn test_semantic_components_render_markup() {
    let source = r#"import React from 'react'
import { Button, Segment } from 'semantic-ui-react'

const ButtonExample = () => (
  <Segment>
    <Button primary>Save</Button>
  </Segment>
)

export default ButtonExample
"#;
    assert_eq!(
        markup_of(source),
        r#"<div class="ui segment"><button class="ui primary button">Save</button></div>"#
    );
}

#[test]
fn test_wireframe_placeholder() {
    let source = r#"import React from 'react'
import Wireframe from '../Wireframe'

const Placeholder = () => <Wireframe />

export default Placeholder
"#;
    assert_eq!(
        markup_of(source),
        r#"<div class="ui segment"><img class="ui image" src="/images/wireframe/paragraph.png"/></div>"#
    );
}

#[test]
fn test_lodash_lists_and_fragments() {
    let source = r#"import _ from 'lodash'
import React from 'react'

const Items = () => (
  <>
    <h4>Items</h4>
    <ul>{_.times(3, i => <li key={i}>{i}</li>)}</ul>
  </>
)

export default Items
"#;
    assert_eq!(
        markup_of(source),
        "<h4>Items</h4><ul><li>0</li><li>1</li><li>2</li></ul>"
    );
}

#[test]
fn test_render_time_exception() {
    let err = Pipeline::standard()
        .run(
            "docs/Throws",
            "import React from 'react'\nexport default () => { throw new Error('render failed') }\n",
        )
        .unwrap_err();
    assert_eq!(err, PipelineError::evaluation("render failed"));
}

#[test]
fn test_repeated_runs_are_identical() {
    let source = r#"import faker from 'faker'
import React from 'react'

const Person = () => <p>{faker.name.findName()}</p>

export default Person
"#;
    let pipeline = Pipeline::standard();
    let first = pipeline.run("docs/Person", source).unwrap();
    let second = pipeline.run("docs/Person", source).unwrap();
    assert_eq!(first.markup, second.markup);
    assert_eq!(first.root, second.root);
}

#[test]
fn test_configured_step_budget() {
    let config = PlaygroundConfig {
        max_steps: 2_000,
        ..PlaygroundConfig::default()
    };
    let pipeline = Pipeline::new(SymbolRegistry::standard(), &config);
    let err = pipeline
        .run("docs/Spin", "const Spin = () => { while (true) {} }\nexport default Spin\n")
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Evaluation);
    assert_eq!(
        err.to_string(),
        "Execution aborted after exceeding 2000 evaluation steps"
    );
}

#[test]
fn test_space_between_expressions_is_kept() {
    let source = "import React from 'react'\nexport default () => <p>{1} {2}</p>\n";
    assert_eq!(markup_of(source), "<p>1 2</p>");
}

fn evaluation_error(source: &str) -> String {
    let err = Pipeline::standard().run("docs/Runaway", source).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Evaluation, "{}", err);
    err.to_string()
}

#[test]
fn test_self_containing_children_fail_cleanly() {
    let source = "import React from 'react'\nexport default () => <p>{(() => { const a = []; a.push(a); return a })()}</p>\n";
    assert_eq!(evaluation_error(source), "Maximum call stack size exceeded");
}

#[test]
fn test_runaway_allocations_fail_cleanly() {
    assert_eq!(
        evaluation_error("import _ from 'lodash'\nimport React from 'react'\nexport default () => <p>{_.times(1e9, i => i)}</p>\n"),
        "Invalid array length"
    );
    assert_eq!(
        evaluation_error("import React from 'react'\nexport default () => <p>{new Array(1e9).fill(0)}</p>\n"),
        "Invalid array length"
    );
    assert_eq!(
        evaluation_error("import React from 'react'\nexport default () => <p>{'a'.repeat(1e10)}</p>\n"),
        "Invalid string length"
    );
}

#[test]
fn test_configured_string_cap() {
    let config = PlaygroundConfig {
        max_string_length: 4,
        ..PlaygroundConfig::default()
    };
    let pipeline = Pipeline::new(SymbolRegistry::standard(), &config);
    let err = pipeline
        .run("docs/Long", "import React from 'react'\nexport default () => <p>{'ab' + 'abc'}</p>\n")
        .unwrap_err();
    assert_eq!(err, PipelineError::evaluation("Invalid string length"));
}

#[test]
fn test_semantic_form_controls() {
    let source = r#"import React from 'react'
import { Checkbox, Input } from 'semantic-ui-react'

const Controls = () => (
  <>
    <Input placeholder='Search...' />
    <Checkbox label='Agree' />
  </>
)

export default Controls
"#;
    assert_eq!(
        markup_of(source),
        concat!(
            r#"<div class="ui input"><input type="text" placeholder="Search..."/></div>"#,
            r#"<div class="ui checkbox"><input type="checkbox" class="hidden" readonly="" tabindex="0"/><label>Agree</label></div>"#,
        )
    );
}

#[test]
fn test_semantic_table_parts() {
    let source = r#"import React from 'react'
import { Table } from 'semantic-ui-react'

const People = () => (
  <Table celled>
    <Table.Header>
      <Table.Row><Table.HeaderCell>Name</Table.HeaderCell></Table.Row>
    </Table.Header>
    <Table.Body>
      <Table.Row><Table.Cell>Ann</Table.Cell></Table.Row>
    </Table.Body>
  </Table>
)

export default People
"#;
    assert_eq!(
        markup_of(source),
        r#"<table class="ui celled table"><thead><tr><th>Name</th></tr></thead><tbody><tr><td>Ann</td></tr></tbody></table>"#
    );
}

#[test]
fn test_lodash_collection_helpers() {
    let source = r#"import _ from 'lodash'
import React from 'react'

const people = [{ name: 'cy', age: 3 }, { name: 'al', age: 1 }, { name: 'bo', age: 2 }]

const Summary = () => (
  <p>
    {[
      _.map(_.sortBy(people, 'age'), 'name').join(''),
      _.uniq([1, 1, 2, 3, 3]).join(''),
      _.chunk([1, 2, 3, 4, 5], 2).length,
      _.get({ a: { b: [7] } }, 'a.b[0]'),
      _.get({}, 'x.y', 'none'),
      _.sum([1, 2, 3]),
      _.find(people, { age: 2 }).name,
    ].join(' ')}
  </p>
)

export default Summary
"#;
    assert_eq!(markup_of(source), "<p>albocy 123 3 7 none 6 bo</p>");
}

// ═══════════════════════════════════════════════════════════════════════════════
// BATCH RENDERING
// ═══════════════════════════════════════════════════════════════════════════════

fn batch_store() -> MemoryExampleStore {
    MemoryExampleStore::new()
        .with(
            "elements/Button/Types/ButtonExample",
            "import React from 'react'\nimport { Button } from 'semantic-ui-react'\n\nconst ButtonExample = () => <Button>Click</Button>\n\nexport default ButtonExample\n",
        )
        .with("elements/Broken/Number", "export default 7")
}

#[test]
fn test_batch_report() {
    let report = render_all(&batch_store(), &Pipeline::standard(), None);

    assert_eq!(report.rendered, 1);
    assert_eq!(report.failed, 1);

    let ok = report.entry("elements/Button/Types/ButtonExample").unwrap();
    let markup = ok.markup.as_deref().unwrap();
    assert_eq!(markup, r#"<button class="ui button">Click</button>"#);
    assert_eq!(ok.markup_digest.as_deref(), Some(digest(markup).as_str()));

    let bad = report.entry("elements/Broken/Number").unwrap();
    assert!(!bad.is_ok());
    assert_eq!(bad.error_kind, Some(ErrorKind::InvalidExport));

    let json = report.to_json().unwrap();
    assert!(json.contains("\"markupDigest\""));
}

#[test]
fn test_batch_uses_markup_cache() {
    let dir = tempfile::tempdir().unwrap();
    let cache = MarkupCache::new(dir.path());
    let store = batch_store();
    let pipeline = Pipeline::standard();

    let first = render_all(&store, &pipeline, Some(&cache));
    assert!(!first.entry("elements/Button/Types/ButtonExample").unwrap().cached);

    let second = render_all(&store, &pipeline, Some(&cache));
    let entry = second.entry("elements/Button/Types/ButtonExample").unwrap();
    assert!(entry.cached);
    assert_eq!(
        entry.markup,
        first.entry("elements/Button/Types/ButtonExample").unwrap().markup
    );
    assert!(!second.entry("elements/Broken/Number").unwrap().cached);
}
