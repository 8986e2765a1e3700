use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;
use tokio::task::LocalSet;
use tokio::time::sleep;

use crate::config::PlaygroundConfig;
use crate::error::StoreError;
use crate::panel::{Clipboard, ExamplePanel, PanelStatus};
use crate::pipeline::Pipeline;
use crate::store::{ExampleStore, MemoryExampleStore};

const PATH: &str = "elements/Button/Types/ButtonExampleEmphasis";

const ORIGINAL: &str = r#"import React from 'react'
import { Button, Segment } from 'semantic-ui-react'

const ButtonExampleEmphasis = () => (
  <Segment>
    <Button>Click</Button>
  </Segment>
)

export default ButtonExampleEmphasis
"#;

const ORIGINAL_MARKUP: &str =
    r#"<div class="ui segment"><button class="ui button">Click</button></div>"#;

fn button(label: &str) -> String {
    format!(
        "import React from 'react'\nimport {{ Button }} from 'semantic-ui-react'\n\nexport default () => <Button>{}</Button>\n",
        label
    )
}

fn button_markup(label: &str) -> String {
    format!(r#"<button class="ui button">{}</button>"#, label)
}

/// Store that counts how often it is asked for an example.
struct CountingStore {
    inner: MemoryExampleStore,
    loads: Cell<usize>,
}

impl ExampleStore for CountingStore {
    fn load(&self, path: &str) -> Result<String, StoreError> {
        self.loads.set(self.loads.get() + 1);
        self.inner.load(path)
    }

    fn paths(&self) -> Vec<String> {
        self.inner.paths()
    }
}

#[derive(Default)]
struct RecordingClipboard {
    copied: RefCell<Vec<String>>,
}

impl Clipboard for RecordingClipboard {
    fn copy(&self, text: &str) {
        self.copied.borrow_mut().push(text.to_string());
    }
}

/// Clipboard that looks at the panel while it is being written to.
struct ReadBackClipboard<'p> {
    panel: &'p ExamplePanel,
    /// `(copied text, panel source, copied indicator)` per call.
    seen: RefCell<Vec<(String, String, bool)>>,
}

impl Clipboard for ReadBackClipboard<'_> {
    fn copy(&self, text: &str) {
        let copied = self.panel.snapshot().copied_code;
        self.seen
            .borrow_mut()
            .push((text.to_string(), self.panel.source(), copied));
    }
}

fn counting_store(source: &str) -> Rc<CountingStore> {
    Rc::new(CountingStore {
        inner: MemoryExampleStore::new().with(PATH, source),
        loads: Cell::new(0),
    })
}

fn panel_with(store: Rc<dyn ExampleStore>) -> ExamplePanel {
    ExamplePanel::new(
        PATH,
        Rc::new(Pipeline::standard()),
        store,
        PlaygroundConfig::default(),
    )
}

fn panel() -> ExamplePanel {
    panel_with(counting_store(ORIGINAL))
}

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

// ═══════════════════════════════════════════════════════════════════════════════
// MOUNT
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_mount_renders_original() {
    let panel = panel();
    panel.mount().unwrap();

    assert_eq!(panel.markup().as_deref(), Some(ORIGINAL_MARKUP));
    assert_eq!(panel.source(), ORIGINAL);
    assert_eq!(panel.error(), None);
    assert_eq!(panel.status(), PanelStatus::Idle);
    assert!(!panel.has_changed());
    assert_eq!(
        panel.artifact().and_then(|a| a.component).as_deref(),
        Some("ButtonExampleEmphasis")
    );
}

#[test]
fn test_mount_error_is_shown_immediately() {
    let panel = panel_with(counting_store("export default 42"));
    panel.mount().unwrap();

    assert_eq!(panel.markup(), None);
    assert_eq!(panel.status(), PanelStatus::ErrorShown);
    assert_eq!(
        panel.error().as_deref(),
        Some("Default export is not a valid element. Type:[object Number]")
    );
}

#[test]
fn test_mount_missing_example() {
    let panel = panel_with(Rc::new(MemoryExampleStore::new()));
    assert!(matches!(panel.mount(), Err(StoreError::NotFound(_))));
}

#[test]
fn test_store_is_read_once() {
    let store = counting_store(ORIGINAL);
    let panel = panel_with(store.clone());

    panel.mount().unwrap();
    panel.mount().unwrap();
    assert_eq!(store.loads.get(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════════
// DEBOUNCED CHANNELS
// ═══════════════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn test_edits_are_coalesced() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();

            panel.edit(button("one"));
            sleep(ms(50)).await;
            panel.edit(button("two"));
            sleep(ms(40)).await;
            panel.edit(button("three"));
            assert_eq!(panel.status(), PanelStatus::PendingRecompute);

            sleep(ms(30)).await;
            assert_eq!(panel.markup().as_deref(), Some(ORIGINAL_MARKUP));

            sleep(ms(100)).await;
            assert_eq!(panel.markup(), Some(button_markup("three")));
            assert_eq!(panel.status(), PanelStatus::Idle);
            assert!(panel.has_changed());
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_errors_within_window_publish_latest_once() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();

            panel.edit("export default 1");
            sleep(ms(150)).await;
            assert_eq!(panel.status(), PanelStatus::PendingErrorReport);
            assert_eq!(panel.error(), None);
            assert_eq!(panel.markup().as_deref(), Some(ORIGINAL_MARKUP));

            panel.edit("export default 'x'");
            sleep(ms(150)).await;
            sleep(ms(500)).await;
            // First report would have landed at 900 ms; it was replaced.
            assert_eq!(panel.error(), None);

            sleep(ms(300)).await;
            assert_eq!(
                panel.error().as_deref(),
                Some("Default export is not a valid element. Type:[object String]")
            );
            assert_eq!(panel.status(), PanelStatus::ErrorShown);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_fix_within_window_cancels_pending_error() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();

            panel.edit("export default () => <div>");
            sleep(ms(150)).await;
            assert_eq!(panel.status(), PanelStatus::PendingErrorReport);

            panel.edit(button("fixed"));
            sleep(ms(150)).await;
            assert_eq!(panel.markup(), Some(button_markup("fixed")));
            assert_eq!(panel.status(), PanelStatus::Idle);

            sleep(ms(1_000)).await;
            assert_eq!(panel.error(), None);
            assert_eq!(panel.status(), PanelStatus::Idle);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_success_clears_shown_error() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();

            panel.edit("export default null");
            sleep(ms(1_000)).await;
            assert_eq!(panel.status(), PanelStatus::ErrorShown);
            assert!(panel.error().is_some());

            panel.edit(button("ok"));
            sleep(ms(150)).await;
            assert_eq!(panel.error(), None);
            assert_eq!(panel.markup(), Some(button_markup("ok")));
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_reset_only_when_changed() {
    LocalSet::new()
        .run_until(async {
            let store = counting_store(ORIGINAL);
            let panel = panel_with(store.clone());
            panel.mount().unwrap();
            assert!(!panel.reset());

            panel.edit(button("changed"));
            sleep(ms(150)).await;
            assert!(panel.has_changed());

            assert!(panel.reset());
            assert_eq!(panel.source(), ORIGINAL);
            assert!(!panel.has_changed());
            sleep(ms(150)).await;
            assert_eq!(panel.markup().as_deref(), Some(ORIGINAL_MARKUP));
            assert_eq!(store.loads.get(), 1);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_unmount_cancels_timers() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();

            panel.edit("export default 1");
            panel.unmount();
            sleep(ms(2_000)).await;
            assert_eq!(panel.error(), None);
            assert_eq!(panel.markup().as_deref(), Some(ORIGINAL_MARKUP));

            panel.edit(button("late"));
            assert_eq!(panel.source(), "export default 1");
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_dropped_panel_ignores_pending_callbacks() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();
            panel.edit("export default 1");
            drop(panel);
            sleep(ms(2_000)).await;
        })
        .await;
}

// ═══════════════════════════════════════════════════════════════════════════════
// VIEW STATE & ACTIONS
// ═══════════════════════════════════════════════════════════════════════════════

#[test]
fn test_toggles_and_formatted_markup() {
    let panel = panel();
    panel.mount().unwrap();

    assert!(!panel.is_active());
    assert_eq!(panel.formatted_markup(), None);

    assert!(panel.toggle_html());
    assert!(panel.is_active());
    assert_eq!(
        panel.formatted_markup().as_deref(),
        Some("<div class=\"ui segment\">\n  <button class=\"ui button\">Click</button>\n</div>")
    );

    assert!(panel.toggle_code());
    assert!(!panel.toggle_html());
    assert!(panel.is_active());
    assert!(!panel.toggle_code());
    assert!(!panel.is_active());
}

#[tokio::test(start_paused = true)]
async fn test_copy_source_sets_indicator() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();
            let clipboard = RecordingClipboard::default();

            panel.copy_source(&clipboard);
            assert_eq!(*clipboard.copied.borrow(), vec![ORIGINAL.to_string()]);
            assert!(panel.snapshot().copied_code);

            sleep(ms(1_100)).await;
            assert!(!panel.snapshot().copied_code);
        })
        .await;
}

#[tokio::test(start_paused = true)]
async fn test_clipboard_may_read_the_panel() {
    LocalSet::new()
        .run_until(async {
            let panel = panel();
            panel.mount().unwrap();
            let clipboard = ReadBackClipboard {
                panel: &panel,
                seen: RefCell::new(Vec::new()),
            };

            panel.copy_source(&clipboard);
            panel.copy_link(&clipboard, "https://react.semantic-ui.com/elements/button");
            let seen = clipboard.seen.borrow();
            assert_eq!(seen[0], (ORIGINAL.to_string(), ORIGINAL.to_string(), false));
            assert_eq!(
                seen[1],
                (
                    "https://react.semantic-ui.com/elements/button#button-example-emphasis".to_string(),
                    ORIGINAL.to_string(),
                    true
                )
            );
            assert!(panel.snapshot().copied_code);
        })
        .await;
}

#[test]
fn test_links_and_ids() {
    let panel = panel();
    let clipboard = RecordingClipboard::default();

    let link = panel.copy_link(&clipboard, "https://react.semantic-ui.com/elements/button#types");
    assert_eq!(
        link,
        "https://react.semantic-ui.com/elements/button#button-example-emphasis"
    );
    assert_eq!(*clipboard.copied.borrow(), vec![link.clone()]);

    assert_eq!(
        panel.edit_url(),
        "https://github.com/Semantic-Org/Semantic-UI-React/edit/master/docs/src/examples/elements/Button/Types/ButtonExampleEmphasis.js?message=docs(ButtonExampleEmphasis): your description"
    );
    assert_eq!(
        panel.editor_id(false),
        "elements-button-types-button-example-emphasis-jsx"
    );
    assert_eq!(
        panel.editor_id(true),
        "elements-button-types-button-example-emphasis-html"
    );
}

#[test]
fn test_snapshot_serializes_camel_case() {
    let panel = panel();
    panel.mount().unwrap();

    let snapshot = panel.snapshot();
    assert_eq!(snapshot.example_path, PATH);
    assert_eq!(snapshot.markup.as_deref(), Some(ORIGINAL_MARKUP));

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["status"], "idle");
    assert_eq!(json["hasChanged"], false);
    assert_eq!(json["examplePath"], PATH);
}
