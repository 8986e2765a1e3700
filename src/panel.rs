//! Panel Module for the Example Playground
//!
//! One live example: its snippet text, the last successful artifact, the error
//! overlay and the two debounced channels that drive them.
//!
//! ```text
//! Idle → edit → PendingRecompute → run ─┬─ ok  → Idle
//!                                        └─ err → PendingErrorReport → ErrorShown
//! ```
//!
//! Timer callbacks hold a `Weak` handle to the panel state, so a callback that
//! outlives `unmount` finds nothing to update.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::PlaygroundConfig;
use crate::debounce::Debouncer;
use crate::engine::Artifact;
use crate::error::StoreError;
use crate::imports::split_words;
use crate::pipeline::Pipeline;
use crate::pretty::format_html;
use crate::store::ExampleStore;

/// How long the "copied" indicator stays on after `copy_source`.
pub const COPIED_INDICATOR: Duration = Duration::from_millis(1000);

/// Receives text on explicit user actions.
pub trait Clipboard {
    fn copy(&self, text: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PanelStatus {
    Idle,
    PendingRecompute,
    PendingErrorReport,
    ErrorShown,
}

/// Serializable view of a panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub example_path: String,
    pub status: PanelStatus,
    pub source: String,
    pub markup: Option<String>,
    pub error: Option<String>,
    pub has_changed: bool,
    pub show_code: bool,
    pub show_html: bool,
    pub copied_code: bool,
}

struct PanelState {
    example_path: String,
    original: Option<String>,
    source: String,
    artifact: Option<Artifact>,
    error: Option<String>,
    status: PanelStatus,
    show_code: bool,
    show_html: bool,
    copied_code: bool,
    torn_down: bool,
    recompute_timer: Debouncer,
    error_timer: Debouncer,
    copied_timer: Debouncer,
}

pub struct ExamplePanel {
    state: Rc<RefCell<PanelState>>,
    pipeline: Rc<Pipeline>,
    store: Rc<dyn ExampleStore>,
    config: PlaygroundConfig,
}

impl ExamplePanel {
    pub fn new(
        example_path: impl Into<String>,
        pipeline: Rc<Pipeline>,
        store: Rc<dyn ExampleStore>,
        config: PlaygroundConfig,
    ) -> Self {
        let state = PanelState {
            example_path: example_path.into(),
            original: None,
            source: String::new(),
            artifact: None,
            error: None,
            status: PanelStatus::Idle,
            show_code: false,
            show_html: false,
            copied_code: false,
            torn_down: false,
            recompute_timer: Debouncer::new(config.recompute_window()),
            error_timer: Debouncer::new(config.error_window()),
            copied_timer: Debouncer::new(COPIED_INDICATOR),
        };
        ExamplePanel {
            state: Rc::new(RefCell::new(state)),
            pipeline,
            store,
            config,
        }
    }

    pub fn example_path(&self) -> String {
        self.state.borrow().example_path.clone()
    }

    /// Load the original snippet and render it synchronously.
    pub fn mount(&self) -> Result<(), StoreError> {
        let original = self.original_source()?;
        let path = self.example_path();
        info!(path = %path, "mounting example");

        let result = self.pipeline.run(&path, &original);
        let mut state = self.state.borrow_mut();
        state.torn_down = false;
        state.source = original;
        state.error_timer.cancel();
        match result {
            Ok(artifact) => {
                state.artifact = Some(artifact);
                state.error = None;
                state.status = PanelStatus::Idle;
            }
            Err(err) => {
                state.error = Some(err.to_string());
                state.status = PanelStatus::ErrorShown;
            }
        }
        Ok(())
    }

    /// Memoized: the store is asked at most once per panel.
    fn original_source(&self) -> Result<String, StoreError> {
        if let Some(original) = self.state.borrow().original.clone() {
            return Ok(original);
        }
        let path = self.example_path();
        let original = self.store.load(&path)?;
        self.state.borrow_mut().original = Some(original.clone());
        Ok(original)
    }

    /// Replace the snippet text and schedule a recompute.
    pub fn edit(&self, text: impl Into<String>) {
        let weak = Rc::downgrade(&self.state);
        let pipeline = Rc::clone(&self.pipeline);
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            return;
        }
        state.source = text.into();
        state.status = PanelStatus::PendingRecompute;
        state
            .recompute_timer
            .schedule(move || recompute(&weak, &pipeline));
    }

    /// Restore the original text; does nothing when it was never changed.
    pub fn reset(&self) -> bool {
        if !self.has_changed() {
            return false;
        }
        let original = self.state.borrow().original.clone().unwrap_or_default();
        info!(path = %self.example_path(), "resetting example");
        self.edit(original);
        true
    }

    pub fn has_changed(&self) -> bool {
        let state = self.state.borrow();
        state
            .original
            .as_ref()
            .map_or(false, |original| *original != state.source)
    }

    pub fn toggle_code(&self) -> bool {
        let mut state = self.state.borrow_mut();
        state.show_code = !state.show_code;
        state.show_code
    }

    pub fn toggle_html(&self) -> bool {
        let mut state = self.state.borrow_mut();
        state.show_html = !state.show_html;
        state.show_html
    }

    pub fn is_active(&self) -> bool {
        let state = self.state.borrow();
        state.show_code || state.show_html
    }

    /// Pretty-printed markup, only while the HTML view is shown.
    pub fn formatted_markup(&self) -> Option<String> {
        let state = self.state.borrow();
        if !state.show_html {
            return None;
        }
        let markup = state.artifact.as_ref().map(|a| a.markup.as_str()).unwrap_or("");
        Some(format_html(markup, &self.config.pretty))
    }

    pub fn source(&self) -> String {
        self.state.borrow().source.clone()
    }

    pub fn markup(&self) -> Option<String> {
        self.state.borrow().artifact.as_ref().map(|a| a.markup.clone())
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn status(&self) -> PanelStatus {
        self.state.borrow().status
    }

    pub fn artifact(&self) -> Option<Artifact> {
        self.state.borrow().artifact.clone()
    }

    /// The clipboard is called with no panel borrow held, so it may read the
    /// panel back.
    pub fn copy_source(&self, clipboard: &dyn Clipboard) {
        let weak = Rc::downgrade(&self.state);
        let source = self.state.borrow().source.clone();
        clipboard.copy(&source);
        let mut state = self.state.borrow_mut();
        state.copied_code = true;
        state.copied_timer.schedule(move || {
            if let Some(state) = weak.upgrade() {
                state.borrow_mut().copied_code = false;
            }
        });
    }

    /// Copy `<page_url>#<anchor>` and return it.
    pub fn copy_link(&self, clipboard: &dyn Clipboard, page_url: &str) -> String {
        let base = page_url.split('#').next().unwrap_or(page_url);
        let link = format!("{}#{}", base, self.anchor_name());
        clipboard.copy(&link);
        link
    }

    /// `ButtonExampleEmphasis` → `button-example-emphasis`.
    pub fn anchor_name(&self) -> String {
        let path = self.example_path();
        let file = path.rsplit('/').next().unwrap_or(&path);
        kebab_case(file)
    }

    /// Link to edit the example on the hosting repository.
    pub fn edit_url(&self) -> String {
        let path = self.example_path();
        let file = path.rsplit('/').next().unwrap_or(&path);
        format!(
            "{}/edit/master/docs/src/examples/{}.js?message=docs({}): your description",
            self.config.repo_url.trim_end_matches('/'),
            path,
            file
        )
    }

    /// DOM id of the code (`-jsx`) or markup (`-html`) editor.
    pub fn editor_id(&self, html: bool) -> String {
        let suffix = if html { "html" } else { "jsx" };
        format!("{}-{}", kebab_case(&self.example_path()), suffix)
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let has_changed = self.has_changed();
        let state = self.state.borrow();
        PanelSnapshot {
            example_path: state.example_path.clone(),
            status: state.status,
            source: state.source.clone(),
            markup: state.artifact.as_ref().map(|a| a.markup.clone()),
            error: state.error.clone(),
            has_changed,
            show_code: state.show_code,
            show_html: state.show_html,
            copied_code: state.copied_code,
        }
    }

    /// Cancel all timers; later callbacks become no-ops.
    pub fn unmount(&self) {
        let mut state = self.state.borrow_mut();
        if state.torn_down {
            return;
        }
        state.torn_down = true;
        state.recompute_timer.cancel();
        state.error_timer.cancel();
        state.copied_timer.cancel();
        debug!(path = %state.example_path, "panel torn down");
    }
}

impl Drop for ExamplePanel {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn kebab_case(input: &str) -> String {
    split_words(input).join("-").to_lowercase()
}

// ═══════════════════════════════════════════════════════════════════════════════
// TIMER CALLBACKS
// ═══════════════════════════════════════════════════════════════════════════════

fn recompute(weak: &Weak<RefCell<PanelState>>, pipeline: &Pipeline) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let (path, source) = {
        let state = state.borrow();
        if state.torn_down {
            return;
        }
        (state.example_path.clone(), state.source.clone())
    };

    let result = pipeline.run(&path, &source);

    let mut state = state.borrow_mut();
    if state.torn_down {
        return;
    }
    let message = match result {
        Ok(artifact) => {
            state.error = None;
            state.artifact = Some(artifact);
            state.status = PanelStatus::Idle;
            None
        }
        Err(err) => {
            state.status = PanelStatus::PendingErrorReport;
            Some(err.to_string())
        }
    };
    // Success also goes through the error channel so a stale pending error
    // cannot land after the fix.
    let weak = weak.clone();
    state
        .error_timer
        .schedule(move || publish_error(&weak, message));
}

fn publish_error(weak: &Weak<RefCell<PanelState>>, message: Option<String>) {
    let Some(state) = weak.upgrade() else {
        return;
    };
    let mut state = state.borrow_mut();
    if state.torn_down {
        return;
    }
    match message {
        Some(message) => {
            state.error = Some(message);
            if state.status == PanelStatus::PendingErrorReport {
                state.status = PanelStatus::ErrorShown;
            }
        }
        None => state.error = None,
    }
}
