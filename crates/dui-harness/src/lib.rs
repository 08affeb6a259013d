#![forbid(unsafe_code)]

//! Test harness for the dui disclosure runtime.
//!
//! [`Page`] owns a document and a [`Runtime`], mounts fixture markup from
//! [`fixtures`], and drives it with events and virtual time. [`snapshot`]
//! captures every observable attribute of a subtree so tests can assert that
//! `open(); close()` leaves the page as it found it.
//!
//! ```
//! use dui_harness::{Page, fixtures};
//!
//! let mut page = Page::new();
//! let root = page.mount(fixtures::collapsible(&[]));
//! let trigger = page.target(root, "ui--collapsible", "trigger").unwrap();
//! page.click(trigger);
//! assert!(page.dom().attribute_is(root, "data-state", "open"));
//! ```

pub mod fixtures;

use std::rc::Rc;

use dui_core::dom::{Dom, El, ElementId};
use dui_core::event::{Event, KeyCode, KeyEvent, Modifiers, PointerEventKind};
use dui_core::geometry::Size;
use dui_widgets::{Controller, Runtime};
use serde_json::{Map, Value, json};
use web_time::Duration;

/// Viewport used by [`Page::new`].
pub const VIEWPORT: Size = Size::new(1024.0, 768.0);

/// Inline style properties the runtime writes.
const OBSERVED_STYLES: [&str; 3] = ["left", "top", "overflow"];

/// A document with a mount registry over it.
#[derive(Debug)]
pub struct Page {
    runtime: Runtime,
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

impl Page {
    pub fn new() -> Self {
        Self::with_viewport(VIEWPORT)
    }

    pub fn with_viewport(viewport: Size) -> Self {
        Self {
            runtime: Runtime::new(Dom::new(viewport)),
        }
    }

    /// Append `markup` to the body and connect the runtime.
    pub fn mount(&mut self, markup: El) -> ElementId {
        let dom = self.runtime.dom().clone();
        let root = dom.mount(dom.body(), markup);
        self.runtime.connect();
        root
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.runtime
    }

    pub fn dom(&self) -> &Dom {
        self.runtime.dom()
    }

    /// The mounted instance of `T` on `root`.
    pub fn widget<T: Controller + 'static>(&self, root: ElementId) -> Option<Rc<T>> {
        self.runtime.controller::<T>(root)
    }

    /// First element under `root` tagged `data-<identifier>-target="<name>"`.
    pub fn target(&self, root: ElementId, identifier: &str, name: &str) -> Option<ElementId> {
        self.targets(root, identifier, name).into_iter().next()
    }

    pub fn targets(&self, root: ElementId, identifier: &str, name: &str) -> Vec<ElementId> {
        self.dom()
            .select(root, &fixtures::target_attr(identifier), Some(name))
    }

    pub fn dispatch(&self, event: Event) -> bool {
        tracing::trace!(?event, "dispatch");
        self.runtime.dispatch(&event)
    }

    pub fn click(&self, target: ElementId) -> bool {
        self.dispatch(Event::click(target))
    }

    pub fn pointer(&self, kind: PointerEventKind, target: ElementId) -> bool {
        self.dispatch(Event::pointer(kind, target))
    }

    pub fn key(&self, code: KeyCode) -> bool {
        self.dispatch(Event::key(code))
    }

    pub fn key_with(&self, code: KeyCode, modifiers: Modifiers) -> bool {
        self.dispatch(Event::Key(KeyEvent::new(code).with_modifiers(modifiers)))
    }

    pub fn focus(&self, target: ElementId) -> bool {
        self.dom().focus(target)
    }

    /// Text of the focused element.
    pub fn focused_text(&self) -> Option<String> {
        self.dom().active_element().map(|id| self.dom().text(id))
    }

    /// Advance virtual time by `ms` milliseconds.
    pub fn advance_ms(&self, ms: u64) -> usize {
        self.runtime.advance(Duration::from_millis(ms))
    }

    pub fn body_overflow(&self) -> String {
        self.dom().style(self.dom().body(), "overflow")
    }
}

/// Every attribute and runtime-written inline style under `root` (root
/// included), plus the body's `overflow`.
pub fn snapshot(dom: &Dom, root: ElementId) -> Value {
    let mut elements = Vec::new();
    for id in std::iter::once(root).chain(dom.descendants(root)) {
        let attrs: Map<String, Value> = dom
            .attributes(id)
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();
        let styles: Map<String, Value> = OBSERVED_STYLES
            .iter()
            .map(|&p| (p.to_owned(), Value::String(dom.style(id, p))))
            .filter(|(_, v)| v.as_str().is_some_and(|s| !s.is_empty()))
            .collect();
        elements.push(json!({ "id": id.raw(), "attrs": attrs, "style": styles }));
    }
    json!({
        "body_overflow": dom.style(dom.body(), "overflow"),
        "elements": elements,
    })
}

/// Emit a JSONL log line for CI artifact review.
pub fn log_jsonl(test: &str, check: &str, passed: bool, detail: Value) {
    eprintln!(
        "{}",
        json!({ "test": test, "check": check, "passed": passed, "detail": detail })
    );
}
