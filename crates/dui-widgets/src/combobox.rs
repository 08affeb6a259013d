#![forbid(unsafe_code)]

//! Combobox: a text input that filters a listbox of options.
//!
//! DOM focus never leaves the input. The highlighted option carries
//! `data-highlighted` and is named by the input's `aria-activedescendant`;
//! Enter (or a click) commits it, writing its label into the input.
//!
//! Filtering is a case-insensitive substring test against each option's
//! label. Non-matching options get `hidden`; the `empty` target is shown
//! while nothing matches.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode, KeyEvent, PointerEventKind};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, MountError, Orientation, SelectionMode,
};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts};
use crate::dismiss::{DismissalConfig, DismissalController};
use crate::nav::{
    FocusMode, ItemSet, KeyboardNavigator, Selection, is_disabled, item_label, item_value,
};

pub const IDENTIFIER: &str = "ui--combobox";

type ChangeObserver = Rc<dyn Fn(&str)>;

/// Whether `label` passes the filter `query` (already lowercased).
fn matches(label: &str, query: &str) -> bool {
    query.is_empty() || label.to_lowercase().contains(query)
}

/// A mounted combobox.
pub struct Combobox {
    scope: ControllerScope,
    input: ElementId,
    content: ElementId,
    empty: Option<ElementId>,
    disclosure: Disclosure,
    nav: RefCell<KeyboardNavigator>,
    selection: RefCell<Selection>,
    query: RefCell<String>,
    observers: RefCell<Vec<ChangeObserver>>,
}

impl std::fmt::Debug for Combobox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Combobox")
            .field("input", &self.input)
            .field("query", &self.query)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl Combobox {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let input = scope.require("input")?;
        let content = scope.require("content")?;
        let defaults = DisclosureDefaults::click()
            .placement(Placement::new(Side::Bottom).align(Align::Start))
            .focus_on_open(false);
        let attrs = scope.attrs();
        let config = DisclosureConfig::read(&attrs, defaults);
        let parts = DisclosureParts {
            root,
            trigger: Some(input),
            content,
            overlay: None,
        };
        // Clicking the input opens; it never toggles closed.
        let dismissal = DismissalController::new(
            scope.widget(),
            DismissalConfig::from_disclosure(&config, false),
        );
        let disclosure = Disclosure::with_dismissal(env, scope.widget(), parts, config, dismissal);

        dui_a11y::ensure_role(dom, input, "combobox");
        dom.set_attribute(input, "aria-autocomplete", "list");
        dui_a11y::ensure_role(dom, content, "listbox");
        for option in scope.targets_within(content, "option") {
            dui_a11y::ensure_role(dom, option, "option");
            dui_a11y::ensure_id(dom, option, "ui-combobox-option");
        }

        let nav = KeyboardNavigator::new(
            ItemSet::new(&scope, content, &["option"]),
            Orientation::Vertical,
        )
        .mode(FocusMode::Virtual { host: input })
        .looping(attrs.bool("loop", true))
        .typeahead(false);

        let initial = attrs.string("value");
        let this = Rc::new(Self {
            empty: scope.target("empty"),
            scope,
            input,
            content,
            disclosure,
            nav: RefCell::new(nav),
            selection: RefCell::new(Selection::new(SelectionMode::Single)),
            query: RefCell::new(String::new()),
            observers: RefCell::new(Vec::new()),
        });
        this.filter("");
        if let Some(value) = initial {
            this.commit(&value);
        }
        Ok(this)
    }

    pub fn input(&self) -> ElementId {
        self.input
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn is_open(&self) -> bool {
        self.disclosure.is_open()
    }

    /// The committed value.
    pub fn value(&self) -> Option<String> {
        self.selection.borrow().values().first().cloned()
    }

    /// The current filter text.
    pub fn query(&self) -> String {
        self.query.borrow().clone()
    }

    /// The highlighted option.
    pub fn highlighted(&self) -> Option<ElementId> {
        self.nav.borrow().current()
    }

    /// Options passing the current filter.
    pub fn visible_count(&self) -> usize {
        self.all_options()
            .into_iter()
            .filter(|&id| !self.scope.dom().has_attribute(id, "hidden"))
            .count()
    }

    pub fn on_change(&self, observer: impl Fn(&str) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Type `query` into the input: filter, open, highlight the first match.
    pub fn set_query(&self, query: &str) {
        self.scope.dom().set_attribute(self.input, "value", query);
        let visible = self.filter(query);
        self.disclosure.open();
        let mut nav = self.nav.borrow_mut();
        nav.reset();
        if visible > 0 {
            nav.first();
        }
    }

    /// Commit the enabled option whose value is `value`.
    pub fn commit(&self, value: &str) -> bool {
        let dom = self.scope.dom();
        let Some(option) = self
            .all_options()
            .into_iter()
            .find(|&id| item_value(dom, id) == value && !is_disabled(dom, id))
        else {
            return false;
        };
        self.commit_option(option);
        true
    }

    fn all_options(&self) -> Vec<ElementId> {
        self.scope.targets_within(self.content, "option")
    }

    fn filter(&self, query: &str) -> usize {
        let dom = self.scope.dom();
        *self.query.borrow_mut() = query.to_owned();
        let needle = query.trim().to_lowercase();
        let mut visible = 0;
        for option in self.all_options() {
            let shown = matches(&item_label(dom, option), &needle);
            dom.toggle_attribute(option, "hidden", !shown);
            visible += usize::from(shown);
        }
        if let Some(empty) = self.empty {
            dom.toggle_attribute(empty, "hidden", visible > 0);
        }
        tracing::trace!(widget = IDENTIFIER, query, visible, "filtered");
        visible
    }

    fn commit_option(&self, option: ElementId) {
        let dom = self.scope.dom();
        if is_disabled(dom, option) {
            return;
        }
        let value = item_value(dom, option);
        let changed = self.selection.borrow_mut().select(&value);
        for id in self.all_options() {
            let selected = id == option;
            dom.set_attribute(id, "aria-selected", if selected { "true" } else { "false" });
            dom.set_attribute(id, "data-state", if selected { "checked" } else { "unchecked" });
        }
        dom.set_attribute(self.input, "value", item_label(dom, option));
        self.filter("");
        self.nav.borrow_mut().reset();
        self.disclosure.close();
        if changed {
            tracing::debug!(widget = IDENTIFIER, value = %value, "committed");
            let observers = self.observers.borrow().clone();
            for observer in observers {
                observer(&value);
            }
        }
    }

    fn open_with_highlight(&self, last: bool) {
        self.disclosure.open();
        let mut nav = self.nav.borrow_mut();
        if last {
            nav.last();
        } else {
            nav.first();
        }
    }

    fn handle_key(&self, key: &KeyEvent, event: &Event) -> bool {
        if self.scope.dom().active_element() != Some(self.input) {
            return false;
        }
        match key.code {
            KeyCode::Down | KeyCode::Up if !self.is_open() => {
                self.open_with_highlight(key.code == KeyCode::Up);
                true
            }
            KeyCode::Down => {
                self.nav.borrow_mut().next();
                true
            }
            KeyCode::Up => {
                self.nav.borrow_mut().previous();
                true
            }
            KeyCode::Enter if self.is_open() => {
                let current = self.nav.borrow().current();
                match current {
                    Some(option) => {
                        self.commit_option(option);
                        true
                    }
                    None => false,
                }
            }
            _ => self.disclosure.handle_event(event),
        }
    }
}

impl Controller for Combobox {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        let dom = self.scope.dom();
        match event {
            Event::Input(input) if input.target == self.input => {
                self.set_query(&input.value);
                true
            }
            Event::Key(key) if key.is_press() => self.handle_key(key, event),
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Click => {
                if dom.contains(self.input, pointer.target) {
                    return self.disclosure.open();
                }
                let option = self
                    .all_options()
                    .into_iter()
                    .find(|&id| dom.contains(id, pointer.target));
                match option {
                    Some(option) if self.is_open() => {
                        self.commit_option(option);
                        true
                    }
                    _ => self.disclosure.handle_event(event),
                }
            }
            _ => self.disclosure.handle_event(event),
        }
    }

    fn disconnect(&self) {
        self.disclosure.disconnect();
    }
}
