#![forbid(unsafe_code)]

//! Tabs: a roving tablist selecting one panel.
//!
//! Triggers and panels pair by `data-value`. The selected trigger has
//! `aria-selected="true"` and `data-state="active"`; every other panel is
//! `hidden`. With `activation-value="automatic"` (default) moving focus
//! selects; with `manual` only Enter/Space or a click does.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEventKind};
use dui_runtime::{Activation, ControllerScope, MountError, Orientation};

use crate::controller::{Controller, Env};
use crate::nav::{FocusMode, ItemSet, KeyboardNavigator, NavAction, is_disabled, item_value};

pub const IDENTIFIER: &str = "ui--tabs";

type ChangeObserver = Rc<dyn Fn(&str)>;

/// A mounted tabs widget.
pub struct Tabs {
    env: Env,
    scope: ControllerScope,
    list: ElementId,
    activation: Activation,
    triggers: ItemSet,
    nav: RefCell<KeyboardNavigator>,
    selected: RefCell<Option<String>>,
    observers: RefCell<Vec<ChangeObserver>>,
}

impl std::fmt::Debug for Tabs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tabs")
            .field("root", &self.scope.root())
            .field("activation", &self.activation)
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl Tabs {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let list = scope.require("list")?;
        let attrs = scope.attrs();
        let orientation =
            attrs.parsed("orientation", Orientation::Horizontal, "horizontal|vertical");
        let activation = attrs.parsed("activation", Activation::Automatic, "automatic|manual");

        dui_a11y::ensure_role(dom, list, "tablist");
        dom.set_attribute(list, "aria-orientation", orientation.as_str());
        dom.set_attribute(root, "data-orientation", orientation.as_str());
        let triggers = ItemSet::new(&scope, list, &["trigger"]);
        for trigger in triggers.elements() {
            dui_a11y::ensure_role(dom, trigger, "tab");
            if is_disabled(dom, trigger) {
                dui_a11y::set_flag(dom, trigger, dui_a11y::AriaFlag::Disabled, true);
            }
            let value = item_value(dom, trigger);
            let panel = scope
                .targets("content")
                .into_iter()
                .find(|&p| dom.attribute_is(p, "data-value", &value));
            if let Some(panel) = panel {
                dui_a11y::ensure_role(dom, panel, "tabpanel");
                dui_a11y::link(dom, trigger, "aria-controls", panel);
                dui_a11y::link(dom, panel, "aria-labelledby", trigger);
                if !dom.has_attribute(panel, "tabindex") {
                    dom.set_attribute(panel, "tabindex", "0");
                }
            }
        }

        let nav = KeyboardNavigator::new(triggers.clone(), orientation)
            .mode(FocusMode::Roving)
            .looping(attrs.bool("loop", true))
            .typeahead(false);
        let this = Rc::new(Self {
            env: env.clone(),
            scope,
            list,
            activation,
            triggers,
            nav: RefCell::new(nav),
            selected: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
        });

        let initial = attrs
            .string("value")
            .filter(|v| this.triggers.find_value(v).is_some())
            .or_else(|| {
                let first = this.triggers.enabled_elements().first().copied()?;
                Some(item_value(dom, first))
            });
        match initial {
            Some(value) => {
                this.select(&value);
            }
            None => tracing::warn!(widget = IDENTIFIER, "no enabled tab to select"),
        }
        Ok(this)
    }

    pub fn list(&self) -> ElementId {
        self.list
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    /// The selected tab's value.
    pub fn value(&self) -> Option<String> {
        self.selected.borrow().clone()
    }

    /// Trigger for `value`.
    pub fn trigger(&self, value: &str) -> Option<ElementId> {
        let dom = self.scope.dom();
        self.triggers
            .elements()
            .into_iter()
            .find(|&id| item_value(dom, id) == value)
    }

    /// Panel for `value`.
    pub fn panel(&self, value: &str) -> Option<ElementId> {
        let dom = self.scope.dom();
        self.scope
            .targets("content")
            .into_iter()
            .find(|&p| dom.attribute_is(p, "data-value", value))
    }

    pub fn on_change(&self, observer: impl Fn(&str) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Select the enabled tab `value`. Returns whether the selection changed.
    pub fn select(&self, value: &str) -> bool {
        let Some(trigger) = self.triggers.find_value(value) else {
            return false;
        };
        if self.selected.borrow().as_deref() == Some(value) {
            return false;
        }
        let dom = self.scope.dom();
        for id in self.triggers.elements() {
            let active = id == trigger;
            dui_a11y::set_flag(dom, id, dui_a11y::AriaFlag::Selected, active);
            dom.set_attribute(id, "data-state", if active { "active" } else { "inactive" });
        }
        for panel in self.scope.targets("content") {
            let active = dom.attribute_is(panel, "data-value", value);
            dom.set_attribute(panel, "data-state", if active { "active" } else { "inactive" });
            dom.toggle_attribute(panel, "hidden", !active);
        }
        self.nav.borrow_mut().set_tab_stop(trigger);
        let previous = self.selected.replace(Some(value.to_owned()));
        tracing::debug!(
            widget = IDENTIFIER,
            from = previous.as_deref().unwrap_or(""),
            to = value,
            "tab selected"
        );
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(value);
        }
        true
    }
}

impl Controller for Tabs {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        let dom = self.scope.dom();
        match event {
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Click => {
                let Some(trigger) = self.triggers.item_for(pointer.target) else {
                    return false;
                };
                if is_disabled(dom, trigger) {
                    return false;
                }
                self.select(&item_value(dom, trigger));
                true
            }
            Event::Key(key) if key.is_press() => {
                let on_tab = dom
                    .active_element()
                    .and_then(|active| self.triggers.item_for(active))
                    .is_some();
                if !on_tab {
                    return false;
                }
                let action = self
                    .nav
                    .borrow_mut()
                    .handle_key(key, self.env.scheduler.now());
                match action {
                    NavAction::Moved(trigger) => {
                        if self.activation == Activation::Automatic {
                            self.select(&item_value(dom, trigger));
                        }
                        true
                    }
                    NavAction::Activate(trigger) => {
                        self.select(&item_value(dom, trigger));
                        true
                    }
                    NavAction::None | NavAction::Forward | NavAction::Back => false,
                }
            }
            _ => false,
        }
    }

    fn disconnect(&self) {}
}
