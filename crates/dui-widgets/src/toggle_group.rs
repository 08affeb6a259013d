#![forbid(unsafe_code)]

//! Toggle group: a row of pressable items with single or multiple selection.
//!
//! Single mode exposes the items as a radio group (`role="radio"`,
//! `aria-checked`); multiple mode as toggle buttons (`aria-pressed`). Both
//! write `data-state="on|off"`. Arrow keys move focus only; Enter, Space,
//! or a click changes the selection.

use std::cell::RefCell;
use std::rc::Rc;

use dui_a11y::AriaFlag;
use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEventKind};
use dui_runtime::{ControllerScope, MountError, Orientation, SelectionMode};

use crate::controller::{Controller, Env};
use crate::nav::{FocusMode, ItemSet, KeyboardNavigator, NavAction, Selection, is_disabled, item_value};

pub const IDENTIFIER: &str = "ui--toggle-group";

type ChangeObserver = Rc<dyn Fn(&[String])>;

/// A mounted toggle group.
pub struct ToggleGroup {
    env: Env,
    scope: ControllerScope,
    items: ItemSet,
    nav: RefCell<KeyboardNavigator>,
    selection: RefCell<Selection>,
    observers: RefCell<Vec<ChangeObserver>>,
}

impl std::fmt::Debug for ToggleGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToggleGroup")
            .field("root", &self.scope.root())
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

impl ToggleGroup {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let attrs = scope.attrs();
        let mode = attrs.parsed("type", SelectionMode::Single, "single|multiple");
        let orientation =
            attrs.parsed("orientation", Orientation::Horizontal, "horizontal|vertical");

        let items = ItemSet::new(&scope, root, &["item"]);
        if items.elements().is_empty() {
            return Err(MountError::MissingTarget {
                controller: IDENTIFIER.to_owned(),
                target: "item",
            });
        }
        let group_role = if mode == SelectionMode::Single { "radiogroup" } else { "group" };
        dui_a11y::ensure_role(dom, root, group_role);
        dom.set_attribute(root, "data-orientation", orientation.as_str());
        for item in items.elements() {
            if mode == SelectionMode::Single {
                dui_a11y::ensure_role(dom, item, "radio");
            }
            if is_disabled(dom, item) {
                dui_a11y::set_flag(dom, item, AriaFlag::Disabled, true);
            }
        }

        let mut nav = KeyboardNavigator::new(items.clone(), orientation)
            .mode(FocusMode::Roving)
            .looping(attrs.bool("loop", true))
            .typeahead(false);
        if let Some(first) = items.enabled_elements().first().copied() {
            nav.set_tab_stop(first);
        }
        let mut selection = Selection::new(mode);
        selection.set(attrs.list("value"));

        let this = Rc::new(Self {
            env: env.clone(),
            scope,
            items,
            nav: RefCell::new(nav),
            selection: RefCell::new(selection),
            observers: RefCell::new(Vec::new()),
        });
        this.write();
        Ok(this)
    }

    pub fn mode(&self) -> SelectionMode {
        self.selection.borrow().mode()
    }

    /// Selected values in selection order.
    pub fn selected(&self) -> Vec<String> {
        self.selection.borrow().values().to_vec()
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.selection.borrow().is_selected(value)
    }

    pub fn item(&self, value: &str) -> Option<ElementId> {
        let dom = self.scope.dom();
        self.items
            .elements()
            .into_iter()
            .find(|&id| item_value(dom, id) == value)
    }

    pub fn on_change(&self, observer: impl Fn(&[String]) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Select `value` (exclusive in single mode).
    pub fn select(&self, value: &str) -> bool {
        self.mutate(value, |s| s.select(value))
    }

    /// Flip `value`.
    pub fn toggle(&self, value: &str) -> bool {
        self.mutate(value, |s| s.toggle(value))
    }

    fn mutate(&self, value: &str, change: impl FnOnce(&mut Selection) -> bool) -> bool {
        if self.items.find_value(value).is_none() {
            return false;
        }
        let changed = change(&mut self.selection.borrow_mut());
        if changed {
            self.write();
            let selected = self.selected();
            tracing::debug!(widget = IDENTIFIER, selected = ?selected, "toggle group changed");
            let observers = self.observers.borrow().clone();
            for observer in observers {
                observer(&selected);
            }
        }
        changed
    }

    fn write(&self) {
        let dom = self.scope.dom();
        let selection = self.selection.borrow();
        let flag = match selection.mode() {
            SelectionMode::Single => AriaFlag::Checked,
            SelectionMode::Multiple => AriaFlag::Pressed,
        };
        for item in self.items.elements() {
            let on = selection.is_selected(&item_value(dom, item));
            dui_a11y::set_flag(dom, item, flag, on);
            dom.set_attribute(item, "data-state", if on { "on" } else { "off" });
        }
    }
}

impl Controller for ToggleGroup {
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
                let Some(item) = self.items.item_for(pointer.target) else {
                    return false;
                };
                if is_disabled(dom, item) {
                    return false;
                }
                self.nav.borrow_mut().set_tab_stop(item);
                self.toggle(&item_value(dom, item))
            }
            Event::Key(key) if key.is_press() => {
                let on_item = dom
                    .active_element()
                    .and_then(|active| self.items.item_for(active))
                    .is_some();
                if !on_item {
                    return false;
                }
                let action = self
                    .nav
                    .borrow_mut()
                    .handle_key(key, self.env.scheduler.now());
                match action {
                    NavAction::Moved(_) => true,
                    NavAction::Activate(item) => {
                        self.toggle(&item_value(dom, item));
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

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::event::KeyCode;
    use dui_core::geometry::Size;

    const TARGET: &str = "data-ui--toggle-group-target";

    fn fixture(kind: &str, values: &[&str]) -> (Env, Rc<ToggleGroup>) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let root = dom.mount(
            dom.body(),
            El::new("div")
                .attr("data-controller", IDENTIFIER)
                .attr("data-ui--toggle-group-type-value", kind)
                .children(values.iter().map(|v| {
                    El::new("button").attr(TARGET, "item").attr("data-value", *v).text(*v)
                })),
        );
        let group = ToggleGroup::mount(&env, root).unwrap();
        (env, group)
    }

    #[test]
    fn single_mode_replaces() {
        let (env, group) = fixture("single", &["left", "center", "right"]);
        assert!(group.select("left"));
        assert!(group.select("center"));
        assert_eq!(group.selected(), ["center"]);
        let left = group.item("left").unwrap();
        let center = group.item("center").unwrap();
        assert!(env.dom.attribute_is(left, "aria-checked", "false"));
        assert!(env.dom.attribute_is(center, "aria-checked", "true"));
        assert!(env.dom.attribute_is(center, "data-state", "on"));
        assert!(env.dom.attribute_is(center, "role", "radio"));
    }

    #[test]
    fn multiple_mode_toggles_membership() {
        let (env, group) = fixture("multiple", &["a", "b", "c"]);
        group.toggle("a");
        group.toggle("b");
        assert_eq!(group.selected(), ["a", "b"]);
        group.toggle("a");
        assert_eq!(group.selected(), ["b"]);
        let a = group.item("a").unwrap();
        assert!(env.dom.attribute_is(a, "aria-pressed", "false"));
        assert!(env.dom.attribute_is(a, "data-state", "off"));
    }

    #[test]
    fn arrows_move_focus_not_selection() {
        let (env, group) = fixture("single", &["bold", "italic", "underline"]);
        let dom = &env.dom;
        let bold = group.item("bold").unwrap();
        assert!(dom.attribute_is(bold, "tabindex", "0"));
        dom.focus(bold);
        group.handle_event(&Event::key(KeyCode::Right));
        assert_eq!(dom.active_element(), group.item("italic"));
        assert!(group.selected().is_empty());
        group.handle_event(&Event::key(KeyCode::Char(' ')));
        assert_eq!(group.selected(), ["italic"]);
    }

    #[test]
    fn click_selects() {
        let (_env, group) = fixture("multiple", &["x", "y"]);
        group.handle_event(&Event::click(group.item("y").unwrap()));
        assert_eq!(group.selected(), ["y"]);
    }
}
