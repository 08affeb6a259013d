#![forbid(unsafe_code)]

//! Accordion: stacked sections, each a trigger/content disclosure.
//!
//! | `type-value` | `expand(v)` | `collapse(v)` |
//! |--------------|-------------|---------------|
//! | `single` | collapses every other section | refused for the last open section unless `collapsible` |
//! | `multiple` | independent | always allowed |
//!
//! Sections carry no positioning and no dismissal; content gets
//! `role="region"` labelled by its trigger. ArrowUp/Down (Left/Right when
//! horizontal), Home and End move focus between triggers.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEventKind};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, MountError, Orientation, SelectionMode,
};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts};
use crate::dismiss::{DismissalConfig, DismissalController};
use crate::nav::{FocusMode, ItemSet, KeyboardNavigator, NavAction, is_disabled, item_label};

pub const IDENTIFIER: &str = "ui--accordion";

#[derive(Debug)]
struct Section {
    value: String,
    item: ElementId,
    trigger: ElementId,
    disclosure: Disclosure,
}

/// A mounted accordion.
#[derive(Debug)]
pub struct Accordion {
    env: Env,
    scope: ControllerScope,
    sections: Vec<Section>,
    mode: SelectionMode,
    collapsible: bool,
    nav: RefCell<KeyboardNavigator>,
}

impl Accordion {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let attrs = scope.attrs();
        let mode = attrs.parsed("type", SelectionMode::Single, "single|multiple");
        let collapsible = attrs.bool("collapsible", true);
        let orientation = attrs.parsed("orientation", Orientation::Vertical, "horizontal|vertical");
        let mut config =
            DisclosureConfig::read(&attrs, DisclosureDefaults::click().focus_on_open(false));
        config.open_at_mount = false;

        let mut sections = Vec::new();
        for item in scope.targets("item") {
            let missing = |target| MountError::MissingTarget {
                controller: IDENTIFIER.to_owned(),
                target,
            };
            let trigger = scope
                .targets_within(item, "trigger")
                .into_iter()
                .next()
                .ok_or_else(|| missing("trigger"))?;
            let content = scope
                .targets_within(item, "content")
                .into_iter()
                .next()
                .ok_or_else(|| missing("content"))?;
            let value = dom
                .attribute(item, "data-value")
                .unwrap_or_else(|| item_label(dom, trigger));

            dui_a11y::ensure_role(dom, content, "region");
            dui_a11y::link(dom, content, "aria-labelledby", trigger);
            if is_disabled(dom, item) || is_disabled(dom, trigger) {
                dui_a11y::set_flag(dom, trigger, dui_a11y::AriaFlag::Disabled, true);
                dom.set_attribute(item, "data-disabled", "");
            }

            let parts = DisclosureParts {
                root: item,
                trigger: Some(trigger),
                content,
                overlay: None,
            };
            let dismissal = DismissalController::new(scope.widget(), DismissalConfig::none());
            let disclosure = Disclosure::with_dismissal(env, scope.widget(), parts, config, dismissal);
            sections.push(Section {
                value,
                item,
                trigger,
                disclosure,
            });
        }
        dom.set_attribute(root, "data-orientation", orientation.as_str());

        let nav = KeyboardNavigator::new(
            ItemSet::new(&scope, root, &["trigger"]).with_boundaries(&["content"]),
            orientation,
        )
        .mode(FocusMode::Direct)
        .looping(attrs.bool("loop", true))
        .typeahead(false);

        let this = Rc::new(Self {
            env: env.clone(),
            scope,
            sections,
            mode,
            collapsible,
            nav: RefCell::new(nav),
        });
        for value in attrs.list("value") {
            this.expand(&value);
        }
        Ok(this)
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn trigger(&self, value: &str) -> Option<ElementId> {
        self.section(value).map(|s| s.trigger)
    }

    pub fn disclosure(&self, value: &str) -> Option<&Disclosure> {
        self.section(value).map(|s| &s.disclosure)
    }

    pub fn is_expanded(&self, value: &str) -> bool {
        self.section(value).is_some_and(|s| s.disclosure.is_open())
    }

    /// Values of the expanded sections, in document order.
    pub fn expanded(&self) -> Vec<String> {
        self.sections
            .iter()
            .filter(|s| s.disclosure.is_open())
            .map(|s| s.value.clone())
            .collect()
    }

    /// Expand `value`. Returns whether it changed.
    pub fn expand(&self, value: &str) -> bool {
        let Some(section) = self.section(value) else {
            return false;
        };
        if self.is_section_disabled(section) || section.disclosure.is_open() {
            return false;
        }
        if self.mode == SelectionMode::Single {
            for other in self.sections.iter().filter(|s| s.value != value) {
                other.disclosure.close();
            }
        }
        tracing::debug!(widget = IDENTIFIER, value, "expand");
        section.disclosure.open()
    }

    /// Collapse `value`. Returns whether it changed.
    pub fn collapse(&self, value: &str) -> bool {
        let Some(section) = self.section(value) else {
            return false;
        };
        if self.is_section_disabled(section) || !section.disclosure.is_open() {
            return false;
        }
        if self.mode == SelectionMode::Single && !self.collapsible {
            tracing::trace!(widget = IDENTIFIER, value, "collapse refused: not collapsible");
            return false;
        }
        tracing::debug!(widget = IDENTIFIER, value, "collapse");
        section.disclosure.close()
    }

    pub fn toggle(&self, value: &str) -> bool {
        if self.is_expanded(value) {
            self.collapse(value)
        } else {
            self.expand(value)
        }
    }

    fn section(&self, value: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.value == value)
    }

    fn section_for_trigger(&self, element: ElementId) -> Option<&Section> {
        let dom = self.scope.dom();
        self.sections.iter().find(|s| dom.contains(s.trigger, element))
    }

    fn is_section_disabled(&self, section: &Section) -> bool {
        let dom = self.scope.dom();
        is_disabled(dom, section.item) || is_disabled(dom, section.trigger)
    }
}

impl Controller for Accordion {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Click => {
                match self.section_for_trigger(pointer.target) {
                    Some(section) => {
                        let value = section.value.clone();
                        self.toggle(&value)
                    }
                    None => false,
                }
            }
            Event::Key(key) if key.is_press() => {
                let dom = self.scope.dom();
                let on_trigger = dom
                    .active_element()
                    .and_then(|active| self.section_for_trigger(active))
                    .is_some();
                if !on_trigger {
                    return false;
                }
                let action = self
                    .nav
                    .borrow_mut()
                    .handle_key(key, self.env.scheduler.now());
                match action {
                    NavAction::Moved(_) => true,
                    NavAction::Activate(trigger) => {
                        let value = self.section_for_trigger(trigger).map(|s| s.value.clone());
                        value.is_some_and(|v| self.toggle(&v))
                    }
                    NavAction::None | NavAction::Forward | NavAction::Back => false,
                }
            }
            _ => false,
        }
    }

    fn disconnect(&self) {
        for section in &self.sections {
            section.disclosure.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::event::KeyCode;
    use dui_core::geometry::Size;

    const TARGET: &str = "data-ui--accordion-target";

    fn section(value: &str, label: &str) -> El {
        El::new("div").attr(TARGET, "item").attr("data-value", value).children([
            El::new("button").attr(TARGET, "trigger").text(label),
            El::new("div").attr(TARGET, "content").text("Body"),
        ])
    }

    fn fixture(attrs: &[(&str, &str)]) -> (Env, Rc<Accordion>) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let mut root = El::new("div").attr("data-controller", IDENTIFIER);
        for (name, value) in attrs {
            root = root.attr(format!("data-ui--accordion-{name}-value"), *value);
        }
        let root = dom.mount(
            dom.body(),
            root.children([
                section("erb-1", "Is it accessible?"),
                section("erb-2", "Is it styled?"),
                section("erb-3", "Is it animated?"),
            ]),
        );
        let accordion = Accordion::mount(&env, root).unwrap();
        (env, accordion)
    }

    #[test]
    fn single_mode_is_exclusive() {
        let (_env, acc) = fixture(&[]);
        assert!(acc.expand("erb-1"));
        assert!(acc.expand("erb-2"));
        assert!(!acc.is_expanded("erb-1"));
        assert!(acc.is_expanded("erb-2"));
        assert!(!acc.is_expanded("erb-3"));
        assert_eq!(acc.expanded(), ["erb-2"]);
    }

    #[test]
    fn non_collapsible_keeps_last_open() {
        let (_env, acc) = fixture(&[("collapsible", "false")]);
        acc.expand("erb-1");
        assert!(!acc.collapse("erb-1"));
        assert!(acc.is_expanded("erb-1"));
        acc.toggle("erb-3");
        assert_eq!(acc.expanded(), ["erb-3"]);
    }

    #[test]
    fn multiple_mode_and_initial_value() {
        let (env, acc) = fixture(&[("type", "multiple"), ("value", "erb-1,erb-3")]);
        assert_eq!(acc.expanded(), ["erb-1", "erb-3"]);
        acc.toggle("erb-1");
        assert_eq!(acc.expanded(), ["erb-3"]);
        let trigger = acc.trigger("erb-3").unwrap();
        assert!(env.dom.attribute_is(trigger, "aria-expanded", "true"));
    }

    #[test]
    fn content_region_and_hidden() {
        let (env, acc) = fixture(&[]);
        let dom = &env.dom;
        let content = acc.disclosure("erb-2").unwrap().parts().content;
        assert!(dom.attribute_is(content, "role", "region"));
        assert!(dom.has_attribute(content, "aria-labelledby"));
        assert!(dom.has_attribute(content, "hidden"));
        acc.expand("erb-2");
        assert!(!dom.has_attribute(content, "hidden"));
        assert!(dom.attribute_is(content, "data-state", "open"));
    }

    #[test]
    fn keyboard_moves_between_triggers() {
        let (env, acc) = fixture(&[]);
        let dom = &env.dom;
        dom.focus(acc.trigger("erb-1").unwrap());
        acc.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(dom.active_element(), acc.trigger("erb-2"));
        acc.handle_event(&Event::key(KeyCode::End));
        assert_eq!(dom.active_element(), acc.trigger("erb-3"));
        acc.handle_event(&Event::key(KeyCode::Enter));
        assert!(acc.is_expanded("erb-3"));
        acc.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(dom.active_element(), acc.trigger("erb-1"), "wraps");
    }

    #[test]
    fn disabled_section_ignored() {
        let (env, acc) = fixture(&[]);
        let item = env.dom.parent(acc.trigger("erb-2").unwrap()).unwrap();
        env.dom.set_attribute(item, "data-disabled", "");
        assert!(!acc.expand("erb-2"));
        acc.handle_event(&Event::click(acc.trigger("erb-2").unwrap()));
        assert!(!acc.is_expanded("erb-2"));
    }
}
