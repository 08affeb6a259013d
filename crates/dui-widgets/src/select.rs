#![forbid(unsafe_code)]

//! Select: a trigger button with a single-selection listbox.
//!
//! ```text
//! root
//! ├── trigger          role=combobox, aria-haspopup=listbox
//! │   └── value        selected label, else the placeholder text
//! ├── input            hidden form field, `value` mirrors the selection
//! └── content          role=listbox
//!     └── option ...   role=option, aria-selected, data-state=checked|unchecked
//! ```
//!
//! Opening moves focus to the selected option (else the first). Typing on
//! the closed trigger selects by typeahead without opening.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode, KeyEvent, PointerEventKind};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, MountError, Orientation, SelectionMode,
};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::nav::{
    FocusMode, ItemSet, KeyboardNavigator, NavAction, Selection, Typeahead, is_disabled,
    item_label, item_value,
};

pub const IDENTIFIER: &str = "ui--select";

type ChangeObserver = Rc<dyn Fn(&str)>;

/// A mounted select.
pub struct Select {
    env: Env,
    scope: ControllerScope,
    trigger: ElementId,
    value_target: Option<ElementId>,
    input: Option<ElementId>,
    placeholder: String,
    disclosure: Disclosure,
    options: ItemSet,
    nav: RefCell<KeyboardNavigator>,
    selection: RefCell<Selection>,
    typeahead: RefCell<Typeahead>,
    observers: RefCell<Vec<ChangeObserver>>,
}

impl std::fmt::Debug for Select {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Select")
            .field("trigger", &self.trigger)
            .field("selection", &self.selection)
            .field("disclosure", &self.disclosure)
            .finish_non_exhaustive()
    }
}

impl Select {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let parts = DisclosureParts::from_scope(&scope)?;
        let trigger = scope.require("trigger")?;
        let defaults = DisclosureDefaults::click()
            .placement(Placement::new(Side::Bottom).align(Align::Start));
        let attrs = scope.attrs();
        let config = DisclosureConfig::read(&attrs, defaults);

        let options = ItemSet::new(&scope, parts.content, &["option"]);
        dui_a11y::ensure_role(dom, trigger, "combobox");
        dom.set_attribute(trigger, "aria-haspopup", "listbox");
        dui_a11y::ensure_role(dom, parts.content, "listbox");
        for option in options.elements() {
            dui_a11y::ensure_role(dom, option, "option");
            if !dom.has_attribute(option, "tabindex") {
                dom.set_attribute(option, "tabindex", "-1");
            }
            if is_disabled(dom, option) {
                dui_a11y::set_flag(dom, option, dui_a11y::AriaFlag::Disabled, true);
            }
        }

        let value_target = scope.target("value");
        let input = scope.target("input");
        let placeholder = value_target
            .map(|id| dom.text(id).trim().to_owned())
            .unwrap_or_default();
        let initial = attrs.string("value").or_else(|| {
            options
                .elements()
                .into_iter()
                .find(|&id| dom.attribute_is(id, "aria-selected", "true"))
                .map(|id| item_value(dom, id))
        });

        let nav = KeyboardNavigator::new(options.clone(), Orientation::Vertical)
            .mode(FocusMode::Roving)
            .looping(attrs.bool("loop", false));
        let disclosure = Disclosure::new(env, scope.widget(), parts, config);

        let this = Rc::new(Self {
            env: env.clone(),
            scope,
            trigger,
            value_target,
            input,
            placeholder,
            disclosure,
            options,
            nav: RefCell::new(nav),
            selection: RefCell::new(Selection::new(SelectionMode::Single).allow_empty(false)),
            typeahead: RefCell::new(Typeahead::new()),
            observers: RefCell::new(Vec::new()),
        });
        if let Some(value) = initial {
            this.select(&value);
        } else {
            this.write();
        }

        let weak = Rc::downgrade(&this);
        this.disclosure
            .set_initial_focus(move || weak.upgrade().and_then(|s| s.initial_option()));
        let weak = Rc::downgrade(&this);
        this.disclosure.on_change(move |t| {
            let Some(this) = weak.upgrade() else { return };
            let mut nav = this.nav.borrow_mut();
            match t.to {
                DisclosureState::Opening => {
                    nav.sync_from_focus();
                    if let Some(current) = nav.current() {
                        nav.set_tab_stop(current);
                    }
                }
                DisclosureState::Closing => nav.reset(),
                DisclosureState::Open | DisclosureState::Closed => {}
            }
        });
        this.disclosure.open_if_configured();
        Ok(this)
    }

    pub fn trigger(&self) -> ElementId {
        self.trigger
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn is_open(&self) -> bool {
        self.disclosure.is_open()
    }

    pub fn open(&self) -> bool {
        self.disclosure.open()
    }

    pub fn close(&self) -> bool {
        self.disclosure.close()
    }

    /// The selected value.
    pub fn value(&self) -> Option<String> {
        self.selection.borrow().values().first().cloned()
    }

    /// Option elements, disabled ones included.
    pub fn options(&self) -> Vec<ElementId> {
        self.options.elements()
    }

    /// Select the enabled option whose value is `value`. Returns whether the
    /// selection changed.
    pub fn select(&self, value: &str) -> bool {
        if self.options.find_value(value).is_none() {
            tracing::debug!(widget = IDENTIFIER, value, "no enabled option with value");
            return false;
        }
        let changed = self.selection.borrow_mut().select(value);
        self.write();
        if changed {
            tracing::debug!(widget = IDENTIFIER, value, "selected");
            let observers = self.observers.borrow().clone();
            for observer in observers {
                observer(value);
            }
        }
        changed
    }

    /// Observe selection changes.
    pub fn on_change(&self, observer: impl Fn(&str) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn selected_option(&self) -> Option<ElementId> {
        let value = self.value()?;
        self.options.find_value(&value)
    }

    fn initial_option(&self) -> Option<ElementId> {
        self.selected_option()
            .or_else(|| self.options.enabled_elements().first().copied())
    }

    fn write(&self) {
        let dom = self.scope.dom();
        let selection = self.selection.borrow();
        let mut label = None;
        for option in self.options.elements() {
            let selected = selection.is_selected(&item_value(dom, option));
            if selected && label.is_none() {
                label = Some(item_label(dom, option));
            }
            dom.set_attribute(option, "aria-selected", if selected { "true" } else { "false" });
            dom.set_attribute(option, "data-state", if selected { "checked" } else { "unchecked" });
        }
        if let Some(target) = self.value_target {
            let shown = label.as_deref().unwrap_or(&self.placeholder);
            dom.set_text(target, shown);
            dom.toggle_attribute(target, "data-placeholder", label.is_none());
        }
        if let Some(input) = self.input {
            dom.set_attribute(input, "value", selection.values().first().cloned().unwrap_or_default());
        }
    }

    fn choose(&self, option: ElementId) {
        let dom = self.scope.dom();
        if is_disabled(dom, option) {
            return;
        }
        self.select(&item_value(dom, option));
        self.close();
        dom.focus(self.trigger);
    }

    fn typeahead_select(&self, ch: char) -> bool {
        let dom = self.scope.dom();
        let enabled = self.options.enabled_elements();
        let labels: Vec<String> = enabled.iter().map(|&id| item_label(dom, id)).collect();
        let current = self
            .selected_option()
            .and_then(|selected| enabled.iter().position(|&id| id == selected));
        let mut typeahead = self.typeahead.borrow_mut();
        typeahead.push(ch, self.env.scheduler.now());
        let Some(index) = typeahead.find(&labels, current) else {
            return true;
        };
        drop(typeahead);
        self.select(&item_value(dom, enabled[index]));
        true
    }

    fn handle_key(&self, key: &KeyEvent, event: &Event) -> bool {
        let dom = self.scope.dom();
        if !self.is_open() {
            if dom.active_element() != Some(self.trigger) {
                return false;
            }
            return match key.code {
                KeyCode::Down | KeyCode::Up | KeyCode::Enter | KeyCode::Char(' ') => self.open(),
                _ => match key.printable() {
                    Some(ch) => self.typeahead_select(ch),
                    None => false,
                },
            };
        }
        if key.code == KeyCode::Tab {
            self.close();
            return false;
        }
        let action = self
            .nav
            .borrow_mut()
            .handle_key(key, self.env.scheduler.now());
        match action {
            NavAction::Moved(_) => true,
            NavAction::Activate(option) => {
                self.choose(option);
                true
            }
            NavAction::None | NavAction::Forward | NavAction::Back => {
                self.disclosure.handle_event(event)
            }
        }
    }
}

impl Controller for Select {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(key, event),
            Event::Pointer(pointer)
                if pointer.kind == PointerEventKind::Click && self.is_open() =>
            {
                match self
                    .options
                    .item_for(pointer.target)
                    .filter(|&option| !is_disabled(self.scope.dom(), option))
                {
                    Some(option) => {
                        self.choose(option);
                        true
                    }
                    None => self.disclosure.handle_event(event),
                }
            }
            _ => self.disclosure.handle_event(event),
        }
    }

    fn disconnect(&self) {
        self.disclosure.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::geometry::{Rect, Size};
    use std::cell::Cell;

    const TARGET: &str = "data-ui--select-target";

    fn option(value: &str, label: &str) -> El {
        El::new("div").attr(TARGET, "option").attr("data-value", value).text(label)
    }

    fn fixture(root_attrs: &[(&str, &str)]) -> (Env, Rc<Select>) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let mut root = El::new("div").attr("data-controller", IDENTIFIER);
        for (name, value) in root_attrs {
            root = root.attr(format!("data-ui--select-{name}-value"), *value);
        }
        let root = dom.mount(
            dom.body(),
            root.children([
                El::new("button")
                    .attr(TARGET, "trigger")
                    .rect(Rect::new(10.0, 10.0, 120.0, 30.0))
                    .child(El::new("span").attr(TARGET, "value").text("Pick a fruit")),
                El::new("input").attr(TARGET, "input").attr("type", "hidden"),
                El::new("div")
                    .attr(TARGET, "content")
                    .rect(Rect::new(0.0, 0.0, 120.0, 100.0))
                    .children([
                        option("apple", "Apple"),
                        option("banana", "Banana").flag("data-disabled"),
                        option("blueberry", "Blueberry"),
                        option("grape", "Grape"),
                    ]),
            ]),
        );
        let select = Select::mount(&env, root).unwrap();
        (env, select)
    }

    fn value_text(env: &Env) -> String {
        let dom = &env.dom;
        let root = dom.children(dom.body())[0];
        let trigger = dom.children(root)[0];
        dom.text(dom.children(trigger)[0])
    }

    #[test]
    fn placeholder_until_selected() {
        let (env, select) = fixture(&[]);
        assert_eq!(select.value(), None);
        assert_eq!(value_text(&env), "Pick a fruit");
        assert!(select.select("grape"));
        assert_eq!(value_text(&env), "Grape");
        assert!(!select.select("banana"), "disabled option");
        assert_eq!(select.value().as_deref(), Some("grape"));
    }

    #[test]
    fn initial_value_and_hidden_input() {
        let (env, select) = fixture(&[("value", "blueberry")]);
        let dom = &env.dom;
        assert_eq!(select.value().as_deref(), Some("blueberry"));
        let options = select.options();
        assert!(dom.attribute_is(options[2], "aria-selected", "true"));
        assert!(dom.attribute_is(options[2], "data-state", "checked"));
        assert!(dom.attribute_is(options[0], "aria-selected", "false"));
        let root = dom.children(dom.body())[0];
        let input = dom.children(root)[1];
        assert!(dom.attribute_is(input, "value", "blueberry"));
    }

    #[test]
    fn open_focuses_selected_then_keyboard_choose() {
        let (env, select) = fixture(&[("value", "blueberry")]);
        let dom = &env.dom;
        let changes = Rc::new(Cell::new(0));
        let sink = Rc::clone(&changes);
        select.on_change(move |_| sink.set(sink.get() + 1));

        dom.focus(select.trigger());
        select.handle_event(&Event::key(KeyCode::Enter));
        assert!(select.is_open());
        let options = select.options();
        assert_eq!(dom.active_element(), Some(options[2]));

        select.handle_event(&Event::key(KeyCode::Up));
        assert_eq!(dom.active_element(), Some(options[0]), "skips disabled");
        select.handle_event(&Event::key(KeyCode::Enter));
        assert!(!select.is_open());
        assert_eq!(select.value().as_deref(), Some("apple"));
        assert_eq!(dom.active_element(), Some(select.trigger()));
        assert_eq!(changes.get(), 1);
    }

    #[test]
    fn click_option_selects() {
        let (_env, select) = fixture(&[]);
        select.handle_event(&Event::click(select.trigger()));
        assert!(select.is_open());
        select.handle_event(&Event::click(select.options()[3]));
        assert_eq!(select.value().as_deref(), Some("grape"));
        assert!(!select.is_open());
    }

    #[test]
    fn typeahead_on_closed_trigger() {
        let (env, select) = fixture(&[]);
        env.dom.focus(select.trigger());
        select.handle_event(&Event::key(KeyCode::Char('b')));
        assert!(!select.is_open());
        assert_eq!(select.value().as_deref(), Some("blueberry"));
        select.handle_event(&Event::key(KeyCode::Char('g')));
        assert_eq!(select.value().as_deref(), Some("blueberry"), "\"bg\" matches nothing");
        env.scheduler.advance(web_time::Duration::from_millis(1000));
        select.handle_event(&Event::key(KeyCode::Char('g')));
        assert_eq!(select.value().as_deref(), Some("grape"));
    }
}
