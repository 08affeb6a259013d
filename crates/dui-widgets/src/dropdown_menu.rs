#![forbid(unsafe_code)]

//! Dropdown menu: a click-triggered [`Menu`].
//!
//! Opening from the keyboard (ArrowDown/Enter/Space on the trigger) focuses
//! the first item, ArrowUp the last; a pointer open focuses the content.
//! Choosing an item closes the whole menu and returns focus to the trigger.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{ControllerScope, DisclosureConfig, DisclosureDefaults, MountError};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::menu::{Menu, MenuOutcome};

pub const IDENTIFIER: &str = "ui--dropdown-menu";

type SelectObserver = Rc<dyn Fn(ElementId)>;

/// A mounted dropdown menu.
pub struct DropdownMenu {
    scope: ControllerScope,
    trigger: ElementId,
    disclosure: Disclosure,
    menu: Menu,
    observers: RefCell<Vec<SelectObserver>>,
}

impl std::fmt::Debug for DropdownMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropdownMenu")
            .field("disclosure", &self.disclosure)
            .field("menu", &self.menu)
            .finish_non_exhaustive()
    }
}

impl DropdownMenu {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, IDENTIFIER);
        let parts = DisclosureParts::from_scope(&scope)?;
        let trigger = scope.require("trigger")?;
        let defaults = DisclosureDefaults::click()
            .placement(Placement::new(Side::Bottom).align(Align::Start));
        let config = DisclosureConfig::read(&scope.attrs(), defaults);

        let menu = Menu::build(env, &scope, parts.content)?;
        env.dom.set_attribute(trigger, "aria-haspopup", "menu");
        let disclosure = Disclosure::new(env, scope.widget(), parts, config);

        let this = Rc::new(Self {
            scope,
            trigger,
            disclosure,
            menu,
            observers: RefCell::new(Vec::new()),
        });
        let weak = Rc::downgrade(&this);
        this.disclosure.on_change(move |t| {
            if t.to == DisclosureState::Closing
                && let Some(this) = weak.upgrade()
            {
                this.menu.collapse();
            }
        });
        this.disclosure.open_if_configured();
        Ok(this)
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn trigger(&self) -> ElementId {
        self.trigger
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

    /// Observe item selection.
    pub fn on_select(&self, observer: impl Fn(ElementId) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn select(&self, item: ElementId) {
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(item);
        }
        self.close();
        self.scope.dom().focus(self.trigger);
    }

    fn apply(&self, outcome: MenuOutcome) -> bool {
        match outcome {
            MenuOutcome::Ignored => false,
            MenuOutcome::Activated(item) => {
                self.select(item);
                true
            }
            MenuOutcome::Handled | MenuOutcome::Forward | MenuOutcome::Back => true,
        }
    }

    fn handle_trigger_key(&self, code: KeyCode) -> bool {
        let dom = self.scope.dom();
        if dom.active_element() != Some(self.trigger) || self.is_open() {
            return false;
        }
        match code {
            KeyCode::Down | KeyCode::Enter | KeyCode::Char(' ') => {
                self.open();
                self.menu.focus_first();
                true
            }
            KeyCode::Up => {
                self.open();
                self.menu.focus_last();
                true
            }
            _ => false,
        }
    }
}

impl Controller for DropdownMenu {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => {
                if self.handle_trigger_key(key.code) {
                    return true;
                }
                if self.is_open() && self.apply(self.menu.handle_key(key)) {
                    return true;
                }
                self.disclosure.handle_event(event)
            }
            Event::Pointer(pointer) => {
                if self.is_open() && self.apply(self.menu.handle_pointer(pointer)) {
                    return true;
                }
                self.disclosure.handle_event(event)
            }
            Event::Scroll | Event::Resize(_) => {
                self.menu.handle_layout(event);
                self.disclosure.handle_event(event)
            }
            _ => self.disclosure.handle_event(event),
        }
    }

    fn disconnect(&self) {
        self.menu.collapse();
        self.disclosure.disconnect();
    }
}
