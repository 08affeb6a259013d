#![forbid(unsafe_code)]

//! Context menu: a [`Menu`] opened by `contextmenu` inside a trigger area,
//! positioned at the pointer.
//!
//! The trigger area is not a toggle: it carries no `aria-expanded`, and a
//! pointer press on it counts as outside the menu. Only one context menu is
//! open per page (shared `context-menu` group).

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEvent, PointerEventKind};
use dui_core::geometry::Rect;
use dui_layout::{Align, Placement, Side};
use dui_runtime::{ControllerScope, DisclosureConfig, DisclosureDefaults, MountError};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::menu::{Menu, MenuOutcome};

pub const IDENTIFIER: &str = "ui--context-menu";

/// Exclusive group shared by every context menu.
pub const GROUP: &str = "context-menu";

type SelectObserver = Rc<dyn Fn(ElementId)>;

/// A mounted context menu.
pub struct ContextMenu {
    scope: ControllerScope,
    area: ElementId,
    disclosure: Disclosure,
    menu: Menu,
    observers: RefCell<Vec<SelectObserver>>,
}

impl std::fmt::Debug for ContextMenu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextMenu")
            .field("area", &self.area)
            .field("disclosure", &self.disclosure)
            .finish_non_exhaustive()
    }
}

impl ContextMenu {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, IDENTIFIER);
        let area = scope.require("trigger")?;
        let content = scope.require("content")?;
        let defaults = DisclosureDefaults::click()
            .placement(Placement::new(Side::Right).align(Align::Start).offset(2.0));
        let config = DisclosureConfig::read(&scope.attrs(), defaults);
        let parts = DisclosureParts {
            root,
            trigger: None,
            content,
            overlay: None,
        };

        let menu = Menu::build(env, &scope, content)?;
        let disclosure = Disclosure::new(env, scope.widget(), parts, config);
        env.dom.set_attribute(area, "data-state", DisclosureState::Closed.as_str());
        disclosure.join_group(&env.coordinator.group(GROUP));

        let this = Rc::new(Self {
            scope,
            area,
            disclosure,
            menu,
            observers: RefCell::new(Vec::new()),
        });
        let weak = Rc::downgrade(&this);
        this.disclosure.on_change(move |t| {
            if let Some(this) = weak.upgrade() {
                let dom = this.scope.dom();
                dom.set_attribute(this.area, "data-state", t.to.as_str());
                if t.to == DisclosureState::Closing {
                    this.menu.collapse();
                }
            }
        });
        Ok(this)
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    pub fn is_open(&self) -> bool {
        self.disclosure.is_open()
    }

    pub fn close(&self) -> bool {
        self.disclosure.close()
    }

    /// Open at page position of `pointer` (or move there when open).
    pub fn open_at(&self, pointer: &PointerEvent) {
        let anchor = Rect::new(pointer.position.x, pointer.position.y, 1.0, 1.0);
        self.disclosure.set_anchor(Some(anchor));
        if self.is_open() {
            self.menu.collapse();
            self.disclosure.reposition();
        } else {
            self.disclosure.open();
        }
    }

    pub fn on_select(&self, observer: impl Fn(ElementId) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn apply(&self, outcome: MenuOutcome) -> bool {
        match outcome {
            MenuOutcome::Ignored => false,
            MenuOutcome::Activated(item) => {
                let observers = self.observers.borrow().clone();
                for observer in observers {
                    observer(item);
                }
                self.close();
                true
            }
            MenuOutcome::Handled | MenuOutcome::Forward | MenuOutcome::Back => true,
        }
    }
}

impl Controller for ContextMenu {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Pointer(pointer)
                if pointer.kind == PointerEventKind::ContextMenu
                    && self.scope.dom().contains(self.area, pointer.target)
                    && !self.scope.dom().contains(self.menu.content(), pointer.target) =>
            {
                self.open_at(pointer);
                true
            }
            Event::Pointer(pointer) => {
                if self.is_open() && self.apply(self.menu.handle_pointer(pointer)) {
                    return true;
                }
                self.disclosure.handle_event(event)
            }
            Event::Key(key) if key.is_press() => {
                if self.is_open() && self.apply(self.menu.handle_key(key)) {
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
