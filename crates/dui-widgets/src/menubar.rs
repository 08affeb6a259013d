#![forbid(unsafe_code)]

//! Menubar: a horizontal row of triggers, each opening a [`Menu`].
//!
//! Triggers form a roving-tabindex composite. At most one menu is open
//! (per-menubar exclusive group). With a menu open, ArrowLeft/ArrowRight on
//! its top level switch to the adjacent menu, and hovering another trigger
//! moves the open menu there.

use std::cell::RefCell;
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyEvent, PointerEvent, PointerEventKind};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, MountError, Orientation,
};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::menu::{Menu, MenuOutcome};
use crate::nav::{ItemSet, KeyboardNavigator, NavAction};

pub const IDENTIFIER: &str = "ui--menubar";

type SelectObserver = Rc<dyn Fn(ElementId)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    First,
    Last,
}

#[derive(Debug)]
struct MenubarMenu {
    trigger: ElementId,
    disclosure: Disclosure,
    menu: Menu,
}

/// A mounted menubar.
pub struct Menubar {
    env: Env,
    scope: ControllerScope,
    menus: Vec<MenubarMenu>,
    nav: RefCell<KeyboardNavigator>,
    observers: RefCell<Vec<SelectObserver>>,
}

impl std::fmt::Debug for Menubar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Menubar")
            .field("menus", &self.menus)
            .finish_non_exhaustive()
    }
}

impl Menubar {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let attrs = scope.attrs();
        let defaults = DisclosureDefaults::click()
            .placement(Placement::new(Side::Bottom).align(Align::Start));
        let config = DisclosureConfig::read(&attrs, defaults);
        let group = env
            .coordinator
            .group(&format!("menubar:{}", root.raw()));
        dui_a11y::ensure_role(dom, root, "menubar");

        let mut menus = Vec::new();
        for element in scope.targets("menu") {
            let missing = |target: &'static str| MountError::MissingTarget {
                controller: IDENTIFIER.to_owned(),
                target,
            };
            let trigger = scope
                .targets_within(element, "trigger")
                .into_iter()
                .next()
                .ok_or_else(|| missing("trigger"))?;
            let content = scope
                .targets_within(element, "content")
                .into_iter()
                .next()
                .ok_or_else(|| missing("content"))?;
            dui_a11y::ensure_role(dom, trigger, "menuitem");
            dom.set_attribute(trigger, "aria-haspopup", "menu");

            let menu = Menu::build(env, &scope, content)?;
            let parts = DisclosureParts {
                root: element,
                trigger: Some(trigger),
                content,
                overlay: None,
            };
            let disclosure = Disclosure::new(env, scope.widget(), parts, config);
            disclosure.join_group(&group);
            menus.push(MenubarMenu {
                trigger,
                disclosure,
                menu,
            });
        }
        if menus.is_empty() {
            return Err(MountError::MissingTarget {
                controller: IDENTIFIER.to_owned(),
                target: "menu",
            });
        }

        let orientation = attrs.parsed("orientation", Orientation::Horizontal, "horizontal|vertical");
        dom.set_attribute(root, "aria-orientation", orientation.as_str());
        let items = ItemSet::new(&scope, root, &["trigger"]).with_boundaries(&["content"]);
        let mut nav = KeyboardNavigator::new(items, orientation)
            .looping(attrs.bool("loop", true));
        nav.reset();
        if let Some(first) = menus.first() {
            nav.set_tab_stop(first.trigger);
        }

        let this = Rc::new(Self {
            env: env.clone(),
            scope,
            menus,
            nav: RefCell::new(nav),
            observers: RefCell::new(Vec::new()),
        });
        for (index, entry) in this.menus.iter().enumerate() {
            let weak = Rc::downgrade(&this);
            entry.disclosure.on_change(move |t| {
                if t.to == DisclosureState::Closing
                    && let Some(this) = weak.upgrade()
                {
                    this.menus[index].menu.collapse();
                }
            });
        }
        Ok(this)
    }

    pub fn len(&self) -> usize {
        self.menus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }

    pub fn trigger(&self, index: usize) -> Option<ElementId> {
        self.menus.get(index).map(|m| m.trigger)
    }

    pub fn disclosure(&self, index: usize) -> Option<&Disclosure> {
        self.menus.get(index).map(|m| &m.disclosure)
    }

    pub fn menu(&self, index: usize) -> Option<&Menu> {
        self.menus.get(index).map(|m| &m.menu)
    }

    /// Index of the open menu.
    pub fn open_index(&self) -> Option<usize> {
        self.menus.iter().position(|m| m.disclosure.is_open())
    }

    /// Open menu `index` and focus its first item.
    pub fn open_menu(&self, index: usize) -> bool {
        self.open_with(index, Entry::First)
    }

    pub fn close_all(&self) {
        for entry in &self.menus {
            entry.disclosure.close();
        }
    }

    pub fn on_select(&self, observer: impl Fn(ElementId) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    fn index_of(&self, trigger: ElementId) -> Option<usize> {
        self.menus.iter().position(|m| m.trigger == trigger)
    }

    fn open_with(&self, index: usize, entry: Entry) -> bool {
        let Some(target) = self.menus.get(index) else {
            return false;
        };
        self.nav.borrow_mut().focus_item(target.trigger);
        target.disclosure.open();
        match entry {
            Entry::First => target.menu.focus_first(),
            Entry::Last => target.menu.focus_last(),
        };
        true
    }

    /// Move the open menu one trigger forward or back.
    fn switch(&self, from: usize, forward: bool) -> bool {
        let Some(current) = self.menus.get(from) else {
            return false;
        };
        current.disclosure.close_now();
        let next = {
            let mut nav = self.nav.borrow_mut();
            nav.focus_item(current.trigger);
            if forward { nav.next() } else { nav.previous() }
        };
        match next.and_then(|t| self.index_of(t)) {
            Some(index) => self.open_with(index, Entry::First),
            None => false,
        }
    }

    fn select(&self, index: usize, item: ElementId) {
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(item);
        }
        if let Some(entry) = self.menus.get(index) {
            entry.disclosure.close();
            self.nav.borrow_mut().focus_item(entry.trigger);
        }
    }

    fn handle_key(&self, key: &KeyEvent, event: &Event) -> bool {
        let dom = self.scope.dom();
        if let Some(index) = self.open_index() {
            let outcome = self.menus[index].menu.handle_key(key);
            match outcome {
                MenuOutcome::Activated(item) => {
                    self.select(index, item);
                    return true;
                }
                MenuOutcome::Forward => return self.switch(index, true),
                MenuOutcome::Back => return self.switch(index, false),
                MenuOutcome::Handled => return true,
                MenuOutcome::Ignored => {}
            }
        }

        let on_trigger = dom
            .active_element()
            .and_then(|active| self.nav.borrow().items().item_for(active));
        if let Some(trigger) = on_trigger {
            let now = self.env.scheduler.now();
            let action = self.nav.borrow_mut().handle_key(key, now);
            let open = self.open_index();
            match action {
                NavAction::Moved(target) => {
                    if let (Some(open), Some(index)) = (open, self.index_of(target))
                        && open != index
                    {
                        self.open_with(index, Entry::First);
                    }
                    return true;
                }
                NavAction::Forward => {
                    return self
                        .index_of(trigger)
                        .is_some_and(|i| self.open_with(i, Entry::First));
                }
                NavAction::Back => {
                    return self
                        .index_of(trigger)
                        .is_some_and(|i| self.open_with(i, Entry::Last));
                }
                NavAction::Activate(target) => {
                    if let Some(index) = self.index_of(target) {
                        if open == Some(index) {
                            self.menus[index].disclosure.close();
                        } else {
                            self.open_with(index, Entry::First);
                        }
                        return true;
                    }
                }
                NavAction::None => {}
            }
        }

        self.menus
            .iter()
            .fold(false, |handled, m| m.disclosure.handle_event(event) || handled)
    }

    fn handle_pointer(&self, pointer: &PointerEvent, event: &Event) -> bool {
        if let Some(open) = self.open_index() {
            if pointer.kind == PointerEventKind::Enter
                && let Some(index) = self.index_of(pointer.target)
                && index != open
            {
                self.menus[index].disclosure.open();
                self.nav.borrow_mut().set_tab_stop(pointer.target);
                return true;
            }
            match self.menus[open].menu.handle_pointer(pointer) {
                MenuOutcome::Activated(item) => {
                    self.select(open, item);
                    return true;
                }
                MenuOutcome::Ignored => {}
                _ => return true,
            }
        }
        self.menus
            .iter()
            .fold(false, |handled, m| m.disclosure.handle_event(event) || handled)
    }
}

impl Controller for Menubar {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(key, event),
            Event::Pointer(pointer) => self.handle_pointer(pointer, event),
            Event::Scroll | Event::Resize(_) => {
                for entry in &self.menus {
                    entry.menu.handle_layout(event);
                    entry.disclosure.handle_event(event);
                }
                false
            }
            _ => false,
        }
    }

    fn disconnect(&self) {
        for entry in &self.menus {
            entry.menu.collapse();
            entry.disclosure.disconnect();
        }
    }
}
