#![forbid(unsafe_code)]

//! Menu content shared by the dropdown, context and menubar widgets.
//!
//! A [`Menu`] is a tree of [`MenuLevel`]s. A level owns its submenus
//! (strong references downwards) and points at its parent weakly, so the
//! tree is released with its root and a child never outlives its parent.
//!
//! ```text
//! content
//! ├── item | checkbox-item
//! ├── radio-group
//! │   └── radio-item
//! └── sub
//!     ├── sub-trigger
//!     └── sub-content        (same shape as content)
//! ```
//!
//! # Invariants
//!
//! 1. At most one submenu per level is open (per-level exclusive group).
//! 2. Closing a submenu closes every submenu below it and resets its
//!    navigator.
//! 3. Items inside a `sub-content` belong to that level only.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | `sub` without `sub-trigger`/`sub-content` | Broken markup | Mount fails with `MountError::MissingTarget` |
//! | Activation of a disabled item | Pointer on `data-disabled` | Ignored |

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use dui_a11y::AriaFlag;
use dui_core::dom::{Dom, ElementId};
use dui_core::event::{Event, KeyEvent, PointerEvent, PointerEventKind};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, ExclusiveGroup, MountError, Orientation,
};

use crate::controller::Env;
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::dismiss::{DismissalConfig, DismissalController};
use crate::nav::{ItemSet, KeyboardNavigator, NavAction, is_disabled};

/// Target names a menu level navigates.
pub const ITEM_TARGETS: [&str; 4] = ["item", "checkbox-item", "radio-item", "sub-trigger"];

/// Hover delay before a submenu opens or closes.
pub const SUBMENU_DELAY_MS: u64 = 100;

/// What a menu did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOutcome {
    Ignored,
    Handled,
    /// A (non-submenu) item was chosen; the owner should close the menu.
    Activated(ElementId),
    /// ArrowRight on a plain item of the top level.
    Forward,
    /// ArrowLeft on the top level.
    Back,
}

fn write_checked(dom: &Dom, id: ElementId, checked: bool) {
    dui_a11y::set_flag(dom, id, AriaFlag::Checked, checked);
    dom.set_attribute(id, "data-state", if checked { "checked" } else { "unchecked" });
}

fn is_checked(dom: &Dom, id: ElementId) -> bool {
    dui_a11y::flag(dom, id, AriaFlag::Checked) == Some(true)
        || dom.attribute_is(id, "data-state", "checked")
}

fn prepare_item(scope: &ControllerScope, id: ElementId) {
    let dom = scope.dom();
    if scope.is_target(id, "checkbox-item") {
        dui_a11y::ensure_role(dom, id, "menuitemcheckbox");
        write_checked(dom, id, is_checked(dom, id));
    } else if scope.is_target(id, "radio-item") {
        dui_a11y::ensure_role(dom, id, "menuitemradio");
        write_checked(dom, id, is_checked(dom, id));
    } else {
        dui_a11y::ensure_role(dom, id, "menuitem");
    }
    if scope.is_target(id, "sub-trigger") {
        dom.set_attribute(id, "aria-haspopup", "menu");
    }
    if is_disabled(dom, id) {
        dui_a11y::set_flag(dom, id, AriaFlag::Disabled, true);
    }
}

fn first_within(
    scope: &ControllerScope,
    container: ElementId,
    name: &'static str,
) -> Result<ElementId, MountError> {
    scope
        .targets_within(container, name)
        .into_iter()
        .next()
        .ok_or_else(|| MountError::MissingTarget {
            controller: scope.identifier().to_owned(),
            target: name,
        })
}

/// `sub` targets whose nearest enclosing `sub-content` is `content` itself.
fn direct_subs(scope: &ControllerScope, content: ElementId) -> Vec<ElementId> {
    let dom = scope.dom();
    scope
        .targets_within(content, "sub")
        .into_iter()
        .filter(|&sub| {
            let mut cursor = dom.parent(sub);
            while let Some(current) = cursor {
                if current == content {
                    return true;
                }
                if scope.is_target(current, "sub-content") {
                    return false;
                }
                cursor = dom.parent(current);
            }
            false
        })
        .collect()
}

struct Submenu {
    trigger: ElementId,
    level: Rc<MenuLevel>,
}

/// One list of menu items plus the submenus hanging off it.
pub struct MenuLevel {
    env: Env,
    scope: ControllerScope,
    content: ElementId,
    depth: usize,
    parent: Weak<MenuLevel>,
    /// Sub-trigger and disclosure revealing this level (none at the top).
    opener: Option<(ElementId, Disclosure)>,
    nav: RefCell<KeyboardNavigator>,
    submenus: RefCell<Vec<Submenu>>,
    group: ExclusiveGroup,
}

impl fmt::Debug for MenuLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MenuLevel")
            .field("content", &self.content)
            .field("depth", &self.depth)
            .field("submenus", &self.submenus.borrow().len())
            .finish_non_exhaustive()
    }
}

impl MenuLevel {
    fn build(
        env: &Env,
        scope: &ControllerScope,
        content: ElementId,
        depth: usize,
        parent: Weak<MenuLevel>,
        opener: Option<(ElementId, Disclosure)>,
    ) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        dui_a11y::ensure_role(dom, content, "menu");
        let items = ItemSet::new(scope, content, &ITEM_TARGETS).with_boundaries(&["sub-content"]);
        for id in items.elements() {
            prepare_item(scope, id);
        }
        let mut nav = KeyboardNavigator::new(items, Orientation::Vertical);
        nav.reset();

        let level = Rc::new(Self {
            env: env.clone(),
            scope: scope.clone(),
            content,
            depth,
            parent,
            opener,
            nav: RefCell::new(nav),
            submenus: RefCell::new(Vec::new()),
            group: ExclusiveGroup::new(&format!("{}:level-{depth}", scope.widget())),
        });
        for sub in direct_subs(scope, content) {
            let submenu = Self::build_submenu(env, scope, sub, &level)?;
            level.submenus.borrow_mut().push(submenu);
        }
        Ok(level)
    }

    fn build_submenu(
        env: &Env,
        scope: &ControllerScope,
        sub: ElementId,
        parent: &Rc<MenuLevel>,
    ) -> Result<Submenu, MountError> {
        let trigger = first_within(scope, sub, "sub-trigger")?;
        let content = first_within(scope, sub, "sub-content")?;
        let defaults = DisclosureDefaults::hover(SUBMENU_DELAY_MS, SUBMENU_DELAY_MS)
            .placement(Placement::new(Side::Right).align(Align::Start));
        let widget = format!("{}:submenu", scope.widget());
        let parts = DisclosureParts {
            root: sub,
            trigger: Some(trigger),
            content,
            overlay: None,
        };
        let disclosure = Disclosure::with_dismissal(
            env,
            &widget,
            parts,
            DisclosureConfig::from(defaults),
            DismissalController::new(widget.clone(), DismissalConfig::none()),
        );
        disclosure.join_group(&parent.group);

        let level = Self::build(
            env,
            scope,
            content,
            parent.depth + 1,
            Rc::downgrade(parent),
            Some((trigger, disclosure.clone())),
        )?;
        let weak = Rc::downgrade(&level);
        disclosure.on_change(move |t| {
            if t.to == DisclosureState::Closing
                && let Some(level) = weak.upgrade()
            {
                level.collapse();
            }
        });
        Ok(Submenu { trigger, level })
    }

    pub fn content(&self) -> ElementId {
        self.content
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The level this one opens from.
    pub fn parent(&self) -> Option<Rc<MenuLevel>> {
        self.parent.upgrade()
    }

    /// Whether this level is showing (the top level always is).
    pub fn is_open(&self) -> bool {
        self.opener.as_ref().is_none_or(|(_, d)| d.is_open())
    }

    /// Focused item of this level.
    pub fn current(&self) -> Option<ElementId> {
        self.nav.borrow().current()
    }

    fn is_sub_trigger(&self, id: ElementId) -> bool {
        self.scope.is_target(id, "sub-trigger")
    }

    fn submenu_level(&self, trigger: ElementId) -> Option<Rc<MenuLevel>> {
        self.submenus
            .borrow()
            .iter()
            .find(|s| s.trigger == trigger)
            .map(|s| Rc::clone(&s.level))
    }

    /// Close every open submenu below this level and clear its navigator.
    fn collapse(&self) {
        let children: Vec<Rc<MenuLevel>> = self
            .submenus
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.level))
            .collect();
        for child in children {
            child.close_now();
        }
        self.nav.borrow_mut().reset();
    }

    fn close_now(&self) {
        if let Some((_, disclosure)) = &self.opener {
            disclosure.close_now();
        }
        self.collapse();
    }

    fn open_submenu(&self, trigger: ElementId, focus_first: bool) -> bool {
        let Some(child) = self.submenu_level(trigger) else {
            return false;
        };
        if let Some((_, disclosure)) = &child.opener {
            disclosure.open();
        }
        if focus_first {
            child.nav.borrow_mut().first();
        }
        tracing::trace!(widget = self.scope.widget(), depth = child.depth, "submenu opened");
        true
    }

    /// Deepest open level whose content holds `element`.
    fn level_for(self: &Rc<Self>, element: ElementId) -> Rc<MenuLevel> {
        let dom = &self.env.dom;
        let children: Vec<Rc<MenuLevel>> = self
            .submenus
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.level))
            .collect();
        for child in children {
            if child.is_open() && dom.contains(child.content, element) {
                return child.level_for(element);
            }
        }
        Rc::clone(self)
    }

    /// Level holding the submenu opened by `trigger`.
    fn owner_of(self: &Rc<Self>, trigger: ElementId) -> Option<Rc<MenuLevel>> {
        if self.submenu_level(trigger).is_some() {
            return Some(Rc::clone(self));
        }
        let children: Vec<Rc<MenuLevel>> = self
            .submenus
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.level))
            .collect();
        children.into_iter().find_map(|child| child.owner_of(trigger))
    }

    fn activate(&self, id: ElementId) -> MenuOutcome {
        let dom = &self.env.dom;
        if is_disabled(dom, id) {
            return MenuOutcome::Ignored;
        }
        if self.is_sub_trigger(id) {
            self.open_submenu(id, true);
            return MenuOutcome::Handled;
        }
        if self.scope.is_target(id, "checkbox-item") {
            write_checked(dom, id, !is_checked(dom, id));
        } else if self.scope.is_target(id, "radio-item") {
            let group = self
                .scope
                .closest_target(id, "radio-group")
                .unwrap_or(self.content);
            for radio in self.scope.targets_within(group, "radio-item") {
                write_checked(dom, radio, radio == id);
            }
        }
        tracing::debug!(widget = self.scope.widget(), item = id.raw(), "menu item selected");
        MenuOutcome::Activated(id)
    }

    fn handle_key(&self, key: &KeyEvent) -> MenuOutcome {
        let now = self.env.scheduler.now();
        let action = self.nav.borrow_mut().handle_key(key, now);
        match action {
            NavAction::None => MenuOutcome::Ignored,
            NavAction::Moved(_) => MenuOutcome::Handled,
            NavAction::Activate(id) => self.activate(id),
            NavAction::Forward => {
                let current = self.current();
                match current {
                    Some(id) if self.is_sub_trigger(id) => {
                        self.open_submenu(id, true);
                        MenuOutcome::Handled
                    }
                    _ if self.opener.is_some() => MenuOutcome::Handled,
                    _ => MenuOutcome::Forward,
                }
            }
            NavAction::Back => match (&self.opener, self.parent.upgrade()) {
                (Some((trigger, _)), Some(parent)) => {
                    self.close_now();
                    parent.nav.borrow_mut().focus_item(*trigger);
                    MenuOutcome::Handled
                }
                _ => MenuOutcome::Back,
            },
        }
    }

    fn handle_pointer(&self, pointer: &PointerEvent) -> MenuOutcome {
        let children: Vec<Rc<MenuLevel>> = self
            .submenus
            .borrow()
            .iter()
            .map(|s| Rc::clone(&s.level))
            .collect();
        for child in children {
            if let Some((_, disclosure)) = &child.opener {
                disclosure.handle_event(&Event::Pointer(*pointer));
            }
            let outcome = child.handle_pointer(pointer);
            if outcome != MenuOutcome::Ignored {
                return outcome;
            }
        }

        let item = self.nav.borrow().items().item_for(pointer.target);
        let Some(item) = item else {
            return MenuOutcome::Ignored;
        };
        match pointer.kind {
            PointerEventKind::Enter => {
                if self.is_open() {
                    self.nav.borrow_mut().focus_item(item);
                }
                MenuOutcome::Handled
            }
            PointerEventKind::Click => self.activate(item),
            _ => MenuOutcome::Ignored,
        }
    }

    fn for_each_disclosure(&self, f: &mut dyn FnMut(&Disclosure)) {
        for sub in self.submenus.borrow().iter() {
            if let Some((_, disclosure)) = &sub.level.opener {
                f(disclosure);
            }
            sub.level.for_each_disclosure(f);
        }
    }
}

/// Menu content tree with keyboard and pointer handling.
#[derive(Debug, Clone)]
pub struct Menu {
    env: Env,
    root: Rc<MenuLevel>,
}

impl Menu {
    /// Build the tree under `content`.
    pub fn build(env: &Env, scope: &ControllerScope, content: ElementId) -> Result<Self, MountError> {
        let root = MenuLevel::build(env, scope, content, 0, Weak::new(), None)?;
        Ok(Self {
            env: env.clone(),
            root,
        })
    }

    pub fn content(&self) -> ElementId {
        self.root.content
    }

    pub fn root_level(&self) -> &Rc<MenuLevel> {
        &self.root
    }

    pub fn focus_first(&self) -> Option<ElementId> {
        self.root.nav.borrow_mut().first()
    }

    pub fn focus_last(&self) -> Option<ElementId> {
        self.root.nav.borrow_mut().last()
    }

    /// Close all submenus and clear every navigator.
    pub fn collapse(&self) {
        self.root.collapse();
    }

    /// Disclosure of the submenu opened by `trigger`, at any depth.
    pub fn submenu(&self, trigger: ElementId) -> Option<Disclosure> {
        let mut found = None;
        let dom = &self.env.dom;
        self.root.for_each_disclosure(&mut |d| {
            if found.is_none() && d.parts().trigger == Some(trigger) {
                found = Some(d.clone());
            }
        });
        found.filter(|d| dom.is_connected(d.parts().content))
    }

    /// Open the submenu of `trigger` and focus its first item.
    pub fn open_submenu(&self, trigger: ElementId) -> bool {
        self.root
            .owner_of(trigger)
            .is_some_and(|level| level.open_submenu(trigger, true))
    }

    /// Route a key press at the focused level.
    pub fn handle_key(&self, key: &KeyEvent) -> MenuOutcome {
        let dom = &self.env.dom;
        let Some(active) = dom.active_element() else {
            return MenuOutcome::Ignored;
        };
        if !dom.contains(self.root.content, active) {
            return MenuOutcome::Ignored;
        }
        self.root.level_for(active).handle_key(key)
    }

    /// Hover intent for submenus, hover highlighting, and item clicks.
    pub fn handle_pointer(&self, pointer: &PointerEvent) -> MenuOutcome {
        self.root.handle_pointer(pointer)
    }

    /// Reposition open submenus after scroll or resize.
    pub fn handle_layout(&self, event: &Event) {
        self.root.for_each_disclosure(&mut |d| {
            d.handle_event(event);
        });
    }

    /// Number of open submenus in the tree.
    pub fn open_submenus(&self) -> usize {
        let mut count = 0;
        self.root.for_each_disclosure(&mut |d| {
            if d.is_open() {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::El;
    use dui_core::event::KeyCode;
    use dui_core::geometry::{Rect, Size};
    use web_time::Duration;

    const ID: &str = "ui--dropdown-menu";
    const TARGET: &str = "data-ui--dropdown-menu-target";

    fn t(name: &str, label: &str) -> El {
        El::new("div")
            .attr(TARGET, name)
            .text(label)
            .rect(Rect::new(0.0, 0.0, 120.0, 24.0))
    }

    struct Fixture {
        env: Env,
        menu: Menu,
        items: Vec<ElementId>,
    }

    fn fixture() -> Fixture {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = env.dom.clone();
        let root = dom.mount(
            dom.body(),
            El::new("div").attr("data-controller", ID).child(
                El::new("div")
                    .attr(TARGET, "content")
                    .rect(Rect::new(10.0, 10.0, 140.0, 200.0))
                    .children([
                        t("item", "New"),
                        t("checkbox-item", "Wrap"),
                        El::new("div").attr(TARGET, "radio-group").children([
                            t("radio-item", "Small"),
                            t("radio-item", "Large"),
                        ]),
                        El::new("div").attr(TARGET, "sub").children([
                            t("sub-trigger", "Share"),
                            El::new("div")
                                .attr(TARGET, "sub-content")
                                .rect(Rect::new(0.0, 0.0, 120.0, 60.0))
                                .children([t("item", "Mail"), t("item", "Link")]),
                        ]),
                        t("item", "Quit").flag("data-disabled"),
                    ]),
            ),
        );
        let scope = ControllerScope::new(&dom, root, ID);
        let content = scope.target("content").unwrap();
        let menu = Menu::build(&env, &scope, content).unwrap();
        let items = ITEM_TARGETS
            .iter()
            .flat_map(|n| scope.targets(n))
            .collect::<Vec<_>>();
        let mut items = items;
        items.sort();
        Fixture { env, menu, items }
    }

    fn label(dom: &Dom, id: Option<ElementId>) -> String {
        id.map(|id| dom.text(id)).unwrap_or_default()
    }

    #[test]
    fn roles_and_checked_state_written() {
        let f = fixture();
        let dom = &f.env.dom;
        let roles: Vec<String> = f
            .items
            .iter()
            .map(|&id| dom.attribute(id, "role").unwrap_or_default())
            .collect();
        assert!(roles.contains(&"menuitemcheckbox".to_owned()));
        assert!(roles.contains(&"menuitemradio".to_owned()));
        let quit = *f.items.last().unwrap();
        assert!(dom.attribute_is(quit, "aria-disabled", "true"));
    }

    #[test]
    fn navigation_skips_submenu_items_and_disabled() {
        let f = fixture();
        let dom = &f.env.dom;
        let mut seen = vec![label(dom, f.menu.focus_first())];
        for _ in 0..5 {
            f.menu.handle_key(&KeyEvent::new(KeyCode::Down));
            seen.push(label(dom, dom.active_element()));
        }
        assert_eq!(seen, ["New", "Wrap", "Small", "Large", "Share", "New"]);
    }

    #[test]
    fn checkbox_and_radio_activation() {
        let f = fixture();
        let dom = &f.env.dom;
        let scope_items = |name: &str| -> Vec<ElementId> {
            f.items
                .iter()
                .copied()
                .filter(|&id| dom.attribute_is(id, TARGET, name))
                .collect()
        };
        let wrap = scope_items("checkbox-item")[0];
        let radios = scope_items("radio-item");

        assert_eq!(f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Click, wrap)), MenuOutcome::Activated(wrap));
        assert!(dom.attribute_is(wrap, "aria-checked", "true"));
        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Click, wrap));
        assert!(dom.attribute_is(wrap, "data-state", "unchecked"));

        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Click, radios[0]));
        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Click, radios[1]));
        assert!(dom.attribute_is(radios[0], "aria-checked", "false"));
        assert!(dom.attribute_is(radios[1], "aria-checked", "true"));
    }

    #[test]
    fn arrow_right_opens_submenu_and_left_returns() {
        let f = fixture();
        let dom = &f.env.dom;
        f.menu.focus_last();
        let share = dom.active_element().unwrap();
        assert_eq!(dom.text(share), "Share");

        assert_eq!(f.menu.handle_key(&KeyEvent::new(KeyCode::Right)), MenuOutcome::Handled);
        assert_eq!(f.menu.open_submenus(), 1);
        assert_eq!(label(dom, dom.active_element()), "Mail");
        assert!(dom.attribute_is(share, "aria-expanded", "true"));

        assert_eq!(f.menu.handle_key(&KeyEvent::new(KeyCode::Left)), MenuOutcome::Handled);
        assert_eq!(f.menu.open_submenus(), 0);
        assert_eq!(dom.active_element(), Some(share));
    }

    #[test]
    fn top_level_cross_keys_bubble() {
        let f = fixture();
        f.menu.focus_first();
        assert_eq!(f.menu.handle_key(&KeyEvent::new(KeyCode::Right)), MenuOutcome::Forward);
        assert_eq!(f.menu.handle_key(&KeyEvent::new(KeyCode::Left)), MenuOutcome::Back);
    }

    #[test]
    fn submenu_hover_intent() {
        let f = fixture();
        let dom = &f.env.dom;
        let share = f
            .items
            .iter()
            .copied()
            .find(|&id| dom.text(id) == "Share")
            .unwrap();
        let sub = f.menu.submenu(share).unwrap();

        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Enter, share));
        assert!(sub.open_pending());
        f.env.scheduler.advance(Duration::from_millis(SUBMENU_DELAY_MS));
        assert!(sub.is_open());

        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Leave, share));
        f.env.scheduler.advance(Duration::from_millis(50));
        f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Enter, sub.parts().content));
        f.env.scheduler.advance(Duration::from_millis(500));
        assert!(sub.is_open());

        f.menu.collapse();
        assert!(!sub.is_open());
        assert_eq!(f.menu.open_submenus(), 0);
    }

    #[test]
    fn disabled_item_click_ignored() {
        let f = fixture();
        let quit = *f.items.last().unwrap();
        assert_eq!(
            f.menu.handle_pointer(&PointerEvent::new(PointerEventKind::Click, quit)),
            MenuOutcome::Ignored
        );
    }

    #[test]
    fn tree_links_are_weak_upwards() {
        let f = fixture();
        let root = Rc::clone(f.menu.root_level());
        let child = Rc::clone(&root.submenus.borrow()[0].level);
        assert_eq!(child.depth(), 1);
        assert!(Rc::ptr_eq(&child.parent().unwrap(), &root));
        assert_eq!(Rc::weak_count(&root), 1);
    }
}
