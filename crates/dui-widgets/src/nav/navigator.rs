#![forbid(unsafe_code)]

//! Keyboard navigation over a live item set.
//!
//! The navigator remembers the *element* it last focused, never an index:
//! the focused index is recomputed against the current enabled items on
//! every query, so it is always in bounds (or `None`) and never names a
//! disabled item, however the set changed in between.
//!
//! | Orientation | Move | Cross (forward / back) |
//! |-------------|------|------------------------|
//! | Vertical | ArrowDown / ArrowUp | ArrowRight / ArrowLeft |
//! | Horizontal | ArrowRight / ArrowLeft | ArrowDown / ArrowUp |
//!
//! Home/End jump to the extremes in both orientations. Enter and Space
//! activate the focused item unless it is an editable control (Space then
//! types). Printable characters feed the typeahead.
//!
//! # Focus modes
//!
//! - [`FocusMode::Roving`]: DOM focus moves; the focused item has
//!   `tabindex="0"`, all others `"-1"`.
//! - [`FocusMode::Direct`]: DOM focus moves; tabindex untouched (accordion
//!   triggers stay individually tabbable).
//! - [`FocusMode::Virtual`]: DOM focus stays on `host`; the active item gets
//!   `data-highlighted` and the host's `aria-activedescendant` names it.

use dui_core::dom::ElementId;
use dui_core::event::{KeyCode, KeyEvent};
use dui_runtime::Orientation;
use web_time::Duration;

use super::items::{ItemSet, item_label};
use super::typeahead::Typeahead;

/// Attribute marking the virtually focused item.
pub const HIGHLIGHTED: &str = "data-highlighted";

/// How the active item is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusMode {
    Roving,
    Direct,
    Virtual { host: ElementId },
}

/// Outcome of a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Not a navigation key.
    None,
    /// Focus moved (or stayed) on this item.
    Moved(ElementId),
    /// Enter/Space on this item.
    Activate(ElementId),
    /// Cross-axis key towards a child list (enter submenu, descend).
    Forward,
    /// Cross-axis key towards the parent (exit submenu).
    Back,
}

/// Roving-focus, typeahead-capable navigator.
#[derive(Debug, Clone)]
pub struct KeyboardNavigator {
    items: ItemSet,
    orientation: Orientation,
    looping: bool,
    mode: FocusMode,
    typeahead_enabled: bool,
    current: Option<ElementId>,
    typeahead: Typeahead,
}

impl KeyboardNavigator {
    pub fn new(items: ItemSet, orientation: Orientation) -> Self {
        Self {
            items,
            orientation,
            looping: true,
            mode: FocusMode::Roving,
            typeahead_enabled: true,
            current: None,
            typeahead: Typeahead::new(),
        }
    }

    /// Wrap from last to first and back (default `true`).
    #[must_use]
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: FocusMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn typeahead(mut self, enabled: bool) -> Self {
        self.typeahead_enabled = enabled;
        self
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Number of navigable items right now.
    pub fn len(&self) -> usize {
        self.items.enabled_elements().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The focused item, if it is still navigable.
    pub fn current(&self) -> Option<ElementId> {
        let current = self.current?;
        self.items
            .enabled_elements()
            .contains(&current)
            .then_some(current)
    }

    /// Index of the focused item among navigable items (`None` is -1).
    pub fn focused_index(&self) -> Option<usize> {
        let current = self.current?;
        self.items
            .enabled_elements()
            .iter()
            .position(|&id| id == current)
    }

    /// Focus the `index`-th navigable item.
    pub fn focus_index(&mut self, index: usize) -> Option<ElementId> {
        let target = self.items.enabled_elements().get(index).copied()?;
        self.apply(target);
        Some(target)
    }

    /// Focus `id` if it is a navigable item.
    pub fn focus_item(&mut self, id: ElementId) -> bool {
        if !self.items.enabled_elements().contains(&id) {
            return false;
        }
        self.apply(id);
        true
    }

    pub fn first(&mut self) -> Option<ElementId> {
        self.focus_index(0)
    }

    pub fn last(&mut self) -> Option<ElementId> {
        let len = self.len();
        self.focus_index(len.checked_sub(1)?)
    }

    /// Move forward, wrapping last to first when looping.
    pub fn next(&mut self) -> Option<ElementId> {
        self.step(true)
    }

    /// Move backward, wrapping first to last when looping.
    pub fn previous(&mut self) -> Option<ElementId> {
        self.step(false)
    }

    fn step(&mut self, forward: bool) -> Option<ElementId> {
        let items = self.items.enabled_elements();
        let len = items.len();
        if len == 0 {
            return None;
        }
        let index = match self.focused_index() {
            None if forward => 0,
            None => len - 1,
            Some(i) if forward => {
                if i + 1 < len {
                    i + 1
                } else if self.looping {
                    0
                } else {
                    i
                }
            }
            Some(0) if self.looping => len - 1,
            Some(0) => 0,
            Some(i) => i - 1,
        };
        let target = items[index];
        self.apply(target);
        Some(target)
    }

    /// Feed a typeahead character at virtual time `now`.
    pub fn type_char(&mut self, ch: char, now: Duration) -> Option<ElementId> {
        let items = self.items.enabled_elements();
        let dom = self.items.dom().clone();
        let labels: Vec<String> = items.iter().map(|&id| item_label(&dom, id)).collect();
        self.typeahead.push(ch, now);
        let index = self.typeahead.find(&labels, self.focused_index())?;
        let target = items[index];
        self.apply(target);
        Some(target)
    }

    /// The item Enter/Space would activate.
    pub fn activation_target(&self) -> Option<ElementId> {
        self.current()
            .filter(|&id| !self.items.dom().is_editable(id))
    }

    /// Adopt DOM focus as the current item when it sits on one.
    pub fn sync_from_focus(&mut self) {
        if matches!(self.mode, FocusMode::Virtual { .. }) {
            return;
        }
        if let Some(active) = self.items.dom().active_element()
            && let Some(item) = self.items.item_for(active)
        {
            self.current = Some(item);
        }
    }

    /// Make `id` the tab stop without moving DOM focus (roving mode).
    pub fn set_tab_stop(&mut self, id: ElementId) {
        self.current = Some(id);
        if self.mode == FocusMode::Roving {
            self.write_tabindex(Some(id));
        }
    }

    /// Clear the current item: every item back to `tabindex="-1"`, no
    /// highlight, typeahead reset.
    pub fn reset(&mut self) {
        self.current = None;
        self.typeahead.clear();
        let dom = self.items.dom().clone();
        match self.mode {
            FocusMode::Roving => self.write_tabindex(None),
            FocusMode::Direct => {}
            FocusMode::Virtual { host } => {
                for id in self.items.elements() {
                    dom.remove_attribute(id, HIGHLIGHTED);
                }
                dui_a11y::set_active_descendant(&dom, host, None);
            }
        }
    }

    fn write_tabindex(&self, active: Option<ElementId>) {
        let dom = self.items.dom();
        for id in self.items.elements() {
            dom.set_attribute(id, "tabindex", if Some(id) == active { "0" } else { "-1" });
        }
    }

    fn apply(&mut self, target: ElementId) {
        tracing::trace!(
            from = self.current.map(ElementId::raw),
            to = target.raw(),
            "navigate"
        );
        self.current = Some(target);
        let dom = self.items.dom().clone();
        match self.mode {
            FocusMode::Roving => {
                self.write_tabindex(Some(target));
                dom.focus(target);
            }
            FocusMode::Direct => {
                dom.focus(target);
            }
            FocusMode::Virtual { host } => {
                for id in self.items.elements() {
                    dom.toggle_attribute(id, HIGHLIGHTED, id == target);
                }
                dui_a11y::set_active_descendant(&dom, host, Some(target));
            }
        }
    }

    /// Translate a key press into movement or an action.
    pub fn handle_key(&mut self, key: &KeyEvent, now: Duration) -> NavAction {
        if !key.is_press() {
            return NavAction::None;
        }
        self.sync_from_focus();
        let vertical = self.orientation == Orientation::Vertical;
        let moved = |target: Option<ElementId>| target.map_or(NavAction::None, NavAction::Moved);

        match key.code {
            KeyCode::Down if vertical => moved(self.next()),
            KeyCode::Up if vertical => moved(self.previous()),
            KeyCode::Right if !vertical => moved(self.next()),
            KeyCode::Left if !vertical => moved(self.previous()),
            KeyCode::Right | KeyCode::Down => NavAction::Forward,
            KeyCode::Left | KeyCode::Up => NavAction::Back,
            KeyCode::Home => moved(self.first()),
            KeyCode::End => moved(self.last()),
            KeyCode::Char(' ') if self.typeahead_enabled && self.typeahead.is_active(now) => {
                moved(self.type_char(' ', now))
            }
            KeyCode::Enter | KeyCode::Char(' ') => self
                .activation_target()
                .map_or(NavAction::None, NavAction::Activate),
            _ => match key.printable() {
                Some(ch) if self.typeahead_enabled => moved(self.type_char(ch, now)),
                _ => NavAction::None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::geometry::Size;
    use dui_runtime::ControllerScope;

    const ID: &str = "ui--dropdown-menu";

    fn item(label: &str) -> El {
        El::new("div")
            .attr("data-ui--dropdown-menu-target", "item")
            .attr("role", "menuitem")
            .text(label)
    }

    fn setup(labels: &[&str]) -> (Dom, KeyboardNavigator, Vec<ElementId>) {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let root = dom.mount(
            dom.body(),
            El::new("div")
                .attr("data-controller", ID)
                .children(labels.iter().map(|l| item(l))),
        );
        let scope = ControllerScope::new(&dom, root, ID);
        let items = ItemSet::new(&scope, root, &["item"]);
        let elements = items.elements();
        let mut nav = KeyboardNavigator::new(items, Orientation::Vertical);
        nav.reset();
        (dom, nav, elements)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code)
    }

    #[test]
    fn next_wraps_after_n_steps() {
        let (_, mut nav, els) = setup(&["a", "b", "c", "d"]);
        nav.first();
        for _ in 0..els.len() {
            nav.next();
        }
        assert_eq!(nav.current(), Some(els[0]));
        nav.previous();
        assert_eq!(nav.current(), Some(els[3]));
    }

    #[test]
    fn no_loop_clamps() {
        let (_, nav, els) = setup(&["a", "b"]);
        let mut nav = nav.looping(false);
        nav.last();
        nav.next();
        assert_eq!(nav.current(), Some(els[1]));
        nav.first();
        nav.previous();
        assert_eq!(nav.current(), Some(els[0]));
    }

    #[test]
    fn disabled_items_are_skipped() {
        let (dom, mut nav, els) = setup(&["a", "b", "c"]);
        dom.set_attribute(els[1], "data-disabled", "");
        nav.first();
        assert_eq!(nav.next(), Some(els[2]));
        assert_eq!(nav.next(), Some(els[0]));
        assert_eq!(nav.len(), 2);
    }

    #[test]
    fn focused_index_tracks_live_set() {
        let (dom, mut nav, els) = setup(&["a", "b", "c"]);
        nav.focus_index(2);
        assert_eq!(nav.focused_index(), Some(2));
        dom.set_attribute(els[0], "data-disabled", "");
        assert_eq!(nav.focused_index(), Some(1));
        dom.set_attribute(els[2], "data-disabled", "");
        assert_eq!(nav.focused_index(), None);
        assert_eq!(nav.current(), None);
    }

    #[test]
    fn roving_tabindex_follows_focus() {
        let (dom, mut nav, els) = setup(&["a", "b"]);
        assert!(els.iter().all(|&id| dom.attribute_is(id, "tabindex", "-1")));
        nav.next();
        assert!(dom.attribute_is(els[0], "tabindex", "0"));
        assert_eq!(dom.active_element(), Some(els[0]));
        nav.next();
        assert!(dom.attribute_is(els[0], "tabindex", "-1"));
        assert!(dom.attribute_is(els[1], "tabindex", "0"));
        nav.reset();
        assert!(els.iter().all(|&id| dom.attribute_is(id, "tabindex", "-1")));
    }

    #[test]
    fn virtual_focus_highlights_without_moving_dom_focus() {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let root = dom.mount(
            dom.body(),
            El::new("div")
                .attr("data-controller", ID)
                .children([El::new("input").id("search"), item("a"), item("b")]),
        );
        let input = dom.children(root)[0];
        dom.focus(input);
        let scope = ControllerScope::new(&dom, root, ID);
        let items = ItemSet::new(&scope, root, &["item"]);
        let els = items.elements();
        let mut nav = KeyboardNavigator::new(items, Orientation::Vertical)
            .mode(FocusMode::Virtual { host: input });
        nav.next();
        nav.next();
        assert_eq!(dom.active_element(), Some(input));
        assert!(dom.has_attribute(els[1], HIGHLIGHTED));
        assert!(!dom.has_attribute(els[0], HIGHLIGHTED));
        let id = dom.attribute(els[1], "id").unwrap();
        assert_eq!(dom.attribute(input, "aria-activedescendant"), Some(id));
        nav.reset();
        assert!(!dom.has_attribute(els[1], HIGHLIGHTED));
        assert!(!dom.has_attribute(input, "aria-activedescendant"));
    }

    #[test]
    fn keys_map_by_orientation() {
        let (_, mut nav, els) = setup(&["a", "b"]);
        assert_eq!(nav.handle_key(&press(KeyCode::Down), Duration::ZERO), NavAction::Moved(els[0]));
        assert_eq!(nav.handle_key(&press(KeyCode::End), Duration::ZERO), NavAction::Moved(els[1]));
        assert_eq!(nav.handle_key(&press(KeyCode::Right), Duration::ZERO), NavAction::Forward);
        assert_eq!(nav.handle_key(&press(KeyCode::Left), Duration::ZERO), NavAction::Back);
        assert_eq!(nav.handle_key(&press(KeyCode::Enter), Duration::ZERO), NavAction::Activate(els[1]));
        assert_eq!(
            nav.handle_key(&press(KeyCode::Char(' ')), Duration::ZERO),
            NavAction::Activate(els[1])
        );
    }

    #[test]
    fn typeahead_jumps_and_cycles() {
        let (_, mut nav, els) = setup(&["Banana", "apple", "Blueberry", "cherry"]);
        let t = Duration::from_millis;
        assert_eq!(nav.handle_key(&press(KeyCode::Char('b')), t(0)), NavAction::Moved(els[0]));
        assert_eq!(nav.handle_key(&press(KeyCode::Char('b')), t(100)), NavAction::Moved(els[2]));
        assert_eq!(nav.handle_key(&press(KeyCode::Char('c')), t(2000)), NavAction::Moved(els[3]));
    }

    #[test]
    fn space_activates_once_typeahead_lapses() {
        let (_, mut nav, els) = setup(&["Banana", "apple"]);
        let t = Duration::from_millis;
        assert_eq!(nav.handle_key(&press(KeyCode::Char('b')), t(0)), NavAction::Moved(els[0]));
        assert_eq!(
            nav.handle_key(&press(KeyCode::Char(' ')), t(5000)),
            NavAction::Activate(els[0])
        );
        assert_eq!(nav.handle_key(&press(KeyCode::Enter), t(5100)), NavAction::Activate(els[0]));
    }

    #[test]
    fn editable_items_do_not_activate() {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let root = dom.mount(
            dom.body(),
            El::new("div").attr("data-controller", ID).child(
                El::new("input").attr("data-ui--dropdown-menu-target", "item"),
            ),
        );
        let scope = ControllerScope::new(&dom, root, ID);
        let mut nav = KeyboardNavigator::new(ItemSet::new(&scope, root, &["item"]), Orientation::Vertical);
        nav.first();
        assert_eq!(nav.handle_key(&press(KeyCode::Enter), Duration::ZERO), NavAction::None);
    }

    proptest::proptest! {
        #[test]
        fn n_steps_return_to_start(n in 1usize..12, start in 0usize..12) {
            let labels: Vec<String> = (0..n).map(|i| format!("item {i}")).collect();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let (_, mut nav, _) = setup(&refs);
            let start = start % n;
            let origin = nav.focus_index(start);
            for _ in 0..n {
                nav.next();
            }
            proptest::prop_assert_eq!(nav.current(), origin);
            proptest::prop_assert_eq!(nav.focused_index(), Some(start));
        }
    }
}
