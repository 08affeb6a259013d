#![forbid(unsafe_code)]

//! Command palette and its modal wrapper.
//!
//! ```text
//! root
//! ├── input
//! ├── list
//! │   ├── group
//! │   │   └── item ...   data-keywords="extra search terms"
//! │   └── item ...
//! └── empty
//! ```
//!
//! [`Command::search`] hides every item whose label and keywords do not
//! contain the query (case-insensitive), hides groups left without visible
//! items, shows `empty` for zero results, and highlights the first result.
//! Focus stays in the input; ArrowUp/Down move the highlight and Enter runs
//! the highlighted item.
//!
//! [`CommandDialog`] (`ui--command-dialog`) mounts the same palette inside a
//! modal dialog toggled by Ctrl+K / Meta+K.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode, KeyEvent, Modifiers, PointerEventKind};
use dui_runtime::{ControllerScope, MountError, Orientation};

use crate::controller::{Controller, Env};
use crate::dialog::{Dialog, DialogKind};
use crate::disclosure::DisclosureState;
use crate::nav::{FocusMode, ItemSet, KeyboardNavigator, is_disabled, item_label, item_value};

pub const IDENTIFIER: &str = "ui--command";
pub const DIALOG_IDENTIFIER: &str = "ui--command-dialog";

type SelectObserver = Rc<dyn Fn(ElementId, &str)>;

/// A command palette.
pub struct Command {
    scope: ControllerScope,
    input: ElementId,
    empty: Option<ElementId>,
    nav: RefCell<KeyboardNavigator>,
    query: RefCell<String>,
    last_selected: Cell<Option<ElementId>>,
    observers: RefCell<Vec<SelectObserver>>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("root", &self.scope.root())
            .field("query", &self.query)
            .finish_non_exhaustive()
    }
}

impl Command {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, IDENTIFIER);
        Self::build(env, &scope).map(Rc::new)
    }

    /// Build over an existing scope.
    pub fn build(env: &Env, scope: &ControllerScope) -> Result<Self, MountError> {
        let dom = &env.dom;
        let input = scope.require("input")?;
        let list = scope.target("list").unwrap_or(scope.root());

        dui_a11y::ensure_role(dom, input, "combobox");
        dom.set_attribute(input, "aria-autocomplete", "list");
        dui_a11y::ensure_role(dom, list, "listbox");
        dui_a11y::link(dom, input, "aria-controls", list);
        for group in scope.targets("group") {
            dui_a11y::ensure_role(dom, group, "group");
        }
        for item in scope.targets("item") {
            dui_a11y::ensure_role(dom, item, "option");
            dui_a11y::ensure_id(dom, item, "ui-command-item");
        }

        let nav = KeyboardNavigator::new(ItemSet::new(scope, list, &["item"]), Orientation::Vertical)
            .mode(FocusMode::Virtual { host: input })
            .looping(scope.attrs().bool("loop", true))
            .typeahead(false);
        let command = Self {
            scope: scope.clone(),
            input,
            empty: scope.target("empty"),
            nav: RefCell::new(nav),
            query: RefCell::new(String::new()),
            last_selected: Cell::new(None),
            observers: RefCell::new(Vec::new()),
        };
        command.search("");
        Ok(command)
    }

    pub fn input(&self) -> ElementId {
        self.input
    }

    pub fn query(&self) -> String {
        self.query.borrow().clone()
    }

    /// Items passing the current search.
    pub fn visible_count(&self) -> usize {
        let dom = self.scope.dom();
        self.scope
            .targets("item")
            .into_iter()
            .filter(|&id| !dom.has_attribute(id, "hidden"))
            .count()
    }

    pub fn highlighted(&self) -> Option<ElementId> {
        self.nav.borrow().current()
    }

    pub fn last_selected(&self) -> Option<ElementId> {
        self.last_selected.get()
    }

    pub fn on_select(&self, observer: impl Fn(ElementId, &str) + 'static) {
        self.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Filter items by `query`. Returns the number of visible items.
    pub fn search(&self, query: &str) -> usize {
        let dom = self.scope.dom();
        *self.query.borrow_mut() = query.to_owned();
        dom.set_attribute(self.input, "value", query);
        let needle = query.trim().to_lowercase();

        let mut visible = 0;
        for item in self.scope.targets("item") {
            let keywords = dom.attribute(item, "data-keywords").unwrap_or_default();
            let shown = needle.is_empty()
                || item_label(dom, item).to_lowercase().contains(&needle)
                || keywords.to_lowercase().contains(&needle);
            dom.toggle_attribute(item, "hidden", !shown);
            visible += usize::from(shown);
        }
        for group in self.scope.targets("group") {
            let any = self
                .scope
                .targets_within(group, "item")
                .into_iter()
                .any(|id| !dom.has_attribute(id, "hidden"));
            dom.toggle_attribute(group, "hidden", !any);
        }
        if let Some(empty) = self.empty {
            dom.toggle_attribute(empty, "hidden", visible > 0);
        }

        let mut nav = self.nav.borrow_mut();
        nav.reset();
        nav.first();
        tracing::trace!(widget = IDENTIFIER, query, visible, "searched");
        visible
    }

    /// Run `item`. Disabled items are ignored.
    pub fn select(&self, item: ElementId) -> bool {
        let dom = self.scope.dom();
        if is_disabled(dom, item) || dom.has_attribute(item, "hidden") {
            return false;
        }
        let value = item_value(dom, item);
        tracing::debug!(widget = IDENTIFIER, value = %value, "command selected");
        self.last_selected.set(Some(item));
        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(item, &value);
        }
        true
    }

    /// Handle a key while focus is inside the palette.
    pub fn handle_key(&self, key: &KeyEvent) -> bool {
        let dom = self.scope.dom();
        let inside = dom
            .active_element()
            .is_some_and(|active| dom.contains(self.scope.root(), active));
        if !inside {
            return false;
        }
        match key.code {
            KeyCode::Down => self.nav.borrow_mut().next().is_some(),
            KeyCode::Up => self.nav.borrow_mut().previous().is_some(),
            KeyCode::Enter => {
                let current = self.nav.borrow().current();
                current.is_some_and(|item| self.select(item))
            }
            _ => false,
        }
    }

    fn item_at(&self, target: ElementId) -> Option<ElementId> {
        self.scope.closest_target(target, "item")
    }
}

impl Controller for Command {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Input(input) if input.target == self.input => {
                self.search(&input.value);
                true
            }
            Event::Key(key) if key.is_press() => self.handle_key(key),
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Click => self
                .item_at(pointer.target)
                .is_some_and(|item| self.select(item)),
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Enter => {
                match self.item_at(pointer.target) {
                    Some(item) => self.nav.borrow_mut().focus_item(item),
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn disconnect(&self) {
        self.nav.borrow_mut().reset();
    }
}

/// Whether `key` is the palette shortcut (Ctrl+K or Meta+K).
pub fn is_palette_shortcut(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('k') | KeyCode::Char('K'))
        && key.modifiers.intersects(Modifiers::CTRL | Modifiers::META)
}

/// A command palette inside a modal dialog.
#[derive(Debug)]
pub struct CommandDialog {
    dialog: Dialog,
    command: Command,
}

impl CommandDialog {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, DIALOG_IDENTIFIER);
        let command = Command::build(env, &scope)?;
        let dialog = Dialog::from_scope(env, scope, DialogKind::Dialog, DIALOG_IDENTIFIER)?;
        let input = command.input();
        dialog.disclosure().set_initial_focus(move || Some(input));

        let this = Rc::new(Self { dialog, command });
        let weak = Rc::downgrade(&this);
        this.dialog.disclosure().on_change(move |t| {
            if t.to == DisclosureState::Closed
                && let Some(this) = weak.upgrade()
            {
                this.command.search("");
            }
        });
        let weak = Rc::downgrade(&this);
        this.command.on_select(move |_, _| {
            if let Some(this) = weak.upgrade() {
                this.dialog.close();
            }
        });
        Ok(this)
    }

    pub fn dialog(&self) -> &Dialog {
        &self.dialog
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub fn open(&self) -> bool {
        self.dialog.open()
    }

    pub fn close(&self) -> bool {
        self.dialog.close()
    }

    pub fn toggle(&self) -> bool {
        self.dialog.toggle()
    }
}

impl Controller for CommandDialog {
    fn identifier(&self) -> &'static str {
        DIALOG_IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.dialog.scope().root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        if let Event::Key(key) = event
            && key.is_press()
        {
            if is_palette_shortcut(key) {
                return self.toggle();
            }
            if self.is_open() && self.command.handle_key(key) {
                return true;
            }
            return self.dialog.handle_event(event);
        }
        if self.is_open() && self.command.handle_event(event) {
            return true;
        }
        self.dialog.handle_event(event)
    }

    fn disconnect(&self) {
        self.command.disconnect();
        self.dialog.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::event::InputEvent;
    use dui_core::geometry::Size;

    fn palette(identifier: &str) -> Vec<El> {
        let target = format!("data-{identifier}-target");
        let t = |name: &str, tag: &str| El::new(tag).attr(target.as_str(), name);
        vec![
            t("input", "input"),
            t("list", "div").children([
                t("group", "div").children([
                    t("item", "div").text("Calendar"),
                    t("item", "div").text("Search Emoji").attr("data-keywords", "smiley"),
                    t("item", "div").text("Calculator").flag("data-disabled"),
                ]),
                t("group", "div").children([
                    t("item", "div").text("Profile"),
                    t("item", "div").text("Settings").attr("data-value", "prefs"),
                ]),
            ]),
            t("empty", "div").text("No results found."),
        ]
    }

    fn command() -> (Env, Rc<Command>) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let root = dom.mount(
            dom.body(),
            El::new("div")
                .attr("data-controller", IDENTIFIER)
                .children(palette(IDENTIFIER)),
        );
        let command = Command::mount(&env, root).unwrap();
        dom.focus(command.input());
        (env, command)
    }

    #[test]
    fn search_nonexistent_shows_empty_then_restores() {
        let (env, cmd) = command();
        let dom = &env.dom;
        let empty = cmd.scope.target("empty").unwrap();
        assert_eq!(cmd.visible_count(), 5);
        assert!(dom.has_attribute(empty, "hidden"));

        assert_eq!(cmd.search("nonexistent"), 0);
        assert_eq!(cmd.visible_count(), 0);
        assert!(!dom.has_attribute(empty, "hidden"));
        assert!(cmd.scope.targets("group").iter().all(|&g| dom.has_attribute(g, "hidden")));

        cmd.search("");
        assert_eq!(cmd.visible_count(), 5);
        assert!(dom.has_attribute(empty, "hidden"));
    }

    #[test]
    fn keywords_match_and_groups_hide() {
        let (env, cmd) = command();
        let dom = &env.dom;
        assert_eq!(cmd.search("smiley"), 1);
        let groups = cmd.scope.targets("group");
        assert!(!dom.has_attribute(groups[0], "hidden"));
        assert!(dom.has_attribute(groups[1], "hidden"));
        assert_eq!(cmd.highlighted().map(|id| dom.text(id)).as_deref(), Some("Search Emoji"));
    }

    #[test]
    fn arrows_skip_disabled_and_enter_selects() {
        let (env, cmd) = command();
        let dom = &env.dom;
        let picked = Rc::new(RefCell::new(String::new()));
        let sink = Rc::clone(&picked);
        cmd.on_select(move |_, value| *sink.borrow_mut() = value.to_owned());

        assert_eq!(cmd.highlighted().map(|id| dom.text(id)).as_deref(), Some("Calendar"));
        cmd.handle_event(&Event::key(KeyCode::Down));
        cmd.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(cmd.highlighted().map(|id| dom.text(id)).as_deref(), Some("Profile"));
        cmd.handle_event(&Event::key(KeyCode::Down));
        cmd.handle_event(&Event::key(KeyCode::Enter));
        assert_eq!(picked.borrow().as_str(), "prefs");
        assert_eq!(dom.active_element(), Some(cmd.input()));
    }

    #[test]
    fn input_event_searches() {
        let (_env, cmd) = command();
        cmd.handle_event(&Event::Input(InputEvent {
            target: cmd.input(),
            value: "cal".to_owned(),
        }));
        assert_eq!(cmd.visible_count(), 2);
        assert_eq!(cmd.query(), "cal");
    }

    fn command_dialog() -> (Env, Rc<CommandDialog>) {
        let env = Env::new(Dom::new(Size::new(800.0, 600.0)));
        let dom = &env.dom;
        let target = format!("data-{DIALOG_IDENTIFIER}-target");
        let root = dom.mount(
            dom.body(),
            El::new("div").attr("data-controller", DIALOG_IDENTIFIER).children([
                El::new("div").attr(target.as_str(), "overlay"),
                El::new("div")
                    .attr(target.as_str(), "content")
                    .children(palette(DIALOG_IDENTIFIER)),
            ]),
        );
        let palette = CommandDialog::mount(&env, root).unwrap();
        (env, palette)
    }

    #[test]
    fn shortcut_toggles_and_focuses_input() {
        let (env, cd) = command_dialog();
        let dom = &env.dom;
        let ctrl_k = Event::Key(KeyEvent::new(KeyCode::Char('k')).with_modifiers(Modifiers::CTRL));
        assert!(cd.handle_event(&ctrl_k));
        assert!(cd.is_open());
        assert_eq!(dom.active_element(), Some(cd.command().input()));
        assert_eq!(dom.style(dom.body(), "overflow"), "hidden");

        let meta_k = Event::Key(KeyEvent::new(KeyCode::Char('k')).with_modifiers(Modifiers::META));
        cd.handle_event(&meta_k);
        assert!(!cd.is_open());
    }

    #[test]
    fn selection_closes_and_resets_search() {
        let (_env, cd) = command_dialog();
        cd.open();
        cd.command().search("prof");
        assert_eq!(cd.command().visible_count(), 1);
        cd.handle_event(&Event::key(KeyCode::Enter));
        assert!(!cd.is_open());
        assert_eq!(cd.command().visible_count(), 5);
        assert_eq!(cd.command().query(), "");
    }
}
