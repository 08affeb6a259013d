#![forbid(unsafe_code)]

//! Navigation menu: site navigation whose triggers reveal link panels on
//! hover (open 200 ms, close 150 ms) or click, one panel at a time.
//!
//! ```text
//! root
//! └── item
//!     ├── trigger
//!     └── content
//!         └── link ...
//! ```
//!
//! Keyboard: ArrowLeft/Right move between triggers, ArrowDown (or Enter)
//! opens the panel and focuses its first link, Up/Down move between links,
//! Escape closes the panel and returns focus to its trigger.

use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode, KeyEvent, PointerEventKind};
use dui_layout::{Align, Placement, Side};
use dui_runtime::{
    ControllerScope, DisclosureConfig, DisclosureDefaults, MountError, Orientation,
};
use std::cell::RefCell;

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts};
use crate::nav::{FocusMode, ItemSet, KeyboardNavigator, NavAction};

pub const IDENTIFIER: &str = "ui--navigation-menu";

#[derive(Debug)]
struct Panel {
    trigger: ElementId,
    disclosure: Disclosure,
    links: RefCell<KeyboardNavigator>,
}

/// A mounted navigation menu.
#[derive(Debug)]
pub struct NavigationMenu {
    env: Env,
    scope: ControllerScope,
    panels: Vec<Panel>,
    triggers: RefCell<KeyboardNavigator>,
}

impl NavigationMenu {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let dom = &env.dom;
        let scope = ControllerScope::new(dom, root, IDENTIFIER);
        let defaults = DisclosureDefaults::hover(200, 150)
            .placement(Placement::new(Side::Bottom).align(Align::Start));
        let config = DisclosureConfig::read(&scope.attrs(), defaults);
        let group = env
            .coordinator
            .group(&format!("navigation-menu:{}", root.raw()));
        dui_a11y::ensure_role(dom, root, "navigation");

        let mut panels = Vec::new();
        for item in scope.targets("item") {
            let Some(trigger) = scope.targets_within(item, "trigger").into_iter().next() else {
                // Plain link items carry no panel.
                continue;
            };
            let content = scope
                .targets_within(item, "content")
                .into_iter()
                .next()
                .ok_or_else(|| MountError::MissingTarget {
                    controller: IDENTIFIER.to_owned(),
                    target: "content",
                })?;
            let parts = DisclosureParts {
                root: item,
                trigger: Some(trigger),
                content,
                overlay: None,
            };
            let disclosure = Disclosure::new(env, scope.widget(), parts, config);
            disclosure.join_group(&group);
            let links = KeyboardNavigator::new(
                ItemSet::new(&scope, content, &["link"]),
                Orientation::Vertical,
            )
            .mode(FocusMode::Direct)
            .looping(false)
            .typeahead(false);
            panels.push(Panel {
                trigger,
                disclosure,
                links: RefCell::new(links),
            });
        }

        let triggers = KeyboardNavigator::new(
            ItemSet::new(&scope, root, &["trigger"]).with_boundaries(&["content"]),
            Orientation::Horizontal,
        )
        .mode(FocusMode::Direct)
        .typeahead(false);

        Ok(Rc::new(Self {
            env: env.clone(),
            scope,
            panels,
            triggers: RefCell::new(triggers),
        }))
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn trigger(&self, index: usize) -> Option<ElementId> {
        self.panels.get(index).map(|p| p.trigger)
    }

    pub fn disclosure(&self, index: usize) -> Option<&Disclosure> {
        self.panels.get(index).map(|p| &p.disclosure)
    }

    /// Index of the open panel.
    pub fn open_index(&self) -> Option<usize> {
        self.panels.iter().position(|p| p.disclosure.is_open())
    }

    fn panel_for_trigger(&self, element: ElementId) -> Option<&Panel> {
        let dom = self.scope.dom();
        self.panels.iter().find(|p| dom.contains(p.trigger, element))
    }

    fn panel_for_content(&self, element: ElementId) -> Option<&Panel> {
        let dom = self.scope.dom();
        self.panels
            .iter()
            .find(|p| dom.contains(p.disclosure.parts().content, element))
    }

    fn descend(&self, panel: &Panel) -> bool {
        panel.disclosure.open();
        panel.links.borrow_mut().first();
        true
    }

    fn handle_key(&self, key: &KeyEvent, event: &Event) -> bool {
        let dom = self.scope.dom();
        let Some(active) = dom.active_element() else {
            return false;
        };
        let now = self.env.scheduler.now();

        if let Some(panel) = self.panel_for_content(active) {
            if key.code == KeyCode::Escape {
                panel.disclosure.close();
                dom.focus(panel.trigger);
                return true;
            }
            let mut links = panel.links.borrow_mut();
            links.sync_from_focus();
            if key.code == KeyCode::Up && links.focused_index() == Some(0) {
                dom.focus(panel.trigger);
                return true;
            }
            return matches!(links.handle_key(key, now), NavAction::Moved(_));
        }

        if let Some(panel) = self.panel_for_trigger(active) {
            match key.code {
                KeyCode::Down => return self.descend(panel),
                KeyCode::Escape if panel.disclosure.is_open() => {
                    panel.disclosure.close();
                    return true;
                }
                _ if key.is_activation() => {
                    if panel.disclosure.is_open() {
                        panel.disclosure.close();
                        return true;
                    }
                    return self.descend(panel);
                }
                _ => {}
            }
        }

        let action = self.triggers.borrow_mut().handle_key(key, now);
        if matches!(action, NavAction::Moved(_)) {
            return true;
        }
        self.panels
            .iter()
            .fold(false, |handled, p| p.disclosure.handle_event(event) || handled)
    }
}

impl Controller for NavigationMenu {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        match event {
            Event::Key(key) if key.is_press() => self.handle_key(key, event),
            Event::Pointer(pointer) if pointer.kind == PointerEventKind::Click => {
                if let Some(panel) = self.panel_for_trigger(pointer.target) {
                    return panel.disclosure.toggle();
                }
                self.panels
                    .iter()
                    .fold(false, |handled, p| p.disclosure.handle_event(event) || handled)
            }
            _ => self
                .panels
                .iter()
                .fold(false, |handled, p| p.disclosure.handle_event(event) || handled),
        }
    }

    fn disconnect(&self) {
        for panel in &self.panels {
            panel.disclosure.disconnect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::geometry::{Rect, Size};
    use web_time::Duration;

    const TARGET: &str = "data-ui--navigation-menu-target";

    fn item(label: &str, x: f64, links: &[&str]) -> El {
        El::new("li").attr(TARGET, "item").children([
            El::new("button")
                .attr(TARGET, "trigger")
                .text(label)
                .rect(Rect::new(x, 0.0, 100.0, 40.0)),
            El::new("div")
                .attr(TARGET, "content")
                .rect(Rect::new(0.0, 0.0, 300.0, 200.0))
                .children(links.iter().map(|l| {
                    El::new("a").attr(TARGET, "link").attr("href", "#").text(*l)
                })),
        ])
    }

    fn fixture() -> (Env, Rc<NavigationMenu>) {
        let env = Env::new(Dom::new(Size::new(1024.0, 768.0)));
        let dom = &env.dom;
        let root = dom.mount(
            dom.body(),
            El::new("nav").attr("data-controller", IDENTIFIER).children([
                item("Getting started", 0.0, &["Introduction", "Installation"]),
                item("Components", 100.0, &["Accordion", "Dialog"]),
                El::new("li").attr(TARGET, "item").child(El::new("a").attr("href", "/docs").text("Docs")),
            ]),
        );
        let menu = NavigationMenu::mount(&env, root).unwrap();
        (env, menu)
    }

    #[test]
    fn hover_opens_after_delay_one_at_a_time() {
        let (env, nav) = fixture();
        assert_eq!(nav.len(), 2);
        let ms = Duration::from_millis;
        nav.handle_event(&Event::pointer(PointerEventKind::Enter, nav.trigger(0).unwrap()));
        env.scheduler.advance(ms(199));
        assert_eq!(nav.open_index(), None);
        env.scheduler.advance(ms(1));
        assert_eq!(nav.open_index(), Some(0));

        nav.handle_event(&Event::pointer(PointerEventKind::Leave, nav.trigger(0).unwrap()));
        nav.handle_event(&Event::pointer(PointerEventKind::Enter, nav.trigger(1).unwrap()));
        env.scheduler.advance(ms(200));
        assert_eq!(nav.open_index(), Some(1));
        assert!(!nav.disclosure(0).unwrap().is_open());
    }

    #[test]
    fn arrow_down_descends_into_links() {
        let (env, nav) = fixture();
        let dom = &env.dom;
        dom.focus(nav.trigger(0).unwrap());
        nav.handle_event(&Event::key(KeyCode::Right));
        assert_eq!(dom.active_element(), nav.trigger(1));
        nav.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(nav.open_index(), Some(1));
        assert_eq!(dom.active_element().map(|id| dom.text(id)).as_deref(), Some("Accordion"));
        nav.handle_event(&Event::key(KeyCode::Down));
        assert_eq!(dom.active_element().map(|id| dom.text(id)).as_deref(), Some("Dialog"));

        nav.handle_event(&Event::key(KeyCode::Escape));
        assert_eq!(nav.open_index(), None);
        assert_eq!(dom.active_element(), nav.trigger(1));
    }

    #[test]
    fn click_toggles_panel() {
        let (_env, nav) = fixture();
        let trigger = nav.trigger(0).unwrap();
        nav.handle_event(&Event::click(trigger));
        assert_eq!(nav.open_index(), Some(0));
        nav.handle_event(&Event::click(trigger));
        assert_eq!(nav.open_index(), None);
    }
}
