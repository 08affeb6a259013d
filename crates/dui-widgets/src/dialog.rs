#![forbid(unsafe_code)]

//! Modal surfaces: dialog, alert dialog, sheet, drawer.
//!
//! All four are modal disclosures: opening traps focus in the content,
//! locks document scroll, and shows the overlay.
//!
//! | Kind | Overlay click | Close targets | Extra |
//! |------|---------------|---------------|-------|
//! | `ui--dialog` | closes (configurable) | `close` | |
//! | `ui--alert-dialog` | never closes | `close`, `cancel`, `action` | initial focus on `cancel` |
//! | `ui--sheet` | closes | `close` | `data-side` (default `right`) |
//! | `ui--drawer` | closes | `close` | `data-side` (default `bottom`) |
//!
//! Escape closes every kind unless `close-on-escape` is turned off.

use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::{Event, PointerEventKind};
use dui_layout::Side;
use dui_runtime::{ControllerScope, DisclosureConfig, DisclosureDefaults, MountError};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};

/// Which modal surface a root mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogKind {
    Dialog,
    AlertDialog,
    Sheet,
    Drawer,
}

impl DialogKind {
    pub const ALL: [DialogKind; 4] = [Self::Dialog, Self::AlertDialog, Self::Sheet, Self::Drawer];

    pub const fn identifier(self) -> &'static str {
        match self {
            Self::Dialog => "ui--dialog",
            Self::AlertDialog => "ui--alert-dialog",
            Self::Sheet => "ui--sheet",
            Self::Drawer => "ui--drawer",
        }
    }

    const fn role(self) -> &'static str {
        match self {
            Self::AlertDialog => "alertdialog",
            Self::Dialog | Self::Sheet | Self::Drawer => "dialog",
        }
    }

    const fn default_side(self) -> Option<Side> {
        match self {
            Self::Sheet => Some(Side::Right),
            Self::Drawer => Some(Side::Bottom),
            Self::Dialog | Self::AlertDialog => None,
        }
    }

    const fn close_targets(self) -> &'static [&'static str] {
        match self {
            Self::AlertDialog => &["close", "cancel", "action"],
            Self::Dialog | Self::Sheet | Self::Drawer => &["close"],
        }
    }
}

/// A mounted modal surface.
#[derive(Debug)]
pub struct Dialog {
    kind: DialogKind,
    identifier: &'static str,
    scope: ControllerScope,
    disclosure: Disclosure,
    side: Option<Side>,
}

impl Dialog {
    pub fn mount(env: &Env, root: ElementId, kind: DialogKind) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, kind.identifier());
        Self::from_scope(env, scope, kind, kind.identifier()).map(Rc::new)
    }

    /// Build over an existing scope (a command dialog reuses its own).
    pub fn from_scope(
        env: &Env,
        scope: ControllerScope,
        kind: DialogKind,
        identifier: &'static str,
    ) -> Result<Self, MountError> {
        let dom = &env.dom;
        let parts = DisclosureParts::from_scope(&scope)?;
        let mut config = DisclosureConfig::read(&scope.attrs(), DisclosureDefaults::modal());
        if kind == DialogKind::AlertDialog {
            config.close_on_overlay_click = false;
        }

        dui_a11y::ensure_role(dom, parts.content, kind.role());
        if let Some(title) = scope.target("title") {
            dui_a11y::link(dom, parts.content, "aria-labelledby", title);
        }
        if let Some(description) = scope.target("description") {
            dui_a11y::link(dom, parts.content, "aria-describedby", description);
        }
        if let Some(trigger) = parts.trigger {
            dom.set_attribute(trigger, "aria-haspopup", "dialog");
        }
        let side = kind
            .default_side()
            .map(|default| scope.attrs().side("side", default));
        if let Some(side) = side {
            dom.set_attribute(parts.content, "data-side", side.as_str());
        }

        let disclosure = Disclosure::new(env, scope.widget(), parts, config);
        if kind == DialogKind::AlertDialog {
            let cancel = scope.target("cancel");
            disclosure.set_initial_focus(move || cancel);
        }
        disclosure.open_if_configured();
        Ok(Self {
            kind,
            identifier,
            scope,
            disclosure,
            side,
        })
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn scope(&self) -> &ControllerScope {
        &self.scope
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
    }

    /// Edge a sheet or drawer slides from.
    pub fn side(&self) -> Option<Side> {
        self.side
    }

    pub fn state(&self) -> DisclosureState {
        self.disclosure.state()
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

    pub fn toggle(&self) -> bool {
        self.disclosure.toggle()
    }

    fn close_target_hit(&self, target: ElementId) -> bool {
        self.kind
            .close_targets()
            .iter()
            .any(|name| self.scope.closest_target(target, name).is_some())
    }
}

impl Controller for Dialog {
    fn identifier(&self) -> &'static str {
        self.identifier
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        if let Event::Pointer(pointer) = event
            && pointer.kind == PointerEventKind::Click
            && self.is_open()
            && self.close_target_hit(pointer.target)
        {
            return self.close();
        }
        self.disclosure.handle_event(event)
    }

    fn disconnect(&self) {
        self.disclosure.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::{Dom, El};
    use dui_core::event::KeyCode;
    use dui_core::geometry::Size;

    struct Fixture {
        env: Env,
        dialog: Rc<Dialog>,
        trigger: ElementId,
        overlay: ElementId,
        content: ElementId,
    }

    fn fixture(kind: DialogKind, attrs: &[(&str, &str)]) -> Fixture {
        fixture_in(Env::new(Dom::new(Size::new(800.0, 600.0))), kind, attrs)
    }

    fn fixture_in(env: Env, kind: DialogKind, attrs: &[(&str, &str)]) -> Fixture {
        let dom = env.dom.clone();
        let id = kind.identifier();
        let target = format!("data-{id}-target");
        let t = |name: &str, tag: &str| El::new(tag).attr(target.as_str(), name);
        let mut root = El::new("div").attr("data-controller", id);
        for (name, value) in attrs {
            root = root.attr(format!("data-{id}-{name}-value"), *value);
        }
        let root = dom.mount(
            dom.body(),
            root.children([
                t("trigger", "button").text("Open"),
                t("overlay", "div"),
                t("content", "div").children([
                    t("title", "h2").text("Delete file?"),
                    t("description", "p").text("This cannot be undone."),
                    t("cancel", "button").text("Cancel"),
                    t("action", "button").text("Delete"),
                    t("close", "button").text("Close"),
                ]),
            ]),
        );
        let dialog = Dialog::mount(&env, root, kind).unwrap();
        let kids = dom.children(root);
        Fixture {
            env,
            dialog,
            trigger: kids[0],
            overlay: kids[1],
            content: kids[2],
        }
    }

    #[test]
    fn dialog_locks_scroll_and_restores() {
        let f = fixture(DialogKind::Dialog, &[]);
        let dom = &f.env.dom;
        dom.focus(f.trigger);
        f.dialog.handle_event(&Event::click(f.trigger));
        assert_eq!(dom.style(dom.body(), "overflow"), "hidden");
        assert!(dom.attribute_is(f.content, "aria-modal", "true"));
        assert!(dom.has_attribute(f.content, "aria-labelledby"));
        assert!(!dom.has_attribute(f.overlay, "hidden"));

        f.dialog.handle_event(&Event::click(f.overlay));
        assert_eq!(f.dialog.state(), DisclosureState::Closed);
        assert_eq!(dom.style(dom.body(), "overflow"), "");
        assert_eq!(dom.active_element(), Some(f.trigger));
    }

    #[test]
    fn alert_dialog_ignores_overlay() {
        let f = fixture(DialogKind::AlertDialog, &[("close-on-overlay-click", "true")]);
        let dom = &f.env.dom;
        f.dialog.open();
        assert!(dom.attribute_is(f.content, "role", "alertdialog"));
        let cancel = dom.children(f.content)[2];
        assert_eq!(dom.active_element(), Some(cancel));

        f.dialog.handle_event(&Event::click(f.overlay));
        assert!(f.dialog.is_open());
        f.dialog.handle_event(&Event::key(KeyCode::Escape));
        assert!(!f.dialog.is_open());

        f.dialog.open();
        let action = dom.children(f.content)[3];
        f.dialog.handle_event(&Event::click(action));
        assert!(!f.dialog.is_open());
    }

    #[test]
    fn escape_can_be_disabled() {
        let f = fixture(DialogKind::Dialog, &[("close-on-escape", "false")]);
        f.dialog.open();
        assert!(!f.dialog.handle_event(&Event::key(KeyCode::Escape)));
        assert!(f.dialog.is_open());
    }

    #[test]
    fn sheet_and_drawer_sides() {
        let sheet = fixture(DialogKind::Sheet, &[]);
        assert_eq!(sheet.dialog.side(), Some(Side::Right));
        assert!(sheet.env.dom.attribute_is(sheet.content, "data-side", "right"));

        let drawer = fixture(DialogKind::Drawer, &[("side", "left")]);
        assert_eq!(drawer.dialog.side(), Some(Side::Left));
        drawer.dialog.open();
        drawer.dialog.close();
        assert!(drawer.env.dom.attribute_is(drawer.content, "data-side", "left"));
    }

    #[test]
    fn nested_dialogs_share_scroll_lock() {
        let a = fixture(DialogKind::Dialog, &[]);
        let b = fixture_in(a.env.clone(), DialogKind::Sheet, &[]);
        let dom = &a.env.dom;
        a.dialog.open();
        b.dialog.open();
        assert_eq!(a.env.coordinator.scroll_lock_count(), 2);
        b.dialog.close();
        assert_eq!(dom.style(dom.body(), "overflow"), "hidden");
        a.dialog.close();
        assert_eq!(dom.style(dom.body(), "overflow"), "");
    }
}
