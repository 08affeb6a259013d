#![forbid(unsafe_code)]

//! Mount registry: finds `data-controller="ui--*"` roots, builds one
//! instance per root and identifier, and routes document events to them.
//!
//! # Invariants
//!
//! - A `(root, identifier)` pair is mounted at most once; `connect` may be
//!   called again after markup changes and only mounts new roots.
//! - Key events go to instances innermost-first (reverse document order) and
//!   stop at the first instance that consumes them. Every other event is
//!   broadcast.
//! - A failed mount never affects siblings.
//!
//! # Failure Modes
//!
//! | Failure | Behavior |
//! |---------|----------|
//! | Missing required target | `warn!`, recorded in [`Runtime::failures`], root gets `data-ui-inert` |
//! | Unknown `ui--*` identifier | Same, with [`MountError::UnknownController`] |
//! | Root removed from the document | Instance disconnected by [`Runtime::sweep`] |

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use dui_core::dom::{Dom, ElementId};
use dui_core::event::Event;
use dui_runtime::{CONTROLLER_ATTR, MountError};
use web_time::Duration;

use crate::accordion::{self, Accordion};
use crate::collapsible::{self, Collapsible};
use crate::combobox::{self, Combobox};
use crate::command::{self, Command, CommandDialog};
use crate::context_menu::{self, ContextMenu};
use crate::controller::{Controller, Env};
use crate::dialog::{Dialog, DialogKind};
use crate::dropdown_menu::{self, DropdownMenu};
use crate::menubar::{self, Menubar};
use crate::navigation_menu::{self, NavigationMenu};
use crate::popover::{FloatingKind, Popover};
use crate::select::{self, Select};
use crate::tabs::{self, Tabs};
use crate::toggle_group::{self, ToggleGroup};

/// Attribute set on roots whose mount failed.
pub const INERT_ATTR: &str = "data-ui-inert";

/// Identifier prefix the registry owns.
pub const PREFIX: &str = "ui--";

/// A mounted instance, both as a controller and as its concrete type.
#[derive(Clone)]
pub struct Mounted {
    controller: Rc<dyn Controller>,
    any: Rc<dyn Any>,
}

impl Mounted {
    pub fn new<T: Controller + 'static>(instance: Rc<T>) -> Self {
        Self {
            controller: instance.clone(),
            any: instance,
        }
    }

    pub fn controller(&self) -> &Rc<dyn Controller> {
        &self.controller
    }
}

impl fmt::Debug for Mounted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mounted")
            .field("identifier", &self.controller.identifier())
            .field("root", &self.controller.root())
            .finish()
    }
}

type Factory = fn(&Env, ElementId) -> Result<Mounted, MountError>;

fn floating(kind: FloatingKind) -> impl Fn(&Env, ElementId) -> Result<Mounted, MountError> {
    move |env, root| Popover::mount(env, root, kind).map(Mounted::new)
}

fn modal(kind: DialogKind) -> impl Fn(&Env, ElementId) -> Result<Mounted, MountError> {
    move |env, root| Dialog::mount(env, root, kind).map(Mounted::new)
}

/// Build the instance for `identifier` on `root`.
fn build(identifier: &str, env: &Env, root: ElementId) -> Result<Mounted, MountError> {
    if let Some(kind) = FloatingKind::ALL.into_iter().find(|k| k.identifier() == identifier) {
        return floating(kind)(env, root);
    }
    if let Some(kind) = DialogKind::ALL.into_iter().find(|k| k.identifier() == identifier) {
        return modal(kind)(env, root);
    }
    let factory: Factory = match identifier {
        dropdown_menu::IDENTIFIER => |env, root| DropdownMenu::mount(env, root).map(Mounted::new),
        context_menu::IDENTIFIER => |env, root| ContextMenu::mount(env, root).map(Mounted::new),
        menubar::IDENTIFIER => |env, root| Menubar::mount(env, root).map(Mounted::new),
        navigation_menu::IDENTIFIER => {
            |env, root| NavigationMenu::mount(env, root).map(Mounted::new)
        }
        select::IDENTIFIER => |env, root| Select::mount(env, root).map(Mounted::new),
        combobox::IDENTIFIER => |env, root| Combobox::mount(env, root).map(Mounted::new),
        command::IDENTIFIER => |env, root| Command::mount(env, root).map(Mounted::new),
        command::DIALOG_IDENTIFIER => |env, root| CommandDialog::mount(env, root).map(Mounted::new),
        accordion::IDENTIFIER => |env, root| Accordion::mount(env, root).map(Mounted::new),
        tabs::IDENTIFIER => |env, root| Tabs::mount(env, root).map(Mounted::new),
        toggle_group::IDENTIFIER => |env, root| ToggleGroup::mount(env, root).map(Mounted::new),
        collapsible::IDENTIFIER => |env, root| Collapsible::mount(env, root).map(Mounted::new),
        other => return Err(MountError::UnknownController(other.to_owned())),
    };
    factory(env, root)
}

/// A mount that failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountFailure {
    pub root: ElementId,
    pub identifier: String,
    pub error: MountError,
}

/// Registry of mounted widget instances over one document.
#[derive(Debug)]
pub struct Runtime {
    env: Env,
    instances: Vec<Mounted>,
    failures: Vec<MountFailure>,
}

impl Runtime {
    pub fn new(dom: Dom) -> Self {
        Self::with_env(Env::new(dom))
    }

    pub fn with_env(env: Env) -> Self {
        Self {
            env,
            instances: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn dom(&self) -> &Dom {
        &self.env.dom
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn instances(&self) -> &[Mounted] {
        &self.instances
    }

    /// Mounts that failed, in the order they were attempted.
    pub fn failures(&self) -> &[MountFailure] {
        &self.failures
    }

    fn is_mounted(&self, root: ElementId, identifier: &str) -> bool {
        self.instances.iter().any(|m| {
            m.controller.root() == root && m.controller.identifier() == identifier
        })
    }

    /// Mount every new `ui--*` root in the document. Returns how many
    /// instances were mounted by this call.
    pub fn connect(&mut self) -> usize {
        let dom = self.env.dom.clone();
        let mut mounted = 0;
        for root in dom.select(dom.body(), CONTROLLER_ATTR, None) {
            let Some(names) = dom.attribute(root, CONTROLLER_ATTR) else {
                continue;
            };
            for identifier in names.split_whitespace().filter(|n| n.starts_with(PREFIX)) {
                if self.is_mounted(root, identifier)
                    || self
                        .failures
                        .iter()
                        .any(|f| f.root == root && f.identifier == identifier)
                {
                    continue;
                }
                match build(identifier, &self.env, root) {
                    Ok(instance) => {
                        tracing::debug!(controller = identifier, root = root.raw(), "mounted");
                        self.instances.push(instance);
                        mounted += 1;
                    }
                    Err(error) => {
                        tracing::warn!(
                            controller = identifier,
                            root = root.raw(),
                            error = %error,
                            "mount failed; instance left inert"
                        );
                        dom.set_attribute(root, INERT_ATTR, "");
                        self.failures.push(MountFailure {
                            root,
                            identifier: identifier.to_owned(),
                            error,
                        });
                    }
                }
            }
        }
        mounted
    }

    /// Route a document event. Returns whether any instance consumed it.
    pub fn dispatch(&self, event: &Event) -> bool {
        if let Event::Resize(size) = event {
            self.env.dom.set_viewport(*size);
        }
        match event {
            Event::Key(_) => self
                .instances
                .iter()
                .rev()
                .any(|m| m.controller.handle_event(event)),
            _ => self
                .instances
                .iter()
                .fold(false, |handled, m| m.controller.handle_event(event) || handled),
        }
    }

    /// Advance virtual time, firing due timers. Returns how many fired.
    pub fn advance(&self, by: Duration) -> usize {
        self.env.scheduler.advance(by)
    }

    /// Disconnect instances whose root left the document.
    pub fn sweep(&mut self) -> usize {
        let dom = self.env.dom.clone();
        let before = self.instances.len();
        self.instances.retain(|m| {
            let connected = dom.is_connected(m.controller.root());
            if !connected {
                tracing::debug!(
                    controller = m.controller.identifier(),
                    root = m.controller.root().raw(),
                    "root removed; disconnecting"
                );
                m.controller.disconnect();
            }
            connected
        });
        before - self.instances.len()
    }

    /// Disconnect every instance mounted on `root`.
    pub fn disconnect(&mut self, root: ElementId) -> usize {
        let before = self.instances.len();
        self.instances.retain(|m| {
            let hit = m.controller.root() == root;
            if hit {
                m.controller.disconnect();
            }
            !hit
        });
        before - self.instances.len()
    }

    /// Disconnect everything.
    pub fn disconnect_all(&mut self) {
        for m in self.instances.drain(..) {
            m.controller.disconnect();
        }
    }

    /// The instance of type `T` mounted on `root`.
    pub fn controller<T: Controller + 'static>(&self, root: ElementId) -> Option<Rc<T>> {
        self.instances
            .iter()
            .filter(|m| m.controller.root() == root)
            .find_map(|m| Rc::downcast::<T>(m.any.clone()).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dui_core::dom::El;
    use dui_core::event::KeyCode;
    use dui_core::geometry::{Rect, Size};

    fn popover(target: &str) -> El {
        El::new("div").attr("data-controller", "ui--popover").children([
            El::new("button")
                .attr(target, "trigger")
                .rect(Rect::new(100.0, 100.0, 80.0, 30.0)),
            El::new("div")
                .attr(target, "content")
                .rect(Rect::new(0.0, 0.0, 120.0, 60.0)),
        ])
    }

    fn page() -> (Runtime, Vec<ElementId>) {
        let dom = Dom::new(Size::new(800.0, 600.0));
        let target = "data-ui--popover-target";
        let roots = vec![
            dom.mount(dom.body(), popover(target)),
            dom.mount(
                dom.body(),
                El::new("div")
                    .attr("data-controller", "ui--popover")
                    .child(El::new("button").attr(target, "trigger")),
            ),
            dom.mount(dom.body(), El::new("div").attr("data-controller", "ui--slider")),
            dom.mount(dom.body(), El::new("div").attr("data-controller", "analytics")),
        ];
        (Runtime::new(dom), roots)
    }

    #[test]
    fn failures_are_isolated() {
        let (mut rt, roots) = page();
        assert_eq!(rt.connect(), 1);
        assert_eq!(rt.failures().len(), 2);
        assert_eq!(
            rt.failures()[0].error,
            MountError::MissingTarget {
                controller: "ui--popover".to_owned(),
                target: "content",
            }
        );
        assert_eq!(
            rt.failures()[1].error,
            MountError::UnknownController("ui--slider".to_owned())
        );
        assert!(rt.dom().has_attribute(roots[1], INERT_ATTR));
        assert!(!rt.dom().has_attribute(roots[3], INERT_ATTR));

        let pop = rt.controller::<Popover>(roots[0]).unwrap();
        let trigger = rt.dom().children(roots[0])[0];
        assert!(rt.dispatch(&Event::click(trigger)));
        assert!(pop.disclosure().is_open());
        assert!(rt.dispatch(&Event::key(KeyCode::Escape)));
        assert!(!pop.disclosure().is_open());
    }

    #[test]
    fn connect_is_incremental() {
        let (mut rt, _roots) = page();
        rt.connect();
        assert_eq!(rt.connect(), 0);
        let dom = rt.dom().clone();
        dom.mount(dom.body(), popover("data-ui--popover-target"));
        assert_eq!(rt.connect(), 1);
        assert_eq!(rt.len(), 2);
    }

    #[test]
    fn sweep_disconnects_removed_roots() {
        let (mut rt, roots) = page();
        rt.connect();
        let pop = rt.controller::<Popover>(roots[0]).unwrap();
        pop.open();
        let listeners = rt.dom().listener_count();
        assert!(listeners > 0);
        rt.dom().remove(roots[0]);
        assert_eq!(rt.sweep(), 1);
        assert!(rt.is_empty());
        assert!(!pop.disclosure().is_connected());
        assert_eq!(rt.dom().listener_count(), 0);
    }

    #[test]
    fn resize_updates_viewport() {
        let (mut rt, _roots) = page();
        rt.connect();
        rt.dispatch(&Event::Resize(Size::new(400.0, 300.0)));
        assert_eq!(rt.dom().viewport().size(), Size::new(400.0, 300.0));
    }
}
