#![forbid(unsafe_code)]

//! Shared services and the controller contract every widget implements.

use std::fmt;

use dui_core::dom::{Dom, ElementId};
use dui_core::event::Event;
use dui_runtime::{ModalCoordinator, Scheduler};

/// Services injected into every widget instance.
#[derive(Clone)]
pub struct Env {
    pub dom: Dom,
    pub scheduler: Scheduler,
    pub coordinator: ModalCoordinator,
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("scheduler", &self.scheduler)
            .field("coordinator", &self.coordinator)
            .finish_non_exhaustive()
    }
}

impl Env {
    /// Fresh scheduler and coordinator around `dom`.
    pub fn new(dom: Dom) -> Self {
        Self {
            dom,
            scheduler: Scheduler::new(),
            coordinator: ModalCoordinator::new(),
        }
    }
}

/// A mounted widget instance.
///
/// Handlers take `&self`: instances are shared handles whose state lives in
/// cells, because timer callbacks and exclusive groups hold weak references
/// to the same instance.
pub trait Controller {
    /// `data-controller` identifier, e.g. `ui--popover`.
    fn identifier(&self) -> &'static str;

    /// Mount root.
    fn root(&self) -> ElementId;

    /// Handle a document event. Returns `true` when the event was consumed
    /// (key events stop propagating to outer instances).
    fn handle_event(&self, event: &Event) -> bool;

    /// Tear down: close, release shared resources, cancel timers.
    fn disconnect(&self);
}
