#![forbid(unsafe_code)]

//! Collapsible: one trigger showing and hiding one content region in place.

use std::rc::Rc;

use dui_core::dom::ElementId;
use dui_core::event::Event;
use dui_runtime::{ControllerScope, DisclosureConfig, DisclosureDefaults, MountError};

use crate::controller::{Controller, Env};
use crate::disclosure::{Disclosure, DisclosureParts, DisclosureState};
use crate::dismiss::{DismissalConfig, DismissalController};

pub const IDENTIFIER: &str = "ui--collapsible";

/// A mounted collapsible.
#[derive(Debug)]
pub struct Collapsible {
    scope: ControllerScope,
    disclosure: Disclosure,
}

impl Collapsible {
    pub fn mount(env: &Env, root: ElementId) -> Result<Rc<Self>, MountError> {
        let scope = ControllerScope::new(&env.dom, root, IDENTIFIER);
        let parts = DisclosureParts::from_scope(&scope)?;
        scope.require("trigger")?;
        let config =
            DisclosureConfig::read(&scope.attrs(), DisclosureDefaults::click().focus_on_open(false));
        let dismissal = DismissalController::new(scope.widget(), DismissalConfig::none());
        let disclosure = Disclosure::with_dismissal(env, scope.widget(), parts, config, dismissal);
        disclosure.open_if_configured();
        Ok(Rc::new(Self { scope, disclosure }))
    }

    pub fn disclosure(&self) -> &Disclosure {
        &self.disclosure
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
}

impl Controller for Collapsible {
    fn identifier(&self) -> &'static str {
        IDENTIFIER
    }

    fn root(&self) -> ElementId {
        self.scope.root()
    }

    fn handle_event(&self, event: &Event) -> bool {
        self.disclosure.handle_event(event)
    }

    fn disconnect(&self) {
        self.disclosure.disconnect();
    }
}
