#![forbid(unsafe_code)]

//! Dismissal: Escape, outside pointer, overlay click, trigger re-activation.
//!
//! The controller is *armed* only while its widget is open. Arming registers
//! one document listener per enabled concern; disarming removes exactly
//! those registrations, so the document listener table returns to its
//! pre-open size after every close.
//!
//! | Concern | Listener | Applies to |
//! |---------|----------|------------|
//! | Escape | `keydown` | every widget with `close_on_escape` |
//! | Outside pointer | `pointerdown` | non-modal widgets with `close_on_outside_click` |
//! | Overlay click | `pointerdown` | modal widgets with `close_on_overlay_click` |
//!
//! # Failure Modes
//!
//! - `arm` twice keeps a single set of registrations.
//! - `disarm` when not armed is a no-op.

use dui_core::dom::{Dom, ElementId, ListenerId, ListenerKind};
use dui_core::event::{Event, KeyCode, PointerEventKind};
use dui_runtime::DisclosureConfig;

/// Why a widget should close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DismissReason {
    Escape,
    OutsidePointer,
    OverlayClick,
    TriggerToggle,
}

impl DismissReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Escape => "escape",
            Self::OutsidePointer => "outside-pointer",
            Self::OverlayClick => "overlay-click",
            Self::TriggerToggle => "trigger-toggle",
        }
    }
}

/// The elements dismissal is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Surface {
    pub trigger: Option<ElementId>,
    pub content: ElementId,
    pub overlay: Option<ElementId>,
}

/// Which dismissal concerns are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissalConfig {
    pub modal: bool,
    pub close_on_escape: bool,
    pub close_on_outside_click: bool,
    pub close_on_overlay_click: bool,
    /// Click on the trigger closes an open widget.
    pub trigger_toggles: bool,
}

impl DismissalConfig {
    /// Derived from a disclosure configuration.
    pub fn from_disclosure(config: &DisclosureConfig, trigger_toggles: bool) -> Self {
        Self {
            modal: config.modal,
            close_on_escape: config.close_on_escape,
            close_on_outside_click: config.close_on_outside_click,
            close_on_overlay_click: config.close_on_overlay_click,
            trigger_toggles,
        }
    }

    /// No dismissal at all (the owner closes explicitly).
    pub const fn none() -> Self {
        Self {
            modal: false,
            close_on_escape: false,
            close_on_outside_click: false,
            close_on_overlay_click: false,
            trigger_toggles: false,
        }
    }

    fn pointer_enabled(&self) -> bool {
        if self.modal {
            self.close_on_overlay_click
        } else {
            self.close_on_outside_click
        }
    }
}

/// Arms and evaluates dismissal for one widget instance.
#[derive(Debug, Clone)]
pub struct DismissalController {
    owner: String,
    config: DismissalConfig,
    listeners: Vec<ListenerId>,
    armed: bool,
}

impl DismissalController {
    /// `owner` labels the listener registrations (the widget name).
    pub fn new(owner: impl Into<String>, config: DismissalConfig) -> Self {
        Self {
            owner: owner.into(),
            config,
            listeners: Vec::new(),
            armed: false,
        }
    }

    pub fn config(&self) -> DismissalConfig {
        self.config
    }

    /// Whether document listeners are currently registered.
    pub fn is_armed(&self) -> bool {
        self.armed && !self.listeners.is_empty()
    }

    /// Register document listeners for the enabled concerns.
    pub fn arm(&mut self, dom: &Dom) {
        if self.armed {
            return;
        }
        if self.config.close_on_escape {
            self.listeners
                .push(dom.add_listener(ListenerKind::KeyDown, self.owner.clone()));
        }
        if self.config.pointer_enabled() {
            self.listeners
                .push(dom.add_listener(ListenerKind::PointerDown, self.owner.clone()));
        }
        self.armed = true;
    }

    /// Remove exactly the registrations `arm` made.
    pub fn disarm(&mut self, dom: &Dom) {
        for id in self.listeners.drain(..) {
            dom.remove_listener(id);
        }
        self.armed = false;
    }

    /// Whether `event` dismisses the widget.
    ///
    /// Trigger toggling is reported only for clicks; the caller decides
    /// whether a trigger click closes (click-mode widgets do).
    pub fn evaluate(&self, dom: &Dom, event: &Event, surface: Surface) -> Option<DismissReason> {
        if !self.armed {
            return None;
        }
        match event {
            Event::Key(key) if key.is_press() && key.code == KeyCode::Escape => {
                self.config.close_on_escape.then_some(DismissReason::Escape)
            }
            Event::Pointer(pointer) => {
                let target = pointer.target;
                let in_trigger = surface.trigger.is_some_and(|t| dom.contains(t, target));
                let in_content = dom.contains(surface.content, target);
                match pointer.kind {
                    PointerEventKind::Click if in_trigger && self.config.trigger_toggles => {
                        Some(DismissReason::TriggerToggle)
                    }
                    PointerEventKind::Click
                        if self.config.modal
                            && self.config.close_on_overlay_click
                            && !in_content
                            && surface.overlay.is_some_and(|o| dom.contains(o, target)) =>
                    {
                        Some(DismissReason::OverlayClick)
                    }
                    PointerEventKind::Down
                        if !self.config.modal
                            && self.config.close_on_outside_click
                            && !in_trigger
                            && !in_content =>
                    {
                        Some(DismissReason::OutsidePointer)
                    }
                    _ => None,
                }
            }
            _ => None,
        }
    }
}
