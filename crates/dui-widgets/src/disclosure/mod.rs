#![forbid(unsafe_code)]

//! Disclosure driver: applies state-machine transitions to the document.
//!
//! A [`Disclosure`] owns one trigger/content(/overlay) triple and drives it
//! through [`transition`]. Effects are applied synchronously, in this order:
//!
//! 1. cancel pending hover/animation timers;
//! 2. activate the exclusive group (closing an open sibling first);
//! 3. write `data-state` and `aria-expanded`;
//! 4. unhide, position, arm dismissal, lock scroll, move focus;
//! 5. on close: disarm, unlock scroll, restore focus, leave the group;
//! 6. notify observers, then settle (immediately, or after the animation).
//!
//! # Invariants
//!
//! 1. `data-state` on root/trigger/content/overlay equals the machine state
//!    when any public method returns.
//! 2. Content and overlay carry `hidden` exactly while `Closed`.
//! 3. Positioning happens only while open; resolved `data-side`/`data-align`
//!    and inline `left`/`top` are removed when the widget settles closed.
//! 4. Each open acquires at most one scroll lock, released by the matching
//!    close (or by [`Disclosure::disconnect`]).
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Redundant `open`/`close` | Overlapping calls, timer races | No-op, returns `false` |
//! | Position error | Zero-size trigger, empty viewport | Logged, previous position kept |
//! | Disconnected | Root removed | Every method is a no-op |

pub mod machine;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use dui_a11y::AriaFlag;
use dui_core::dom::ElementId;
use dui_core::event::{Event, KeyCode, PointerEventKind};
use dui_core::geometry::Rect;
use dui_layout::{Resolved, compute_position};
use dui_runtime::{
    ControllerScope, DisclosureConfig, ExclusiveGroup, GroupMember, MemberId, MountError,
    TimerHandle, TriggerMode,
};
use web_time::Duration;

use crate::controller::Env;
use crate::dismiss::{DismissReason, DismissalConfig, DismissalController, Surface};
use crate::focus::FocusManager;

pub use machine::{Command, DisclosureState, Effects, Transition, transition};

/// The elements one disclosure drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisclosureParts {
    pub root: ElementId,
    pub trigger: Option<ElementId>,
    pub content: ElementId,
    pub overlay: Option<ElementId>,
}

impl DisclosureParts {
    /// `trigger`, `content` (required) and `overlay` targets of `scope`.
    pub fn from_scope(scope: &ControllerScope) -> Result<Self, MountError> {
        Ok(Self {
            root: scope.root(),
            trigger: scope.target("trigger"),
            content: scope.require("content")?,
            overlay: scope.target("overlay"),
        })
    }

    /// Elements carrying `data-state`, without duplicates.
    pub fn state_targets(&self) -> Vec<ElementId> {
        let mut out = vec![self.root];
        for id in [self.trigger, Some(self.content), self.overlay]
            .into_iter()
            .flatten()
        {
            if !out.contains(&id) {
                out.push(id);
            }
        }
        out
    }

    fn surface(&self) -> Surface {
        Surface {
            trigger: self.trigger,
            content: self.content,
            overlay: self.overlay,
        }
    }
}

type Observer = Rc<dyn Fn(Transition)>;
type FocusProvider = Rc<dyn Fn() -> Option<ElementId>>;

struct Inner {
    me: Weak<Inner>,
    env: Env,
    widget: String,
    parts: DisclosureParts,
    config: DisclosureConfig,
    state: Cell<DisclosureState>,
    connected: Cell<bool>,
    focus: RefCell<FocusManager>,
    dismissal: RefCell<DismissalController>,
    membership: RefCell<Option<(ExclusiveGroup, MemberId)>>,
    pending_open: RefCell<Option<TimerHandle>>,
    pending_close: RefCell<Option<TimerHandle>>,
    settle_timer: RefCell<Option<TimerHandle>>,
    observers: RefCell<Vec<Observer>>,
    initial_focus: RefCell<Option<FocusProvider>>,
    anchor: Cell<Option<Rect>>,
    position: Cell<Option<Resolved>>,
    scroll_locked: Cell<bool>,
}

impl GroupMember for Inner {
    fn close_for_sibling(&self) {
        self.close_now();
    }
}

fn cancel_slot(slot: &RefCell<Option<TimerHandle>>) {
    if let Some(handle) = slot.borrow_mut().take() {
        handle.cancel();
    }
}

fn slot_pending(slot: &RefCell<Option<TimerHandle>>) -> bool {
    slot.borrow().as_ref().is_some_and(TimerHandle::is_pending)
}

impl Inner {
    fn dispatch(&self, command: Command) -> bool {
        if !self.connected.get() {
            return false;
        }
        let from = self.state.get();
        let Some(t) = transition(from, command, self.config.modal) else {
            tracing::trace!(widget = %self.widget, state = %from, ?command, "transition no-op");
            return false;
        };
        self.apply(t);
        true
    }

    fn apply(&self, t: Transition) {
        let dom = &self.env.dom;
        let e = t.effects;

        if e.contains(Effects::CANCEL_TIMERS) {
            self.cancel_timers();
        }
        if e.contains(Effects::ACTIVATE_GROUP) {
            let membership = self.membership.borrow().clone();
            if let Some((group, id)) = membership {
                group.activate(id);
            }
        }

        self.state.set(t.to);
        dui_a11y::write_data_state(dom, &self.parts.state_targets(), t.to.as_str());
        if let Some(trigger) = self.parts.trigger {
            dui_a11y::set_flag(dom, trigger, AriaFlag::Expanded, t.to.is_open());
        }

        if e.contains(Effects::SHOW) {
            self.set_hidden(false);
        }
        if e.contains(Effects::POSITION) {
            self.reposition();
        }
        if e.contains(Effects::ARM_DISMISSAL) {
            self.dismissal.borrow_mut().arm(dom);
        }
        if e.contains(Effects::LOCK_SCROLL) && !self.scroll_locked.replace(true) {
            self.env.coordinator.lock_scroll(dom);
        }
        if e.contains(Effects::ACQUIRE_FOCUS) && self.config.focus_on_open {
            let provider = self.initial_focus.borrow().clone();
            let initial = provider.and_then(|p| p());
            self.focus
                .borrow_mut()
                .acquire(dom, self.parts.content, self.config.modal, initial);
        }

        if e.contains(Effects::DISARM_DISMISSAL) {
            self.dismissal.borrow_mut().disarm(dom);
        }
        if e.contains(Effects::UNLOCK_SCROLL) && self.scroll_locked.replace(false) {
            self.env.coordinator.unlock_scroll(dom);
        }
        if e.contains(Effects::RELEASE_FOCUS) {
            self.focus.borrow_mut().release(dom);
        }
        if e.contains(Effects::DEACTIVATE_GROUP) {
            let membership = self.membership.borrow().clone();
            if let Some((group, id)) = membership {
                group.deactivate(id);
            }
        }
        if e.contains(Effects::HIDE) {
            self.set_hidden(true);
            self.clear_position();
        }

        tracing::debug!(widget = %self.widget, from = %t.from, to = %t.to, "transition");

        let observers = self.observers.borrow().clone();
        for observer in observers {
            observer(t);
        }

        if self.state.get() == t.to
            && matches!(t.to, DisclosureState::Opening | DisclosureState::Closing)
        {
            self.schedule_settle();
        }
    }

    fn schedule_settle(&self) {
        if self.config.animation.is_zero() {
            self.dispatch(Command::Settle);
            return;
        }
        let weak = self.me.clone();
        let handle = self.env.scheduler.schedule(self.config.animation, move || {
            if let Some(inner) = weak.upgrade() {
                inner.settle_timer.borrow_mut().take();
                inner.dispatch(Command::Settle);
            }
        });
        *self.settle_timer.borrow_mut() = Some(handle);
    }

    fn cancel_timers(&self) {
        cancel_slot(&self.pending_open);
        cancel_slot(&self.pending_close);
        cancel_slot(&self.settle_timer);
    }

    fn set_hidden(&self, hidden: bool) {
        let dom = &self.env.dom;
        for id in [Some(self.parts.content), self.parts.overlay]
            .into_iter()
            .flatten()
        {
            dom.toggle_attribute(id, "hidden", hidden);
        }
    }

    fn clear_position(&self) {
        if self.config.placement.is_none() {
            return;
        }
        let dom = &self.env.dom;
        let content = self.parts.content;
        dom.remove_attribute(content, "data-side");
        dom.remove_attribute(content, "data-align");
        dom.set_style(content, "left", "");
        dom.set_style(content, "top", "");
        self.position.set(None);
    }

    fn reposition(&self) {
        let Some(placement) = self.config.placement else {
            return;
        };
        let dom = &self.env.dom;
        let Some(anchor) = self
            .anchor
            .get()
            .or_else(|| self.parts.trigger.map(|t| dom.rect(t)))
        else {
            return;
        };
        let content = self.parts.content;
        let size = dom.rect(content).size();
        match compute_position(anchor, size, &placement, dom.viewport()) {
            Ok(resolved) => {
                dom.set_style(content, "left", format!("{}px", resolved.x));
                dom.set_style(content, "top", format!("{}px", resolved.y));
                dom.set_attribute(content, "data-side", resolved.side.as_str());
                dom.set_attribute(content, "data-align", resolved.align.as_str());
                dom.set_rect(content, resolved.rect(size));
                self.position.set(Some(resolved));
                tracing::trace!(
                    widget = %self.widget,
                    side = %resolved.side,
                    flipped = resolved.flipped,
                    shifted = resolved.shifted,
                    "positioned"
                );
            }
            Err(err) => {
                tracing::warn!(widget = %self.widget, error = %err, "position failed; keeping previous position");
            }
        }
    }

    fn close_now(&self) {
        self.dispatch(Command::Close);
        if self.state.get() == DisclosureState::Closing {
            cancel_slot(&self.settle_timer);
            self.dispatch(Command::Settle);
        }
    }

    fn hover_enter(&self) {
        cancel_slot(&self.pending_close);
        if self.state.get().is_open() || slot_pending(&self.pending_open) {
            return;
        }
        self.schedule_intent(&self.pending_open, self.config.open_delay, Command::Open);
    }

    fn hover_leave(&self) {
        cancel_slot(&self.pending_open);
        if !self.state.get().is_open() || slot_pending(&self.pending_close) {
            return;
        }
        self.schedule_intent(&self.pending_close, self.config.close_delay, Command::Close);
    }

    fn schedule_intent(&self, slot: &RefCell<Option<TimerHandle>>, delay: Duration, command: Command) {
        if delay.is_zero() {
            self.dispatch(command);
            return;
        }
        let weak = self.me.clone();
        let handle = self.env.scheduler.schedule(delay, move || {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(command);
            }
        });
        *slot.borrow_mut() = Some(handle);
    }
}

/// Shared handle to one disclosure instance.
#[derive(Clone)]
pub struct Disclosure {
    inner: Rc<Inner>,
}

impl fmt::Debug for Disclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Disclosure")
            .field("widget", &self.inner.widget)
            .field("state", &self.inner.state.get())
            .field("parts", &self.inner.parts)
            .finish()
    }
}

impl Disclosure {
    /// Wire `parts` up in the `Closed` state (opening at once when
    /// `open_at_mount` is set).
    pub fn new(env: &Env, widget: &str, parts: DisclosureParts, config: DisclosureConfig) -> Self {
        let trigger_toggles = config.trigger_mode == TriggerMode::Click;
        let dismissal = DismissalController::new(
            widget,
            DismissalConfig::from_disclosure(&config, trigger_toggles),
        );
        Self::with_dismissal(env, widget, parts, config, dismissal)
    }

    /// Like [`Disclosure::new`] with an explicit dismissal policy.
    pub fn with_dismissal(
        env: &Env,
        widget: &str,
        parts: DisclosureParts,
        config: DisclosureConfig,
        dismissal: DismissalController,
    ) -> Self {
        let inner = Rc::new_cyclic(|me| Inner {
            me: me.clone(),
            env: env.clone(),
            widget: widget.to_owned(),
            parts,
            config,
            state: Cell::new(DisclosureState::Closed),
            connected: Cell::new(true),
            focus: RefCell::new(FocusManager::new()),
            dismissal: RefCell::new(dismissal),
            membership: RefCell::new(None),
            pending_open: RefCell::new(None),
            pending_close: RefCell::new(None),
            settle_timer: RefCell::new(None),
            observers: RefCell::new(Vec::new()),
            initial_focus: RefCell::new(None),
            anchor: Cell::new(None),
            position: Cell::new(None),
            scroll_locked: Cell::new(false),
        });
        let this = Self { inner };
        this.mount();
        this
    }

    fn mount(&self) {
        let dom = &self.inner.env.dom;
        let parts = self.inner.parts;
        if self.inner.config.focus_on_open && !dom.has_attribute(parts.content, "tabindex") {
            dom.set_attribute(parts.content, "tabindex", "-1");
        }
        if let Some(trigger) = parts.trigger {
            dui_a11y::set_flag(dom, trigger, AriaFlag::Expanded, false);
            dui_a11y::link(dom, trigger, "aria-controls", parts.content);
        }
        if self.inner.config.modal {
            dui_a11y::set_flag(dom, parts.content, AriaFlag::Modal, true);
        }
        dui_a11y::write_data_state(dom, &parts.state_targets(), DisclosureState::Closed.as_str());
        self.inner.set_hidden(true);
        tracing::debug!(widget = %self.inner.widget, root = parts.root.raw(), "disclosure mounted");
    }

    /// Open the widget if `open_at_mount` asked for it.
    pub fn open_if_configured(&self) {
        if self.inner.config.open_at_mount {
            self.open();
        }
    }

    pub fn env(&self) -> &Env {
        &self.inner.env
    }

    pub fn widget(&self) -> &str {
        &self.inner.widget
    }

    pub fn parts(&self) -> DisclosureParts {
        self.inner.parts
    }

    pub fn config(&self) -> &DisclosureConfig {
        &self.inner.config
    }

    pub fn state(&self) -> DisclosureState {
        self.inner.state.get()
    }

    /// Open or opening.
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.get()
    }

    /// Returns `false` when the call was a no-op.
    pub fn open(&self) -> bool {
        self.inner.dispatch(Command::Open)
    }

    /// Returns `false` when the call was a no-op.
    pub fn close(&self) -> bool {
        self.inner.dispatch(Command::Close)
    }

    pub fn toggle(&self) -> bool {
        self.inner.dispatch(Command::Toggle)
    }

    /// Close and skip the exit animation.
    pub fn close_now(&self) {
        self.inner.close_now();
    }

    /// Complete the current animation phase now.
    pub fn settle(&self) -> bool {
        cancel_slot(&self.inner.settle_timer);
        self.inner.dispatch(Command::Settle)
    }

    /// Pointer entered the trigger or content (hover intent).
    pub fn hover_enter(&self) {
        if self.is_connected() {
            self.inner.hover_enter();
        }
    }

    /// Pointer left the trigger or content (hover intent).
    pub fn hover_leave(&self) {
        if self.is_connected() {
            self.inner.hover_leave();
        }
    }

    /// Whether a hover-open is waiting on its delay.
    pub fn open_pending(&self) -> bool {
        slot_pending(&self.inner.pending_open)
    }

    /// Whether a hover-close is waiting on its delay.
    pub fn close_pending(&self) -> bool {
        slot_pending(&self.inner.pending_close)
    }

    /// Recompute the position; ignored while closed.
    pub fn reposition(&self) {
        if self.is_open() {
            self.inner.reposition();
        }
    }

    /// Last resolved placement while open.
    pub fn position(&self) -> Option<Resolved> {
        self.inner.position.get()
    }

    /// Position against `rect` instead of the trigger (context menus).
    pub fn set_anchor(&self, rect: Option<Rect>) {
        self.inner.anchor.set(rect);
    }

    /// Element to focus on open, evaluated at open time.
    pub fn set_initial_focus(&self, provider: impl Fn() -> Option<ElementId> + 'static) {
        *self.inner.initial_focus.borrow_mut() = Some(Rc::new(provider));
    }

    /// Observe every accepted transition.
    pub fn on_change(&self, observer: impl Fn(Transition) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    /// Become a member of `group`; opening closes the active sibling.
    pub fn join_group(&self, group: &ExclusiveGroup) {
        let member: Rc<dyn GroupMember> = self.inner.clone();
        let id = group.register(Rc::downgrade(&member));
        if let Some((old, old_id)) = self.inner.membership.replace(Some((group.clone(), id))) {
            old.unregister(old_id);
        }
    }

    /// Where focus returns on close.
    pub fn focus_restore_target(&self) -> Option<ElementId> {
        self.inner.focus.borrow().restore_target()
    }

    /// Leave focus where it is on the next close.
    pub fn skip_focus_restore(&self) {
        self.inner.focus.borrow_mut().forget_restore();
    }

    pub fn is_dismissal_armed(&self) -> bool {
        self.inner.dismissal.borrow().is_armed()
    }

    /// Route a document event. Returns `true` when consumed.
    pub fn handle_event(&self, event: &Event) -> bool {
        if !self.is_connected() {
            return false;
        }
        let inner = &self.inner;
        let dom = inner.env.dom.clone();
        let parts = inner.parts;
        match event {
            Event::Scroll | Event::Resize(_) => {
                self.reposition();
                false
            }
            Event::Pointer(pointer) => {
                if inner.config.trigger_mode == TriggerMode::Hover {
                    let on_surface =
                        parts.trigger == Some(pointer.target) || pointer.target == parts.content;
                    match pointer.kind {
                        PointerEventKind::Enter if on_surface => {
                            inner.hover_enter();
                            return true;
                        }
                        PointerEventKind::Leave if on_surface => {
                            inner.hover_leave();
                            return true;
                        }
                        _ => {}
                    }
                }
                let reason = inner
                    .dismissal
                    .borrow()
                    .evaluate(&dom, event, parts.surface());
                match reason {
                    Some(DismissReason::TriggerToggle) | None => {}
                    Some(reason) => {
                        tracing::debug!(widget = %inner.widget, reason = reason.as_str(), "dismissed");
                        self.close();
                        return true;
                    }
                }
                let on_trigger = parts.trigger.is_some_and(|t| dom.contains(t, pointer.target));
                if pointer.kind == PointerEventKind::Click
                    && on_trigger
                    && inner.config.trigger_mode == TriggerMode::Click
                {
                    return self.toggle();
                }
                false
            }
            Event::Key(key) => {
                if !key.is_press() {
                    return false;
                }
                if self.is_open() {
                    if key.code == KeyCode::Tab
                        && inner.focus.borrow().handle_tab(&dom, key.shift())
                    {
                        return true;
                    }
                    let reason = inner
                        .dismissal
                        .borrow()
                        .evaluate(&dom, event, parts.surface());
                    if reason == Some(DismissReason::Escape) {
                        tracing::debug!(widget = %inner.widget, reason = "escape", "dismissed");
                        self.close();
                        return true;
                    }
                }
                let on_trigger = match (parts.trigger, dom.active_element()) {
                    (Some(trigger), Some(active)) => {
                        dom.contains(trigger, active) && !dom.is_editable(active)
                    }
                    _ => false,
                };
                if on_trigger
                    && key.is_activation()
                    && inner.config.trigger_mode == TriggerMode::Click
                {
                    return self.toggle();
                }
                false
            }
            Event::Input(_) => false,
        }
    }

    /// Force-close, release everything, and stop reacting to events.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        if !inner.connected.get() {
            return;
        }
        inner.cancel_timers();
        inner.close_now();
        inner.dismissal.borrow_mut().disarm(&inner.env.dom);
        if inner.scroll_locked.replace(false) {
            inner.env.coordinator.unlock_scroll(&inner.env.dom);
        }
        if let Some((group, id)) = inner.membership.borrow_mut().take() {
            group.unregister(id);
        }
        inner.observers.borrow_mut().clear();
        inner.connected.set(false);
        tracing::debug!(widget = %inner.widget, "disclosure disconnected");
    }
}
