#![forbid(unsafe_code)]

//! Canonical input events delivered to mounted controllers.
//!
//! Events mirror the subset of browser events the disclosure runtime listens
//! to: key presses (routed to the focused element), pointer events with an
//! explicit target, text input on editable controls, and layout changes
//! (scroll/resize) that require open floating content to be repositioned.

use bitflags::bitflags;

use crate::dom::ElementId;
use crate::geometry::{Point, Size};

/// Top-level input event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// A key event, targeted at the document's active element.
    Key(KeyEvent),
    /// A pointer event with an explicit target element.
    Pointer(PointerEvent),
    /// The value of an editable control changed.
    Input(InputEvent),
    /// The document or an ancestor of a trigger scrolled.
    Scroll,
    /// The viewport was resized.
    Resize(Size),
}

impl Event {
    /// Shorthand for a key press without modifiers.
    pub fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code))
    }

    /// Shorthand for a pointer event at the target's origin.
    pub fn pointer(kind: PointerEventKind, target: ElementId) -> Self {
        Self::Pointer(PointerEvent::new(kind, target))
    }

    /// Shorthand for a click on `target`.
    pub fn click(target: ElementId) -> Self {
        Self::pointer(PointerEventKind::Click, target)
    }
}

/// A key press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A key press without modifiers.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::empty(),
            kind: KeyEventKind::Press,
        }
    }

    /// Set the modifier state.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Whether this is a press (or auto-repeat).
    #[inline]
    pub fn is_press(&self) -> bool {
        matches!(self.kind, KeyEventKind::Press | KeyEventKind::Repeat)
    }

    /// Whether Shift is held.
    #[inline]
    pub fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// The printable character for typeahead, if any.
    ///
    /// Characters typed with Ctrl/Alt/Meta held are shortcuts, not text.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(c)
                if !c.is_control()
                    && !self
                        .modifiers
                        .intersects(Modifiers::CTRL | Modifiers::ALT | Modifiers::META) =>
            {
                Some(c)
            }
            _ => None,
        }
    }

    /// Enter or Space, the two activation keys.
    #[inline]
    pub fn is_activation(&self) -> bool {
        matches!(self.code, KeyCode::Enter | KeyCode::Char(' '))
    }
}

/// Key identity (the `KeyboardEvent.key` subset the runtime cares about).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Tab,
    Backspace,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
}

/// Press, repeat, or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    Repeat,
    Release,
}

bitflags! {
    /// Modifier keys held during an input event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const CTRL  = 0b0010;
        const ALT   = 0b0100;
        const META  = 0b1000;
    }
}

/// Pointer event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerEventKind {
    /// `pointerdown`; drives outside-click dismissal.
    Down,
    /// `pointerup`.
    Up,
    /// `click`; activates triggers and items.
    Click,
    /// `pointerenter`/`mouseenter`; drives hover intent.
    Enter,
    /// `pointerleave`/`mouseleave`.
    Leave,
    /// `contextmenu` (secondary button).
    ContextMenu,
}

/// A pointer event targeted at an element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub kind: PointerEventKind,
    pub target: ElementId,
    pub position: Point,
}

impl PointerEvent {
    /// Create a pointer event at the page origin.
    pub fn new(kind: PointerEventKind, target: ElementId) -> Self {
        Self {
            kind,
            target,
            position: Point::default(),
        }
    }

    /// Set the page position of the pointer.
    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }
}

/// Text input on an editable control (`input` event).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub target: ElementId,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_ignores_shortcuts() {
        let plain = KeyEvent::new(KeyCode::Char('a'));
        assert_eq!(plain.printable(), Some('a'));

        let shifted = KeyEvent::new(KeyCode::Char('A')).with_modifiers(Modifiers::SHIFT);
        assert_eq!(shifted.printable(), Some('A'));

        let ctrl = KeyEvent::new(KeyCode::Char('k')).with_modifiers(Modifiers::CTRL);
        assert_eq!(ctrl.printable(), None);

        assert_eq!(KeyEvent::new(KeyCode::Enter).printable(), None);
    }

    #[test]
    fn activation_keys() {
        assert!(KeyEvent::new(KeyCode::Enter).is_activation());
        assert!(KeyEvent::new(KeyCode::Char(' ')).is_activation());
        assert!(!KeyEvent::new(KeyCode::Char('x')).is_activation());
    }

    #[test]
    fn release_is_not_press() {
        let mut ev = KeyEvent::new(KeyCode::Escape);
        ev.kind = KeyEventKind::Release;
        assert!(!ev.is_press());
    }
}
