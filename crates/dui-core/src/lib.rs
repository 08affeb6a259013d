#![forbid(unsafe_code)]

//! Core types for the dui disclosure runtime: geometry, input events, and the
//! element arena that stands in for the browser document.

pub mod dom;
pub mod event;
pub mod geometry;

pub use dom::{Dom, El, ElementId, ListenerId, ListenerKind};
pub use event::{
    Event, InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers, PointerEvent, PointerEventKind,
};
pub use geometry::{Point, Rect, Size};
