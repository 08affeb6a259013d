#![forbid(unsafe_code)]

//! Keyboard navigation primitives: live item sets, the roving/virtual focus
//! navigator, typeahead, and selection sets.

pub mod items;
pub mod navigator;
pub mod selection;
pub mod typeahead;

pub use items::{Item, ItemSet, is_disabled, item_label, item_value};
pub use navigator::{FocusMode, HIGHLIGHTED, KeyboardNavigator, NavAction};
pub use selection::Selection;
pub use typeahead::{TYPEAHEAD_TIMEOUT, Typeahead};
