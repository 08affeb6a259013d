#![forbid(unsafe_code)]

//! Disclosure runtime and widgets for dui.
//!
//! The runtime layer (state machine, focus, dismissal, keyboard navigation)
//! is shared by every widget; [`runtime::Runtime`] mounts widgets from
//! `data-controller="ui--*"` markup and routes document events to them.
//!
//! | Module | Widgets |
//! |--------|---------|
//! | [`popover`] | popover, tooltip, hover card |
//! | [`dialog`] | dialog, alert dialog, sheet, drawer |
//! | [`dropdown_menu`], [`context_menu`], [`menubar`], [`navigation_menu`] | menus |
//! | [`select`], [`combobox`], [`command`] | listboxes |
//! | [`accordion`], [`tabs`], [`toggle_group`], [`collapsible`] | in-place disclosure and selection |

pub mod controller;
pub mod disclosure;
pub mod dismiss;
pub mod focus;
pub mod menu;
pub mod nav;
pub mod runtime;

pub mod accordion;
pub mod collapsible;
pub mod combobox;
pub mod command;
pub mod context_menu;
pub mod dialog;
pub mod dropdown_menu;
pub mod menubar;
pub mod navigation_menu;
pub mod popover;
pub mod select;
pub mod tabs;
pub mod toggle_group;

pub use controller::{Controller, Env};
pub use disclosure::{
    Disclosure, DisclosureParts, DisclosureState, Effects, Transition, transition,
};
pub use dismiss::{DismissReason, DismissalConfig, DismissalController};
pub use focus::FocusManager;
pub use menu::{Menu, MenuOutcome};
pub use nav::{FocusMode, ItemSet, KeyboardNavigator, NavAction, Selection, Typeahead};
pub use runtime::{INERT_ATTR, MountFailure, Mounted, Runtime};

pub use accordion::Accordion;
pub use collapsible::Collapsible;
pub use combobox::Combobox;
pub use command::{Command as CommandPalette, CommandDialog};
pub use context_menu::ContextMenu;
pub use dialog::{Dialog, DialogKind};
pub use dropdown_menu::DropdownMenu;
pub use menubar::Menubar;
pub use navigation_menu::NavigationMenu;
pub use popover::{FloatingKind, Popover};
pub use select::Select;
pub use tabs::Tabs;
pub use toggle_group::ToggleGroup;

/// Machine commands, re-exported under their own name so they do not clash
/// with the command palette widget.
pub use disclosure::Command as DisclosureCommand;
