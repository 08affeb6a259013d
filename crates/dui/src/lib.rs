#![forbid(unsafe_code)]

//! dui: a disclosure runtime for server-rendered widgets.
//!
//! Markup declares widgets with `data-controller="ui--<name>"` and marks
//! their parts with `data-ui--<name>-target`; [`Runtime`] mounts them and
//! routes events. Most hosts only need the [`prelude`].
//!
//! ```
//! use dui::prelude::*;
//!
//! let dom = Dom::new(Size::new(800.0, 600.0));
//! dom.mount(
//!     dom.body(),
//!     El::new("div").attr("data-controller", "ui--collapsible").children([
//!         El::new("button").attr("data-ui--collapsible-target", "trigger"),
//!         El::new("div").attr("data-ui--collapsible-target", "content"),
//!     ]),
//! );
//! let mut runtime = Runtime::new(dom);
//! assert_eq!(runtime.connect(), 1);
//! ```

pub use dui_a11y as a11y;
pub use dui_layout as layout;
pub use dui_runtime as runtime;
pub use dui_widgets as widgets;

pub use dui_core::{Dom, El, ElementId, Event, KeyCode, Modifiers, Point, Rect, Size};
pub use dui_layout::{Align, Placement, Side};
pub use dui_runtime::{ConfigError, MountError, logging};
pub use dui_widgets::{Controller, Disclosure, DisclosureState, Env, Runtime};

pub mod prelude {
    //! Common imports for hosts mounting dui widgets.

    pub use dui_core::{Dom, El, ElementId, Event, KeyCode, KeyEvent, Modifiers, PointerEventKind, Rect, Size};
    pub use dui_layout::{Align, Placement, Side};
    pub use dui_runtime::MountError;
    pub use dui_widgets::{
        Accordion, Collapsible, Combobox, CommandDialog, CommandPalette, ContextMenu, Controller,
        Dialog, DialogKind, Disclosure, DisclosureState, DropdownMenu, FloatingKind, Menubar,
        NavigationMenu, Popover, Runtime, Select, Tabs, ToggleGroup,
    };
}
