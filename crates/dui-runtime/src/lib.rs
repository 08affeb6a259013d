#![forbid(unsafe_code)]

//! Runtime services shared by every disclosure widget.
//!
//! - [`timer`]: cancellable delayed callbacks on a virtual clock.
//! - [`coordinator`]: document scroll lock and exclusive groups.
//! - [`config`]: typed parsing of `data-ui--*-value` attributes.
//! - [`scope`]: controller target resolution.
//! - [`error`]: configuration and mount errors.
//! - [`logging`]: optional subscriber installation.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod logging;
pub mod scope;
pub mod timer;

pub use config::{
    Activation, AttributeReader, DisclosureConfig, DisclosureDefaults, Orientation, SelectionMode,
    TriggerMode,
};
pub use coordinator::{ExclusiveGroup, GroupMember, MemberId, ModalCoordinator};
pub use error::{ConfigError, MountError};
pub use logging::LoggingError;
pub use scope::{CONTROLLER_ATTR, ControllerScope, has_controller};
pub use timer::{Scheduler, TimerHandle};
