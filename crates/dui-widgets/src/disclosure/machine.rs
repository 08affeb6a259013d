#![forbid(unsafe_code)]

//! Pure disclosure state machine.
//!
//! [`transition`] maps `(state, command, modal)` to the next state and the
//! side effects the caller must apply. It touches nothing; the
//! [`Disclosure`](super::Disclosure) driver applies the effects in a fixed
//! order.
//!
//! ```text
//!            Open                Settle
//!   Closed ────────▶ Opening ────────────▶ Open
//!     ▲   ◀──Open── Closing ◀──Close── (Open|Opening)
//!     └──── Settle ────┘
//! ```
//!
//! # Invariants
//!
//! 1. `Open` is accepted only from `Closed` or `Closing`; `Close` only from
//!    `Open` or `Opening`. Anything else is a no-op (`None`).
//! 2. Entering `Opening` always acquires what entering `Closing` releases, so
//!    any accepted sequence keeps acquisitions balanced.
//! 3. Scroll-lock effects appear only when `modal` is set.

use std::fmt;

use bitflags::bitflags;

/// Lifecycle state of a disclosure widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DisclosureState {
    #[default]
    Closed,
    Opening,
    Open,
    Closing,
}

impl DisclosureState {
    /// Value written to `data-state`.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Opening => "opening",
            Self::Open => "open",
            Self::Closing => "closing",
        }
    }

    /// Open or on its way there.
    #[inline]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Open | Self::Opening)
    }

    /// Content is rendered (anything but `Closed`).
    #[inline]
    pub const fn is_visible(self) -> bool {
        !matches!(self, Self::Closed)
    }
}

impl fmt::Display for DisclosureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Open,
    Close,
    Toggle,
    /// The current animation phase finished.
    Settle,
}

bitflags! {
    /// Side effects requested by a transition, applied in declaration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Effects: u16 {
        const CANCEL_TIMERS    = 1 << 0;
        const ACTIVATE_GROUP   = 1 << 1;
        const DEACTIVATE_GROUP = 1 << 2;
        const SHOW             = 1 << 3;
        const POSITION         = 1 << 4;
        const ARM_DISMISSAL    = 1 << 5;
        const DISARM_DISMISSAL = 1 << 6;
        const LOCK_SCROLL      = 1 << 7;
        const UNLOCK_SCROLL    = 1 << 8;
        const ACQUIRE_FOCUS    = 1 << 9;
        const RELEASE_FOCUS    = 1 << 10;
        const HIDE             = 1 << 11;
    }
}

/// An accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DisclosureState,
    pub to: DisclosureState,
    pub effects: Effects,
}

fn opening(from: DisclosureState, modal: bool) -> Transition {
    let mut effects = Effects::CANCEL_TIMERS
        | Effects::ACTIVATE_GROUP
        | Effects::SHOW
        | Effects::POSITION
        | Effects::ARM_DISMISSAL
        | Effects::ACQUIRE_FOCUS;
    if modal {
        effects |= Effects::LOCK_SCROLL;
    }
    Transition {
        from,
        to: DisclosureState::Opening,
        effects,
    }
}

fn closing(from: DisclosureState, modal: bool) -> Transition {
    let mut effects = Effects::CANCEL_TIMERS
        | Effects::DEACTIVATE_GROUP
        | Effects::DISARM_DISMISSAL
        | Effects::RELEASE_FOCUS;
    if modal {
        effects |= Effects::UNLOCK_SCROLL;
    }
    Transition {
        from,
        to: DisclosureState::Closing,
        effects,
    }
}

/// Next state for `command`, or `None` when the command is a no-op.
pub fn transition(state: DisclosureState, command: Command, modal: bool) -> Option<Transition> {
    use DisclosureState::*;

    match (state, command) {
        (Closed | Closing, Command::Open) => Some(opening(state, modal)),
        (Open | Opening, Command::Close) => Some(closing(state, modal)),
        (_, Command::Toggle) => {
            let next = if state.is_open() {
                Command::Close
            } else {
                Command::Open
            };
            transition(state, next, modal)
        }
        (Opening, Command::Settle) => Some(Transition {
            from: Opening,
            to: Open,
            effects: Effects::empty(),
        }),
        (Closing, Command::Settle) => Some(Transition {
            from: Closing,
            to: Closed,
            effects: Effects::HIDE,
        }),
        _ => None,
    }
}
