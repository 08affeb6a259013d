#![forbid(unsafe_code)]

//! Placement solving for floating content.

pub mod position;

pub use position::{Align, Placement, PositionError, Resolved, Side, compute_position};
