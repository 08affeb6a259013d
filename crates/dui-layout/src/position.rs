#![forbid(unsafe_code)]

//! Position engine for trigger-relative floating content.
//!
//! Given the trigger rectangle, the content size, a [`Placement`] request, and
//! the viewport, [`compute_position`] resolves the content's top-left corner
//! and the side/alignment actually used.
//!
//! # Algorithm
//!
//! 1. Main axis: place the content `offset` pixels away from the requested
//!    side of the trigger.
//! 2. Flip: with `flip` enabled and the content overflowing the viewport on
//!    the main axis, mirror to the opposite side if that side fits, or has
//!    more room than the requested one.
//! 3. With `flip` enabled the main axis is then shifted into the viewport, so
//!    a flipped placement is never rendered outside it.
//! 4. Cross axis: align start/center/end against the trigger; with `flip`, an
//!    overflowing start/end alignment is mirrored when the mirror fits.
//! 5. The cross axis is always clamped by shifting. The content is never
//!    resized.
//!
//! # Invariants
//!
//! - If the content fits inside the (padded) viewport and `flip` is enabled,
//!   the resolved rectangle lies inside the viewport.
//! - `Resolved::side`/`align` are the values used, not the values requested.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Result |
//! |---------|-------|--------|
//! | Empty viewport | zero/negative or non-finite viewport | `PositionError::EmptyViewport` |
//! | Degenerate trigger | zero-size or non-finite trigger rect | `PositionError::DegenerateTrigger` |
//! | Invalid content | negative or non-finite content size | `PositionError::InvalidContent` |

use std::fmt;
use std::str::FromStr;

use dui_core::geometry::{Rect, Size};
use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether clamping moved the content.
const EPS: f64 = 1e-9;

/// Side of the trigger the content is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    #[default]
    Bottom,
    Left,
}

impl Side {
    /// The mirrored side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether the main axis is vertical (content above/below the trigger).
    #[inline]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(Self::Top),
            "right" => Ok(Self::Right),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            _ => Err(ParsePlacementError::new(s)),
        }
    }
}

/// Alignment along the cross axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Start,
    #[default]
    Center,
    End,
}

impl Align {
    /// Start ↔ End; Center is its own mirror.
    #[must_use]
    pub const fn mirror(self) -> Self {
        match self {
            Self::Start => Self::End,
            Self::Center => Self::Center,
            Self::End => Self::Start,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Center => "center",
            Self::End => "end",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Align {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "center" => Ok(Self::Center),
            "end" => Ok(Self::End),
            _ => Err(ParsePlacementError::new(s)),
        }
    }
}

/// Requested placement of floating content.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub side: Side,
    pub align: Align,
    /// Gap between trigger and content along the main axis, in pixels.
    pub offset: f64,
    /// Mirror to the opposite side on main-axis collision.
    pub flip: bool,
    /// Inset applied to the viewport for collision checks.
    pub collision_padding: f64,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            side: Side::Bottom,
            align: Align::Center,
            offset: 4.0,
            flip: true,
            collision_padding: 0.0,
        }
    }
}

impl Placement {
    /// Placement on `side` with default alignment, offset and flip.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }

    #[must_use]
    pub fn collision_padding(mut self, padding: f64) -> Self {
        self.collision_padding = padding;
        self
    }
}

/// Parses `side` or `side-align` (e.g. `top`, `bottom-start`).
impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (side, align) = match s.split_once('-') {
            Some((side, align)) => (side, Some(align)),
            None => (s, None),
        };
        let side: Side = side.parse().map_err(|_| ParsePlacementError::new(s))?;
        let align = match align {
            Some(align) => align.parse().map_err(|_| ParsePlacementError::new(s))?,
            None => Align::Center,
        };
        Ok(Self::new(side).align(align))
    }
}

/// A placement string that names no known side/alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlacementError {
    input: String,
}

impl ParsePlacementError {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

impl fmt::Display for ParsePlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid placement: {:?}", self.input)
    }
}

impl std::error::Error for ParsePlacementError {}

/// Outcome of a placement computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolved {
    pub x: f64,
    pub y: f64,
    pub side: Side,
    pub align: Align,
    /// The side differs from the request.
    pub flipped: bool,
    /// Clamping moved the content on at least one axis.
    pub shifted: bool,
}

impl Resolved {
    /// Content rectangle at the resolved position.
    pub fn rect(&self, content: Size) -> Rect {
        Rect::new(self.x, self.y, content.width, content.height)
    }
}

/// Inputs the engine cannot place against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PositionError {
    EmptyViewport,
    DegenerateTrigger(Rect),
    InvalidContent(Size),
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyViewport => write!(f, "viewport has no area"),
            Self::DegenerateTrigger(r) => write!(
                f,
                "trigger rect is degenerate ({}x{} at {},{})",
                r.width, r.height, r.x, r.y
            ),
            Self::InvalidContent(s) => {
                write!(f, "content size is invalid ({}x{})", s.width, s.height)
            }
        }
    }
}

impl std::error::Error for PositionError {}

/// Resolve where floating content goes.
pub fn compute_position(
    trigger: Rect,
    content: Size,
    placement: &Placement,
    viewport: Rect,
) -> Result<Resolved, PositionError> {
    if !viewport.is_finite() || viewport.is_empty() {
        return Err(PositionError::EmptyViewport);
    }
    if !trigger.is_finite() || (trigger.width <= 0.0 && trigger.height <= 0.0) {
        return Err(PositionError::DegenerateTrigger(trigger));
    }
    if !content.is_finite() || content.width < 0.0 || content.height < 0.0 {
        return Err(PositionError::InvalidContent(content));
    }

    let padding = if placement.collision_padding.is_finite() {
        placement.collision_padding.max(0.0)
    } else {
        0.0
    };
    let bounds = viewport.inset(padding);
    let offset = if placement.offset.is_finite() {
        placement.offset
    } else {
        0.0
    };

    // Main axis with optional flip.
    let mut side = placement.side;
    let mut flipped = false;
    let requested_overflow = main_overflow(side, main_coord(side, trigger, content, offset), content, bounds);
    if placement.flip && requested_overflow > EPS {
        let opposite = side.opposite();
        let opposite_overflow =
            main_overflow(opposite, main_coord(opposite, trigger, content, offset), content, bounds);
        if opposite_overflow < requested_overflow {
            side = opposite;
            flipped = true;
        }
    }

    let mut shifted = false;
    let mut main = main_coord(side, trigger, content, offset);
    if placement.flip {
        let (start, end, len) = axis_span(side.is_vertical(), bounds, content);
        let clamped = clamp_axis(main, start, end, len);
        shifted |= (clamped - main).abs() > EPS;
        main = clamped;
    }

    // Cross axis with optional alignment mirror, then shift.
    let cross_vertical = !side.is_vertical();
    let (start, end, len) = axis_span(cross_vertical, bounds, content);
    let mut align = placement.align;
    let mut cross = cross_coord(side, align, trigger, content);
    if placement.flip && align != Align::Center && span_overflow(cross, start, end, len) > EPS {
        let mirrored = align.mirror();
        let alternative = cross_coord(side, mirrored, trigger, content);
        if span_overflow(alternative, start, end, len) <= EPS {
            align = mirrored;
            cross = alternative;
        }
    }
    let clamped = clamp_axis(cross, start, end, len);
    shifted |= (clamped - cross).abs() > EPS;
    cross = clamped;

    let (x, y) = if side.is_vertical() {
        (cross, main)
    } else {
        (main, cross)
    };
    Ok(Resolved {
        x,
        y,
        side,
        align,
        flipped,
        shifted,
    })
}

/// Main-axis coordinate (y for top/bottom, x for left/right).
fn main_coord(side: Side, trigger: Rect, content: Size, offset: f64) -> f64 {
    match side {
        Side::Top => trigger.y - content.height - offset,
        Side::Bottom => trigger.bottom() + offset,
        Side::Left => trigger.x - content.width - offset,
        Side::Right => trigger.right() + offset,
    }
}

/// How far content placed at `main` sticks out past the viewport edge it
/// faces. Positive means overflow.
fn main_overflow(side: Side, main: f64, content: Size, bounds: Rect) -> f64 {
    match side {
        Side::Top => bounds.y - main,
        Side::Bottom => main + content.height - bounds.bottom(),
        Side::Left => bounds.x - main,
        Side::Right => main + content.width - bounds.right(),
    }
}

/// Cross-axis coordinate for an alignment.
fn cross_coord(side: Side, align: Align, trigger: Rect, content: Size) -> f64 {
    let (start, trigger_len, content_len) = if side.is_vertical() {
        (trigger.x, trigger.width, content.width)
    } else {
        (trigger.y, trigger.height, content.height)
    };
    match align {
        Align::Start => start,
        Align::Center => start + (trigger_len - content_len) / 2.0,
        Align::End => start + trigger_len - content_len,
    }
}

/// `(start, end, content length)` of the viewport along one axis.
fn axis_span(vertical: bool, bounds: Rect, content: Size) -> (f64, f64, f64) {
    if vertical {
        (bounds.y, bounds.bottom(), content.height)
    } else {
        (bounds.x, bounds.right(), content.width)
    }
}

fn span_overflow(pos: f64, start: f64, end: f64, len: f64) -> f64 {
    (start - pos).max(pos + len - end)
}

/// Shift `pos` so `[pos, pos + len]` fits in `[start, end]`; when it cannot
/// fit, the start edge wins.
fn clamp_axis(pos: f64, start: f64, end: f64, len: f64) -> f64 {
    if len >= end - start {
        start
    } else {
        pos.clamp(start, end - len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VIEWPORT: Rect = Rect::new(0.0, 0.0, 800.0, 600.0);

    fn content() -> Size {
        Size::new(200.0, 100.0)
    }

    #[test]
    fn bottom_center_default() {
        let trigger = Rect::new(300.0, 200.0, 100.0, 40.0);
        let r = compute_position(trigger, content(), &Placement::default(), VIEWPORT).unwrap();
        assert_eq!(r.side, Side::Bottom);
        assert_eq!(r.align, Align::Center);
        assert_eq!(r.y, 244.0);
        assert_eq!(r.x, 250.0);
        assert!(!r.flipped && !r.shifted);
    }

    #[test]
    fn top_fits_stays_top() {
        let trigger = Rect::new(300.0, 300.0, 100.0, 40.0);
        let r = compute_position(trigger, content(), &Placement::new(Side::Top), VIEWPORT).unwrap();
        assert_eq!(r.side, Side::Top);
        assert_eq!(r.y, 196.0);
    }

    #[test]
    fn top_collision_flips_to_bottom() {
        let trigger = Rect::new(300.0, 20.0, 100.0, 40.0);
        let r = compute_position(trigger, content(), &Placement::new(Side::Top), VIEWPORT).unwrap();
        assert_eq!(r.side, Side::Bottom);
        assert!(r.flipped);
        assert_eq!(r.y, 64.0);
    }

    #[test]
    fn no_flip_keeps_requested_side_even_offscreen() {
        let trigger = Rect::new(300.0, 20.0, 100.0, 40.0);
        let placement = Placement::new(Side::Top).flip(false);
        let r = compute_position(trigger, content(), &placement, VIEWPORT).unwrap();
        assert_eq!(r.side, Side::Top);
        assert!(r.y < 0.0);
    }

    #[test]
    fn right_collision_flips_left() {
        let trigger = Rect::new(700.0, 300.0, 60.0, 20.0);
        let r = compute_position(trigger, content(), &Placement::new(Side::Right), VIEWPORT).unwrap();
        assert_eq!(r.side, Side::Left);
        assert_eq!(r.x, 700.0 - 200.0 - 4.0);
    }

    #[test]
    fn cross_axis_is_shifted_not_resized() {
        let trigger = Rect::new(760.0, 100.0, 30.0, 20.0);
        let r = compute_position(trigger, content(), &Placement::default(), VIEWPORT).unwrap();
        assert_eq!(r.x, 600.0);
        assert!(r.shifted);
        assert!(VIEWPORT.contains_rect(&r.rect(content())));
    }

    #[test]
    fn start_alignment_mirrors_near_right_edge() {
        let trigger = Rect::new(700.0, 100.0, 100.0, 20.0);
        let placement = Placement::new(Side::Bottom).align(Align::Start);
        let r = compute_position(trigger, content(), &placement, VIEWPORT).unwrap();
        assert_eq!(r.align, Align::End);
        assert_eq!(r.x, 600.0);
        assert!(!r.shifted);
    }

    #[test]
    fn both_sides_overflow_picks_roomier_and_clamps() {
        let viewport = Rect::new(0.0, 0.0, 800.0, 150.0);
        let trigger = Rect::new(300.0, 40.0, 100.0, 20.0);
        let r = compute_position(trigger, content(), &Placement::new(Side::Top), viewport).unwrap();
        // 40px above vs 90px below: bottom has more room.
        assert_eq!(r.side, Side::Bottom);
        assert!(viewport.contains_rect(&r.rect(content())));
    }

    #[test]
    fn collision_padding_insets_viewport() {
        let trigger = Rect::new(300.0, 110.0, 100.0, 20.0);
        let placement = Placement::new(Side::Top).collision_padding(20.0);
        let r = compute_position(trigger, content(), &placement, VIEWPORT).unwrap();
        // y would be 6 without padding (fits), but the padded top edge is 20.
        assert_eq!(r.side, Side::Bottom);
    }

    #[test]
    fn degenerate_inputs_are_errors() {
        let zero = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(
            compute_position(zero, content(), &Placement::default(), VIEWPORT),
            Err(PositionError::DegenerateTrigger(zero))
        );
        let trigger = Rect::new(10.0, 10.0, 10.0, 10.0);
        assert_eq!(
            compute_position(trigger, content(), &Placement::default(), Rect::default()),
            Err(PositionError::EmptyViewport)
        );
        let bad = Size::new(f64::NAN, 1.0);
        assert!(matches!(
            compute_position(trigger, bad, &Placement::default(), VIEWPORT),
            Err(PositionError::InvalidContent(_))
        ));
    }

    #[test]
    fn one_pixel_anchor_is_valid() {
        let anchor = Rect::new(400.0, 300.0, 1.0, 1.0);
        let placement = Placement::new(Side::Bottom).align(Align::Start).offset(0.0);
        let r = compute_position(anchor, content(), &placement, VIEWPORT).unwrap();
        assert_eq!((r.x, r.y), (400.0, 301.0));
    }

    #[test]
    fn parse_placement_strings() {
        assert_eq!("top".parse::<Placement>().unwrap().side, Side::Top);
        let p: Placement = "bottom-start".parse().unwrap();
        assert_eq!((p.side, p.align), (Side::Bottom, Align::Start));
        let p: Placement = "LEFT-end".parse().unwrap();
        assert_eq!((p.side, p.align), (Side::Left, Align::End));
        assert!("middle".parse::<Placement>().is_err());
        assert!("top-middle".parse::<Placement>().is_err());
    }

    #[test]
    fn resolved_serializes_lowercase() {
        let trigger = Rect::new(300.0, 300.0, 100.0, 40.0);
        let r = compute_position(trigger, content(), &Placement::new(Side::Top), VIEWPORT).unwrap();
        let json = serde_json::to_value(r).unwrap();
        assert_eq!(json["side"], "top");
        assert_eq!(json["align"], "center");
    }

    proptest! {
        #[test]
        fn flip_enabled_never_leaves_viewport(
            tx in 0.0f64..780.0,
            ty in 0.0f64..580.0,
            tw in 1.0f64..20.0,
            th in 1.0f64..20.0,
            cw in 1.0f64..800.0,
            ch in 1.0f64..600.0,
            side in prop::sample::select(vec![Side::Top, Side::Right, Side::Bottom, Side::Left]),
            align in prop::sample::select(vec![Align::Start, Align::Center, Align::End]),
            offset in 0.0f64..16.0,
        ) {
            let trigger = Rect::new(tx, ty, tw, th);
            let size = Size::new(cw, ch);
            let placement = Placement::new(side).align(align).offset(offset);
            let r = compute_position(trigger, size, &placement, VIEWPORT).unwrap();
            prop_assert!(VIEWPORT.contains_rect(&r.rect(size)), "{:?} escaped", r);
        }
    }
}
