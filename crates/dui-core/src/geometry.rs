#![forbid(unsafe_code)]

//! Geometric primitives in CSS pixels.
//!
//! Coordinates are `f64` page coordinates with the origin at the top-left of
//! the viewport. A `Rect` with a non-positive width or height is empty.

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A width/height pair in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether either dimension is not strictly positive.
    #[inline]
    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Whether both dimensions are finite numbers.
    #[inline]
    pub fn is_finite(self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

/// An axis-aligned rectangle (a `DOMRect` equivalent).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin with the given size.
    #[inline]
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Rectangle of `size` placed at `origin`.
    #[inline]
    pub const fn at(origin: Point, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[inline]
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    #[inline]
    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Whether the rectangle covers no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size().is_empty()
    }

    /// Whether every component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.size().is_finite()
    }

    /// Whether the point lies inside (edges inclusive on the top/left).
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Whether `other` lies completely inside `self`.
    ///
    /// A tolerance of `1e-9` absorbs float noise from centering math.
    pub fn contains_rect(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-9;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.bottom() <= self.bottom() + EPS
    }

    /// Shrink every edge by `amount` (never below zero size).
    pub fn inset(&self, amount: f64) -> Rect {
        let width = (self.width - amount * 2.0).max(0.0);
        let height = (self.height - amount * 2.0).max(0.0);
        Rect::new(self.x + amount, self.y + amount, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(r.right(), 40.0);
        assert_eq!(r.bottom(), 60.0);
        assert_eq!(r.size(), Size::new(30.0, 40.0));
    }

    #[test]
    fn empty_rects() {
        assert!(Rect::new(0.0, 0.0, 0.0, 10.0).is_empty());
        assert!(Rect::new(0.0, 0.0, 10.0, -1.0).is_empty());
        assert!(!Rect::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn contains_point_is_half_open() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(9.9, 9.9)));
        assert!(!r.contains(Point::new(10.0, 5.0)));
    }

    #[test]
    fn contains_rect_inclusive() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 5.0, 5.0)));
        assert!(!outer.contains_rect(&Rect::new(90.0, 10.0, 20.0, 5.0)));
    }

    #[test]
    fn inset_never_negative() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0).inset(8.0);
        assert_eq!(r.width, 0.0);
        assert_eq!(r.x, 8.0);
    }

    #[test]
    fn non_finite_detected() {
        assert!(!Rect::new(f64::NAN, 0.0, 1.0, 1.0).is_finite());
        assert!(!Size::new(1.0, f64::INFINITY).is_finite());
    }

    proptest::proptest! {
        #[test]
        fn inset_stays_inside(
            x in -500.0..500.0f64,
            y in -500.0..500.0f64,
            w in 0.0..1000.0f64,
            h in 0.0..1000.0f64,
            amount in 0.0..600.0f64,
        ) {
            let outer = Rect::new(x, y, w, h);
            let inner = outer.inset(amount);
            proptest::prop_assert!(inner.width >= 0.0 && inner.height >= 0.0);
            if amount * 2.0 <= w.min(h) {
                proptest::prop_assert!(outer.contains_rect(&inner));
            }
        }

        #[test]
        fn contains_rect_is_reflexive(
            x in -500.0..500.0f64,
            y in -500.0..500.0f64,
            w in 0.0..1000.0f64,
            h in 0.0..1000.0f64,
        ) {
            let r = Rect::new(x, y, w, h);
            proptest::prop_assert!(r.contains_rect(&r));
        }
    }
}
