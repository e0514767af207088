//! Geometric primitives for diagram positioning.
//!
//! This module provides the geometric types used to place person boxes,
//! route relationship arrows and anchor marriage markers.
//!
//! # Overview
//!
//! - [`Point`] - A 2D coordinate in diagram space
//! - [`Size`] - Width and height dimensions
//! - [`Bounds`] - A rectangular bounding box defined by minimum and maximum coordinates
//! - [`Insets`] - Padding/margin values for four sides
//!
//! # Coordinate System
//!
//! ```text
//!   (0,0) ────────► +X
//!     │
//!     │
//!     ▼
//!    +Y
//! ```
//!
//! - **Origin**: Top-left corner of the canvas at `(0, 0)`
//! - **X-axis**: Increases rightward
//! - **Y-axis**: Increases downward
//!
//! Person positions are box centers, so a box at `(100, 50)` with size
//! `200x50` spans `x ∈ [0, 200]` and `y ∈ [25, 75]`.

use serde::Serialize;

/// A 2D point representing a position in diagram coordinate space.
///
/// # Examples
///
/// ```
/// # use lineage_core::geometry::Point;
/// let p1 = Point::new(10.0, 20.0);
/// let p2 = Point::new(5.0, 5.0);
///
/// let sum = p1.add_point(p2);
/// assert_eq!(sum.x(), 15.0);
/// assert_eq!(sum.y(), 25.0);
///
/// let mid = p1.midpoint(p2);
/// assert_eq!(mid.x(), 7.5);
/// assert_eq!(mid.y(), 12.5);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Creates a new point with the specified x-coordinate
    pub fn with_x(mut self, x: f32) -> Self {
        self.x = x;
        self
    }

    /// Creates a new point with the specified y-coordinate
    pub fn with_y(mut self, y: f32) -> Self {
        self.y = y;
        self
    }

    /// Adds another point to this point, returning a new point.
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Calculates the midpoint between this point and another point
    pub fn midpoint(self, other: Point) -> Self {
        Self {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    /// Calculates the hypotenuse (Euclidean distance from origin)
    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Multiplies both coordinates by the given factor.
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Rotates this vector around the origin by `angle` radians.
    pub fn rotate(self, angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// `true` unless a coordinate is NaN or infinite.
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Converts a point and size into a bounds rectangle
    ///
    /// The point is treated as the center of the bounds.
    pub fn to_bounds(self, size: Size) -> Bounds {
        Bounds::new_from_center(self, size)
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }

    /// Returns a new Size with the maximum width and height between this size and another
    pub fn max(self, other: Size) -> Self {
        Self {
            width: self.width.max(other.width),
            height: self.height.max(other.height),
        }
    }

    /// Returns a new Size with padding added to both width and height
    pub fn add_padding(self, insets: Insets) -> Self {
        Self {
            width: self.width + insets.horizontal_sum(),
            height: self.height + insets.vertical_sum(),
        }
    }

    /// Returns true if both width and height are zero
    pub fn is_zero(self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }
}

/// Represents a rectangular bounding box with minimum and maximum coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates a new bounds from a center point and a size
    pub fn new_from_center(center: Point, size: Size) -> Self {
        let half_width = size.width / 2.0;
        let half_height = size.height / 2.0;
        Self {
            min_x: center.x - half_width,
            min_y: center.y - half_height,
            max_x: center.x + half_width,
            max_y: center.y + half_height,
        }
    }

    /// Creates a new bounds from a top-left point and a size
    pub fn new_from_top_left(top_left: Point, size: Size) -> Self {
        Self {
            min_x: top_left.x,
            min_y: top_left.y,
            max_x: top_left.x + size.width,
            max_y: top_left.y + size.height,
        }
    }

    /// Returns the minimum x-coordinate of the bounds
    pub fn min_x(self) -> f32 {
        self.min_x
    }

    /// Returns the minimum y-coordinate of the bounds
    pub fn min_y(self) -> f32 {
        self.min_y
    }

    /// Returns the maximum x-coordinate of the bounds
    pub fn max_x(self) -> f32 {
        self.max_x
    }

    /// Returns the maximum y-coordinate of the bounds
    pub fn max_y(self) -> f32 {
        self.max_y
    }

    /// Returns the center point of the bounds
    pub fn center(self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Returns the width of the bounds
    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    /// Returns the height of the bounds
    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Converts the bounds to a size
    pub fn to_size(self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Moves the bounds by the given offset
    pub fn translate(&self, offset: Point) -> Self {
        Self {
            min_x: self.min_x + offset.x,
            min_y: self.min_y + offset.y,
            max_x: self.max_x + offset.x,
            max_y: self.max_y + offset.y,
        }
    }

    /// Returns `true` if the interiors of the two rectangles overlap.
    ///
    /// Rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Returns `true` if the point lies inside or on the border of the bounds.
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.min_x
            && point.x <= self.max_x
            && point.y >= self.min_y
            && point.y <= self.max_y
    }

    /// Corners in clockwise order starting at the top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }

    /// Finds where the segment `from → to` first crosses the border of this
    /// rectangle, walking from `from`.
    ///
    /// Returns `None` when the segment does not cross the border, for example
    /// when both ends are inside.
    ///
    /// # Examples
    ///
    /// ```
    /// # use lineage_core::geometry::{Bounds, Point, Size};
    /// let target = Bounds::new_from_center(Point::new(100.0, 0.0), Size::new(40.0, 20.0));
    /// let hit = target
    ///     .boundary_intersection(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
    ///     .unwrap();
    /// assert_eq!(hit, Point::new(80.0, 0.0));
    /// ```
    pub fn boundary_intersection(&self, from: Point, to: Point) -> Option<Point> {
        let corners = self.corners();
        let mut best: Option<(f32, Point)> = None;
        for (i, start) in corners.iter().enumerate() {
            let end = corners[(i + 1) % corners.len()];
            let Some((t, point)) = segment_intersection(from, to, *start, end) else {
                continue;
            };
            if best.is_none_or(|(best_t, _)| t < best_t) {
                best = Some((t, point));
            }
        }
        best.map(|(_, point)| point)
    }

    /// Adds padding around the bounds
    pub fn add_padding(&self, insets: Insets) -> Self {
        Self {
            min_x: self.min_x - insets.left,
            min_y: self.min_y - insets.top,
            max_x: self.max_x + insets.right,
            max_y: self.max_y + insets.bottom,
        }
    }
}

/// Intersection of segments `a1 → a2` and `b1 → b2`.
///
/// Returns the parameter along the first segment together with the point.
/// Parallel segments never intersect.
fn segment_intersection(a1: Point, a2: Point, b1: Point, b2: Point) -> Option<(f32, Point)> {
    let r = a2.sub_point(a1);
    let s = b2.sub_point(b1);
    let denom = r.x * s.y - r.y * s.x;
    if denom == 0.0 {
        return None;
    }
    let qp = b1.sub_point(a1);
    let t = (qp.x * s.y - qp.y * s.x) / denom;
    let u = (qp.x * r.y - qp.y * r.x) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    Some((t, a1.add_point(r.scale(t))))
}

/// Represents padding or margin values for the four sides of a rectangle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Insets {
    top: f32,
    right: f32,
    bottom: f32,
    left: f32,
}

impl Insets {
    /// Creates new insets with the specified values
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Creates insets with the same value on every side
    pub fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Creates insets from a vertical and a horizontal value
    pub fn symmetric(vertical: f32, horizontal: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }

    pub fn top(self) -> f32 {
        self.top
    }

    pub fn right(self) -> f32 {
        self.right
    }

    pub fn bottom(self) -> f32 {
        self.bottom
    }

    pub fn left(self) -> f32 {
        self.left
    }

    /// Sum of left and right insets
    pub fn horizontal_sum(self) -> f32 {
        self.left + self.right
    }

    /// Sum of top and bottom insets
    pub fn vertical_sum(self) -> f32 {
        self.top + self.bottom
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::approx_eq;

    use super::*;

    #[test]
    fn test_point_rotate_quarter_turn() {
        let p = Point::new(1.0, 0.0).rotate(std::f32::consts::FRAC_PI_2);
        assert!(approx_eq!(f32, p.x(), 0.0, epsilon = 1e-6));
        assert!(approx_eq!(f32, p.y(), 1.0, epsilon = 1e-6));
    }

    #[test]
    fn test_point_is_finite() {
        assert!(Point::new(-5.0, 1e30).is_finite());
        assert!(!Point::new(f32::NAN, 0.0).is_finite());
        assert!(!Point::new(0.0, f32::NEG_INFINITY).is_finite());
    }

    #[test]
    fn test_bounds_from_center() {
        let bounds = Bounds::new_from_center(Point::new(100.0, 50.0), Size::new(200.0, 50.0));
        assert_eq!(bounds.min_x(), 0.0);
        assert_eq!(bounds.max_x(), 200.0);
        assert_eq!(bounds.min_y(), 25.0);
        assert_eq!(bounds.max_y(), 75.0);
        assert_eq!(bounds.center(), Point::new(100.0, 50.0));
        assert_eq!(bounds.to_size(), Size::new(200.0, 50.0));
    }

    #[test]
    fn test_intersects_overlap() {
        let a = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
        let b = Bounds::new_from_center(Point::new(50.0, 10.0), Size::new(100.0, 50.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_intersects_touching_edges_do_not_overlap() {
        let a = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(100.0, 50.0));
        let b = Bounds::new_from_center(Point::new(100.0, 0.0), Size::new(100.0, 50.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_intersects_disjoint() {
        let a = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new_from_center(Point::new(0.0, 100.0), Size::new(10.0, 10.0));
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_contains_point() {
        let bounds = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        assert!(bounds.contains_point(Point::new(5.0, 5.0)));
        assert!(bounds.contains_point(Point::new(10.0, 10.0)));
        assert!(!bounds.contains_point(Point::new(10.5, 5.0)));
    }

    #[test]
    fn test_boundary_intersection_from_above() {
        let target = Bounds::new_from_center(Point::new(0.0, 200.0), Size::new(200.0, 50.0));
        let hit = target
            .boundary_intersection(Point::new(0.0, 0.0), Point::new(0.0, 200.0))
            .unwrap();
        assert!(approx_eq!(f32, hit.x(), 0.0));
        assert!(approx_eq!(f32, hit.y(), 175.0));
    }

    #[test]
    fn test_boundary_intersection_diagonal() {
        let target = Bounds::new_from_center(Point::new(100.0, 100.0), Size::new(20.0, 20.0));
        let hit = target
            .boundary_intersection(Point::new(0.0, 0.0), Point::new(100.0, 100.0))
            .unwrap();
        assert!(approx_eq!(f32, hit.x(), 90.0, epsilon = 1e-4));
        assert!(approx_eq!(f32, hit.y(), 90.0, epsilon = 1e-4));
    }

    #[test]
    fn test_boundary_intersection_inside_is_none() {
        let target = Bounds::new_from_center(Point::new(0.0, 0.0), Size::new(100.0, 100.0));
        let hit = target.boundary_intersection(Point::new(-10.0, 0.0), Point::new(10.0, 0.0));
        assert!(hit.is_none());
    }

    #[test]
    fn test_size_add_padding() {
        let size = Size::new(50.0, 14.0).add_padding(Insets::symmetric(8.0, 16.0));
        assert_eq!(size, Size::new(82.0, 30.0));
    }

    #[test]
    fn test_insets_sums() {
        let insets = Insets::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(insets.horizontal_sum(), 6.0);
        assert_eq!(insets.vertical_sum(), 4.0);
        assert_eq!(Insets::uniform(5.0), Insets::new(5.0, 5.0, 5.0, 5.0));
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    // ===================
    // Strategies
    // ===================

    fn bounds_strategy() -> impl Strategy<Value = Bounds> {
        (
            -1000.0f32..1000.0,
            -1000.0f32..1000.0,
            1.0f32..500.0,
            1.0f32..500.0,
        )
            .prop_map(|(x, y, w, h)| Bounds::new_from_center(Point::new(x, y), Size::new(w, h)))
    }

    fn point_strategy() -> impl Strategy<Value = Point> {
        (-1000.0f32..1000.0, -1000.0f32..1000.0).prop_map(|(x, y)| Point::new(x, y))
    }

    // ===================
    // Property Test Functions
    // ===================

    /// Overlap is symmetric.
    fn check_intersects_is_symmetric(a: Bounds, b: Bounds) -> Result<(), TestCaseError> {
        prop_assert_eq!(a.intersects(&b), b.intersects(&a));
        Ok(())
    }

    /// A segment from outside to the center always hits the border, and the hit lies on it.
    fn check_boundary_hit_lies_on_border(target: Bounds, from: Point) -> Result<(), TestCaseError> {
        prop_assume!(!target.contains_point(from));

        let hit = target.boundary_intersection(from, target.center());
        prop_assert!(hit.is_some());
        let hit = hit.unwrap();

        let on_vertical = approx_eq!(f32, hit.x(), target.min_x(), epsilon = 1e-2)
            || approx_eq!(f32, hit.x(), target.max_x(), epsilon = 1e-2);
        let on_horizontal = approx_eq!(f32, hit.y(), target.min_y(), epsilon = 1e-2)
            || approx_eq!(f32, hit.y(), target.max_y(), epsilon = 1e-2);
        prop_assert!(on_vertical || on_horizontal);
        Ok(())
    }

    /// Translating bounds keeps their size.
    fn check_translate_keeps_size(bounds: Bounds, offset: Point) -> Result<(), TestCaseError> {
        let moved = bounds.translate(offset);
        prop_assert!(approx_eq!(f32, moved.width(), bounds.width(), epsilon = 1e-2));
        prop_assert!(approx_eq!(f32, moved.height(), bounds.height(), epsilon = 1e-2));
        Ok(())
    }

    // ===================
    // Proptest Wrappers
    // ===================

    proptest! {
        #[test]
        fn intersects_is_symmetric(a in bounds_strategy(), b in bounds_strategy()) {
            check_intersects_is_symmetric(a, b)?;
        }

        #[test]
        fn boundary_hit_lies_on_border(target in bounds_strategy(), from in point_strategy()) {
            check_boundary_hit_lies_on_border(target, from)?;
        }

        #[test]
        fn translate_keeps_size(bounds in bounds_strategy(), offset in point_strategy()) {
            check_translate_keeps_size(bounds, offset)?;
        }
    }
}
