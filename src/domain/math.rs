// Plain 2D value types shared by the simulation.

use std::ops::{Add, Sub};

/// Absolute position in universe space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns the displacement from this point to `other`.
    pub fn vector_to(self, other: Point) -> Vector {
        Vector::new(other.x, other.y) - Vector::new(self.x, self.y)
    }

    pub fn distance_to(self, other: Point) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    pub fn distance_squared_to(self, other: Point) -> f64 {
        self.vector_to(other).magnitude_squared()
    }

    /// Moves the point by `v` scaled by `s`.
    pub fn offset(self, v: Vector, s: f64) -> Point {
        Point::new(self.x + v.x * s, self.y + v.y * s)
    }
}

/// Displacement, velocity or force.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vector {
    pub x: f64,
    pub y: f64,
}

impl Vector {
    pub const ZERO: Vector = Vector::new(0.0, 0.0);

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn scale(self, s: f64) -> Vector {
        Vector::new(self.x * s, self.y * s)
    }

    pub fn magnitude(self) -> f64 {
        self.magnitude_squared().sqrt()
    }

    pub fn magnitude_squared(self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    pub fn is_zero(self) -> bool {
        self.magnitude_squared() == 0.0
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Rotates the vector a quarter turn counter-clockwise.
    pub fn perpendicular(self) -> Vector {
        Vector::new(-self.y, self.x)
    }

    /// Rescales the vector so its magnitude equals `m`, keeping its direction.
    ///
    /// # Panics
    ///
    /// Panics on a zero vector, which has no direction to keep.
    pub fn with_magnitude(self, m: f64) -> Vector {
        let current = self.magnitude();
        if current == 0.0 {
            panic!("cannot use with_magnitude on a zero vector");
        }
        self.scale(m / current)
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, other: Vector) -> Vector {
        Vector::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, other: Vector) -> Vector {
        Vector::new(self.x - other.x, self.y - other.y)
    }
}

/// Axis-aligned bounds anchored at the top-left corner `(x, y)`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Inclusive on all four edges.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.w && p.y >= self.y && p.y <= self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_to_points_from_self_to_other() {
        assert_eq!(
            Point::new(0.0, 1.0).vector_to(Point::new(1.0, 2.0)),
            Vector::new(1.0, 1.0)
        );
        assert_eq!(
            Point::new(-1.0, -10.0).vector_to(Point::new(1.0, -2.0)),
            Vector::new(2.0, 8.0)
        );
    }

    #[test]
    fn distance_between_points() {
        let origin = Point::new(0.0, 0.0);
        assert_eq!(origin.distance_to(origin), 0.0);
        assert_eq!(origin.distance_to(Point::new(2.0, 0.0)), 2.0);
        assert_eq!(origin.distance_to(Point::new(3.0, 4.0)), 5.0);
        assert_eq!(origin.distance_squared_to(Point::new(3.0, 4.0)), 25.0);
    }

    #[test]
    fn vector_arithmetic() {
        assert_eq!(Vector::new(0.0, 1.0) + Vector::new(1.0, 2.0), Vector::new(1.0, 3.0));
        assert_eq!(Vector::new(-1.0, -10.0) + Vector::new(1.0, -2.0), Vector::new(0.0, -12.0));
        assert_eq!(Vector::new(15.0, -10.0) - Vector::new(1.0, 2.0), Vector::new(14.0, -12.0));
        assert_eq!(Vector::new(1.0, 10.0).scale(2.0), Vector::new(2.0, 20.0));
    }

    #[test]
    fn magnitudes() {
        assert_eq!(Vector::new(0.0, 10.0).magnitude(), 10.0);
        assert_eq!(Vector::new(3.0, 4.0).magnitude(), 5.0);
        assert_eq!(Vector::new(10.0, 0.0).magnitude_squared(), 100.0);
        assert_eq!(Vector::new(3.0, 4.0).magnitude_squared(), 25.0);
    }

    #[test]
    fn with_magnitude_keeps_direction() {
        assert_eq!(Vector::new(0.0, 10.0).with_magnitude(5.0), Vector::new(0.0, 5.0));
        assert_eq!(Vector::new(10.0, 0.0).with_magnitude(5.0), Vector::new(5.0, 0.0));
        assert_eq!(Vector::new(3.0, 4.0).with_magnitude(10.0), Vector::new(6.0, 8.0));
    }

    #[test]
    #[should_panic(expected = "zero vector")]
    fn with_magnitude_on_zero_vector_panics() {
        let _ = Vector::ZERO.with_magnitude(1.0);
    }

    #[test]
    fn rect_contains_is_edge_inclusive() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);

        assert!(r.contains(Point::new(0.0, 0.0)));
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(0.0, 5.0)));
        assert!(r.contains(Point::new(5.0, 0.0)));

        assert!(!r.contains(Point::new(-1.0, 0.0)));
        assert!(!r.contains(Point::new(11.0, 0.0)));
        assert!(!r.contains(Point::new(0.0, -5.0)));
        assert!(!r.contains(Point::new(-5.0, 0.0)));
    }
}
