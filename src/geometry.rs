//! Move directions and 3D point arithmetic.
//!
//! A piece moves one cell along one axis at a time. The search tries the four
//! directions in the fixed order of [`DIRECTIONS`], which makes discovery order
//! (and therefore every downstream layout) deterministic.

use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

use serde::Serialize;

use crate::pieces::Coord;

/// A single-cell move along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// All moves, in search order: left, right, up, down.
pub const DIRECTIONS: [Direction; 4] = [
    Direction::Left,
    Direction::Right,
    Direction::Up,
    Direction::Down,
];

impl Direction {
    /// The `(dx, dy)` step; y grows downwards.
    #[inline]
    pub const fn delta(self) -> Coord {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// Whether two anchors are exactly one unit step apart along a single axis.
#[inline]
pub fn is_unit_step(a: Coord, b: Coord) -> bool {
    let dx = (a.0 - b.0).abs();
    let dy = (a.1 - b.1).abs();
    dx + dy == 1
}

/// A position in layout space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    /// Mean of a set of points, or `None` when there are none.
    pub fn centroid(points: impl IntoIterator<Item = Self>) -> Option<Self> {
        let (sum, count) = points
            .into_iter()
            .fold((Self::ZERO, 0usize), |(sum, count), point| {
                (sum + point, count + 1)
            });
        (count > 0).then(|| sum / count as f64)
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point3 {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3 {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f64> for Point3 {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl AddAssign for Point3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Point3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_are_unit_steps() {
        for direction in DIRECTIONS {
            assert!(is_unit_step((0, 0), direction.delta()));
        }
    }

    #[test]
    fn test_unit_step_rejects_diagonal_and_long_moves() {
        assert!(!is_unit_step((0, 0), (1, 1)));
        assert!(!is_unit_step((0, 0), (2, 0)));
        assert!(!is_unit_step((3, 3), (3, 3)));
    }

    #[test]
    fn test_centroid() {
        let centroid = Point3::centroid([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 4.0, -2.0),
        ])
        .unwrap();
        assert_eq!(centroid, Point3::new(1.0, 2.0, -1.0));
        assert!(Point3::centroid(std::iter::empty()).is_none());
    }
}
