use std::ops::{Add, Sub};

/// a 2-D point, generic over its coordinate representation.
///
/// `Point<i32>` keys board cells and k-d tree nodes; `Point<f32>` represents
/// mouse positions and the solver's rolling target, mirroring the original's
/// `Pointi` / `Pointf` split without duplicating the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Add<Output = T>> Add for Point<T> {
    type Output = Point<T>;
    fn add(self, rhs: Self) -> Self::Output {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl<T: Sub<Output = T>> Sub for Point<T> {
    type Output = Point<T>;
    fn sub(self, rhs: Self) -> Self::Output {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Point<i32> {
    /// manhattan distance between two integer points.
    pub fn manhattan(self, other: Self) -> i64 {
        (self.x as i64 - other.x as i64).abs() + (self.y as i64 - other.y as i64).abs()
    }

    pub fn coord(self, axis: usize) -> i32 {
        if axis == 0 { self.x } else { self.y }
    }
}

impl From<Point<f32>> for Point<i32> {
    /// round-to-nearest; fixes the systematic bias towards the top-left that
    /// truncation would introduce when converting a rolling target to a grid cell.
    fn from(p: Point<f32>) -> Self {
        Point::new(p.x.round() as i32, p.y.round() as i32)
    }
}

impl From<Point<i32>> for Point<f32> {
    fn from(p: Point<i32>) -> Self {
        Point::new(p.x as f32, p.y as f32)
    }
}

impl std::fmt::Display for Point<i32> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = Point::new(2, 3);
        let b = Point::new(-1, 7);
        assert_eq!(a.manhattan(b), b.manhattan(a));
        assert_eq!(a.manhattan(b), 3 + 4);
    }

    #[test]
    fn float_to_int_rounds_rather_than_truncates() {
        let p = Point::new(2.6f32, 2.4f32);
        let q: Point<i32> = p.into();
        assert_eq!(q, Point::new(3, 2));
    }
}
