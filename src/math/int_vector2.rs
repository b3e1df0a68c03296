//! Integer 2D vector for grid-space arithmetic

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Rem, Sub};

use crate::core::types::Vec2;

/// A position or offset in a level's grid, one unit per grid cell.
///
/// Ordering is component-wise: `a <= b` holds only when both components
/// satisfy it. Vectors that are smaller on one axis and larger on the other
/// are incomparable, so `!(a <= b)` does not imply `a > b`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntVector2 {
    pub x: i32,
    pub y: i32,
}

impl IntVector2 {
    pub const ZERO: Self = Self::new(0, 0);

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn splat(v: i32) -> Self {
        Self { x: v, y: v }
    }

    /// Component-wise absolute value
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs())
    }

    /// Floored division, so that cells left of or below the origin map to
    /// negative indices instead of collapsing onto cell 0
    pub fn div_floor(self, n: i32) -> Self {
        Self::new(self.x.div_euclid(n), self.y.div_euclid(n))
    }

    /// Component-wise modulo with a non-negative result
    pub fn rem_euclid(self, n: i32) -> Self {
        Self::new(self.x.rem_euclid(n), self.y.rem_euclid(n))
    }

    /// Grid cell containing a continuous position
    pub fn floor_from(v: Vec2) -> Self {
        Self::new(v.x.floor() as i32, v.y.floor() as i32)
    }
}

impl Add for IntVector2 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for IntVector2 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for IntVector2 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<i32> for IntVector2 {
    type Output = Self;
    fn mul(self, n: i32) -> Self {
        Self::new(self.x * n, self.y * n)
    }
}

/// Truncating division, like integer `/`
impl Div<i32> for IntVector2 {
    type Output = Self;
    fn div(self, n: i32) -> Self {
        Self::new(self.x / n, self.y / n)
    }
}

/// Truncating remainder; the result keeps the sign of the dividend
impl Rem<i32> for IntVector2 {
    type Output = Self;
    fn rem(self, n: i32) -> Self {
        Self::new(self.x % n, self.y % n)
    }
}

impl PartialOrd for IntVector2 {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self.x.cmp(&other.x), self.y.cmp(&other.y)) {
            (x, y) if x == y => Some(x),
            (Ordering::Equal, o) | (o, Ordering::Equal) => Some(o),
            _ => None,
        }
    }
}

impl From<IntVector2> for Vec2 {
    fn from(v: IntVector2) -> Self {
        Vec2::new(v.x as f32, v.y as f32)
    }
}

impl From<(i32, i32)> for IntVector2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x, y)
    }
}

impl fmt::Display for IntVector2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arithmetic() {
        let a = IntVector2::new(7, -3);
        let b = IntVector2::new(2, 5);
        assert_eq!(a + b, IntVector2::new(9, 2));
        assert_eq!(a - b, IntVector2::new(5, -8));
        assert_eq!(a * 4, IntVector2::new(28, -12));
        assert_eq!(a / 2, IntVector2::new(3, -1));
        assert_eq!(a % 2, IntVector2::new(1, -1));
        assert_eq!(a.abs(), IntVector2::new(7, 3));
    }

    #[test]
    fn test_div_floor_for_negative_positions() {
        let v = IntVector2::new(-1, -8);
        assert_eq!(v / 4, IntVector2::new(0, -2));
        assert_eq!(v.div_floor(4), IntVector2::new(-1, -2));
        assert_eq!(IntVector2::new(-5, 5).rem_euclid(4), IntVector2::new(3, 1));
    }

    #[test]
    fn test_comparison_requires_both_components() {
        let min = IntVector2::new(126, 126);
        let max = IntVector2::new(127, 127);

        assert!(IntVector2::new(126, 127) >= min);
        assert!(IntVector2::new(126, 127) <= max);

        let mixed = IntVector2::new(125, 127);
        assert!(!(mixed >= min));
        assert!(!(mixed <= min));
        assert_eq!(mixed.partial_cmp(&min), None);

        assert!(IntVector2::new(125, 125) < min);
        assert!(IntVector2::new(128, 127) > min);
    }

    #[test]
    fn test_conversions() {
        assert_eq!(IntVector2::floor_from(Vec2::new(-0.5, 3.9)), IntVector2::new(-1, 3));
        assert_eq!(Vec2::from(IntVector2::new(2, -4)), Vec2::new(2.0, -4.0));
        assert_eq!(IntVector2::new(1, 2).to_string(), "(1, 2)");
    }
}
