//! Fixed-point positions for planets and fleets.
//!
//! Spaceport selection compares distances, and the headless runner moves
//! fleets across the map. Both use fixed-point arithmetic so two runs of the
//! same scenario pick the same spaceport on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all positional math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole map coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Move toward `target` by at most `step` units.
    ///
    /// Returns the new position and whether the target was reached.
    #[must_use]
    pub fn step_towards(self, target: Self, step: Fixed) -> (Self, bool) {
        let dist_sq = self.distance_squared(target);
        if dist_sq <= step.saturating_mul(step) {
            return (target, true);
        }
        let len = fixed_sqrt(dist_sq);
        if len == Fixed::ZERO {
            return (target, true);
        }
        let dx = (target.x - self.x) / len;
        let dy = (target.y - self.y) / len;
        (Self::new(self.x + dx * step, self.y + dy * step), false)
    }
}

/// Computes the square root of a fixed-point number using binary search.
fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let mut low = Fixed::ZERO;
    let mut high = if value > Fixed::from_num(1) {
        value
    } else {
        Fixed::from_num(1)
    };

    for _ in 0..48 {
        let mid = (low + high) / Fixed::from_num(2);
        let mid_sq = mid.saturating_mul(mid);

        if mid_sq <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}
