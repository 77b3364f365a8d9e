//! Review rating value type
//!
//! Ratings live on a 0.0 to 5.0 scale in half-point steps. They are stored as
//! a count of half points so that comparisons (notably "is this the maximum
//! rating") never depend on floating point equality.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A review rating in half-point steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(u8);

impl Rating {
    /// Number of half points in one whole point
    const STEPS_PER_POINT: u8 = 2;

    /// Lowest representable rating
    pub const MIN: Rating = Rating(0);

    /// Highest representable rating (5.0)
    pub const MAX: Rating = Rating(10);

    /// Create a rating from its half-point count, rejecting values above [`Rating::MAX`]
    pub fn from_half_points(half_points: u8) -> Result<Self> {
        if half_points > Self::MAX.0 {
            return Err(Error::InvalidRating(
                half_points as f64 / Self::STEPS_PER_POINT as f64,
            ));
        }
        Ok(Self(half_points))
    }

    /// Create a rating from a decimal value such as `4.5`
    pub fn from_f64(value: f64) -> Result<Self> {
        let scaled = value * Self::STEPS_PER_POINT as f64;
        if !scaled.is_finite() || scaled < 0.0 || scaled.fract() != 0.0 {
            return Err(Error::InvalidRating(value));
        }
        if scaled > Self::MAX.0 as f64 {
            return Err(Error::InvalidRating(value));
        }
        Ok(Self(scaled as u8))
    }

    /// Get the rating as a count of half points
    pub fn half_points(&self) -> u8 {
        self.0
    }

    /// Get the rating as a decimal value
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / Self::STEPS_PER_POINT as f64
    }

    /// Whether this is the highest rating the scale allows
    pub fn is_max(&self) -> bool {
        *self == Self::MAX
    }
}

impl TryFrom<f64> for Rating {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        Self::from_f64(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> f64 {
        rating.as_f64()
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.as_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_steps_accepted() {
        assert_eq!(Rating::from_f64(4.5).unwrap().half_points(), 9);
        assert_eq!(Rating::from_f64(0.0).unwrap(), Rating::MIN);
        assert!(Rating::from_f64(5.0).unwrap().is_max());
    }

    #[test]
    fn test_off_step_and_out_of_range_rejected() {
        assert!(Rating::from_f64(4.3).is_err());
        assert!(Rating::from_f64(5.5).is_err());
        assert!(Rating::from_f64(-0.5).is_err());
        assert!(Rating::from_f64(f64::NAN).is_err());
        assert!(Rating::from_half_points(11).is_err());
    }

    #[test]
    fn test_ron_uses_decimal_form() {
        let rating: Rating = ron::from_str("3.5").unwrap();
        assert_eq!(rating.half_points(), 7);
        assert_eq!(rating.to_string(), "3.5");
        assert!(ron::from_str::<Rating>("3.7").is_err());
    }
}
