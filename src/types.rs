//! Domain-specific newtypes for type safety.
//!
//! Unit counts travel next to percentages everywhere in the FPY pipeline, so
//! they get their own type to keep the two from being mixed up. Uses
//! `derive_more` to eliminate arithmetic boilerplate.

use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use derive_more::{Add as DeriveAdd, From, Into};
use serde::{Deserialize, Serialize};

// ============================================================================
// UnitCount
// ============================================================================

/// A number of shipped units.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    DeriveAdd,
    From,
    Into,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct UnitCount(pub u64);

impl UnitCount {
    /// Create a new instance.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the inner value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Check if the value is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl AddAssign for UnitCount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sum for UnitCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), |acc, n| acc + n)
    }
}

impl fmt::Display for UnitCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u32> for UnitCount {
    fn from(value: u32) -> Self {
        Self(u64::from(value))
    }
}

// ============================================================================
// Yield
// ============================================================================

/// First-pass yield as a percentage in `[0, 100]`.
///
/// Zero units is a yield of 0, never NaN. The value is not rounded.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn first_pass_yield(first_pass: UnitCount, total: UnitCount) -> f64 {
    if total.is_zero() {
        0.0
    } else {
        100.0 * first_pass.get() as f64 / total.get() as f64
    }
}

/// Format a yield for display with one decimal place, e.g. `80.0%`.
#[must_use]
pub fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod unit_count {
        use super::*;

        #[test]
        fn basic_operations() {
            let count = UnitCount::new(42);
            assert_eq!(count.get(), 42);
            assert!(!count.is_zero());
            assert!(UnitCount::default().is_zero());
        }

        #[test]
        fn arithmetic() {
            let a = UnitCount::new(10);
            let b = UnitCount::new(5);
            assert_eq!(a + b, UnitCount::new(15));

            let mut c = UnitCount::new(10);
            c += UnitCount::new(3);
            assert_eq!(c, UnitCount::new(13));

            let total: UnitCount = [a, b, c].into_iter().sum();
            assert_eq!(total, UnitCount::new(28));
        }

        #[test]
        fn conversions() {
            let count: UnitCount = 42u64.into();
            let raw: u64 = count.into();
            assert_eq!(raw, 42);
            assert_eq!(UnitCount::from(7u32).get(), 7);
        }

        #[test]
        fn serde_is_transparent() {
            let json = serde_json::to_string(&UnitCount::new(12)).unwrap();
            assert_eq!(json, "12");
            let back: UnitCount = serde_json::from_str("12").unwrap();
            assert_eq!(back, UnitCount::new(12));
        }
    }

    mod yields {
        use super::*;

        #[test]
        fn eight_of_ten() {
            let fpy = first_pass_yield(UnitCount::new(8), UnitCount::new(10));
            assert!((fpy - 80.0).abs() < f64::EPSILON);
        }

        #[test]
        fn zero_units_is_zero() {
            let fpy = first_pass_yield(UnitCount::new(0), UnitCount::new(0));
            assert!(!fpy.is_nan());
            assert!(fpy.abs() < f64::EPSILON);
        }

        #[test]
        fn not_rounded() {
            let fpy = first_pass_yield(UnitCount::new(1), UnitCount::new(3));
            assert!((fpy - 100.0 / 3.0).abs() < 1e-12);
            assert_eq!(format_percent(fpy), "33.3%");
        }
    }
}
