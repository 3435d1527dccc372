//! Conversion distance used to rank overload candidates

use std::fmt;

/// Compatibility score between a stack value and a candidate host type.
///
/// Lower is better. Two sentinels sit at the top of the scale:
///
/// ```text
/// 0            EXACT        value taken as-is (value proxy)
/// 1..          finite       natural or lossy conversions
/// u32::MAX-1   UNIVERSAL    accepted only by the generic top type
/// u32::MAX     INCOMPATIBLE no conversion exists
/// ```
///
/// Scores are only meaningful relative to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Distance(u32);

impl Distance {
    /// Best possible match
    pub const EXACT: Distance = Distance(0);

    /// Accepted, but only as a last resort
    pub const UNIVERSAL: Distance = Distance(u32::MAX - 1);

    /// No conversion exists
    pub const INCOMPATIBLE: Distance = Distance(u32::MAX);

    /// Create a finite distance
    ///
    /// Values that would collide with the sentinels are clamped below them.
    #[inline]
    pub const fn new(value: u32) -> Self {
        if value >= u32::MAX - 1 {
            Distance(u32::MAX - 2)
        } else {
            Distance(value)
        }
    }

    /// Raw score
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Whether a conversion exists at all
    #[inline]
    pub const fn is_compatible(self) -> bool {
        self.0 != u32::MAX
    }

    /// Whether only the generic fallback accepted the value
    #[inline]
    pub const fn is_universal(self) -> bool {
        self.0 == u32::MAX - 1
    }

    /// Sum per-argument distances into a candidate total.
    ///
    /// Any incompatible component makes the total incompatible; otherwise the
    /// sum saturates at [`Distance::UNIVERSAL`].
    pub fn saturating_add(self, other: Distance) -> Distance {
        if !self.is_compatible() || !other.is_compatible() {
            return Distance::INCOMPATIBLE;
        }
        Distance(self.0.saturating_add(other.0).min(u32::MAX - 1))
    }
}

impl fmt::Display for Distance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Distance::INCOMPATIBLE => f.write_str("incompatible"),
            Distance::UNIVERSAL => f.write_str("universal"),
            Distance(n) => write!(f, "{}", n),
        }
    }
}
