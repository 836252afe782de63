//! How often a module's topic shows up in contests

use serde::{Deserialize, Serialize};

const LABELS: [&str; 5] = [
    "Has Not Appeared",
    "Rare",
    "Not Frequent",
    "Somewhat Frequent",
    "Very Frequent",
];

/// Frequency rating in `0..=4`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequency(u8);

impl Frequency {
    pub const MAX: u8 = 4;

    /// Returns `None` for ratings above [`Frequency::MAX`]
    pub fn new(value: u8) -> Option<Self> {
        (value <= Self::MAX).then_some(Self(value))
    }

    /// Narrow a front-matter integer, which may be negative or huge
    pub fn from_raw(value: i64) -> Option<Self> {
        u8::try_from(value).ok().and_then(Self::new)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn label(self) -> &'static str {
        LABELS[self.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(Frequency::new(0).unwrap().label(), "Has Not Appeared");
        assert_eq!(Frequency::new(4).unwrap().label(), "Very Frequent");
    }

    #[test]
    fn test_out_of_range() {
        assert!(Frequency::new(5).is_none());
    }

    #[test]
    fn test_from_raw() {
        assert_eq!(Frequency::from_raw(3).map(Frequency::value), Some(3));
        assert!(Frequency::from_raw(-1).is_none());
        assert!(Frequency::from_raw(300).is_none());
    }
}
