//! XSD Particle Schema Components
//!
//! Occurrence constraints (minOccurs, maxOccurs) for element particles.
//!
//! Reference: https://www.w3.org/TR/xmlschema11-1/#p

use crate::error::ParseError;

/// Occurrence bounds for a particle (minOccurs, maxOccurs)
/// None for max means unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    /// Minimum number of occurrences (default 1)
    pub min: u32,
    /// Maximum number of occurrences (None = unbounded, default 1)
    pub max: Option<u32>,
}

impl Occurs {
    /// Create new occurrence bounds
    pub fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Default occurrence (1, 1)
    pub fn once() -> Self {
        Self { min: 1, max: Some(1) }
    }

    /// Optional occurrence (0, 1)
    pub fn optional() -> Self {
        Self { min: 0, max: Some(1) }
    }

    /// Zero or more (0, unbounded)
    pub fn zero_or_more() -> Self {
        Self { min: 0, max: None }
    }

    /// One or more (1, unbounded)
    pub fn one_or_more() -> Self {
        Self { min: 1, max: None }
    }

    /// Check if this particle can be empty (minOccurs == 0)
    pub fn is_emptiable(&self) -> bool {
        self.min == 0
    }

    /// Check if particle can have multiple occurrences
    pub fn is_multiple(&self) -> bool {
        self.max.map_or(true, |max| max > 1)
    }

    /// Check if occurrence count is under the minimum
    pub fn is_missing(&self, count: u32) -> bool {
        count < self.min
    }

    /// Check if occurrence count is at or over the maximum
    pub fn is_over(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count >= max,
            None => false,
        }
    }

    /// Check if occurrence count exceeds the maximum
    pub fn is_exceeded(&self, count: u32) -> bool {
        match self.max {
            Some(max) => count > max,
            None => false,
        }
    }

    /// Consistency of the bounds themselves
    pub fn check(&self) -> Option<ParseError> {
        match self.max {
            Some(max) if max < self.min => Some(ParseError::new(format!(
                "maxOccurs ({}) must not be less than minOccurs ({})",
                max, self.min
            ))),
            _ => None,
        }
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self::once()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_bounds() {
        let once = Occurs::once();
        assert!(once.is_missing(0));
        assert!(!once.is_missing(1));
        assert!(once.is_over(1));
        assert!(once.is_exceeded(2));
        assert!(!once.is_multiple());

        let many = Occurs::zero_or_more();
        assert!(many.is_emptiable());
        assert!(many.is_multiple());
        assert!(!many.is_over(1000));

        assert!(Occurs::one_or_more().is_missing(0));
        assert!(Occurs::optional().is_over(1));
    }

    #[test]
    fn test_occurs_check() {
        assert!(Occurs::new(2, Some(5)).check().is_none());
        assert!(Occurs::new(0, None).check().is_none());
        assert!(Occurs::new(3, Some(1)).check().is_some());
    }
}
