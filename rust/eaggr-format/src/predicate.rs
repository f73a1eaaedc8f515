//! Spatial predicates the engine can evaluate between two shapes.

use eaggr_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

/// Topological relation tested between two shapes.
///
/// The semantics are defined by the engine; the discriminants are the
/// engine's analysis-type ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u32)]
pub enum Predicate {
    Contains = 0,
    CoveredBy = 1,
    Covers = 2,
    Crosses = 3,
    Disjoint = 4,
    Equals = 5,
    Intersects = 6,
    Overlaps = 7,
    Touches = 8,
    Within = 9,
}

impl Predicate {
    pub const ALL: [Predicate; 10] = [
        Predicate::Contains,
        Predicate::CoveredBy,
        Predicate::Covers,
        Predicate::Crosses,
        Predicate::Disjoint,
        Predicate::Equals,
        Predicate::Intersects,
        Predicate::Overlaps,
        Predicate::Touches,
        Predicate::Within,
    ];

    pub const fn as_raw(self) -> u32 {
        self as u32
    }

    pub fn from_raw(raw: u32) -> Result<Predicate> {
        Predicate::ALL
            .get(raw as usize)
            .copied()
            .ok_or_else(|| Error::invalid_arg("predicate", format!("unknown analysis type {raw}")))
    }

    /// The relation that holds with the operands swapped.
    pub const fn converse(self) -> Predicate {
        match self {
            Predicate::Contains => Predicate::Within,
            Predicate::Within => Predicate::Contains,
            Predicate::Covers => Predicate::CoveredBy,
            Predicate::CoveredBy => Predicate::Covers,
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_match_position() {
        for (ordinal, predicate) in Predicate::ALL.iter().enumerate() {
            assert_eq!(predicate.as_raw() as usize, ordinal);
            assert_eq!(Predicate::from_raw(ordinal as u32).unwrap(), *predicate);
        }
        assert!(Predicate::from_raw(10).is_err());
    }

    #[test]
    fn test_converse_is_involution() {
        for predicate in Predicate::ALL {
            assert_eq!(predicate.converse().converse(), predicate);
        }
        assert_eq!(Predicate::Equals.converse(), Predicate::Equals);
    }
}
