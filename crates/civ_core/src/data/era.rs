//! Ordered civilization eras.

use serde::{Deserialize, Serialize};

/// A stage of civilization progress.
///
/// Eras form a fixed total order and advancement is one-directional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Era {
    /// Stone age, the starting era.
    #[default]
    Stone,
    /// Bronze age.
    Bronze,
    /// Iron age.
    Iron,
    /// Industrial era.
    Industrial,
    /// Information era.
    Information,
    /// Space era.
    Space,
    /// Interstellar era.
    Interstellar,
    /// Hyperdimensional era, the final era.
    Hyperdimensional,
}

impl Era {
    /// All eras in progression order.
    pub const ALL: [Self; 8] = [
        Self::Stone,
        Self::Bronze,
        Self::Iron,
        Self::Industrial,
        Self::Information,
        Self::Space,
        Self::Interstellar,
        Self::Hyperdimensional,
    ];

    /// Zero-based position in the progression.
    #[must_use]
    pub const fn ordinal(self) -> u32 {
        self as u32
    }

    /// The era that follows this one, if any.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.ordinal() as usize + 1).copied()
    }

    /// Look up an era by ordinal.
    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        Self::ALL.get(ordinal as usize).copied()
    }

    /// Whether this is the last era.
    #[must_use]
    pub fn is_final(self) -> bool {
        self.next().is_none()
    }
}

impl std::fmt::Display for Era {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Stone => "stone",
            Self::Bronze => "bronze",
            Self::Iron => "iron",
            Self::Industrial => "industrial",
            Self::Information => "information",
            Self::Space => "space",
            Self::Interstellar => "interstellar",
            Self::Hyperdimensional => "hyperdimensional",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_order() {
        assert!(Era::Stone < Era::Bronze);
        assert_eq!(Era::Stone.ordinal(), 0);
        assert_eq!(Era::Hyperdimensional.ordinal(), 7);
        assert_eq!(Era::Stone.next(), Some(Era::Bronze));
        assert_eq!(Era::Hyperdimensional.next(), None);
        assert!(Era::Hyperdimensional.is_final());
    }

    #[test]
    fn test_from_ordinal() {
        assert_eq!(Era::from_ordinal(2), Some(Era::Iron));
        assert_eq!(Era::from_ordinal(8), None);
    }
}
