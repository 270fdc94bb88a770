//! Mnemonic enumerants: anatomical orientation and distance units
//!
//! Both are stored as enumerants and written as short mnemonics. Orientation
//! matches on a single character per axis; distance units match the whole
//! mnemonic exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Anatomical direction of one image axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AnatomicalOrientation {
    /// Right to left
    RightToLeft,
    /// Left to right
    LeftToRight,
    /// Anterior to posterior
    AnteriorToPosterior,
    /// Posterior to anterior
    PosteriorToAnterior,
    /// Superior to inferior
    SuperiorToInferior,
    /// Inferior to superior
    InferiorToSuperior,
    /// Direction not specified.
    #[default]
    Unknown,
}

/// Lookup table in enumerant order; `Unknown` is the sentinel at the end.
const ORIENTATION_TABLE: [(AnatomicalOrientation, &str); 7] = [
    (AnatomicalOrientation::RightToLeft, "RL"),
    (AnatomicalOrientation::LeftToRight, "LR"),
    (AnatomicalOrientation::AnteriorToPosterior, "AP"),
    (AnatomicalOrientation::PosteriorToAnterior, "PA"),
    (AnatomicalOrientation::SuperiorToInferior, "SI"),
    (AnatomicalOrientation::InferiorToSuperior, "IS"),
    (AnatomicalOrientation::Unknown, "??"),
];

impl AnatomicalOrientation {
    /// Two-letter mnemonic
    pub fn name(self) -> &'static str {
        ORIENTATION_TABLE
            .iter()
            .find(|(o, _)| *o == self)
            .map(|(_, name)| *name)
            .unwrap_or("??")
    }

    /// Character written for this axis in an acronym such as `RAS`
    pub fn acronym_char(self) -> char {
        self.name().chars().next().unwrap_or('?')
    }

    /// Match one acronym character against the first letter of each mnemonic.
    pub fn from_char(c: char) -> Self {
        ORIENTATION_TABLE
            .iter()
            .find(|(_, name)| name.starts_with(c))
            .map(|(o, _)| *o)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for AnatomicalOrientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Physical units of offsets and spacings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceUnits {
    #[default]
    /// Units are not specified.
    Unknown,
    /// Micrometers
    Micrometer,
    /// Millimeters
    Millimeter,
    /// Centimeters
    Centimeter,
}

const DISTANCE_UNITS_TABLE: [(DistanceUnits, &str); 4] = [
    (DistanceUnits::Unknown, "?"),
    (DistanceUnits::Micrometer, "um"),
    (DistanceUnits::Millimeter, "mm"),
    (DistanceUnits::Centimeter, "cm"),
];

impl DistanceUnits {
    /// Mnemonic written to the header
    pub fn name(self) -> &'static str {
        DISTANCE_UNITS_TABLE
            .iter()
            .find(|(u, _)| *u == self)
            .map(|(_, name)| *name)
            .unwrap_or("?")
    }

    /// Exact mnemonic match; anything else is `Unknown`.
    pub fn from_name(name: &str) -> Self {
        DISTANCE_UNITS_TABLE
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(u, _)| *u)
            .unwrap_or(Self::Unknown)
    }
}

impl fmt::Display for DistanceUnits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
