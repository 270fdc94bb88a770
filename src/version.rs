//! Format and API version gating

use serde::{Deserialize, Serialize};
use std::fmt;

/// Version of the on-disk header format.
///
/// Version 0 is the legacy format, where the deprecated `Position`, `Origin`,
/// `Rotation` and `Orientation` names are still folded into canonical storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileFormatVersion(pub u32);

impl FileFormatVersion {
    /// The legacy format version
    pub const LEGACY: Self = Self(0);

    /// Whether legacy aliases are honoured on read
    pub fn is_legacy(self) -> bool {
        self == Self::LEGACY
    }

    /// Whether this version is written to the header at all
    pub fn is_written(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for FileFormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for FileFormatVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Version of the in-memory accessor API.
///
/// Under API version 1 the deprecated accessors log a warning on every call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    /// API version whose callers are told about deprecated accessors
    pub const DEPRECATION_WARNINGS: Self = Self(1);

    /// Check whether deprecated accessors should warn
    pub fn warns_on_deprecated(self) -> bool {
        self == Self::DEPRECATION_WARNINGS
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ApiVersion {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_gating() {
        assert!(FileFormatVersion::default().is_legacy());
        assert!(!FileFormatVersion::default().is_written());
        assert!(!FileFormatVersion(1).is_legacy());
        assert!(FileFormatVersion(1).is_written());
    }

    #[test]
    fn test_deprecation_gating() {
        assert!(!ApiVersion(0).warns_on_deprecated());
        assert!(ApiVersion(1).warns_on_deprecated());
        assert!(!ApiVersion(2).warns_on_deprecated());
    }
}
