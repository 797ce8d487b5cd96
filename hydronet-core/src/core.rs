//! Definitions for the core identifiers used by a hydraulic model.
//!
//! These types are re-exported in the root of the crate.

use derive_more::{Display, From};

/// A stable handle to a node or link of a hydraulic model.
///
/// Identifiers are allocated by an [`IdGenerator`](crate::builder::IdGenerator)
/// and never reused while the model is alive. The value `0` is reserved and
/// means "no asset".
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    From,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(u32);

impl AssetId {
    /// The reserved identifier that never names an asset.
    pub const NONE: AssetId = AssetId(0);

    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Whether this is the reserved "no asset" identifier.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

/// A stable handle to a customer point.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    From,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct CustomerPointId(u32);

impl CustomerPointId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }
}

/// A geographic position as `[longitude, latitude]` in degrees.
pub type Position = [f64; 2];

/// The two endpoints of a link, `[start, end]`.
pub type Connections = [AssetId; 2];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reserved_id() {
        assert!(AssetId::NONE.is_none());
        assert!(AssetId::default().is_none());
        assert!(!AssetId::new(3).is_none());
        assert_eq!(AssetId::from(7).to_string(), "7");
    }

    #[test]
    fn ids_serialize_transparently() {
        let json = serde_json::to_string(&[AssetId::new(1), AssetId::new(22)]).unwrap();
        assert_eq!(json, "[1,22]");
        let back: CustomerPointId = serde_json::from_str("5").unwrap();
        assert_eq!(back, CustomerPointId::new(5));
    }
}
