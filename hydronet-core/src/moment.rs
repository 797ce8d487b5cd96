//! Moments: complete, self-describing change sets.
//!
//! Every model operation produces a [`Moment`] describing the assets,
//! customer points and curves to upsert or remove. Applying a moment to a
//! [`HydraulicModel`](crate::HydraulicModel) returns its inverse, and the pair
//! is recorded in a [`MomentLog`] for undo and redo.

mod log;

pub use log::{INIT_STATE_ID, LogEntry, MomentLog, Snapshot, StateId, StepMoment};

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::core::{AssetId, CustomerPointId};
use crate::curve::{Curve, CurveId};
use crate::customer::CustomerPoint;

/// A change set.
///
/// Applying a moment removes `delete_*` entries first, then upserts the
/// `put_*` entries. The lists carry no ordering constraints among themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Moment {
    /// Short human-readable description, e.g. `"Add pipe"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Assets to insert or replace.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub put_assets: Vec<Asset>,
    /// Assets to remove.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete_assets: Vec<AssetId>,
    /// Customer points to insert or replace.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub put_customer_points: Vec<CustomerPoint>,
    /// Customer points to remove.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete_customer_points: Vec<CustomerPointId>,
    /// Curves to insert or replace.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub put_curves: Vec<Curve>,
    /// Curves to remove.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub delete_curves: Vec<CurveId>,
}

impl Moment {
    /// An empty moment with a note.
    #[must_use]
    pub fn new(note: impl Into<String>) -> Self {
        Self {
            note: Some(note.into()),
            ..Self::default()
        }
    }

    /// Whether applying the moment would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.put_assets.is_empty()
            && self.delete_assets.is_empty()
            && self.put_customer_points.is_empty()
            && self.delete_customer_points.is_empty()
            && self.put_curves.is_empty()
            && self.delete_curves.is_empty()
    }

    /// Concatenates moments. The note is the first moment's.
    #[must_use]
    pub fn merge(moments: impl IntoIterator<Item = Moment>) -> Self {
        let mut moments = moments.into_iter();
        let Some(mut merged) = moments.next() else {
            return Self::default();
        };
        for moment in moments {
            merged.put_assets.extend(moment.put_assets);
            merged.delete_assets.extend(moment.delete_assets);
            merged.put_customer_points.extend(moment.put_customer_points);
            merged
                .delete_customer_points
                .extend(moment.delete_customer_points);
            merged.put_curves.extend(moment.put_curves);
            merged.delete_curves.extend(moment.delete_curves);
        }
        merged
    }

    /// The note, or an empty string.
    #[must_use]
    pub fn note(&self) -> &str {
        self.note.as_deref().unwrap_or_default()
    }

    /// Looks up an asset in `put_assets`.
    #[must_use]
    pub fn put_asset(&self, id: AssetId) -> Option<&Asset> {
        self.put_assets.iter().find(|a| a.id() == id)
    }

    /// Looks up a customer point in `put_customer_points`.
    #[must_use]
    pub fn put_customer_point(&self, id: CustomerPointId) -> Option<&CustomerPoint> {
        self.put_customer_points.iter().find(|cp| cp.id == id)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asset::NodeAsset;

    #[test]
    fn merging_keeps_first_note() {
        let mut first = Moment::new("first");
        first.delete_assets.push(AssetId::new(1));
        let mut second = Moment::new("second");
        second.delete_assets.push(AssetId::new(2));
        second
            .put_assets
            .push(NodeAsset::junction(AssetId::new(3), [0.0, 0.0]).into());

        let merged = Moment::merge([first, second]);
        assert_eq!(merged.note(), "first");
        assert_eq!(merged.delete_assets, [AssetId::new(1), AssetId::new(2)]);
        assert!(merged.put_asset(AssetId::new(3)).is_some());
        assert_eq!(Moment::merge([]), Moment::default());
    }

    #[test]
    fn emptiness() {
        assert!(Moment::new("Nothing").is_empty());
        let mut moment = Moment::default();
        moment.delete_curves.push("1".to_string());
        assert!(!moment.is_empty());
    }

    #[test]
    fn empty_lists_are_omitted() {
        let json = serde_json::to_string(&Moment::new("Delete assets")).unwrap();
        assert_eq!(json, r#"{"note":"Delete assets"}"#);
        let back: Moment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Moment::new("Delete assets"));
    }
}
