use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::context::EditContext;
use crate::core::{AssetId, CustomerPointId};
use crate::customer::CustomerPoint;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError, infer_node_is_active};

/// Deletes assets. Deleting a node also deletes its links.
///
/// Nodes left behind at the end of a deleted link have their activity
/// re-inferred and are only part of the moment when it changes. Unknown ids
/// are carried through and ignored when the moment is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteAssets {
    /// The assets to delete.
    pub asset_ids: Vec<AssetId>,
    /// Whether customer points on deleted pipes are disconnected.
    #[serde(default)]
    pub should_update_customer_points: bool,
}

impl DeleteAssets {
    /// Creates the operation, leaving customer points alone.
    #[must_use]
    pub fn new(asset_ids: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            asset_ids: asset_ids.into_iter().collect(),
            should_update_customer_points: false,
        }
    }

    /// Returns the operation disconnecting the customer points of deleted
    /// pipes.
    #[must_use]
    pub fn updating_customer_points(mut self) -> Self {
        self.should_update_customer_points = true;
        self
    }
}

impl ModelOperation for DeleteAssets {
    fn verify(&self, _model: &HydraulicModel) -> Result<(), OperationError> {
        Ok(())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let mut affected: IndexSet<AssetId> = self.asset_ids.iter().copied().collect();
        for &id in &self.asset_ids {
            affected.extend(model.topology().links(id));
        }

        let mut disconnected: IndexMap<CustomerPointId, CustomerPoint> = IndexMap::new();
        if self.should_update_customer_points {
            for id in affected.iter().filter(|&&id| model.pipe(id).is_some()) {
                for point in model.customer_points_on(*id) {
                    disconnected
                        .entry(point.id)
                        .or_insert_with(|| point.copy_disconnected());
                }
            }
        }

        let excluded: Vec<AssetId> = affected.iter().copied().collect();
        let boundary: IndexSet<AssetId> = affected
            .iter()
            .filter_map(|&id| model.link(id))
            .flat_map(|link| link.connections)
            .filter(|node| !affected.contains(node))
            .collect();
        let put_assets: Vec<Asset> = boundary
            .into_iter()
            .filter_map(|id| model.node(id))
            .filter_map(|node| {
                let is_active = infer_node_is_active(model, node.id, &excluded, &[]);
                (is_active != node.is_active)
                    .then(|| Asset::from(node.clone().with_active(is_active)))
            })
            .collect();

        Ok(Moment {
            note: Some("Delete assets".to_string()),
            put_assets,
            delete_assets: excluded,
            put_customer_points: disconnected.into_values().collect(),
            ..Moment::default()
        })
    }
}
