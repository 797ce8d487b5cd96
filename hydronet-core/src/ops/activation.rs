//! Switching assets in and out of the simulation.

use fxhash::FxHashSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::context::EditContext;
use crate::core::AssetId;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError};

/// Fails on the first id that is not in the model.
fn check_ids(model: &HydraulicModel, ids: &[AssetId]) -> Result<(), OperationError> {
    match ids.iter().find(|&&id| model.asset(id).is_none()) {
        Some(&id) => Err(OperationError::InvalidAsset(id)),
        None => Ok(()),
    }
}

fn with_active(asset: &Asset, is_active: bool) -> Asset {
    let mut copy = asset.clone();
    copy.set_active(is_active);
    copy
}

/// Activates links along with their inactive endpoints.
///
/// Inactive isolated nodes are activated too; other node ids are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivateAssets {
    /// The assets to activate.
    pub asset_ids: Vec<AssetId>,
}

impl ActivateAssets {
    /// Creates the operation.
    #[must_use]
    pub fn new(asset_ids: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            asset_ids: asset_ids.into_iter().collect(),
        }
    }
}

impl ModelOperation for ActivateAssets {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        check_ids(model, &self.asset_ids)
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        self.verify(model)?;
        let mut updated: IndexMap<AssetId, Asset> = IndexMap::new();
        for &id in &self.asset_ids {
            let Some(asset) = model.asset(id) else {
                continue;
            };
            let endpoints = match asset {
                Asset::Link(link) => link.connections.to_vec(),
                Asset::Node(_) if model.topology().degree(id) == 0 => vec![id],
                Asset::Node(_) => continue,
            };
            for asset in std::iter::once(id)
                .chain(endpoints)
                .filter_map(|id| model.asset(id))
                .filter(|asset| !asset.is_active())
            {
                updated
                    .entry(asset.id())
                    .or_insert_with(|| with_active(asset, true));
            }
        }
        Ok(Moment {
            note: Some("Activate assets".to_string()),
            put_assets: updated.into_values().collect(),
            ..Moment::default()
        })
    }
}

/// Deactivates links, and their endpoints once no active link remains.
///
/// Node ids are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeactivateAssets {
    /// The assets to deactivate.
    pub asset_ids: Vec<AssetId>,
}

impl DeactivateAssets {
    /// Creates the operation.
    #[must_use]
    pub fn new(asset_ids: impl IntoIterator<Item = AssetId>) -> Self {
        Self {
            asset_ids: asset_ids.into_iter().collect(),
        }
    }
}

impl ModelOperation for DeactivateAssets {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        check_ids(model, &self.asset_ids)
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        self.verify(model)?;
        let mut put_assets = Vec::new();
        let mut deactivated = FxHashSet::default();
        let mut to_check: Vec<AssetId> = Vec::new();

        for link in self.asset_ids.iter().filter_map(|&id| model.link(id)) {
            if link.is_active && deactivated.insert(link.id) {
                put_assets.push(Asset::from(link.clone().with_active(false)));
            }
            for node in link.connections {
                if model.node(node).is_some_and(|n| n.is_active) && !to_check.contains(&node) {
                    to_check.push(node);
                }
            }
        }

        for node in to_check.into_iter().filter_map(|id| model.node(id)) {
            let keeps_active_link = model
                .links_of(node.id)
                .any(|l| l.is_active && !deactivated.contains(&l.id));
            if !keeps_active_link {
                put_assets.push(node.clone().with_active(false).into());
            }
        }

        Ok(Moment {
            note: Some("Deactivate assets".to_string()),
            put_assets,
            ..Moment::default()
        })
    }
}
