//! Mutable state threaded through model operations.

use crate::builder::{AssetBuilder, IdGenerator};
use crate::config::ModelConfig;
use crate::labels::LabelManager;
use crate::model::HydraulicModel;

/// The id generator and label registry operations draw from.
///
/// Operations only read the model, but they allocate ids and labels for the
/// assets they create. Those allocations survive a failed operation, which
/// at worst leaves gaps in the numbering.
#[derive(Debug, Clone, Default)]
pub struct EditContext {
    /// Creates assets with fresh ids and configured defaults.
    pub builder: AssetBuilder,
    /// Labels in use, by asset type.
    pub labels: LabelManager,
}

impl EditContext {
    /// A context for an empty model.
    #[must_use]
    pub fn new(config: &ModelConfig) -> Self {
        Self {
            builder: AssetBuilder::new(config.units, config.defaults.clone(), IdGenerator::new()),
            labels: LabelManager::new(),
        }
    }

    /// A context for editing `model`: ids are allocated after the largest one
    /// in use and every label of the model is registered. The model's units
    /// take precedence over the configured ones.
    #[must_use]
    pub fn for_model(model: &HydraulicModel, config: &ModelConfig) -> Self {
        let ids = IdGenerator::starting_after(model.max_asset_id());
        let mut labels = LabelManager::new();
        for asset in model.assets().filter(|a| !a.label().is_empty()) {
            labels.register(asset.label(), asset.asset_type(), asset.id());
        }
        Self {
            builder: AssetBuilder::new(model.units(), config.defaults.clone(), ids),
            labels,
        }
    }
}
