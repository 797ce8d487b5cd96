//! Inference of node activity after structural changes.

use crate::asset::Asset;
use crate::core::AssetId;
use crate::model::HydraulicModel;

/// Whether `node` should be active once a change is applied.
///
/// The incident links are the model's links of `node` minus `excluded`, with
/// the links in `put_assets` replacing or adding to them. The node is active
/// when any of those links is active, or when there are none: an isolated
/// node is the start of a new network.
#[must_use]
pub fn infer_node_is_active(
    model: &HydraulicModel,
    node: AssetId,
    excluded: &[AssetId],
    put_assets: &[Asset],
) -> bool {
    let pending = put_assets
        .iter()
        .filter_map(Asset::as_link)
        .filter(|link| link.connects(node));
    let existing = model
        .links_of(node)
        .filter(|link| !excluded.contains(&link.id))
        .filter(|link| !put_assets.iter().any(|a| a.id() == link.id));

    let mut incident = existing.chain(pending).peekable();
    if incident.peek().is_none() {
        return true;
    }
    incident.any(|link| link.is_active)
}
