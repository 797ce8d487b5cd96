use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, LinkAsset, NodeAsset};
use crate::context::EditContext;
use crate::core::AssetId;
use crate::customer::CustomerPoint;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::reassign::{reconnect, snap_onto};
use super::{AddLink, ModelOperation, OperationError, infer_node_is_active};

/// Replaces a link by a redrawn one of the same type.
///
/// The new link is added as with [`AddLink`] and takes over the activity of
/// the old one. Customer points of a replaced pipe are re-snapped onto the
/// new pipe. Endpoints of the old link that the new one leaves behind have
/// their activity re-inferred.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceLink {
    /// The link to replace.
    pub source_link_id: AssetId,
    /// The redrawn link.
    pub new_link: LinkAsset,
    /// Start node of the redrawn link.
    pub start_node: NodeAsset,
    /// End node of the redrawn link.
    pub end_node: NodeAsset,
    /// A pipe the start node splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pipe_id: Option<AssetId>,
    /// A pipe the end node splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pipe_id: Option<AssetId>,
}

impl ReplaceLink {
    /// Creates the operation without pipe splits.
    #[must_use]
    pub fn new(
        source_link_id: AssetId,
        new_link: LinkAsset,
        start_node: NodeAsset,
        end_node: NodeAsset,
    ) -> Self {
        Self {
            source_link_id,
            new_link,
            start_node,
            end_node,
            start_pipe_id: None,
            end_pipe_id: None,
        }
    }

    fn source<'m>(&self, model: &'m HydraulicModel) -> Result<&'m LinkAsset, OperationError> {
        let source = model
            .link(self.source_link_id)
            .ok_or(OperationError::SourceLinkNotFound(self.source_link_id))?;
        if source.link_type() != self.new_link.link_type() {
            return Err(OperationError::LinkTypeMismatch {
                source_type: source.link_type(),
                new_type: self.new_link.link_type(),
            });
        }
        Ok(source)
    }

    fn into_add_link(self, is_active: bool) -> AddLink {
        AddLink {
            link: self.new_link.with_active(is_active),
            start_node: self.start_node,
            end_node: self.end_node,
            start_pipe_id: self.start_pipe_id,
            end_pipe_id: self.end_pipe_id,
        }
    }
}

impl ModelOperation for ReplaceLink {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        let source = self.source(model)?;
        self.clone().into_add_link(source.is_active).verify(model)
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let source = self.source(model)?;
        let mut moment = self.into_add_link(source.is_active).compute(model, context)?;
        let source_was_split = moment.delete_assets.contains(&source.id);

        // The added link and its nodes lead the put list
        let link = moment.put_assets.first().and_then(Asset::as_link);
        let endpoints = moment
            .put_assets
            .get(1)
            .and_then(Asset::as_node)
            .zip(moment.put_assets.get(2).and_then(Asset::as_node));
        let moved: Vec<CustomerPoint> = match link {
            Some(pipe) if source.is_pipe() && !source_was_split => model
                .customer_points_on(source.id)
                .map(|point| {
                    let snap_point = snap_onto(pipe.coordinates(), point.coordinates);
                    reconnect(point, pipe, endpoints, snap_point)
                })
                .collect(),
            _ => Vec::new(),
        };
        moment.put_customer_points.extend(moved);

        let left_behind: Vec<Asset> = source
            .connections
            .into_iter()
            .unique()
            .filter(|&id| moment.put_asset(id).is_none())
            .filter_map(|id| model.node(id))
            .filter_map(|node| {
                let is_active =
                    infer_node_is_active(model, node.id, &[source.id], &moment.put_assets);
                (is_active != node.is_active)
                    .then(|| Asset::from(node.clone().with_active(is_active)))
            })
            .collect();
        moment.put_assets.extend(left_behind);

        if !source_was_split {
            moment.delete_assets.push(source.id);
        }
        moment.note = Some(format!("Replace {}", source.link_type()));
        Ok(moment)
    }
}
