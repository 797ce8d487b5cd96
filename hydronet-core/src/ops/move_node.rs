use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::context::EditContext;
use crate::core::{AssetId, Position};
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::reassign::{UpdatedCustomerPoints, reassign_customer_points};
use super::{ModelOperation, OperationError, SplitPipe};

/// Moves a node, dragging the ends of its links along.
///
/// Optionally re-snaps the customer points of the incident pipes, and splits
/// a pipe at the node's new position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveNode {
    /// The node to move.
    pub node_id: AssetId,
    /// Where it goes.
    pub new_coordinates: Position,
    /// New elevation, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_elevation: Option<f64>,
    /// Whether customer points of incident pipes are re-snapped.
    #[serde(default)]
    pub should_update_customer_points: bool,
    /// A pipe to split at the new position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_id_to_split: Option<AssetId>,
}

impl MoveNode {
    /// Creates the operation.
    #[must_use]
    pub fn new(node_id: AssetId, new_coordinates: Position) -> Self {
        Self {
            node_id,
            new_coordinates,
            new_elevation: None,
            should_update_customer_points: false,
            pipe_id_to_split: None,
        }
    }

    /// Returns the operation setting the elevation too.
    #[must_use]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.new_elevation = Some(elevation);
        self
    }

    /// Returns the operation re-snapping customer points.
    #[must_use]
    pub fn updating_customer_points(mut self) -> Self {
        self.should_update_customer_points = true;
        self
    }

    /// Returns the operation splitting `pipe` at the new position.
    #[must_use]
    pub fn splitting(mut self, pipe: AssetId) -> Self {
        self.pipe_id_to_split = Some(pipe);
        self
    }
}

impl ModelOperation for MoveNode {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        if model.node(self.node_id).is_none() {
            return Err(OperationError::InvalidNode(self.node_id));
        }
        match self.pipe_id_to_split {
            Some(id) if model.pipe(id).is_none() => Err(OperationError::InvalidPipe(id)),
            _ => Ok(()),
        }
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        self.verify(model)?;
        let node = model
            .node(self.node_id)
            .ok_or(OperationError::InvalidNode(self.node_id))?;

        let mut moved = node.clone();
        moved.coordinates = self.new_coordinates;
        if let Some(elevation) = self.new_elevation {
            moved.elevation = elevation;
        }

        let unit = model.units().length;
        let mut put_assets: Vec<Asset> = vec![moved.clone().into()];
        let mut customer_points = UpdatedCustomerPoints::new();
        for link in model.links_of(node.id) {
            let mut copy = link.clone();
            copy.move_endpoint(node.coordinates, self.new_coordinates, unit)?;
            if self.should_update_customer_points && copy.is_pipe() {
                reassign_customer_points(model, &copy, &moved, &mut customer_points);
            }
            put_assets.push(copy.into());
        }

        let moment = Moment {
            note: Some("Move node".to_string()),
            put_assets,
            put_customer_points: customer_points.into_values().collect(),
            ..Moment::default()
        };
        let Some(pipe) = self.pipe_id_to_split.and_then(|id| model.pipe(id)) else {
            return Ok(moment);
        };

        let split = SplitPipe::new(pipe.clone(), [moved]).compute(model, context)?;
        let mut merged = Moment::merge([moment, split]);
        let deleted = &merged.delete_assets;
        merged.put_assets.retain(|asset| !deleted.contains(&asset.id()));
        // Points on the split pipe take their segment, later entries winning
        let points: IndexMap<_, _> = merged
            .put_customer_points
            .drain(..)
            .map(|point| (point.id, point))
            .collect();
        merged.put_customer_points = points.into_values().collect();
        merged.note = Some("Move node and split pipe".to_string());
        Ok(merged)
    }
}
