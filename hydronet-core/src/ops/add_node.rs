use serde::{Deserialize, Serialize};

use crate::asset::{Asset, NodeType};
use crate::context::EditContext;
use crate::core::{AssetId, Position};
use crate::labels::LabelGenerator;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError, SplitPipe};

/// Adds a node, optionally splitting a pipe at it.
///
/// The node inherits the activity of the pipe it splits and is active
/// otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddNode {
    /// Type of the new node.
    pub node_type: NodeType,
    /// Where to place it.
    pub coordinates: Position,
    /// Elevation, defaulting to the configured one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
    /// A pipe to split at the new node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipe_id_to_split: Option<AssetId>,
}

impl AddNode {
    /// Creates the operation.
    #[must_use]
    pub fn new(node_type: NodeType, coordinates: Position) -> Self {
        Self {
            node_type,
            coordinates,
            elevation: None,
            pipe_id_to_split: None,
        }
    }

    /// Returns the operation with the given elevation.
    #[must_use]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    /// Returns the operation splitting `pipe` at the new node.
    #[must_use]
    pub fn splitting(mut self, pipe: AssetId) -> Self {
        self.pipe_id_to_split = Some(pipe);
        self
    }
}

impl ModelOperation for AddNode {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
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
        let pipe = self.pipe_id_to_split.and_then(|id| model.pipe(id));

        let mut node = context.builder.node(self.node_type, self.coordinates);
        if let Some(elevation) = self.elevation {
            node.elevation = elevation;
        }
        node.is_active = pipe.is_none_or(|p| p.is_active);
        node.label = context.labels.generate_for(self.node_type.into(), node.id);

        let Some(pipe) = pipe else {
            return Ok(Moment {
                note: Some(format!("Add {}", self.node_type)),
                put_assets: vec![node.into()],
                ..Moment::default()
            });
        };
        let split = SplitPipe::new(pipe.clone(), [node.clone()]).compute(model, context)?;
        let mut put_assets: Vec<Asset> = vec![node.into()];
        put_assets.extend(split.put_assets);
        Ok(Moment {
            note: Some(format!("Add {} and split pipe", self.node_type)),
            put_assets,
            ..split
        })
    }
}
