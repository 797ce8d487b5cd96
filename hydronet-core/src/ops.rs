//! Structural edits of a hydraulic model.
//!
//! Each operation is a plain struct of parameters implementing
//! [`ModelOperation`]. Computing an operation reads the model and returns a
//! [`Moment`] describing the change; nothing is mutated until the moment is
//! applied with [`HydraulicModel::apply`].
//!
//! Operations may be combined: [`AddLink`] runs a [`SplitPipe`] for every pipe
//! its endpoints land on, and [`ReplaceLink`] is an [`AddLink`] followed by
//! the cleanup of the replaced link.

mod activation;
mod active_topology;
mod add_link;
mod add_node;
mod customers;
mod delete_assets;
mod merge_nodes;
mod move_node;
mod pump_curve;
mod reassign;
mod replace_link;
mod replace_node;
mod reverse_link;
mod split_pipe;

pub use activation::{ActivateAssets, DeactivateAssets};
pub use active_topology::infer_node_is_active;
pub use add_link::AddLink;
pub use add_node::AddNode;
pub use customers::{ConnectCustomers, DisconnectCustomers};
pub use delete_assets::DeleteAssets;
pub use merge_nodes::MergeNodes;
pub use move_node::MoveNode;
pub use pump_curve::{ChangePumpCurve, PumpCurvePoint, PumpDefinition};
pub use reassign::find_junction_for_customer_point;
pub use replace_link::ReplaceLink;
pub use replace_node::ReplaceNode;
pub use reverse_link::ReverseLink;
pub use split_pipe::SplitPipe;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::asset::{AssetError, AssetType, LinkAsset, LinkType};
use crate::context::EditContext;
use crate::core::{AssetId, CustomerPointId};
use crate::model::HydraulicModel;
use crate::moment::Moment;

/// An edit that can be computed against a model.
pub trait ModelOperation {
    /// Checks whether the operation would succeed on `model`.
    ///
    /// If this call succeeds, [`ModelOperation::compute`] also succeeds on
    /// the same model. If it fails, `compute` fails with the same error.
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError>;

    /// Computes the moment that performs the edit.
    ///
    /// Fresh ids and labels are drawn from `context`. The model is left
    /// untouched.
    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError>;
}

/// Which end of a new link is being connected to an existing pipe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum SplitContext {
    /// The start node splits a pipe.
    #[strum(serialize = "Start pipe")]
    StartPipe,
    /// The end node splits a pipe.
    #[strum(serialize = "End pipe")]
    EndPipe,
    /// Both nodes split the same pipe.
    #[strum(serialize = "Pipe")]
    Pipe,
}

impl SplitContext {
    fn lowercase(self) -> String {
        self.to_string().to_lowercase()
    }
}

/// Error computing a model operation.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum OperationError {
    /// A pipe to split does not exist.
    #[error("{context} not found: {id} (asset does not exist)")]
    SplitPipeNotFound {
        /// Role of the pipe.
        context: SplitContext,
        /// The missing id.
        id: AssetId,
    },
    /// A pipe to split is another kind of asset.
    #[error("Invalid {} ID: {id} (found {found} instead of pipe)", .context.lowercase())]
    SplitPipeNotAPipe {
        /// Role of the pipe.
        context: SplitContext,
        /// The offending id.
        id: AssetId,
        /// Type of the asset found instead.
        found: AssetType,
    },
    /// A pipe split without split nodes.
    #[error("At least one split is required")]
    NoSplits,
    /// The source of a merge is not a node.
    #[error("Invalid source node ID: {0}")]
    InvalidSourceNode(AssetId),
    /// The target of a merge is not a node.
    #[error("Invalid target node ID: {0}")]
    InvalidTargetNode(AssetId),
    /// The id does not reference a node.
    #[error("Invalid node ID: {0}")]
    InvalidNode(AssetId),
    /// The id does not reference a pipe.
    #[error("Invalid pipe ID: {0}")]
    InvalidPipe(AssetId),
    /// The id does not reference a link.
    #[error("Invalid link ID: {0}")]
    InvalidLink(AssetId),
    /// The id does not reference an asset.
    #[error("Invalid asset id {0}")]
    InvalidAsset(AssetId),
    /// The id does not reference a pump.
    #[error("Invalid pump id {0}")]
    InvalidPump(AssetId),
    /// The link to replace does not exist.
    #[error("Source link with id {0} not found")]
    SourceLinkNotFound(AssetId),
    /// A link can only be replaced by one of the same type.
    #[error("Link types must match: source is {source_type}, new is {new_type}")]
    LinkTypeMismatch {
        /// Type of the replaced link.
        source_type: LinkType,
        /// Type of the replacement.
        new_type: LinkType,
    },
    /// The customer point does not exist.
    #[error("Customer point with id {0} not found")]
    CustomerPointNotFound(CustomerPointId),
    /// Customer points and snap points are paired one to one.
    #[error("Customer point IDs and snap points arrays must have the same length")]
    SnapPointCountMismatch,
    /// The pipe to connect customers to does not exist.
    #[error("Pipe with id {0} not found")]
    PipeNotFound(AssetId),
    /// The start node of a pipe is missing.
    #[error("Start node {node} not found for pipe {pipe}")]
    StartNodeNotFound {
        /// The missing node.
        node: AssetId,
        /// The pipe.
        pipe: AssetId,
    },
    /// The end node of a pipe is missing.
    #[error("End node {node} not found for pipe {pipe}")]
    EndNodeNotFound {
        /// The missing node.
        node: AssetId,
        /// The pipe.
        pipe: AssetId,
    },
    /// Neither end of the pipe is a junction.
    #[error("No junction found to connect customer point {point} to pipe {pipe}")]
    NoJunction {
        /// The customer point.
        point: CustomerPointId,
        /// The pipe.
        pipe: AssetId,
    },
    /// A link geometry could not be built.
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// Looks up the pipe to split at one end of a new link.
pub(crate) fn pipe_to_split(
    model: &HydraulicModel,
    id: AssetId,
    context: SplitContext,
) -> Result<&LinkAsset, OperationError> {
    let asset = model
        .asset(id)
        .ok_or(OperationError::SplitPipeNotFound { context, id })?;
    asset
        .as_pipe()
        .ok_or_else(|| OperationError::SplitPipeNotAPipe {
            context,
            id,
            found: asset.asset_type(),
        })
}

/// Any model operation, as read from an edit script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_more::From)]
#[serde(tag = "operation", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Operation {
    /// See [`AddLink`].
    AddLink(AddLink),
    /// See [`AddNode`].
    AddNode(AddNode),
    /// See [`DeleteAssets`].
    DeleteAssets(DeleteAssets),
    /// See [`MergeNodes`].
    MergeNodes(MergeNodes),
    /// See [`ReplaceNode`].
    ReplaceNode(ReplaceNode),
    /// See [`ReplaceLink`].
    ReplaceLink(ReplaceLink),
    /// See [`MoveNode`].
    MoveNode(MoveNode),
    /// See [`ReverseLink`].
    ReverseLink(ReverseLink),
    /// See [`ActivateAssets`].
    ActivateAssets(ActivateAssets),
    /// See [`DeactivateAssets`].
    DeactivateAssets(DeactivateAssets),
    /// See [`ConnectCustomers`].
    ConnectCustomers(ConnectCustomers),
    /// See [`DisconnectCustomers`].
    DisconnectCustomers(DisconnectCustomers),
    /// See [`ChangePumpCurve`].
    ChangePumpCurve(ChangePumpCurve),
}

macro_rules! dispatch {
    ($self:expr, $op:ident => $body:expr) => {
        match $self {
            Operation::AddLink($op) => $body,
            Operation::AddNode($op) => $body,
            Operation::DeleteAssets($op) => $body,
            Operation::MergeNodes($op) => $body,
            Operation::ReplaceNode($op) => $body,
            Operation::ReplaceLink($op) => $body,
            Operation::MoveNode($op) => $body,
            Operation::ReverseLink($op) => $body,
            Operation::ActivateAssets($op) => $body,
            Operation::DeactivateAssets($op) => $body,
            Operation::ConnectCustomers($op) => $body,
            Operation::DisconnectCustomers($op) => $body,
            Operation::ChangePumpCurve($op) => $body,
        }
    };
}

impl ModelOperation for Operation {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        dispatch!(self, op => op.verify(model))
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        dispatch!(self, op => op.compute(model, context))
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use crate::asset::{Asset, NodeAsset};
    use crate::builder::NetworkBuilder;
    use crate::config::ModelConfig;
    use crate::core::Position;
    use rstest::fixture;

    pub(crate) const J1: AssetId = AssetId::new(1);
    pub(crate) const J2: AssetId = AssetId::new(2);
    pub(crate) const J3: AssetId = AssetId::new(3);
    pub(crate) const P1: AssetId = AssetId::new(4);
    pub(crate) const P2: AssetId = AssetId::new(5);

    /// `J1 --P1-- J2 --P2-- J3` along the equator, 0.001 degrees apart.
    #[fixture]
    pub(crate) fn line() -> HydraulicModel {
        NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .junction(J2, [0.001, 0.0])
            .junction(J3, [0.002, 0.0])
            .pipe(P1, J1, J2)
            .pipe(P2, J2, J3)
            .build()
            .unwrap()
    }

    pub(crate) fn context(model: &HydraulicModel) -> EditContext {
        EditContext::for_model(model, &ModelConfig::default())
    }

    /// Computes and applies an operation, checking the result against the
    /// model invariants.
    pub(crate) fn run(
        model: &mut HydraulicModel,
        context: &mut EditContext,
        op: impl ModelOperation,
    ) -> Moment {
        let moment = op.compute(model, context).unwrap();
        model.apply(&moment, &mut context.labels);
        model.validate().unwrap();
        moment
    }

    /// Asserts two positions agree to well below a millimetre.
    #[track_caller]
    pub(crate) fn assert_near(actual: Position, expected: Position) {
        let close = actual
            .iter()
            .zip(expected)
            .all(|(a, e)| (a - e).abs() < 1e-12);
        assert!(close, "{actual:?} is not near {expected:?}");
    }

    pub(crate) fn put_node(moment: &Moment, id: AssetId) -> &NodeAsset {
        moment.put_asset(id).and_then(Asset::as_node).unwrap()
    }

    pub(crate) fn put_link(moment: &Moment, id: AssetId) -> &LinkAsset {
        moment.put_asset(id).and_then(Asset::as_link).unwrap()
    }

    #[test]
    fn split_errors_name_the_context() {
        let model = line();
        assert_eq!(
            pipe_to_split(&model, AssetId::new(99), SplitContext::StartPipe)
                .unwrap_err()
                .to_string(),
            "Start pipe not found: 99 (asset does not exist)"
        );
        assert_eq!(
            pipe_to_split(&model, J2, SplitContext::EndPipe)
                .unwrap_err()
                .to_string(),
            "Invalid end pipe ID: 2 (found junction instead of pipe)"
        );
        assert_eq!(pipe_to_split(&model, P1, SplitContext::Pipe).map(|p| p.id), Ok(P1));
    }

    #[test]
    fn scripts_deserialize() {
        let script = r#"[
            {"operation": "delete_assets", "asset_ids": [4]},
            {"operation": "merge_nodes", "source_node_id": 1, "target_node_id": 2},
            {"operation": "reverse_link", "link_id": 5}
        ]"#;
        let ops: Vec<Operation> = serde_json::from_str(script).unwrap();
        assert_eq!(
            ops[0],
            Operation::DeleteAssets(DeleteAssets::new([P1]))
        );
        assert_eq!(ops[2], ReverseLink::new(P2).into());

        let mut model = line();
        let mut context = context(&model);
        for op in ops {
            run(&mut model, &mut context, op);
        }
        assert_eq!(model.links().count(), 1);
        assert_eq!(model.link(P2).map(|l| l.connections), Some([J3, J1]));
    }
}
