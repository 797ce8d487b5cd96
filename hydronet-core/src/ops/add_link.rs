use serde::{Deserialize, Serialize};

use crate::asset::{Asset, LinkAsset, LinkKind, NodeAsset, PipeProperties};
use crate::context::EditContext;
use crate::core::{AssetId, Position};
use crate::curve::Curve;
use crate::customer::CustomerPoint;
use crate::geometry::{is_near_position, is_same_route};
use crate::labels::LabelGenerator;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{
    ModelOperation, OperationError, SplitContext, SplitPipe, infer_node_is_active, pipe_to_split,
};

/// Adds a link between two nodes, creating the nodes as needed.
///
/// Nodes already in the model are passed as copies; new assets may carry
/// [`AssetId::NONE`] to be given fresh ids. Missing labels are generated.
/// The link's polyline is snapped to its nodes and vertices closer than a
/// meter to the previous one are dropped.
///
/// Either node may land on an existing pipe, which is then split there. When
/// both land on the same pipe, the stretch of pipe between them is replaced
/// by the new link, which inherits its hydraulic properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddLink {
    /// The link to add.
    pub link: LinkAsset,
    /// Its start node.
    pub start_node: NodeAsset,
    /// Its end node.
    pub end_node: NodeAsset,
    /// A pipe the start node splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pipe_id: Option<AssetId>,
    /// A pipe the end node splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_pipe_id: Option<AssetId>,
}

/// Which nodes split a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SplitAt {
    Start,
    End,
    Both,
}

impl AddLink {
    /// Creates the operation without pipe splits.
    #[must_use]
    pub fn new(link: LinkAsset, start_node: NodeAsset, end_node: NodeAsset) -> Self {
        Self {
            link,
            start_node,
            end_node,
            start_pipe_id: None,
            end_pipe_id: None,
        }
    }

    /// Returns the operation with the start node splitting `pipe`.
    #[must_use]
    pub fn splitting_start(mut self, pipe: AssetId) -> Self {
        self.start_pipe_id = Some(pipe);
        self
    }

    /// Returns the operation with the end node splitting `pipe`.
    #[must_use]
    pub fn splitting_end(mut self, pipe: AssetId) -> Self {
        self.end_pipe_id = Some(pipe);
        self
    }

    fn planned_splits<'m>(
        &self,
        model: &'m HydraulicModel,
    ) -> Result<Vec<(&'m LinkAsset, SplitAt)>, OperationError> {
        match (self.start_pipe_id, self.end_pipe_id) {
            (Some(start), Some(end)) if start == end => Ok(vec![(
                pipe_to_split(model, start, SplitContext::Pipe)?,
                SplitAt::Both,
            )]),
            (start, end) => {
                let mut plan = Vec::new();
                if let Some(id) = start {
                    plan.push((pipe_to_split(model, id, SplitContext::StartPipe)?, SplitAt::Start));
                }
                if let Some(id) = end {
                    plan.push((pipe_to_split(model, id, SplitContext::EndPipe)?, SplitAt::End));
                }
                Ok(plan)
            }
        }
    }

    /// Whether the new link takes part in the simulation.
    ///
    /// An explicitly inactive link stays inactive. A link between two
    /// isolated nodes starts a new, active network. Otherwise the link is
    /// active if either end reaches an active part of the network.
    fn infer_link_is_active(&self, model: &HydraulicModel) -> bool {
        if !self.link.is_active {
            return false;
        }
        let splits_active_pipe =
            |pipe: Option<AssetId>| pipe.and_then(|id| model.link(id)).is_some_and(|p| p.is_active);
        let is_orphan = |node: &NodeAsset, pipe: Option<AssetId>| {
            model.topology().degree(node.id) == 0 && pipe.is_none()
        };
        let has_active_links =
            |node: &NodeAsset| node.is_active && model.links_of(node.id).any(|l| l.is_active);

        if is_orphan(&self.start_node, self.start_pipe_id)
            && is_orphan(&self.end_node, self.end_pipe_id)
        {
            return true;
        }
        has_active_links(&self.start_node)
            || splits_active_pipe(self.start_pipe_id)
            || has_active_links(&self.end_node)
            || splits_active_pipe(self.end_pipe_id)
    }
}

/// Drops interior vertices within a meter of the previously kept one. The
/// end vertex replaces a kept vertex it is too close to.
fn remove_redundant_vertices(vertices: Vec<Position>) -> Vec<Position> {
    let (Some(&start), Some(&end)) = (vertices.first(), vertices.last()) else {
        return vertices;
    };
    if vertices.len() <= 2 {
        return vertices;
    }
    let mut result = vec![start];
    for &vertex in &vertices[1..vertices.len() - 1] {
        if result.last().is_none_or(|&last| !is_near_position(last, vertex)) {
            result.push(vertex);
        }
    }
    let last = result.len() - 1;
    if last >= 1 && is_near_position(result[last], end) {
        result[last] = end;
    } else {
        result.push(end);
    }
    result
}

/// Copies the hydraulic properties of a replaced pipe that `kind` shares.
fn inherit_pipe_properties(from: &PipeProperties, kind: &mut LinkKind) {
    match kind {
        LinkKind::Pipe(pipe) => {
            pipe.diameter = from.diameter;
            pipe.roughness = from.roughness;
            pipe.minor_loss = from.minor_loss;
            pipe.initial_status = from.initial_status;
        }
        LinkKind::Valve(valve) => {
            valve.diameter = from.diameter;
            valve.minor_loss = from.minor_loss;
        }
        LinkKind::Pump(_) => {}
    }
}

impl ModelOperation for AddLink {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        self.planned_splits(model).map(|_| ())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let plan = self.planned_splits(model)?;
        let link_is_active = self.infer_link_is_active(model);
        let (start_pipe, end_pipe) = (self.start_pipe_id, self.end_pipe_id);
        let AddLink {
            mut link,
            start_node: mut start,
            end_node: mut end,
            ..
        } = self;

        for id in [&mut link.id, &mut start.id, &mut end.id] {
            if id.is_none() {
                *id = context.builder.new_id();
            }
        }
        if link.label.is_empty() {
            link.label = context.labels.generate_for(link.link_type().into(), link.id);
        }
        for node in [&mut start, &mut end] {
            if node.label.is_empty() {
                node.label = context.labels.generate_for(node.node_type().into(), node.id);
            }
        }

        link.connections = [start.id, end.id];
        let mut coordinates = link.coordinates().to_vec();
        if coordinates.len() < 2 {
            coordinates = vec![start.coordinates, end.coordinates];
        } else {
            let last = coordinates.len() - 1;
            coordinates[0] = start.coordinates;
            coordinates[last] = end.coordinates;
        }
        link.set_coordinates(remove_redundant_vertices(coordinates), model.units().length)?;
        link.is_active = link_is_active;

        let pending: [Asset; 1] = [link.clone().into()];
        let node_is_active = |node: &NodeAsset, pipe: Option<AssetId>| match pipe {
            Some(id) => model.link(id).is_some_and(|p| p.is_active) || link_is_active,
            None => infer_node_is_active(model, node.id, &[], &pending),
        };
        start.is_active = node_is_active(&start, start_pipe);
        end.is_active = node_is_active(&end, end_pipe);

        let mut split_assets: Vec<Asset> = Vec::new();
        let mut delete_assets = Vec::new();
        let mut put_customer_points: Vec<CustomerPoint> = Vec::new();
        for (pipe, at) in plan {
            let splits = match at {
                SplitAt::Start => vec![start.clone()],
                SplitAt::End => vec![end.clone()],
                SplitAt::Both => vec![start.clone(), end.clone()],
            };
            let split = SplitPipe::new(pipe.clone(), splits).compute(model, context)?;
            split_assets.extend(split.put_assets);
            delete_assets.extend(split.delete_assets);
            put_customer_points.extend(split.put_customer_points);
        }

        let overlapping = split_assets.iter().position(|asset| {
            asset.as_pipe().is_some_and(|pipe| {
                pipe.id != link.id
                    && pipe.connects(start.id)
                    && pipe.connects(end.id)
                    && is_same_route(pipe.coordinates(), link.coordinates())
            })
        });
        if let Some(index) = overlapping {
            let replaced = split_assets.remove(index);
            if let Some(properties) = replaced.as_link().and_then(LinkAsset::pipe_properties) {
                inherit_pipe_properties(properties, &mut link.kind);
            }
            for point in &mut put_customer_points {
                if point.pipe_id() != Some(replaced.id()) {
                    continue;
                }
                if !link.is_pipe() {
                    *point = point.copy_disconnected();
                } else if let Some(connection) = &mut point.connection {
                    connection.pipe_id = link.id;
                }
            }
        }

        let mut put_curves = Vec::new();
        if let LinkKind::Pump(pump) = &mut link.kind {
            if pump.curve_id.is_none() {
                let curve_id = link.id.to_string();
                pump.curve_id = Some(curve_id.clone());
                put_curves.push(Curve::pump_stub(curve_id));
            }
        }

        let mut put_assets: Vec<Asset> = vec![link.into(), start.into(), end.into()];
        put_assets.extend(split_assets);
        Ok(Moment {
            note: Some(format!("Add {}", put_assets[0].asset_type())),
            put_assets,
            delete_assets,
            put_customer_points,
            put_curves,
            ..Moment::default()
        })
    }
}
