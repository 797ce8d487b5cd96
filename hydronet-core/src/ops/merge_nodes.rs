use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetError, LinkAsset, NodeAsset, NodeType};
use crate::config::LengthUnit;
use crate::context::EditContext;
use crate::core::{AssetId, Position};
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::reassign::{UpdatedCustomerPoints, reassign_customer_points};
use super::{ModelOperation, OperationError};

/// Merges two nodes into one at the target's position.
///
/// The source survives unless it is a junction merged into a tank or a
/// reservoir. The survivor takes the target's coordinates and elevation, and
/// two junctions add up their base demands. Links of the removed node are
/// rewired to the survivor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeNodes {
    /// The node being dragged.
    pub source_node_id: AssetId,
    /// The node it is dropped on.
    pub target_node_id: AssetId,
}

impl MergeNodes {
    /// Creates the operation.
    #[must_use]
    pub fn new(source_node_id: AssetId, target_node_id: AssetId) -> Self {
        Self {
            source_node_id,
            target_node_id,
        }
    }

    fn nodes<'m>(
        &self,
        model: &'m HydraulicModel,
    ) -> Result<(&'m NodeAsset, &'m NodeAsset), OperationError> {
        let source = model
            .node(self.source_node_id)
            .ok_or(OperationError::InvalidSourceNode(self.source_node_id))?;
        let target = model
            .node(self.target_node_id)
            .ok_or(OperationError::InvalidTargetNode(self.target_node_id))?;
        Ok((source, target))
    }
}

/// Moves the vertex of each end of `link` connected to `node`.
pub(super) fn move_connected_ends(
    link: &mut LinkAsset,
    node: AssetId,
    to: Position,
    unit: LengthUnit,
) -> Result<(), AssetError> {
    let mut coordinates = link.coordinates().to_vec();
    let last = coordinates.len().saturating_sub(1);
    if link.start() == node {
        coordinates[0] = to;
    }
    if link.end() == node {
        coordinates[last] = to;
    }
    link.set_coordinates(coordinates, unit)
}

/// Replaces `from` by `to` in the connections of `link`.
pub(super) fn rewire(link: &mut LinkAsset, from: AssetId, to: AssetId) {
    for end in &mut link.connections {
        if *end == from {
            *end = to;
        }
    }
}

impl ModelOperation for MergeNodes {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        self.nodes(model).map(|_| ())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let (source, target) = self.nodes(model)?;
        let target_has_priority = matches!(target.node_type(), NodeType::Reservoir | NodeType::Tank)
            && source.is_junction();
        let (winner, loser) = if target_has_priority {
            (target, source)
        } else {
            (source, target)
        };

        let mut merged = winner.clone();
        merged.coordinates = target.coordinates;
        merged.elevation = target.elevation;
        if let (Some(kept), Some(added)) = (winner.base_demand(), loser.base_demand()) {
            merged.set_base_demand(kept + added);
        }

        let unit = model.units().length;
        let mut links: IndexMap<AssetId, LinkAsset> = IndexMap::new();
        for link in model.links_of(winner.id) {
            let mut copy = link.clone();
            move_connected_ends(&mut copy, winner.id, target.coordinates, unit)?;
            links.insert(copy.id, copy);
        }
        for link in model.links_of(loser.id) {
            let mut copy = link.clone();
            rewire(&mut copy, loser.id, winner.id);
            move_connected_ends(&mut copy, winner.id, target.coordinates, unit)?;
            links.insert(copy.id, copy);
        }

        let mut customer_points = UpdatedCustomerPoints::new();
        for pipe in links.values().filter(|l| l.is_pipe()) {
            reassign_customer_points(model, pipe, &merged, &mut customer_points);
        }

        merged.is_active = links.is_empty() || links.values().any(|l| l.is_active);
        let note = format!("Merge {} into {}", loser.node_type(), winner.node_type());
        let mut put_assets: Vec<Asset> = vec![merged.into()];
        put_assets.extend(links.into_values().map(Asset::from));
        Ok(Moment {
            note: Some(note),
            put_assets,
            delete_assets: vec![loser.id],
            put_customer_points: customer_points.into_values().collect(),
            ..Moment::default()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::core::CustomerPointId;
    use crate::ops::test::{
        J1, J2, J3, P1, P2, assert_near, context, line, put_link, put_node, run,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn junction_demands_add_up() {
        let mut model = NetworkBuilder::new()
            .node(NodeAsset::junction(J1, [0.0, 0.0]).with_base_demand(1.0))
            .node(NodeAsset::junction(J2, [0.001, 0.0]).with_base_demand(2.0).with_elevation(7.0))
            .node(NodeAsset::junction(J3, [0.002, 0.0]))
            .pipe(P2, J2, J3)
            .build()
            .unwrap();
        let before = model.total_demand();
        let mut ctx = context(&model);

        let moment = run(&mut model, &mut ctx, MergeNodes::new(J1, J2));
        assert_eq!(moment.note(), "Merge junction into junction");
        assert_eq!(moment.delete_assets, vec![J2]);
        let merged = model.node(J1).unwrap();
        assert_eq!(merged.coordinates, [0.001, 0.0]);
        assert_eq!(merged.elevation, 7.0);
        assert_eq!(merged.base_demand(), Some(3.0));
        assert_eq!(model.total_demand(), before);
        assert_eq!(model.link(P2).unwrap().connections, [J1, J3]);
    }

    #[rstest]
    fn links_follow_the_survivor(line: HydraulicModel) {
        let moment = MergeNodes::new(J3, J2)
            .compute(&line, &mut context(&line))
            .unwrap();
        // P2 joined both nodes and collapses onto the merged position
        assert_eq!(put_link(&moment, P2).connections, [J3, J3]);
        assert_eq!(put_link(&moment, P2).coordinates(), &[[0.001, 0.0], [0.001, 0.0]]);
        let p1 = put_link(&moment, P1);
        assert_eq!(p1.connections, [J1, J3]);
        assert_eq!(p1.coordinates(), &[[0.0, 0.0], [0.001, 0.0]]);
        assert_eq!(moment.put_assets.len(), 3);
    }

    #[test]
    fn storage_wins_over_junctions() {
        let mut model = NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .junction(J2, [0.001, 0.0])
            .reservoir(J3, [0.002, 0.0])
            .pipe(P1, J1, J2)
            .customer_point(CustomerPointId::new(1), [0.0009, 0.0001], 1.0, P1, J2)
            .build()
            .unwrap();
        let mut ctx = context(&model);

        let moment = run(&mut model, &mut ctx, MergeNodes::new(J2, J3));
        assert_eq!(moment.note(), "Merge junction into reservoir");
        assert_eq!(moment.delete_assets, vec![J2]);
        assert_eq!(put_node(&moment, J3).coordinates, [0.002, 0.0]);

        let pipe = model.link(P1).unwrap();
        assert_eq!(pipe.connections, [J1, J3]);
        assert_eq!(pipe.last_vertex(), [0.002, 0.0]);
        let point = model.customer_point(CustomerPointId::new(1)).unwrap();
        assert_eq!(point.junction_id(), Some(J1));
        assert_near(point.connection.unwrap().snap_point, [0.0009, 0.0]);
    }

    #[rstest]
    #[case::tank(NodeAsset::tank(J2, [0.001, 0.0]))]
    #[case::reservoir(NodeAsset::reservoir(J2, [0.001, 0.0]))]
    fn storage_survivor_has_no_demand(#[case] storage: NodeAsset) {
        let mut model = NetworkBuilder::new()
            .node(NodeAsset::junction(J1, [0.0, 0.0]).with_base_demand(4.0))
            .node(storage)
            .junction(J3, [0.002, 0.0])
            .pipe(P2, J2, J3)
            .build()
            .unwrap();
        let mut ctx = context(&model);

        run(&mut model, &mut ctx, MergeNodes::new(J1, J2));
        assert!(model.node(J1).is_none());
        assert_eq!(model.node(J2).unwrap().base_demand(), None);
        assert_eq!(model.total_demand(), 0.0);
    }

    #[test]
    fn isolated_nodes() {
        let mut model = NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .tank(J2, [0.001, 0.0])
            .inactive(J1)
            .build()
            .unwrap();
        let mut ctx = context(&model);
        let moment = run(&mut model, &mut ctx, MergeNodes::new(J1, J2));
        assert_eq!(moment.put_assets.len(), 1);
        assert_eq!(model.nodes().count(), 1);
        assert!(model.node(J2).unwrap().is_active);
    }

    #[rstest]
    fn merged_activity(line: HydraulicModel) {
        let mut model = line;
        let mut ctx = context(&model);
        run(&mut model, &mut ctx, MergeNodes::new(J1, J3));
        assert!(model.node(J1).unwrap().is_active);
        assert_eq!(model.validate_active_topology(), Ok(()));
        assert_eq!(model.topology().degree(J1), 2);
    }

    #[rstest]
    fn invalid_nodes(line: HydraulicModel) {
        assert_eq!(
            MergeNodes::new(P1, J1).verify(&line),
            Err(OperationError::InvalidSourceNode(P1))
        );
        assert_eq!(
            MergeNodes::new(J1, AssetId::new(99))
                .compute(&line, &mut context(&line))
                .unwrap_err()
                .to_string(),
            "Invalid target node ID: 99"
        );
    }
}
