use serde::{Deserialize, Serialize};

use crate::asset::{Asset, NodeType};
use crate::context::EditContext;
use crate::core::AssetId;
use crate::labels::LabelGenerator;
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::merge_nodes::rewire;
use super::reassign::{UpdatedCustomerPoints, reassign_customer_points};
use super::{ModelOperation, OperationError};

/// Replaces a node by a fresh node of another type at the same place.
///
/// The new node gets a new id and label but keeps the elevation and activity
/// of the old one. Type-specific properties take the configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplaceNode {
    /// The node to replace.
    pub old_node_id: AssetId,
    /// Type of the replacement.
    pub new_node_type: NodeType,
}

impl ReplaceNode {
    /// Creates the operation.
    #[must_use]
    pub fn new(old_node_id: AssetId, new_node_type: NodeType) -> Self {
        Self {
            old_node_id,
            new_node_type,
        }
    }
}

impl ModelOperation for ReplaceNode {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        match model.node(self.old_node_id) {
            Some(_) => Ok(()),
            None => Err(OperationError::InvalidNode(self.old_node_id)),
        }
    }

    fn compute(
        self,
        model: &HydraulicModel,
        context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let old = model
            .node(self.old_node_id)
            .ok_or(OperationError::InvalidNode(self.old_node_id))?;

        let mut node = context
            .builder
            .node(self.new_node_type, old.coordinates)
            .with_elevation(old.elevation)
            .with_active(old.is_active);
        node.label = context
            .labels
            .generate_for(self.new_node_type.into(), node.id);

        let mut links = Vec::new();
        let mut customer_points = UpdatedCustomerPoints::new();
        for link in model.links_of(old.id) {
            let mut copy = link.clone();
            rewire(&mut copy, old.id, node.id);
            if copy.is_pipe() {
                reassign_customer_points(model, &copy, &node, &mut customer_points);
            }
            links.push(Asset::from(copy));
        }

        let note = format!("Replace {} with {}", old.node_type(), self.new_node_type);
        let mut put_assets: Vec<Asset> = vec![node.into()];
        put_assets.extend(links);
        Ok(Moment {
            note: Some(note),
            put_assets,
            delete_assets: vec![old.id],
            put_customer_points: customer_points.into_values().collect(),
            ..Moment::default()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::asset::NodeAsset;
    use crate::builder::NetworkBuilder;
    use crate::core::CustomerPointId;
    use crate::ops::test::{J1, J2, J3, P1, P2, context, line, put_node, run};
    use rstest::rstest;

    #[rstest]
    fn junction_to_tank(mut line: HydraulicModel) {
        let mut ctx = context(&line);
        let moment = run(&mut line, &mut ctx, ReplaceNode::new(J2, NodeType::Tank));
        assert_eq!(moment.note(), "Replace junction with tank");
        assert_eq!(moment.delete_assets, vec![J2]);

        let tank = put_node(&moment, AssetId::new(6));
        assert_eq!(tank.label, "T1");
        assert_eq!(tank.coordinates, [0.001, 0.0]);
        assert!(tank.is_active);
        assert_eq!(line.link(P1).unwrap().connections, [J1, tank.id]);
        assert_eq!(line.link(P2).unwrap().connections, [tank.id, J3]);
        assert!(line.node(J2).is_none());
    }

    #[test]
    fn customer_points_leave_storage_nodes() {
        let mut model = NetworkBuilder::new()
            .node(NodeAsset::junction(J1, [0.0, 0.0]).with_elevation(3.0))
            .junction(J2, [0.001, 0.0])
            .pipe(P1, J1, J2)
            .customer_point(CustomerPointId::new(1), [0.0001, 0.0001], 2.0, P1, J1)
            .build()
            .unwrap();
        let mut ctx = context(&model);
        let moment = run(&mut model, &mut ctx, ReplaceNode::new(J1, NodeType::Reservoir));

        let reservoir = put_node(&moment, AssetId::new(5));
        assert_eq!(reservoir.elevation, 3.0);
        let point = model.customer_point(CustomerPointId::new(1)).unwrap();
        assert_eq!(point.junction_id(), Some(J2));
        assert_eq!(model.customer_demand(J2), 2.0);
    }

    #[rstest]
    fn only_nodes(line: HydraulicModel) {
        assert_eq!(
            ReplaceNode::new(P1, NodeType::Junction)
                .compute(&line, &mut context(&line))
                .unwrap_err()
                .to_string(),
            "Invalid node ID: 4"
        );
    }
}
