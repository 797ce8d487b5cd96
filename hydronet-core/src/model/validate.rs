//! Invariant checks over a [`HydraulicModel`].

use fxhash::FxHashMap;
use thiserror::Error;

use super::HydraulicModel;
use crate::asset::{Asset, AssetType};
use crate::core::{AssetId, CustomerPointId};
use crate::ops::infer_node_is_active;

/// A broken model invariant.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ValidationError {
    /// A link endpoint is not in the asset table.
    #[error("Link {link} references missing node {node}")]
    MissingEndpoint {
        /// The link.
        link: AssetId,
        /// The missing endpoint.
        node: AssetId,
    },
    /// A link endpoint is another link.
    #[error("Link {link} is connected to {node}, which is not a node")]
    EndpointNotANode {
        /// The link.
        link: AssetId,
        /// The offending endpoint.
        node: AssetId,
    },
    /// A link has fewer than two vertices.
    #[error("Link {link} has {count} vertices, at least 2 are required")]
    TooFewVertices {
        /// The link.
        link: AssetId,
        /// Number of vertices.
        count: usize,
    },
    /// The topology disagrees with the link's connections.
    #[error("Topology of link {0} does not match its connections")]
    TopologyMismatch(AssetId),
    /// The node/link classification disagrees with the asset table.
    #[error("Asset {0} is misclassified in the asset index")]
    IndexMismatch(AssetId),
    /// A customer point is attached to something that is not a pipe.
    #[error("Customer point {point} is connected to {pipe}, which is not a pipe")]
    CustomerPipeNotFound {
        /// The customer point.
        point: CustomerPointId,
        /// The referenced pipe.
        pipe: AssetId,
    },
    /// A customer point's junction is not a junction endpoint of its pipe.
    #[error(
        "Customer point {point} is assigned to {junction}, which is not a junction of pipe {pipe}"
    )]
    CustomerJunctionMismatch {
        /// The customer point.
        point: CustomerPointId,
        /// The referenced junction.
        junction: AssetId,
        /// The referenced pipe.
        pipe: AssetId,
    },
    /// The customer points lookup is stale.
    #[error("Customer point {0} is not indexed under its connection")]
    LookupMismatch(CustomerPointId),
    /// Two assets of the same type share a label.
    #[error("Label {label} is used by more than one {asset_type}")]
    DuplicateLabel {
        /// The shared label.
        label: String,
        /// The asset type.
        asset_type: AssetType,
    },
    /// An active link has an inactive endpoint.
    #[error("Active link {link} has inactive endpoint {node}")]
    InactiveEndpoint {
        /// The link.
        link: AssetId,
        /// The inactive endpoint.
        node: AssetId,
    },
    /// A node's activity disagrees with its incident links.
    #[error("Node {node} has is_active = {}, expected {expected}", !.expected)]
    NodeActivity {
        /// The node.
        node: AssetId,
        /// The inferred activity.
        expected: bool,
    },
}

impl HydraulicModel {
    /// Checks the structural invariants: link endpoints, geometry, indices,
    /// customer point connections and label uniqueness.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for link in self.links() {
            for node in link.connections {
                match self.asset(node) {
                    None => return Err(ValidationError::MissingEndpoint { link: link.id, node }),
                    Some(Asset::Link(_)) => {
                        return Err(ValidationError::EndpointNotANode { link: link.id, node });
                    }
                    Some(Asset::Node(_)) => {}
                }
            }
            if link.coordinates().len() < 2 {
                return Err(ValidationError::TooFewVertices {
                    link: link.id,
                    count: link.coordinates().len(),
                });
            }
            if self.topology.nodes(link.id) != Some(link.connections) {
                return Err(ValidationError::TopologyMismatch(link.id));
            }
        }
        if self.topology.link_count() != self.index.link_count() {
            let stray = self
                .index
                .link_ids()
                .find(|id| !self.topology.has_link(*id))
                .unwrap_or_default();
            return Err(ValidationError::TopologyMismatch(stray));
        }

        for asset in self.assets() {
            let classified = match asset {
                Asset::Node(_) => self.index.has_node(asset.id()),
                Asset::Link(_) => self.index.has_link(asset.id()),
            };
            if !classified {
                return Err(ValidationError::IndexMismatch(asset.id()));
            }
        }
        if self.index.node_count() + self.index.link_count() != self.assets.len() {
            let stray = self
                .index
                .node_ids()
                .chain(self.index.link_ids())
                .find(|id| self.asset(*id).is_none())
                .unwrap_or_default();
            return Err(ValidationError::IndexMismatch(stray));
        }

        self.validate_customer_points()?;
        self.validate_labels()
    }

    fn validate_customer_points(&self) -> Result<(), ValidationError> {
        for point in self.customer_points() {
            let Some(connection) = point.connection else {
                continue;
            };
            let pipe = self
                .pipe(connection.pipe_id)
                .ok_or(ValidationError::CustomerPipeNotFound {
                    point: point.id,
                    pipe: connection.pipe_id,
                })?;
            let is_junction_endpoint = pipe.connects(connection.junction_id)
                && self
                    .node(connection.junction_id)
                    .is_some_and(|n| n.is_junction());
            if !is_junction_endpoint {
                return Err(ValidationError::CustomerJunctionMismatch {
                    point: point.id,
                    junction: connection.junction_id,
                    pipe: connection.pipe_id,
                });
            }
            let indexed = [connection.pipe_id, connection.junction_id]
                .into_iter()
                .all(|asset| self.lookup.customer_points(asset).any(|id| id == point.id));
            if !indexed {
                return Err(ValidationError::LookupMismatch(point.id));
            }
        }
        Ok(())
    }

    fn validate_labels(&self) -> Result<(), ValidationError> {
        let mut seen: FxHashMap<(AssetType, &str), AssetId> = FxHashMap::default();
        for asset in self.assets().filter(|a| !a.label().is_empty()) {
            if seen
                .insert((asset.asset_type(), asset.label()), asset.id())
                .is_some()
            {
                return Err(ValidationError::DuplicateLabel {
                    label: asset.label().to_string(),
                    asset_type: asset.asset_type(),
                });
            }
        }
        Ok(())
    }

    /// Checks that every active link has active endpoints and that every
    /// node's activity matches its incident links.
    ///
    /// Activity is only maintained by the model operations, so models loaded
    /// from documents may legitimately fail this check.
    pub fn validate_active_topology(&self) -> Result<(), ValidationError> {
        for link in self.links().filter(|l| l.is_active) {
            for node in link.connections {
                if self.node(node).is_some_and(|n| !n.is_active) {
                    return Err(ValidationError::InactiveEndpoint { link: link.id, node });
                }
            }
        }
        for node in self.nodes() {
            let expected = infer_node_is_active(self, node.id, &[], &[]);
            if node.is_active != expected {
                return Err(ValidationError::NodeActivity {
                    node: node.id,
                    expected,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::customer::{CustomerPoint, CustomerPointConnection};
    use crate::labels::LabelManager;
    use crate::moment::Moment;
    use rstest::{fixture, rstest};

    const J1: AssetId = AssetId::new(1);
    const J2: AssetId = AssetId::new(2);
    const J3: AssetId = AssetId::new(3);
    const P1: AssetId = AssetId::new(4);

    #[fixture]
    fn model() -> HydraulicModel {
        NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .junction(J2, [0.001, 0.0])
            .junction(J3, [0.002, 0.0])
            .pipe(P1, J1, J2)
            .build()
            .unwrap()
    }

    fn apply(model: &mut HydraulicModel, moment: Moment) {
        model.apply(&moment, &mut LabelManager::new());
    }

    #[rstest]
    fn valid_model(model: HydraulicModel) {
        assert_eq!(model.validate(), Ok(()));
        assert_eq!(model.validate_active_topology(), Ok(()));
    }

    #[rstest]
    fn dangling_links(mut model: HydraulicModel) {
        let mut moment = Moment::new("Break");
        moment.delete_assets.push(J2);
        apply(&mut model, moment);
        assert_eq!(
            model.validate(),
            Err(ValidationError::MissingEndpoint { link: P1, node: J2 })
        );
    }

    #[rstest]
    fn duplicate_labels(mut model: HydraulicModel) {
        let mut moment = Moment::new("Relabel");
        let mut j3 = model.asset(J3).unwrap().clone();
        j3.set_label("J1");
        moment.put_assets.push(j3);
        apply(&mut model, moment);
        assert_eq!(
            model.validate(),
            Err(ValidationError::DuplicateLabel {
                label: "J1".to_string(),
                asset_type: AssetType::Junction,
            })
        );
    }

    #[rstest]
    fn customer_junction_off_the_pipe(mut model: HydraulicModel) {
        let point = CustomerPoint::new(CustomerPointId::new(1), [0.0, 0.0], 1.0).connected(
            CustomerPointConnection {
                pipe_id: P1,
                snap_point: [0.0, 0.0],
                junction_id: J3,
            },
        );
        let mut moment = Moment::new("Attach");
        moment.put_customer_points.push(point);
        apply(&mut model, moment);
        assert!(matches!(
            model.validate(),
            Err(ValidationError::CustomerJunctionMismatch { junction: J3, .. })
        ));
    }

    #[rstest]
    fn activity_mismatch(mut model: HydraulicModel) {
        let mut moment = Moment::new("Deactivate");
        let mut j1 = model.asset(J1).unwrap().clone();
        j1.set_active(false);
        moment.put_assets.push(j1);
        apply(&mut model, moment);
        assert_eq!(model.validate(), Ok(()));
        assert_eq!(
            model.validate_active_topology(),
            Err(ValidationError::InactiveEndpoint { link: P1, node: J1 })
        );
    }
}
