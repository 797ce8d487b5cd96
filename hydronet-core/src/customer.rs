//! Customer points and their reverse index.
//!
//! A customer point is a demand location attached to the network through a
//! pipe (the snap point lies on it) and one of that pipe's junctions (which
//! receives the demand). The [`CustomerPointsLookup`] indexes every connected
//! point under both the pipe and the junction.

use std::collections::BTreeSet;

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{AssetId, CustomerPointId, Position};

/// Where a customer point is attached to the network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CustomerPointConnection {
    /// The pipe the point is snapped onto.
    pub pipe_id: AssetId,
    /// The projection of the point on the pipe.
    pub snap_point: Position,
    /// The endpoint junction receiving the demand.
    pub junction_id: AssetId,
}

/// A demand attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPoint {
    /// Stable identifier.
    pub id: CustomerPointId,
    /// User-visible label.
    #[serde(default)]
    pub label: String,
    /// Fixed location of the customer.
    pub coordinates: Position,
    /// Demand of the customer.
    #[serde(default)]
    pub base_demand: f64,
    /// Attachment, `None` when disconnected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<CustomerPointConnection>,
}

impl CustomerPoint {
    /// Creates a disconnected customer point.
    #[must_use]
    pub fn new(id: CustomerPointId, coordinates: Position, base_demand: f64) -> Self {
        Self {
            id,
            label: String::new(),
            coordinates,
            base_demand,
            connection: None,
        }
    }

    /// Attaches the point.
    pub fn connect(&mut self, connection: CustomerPointConnection) {
        self.connection = Some(connection);
    }

    /// Returns the point with the given attachment.
    #[must_use]
    pub fn connected(mut self, connection: CustomerPointConnection) -> Self {
        self.connect(connection);
        self
    }

    /// A copy of the point without its attachment.
    #[must_use]
    pub fn copy_disconnected(&self) -> Self {
        Self {
            connection: None,
            ..self.clone()
        }
    }

    /// Whether the point is attached.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The pipe the point is attached to.
    #[must_use]
    pub fn pipe_id(&self) -> Option<AssetId> {
        self.connection.map(|c| c.pipe_id)
    }

    /// The junction receiving the demand.
    #[must_use]
    pub fn junction_id(&self) -> Option<AssetId> {
        self.connection.map(|c| c.junction_id)
    }
}

/// Reverse index from pipes and junctions to the customer points attached to
/// them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerPointsLookup {
    by_asset: FxHashMap<AssetId, BTreeSet<CustomerPointId>>,
}

impl CustomerPointsLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a lookup from the connections of `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a CustomerPoint>) -> Self {
        let mut lookup = Self::new();
        for point in points {
            lookup.add_connection(point);
        }
        lookup
    }

    /// Indexes a point under its pipe and junction. Disconnected points are
    /// ignored.
    pub fn add_connection(&mut self, point: &CustomerPoint) {
        let Some(connection) = point.connection else {
            return;
        };
        for asset in [connection.pipe_id, connection.junction_id] {
            self.by_asset.entry(asset).or_default().insert(point.id);
        }
    }

    /// Removes a point from the entries of its pipe and junction.
    pub fn remove_connection(&mut self, point: &CustomerPoint) {
        let Some(connection) = point.connection else {
            return;
        };
        for asset in [connection.pipe_id, connection.junction_id] {
            if let Some(points) = self.by_asset.get_mut(&asset) {
                points.remove(&point.id);
                if points.is_empty() {
                    self.by_asset.remove(&asset);
                }
            }
        }
    }

    /// The points attached to a pipe or junction, in id order.
    pub fn customer_points(&self, asset: AssetId) -> impl Iterator<Item = CustomerPointId> + '_ {
        self.by_asset.get(&asset).into_iter().flatten().copied()
    }

    /// Whether any point is attached to the asset.
    #[must_use]
    pub fn has_connections(&self, asset: AssetId) -> bool {
        self.by_asset.contains_key(&asset)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.by_asset.clear();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use itertools::Itertools;
    use rstest::{fixture, rstest};

    #[fixture]
    fn connected_point() -> CustomerPoint {
        CustomerPoint::new(CustomerPointId::new(1), [1.0, 1.0], 2.5).connected(
            CustomerPointConnection {
                pipe_id: AssetId::new(10),
                snap_point: [1.0, 0.0],
                junction_id: AssetId::new(20),
            },
        )
    }

    #[rstest]
    fn dual_keyed(connected_point: CustomerPoint) {
        let mut lookup = CustomerPointsLookup::from_points([&connected_point]);
        assert!(lookup.has_connections(AssetId::new(10)));
        assert!(lookup.has_connections(AssetId::new(20)));
        assert_eq!(
            lookup.customer_points(AssetId::new(20)).collect_vec(),
            [CustomerPointId::new(1)]
        );

        lookup.remove_connection(&connected_point);
        assert!(!lookup.has_connections(AssetId::new(10)));
        assert_eq!(lookup, CustomerPointsLookup::new());
    }

    #[rstest]
    fn disconnected_points_are_not_indexed(connected_point: CustomerPoint) {
        let disconnected = connected_point.copy_disconnected();
        assert_eq!(disconnected.id, connected_point.id);
        assert_eq!(disconnected.base_demand, 2.5);
        assert!(!disconnected.is_connected());

        let mut lookup = CustomerPointsLookup::new();
        lookup.add_connection(&disconnected);
        assert!(!lookup.has_connections(AssetId::new(10)));
        lookup.add_connection(&connected_point);
        lookup.clear();
        assert!(!lookup.has_connections(AssetId::new(20)));
    }
}
