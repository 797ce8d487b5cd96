//! Node assets: junctions, reservoirs and tanks.

use serde::{Deserialize, Serialize};

use super::NodeType;
use crate::core::{AssetId, Position};

pub(crate) fn default_active() -> bool {
    true
}

/// Properties of a junction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct JunctionProperties {
    /// Demand at the junction itself, excluding customer points.
    #[serde(default)]
    pub base_demand: f64,
}

/// Properties of a reservoir.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReservoirProperties {
    /// Total hydraulic head.
    #[serde(default)]
    pub head: f64,
}

/// Properties of a tank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TankProperties {
    /// Water level at the start of the simulation.
    pub initial_level: f64,
    /// Lowest operating level.
    pub min_level: f64,
    /// Highest operating level.
    pub max_level: f64,
    /// Volume at the minimum level.
    pub min_volume: f64,
    /// Nominal diameter.
    pub diameter: f64,
    /// Whether the tank may overflow.
    pub overflow: bool,
}

/// Type-specific part of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    /// A junction.
    Junction(JunctionProperties),
    /// A reservoir.
    Reservoir(ReservoirProperties),
    /// A tank.
    Tank(TankProperties),
}

impl NodeKind {
    /// Default properties for a node type.
    #[must_use]
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Junction => NodeKind::Junction(JunctionProperties::default()),
            NodeType::Reservoir => NodeKind::Reservoir(ReservoirProperties::default()),
            NodeType::Tank => NodeKind::Tank(TankProperties::default()),
        }
    }

    /// The node type.
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Junction(_) => NodeType::Junction,
            NodeKind::Reservoir(_) => NodeType::Reservoir,
            NodeKind::Tank(_) => NodeType::Tank,
        }
    }
}

/// A junction, reservoir or tank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAsset {
    /// Stable identifier. [`AssetId::NONE`] asks operations for a fresh one.
    #[serde(default)]
    pub id: AssetId,
    /// User-visible label, unique per asset type.
    #[serde(default)]
    pub label: String,
    /// Location of the node.
    pub coordinates: Position,
    /// Ground elevation.
    #[serde(default)]
    pub elevation: f64,
    /// Whether the node takes part in the simulation.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Type-specific properties.
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl NodeAsset {
    /// Creates an active, unlabelled node.
    #[must_use]
    pub fn new(id: AssetId, coordinates: Position, kind: NodeKind) -> Self {
        Self {
            id,
            label: String::new(),
            coordinates,
            elevation: 0.0,
            is_active: true,
            kind,
        }
    }

    /// Creates a junction with default properties.
    #[must_use]
    pub fn junction(id: AssetId, coordinates: Position) -> Self {
        Self::new(id, coordinates, NodeKind::default_for(NodeType::Junction))
    }

    /// Creates a reservoir with default properties.
    #[must_use]
    pub fn reservoir(id: AssetId, coordinates: Position) -> Self {
        Self::new(id, coordinates, NodeKind::default_for(NodeType::Reservoir))
    }

    /// Creates a tank with default properties.
    #[must_use]
    pub fn tank(id: AssetId, coordinates: Position) -> Self {
        Self::new(id, coordinates, NodeKind::default_for(NodeType::Tank))
    }

    /// Returns the node with the given label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the node with the given elevation.
    #[must_use]
    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = elevation;
        self
    }

    /// Returns the node with the given active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Returns the node with the given base demand. Ignored for non-junctions.
    #[must_use]
    pub fn with_base_demand(mut self, base_demand: f64) -> Self {
        self.set_base_demand(base_demand);
        self
    }

    /// The node type.
    #[inline]
    #[must_use]
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Whether the node is a junction.
    #[inline]
    #[must_use]
    pub fn is_junction(&self) -> bool {
        matches!(self.kind, NodeKind::Junction(_))
    }

    /// The junction base demand, or `None` for reservoirs and tanks.
    #[must_use]
    pub fn base_demand(&self) -> Option<f64> {
        match &self.kind {
            NodeKind::Junction(j) => Some(j.base_demand),
            _ => None,
        }
    }

    /// Sets the base demand of a junction. Ignored for other node types.
    pub fn set_base_demand(&mut self, base_demand: f64) {
        if let NodeKind::Junction(j) = &mut self.kind {
            j.base_demand = base_demand;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flattened_json() {
        let tank = NodeAsset::tank(AssetId::new(4), [1.0, 1.0]).with_label("T1");
        let json = serde_json::to_value(&tank).unwrap();
        assert_eq!(json["type"], "tank");
        assert_eq!(json["label"], "T1");
        assert_eq!(json["overflow"], false);

        let junction: NodeAsset = serde_json::from_str(
            r#"{"id": 2, "type": "junction", "coordinates": [0.5, 1.5], "base_demand": 3.0}"#,
        )
        .unwrap();
        assert_eq!(junction.base_demand(), Some(3.0));
        assert!(junction.is_active);
        assert_eq!(junction.label, "");
    }

    #[test]
    fn base_demand_only_on_junctions() {
        let reservoir = NodeAsset::reservoir(AssetId::new(1), [0.0, 0.0]).with_base_demand(5.0);
        assert_eq!(reservoir.base_demand(), None);
        let junction = NodeAsset::junction(AssetId::new(2), [0.0, 0.0]).with_base_demand(5.0);
        assert_eq!(junction.base_demand(), Some(5.0));
    }
}
