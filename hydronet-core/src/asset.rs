//! Asset records: the nodes and links of a hydraulic network.
//!
//! An [`Asset`] is a closed variant over the six asset types. Nodes carry a
//! point geometry and links a polyline between two nodes. Assets are plain
//! values: operations clone them, mutate the copy and return it inside a
//! [`Moment`](crate::moment::Moment).

mod link;
mod node;

pub use link::{
    LinkAsset, LinkKind, PipeProperties, PipeStatus, PumpDefinitionType, PumpProperties,
    PumpStatus, ValveKind, ValveProperties, ValveStatus,
};
pub use node::{JunctionProperties, NodeAsset, NodeKind, ReservoirProperties, TankProperties};

use derive_more::From;
use thiserror::Error;

use crate::core::AssetId;

/// The type of an asset.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssetType {
    /// A consumption or connection point.
    Junction,
    /// An infinite source of water at a fixed head.
    Reservoir,
    /// A storage node with a variable level.
    Tank,
    /// A pressurised conduit.
    Pipe,
    /// A link adding head.
    Pump,
    /// A link controlling pressure or flow.
    Valve,
}

/// The type of a node asset.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    /// See [`AssetType::Junction`].
    Junction,
    /// See [`AssetType::Reservoir`].
    Reservoir,
    /// See [`AssetType::Tank`].
    Tank,
}

/// The type of a link asset.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    /// See [`AssetType::Pipe`].
    Pipe,
    /// See [`AssetType::Pump`].
    Pump,
    /// See [`AssetType::Valve`].
    Valve,
}

impl From<NodeType> for AssetType {
    fn from(value: NodeType) -> Self {
        match value {
            NodeType::Junction => AssetType::Junction,
            NodeType::Reservoir => AssetType::Reservoir,
            NodeType::Tank => AssetType::Tank,
        }
    }
}

impl From<LinkType> for AssetType {
    fn from(value: LinkType) -> Self {
        match value {
            LinkType::Pipe => AssetType::Pipe,
            LinkType::Pump => AssetType::Pump,
            LinkType::Valve => AssetType::Valve,
        }
    }
}

/// Errors produced when mutating an asset.
#[derive(Debug, Clone, Error, PartialEq)]
#[non_exhaustive]
pub enum AssetError {
    /// A link polyline needs at least a start and an end vertex.
    #[error("Invalid number of points for link ({0})")]
    TooFewVertices(usize),
}

/// A node or a link of the network.
#[derive(Debug, Clone, PartialEq, From, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Asset {
    /// A junction, reservoir or tank.
    Node(NodeAsset),
    /// A pipe, pump or valve.
    Link(LinkAsset),
}

impl Asset {
    /// The asset identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> AssetId {
        match self {
            Asset::Node(n) => n.id,
            Asset::Link(l) => l.id,
        }
    }

    /// The user-visible label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Asset::Node(n) => &n.label,
            Asset::Link(l) => &l.label,
        }
    }

    /// Replaces the user-visible label.
    pub fn set_label(&mut self, label: impl Into<String>) {
        match self {
            Asset::Node(n) => n.label = label.into(),
            Asset::Link(l) => l.label = label.into(),
        }
    }

    /// The asset type.
    #[must_use]
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Node(n) => n.node_type().into(),
            Asset::Link(l) => l.link_type().into(),
        }
    }

    /// Whether the asset takes part in the hydraulic simulation.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Asset::Node(n) => n.is_active,
            Asset::Link(l) => l.is_active,
        }
    }

    /// Sets the active flag.
    pub fn set_active(&mut self, active: bool) {
        match self {
            Asset::Node(n) => n.is_active = active,
            Asset::Link(l) => l.is_active = active,
        }
    }

    /// Whether the asset is a node.
    #[inline]
    #[must_use]
    pub fn is_node(&self) -> bool {
        matches!(self, Asset::Node(_))
    }

    /// Whether the asset is a link.
    #[inline]
    #[must_use]
    pub fn is_link(&self) -> bool {
        matches!(self, Asset::Link(_))
    }

    /// Returns the node record, if this is a node.
    #[must_use]
    pub fn as_node(&self) -> Option<&NodeAsset> {
        match self {
            Asset::Node(n) => Some(n),
            Asset::Link(_) => None,
        }
    }

    /// Returns the link record, if this is a link.
    #[must_use]
    pub fn as_link(&self) -> Option<&LinkAsset> {
        match self {
            Asset::Link(l) => Some(l),
            Asset::Node(_) => None,
        }
    }

    /// Returns the mutable link record, if this is a link.
    pub fn as_link_mut(&mut self) -> Option<&mut LinkAsset> {
        match self {
            Asset::Link(l) => Some(l),
            Asset::Node(_) => None,
        }
    }

    /// Returns the pipe properties, if this is a pipe.
    #[must_use]
    pub fn as_pipe(&self) -> Option<&LinkAsset> {
        self.as_link().filter(|l| l.is_pipe())
    }
}
