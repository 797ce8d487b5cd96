//! Construction of assets and whole networks.
//!
//! [`AssetBuilder`] creates individual assets with fresh ids and the
//! configured default quantities. [`NetworkBuilder`] declares a complete
//! network, mostly for tests and fixtures.

mod network;

pub use network::{NetworkBuilder, NetworkBuildError};

use crate::asset::{
    AssetError, JunctionProperties, LinkAsset, LinkKind, LinkType, NodeAsset, NodeKind, NodeType,
    ReservoirProperties, TankProperties,
};
use crate::config::{AssetDefaults, Units};
use crate::core::{AssetId, Position};

/// Allocates asset ids. Ids are never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    last: u32,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// A generator whose first id is `1`.
    #[must_use]
    pub fn new() -> Self {
        Self { last: 0 }
    }

    /// A generator whose first id follows `last`.
    #[must_use]
    pub fn starting_after(last: AssetId) -> Self {
        Self { last: last.index() }
    }

    /// Allocates a new id.
    pub fn new_id(&mut self) -> AssetId {
        self.last += 1;
        AssetId::new(self.last)
    }

    /// Makes sure `id` is never allocated.
    pub fn skip_past(&mut self, id: AssetId) {
        self.last = self.last.max(id.index());
    }

    /// The most recently allocated id.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.last
    }
}

/// Builds assets with fresh ids and default quantities.
///
/// Built assets are active and unlabelled; operations label them when they
/// enter the model.
#[derive(Debug, Clone, Default)]
pub struct AssetBuilder {
    units: Units,
    defaults: AssetDefaults,
    ids: IdGenerator,
}

impl AssetBuilder {
    /// Creates a builder.
    #[must_use]
    pub fn new(units: Units, defaults: AssetDefaults, ids: IdGenerator) -> Self {
        Self {
            units,
            defaults,
            ids,
        }
    }

    /// The units lengths are measured in.
    #[must_use]
    pub fn units(&self) -> Units {
        self.units
    }

    /// Allocates a new asset id.
    pub fn new_id(&mut self) -> AssetId {
        self.ids.new_id()
    }

    /// Makes sure `id` is never allocated.
    pub fn skip_past(&mut self, id: AssetId) {
        self.ids.skip_past(id);
    }

    /// Builds a node of the given type.
    pub fn node(&mut self, node_type: NodeType, coordinates: Position) -> NodeAsset {
        let defaults = &self.defaults.node;
        let kind = match node_type {
            NodeType::Junction => NodeKind::Junction(JunctionProperties {
                base_demand: defaults.base_demand,
            }),
            NodeType::Reservoir => NodeKind::Reservoir(ReservoirProperties {
                head: defaults.reservoir_head,
            }),
            NodeType::Tank => NodeKind::Tank(TankProperties {
                initial_level: defaults.tank_initial_level,
                max_level: defaults.tank_max_level,
                diameter: defaults.tank_diameter,
                ..TankProperties::default()
            }),
        };
        let elevation = defaults.elevation;
        NodeAsset::new(self.new_id(), coordinates, kind).with_elevation(elevation)
    }

    /// Builds a junction.
    pub fn junction(&mut self, coordinates: Position) -> NodeAsset {
        self.node(NodeType::Junction, coordinates)
    }

    /// Builds a reservoir.
    pub fn reservoir(&mut self, coordinates: Position) -> NodeAsset {
        self.node(NodeType::Reservoir, coordinates)
    }

    /// Builds a tank.
    pub fn tank(&mut self, coordinates: Position) -> NodeAsset {
        self.node(NodeType::Tank, coordinates)
    }

    /// Builds an unconnected link of the given type.
    pub fn link(
        &mut self,
        link_type: LinkType,
        coordinates: Vec<Position>,
    ) -> Result<LinkAsset, AssetError> {
        let kind = match link_type {
            LinkType::Pipe => LinkKind::Pipe(self.defaults.pipe),
            LinkType::Pump => LinkKind::Pump(self.defaults.pump.clone()),
            LinkType::Valve => LinkKind::Valve(self.defaults.valve),
        };
        LinkAsset::new(self.new_id(), coordinates, kind, self.units.length)
    }

    /// Builds an unconnected pipe.
    pub fn pipe(&mut self, coordinates: Vec<Position>) -> Result<LinkAsset, AssetError> {
        self.link(LinkType::Pipe, coordinates)
    }

    /// Builds an unconnected pump.
    pub fn pump(&mut self, coordinates: Vec<Position>) -> Result<LinkAsset, AssetError> {
        self.link(LinkType::Pump, coordinates)
    }

    /// Builds an unconnected valve.
    pub fn valve(&mut self, coordinates: Vec<Position>) -> Result<LinkAsset, AssetError> {
        self.link(LinkType::Valve, coordinates)
    }
}
