//! Link assets: pipes, pumps and valves.

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::node::default_active;
use super::{AssetError, LinkType};
use crate::config::LengthUnit;
use crate::core::{AssetId, Connections, Position};
use crate::geometry::{polyline_length, round2};

/// Initial status of a pipe.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PipeStatus {
    /// Flow in both directions.
    #[default]
    Open,
    /// No flow.
    Closed,
    /// Check valve, flow only from start to end.
    Cv,
}

/// Initial status of a pump.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PumpStatus {
    /// Running.
    #[default]
    On,
    /// Stopped.
    Off,
}

/// How a pump's operating curve is defined.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum PumpDefinitionType {
    /// Constant power.
    #[default]
    Power,
    /// Single design point curve.
    DesignPoint,
    /// Three point curve.
    Standard,
}

/// Control type of a valve.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValveKind {
    /// Pressure reducing valve.
    Prv,
    /// Pressure sustaining valve.
    Psv,
    /// Flow control valve.
    Fcv,
    /// Pressure breaker valve.
    Pbv,
    /// Throttle control valve.
    #[default]
    Tcv,
}

/// Initial status of a valve.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ValveStatus {
    /// Controlled by its setting.
    #[default]
    Active,
    /// Fully open.
    Open,
    /// Fully closed.
    Closed,
}

/// Properties of a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipeProperties {
    /// Internal diameter.
    pub diameter: f64,
    /// Roughness coefficient.
    pub roughness: f64,
    /// Minor loss coefficient.
    pub minor_loss: f64,
    /// Status at the start of the simulation.
    pub initial_status: PipeStatus,
}

impl Default for PipeProperties {
    fn default() -> Self {
        Self {
            diameter: 300.0,
            roughness: 130.0,
            minor_loss: 0.0,
            initial_status: PipeStatus::Open,
        }
    }
}

/// Properties of a pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpProperties {
    /// Status at the start of the simulation.
    pub initial_status: PumpStatus,
    /// How the pump curve is defined.
    pub definition_type: PumpDefinitionType,
    /// Power, for constant power pumps.
    pub power: f64,
    /// Relative speed setting.
    pub speed: f64,
    /// Head curve, for curve based pumps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub curve_id: Option<String>,
}

impl Default for PumpProperties {
    fn default() -> Self {
        Self {
            initial_status: PumpStatus::On,
            definition_type: PumpDefinitionType::Power,
            power: 20.0,
            speed: 1.0,
            curve_id: None,
        }
    }
}

/// Properties of a valve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveProperties {
    /// Nominal diameter.
    pub diameter: f64,
    /// Minor loss coefficient when fully open.
    pub minor_loss: f64,
    /// Control type.
    pub kind: ValveKind,
    /// Pressure, flow or loss coefficient depending on the kind.
    pub setting: f64,
    /// Status at the start of the simulation.
    pub initial_status: ValveStatus,
}

impl Default for ValveProperties {
    fn default() -> Self {
        Self {
            diameter: 300.0,
            minor_loss: 0.0,
            kind: ValveKind::Tcv,
            setting: 0.0,
            initial_status: ValveStatus::Active,
        }
    }
}

/// Type-specific part of a link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkKind {
    /// A pipe.
    Pipe(PipeProperties),
    /// A pump.
    Pump(PumpProperties),
    /// A valve.
    Valve(ValveProperties),
}

impl LinkKind {
    /// Default properties for a link type.
    #[must_use]
    pub fn default_for(link_type: LinkType) -> Self {
        match link_type {
            LinkType::Pipe => LinkKind::Pipe(PipeProperties::default()),
            LinkType::Pump => LinkKind::Pump(PumpProperties::default()),
            LinkType::Valve => LinkKind::Valve(ValveProperties::default()),
        }
    }

    /// The link type.
    #[must_use]
    pub fn link_type(&self) -> LinkType {
        match self {
            LinkKind::Pipe(_) => LinkType::Pipe,
            LinkKind::Pump(_) => LinkType::Pump,
            LinkKind::Valve(_) => LinkType::Valve,
        }
    }
}

/// A pipe, pump or valve between two nodes.
///
/// The polyline always has at least two vertices once built through
/// [`LinkAsset::new`] or [`LinkAsset::set_coordinates`], and the stored length
/// follows the polyline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkAsset {
    /// Stable identifier. [`AssetId::NONE`] asks operations for a fresh one.
    #[serde(default)]
    pub id: AssetId,
    /// User-visible label, unique per asset type.
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    coordinates: Vec<Position>,
    /// Start and end node.
    #[serde(default)]
    pub connections: Connections,
    #[serde(default)]
    length: f64,
    /// Whether the link takes part in the simulation.
    #[serde(default = "default_active")]
    pub is_active: bool,
    /// Type-specific properties.
    #[serde(flatten)]
    pub kind: LinkKind,
}

impl LinkAsset {
    /// Creates an active, unlabelled and unconnected link.
    pub fn new(
        id: AssetId,
        coordinates: Vec<Position>,
        kind: LinkKind,
        unit: LengthUnit,
    ) -> Result<Self, AssetError> {
        let mut link = Self {
            id,
            label: String::new(),
            coordinates: Vec::new(),
            connections: [AssetId::NONE; 2],
            length: 0.0,
            is_active: true,
            kind,
        };
        link.set_coordinates(coordinates, unit)?;
        Ok(link)
    }

    /// Creates a pipe with default properties, measured in meters.
    pub fn pipe(id: AssetId, coordinates: Vec<Position>) -> Result<Self, AssetError> {
        Self::new(id, coordinates, LinkKind::default_for(LinkType::Pipe), LengthUnit::Meters)
    }

    /// Creates a pump with default properties, measured in meters.
    pub fn pump(id: AssetId, coordinates: Vec<Position>) -> Result<Self, AssetError> {
        Self::new(id, coordinates, LinkKind::default_for(LinkType::Pump), LengthUnit::Meters)
    }

    /// Creates a valve with default properties, measured in meters.
    pub fn valve(id: AssetId, coordinates: Vec<Position>) -> Result<Self, AssetError> {
        Self::new(id, coordinates, LinkKind::default_for(LinkType::Valve), LengthUnit::Meters)
    }

    /// Returns the link with the given connections.
    #[must_use]
    pub fn with_connections(mut self, start: AssetId, end: AssetId) -> Self {
        self.connections = [start, end];
        self
    }

    /// Returns the link with the given label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Returns the link with the given active flag.
    #[must_use]
    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// The link type.
    #[inline]
    #[must_use]
    pub fn link_type(&self) -> LinkType {
        self.kind.link_type()
    }

    /// Whether the link is a pipe.
    #[inline]
    #[must_use]
    pub fn is_pipe(&self) -> bool {
        matches!(self.kind, LinkKind::Pipe(_))
    }

    /// Pipe properties, if the link is a pipe.
    #[must_use]
    pub fn pipe_properties(&self) -> Option<&PipeProperties> {
        match &self.kind {
            LinkKind::Pipe(p) => Some(p),
            _ => None,
        }
    }

    /// The polyline of the link.
    #[inline]
    #[must_use]
    pub fn coordinates(&self) -> &[Position] {
        &self.coordinates
    }

    /// Length of the polyline, in the unit it was last measured in.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.length
    }

    /// Start node.
    #[inline]
    #[must_use]
    pub fn start(&self) -> AssetId {
        self.connections[0]
    }

    /// End node.
    #[inline]
    #[must_use]
    pub fn end(&self) -> AssetId {
        self.connections[1]
    }

    /// Whether `node` is one of the endpoints.
    #[inline]
    #[must_use]
    pub fn connects(&self, node: AssetId) -> bool {
        self.connections.contains(&node)
    }

    /// First vertex of the polyline.
    #[must_use]
    pub fn first_vertex(&self) -> Position {
        self.coordinates.first().copied().unwrap_or_default()
    }

    /// Last vertex of the polyline.
    #[must_use]
    pub fn last_vertex(&self) -> Position {
        self.coordinates.last().copied().unwrap_or_default()
    }

    /// Whether the polyline starts exactly at `position`.
    #[must_use]
    pub fn is_start(&self, position: Position) -> bool {
        self.coordinates.first() == Some(&position)
    }

    /// Whether the polyline ends exactly at `position`.
    #[must_use]
    pub fn is_end(&self, position: Position) -> bool {
        self.coordinates.last() == Some(&position)
    }

    /// Iterates over the segments of the polyline.
    pub fn segments(&self) -> impl Iterator<Item = (Position, Position)> + '_ {
        self.coordinates.iter().copied().tuple_windows()
    }

    /// Replaces the polyline and recomputes the length in `unit`.
    pub fn set_coordinates(
        &mut self,
        coordinates: Vec<Position>,
        unit: LengthUnit,
    ) -> Result<(), AssetError> {
        if coordinates.len() < 2 {
            return Err(AssetError::TooFewVertices(coordinates.len()));
        }
        self.length = round2(unit.convert_from_meters(polyline_length(&coordinates)));
        self.coordinates = coordinates;
        Ok(())
    }

    /// Moves whichever endpoint vertex sits exactly at `from` to `to`.
    pub fn move_endpoint(
        &mut self,
        from: Position,
        to: Position,
        unit: LengthUnit,
    ) -> Result<(), AssetError> {
        let mut coordinates = self.coordinates.clone();
        if self.is_start(from) {
            coordinates[0] = to;
        }
        if self.is_end(from) {
            let last = coordinates.len() - 1;
            coordinates[last] = to;
        }
        self.set_coordinates(coordinates, unit)
    }

    /// Swaps the endpoints and reverses the polyline.
    pub fn reverse(&mut self) {
        self.connections.reverse();
        self.coordinates.reverse();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn length_follows_coordinates() {
        let mut pipe = LinkAsset::pipe(AssetId::new(1), vec![[0.0, 0.0], [0.001, 0.0]]).unwrap();
        assert_eq!(pipe.length(), 111.2);
        pipe.set_coordinates(vec![[0.0, 0.0], [0.002, 0.0]], LengthUnit::Feet)
            .unwrap();
        assert_eq!(pipe.length(), 729.63);
    }

    #[test]
    fn needs_two_vertices() {
        assert_eq!(
            LinkAsset::valve(AssetId::new(1), vec![[0.0, 0.0]]),
            Err(AssetError::TooFewVertices(1))
        );
    }

    #[test]
    fn moving_endpoints() {
        let mut pump =
            LinkAsset::pump(AssetId::new(3), vec![[0.0, 0.0], [1.0, 1.0], [2.0, 0.0]]).unwrap();
        pump.move_endpoint([2.0, 0.0], [3.0, 0.0], LengthUnit::Meters)
            .unwrap();
        assert_eq!(pump.coordinates(), &[[0.0, 0.0], [1.0, 1.0], [3.0, 0.0]]);
        pump.move_endpoint([5.0, 5.0], [6.0, 6.0], LengthUnit::Meters)
            .unwrap();
        assert_eq!(pump.last_vertex(), [3.0, 0.0]);
    }

    #[test]
    fn reversing() {
        let mut pipe = LinkAsset::pipe(AssetId::new(3), vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]])
            .unwrap()
            .with_connections(AssetId::new(1), AssetId::new(2));
        pipe.reverse();
        assert_eq!(pipe.connections, [AssetId::new(2), AssetId::new(1)]);
        assert_eq!(pipe.coordinates(), &[[10.0, 0.0], [5.0, 0.0], [0.0, 0.0]]);
    }

    #[test]
    fn pump_json_uses_kebab_case() {
        let pump = LinkAsset::pump(AssetId::new(3), vec![[0.0, 0.0], [1.0, 0.0]]).unwrap();
        let json = serde_json::to_value(&pump).unwrap();
        assert_eq!(json["type"], "pump");
        assert_eq!(json["definition_type"], "power");
        assert!(json.get("curve_id").is_none());
    }
}
