//! Model configuration: units and default quantities for new assets.
//!
//! Every field is defaulted, so a partial JSON document such as
//! `{"units": {"length": "ft"}}` is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::asset::{PipeProperties, PumpProperties, ValveProperties};

const FEET_PER_METER: f64 = 1.0 / 0.3048;

/// Unit in which link lengths are stored.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
pub enum LengthUnit {
    /// Meters.
    #[default]
    #[serde(rename = "m")]
    #[strum(serialize = "m")]
    Meters,
    /// International feet.
    #[serde(rename = "ft")]
    #[strum(serialize = "ft")]
    Feet,
}

impl LengthUnit {
    /// Converts a length in meters to this unit.
    #[must_use]
    pub fn convert_from_meters(self, meters: f64) -> f64 {
        match self {
            LengthUnit::Meters => meters,
            LengthUnit::Feet => meters * FEET_PER_METER,
        }
    }
}

/// Units of the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Units {
    /// Unit of link lengths.
    pub length: LengthUnit,
}

/// Default node quantities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    /// Elevation of new nodes.
    pub elevation: f64,
    /// Base demand of new junctions.
    pub base_demand: f64,
    /// Head of new reservoirs.
    pub reservoir_head: f64,
    /// Initial level of new tanks.
    pub tank_initial_level: f64,
    /// Maximum level of new tanks.
    pub tank_max_level: f64,
    /// Diameter of new tanks.
    pub tank_diameter: f64,
}

/// Default quantities used by the [`AssetBuilder`](crate::builder::AssetBuilder).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetDefaults {
    /// Defaults for junctions, reservoirs and tanks.
    pub node: NodeDefaults,
    /// Defaults for pipes.
    pub pipe: PipeProperties,
    /// Defaults for pumps.
    pub pump: PumpProperties,
    /// Defaults for valves.
    pub valve: ValveProperties,
}

/// Configuration of a model and its editing context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Units of the model.
    pub units: Units,
    /// Defaults for newly built assets.
    pub defaults: AssetDefaults,
}

impl ModelConfig {
    /// Reads a configuration from a JSON document.
    pub fn from_reader(reader: impl std::io::Read) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(reader)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn partial_documents() {
        let config = ModelConfig::from_reader(r#"{"units": {"length": "ft"}}"#.as_bytes()).unwrap();
        assert_eq!(config.units.length, LengthUnit::Feet);
        assert_eq!(config.defaults, AssetDefaults::default());

        let config =
            ModelConfig::from_reader(r#"{"defaults": {"pipe": {"diameter": 150}}}"#.as_bytes())
                .unwrap();
        assert_eq!(config.defaults.pipe.diameter, 150.0);
        assert_eq!(config.defaults.pipe.roughness, 130.0);
    }

    #[test]
    fn conversions() {
        assert_eq!(LengthUnit::Meters.convert_from_meters(2.0), 2.0);
        assert!((LengthUnit::Feet.convert_from_meters(0.3048) - 1.0).abs() < 1e-12);
        assert_eq!(LengthUnit::Feet.to_string(), "ft");
    }
}
