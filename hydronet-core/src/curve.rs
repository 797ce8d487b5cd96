//! Data curves referenced by pumps and valves.

use serde::{Deserialize, Serialize};

/// Identifier of a curve.
pub type CurveId = String;

/// What a curve describes.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    /// Head against flow.
    #[default]
    Pump,
    /// Efficiency against flow.
    Efficiency,
    /// Volume against depth.
    Volume,
    /// Loss coefficient against opening.
    Valve,
    /// Head loss against flow.
    Headloss,
}

/// A single `(x, y)` sample of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Abscissa.
    pub x: f64,
    /// Ordinate.
    pub y: f64,
}

/// A named curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    /// Identifier, unique in the model.
    pub id: CurveId,
    /// What the curve describes.
    #[serde(rename = "type")]
    pub curve_type: CurveType,
    /// Samples, ordered by `x`.
    pub points: Vec<CurvePoint>,
}

impl Curve {
    /// The placeholder curve attached to a freshly drawn pump.
    #[must_use]
    pub fn pump_stub(id: impl Into<CurveId>) -> Self {
        Self {
            id: id.into(),
            curve_type: CurveType::Pump,
            points: vec![CurvePoint { x: 1.0, y: 1.0 }],
        }
    }
}
