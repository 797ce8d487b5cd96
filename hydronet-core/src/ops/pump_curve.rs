use serde::{Deserialize, Serialize};

use crate::asset::{LinkKind, PumpDefinitionType};
use crate::context::EditContext;
use crate::core::AssetId;
use crate::curve::{Curve, CurveId, CurvePoint, CurveType};
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError};

/// A `(flow, head)` sample of a pump curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpCurvePoint {
    /// Flow through the pump.
    pub flow: f64,
    /// Head added at that flow.
    pub head: f64,
}

impl From<PumpCurvePoint> for CurvePoint {
    fn from(point: PumpCurvePoint) -> Self {
        CurvePoint {
            x: point.flow,
            y: point.head,
        }
    }
}

/// How a pump's operating characteristic is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PumpDefinition {
    /// Constant power.
    Power {
        /// The power.
        power: f64,
    },
    /// A single design point.
    DesignPoint {
        /// Curve holding the point.
        curve_id: CurveId,
        /// The design point.
        points: Vec<PumpCurvePoint>,
    },
    /// A three point curve.
    Standard {
        /// Curve holding the points.
        curve_id: CurveId,
        /// The points, by increasing flow.
        points: Vec<PumpCurvePoint>,
    },
}

impl PumpDefinition {
    /// The matching [`PumpDefinitionType`].
    #[must_use]
    pub fn definition_type(&self) -> PumpDefinitionType {
        match self {
            Self::Power { .. } => PumpDefinitionType::Power,
            Self::DesignPoint { .. } => PumpDefinitionType::DesignPoint,
            Self::Standard { .. } => PumpDefinitionType::Standard,
        }
    }
}

/// Changes how a pump is defined, writing its head curve when it has one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePumpCurve {
    /// The pump.
    pub pump_id: AssetId,
    /// Its new definition.
    pub definition: PumpDefinition,
}

impl ChangePumpCurve {
    /// Creates the operation.
    #[must_use]
    pub fn new(pump_id: AssetId, definition: PumpDefinition) -> Self {
        Self {
            pump_id,
            definition,
        }
    }
}

impl ModelOperation for ChangePumpCurve {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        match model.link(self.pump_id).map(|l| &l.kind) {
            Some(LinkKind::Pump(_)) => Ok(()),
            _ => Err(OperationError::InvalidPump(self.pump_id)),
        }
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let mut pump = model
            .link(self.pump_id)
            .ok_or(OperationError::InvalidPump(self.pump_id))?
            .clone();
        let LinkKind::Pump(properties) = &mut pump.kind else {
            return Err(OperationError::InvalidPump(self.pump_id));
        };
        properties.definition_type = self.definition.definition_type();

        let mut put_curves = Vec::new();
        match self.definition {
            PumpDefinition::Power { power } => properties.power = power,
            PumpDefinition::DesignPoint { curve_id, points }
            | PumpDefinition::Standard { curve_id, points } => {
                properties.curve_id = Some(curve_id.clone());
                put_curves.push(Curve {
                    id: curve_id,
                    curve_type: CurveType::Pump,
                    points: points.into_iter().map(CurvePoint::from).collect(),
                });
            }
        }

        Ok(Moment {
            note: Some("Change pump curve".to_string()),
            put_assets: vec![pump.into()],
            put_curves,
            ..Moment::default()
        })
    }
}
