//! JSON network documents.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{HydraulicModel, ValidationError};
use crate::asset::Asset;
use crate::config::Units;
use crate::curve::Curve;
use crate::customer::CustomerPoint;
use crate::labels::LabelManager;
use crate::moment::Moment;

/// Error while loading a network document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The document is not valid JSON or does not match the schema.
    #[error("Malformed network document: {0}")]
    Json(#[from] serde_json::Error),
    /// The document describes an inconsistent network.
    #[error("Invalid network: {0}")]
    Invalid(#[from] ValidationError),
}

/// Serialized form of a [`HydraulicModel`].
///
/// Only primary data is stored. The topology, the asset index and the
/// customer points lookup are rebuilt on load, and simulation results are
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDocument {
    /// Units of the network.
    pub units: Units,
    /// Nodes and links.
    pub assets: Vec<Asset>,
    /// Customer points.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub customer_points: Vec<CustomerPoint>,
    /// Curves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub curves: Vec<Curve>,
}

impl HydraulicModel {
    /// Builds a model from a document and checks its invariants.
    pub fn from_document(document: NetworkDocument) -> Result<Self, ValidationError> {
        let import = Moment {
            note: Some("Import".to_string()),
            put_assets: document.assets,
            put_customer_points: document.customer_points,
            put_curves: document.curves,
            ..Moment::default()
        };
        let mut model = Self::new(document.units);
        model.apply(&import, &mut LabelManager::new());
        model.validate()?;
        Ok(model)
    }

    /// The document describing this model.
    #[must_use]
    pub fn to_document(&self) -> NetworkDocument {
        NetworkDocument {
            units: self.units,
            assets: self.assets().cloned().collect(),
            customer_points: self.customer_points().cloned().collect(),
            curves: self.curves().cloned().collect(),
        }
    }

    /// Reads a JSON network document.
    pub fn load(reader: impl std::io::Read) -> Result<Self, LoadError> {
        let document: NetworkDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document)?)
    }

    /// Writes the model as a pretty-printed JSON network document.
    pub fn store(&self, writer: impl std::io::Write) -> Result<(), serde_json::Error> {
        serde_json::to_writer_pretty(writer, &self.to_document())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::config::LengthUnit;
    use crate::core::{AssetId, CustomerPointId};
    use crate::curve::Curve;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    const NETWORK: &str = r#"{
        "units": {"length": "ft"},
        "assets": [
            {"id": 1, "label": "J1", "type": "junction", "coordinates": [0.0, 0.0],
             "elevation": 10.0, "base_demand": 2.0},
            {"id": 2, "label": "R1", "type": "reservoir", "coordinates": [0.001, 0.0],
             "head": 50.0},
            {"id": 3, "label": "P1", "type": "pipe", "coordinates": [[0.0, 0.0], [0.001, 0.0]],
             "connections": [1, 2], "length": 364.81, "diameter": 200.0},
            {"id": 4, "label": "PU1", "type": "pump", "coordinates": [[0.001, 0.0], [0.002, 0.0]],
             "connections": [2, 5], "is_active": false, "curve_id": "4"},
            {"id": 5, "label": "T1", "type": "tank", "coordinates": [0.002, 0.0],
             "is_active": false, "diameter": 12.0}
        ],
        "customer_points": [
            {"id": 1, "coordinates": [0.0002, 0.0001], "base_demand": 0.5,
             "connection": {"pipe_id": 3, "snap_point": [0.0002, 0.0], "junction_id": 1}}
        ],
        "curves": [{"id": "4", "type": "pump", "points": [{"x": 1.0, "y": 1.0}]}]
    }"#;

    #[test]
    fn loads_documents() {
        let model = HydraulicModel::load(NETWORK.as_bytes()).unwrap();
        assert_eq!(model.units().length, LengthUnit::Feet);
        assert_eq!(model.nodes().count(), 3);
        let pipe = model.pipe(AssetId::new(3)).unwrap();
        assert_eq!(pipe.pipe_properties().map(|p| p.diameter), Some(200.0));
        assert_eq!(pipe.pipe_properties().map(|p| p.roughness), Some(130.0));
        assert_eq!(pipe.length(), 364.81);
        assert!(!model.link(AssetId::new(4)).unwrap().is_active);
        assert_eq!(model.customer_demand(AssetId::new(1)), 0.5);
        assert_eq!(model.total_demand(), 2.5);
        assert!(model.curve("4").is_some());
        assert_eq!(model.validate_active_topology(), Ok(()));
    }

    #[test]
    fn store_then_load() {
        let model = NetworkBuilder::new()
            .junction(AssetId::new(1), [0.0, 0.0])
            .tank(AssetId::new(2), [0.0, 0.001])
            .valve(AssetId::new(3), AssetId::new(1), AssetId::new(2))
            .disconnected_customer_point(CustomerPointId::new(9), [1.0, 1.0], 3.0)
            .curve(Curve::pump_stub("c"))
            .build()
            .unwrap();
        let mut buffer = Vec::new();
        model.store(&mut buffer).unwrap();
        assert_eq!(HydraulicModel::load(buffer.as_slice()).unwrap(), model);
    }

    #[rstest]
    #[case::not_json("{")]
    #[case::unknown_type(r#"{"assets": [{"id": 1, "type": "hydrant", "coordinates": [0.0, 0.0]}]}"#)]
    fn malformed_documents(#[case] document: &str) {
        assert!(matches!(
            HydraulicModel::load(document.as_bytes()),
            Err(LoadError::Json(_))
        ));
    }

    #[test]
    fn inconsistent_documents() {
        let document = r#"{"assets": [
            {"id": 3, "type": "pipe", "coordinates": [[0.0, 0.0], [0.001, 0.0]],
             "connections": [1, 2]}
        ]}"#;
        assert!(matches!(
            HydraulicModel::load(document.as_bytes()),
            Err(LoadError::Invalid(ValidationError::MissingEndpoint { .. }))
        ));
    }
}
