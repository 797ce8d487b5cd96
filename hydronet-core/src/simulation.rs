//! Simulation results attached to a model.
//!
//! Results are a side channel: they are read from a solver through a
//! [`ResultsReader`], attached with
//! [`HydraulicModel::attach_simulation`](crate::HydraulicModel::attach_simulation)
//! and dropped on the next applied moment. They never appear in moments.

use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::asset::{Asset, AssetType};
use crate::core::AssetId;
use crate::HydraulicModel;

/// Computed state of a single asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssetResult {
    /// Junction results.
    Junction {
        /// Pressure.
        pressure: f64,
        /// Hydraulic head.
        head: f64,
        /// Actual demand.
        demand: f64,
    },
    /// Tank results.
    Tank {
        /// Pressure.
        pressure: f64,
        /// Hydraulic head.
        head: f64,
        /// Water level.
        level: f64,
        /// Stored volume.
        volume: f64,
    },
    /// Pipe results.
    Pipe {
        /// Flow rate.
        flow: f64,
        /// Flow velocity.
        velocity: f64,
        /// Head loss along the pipe.
        headloss: f64,
        /// Whether the pipe carries flow.
        open: bool,
    },
    /// Pump results.
    Pump {
        /// Flow rate.
        flow: f64,
        /// Head gain, as a negative loss.
        headloss: f64,
        /// Whether the pump runs.
        on: bool,
    },
    /// Valve results.
    Valve {
        /// Flow rate.
        flow: f64,
        /// Flow velocity.
        velocity: f64,
        /// Head loss across the valve.
        headloss: f64,
    },
}

/// Source of per-asset results, typically a solver output file.
pub trait ResultsReader {
    /// Reads the results of an asset, `None` if the asset was not simulated.
    fn read(&self, asset_type: AssetType, id: AssetId) -> Option<AssetResult>;
}

/// Results of a simulation run, by asset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    results: FxHashMap<AssetId, AssetResult>,
}

impl SimulationResults {
    /// Reads the results of every asset of `model`. Reservoirs have no
    /// results.
    pub fn collect(model: &HydraulicModel, reader: &impl ResultsReader) -> Self {
        let results = model
            .assets()
            .filter(|asset| asset.asset_type() != AssetType::Reservoir)
            .filter_map(|asset: &Asset| {
                reader
                    .read(asset.asset_type(), asset.id())
                    .map(|r| (asset.id(), r))
            })
            .collect();
        Self { results }
    }

    /// Records the results of an asset.
    pub fn insert(&mut self, id: AssetId, result: AssetResult) {
        self.results.insert(id, result);
    }

    /// The results of an asset.
    #[must_use]
    pub fn get(&self, id: AssetId) -> Option<&AssetResult> {
        self.results.get(&id)
    }

    /// Number of assets with results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no asset has results.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;

    struct ConstantPressure;

    impl ResultsReader for ConstantPressure {
        fn read(&self, asset_type: AssetType, _id: AssetId) -> Option<AssetResult> {
            match asset_type {
                AssetType::Junction => Some(AssetResult::Junction {
                    pressure: 30.0,
                    head: 40.0,
                    demand: 1.0,
                }),
                _ => None,
            }
        }
    }

    #[test]
    fn collects_known_assets() {
        let (r1, j1, p1) = (AssetId::new(1), AssetId::new(2), AssetId::new(3));
        let model = NetworkBuilder::new()
            .reservoir(r1, [0.0, 0.0])
            .junction(j1, [0.0, 0.001])
            .pipe(p1, r1, j1)
            .build()
            .unwrap();
        let results = SimulationResults::collect(&model, &ConstantPressure);
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results.get(j1),
            Some(AssetResult::Junction { pressure, .. }) if *pressure == 30.0
        ));
        assert!(results.get(r1).is_none());
    }
}
