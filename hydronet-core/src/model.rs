//! The live hydraulic model and its persistence boundary.
//!
//! A [`HydraulicModel`] owns the asset table together with the indices derived
//! from it: the [`Topology`], the [`AssetIndex`] and the
//! [`CustomerPointsLookup`]. Model operations only read it; every change goes
//! through [`HydraulicModel::apply`], which keeps the indices in sync and
//! returns the inverse moment.

mod serialize;
mod validate;

pub use serialize::{LoadError, NetworkDocument};
pub use validate::ValidationError;

use std::collections::BTreeMap;

use tracing::debug;

use crate::asset::{Asset, LinkAsset, NodeAsset};
use crate::asset_index::AssetIndex;
use crate::config::Units;
use crate::core::{AssetId, CustomerPointId};
use crate::curve::{Curve, CurveId};
use crate::customer::{CustomerPoint, CustomerPointsLookup};
use crate::labels::LabelManager;
use crate::moment::Moment;
use crate::simulation::SimulationResults;
use crate::topology::Topology;

/// A water distribution network.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydraulicModel {
    units: Units,
    assets: BTreeMap<AssetId, Asset>,
    topology: Topology,
    index: AssetIndex,
    customer_points: BTreeMap<CustomerPointId, CustomerPoint>,
    lookup: CustomerPointsLookup,
    curves: BTreeMap<CurveId, Curve>,
    simulation: Option<SimulationResults>,
}

impl HydraulicModel {
    /// An empty model.
    #[must_use]
    pub fn new(units: Units) -> Self {
        Self {
            units,
            ..Self::default()
        }
    }

    /// Units of the model.
    #[inline]
    #[must_use]
    pub fn units(&self) -> Units {
        self.units
    }

    /// Looks up an asset.
    #[inline]
    #[must_use]
    pub fn asset(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: AssetId) -> Option<&NodeAsset> {
        self.asset(id).and_then(Asset::as_node)
    }

    /// Looks up a link.
    #[must_use]
    pub fn link(&self, id: AssetId) -> Option<&LinkAsset> {
        self.asset(id).and_then(Asset::as_link)
    }

    /// Looks up a pipe.
    #[must_use]
    pub fn pipe(&self, id: AssetId) -> Option<&LinkAsset> {
        self.link(id).filter(|l| l.is_pipe())
    }

    /// Every asset, in id order.
    pub fn assets(&self) -> impl Iterator<Item = &Asset> + '_ {
        self.assets.values()
    }

    /// Every node, in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeAsset> + '_ {
        self.assets.values().filter_map(Asset::as_node)
    }

    /// Every link, in id order.
    pub fn links(&self) -> impl Iterator<Item = &LinkAsset> + '_ {
        self.assets.values().filter_map(Asset::as_link)
    }

    /// The links incident to a node.
    pub fn links_of(&self, node: AssetId) -> impl Iterator<Item = &LinkAsset> + '_ {
        self.topology.links(node).filter_map(|id| self.link(id))
    }

    /// The adjacency index.
    #[inline]
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// The node/link classification.
    #[inline]
    #[must_use]
    pub fn index(&self) -> &AssetIndex {
        &self.index
    }

    /// The customer points reverse index.
    #[inline]
    #[must_use]
    pub fn customer_points_lookup(&self) -> &CustomerPointsLookup {
        &self.lookup
    }

    /// Looks up a customer point.
    #[must_use]
    pub fn customer_point(&self, id: CustomerPointId) -> Option<&CustomerPoint> {
        self.customer_points.get(&id)
    }

    /// Every customer point, in id order.
    pub fn customer_points(&self) -> impl Iterator<Item = &CustomerPoint> + '_ {
        self.customer_points.values()
    }

    /// The customer points attached to a pipe or junction.
    pub fn customer_points_on(&self, asset: AssetId) -> impl Iterator<Item = &CustomerPoint> + '_ {
        self.lookup
            .customer_points(asset)
            .filter_map(|id| self.customer_points.get(&id))
    }

    /// Demand of the customers attached to a junction.
    #[must_use]
    pub fn customer_demand(&self, junction: AssetId) -> f64 {
        self.customer_points_on(junction)
            .filter(|cp| cp.junction_id() == Some(junction))
            .map(|cp| cp.base_demand)
            .sum()
    }

    /// Sum of the junction base demands and the connected customer demands.
    #[must_use]
    pub fn total_demand(&self) -> f64 {
        let junctions: f64 = self.nodes().filter_map(NodeAsset::base_demand).sum();
        let customers: f64 = self
            .customer_points()
            .filter(|cp| cp.is_connected())
            .map(|cp| cp.base_demand)
            .sum();
        junctions + customers
    }

    /// Looks up a curve.
    #[must_use]
    pub fn curve(&self, id: &str) -> Option<&Curve> {
        self.curves.get(id)
    }

    /// Every curve, in id order.
    pub fn curves(&self) -> impl Iterator<Item = &Curve> + '_ {
        self.curves.values()
    }

    /// The largest asset id in use.
    #[must_use]
    pub fn max_asset_id(&self) -> AssetId {
        self.assets.keys().next_back().copied().unwrap_or_default()
    }

    /// Results of the last simulation, cleared by any change.
    #[must_use]
    pub fn simulation(&self) -> Option<&SimulationResults> {
        self.simulation.as_ref()
    }

    /// Attaches simulation results. Results never travel through moments.
    pub fn attach_simulation(&mut self, results: SimulationResults) {
        self.simulation = Some(results);
    }

    /// Inserts or replaces an asset, keeping the indices in sync. Returns the
    /// replaced version.
    fn put_asset(&mut self, asset: Asset, labels: &mut LabelManager) -> Option<Asset> {
        let id = asset.id();
        let old = self.assets.remove(&id);
        if let Some(old) = &old {
            if old.is_link() {
                self.topology.remove_link(id);
            }
            labels.remove(old.label(), old.asset_type(), id);
        }
        match &asset {
            Asset::Node(_) => {
                self.index.add_node(id);
            }
            Asset::Link(link) => {
                self.index.add_link(id);
                self.topology.add_link(id, link.start(), link.end());
            }
        }
        labels.register(asset.label(), asset.asset_type(), id);
        self.assets.insert(id, asset);
        old
    }

    /// Removes an asset from the table and every index.
    fn remove_asset(&mut self, id: AssetId, labels: &mut LabelManager) -> Option<Asset> {
        let asset = self.assets.remove(&id)?;
        self.index.remove(id);
        self.topology.remove_node(id);
        self.topology.remove_link(id);
        labels.remove(asset.label(), asset.asset_type(), id);
        Some(asset)
    }

    fn put_customer_point(&mut self, point: CustomerPoint) -> Option<CustomerPoint> {
        let old = self.customer_points.remove(&point.id);
        if let Some(old) = &old {
            self.lookup.remove_connection(old);
        }
        self.lookup.add_connection(&point);
        self.customer_points.insert(point.id, point);
        old
    }

    fn remove_customer_point(&mut self, id: CustomerPointId) -> Option<CustomerPoint> {
        let old = self.customer_points.remove(&id)?;
        self.lookup.remove_connection(&old);
        Some(old)
    }

    /// Applies a moment and returns the moment that undoes it.
    ///
    /// Deletions are processed first, then asset puts, then customer points
    /// and curves. Labels of removed and inserted assets are kept in sync in
    /// `labels`. Unknown ids in the delete lists are ignored.
    pub fn apply(&mut self, moment: &Moment, labels: &mut LabelManager) -> Moment {
        debug!(
            note = moment.note(),
            put = moment.put_assets.len(),
            delete = moment.delete_assets.len(),
            customer_points = moment.put_customer_points.len(),
            "applying moment"
        );
        let mut reverse = Moment::new(moment.note.as_deref().unwrap_or("Reverse"));

        for &id in &moment.delete_assets {
            if let Some(old) = self.remove_asset(id, labels) {
                reverse.put_assets.push(old);
            }
        }

        for asset in &moment.put_assets {
            let id = asset.id();
            match self.put_asset(asset.clone(), labels) {
                Some(old) => reverse.put_assets.push(old),
                None => reverse.delete_assets.push(id),
            }
        }

        for &id in &moment.delete_customer_points {
            if let Some(old) = self.remove_customer_point(id) {
                reverse.put_customer_points.push(old);
            }
        }

        for point in &moment.put_customer_points {
            let id = point.id;
            match self.put_customer_point(point.clone()) {
                Some(old) => reverse.put_customer_points.push(old),
                None => reverse.delete_customer_points.push(id),
            }
        }

        for id in &moment.delete_curves {
            if let Some(old) = self.curves.remove(id) {
                reverse.put_curves.push(old);
            }
        }

        for curve in &moment.put_curves {
            match self.curves.insert(curve.id.clone(), curve.clone()) {
                Some(old) => reverse.put_curves.push(old),
                None => reverse.delete_curves.push(curve.id.clone()),
            }
        }

        self.simulation = None;
        reverse
    }

    /// A moment that rebuilds this model when applied to an empty one.
    #[must_use]
    pub fn to_snapshot_moment(&self) -> Moment {
        Moment {
            note: Some("Import".to_string()),
            put_assets: self.assets.values().cloned().collect(),
            put_customer_points: self.customer_points.values().cloned().collect(),
            put_curves: self.curves.values().cloned().collect(),
            ..Moment::default()
        }
    }

    /// Rebuilds a model by applying `moments` in order to an empty model.
    pub fn replay<'a>(
        units: Units,
        moments: impl IntoIterator<Item = &'a Moment>,
        labels: &mut LabelManager,
    ) -> Self {
        let mut model = Self::new(units);
        for moment in moments {
            model.apply(moment, labels);
        }
        model
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::curve::Curve;
    use crate::customer::CustomerPointConnection;
    use crate::simulation::AssetResult;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const J1: AssetId = AssetId::new(1);
    const J2: AssetId = AssetId::new(2);
    const J3: AssetId = AssetId::new(3);
    const P1: AssetId = AssetId::new(4);
    const P2: AssetId = AssetId::new(5);
    const CP1: CustomerPointId = CustomerPointId::new(1);

    #[fixture]
    fn model() -> HydraulicModel {
        NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .junction(J2, [0.001, 0.0])
            .junction(J3, [0.002, 0.0])
            .pipe(P1, J1, J2)
            .pipe(P2, J2, J3)
            .customer_point(CP1, [0.0005, 0.0001], 2.0, P1, J1)
            .build()
            .unwrap()
    }

    #[rstest]
    fn queries(model: HydraulicModel) {
        assert_eq!(model.links_of(J2).map(|l| l.id).collect::<Vec<_>>(), [P1, P2]);
        assert_eq!(model.pipe(P1).map(|p| p.connections), Some([J1, J2]));
        assert!(model.pipe(J1).is_none());
        assert_eq!(model.customer_demand(J1), 2.0);
        assert_eq!(model.customer_demand(J2), 0.0);
        assert_eq!(model.max_asset_id(), P2);
        assert_eq!(model.index().node_count(), 3);
    }

    #[rstest]
    fn apply_returns_the_inverse(mut model: HydraulicModel) {
        let mut labels = LabelManager::new();
        let before = model.clone();

        let mut rewired = model.link(P2).unwrap().clone();
        rewired.connections = [J1, J3];
        let new_junction = NodeAsset::junction(AssetId::new(10), [1.0, 1.0]).with_label("J10");
        let mut moved_point = model.customer_point(CP1).unwrap().copy_disconnected();
        moved_point.connect(CustomerPointConnection {
            pipe_id: P2,
            snap_point: [0.0015, 0.0],
            junction_id: J3,
        });
        let forward = Moment {
            note: Some("Edit".to_string()),
            put_assets: vec![rewired.into(), new_junction.into()],
            delete_assets: vec![P1],
            put_customer_points: vec![moved_point],
            put_curves: vec![Curve::pump_stub("7")],
            ..Moment::default()
        };

        let reverse = model.apply(&forward, &mut labels);
        assert_eq!(reverse.note(), "Edit");
        assert_eq!(model.topology().nodes(P2), Some([J1, J3]));
        assert!(!model.topology().has_link(P1));
        assert!(!model.index().has_link(P1));
        assert_eq!(model.customer_demand(J3), 2.0);
        assert!(model.curve("7").is_some());
        assert_eq!(labels.count("J10"), 1);

        model.apply(&reverse, &mut labels);
        assert_eq!(model, before);
        assert_eq!(labels.count("J10"), 0);
    }

    #[rstest]
    fn snapshot_replays_to_an_equal_model(model: HydraulicModel) {
        let mut labels = LabelManager::new();
        let snapshot = model.to_snapshot_moment();
        let rebuilt = HydraulicModel::replay(model.units(), [&snapshot], &mut labels);
        assert_eq!(rebuilt, model);
        assert_eq!(labels.count("P1"), 1);
    }

    #[rstest]
    fn changes_clear_simulation_results(mut model: HydraulicModel) {
        let mut results = SimulationResults::default();
        results.insert(J1, AssetResult::Junction { pressure: 1.0, head: 2.0, demand: 0.0 });
        model.attach_simulation(results);
        assert!(model.simulation().is_some());
        model.apply(&Moment::new("Nothing"), &mut LabelManager::new());
        assert!(model.simulation().is_none());
    }
}
