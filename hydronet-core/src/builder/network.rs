//! Declarative construction of complete networks.

use fxhash::{FxHashMap, FxHashSet};
use thiserror::Error;

use crate::asset::{Asset, AssetError, LinkAsset, LinkKind, LinkType, NodeAsset};
use crate::config::{AssetDefaults, Units};
use crate::core::{AssetId, CustomerPointId, Position};
use crate::curve::Curve;
use crate::customer::{CustomerPoint, CustomerPointConnection};
use crate::geometry::nearest_point_on_polyline;
use crate::labels::{LabelGenerator, LabelManager};
use crate::model::{HydraulicModel, ValidationError};
use crate::moment::Moment;

/// Error while building a network with a [`NetworkBuilder`].
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum NetworkBuildError {
    /// The same id was declared twice.
    #[error("Asset id {0} is declared more than once")]
    DuplicateId(AssetId),
    /// A link references an undeclared node.
    #[error("Link {link} references unknown node {node}")]
    UnknownNode {
        /// The link.
        link: AssetId,
        /// The missing endpoint.
        node: AssetId,
    },
    /// A customer point references an undeclared pipe.
    #[error("Customer point {point} references unknown pipe {pipe}")]
    UnknownPipe {
        /// The customer point.
        point: CustomerPointId,
        /// The missing pipe.
        pipe: AssetId,
    },
    /// A link could not be built.
    #[error(transparent)]
    Asset(#[from] AssetError),
    /// The resulting model breaks an invariant.
    #[error("The built network is invalid: {0}")]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Clone)]
struct LinkDeclaration {
    id: AssetId,
    kind: LinkKind,
    start: AssetId,
    end: AssetId,
    vertices: Vec<Position>,
}

#[derive(Debug, Clone)]
struct CustomerPointDeclaration {
    point: CustomerPoint,
    attachment: Option<(AssetId, AssetId)>,
}

/// Builder for a complete [`HydraulicModel`] with explicit ids.
///
/// Link geometries run from the start node to the end node through the
/// declared interior vertices. Assets declared without a label receive a
/// generated one (`J1`, `P1`...) in declaration order, nodes first.
///
/// ```
/// # use hydronet_core::{AssetId, builder::NetworkBuilder};
/// let (j1, j2, p1) = (AssetId::new(1), AssetId::new(2), AssetId::new(3));
/// let model = NetworkBuilder::new()
///     .junction(j1, [0.0, 0.0])
///     .junction(j2, [0.001, 0.0])
///     .pipe(p1, j1, j2)
///     .build()
///     .unwrap();
/// assert_eq!(model.link(p1).unwrap().label, "P1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    units: Units,
    defaults: AssetDefaults,
    nodes: Vec<NodeAsset>,
    links: Vec<LinkDeclaration>,
    customer_points: Vec<CustomerPointDeclaration>,
    curves: Vec<Curve>,
    labels: FxHashMap<AssetId, String>,
    inactive: FxHashSet<AssetId>,
}

impl NetworkBuilder {
    /// An empty network in meters with the stock defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the units of the network.
    #[must_use]
    pub fn with_units(mut self, units: Units) -> Self {
        self.units = units;
        self
    }

    /// Sets the properties given to links declared by type.
    #[must_use]
    pub fn with_defaults(mut self, defaults: AssetDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Declares a fully specified node.
    #[must_use]
    pub fn node(mut self, node: NodeAsset) -> Self {
        self.nodes.push(node);
        self
    }

    /// Declares a junction.
    #[must_use]
    pub fn junction(self, id: AssetId, coordinates: Position) -> Self {
        self.node(NodeAsset::junction(id, coordinates))
    }

    /// Declares a reservoir.
    #[must_use]
    pub fn reservoir(self, id: AssetId, coordinates: Position) -> Self {
        self.node(NodeAsset::reservoir(id, coordinates))
    }

    /// Declares a tank.
    #[must_use]
    pub fn tank(self, id: AssetId, coordinates: Position) -> Self {
        self.node(NodeAsset::tank(id, coordinates))
    }

    /// Declares a link of the given kind through interior vertices.
    #[must_use]
    pub fn link_through(
        mut self,
        id: AssetId,
        kind: LinkKind,
        start: AssetId,
        end: AssetId,
        vertices: impl IntoIterator<Item = Position>,
    ) -> Self {
        self.links.push(LinkDeclaration {
            id,
            kind,
            start,
            end,
            vertices: vertices.into_iter().collect(),
        });
        self
    }

    fn default_kind(&self, link_type: LinkType) -> LinkKind {
        match link_type {
            LinkType::Pipe => LinkKind::Pipe(self.defaults.pipe),
            LinkType::Pump => LinkKind::Pump(self.defaults.pump.clone()),
            LinkType::Valve => LinkKind::Valve(self.defaults.valve),
        }
    }

    /// Declares a straight pipe.
    #[must_use]
    pub fn pipe(self, id: AssetId, start: AssetId, end: AssetId) -> Self {
        self.pipe_through(id, start, end, [])
    }

    /// Declares a pipe through interior vertices.
    #[must_use]
    pub fn pipe_through(
        self,
        id: AssetId,
        start: AssetId,
        end: AssetId,
        vertices: impl IntoIterator<Item = Position>,
    ) -> Self {
        let kind = self.default_kind(LinkType::Pipe);
        self.link_through(id, kind, start, end, vertices)
    }

    /// Declares a straight pump.
    #[must_use]
    pub fn pump(self, id: AssetId, start: AssetId, end: AssetId) -> Self {
        let kind = self.default_kind(LinkType::Pump);
        self.link_through(id, kind, start, end, [])
    }

    /// Declares a straight valve.
    #[must_use]
    pub fn valve(self, id: AssetId, start: AssetId, end: AssetId) -> Self {
        let kind = self.default_kind(LinkType::Valve);
        self.link_through(id, kind, start, end, [])
    }

    /// Overrides the label of a declared asset.
    #[must_use]
    pub fn label(mut self, id: AssetId, label: impl Into<String>) -> Self {
        self.labels.insert(id, label.into());
        self
    }

    /// Marks a declared asset as inactive.
    #[must_use]
    pub fn inactive(mut self, id: AssetId) -> Self {
        self.inactive.insert(id);
        self
    }

    /// Declares a customer point attached to `pipe` and `junction`. The snap
    /// point is the projection of `coordinates` onto the pipe.
    #[must_use]
    pub fn customer_point(
        mut self,
        id: CustomerPointId,
        coordinates: Position,
        base_demand: f64,
        pipe: AssetId,
        junction: AssetId,
    ) -> Self {
        self.customer_points.push(CustomerPointDeclaration {
            point: CustomerPoint::new(id, coordinates, base_demand),
            attachment: Some((pipe, junction)),
        });
        self
    }

    /// Declares a customer point with no connection.
    #[must_use]
    pub fn disconnected_customer_point(
        mut self,
        id: CustomerPointId,
        coordinates: Position,
        base_demand: f64,
    ) -> Self {
        self.customer_points.push(CustomerPointDeclaration {
            point: CustomerPoint::new(id, coordinates, base_demand),
            attachment: None,
        });
        self
    }

    /// Declares a curve.
    #[must_use]
    pub fn curve(mut self, curve: Curve) -> Self {
        self.curves.push(curve);
        self
    }

    /// Builds and validates the model.
    pub fn build(self) -> Result<HydraulicModel, NetworkBuildError> {
        let mut seen = FxHashSet::default();
        let declared_ids = self
            .nodes
            .iter()
            .map(|n| n.id)
            .chain(self.links.iter().map(|l| l.id));
        for id in declared_ids {
            if !seen.insert(id) {
                return Err(NetworkBuildError::DuplicateId(id));
            }
        }

        let node_positions: FxHashMap<AssetId, Position> =
            self.nodes.iter().map(|n| (n.id, n.coordinates)).collect();
        let position_of = |link: AssetId, node: AssetId| {
            node_positions
                .get(&node)
                .copied()
                .ok_or(NetworkBuildError::UnknownNode { link, node })
        };

        let mut links = Vec::with_capacity(self.links.len());
        for decl in self.links {
            let mut coordinates = vec![position_of(decl.id, decl.start)?];
            coordinates.extend(decl.vertices);
            coordinates.push(position_of(decl.id, decl.end)?);
            let link = LinkAsset::new(decl.id, coordinates, decl.kind, self.units.length)?
                .with_connections(decl.start, decl.end);
            links.push(link);
        }

        let mut assets: Vec<Asset> = self
            .nodes
            .into_iter()
            .map(Asset::from)
            .chain(links.into_iter().map(Asset::from))
            .collect();

        let mut labels = LabelManager::new();
        for asset in &mut assets {
            if let Some(label) = self.labels.get(&asset.id()) {
                asset.set_label(label.clone());
            }
            if self.inactive.contains(&asset.id()) {
                asset.set_active(false);
            }
            if !asset.label().is_empty() {
                labels.register(asset.label(), asset.asset_type(), asset.id());
            }
        }
        for asset in &mut assets {
            if asset.label().is_empty() {
                let label = labels.generate_for(asset.asset_type(), asset.id());
                asset.set_label(label);
            }
        }

        let mut customer_points = Vec::with_capacity(self.customer_points.len());
        for CustomerPointDeclaration { mut point, attachment } in self.customer_points {
            if let Some((pipe_id, junction_id)) = attachment {
                let pipe = assets
                    .iter()
                    .find_map(|a| a.as_pipe().filter(|p| p.id == pipe_id))
                    .ok_or(NetworkBuildError::UnknownPipe {
                        point: point.id,
                        pipe: pipe_id,
                    })?;
                let snap_point = nearest_point_on_polyline(pipe.coordinates(), point.coordinates)
                    .map_or(pipe.first_vertex(), |nearest| nearest.position);
                point.connect(CustomerPointConnection {
                    pipe_id,
                    snap_point,
                    junction_id,
                });
            }
            customer_points.push(point);
        }

        let import = Moment {
            note: Some("Import".to_string()),
            put_assets: assets,
            put_customer_points: customer_points,
            put_curves: self.curves,
            ..Moment::default()
        };
        let mut model = HydraulicModel::new(self.units);
        model.apply(&import, &mut labels);
        model.validate()?;
        Ok(model)
    }
}
