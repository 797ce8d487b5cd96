//! Attaching customer points to pipes and detaching them.

use serde::{Deserialize, Serialize};

use crate::asset::NodeAsset;
use crate::context::EditContext;
use crate::core::{AssetId, CustomerPointId, Position};
use crate::customer::{CustomerPoint, CustomerPointConnection};
use crate::model::HydraulicModel;
use crate::moment::Moment;

use super::{ModelOperation, OperationError, find_junction_for_customer_point};

/// Connects customer points to a pipe at the given snap points.
///
/// Each point receives its demand through the junction end of the pipe
/// nearest to its snap point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectCustomers {
    /// The points to connect.
    pub customer_point_ids: Vec<CustomerPointId>,
    /// The pipe to connect them to.
    pub pipe_id: AssetId,
    /// Snap point of each customer point, in order.
    pub snap_points: Vec<Position>,
}

impl ConnectCustomers {
    /// Creates the operation from `(point, snap point)` pairs.
    #[must_use]
    pub fn new(
        pipe_id: AssetId,
        points: impl IntoIterator<Item = (CustomerPointId, Position)>,
    ) -> Self {
        let (customer_point_ids, snap_points) = points.into_iter().unzip();
        Self {
            customer_point_ids,
            pipe_id,
            snap_points,
        }
    }

    fn endpoints<'m>(
        &self,
        model: &'m HydraulicModel,
    ) -> Result<(&'m NodeAsset, &'m NodeAsset), OperationError> {
        if self.customer_point_ids.len() != self.snap_points.len() {
            return Err(OperationError::SnapPointCountMismatch);
        }
        let pipe = self.pipe_id;
        let link = model.pipe(pipe).ok_or(OperationError::PipeNotFound(pipe))?;
        let start = model
            .node(link.start())
            .ok_or(OperationError::StartNodeNotFound { node: link.start(), pipe })?;
        let end = model
            .node(link.end())
            .ok_or(OperationError::EndNodeNotFound { node: link.end(), pipe })?;
        Ok((start, end))
    }

    fn connected(
        &self,
        model: &HydraulicModel,
        (start, end): (&NodeAsset, &NodeAsset),
    ) -> Result<Vec<CustomerPoint>, OperationError> {
        self.customer_point_ids
            .iter()
            .zip(&self.snap_points)
            .map(|(&id, &snap_point)| {
                let point = model
                    .customer_point(id)
                    .ok_or(OperationError::CustomerPointNotFound(id))?;
                let junction_id = find_junction_for_customer_point(start, end, snap_point)
                    .ok_or(OperationError::NoJunction { point: id, pipe: self.pipe_id })?;
                Ok(point.copy_disconnected().connected(CustomerPointConnection {
                    pipe_id: self.pipe_id,
                    snap_point,
                    junction_id,
                }))
            })
            .collect()
    }
}

impl ModelOperation for ConnectCustomers {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        let endpoints = self.endpoints(model)?;
        self.connected(model, endpoints).map(|_| ())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let endpoints = self.endpoints(model)?;
        Ok(Moment {
            note: Some("Connect customers".to_string()),
            put_customer_points: self.connected(model, endpoints)?,
            ..Moment::default()
        })
    }
}

/// Detaches customer points from the network.
///
/// Fails if any of the points does not exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisconnectCustomers {
    /// The points to disconnect.
    pub customer_point_ids: Vec<CustomerPointId>,
}

impl DisconnectCustomers {
    /// Creates the operation.
    #[must_use]
    pub fn new(customer_point_ids: impl IntoIterator<Item = CustomerPointId>) -> Self {
        Self {
            customer_point_ids: customer_point_ids.into_iter().collect(),
        }
    }

    fn points<'m>(
        &self,
        model: &'m HydraulicModel,
    ) -> Result<Vec<&'m CustomerPoint>, OperationError> {
        self.customer_point_ids
            .iter()
            .map(|&id| {
                model
                    .customer_point(id)
                    .ok_or(OperationError::CustomerPointNotFound(id))
            })
            .collect()
    }
}

impl ModelOperation for DisconnectCustomers {
    fn verify(&self, model: &HydraulicModel) -> Result<(), OperationError> {
        self.points(model).map(|_| ())
    }

    fn compute(
        self,
        model: &HydraulicModel,
        _context: &mut EditContext,
    ) -> Result<Moment, OperationError> {
        let put_customer_points = self
            .points(model)?
            .into_iter()
            .map(CustomerPoint::copy_disconnected)
            .collect();
        Ok(Moment {
            note: Some("Disconnect customers".to_string()),
            put_customer_points,
            ..Moment::default()
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::NetworkBuilder;
    use crate::ops::test::{J1, J2, J3, P1, P2, context, run};
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    const CP1: CustomerPointId = CustomerPointId::new(1);
    const CP2: CustomerPointId = CustomerPointId::new(2);

    /// A line ending in a tank, with two loose customers.
    #[fixture]
    fn customers() -> HydraulicModel {
        NetworkBuilder::new()
            .junction(J1, [0.0, 0.0])
            .junction(J2, [0.001, 0.0])
            .tank(J3, [0.002, 0.0])
            .pipe(P1, J1, J2)
            .pipe(P2, J2, J3)
            .disconnected_customer_point(CP1, [0.0002, 0.0001], 1.5)
            .disconnected_customer_point(CP2, [0.0009, 0.0001], 2.5)
            .build()
            .unwrap()
    }

    #[rstest]
    fn connecting_to_the_nearest_junction(mut customers: HydraulicModel) {
        let mut ctx = context(&customers);
        let op = ConnectCustomers::new(P1, [(CP1, [0.0002, 0.0]), (CP2, [0.0009, 0.0])]);
        let moment = run(&mut customers, &mut ctx, op);
        assert_eq!(moment.note(), "Connect customers");
        assert_eq!(customers.customer_point(CP1).unwrap().junction_id(), Some(J1));
        assert_eq!(customers.customer_point(CP2).unwrap().junction_id(), Some(J2));
        assert_eq!(customers.customer_demand(J2), 2.5);

        // Reconnecting moves the demand
        let op = ConnectCustomers::new(P2, [(CP2, [0.0019, 0.0])]);
        run(&mut customers, &mut ctx, op);
        assert_eq!(customers.customer_point(CP2).unwrap().pipe_id(), Some(P2));
        assert_eq!(customers.customer_demand(J2), 2.5);
        assert_eq!(customers.customer_points_on(P1).count(), 1);
    }

    #[rstest]
    fn disconnecting_is_idempotent(mut customers: HydraulicModel) {
        let mut ctx = context(&customers);
        run(
            &mut customers,
            &mut ctx,
            ConnectCustomers::new(P1, [(CP1, [0.0002, 0.0])]),
        );
        let moment = run(&mut customers, &mut ctx, DisconnectCustomers::new([CP1, CP2]));
        assert_eq!(moment.note(), "Disconnect customers");
        assert_eq!(moment.put_customer_points.len(), 2);
        assert!(customers.customer_points().all(|p| !p.is_connected()));
        assert_eq!(customers.customer_demand(J1), 0.0);

        let again = run(&mut customers, &mut ctx, DisconnectCustomers::new([CP1]));
        assert_eq!(again.put_customer_points.len(), 1);
        assert!(!customers.customer_point(CP1).unwrap().is_connected());
    }

    #[rstest]
    fn disconnecting_an_unknown_point(customers: HydraulicModel) {
        let op = DisconnectCustomers::new([CP1, CustomerPointId::new(999)]);
        assert_eq!(
            op.verify(&customers),
            Err(OperationError::CustomerPointNotFound(CustomerPointId::new(999)))
        );
        assert_eq!(
            op.compute(&customers, &mut context(&customers))
                .unwrap_err()
                .to_string(),
            "Customer point with id 999 not found"
        );
    }

    #[rstest]
    #[case::count_mismatch(
        ConnectCustomers { customer_point_ids: vec![CP1, CP2], pipe_id: P1, snap_points: vec![[0.0, 0.0]] },
        "Customer point IDs and snap points arrays must have the same length"
    )]
    #[case::missing_pipe(
        ConnectCustomers::new(AssetId::new(9), [(CP1, [0.0, 0.0])]),
        "Pipe with id 9 not found"
    )]
    #[case::missing_point(
        ConnectCustomers::new(P1, [(CustomerPointId::new(7), [0.0, 0.0])]),
        "Customer point with id 7 not found"
    )]
    fn invalid_connections(
        customers: HydraulicModel,
        #[case] op: ConnectCustomers,
        #[case] message: &str,
    ) {
        assert_eq!(op.verify(&customers).unwrap_err().to_string(), message);
    }

    #[test]
    fn no_junction_to_connect_to() {
        let model = NetworkBuilder::new()
            .reservoir(J1, [0.0, 0.0])
            .tank(J2, [0.001, 0.0])
            .pipe(P1, J1, J2)
            .disconnected_customer_point(CP1, [0.0005, 0.0001], 1.0)
            .build()
            .unwrap();
        let err = ConnectCustomers::new(P1, [(CP1, [0.0005, 0.0])])
            .compute(&model, &mut context(&model))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "No junction found to connect customer point 1 to pipe 4"
        );
    }
}
