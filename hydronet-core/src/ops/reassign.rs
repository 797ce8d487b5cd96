//! Re-snapping of customer points after their pipe changes.

use indexmap::IndexMap;

use crate::asset::{LinkAsset, NodeAsset};
use crate::core::{CustomerPointId, Position};
use crate::customer::{CustomerPoint, CustomerPointConnection};
use crate::geometry::{haversine_distance, nearest_point_on_polyline};
use crate::model::HydraulicModel;

/// Customer points updated by an operation, by id. A later update of the
/// same point replaces the earlier one.
pub(super) type UpdatedCustomerPoints = IndexMap<CustomerPointId, CustomerPoint>;

/// The junction among `start` and `end` nearest to `snap_point`.
///
/// Only junctions receive customer demand; ties go to `start`.
#[must_use]
pub fn find_junction_for_customer_point(
    start: &NodeAsset,
    end: &NodeAsset,
    snap_point: Position,
) -> Option<crate::core::AssetId> {
    [start, end]
        .into_iter()
        .filter(|node| node.is_junction())
        .map(|node| (node.id, haversine_distance(node.coordinates, snap_point)))
        .fold(None, |best, (id, distance)| match best {
            Some((_, best_distance)) if best_distance <= distance => best,
            _ => Some((id, distance)),
        })
        .map(|(id, _)| id)
}

/// Projects a point onto a polyline, falling back to its first vertex.
pub(super) fn snap_onto(coordinates: &[Position], position: Position) -> Position {
    nearest_point_on_polyline(coordinates, position)
        .map_or_else(|| coordinates.first().copied().unwrap_or(position), |n| n.position)
}

/// A disconnected copy of `point`, reconnected to `pipe` at `snap_point` if
/// either endpoint is a junction.
pub(super) fn reconnect(
    point: &CustomerPoint,
    pipe: &LinkAsset,
    endpoints: Option<(&NodeAsset, &NodeAsset)>,
    snap_point: Position,
) -> CustomerPoint {
    let mut copy = point.copy_disconnected();
    let junction = endpoints
        .and_then(|(start, end)| find_junction_for_customer_point(start, end, snap_point));
    if let Some(junction_id) = junction {
        copy.connect(CustomerPointConnection {
            pipe_id: pipe.id,
            snap_point,
            junction_id,
        });
    }
    copy
}

/// The endpoints of `link`, with `anchor` standing in for the model's
/// version of the node it replaces.
pub(super) fn endpoints_with<'a>(
    model: &'a HydraulicModel,
    link: &LinkAsset,
    anchor: &'a NodeAsset,
) -> Option<(&'a NodeAsset, &'a NodeAsset)> {
    let resolve = |id| {
        if id == anchor.id {
            Some(anchor)
        } else {
            model.node(id)
        }
    };
    Some((resolve(link.start())?, resolve(link.end())?))
}

/// Re-snaps the customer points of `pipe` onto its new geometry and assigns
/// each to the nearest junction endpoint, `anchor` being the node that now
/// sits at one of its ends. Points already in `updated` are left alone.
pub(super) fn reassign_customer_points(
    model: &HydraulicModel,
    pipe: &LinkAsset,
    anchor: &NodeAsset,
    updated: &mut UpdatedCustomerPoints,
) {
    let endpoints = endpoints_with(model, pipe, anchor);
    for point in model.customer_points_on(pipe.id) {
        if updated.contains_key(&point.id) {
            continue;
        }
        let snap_point = snap_onto(pipe.coordinates(), point.coordinates);
        updated.insert(point.id, reconnect(point, pipe, endpoints, snap_point));
    }
}

/// Moves the customer points of a split pipe onto the segments replacing it.
///
/// Each point goes to the segment nearest to its snap point, which is kept.
/// The split nodes are looked up in `splits` before the model, since they may
/// not exist yet. Points whose segment lacks an endpoint are left out.
pub(super) fn reassign_after_split(
    model: &HydraulicModel,
    original: &LinkAsset,
    splits: &[NodeAsset],
    segments: &[LinkAsset],
) -> Vec<CustomerPoint> {
    let node = |id| splits.iter().find(|n| n.id == id).or_else(|| model.node(id));
    model
        .customer_points_on(original.id)
        .filter_map(|point| {
            let snap_point = point.connection?.snap_point;
            let segment = segments
                .iter()
                .filter_map(|segment| {
                    nearest_point_on_polyline(segment.coordinates(), snap_point)
                        .map(|nearest| (segment, nearest.distance))
                })
                .fold(None, |best: Option<(&LinkAsset, f64)>, candidate| match best {
                    Some(best) if best.1 <= candidate.1 => Some(best),
                    _ => Some(candidate),
                })?
                .0;
            let endpoints = node(segment.start()).zip(node(segment.end()))?;
            Some(reconnect(point, segment, Some(endpoints), snap_point))
        })
        .collect()
}
