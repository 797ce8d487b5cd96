//! Geodesic helpers for link polylines and customer point snapping.
//!
//! Positions are `[longitude, latitude]` pairs in degrees. Distances are
//! measured along the sphere with the haversine formula, while projections onto
//! polylines are done in the planar longitude/latitude space, which is accurate
//! enough at the scale of a single pipe segment.

use cgmath::{InnerSpace, Vector2};
use itertools::Itertools;

use crate::core::Position;

/// Mean earth radius, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Two vertices closer than this are considered the same vertex when a link is
/// drawn.
pub const NEAR_VERTEX_TOLERANCE_METERS: f64 = 1.0;

/// Planar distance, in degrees, under which a vertex is considered to lie on a
/// path. Used to detect a drawn link overlapping an existing pipe section.
pub const COLINEAR_TOLERANCE_DEGREES: f64 = 1e-9;

#[inline]
fn vector(p: Position) -> Vector2<f64> {
    Vector2::new(p[0], p[1])
}

/// Great circle distance between two positions, in meters.
#[must_use]
pub fn haversine_distance(a: Position, b: Position) -> f64 {
    let (lat1, lat2) = (a[1].to_radians(), b[1].to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b[0] - a[0]).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Length of a polyline, in meters.
#[must_use]
pub fn polyline_length(coordinates: &[Position]) -> f64 {
    coordinates
        .iter()
        .tuple_windows()
        .map(|(a, b)| haversine_distance(*a, *b))
        .sum()
}

/// Whether two positions are within [`NEAR_VERTEX_TOLERANCE_METERS`].
#[must_use]
pub fn is_near_position(a: Position, b: Position) -> bool {
    haversine_distance(a, b) <= NEAR_VERTEX_TOLERANCE_METERS
}

/// The result of projecting a position onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    /// The projected position.
    pub position: Position,
    /// Index of the segment holding the projection. Segment `i` spans
    /// vertices `i` and `i + 1`.
    pub segment: usize,
    /// Distance from the queried position to the projection, in meters.
    pub distance: f64,
}

/// Projects `position` onto the segment `[a, b]`.
#[must_use]
pub fn project_on_segment(a: Position, b: Position, position: Position) -> Position {
    let (va, vb, vp) = (vector(a), vector(b), vector(position));
    let ab = vb - va;
    let len2 = ab.magnitude2();
    if len2 == 0.0 {
        return a;
    }
    let t = ((vp - va).dot(ab) / len2).clamp(0.0, 1.0);
    let projected = va + ab * t;
    [projected.x, projected.y]
}

/// Finds the point of `coordinates` nearest to `position`.
///
/// Returns `None` for polylines with fewer than two vertices. Ties are
/// resolved in favour of the earliest segment.
#[must_use]
pub fn nearest_point_on_polyline(
    coordinates: &[Position],
    position: Position,
) -> Option<NearestPoint> {
    coordinates
        .iter()
        .tuple_windows()
        .enumerate()
        .map(|(segment, (a, b))| {
            let projected = project_on_segment(*a, *b, position);
            NearestPoint {
                position: projected,
                segment,
                distance: haversine_distance(position, projected),
            }
        })
        .fold(None, |best: Option<NearestPoint>, candidate| match best {
            Some(best) if best.distance <= candidate.distance => Some(best),
            _ => Some(candidate),
        })
}

/// Planar distance, in degrees, from `position` to the nearest point of
/// `coordinates`.
fn planar_distance_to_polyline(coordinates: &[Position], position: Position) -> f64 {
    coordinates
        .iter()
        .tuple_windows()
        .map(|(a, b)| {
            (vector(project_on_segment(*a, *b, position)) - vector(position)).magnitude()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Whether every vertex of `path` lies on `other` within
/// [`COLINEAR_TOLERANCE_DEGREES`].
#[must_use]
pub fn lies_on(path: &[Position], other: &[Position]) -> bool {
    path.iter()
        .all(|p| planar_distance_to_polyline(other, *p) <= COLINEAR_TOLERANCE_DEGREES)
}

/// Whether two polylines trace the same route: each one's vertices lie on the
/// other.
#[must_use]
pub fn is_same_route(a: &[Position], b: &[Position]) -> bool {
    lies_on(a, b) && lies_on(b, a)
}

/// Rounds a value to two decimals.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
