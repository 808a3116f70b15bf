//! Routes from GPX documents

use std::io::Read;

use geo::geometry::Point;
use gpx::{Gpx, Waypoint};
use time::format_description::well_known;
use time::OffsetDateTime;

use super::RouteDescriptor;
use crate::NavError;

/// Read a route from the first track of a GPX document, or from its
/// first route when it has no track.
///
/// The duration comes from the first and last waypoint times, when both
/// exist.
pub fn route_from_gpx<R: Read>(reader: R) -> Result<RouteDescriptor, NavError> {
    let doc: Gpx = gpx::read(reader).map_err(|e| NavError::Gpx(e.to_string()))?;

    let waypoints: Vec<&Waypoint> = match doc.tracks.first() {
        Some(track) => track.segments.iter().flat_map(|s| s.points.iter()).collect(),
        None => match doc.routes.first() {
            Some(route) => route.points.iter().collect(),
            None => vec![],
        },
    };

    if waypoints.len() < 2 {
        return Err(NavError::Gpx("at least two points are needed".to_string()));
    }

    let points: Vec<Point> = waypoints.iter().map(|w| w.point()).collect();

    let time = |w: &Waypoint| {
        w.time
            .as_ref()
            .and_then(|t| t.format().ok())
            .and_then(|s| OffsetDateTime::parse(&s, &well_known::Rfc3339).ok())
    };
    let start = waypoints.first().and_then(|w| time(*w));
    let end = waypoints.last().and_then(|w| time(*w));
    let duration = match (start, end) {
        (Some(start), Some(end)) if end > start => (end - start).as_seconds_f64(),
        _ => 0.0,
    };

    Ok(RouteDescriptor::from_points(points, duration))
}
