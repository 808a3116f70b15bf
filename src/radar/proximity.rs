//! Route corridor filtering of the radar set

use geo::geometry::Point;
use tracing::debug;

use super::Candidate;
use crate::config::ProximityConfig;
use crate::geometry::{bounds_contain, padded_bounds, point_to_segment_m};

/// Radars lying within `buffer_km` of any segment of `route`.
///
/// A padded bounding box of the route rejects far away radars before the
/// per segment test. Routes with less than two points select nothing.
pub fn filter_along_route(
    candidates: &[Candidate],
    route: &[Point],
    buffer_km: f64,
    bbox_pad: f64,
) -> Vec<Candidate> {
    if route.len() < 2 {
        return vec![];
    }

    let buffer_m = buffer_km * 1000.0;
    let bounds = match padded_bounds(route, bbox_pad, buffer_m) {
        Some(b) => b,
        None => return vec![],
    };

    candidates
        .iter()
        .filter(|c| bounds_contain(&bounds, c.coordinates))
        .filter(|c| {
            route
                .windows(2)
                .any(|seg| point_to_segment_m(c.coordinates, seg[0], seg[1]) <= buffer_m)
        })
        .cloned()
        .collect()
}

/// Route scoped view of the radars, rebuilt once per route
pub struct RouteProximityIndex {
    config: ProximityConfig,
    subset: Vec<Candidate>,
}

impl RouteProximityIndex {
    pub fn new(config: &ProximityConfig) -> Self {
        Self {
            config: config.clone(),
            subset: vec![],
        }
    }

    pub fn rebuild(&mut self, candidates: &[Candidate], route: &[Point]) -> &[Candidate] {
        self.subset = filter_along_route(candidates, route, self.config.buffer_km, self.config.bbox_pad);
        debug!(
            total = candidates.len(),
            on_route = self.subset.len(),
            "Radars along route"
        );

        &self.subset
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.subset
    }

    pub fn clear(&mut self) {
        self.subset.clear();
    }
}
