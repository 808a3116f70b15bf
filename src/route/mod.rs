//! Planned route

pub mod gpx;

use geo::geometry::Point;

use crate::geometry::distance_m;

/// Ordered route polyline with its totals
#[derive(Clone, Debug, PartialEq)]
pub struct RouteDescriptor {
    pub points: Vec<Point>,
    /// Meters
    pub distance: f64,
    /// Seconds
    pub duration: f64,
}

impl RouteDescriptor {
    pub fn new(points: Vec<Point>, distance: f64, duration: f64) -> Self {
        Self {
            points,
            distance,
            duration,
        }
    }

    /// Route whose distance is the sum of its legs
    pub fn from_points(points: Vec<Point>, duration: f64) -> Self {
        let distance = points.windows(2).map(|w| distance_m(w[0], w[1])).sum();

        Self::new(points, distance, duration)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Travel time readout, eg.: "1h 5min" or "12min"
    pub fn travel_time(&self) -> Option<String> {
        if !self.duration.is_finite() || self.duration <= 0.0 {
            return None;
        }

        let total = self.duration as u64;
        let hours = total / 3600;
        let minutes = (total % 3600) / 60;

        if hours > 0 {
            Some(format!("{}h {}min", hours, minutes))
        } else {
            Some(format!("{}min", minutes))
        }
    }

    /// Distance in km with one decimal
    pub fn distance_km(&self) -> String {
        format!("{:.1} km", self.distance / 1000.0)
    }
}
