//! Position samples definition

use geo::geometry::Point;

use crate::geometry::normalize_deg;

/// Raw version of an observation delivered by the location provider
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    pub coordinates: Point,
    /// Horizontal accuracy, meters
    pub accuracy: f64,
    /// Instantaneous speed reported by the device, m/s
    pub speed: Option<f64>,
    /// Course reported by the device, degrees clockwise from north
    pub heading: Option<f64>,
    /// Monotonic timestamp, ms
    pub timestamp: u64,
}

impl RawSample {
    pub fn basic(coordinates: Point, accuracy: f64, timestamp: u64) -> Self {
        Self {
            coordinates,
            accuracy,
            speed: None,
            heading: None,
            timestamp,
        }
    }

    pub fn speed(mut self, mps: f64) -> Self {
        self.speed = Some(mps);

        self
    }

    pub fn heading(mut self, degrees: f64) -> Self {
        self.heading = Some(degrees);

        self
    }
}

/// A sample that passed the accuracy gate, with normalized units.
///
/// Negative or non finite device values become `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptedSample {
    pub coordinates: Point,
    pub accuracy: f64,
    /// Device speed, km/h
    pub speed_kmh: Option<f64>,
    /// Device heading in [0, 360)
    pub heading: Option<f64>,
    pub timestamp: u64,
}

impl From<&RawSample> for AcceptedSample {
    fn from(raw: &RawSample) -> Self {
        Self {
            coordinates: raw.coordinates,
            accuracy: raw.accuracy,
            speed_kmh: raw
                .speed
                .filter(|s| s.is_finite() && *s >= 0.0)
                .map(|s| s * 3.6),
            heading: raw
                .heading
                .filter(|h| h.is_finite() && *h >= 0.0)
                .map(normalize_deg),
            timestamp: raw.timestamp,
        }
    }
}

/// Per update output of the estimation pipeline
#[derive(Clone, Debug, PartialEq)]
pub struct FusedEstimate {
    pub coordinates: Point,
    /// km/h
    pub speed: Option<f64>,
    /// Degrees in [0, 360)
    pub heading: Option<f64>,
    /// Accuracy of the sample this estimate comes from, meters
    pub accuracy: f64,
    pub timestamp: u64,
}
