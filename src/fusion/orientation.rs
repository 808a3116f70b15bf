//! Orientation sensor calibration against the GPS heading

use tracing::info;

use crate::config::OrientationConfig;
use crate::geometry::normalize_deg;

/// Turns raw device orientation angles into headings.
///
/// The sensor convention is device dependent, so its readings are only
/// used once an offset to a GPS heading has been recorded.
pub struct OrientationCalibrator {
    config: OrientationConfig,
    offset: Option<f64>,
    heading: Option<f64>,
}

impl OrientationCalibrator {
    pub fn new(config: &OrientationConfig) -> Self {
        Self {
            config: config.clone(),
            offset: None,
            heading: None,
        }
    }

    /// Feed the latest raw angle along with the current GPS heading and
    /// fused speed. Returns the calibrated heading, if any.
    pub fn observe(&mut self, raw: f64, gps_heading: Option<f64>, speed: Option<f64>) -> Option<f64> {
        if !raw.is_finite() {
            return self.heading;
        }

        let angle = if self.config.invert {
            normalize_deg(360.0 - raw)
        } else {
            normalize_deg(raw)
        };

        if self.offset.is_none() {
            if let (Some(gps), Some(kmh)) = (gps_heading, speed) {
                if kmh > self.config.calibration_kmh {
                    let offset = gps - angle;
                    info!(offset, "Orientation sensor calibrated");
                    self.offset = Some(offset);
                }
            }
        }

        self.heading = self.offset.map(|offset| normalize_deg(angle + offset));

        self.heading
    }

    /// Calibrated heading from the last observation
    pub fn heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn is_calibrated(&self) -> bool {
        self.offset.is_some()
    }

    pub fn reset(&mut self) {
        self.offset = None;
        self.heading = None;
    }
}
