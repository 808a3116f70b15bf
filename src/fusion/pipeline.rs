//! Sample to estimate pipeline

use tracing::debug;

use super::display::{HeadingDisplay, SpeedDisplay};
use super::filter::PositionFilter;
use super::heading::HeadingEstimator;
use super::orientation::OrientationCalibrator;
use super::sample::{FusedEstimate, RawSample};
use super::speed::SpeedEstimator;
use crate::config::NavigatorConfig;

/// Readouts shown to the user for one update
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Readouts {
    /// Smoothed km/h, rounded
    pub speed: Option<f64>,
    /// Smoothed heading, set only when the shown value changed
    pub heading_changed: Option<f64>,
    pub heading: Option<f64>,
}

/// Filter, estimators and display smoothing of one tracking session
pub struct SensorFusion {
    filter: PositionFilter,
    speed: SpeedEstimator,
    heading: HeadingEstimator,
    orientation: OrientationCalibrator,
    gyro_enabled: bool,
    last_speed: Option<f64>,
    speed_display: SpeedDisplay,
    heading_display: HeadingDisplay,
}

impl SensorFusion {
    pub fn new(config: &NavigatorConfig) -> Self {
        Self {
            filter: PositionFilter::new(&config.filter),
            speed: SpeedEstimator::new(&config.speed),
            heading: HeadingEstimator::new(&config.heading),
            orientation: OrientationCalibrator::new(&config.orientation),
            gyro_enabled: false,
            last_speed: None,
            speed_display: SpeedDisplay::new(&config.display),
            heading_display: HeadingDisplay::new(&config.display),
        }
    }

    /// Run one raw sample through the pipeline.
    ///
    /// `gyro_raw` is the most recent orientation angle, if a sensor is
    /// subscribed. Rejected samples give `None`.
    pub fn process(&mut self, raw: &RawSample, gyro_raw: Option<f64>) -> Option<(FusedEstimate, Readouts)> {
        let accepted = self.filter.accept(raw)?;
        let now = accepted.timestamp;

        let gyro_heading = match gyro_raw {
            Some(angle) if self.gyro_enabled => {
                self.orientation
                    .observe(angle, self.heading.last_valid(), self.last_speed)
            }
            _ => None,
        };

        let speed = self
            .speed
            .estimate(self.filter.buffer(), accepted.speed_kmh, now);
        let heading = self.heading.estimate(
            self.filter.buffer(),
            accepted.heading,
            speed,
            gyro_heading,
            self.gyro_enabled,
            now,
        );

        debug!(
            accuracy = accepted.accuracy,
            speed = ?speed,
            heading = ?heading,
            "Fused estimate"
        );

        let mut readouts = Readouts::default();
        if speed.is_some() {
            self.last_speed = speed;
            readouts.speed = self.speed_display.update(speed);
        }
        if heading.is_some() {
            readouts.heading_changed = self.heading_display.update(heading);
        }
        readouts.heading = self.heading_display.displayed();

        let estimate = FusedEstimate {
            coordinates: accepted.coordinates,
            speed,
            heading,
            accuracy: accepted.accuracy,
            timestamp: now,
        };

        Some((estimate, readouts))
    }

    pub fn set_gyroscope(&mut self, enabled: bool) {
        self.gyro_enabled = enabled;
        if !enabled {
            self.orientation.reset();
        }
    }

    pub fn gyroscope_enabled(&self) -> bool {
        self.gyro_enabled
    }

    pub fn last_speed(&self) -> Option<f64> {
        self.last_speed
    }

    pub fn buffered(&self) -> usize {
        self.filter.buffer().len()
    }

    /// Drop every buffered sample and estimate
    pub fn reset(&mut self) {
        self.filter.clear();
        self.speed.reset();
        self.heading.reset();
        self.orientation.reset();
        self.last_speed = None;
        self.speed_display.update(None);
        self.heading_display.update(None);
    }
}
