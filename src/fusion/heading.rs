//! Heading fusion: device course, displacement bearing, orientation sensor

use tracing::debug;

use super::buffer::RingBuffer;
use super::sample::AcceptedSample;
use crate::config::HeadingConfig;
use crate::geometry::{bearing_deg, distance_m, normalize_deg};

#[derive(Clone, Copy, Debug, PartialEq)]
struct LastGood {
    degrees: f64,
    recorded_at: u64,
}

pub struct HeadingEstimator {
    config: HeadingConfig,
    last_good: Option<LastGood>,
}

impl HeadingEstimator {
    pub fn new(config: &HeadingConfig) -> Self {
        Self {
            config: config.clone(),
            last_good: None,
        }
    }

    /// Fused heading in [0, 360), `None` when unknown.
    ///
    /// Below the motion threshold the last valid heading is held as is.
    /// In motion the sources are tried in order: device course,
    /// displacement bearing, calibrated orientation sensor (only when
    /// `gyro_enabled`), and finally the last valid heading if recent.
    pub fn estimate(
        &mut self,
        buffer: &RingBuffer<AcceptedSample>,
        device_heading: Option<f64>,
        fused_speed: Option<f64>,
        gyro_heading: Option<f64>,
        gyro_enabled: bool,
        now: u64,
    ) -> Option<f64> {
        let speed = fused_speed?;
        if speed <= self.config.motion_kmh {
            return self.last_good.map(|l| l.degrees);
        }

        let measured = device_heading
            .filter(|h| h.is_finite() && *h >= 0.0)
            .map(normalize_deg)
            .or_else(|| self.displacement_bearing(buffer));

        if let Some(degrees) = measured {
            self.last_good = Some(LastGood {
                degrees,
                recorded_at: now,
            });
            return Some(degrees);
        }

        if gyro_enabled {
            if let Some(gyro) = gyro_heading {
                return Some(normalize_deg(gyro));
            }
        }

        match self.last_good {
            Some(last) if now.saturating_sub(last.recorded_at) < self.config.hold_ms => Some(last.degrees),
            Some(_) => {
                debug!("Last heading too old, heading unknown");
                None
            }
            None => None,
        }
    }

    /// Bearing between the newest sample and the one `bearing_span - 1`
    /// positions before it, when they are far enough apart
    fn displacement_bearing(&self, buffer: &RingBuffer<AcceptedSample>) -> Option<f64> {
        let span = self.config.bearing_span.max(2);
        if buffer.len() < span {
            return None;
        }

        let prev = buffer.get(buffer.len() - span)?;
        let curr = buffer.last()?;

        if distance_m(prev.coordinates, curr.coordinates) > self.config.min_bearing_displacement_m {
            Some(bearing_deg(prev.coordinates, curr.coordinates))
        } else {
            None
        }
    }

    /// Last heading measured from the device or from displacement
    pub fn last_valid(&self) -> Option<f64> {
        self.last_good.map(|l| l.degrees)
    }

    pub fn reset(&mut self) {
        self.last_good = None;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use geo::Point;

    use super::HeadingEstimator;
    use crate::config::HeadingConfig;
    use crate::fusion::{AcceptedSample, RingBuffer};

    /// Samples moving east, `step_m` meters apart every second
    fn eastbound(count: u64, step_m: f64) -> RingBuffer<AcceptedSample> {
        let mut buf = RingBuffer::new(4);
        let deg_per_m = 1.0 / (111_195.0 * 48.86f64.to_radians().cos());
        for i in 0..count {
            buf.push(AcceptedSample {
                coordinates: Point::new(2.35 + i as f64 * step_m * deg_per_m, 48.86),
                accuracy: 5.0,
                speed_kmh: None,
                heading: None,
                timestamp: i * 1000,
            });
        }
        buf
    }

    #[test]
    fn device_heading_first() {
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        let buf = eastbound(3, 20.0);
        assert_eq!(Some(180.0), est.estimate(&buf, Some(180.0), Some(50.0), Some(10.0), true, 2000));
        assert_eq!(Some(180.0), est.last_valid());
    }

    #[test]
    fn displacement_bearing() {
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        let heading = est.estimate(&eastbound(3, 20.0), None, Some(50.0), None, false, 2000);
        assert_abs_diff_eq!(90.0, heading.unwrap(), epsilon = 0.1);

        // Too short to trust
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        assert_eq!(None, est.estimate(&eastbound(3, 5.0), None, Some(50.0), None, false, 2000));
        assert_eq!(None, est.estimate(&eastbound(2, 20.0), None, Some(50.0), None, false, 2000));
    }

    #[test]
    fn gyroscope_only_when_enabled() {
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        let buf = eastbound(3, 5.0);
        assert_eq!(None, est.estimate(&buf, None, Some(50.0), Some(42.0), false, 2000));
        assert_eq!(Some(42.0), est.estimate(&buf, None, Some(50.0), Some(42.0), true, 2000));
        // Sensor readings never become the last valid heading
        assert_eq!(None, est.last_valid());
    }

    #[test]
    fn holds_last_heading_for_a_while() {
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        let moving = eastbound(3, 20.0);
        let jitter = eastbound(3, 1.0);
        est.estimate(&moving, Some(120.0), Some(50.0), None, false, 10_000);

        assert_eq!(Some(120.0), est.estimate(&jitter, None, Some(50.0), None, false, 14_000));
        assert_eq!(None, est.estimate(&jitter, None, Some(50.0), None, false, 15_000));
    }

    #[test]
    fn stopped_holds_heading() {
        let mut est = HeadingEstimator::new(&HeadingConfig::default());
        let buf = eastbound(3, 20.0);
        est.estimate(&buf, Some(45.0), Some(50.0), None, false, 0);

        // A stopped vehicle keeps its heading, whatever the sources say
        assert_eq!(Some(45.0), est.estimate(&buf, Some(300.0), Some(1.0), None, false, 60_000));
        assert_eq!(Some(45.0), est.estimate(&buf, None, Some(2.0), None, false, 60_000));
        assert_eq!(None, est.estimate(&buf, None, None, None, false, 60_000));
    }
}
