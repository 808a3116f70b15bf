//! Speed fusion: device reported speed against displacement speed

use tracing::debug;

use super::buffer::RingBuffer;
use super::sample::AcceptedSample;
use crate::config::SpeedConfig;
use crate::geometry::distance_m;

/// Last device speed accepted, decayed while no fresh data arrives
#[derive(Clone, Copy, Debug, PartialEq)]
struct LastGood {
    kmh: f64,
    recorded_at: u64,
}

pub struct SpeedEstimator {
    config: SpeedConfig,
    last_good: Option<LastGood>,
}

impl SpeedEstimator {
    pub fn new(config: &SpeedConfig) -> Self {
        Self {
            config: config.clone(),
            last_good: None,
        }
    }

    /// Fused speed in km/h, `None` when nothing usable is known.
    ///
    /// `device_kmh` is the speed reported with the newest sample.
    pub fn estimate(
        &mut self,
        buffer: &RingBuffer<AcceptedSample>,
        device_kmh: Option<f64>,
        now: u64,
    ) -> Option<f64> {
        let cfg = &self.config;
        let derived = derived_speed(buffer, cfg);

        let device = device_kmh.filter(|s| {
            let plausible = s.is_finite() && *s >= 0.0 && *s <= cfg.max_kmh;
            if !plausible {
                debug!(speed = s, "Device speed ignored: implausible");
            }
            plausible
        });

        let fused = match (device, derived) {
            (Some(dev), Some(der)) if (dev - der).abs() < cfg.agreement_kmh => {
                Some(dev * cfg.device_weight + der * (1.0 - cfg.device_weight))
            }
            (Some(dev), _) => Some(dev),
            (None, Some(der)) => Some(der),
            (None, None) => None,
        };

        if let Some(dev) = device {
            self.last_good = Some(LastGood {
                kmh: dev,
                recorded_at: now,
            });
        }

        match fused {
            Some(speed) => Some(speed.min(cfg.max_kmh)),
            None => self.decay(now),
        }
    }

    /// Decay the last device speed when it is recent enough
    fn decay(&mut self, now: u64) -> Option<f64> {
        let last = self.last_good.as_mut()?;
        if now.saturating_sub(last.recorded_at) >= self.config.decay_window_ms {
            return None;
        }

        last.kmh *= self.config.decay_factor;
        debug!(speed = last.kmh, "Speed decayed");

        Some(last.kmh)
    }

    pub fn reset(&mut self) {
        self.last_good = None;
    }
}

/// Mean displacement speed over the most recent samples, km/h.
///
/// Pairs too close in time, too far apart, or moving less than the
/// jitter threshold are skipped. The result is capped to `max_kmh`.
pub fn derived_speed(buffer: &RingBuffer<AcceptedSample>, cfg: &SpeedConfig) -> Option<f64> {
    if buffer.len() < cfg.window {
        return None;
    }

    let recent: Vec<&AcceptedSample> = buffer.recent(cfg.window).collect();
    let speeds: Vec<f64> = recent
        .windows(2)
        .filter_map(|pair| {
            let (prev, curr) = (pair[0], pair[1]);
            let elapsed = (curr.timestamp as f64 - prev.timestamp as f64) / 1000.0;
            let distance = distance_m(prev.coordinates, curr.coordinates);

            if elapsed > cfg.min_pair_secs && elapsed < cfg.max_pair_secs && distance > cfg.min_displacement_m {
                Some((distance / elapsed * 3.6).min(cfg.max_kmh))
            } else {
                None
            }
        })
        .collect();

    if speeds.is_empty() || speeds.len() < cfg.min_valid_pairs {
        return None;
    }

    Some(speeds.iter().sum::<f64>() / speeds.len() as f64)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use geo::Point;

    use super::{derived_speed, SpeedEstimator};
    use crate::config::SpeedConfig;
    use crate::fusion::{AcceptedSample, RingBuffer};

    /// Samples heading north, `step_m` meters apart every `dt_ms`
    fn northbound(count: u64, step_m: f64, dt_ms: u64) -> RingBuffer<AcceptedSample> {
        let mut buf = RingBuffer::new(4);
        for i in 0..count {
            buf.push(AcceptedSample {
                coordinates: Point::new(2.35, 48.86 + i as f64 * step_m / 111_195.0),
                accuracy: 5.0,
                speed_kmh: None,
                heading: None,
                timestamp: i * dt_ms,
            });
        }
        buf
    }

    #[test]
    fn derived_from_displacement() {
        let cfg = SpeedConfig::default();
        // 10 m/s
        let buf = northbound(3, 10.0, 1000);
        assert_abs_diff_eq!(36.0, derived_speed(&buf, &cfg).unwrap(), epsilon = 0.1);

        assert_eq!(None, derived_speed(&northbound(2, 10.0, 1000), &cfg));
    }

    #[test]
    fn derived_rejects_bad_pairs() {
        let cfg = SpeedConfig::default();
        // Stale timestamps
        assert_eq!(None, derived_speed(&northbound(3, 10.0, 2500), &cfg));
        // Duplicated timestamps
        assert_eq!(None, derived_speed(&northbound(3, 10.0, 0), &cfg));
        // Jitter at rest
        assert_eq!(None, derived_speed(&northbound(3, 0.1, 1000), &cfg));
    }

    #[test]
    fn derived_is_capped() {
        let cfg = SpeedConfig::default();
        // 500 m/s
        let buf = northbound(3, 500.0, 1000);
        assert_eq!(Some(200.0), derived_speed(&buf, &cfg));
    }

    #[test]
    fn fusion_rules() {
        let cfg = SpeedConfig::default();
        let buf = northbound(3, 10.0, 1000);
        let derived = derived_speed(&buf, &cfg).unwrap();

        // Agreement: weighted blend
        let mut est = SpeedEstimator::new(&cfg);
        let fused = est.estimate(&buf, Some(40.0), 2000).unwrap();
        assert_abs_diff_eq!(40.0 * 0.6 + derived * 0.4, fused, epsilon = 1e-9);

        // Disagreement: device wins
        let fused = est.estimate(&buf, Some(80.0), 2000).unwrap();
        assert_abs_diff_eq!(80.0, fused, epsilon = 1e-9);

        // Derived alone
        let mut est = SpeedEstimator::new(&cfg);
        assert_abs_diff_eq!(derived, est.estimate(&buf, None, 2000).unwrap(), epsilon = 1e-9);

        // Device alone
        let empty = RingBuffer::new(4);
        assert_eq!(Some(50.0), est.estimate(&empty, Some(50.0), 2000));
    }

    #[test]
    fn implausible_device_speed() {
        let mut est = SpeedEstimator::new(&SpeedConfig::default());
        let empty = RingBuffer::new(4);
        assert_eq!(None, est.estimate(&empty, Some(250.0), 0));
        assert_eq!(None, est.estimate(&empty, Some(-3.0), 0));

        // Derived still usable
        let buf = northbound(3, 10.0, 1000);
        assert!(est.estimate(&buf, Some(250.0), 2000).is_some());
    }

    #[test]
    fn never_above_cap() {
        let cfg = SpeedConfig::default();
        let mut est = SpeedEstimator::new(&cfg);
        for step in [1.0, 30.0, 80.0, 150.0, 900.0] {
            let buf = northbound(4, step, 1000);
            for device in [None, Some(10.0), Some(199.0), Some(350.0)] {
                if let Some(speed) = est.estimate(&buf, device, 3000) {
                    assert!(speed <= 200.0, "{} km/h", speed);
                }
            }
        }
    }

    #[test]
    fn decays_on_signal_gap() {
        let mut est = SpeedEstimator::new(&SpeedConfig::default());
        let empty = RingBuffer::new(4);

        assert_eq!(Some(40.0), est.estimate(&empty, Some(40.0), 10_000));
        assert_abs_diff_eq!(38.0, est.estimate(&empty, None, 11_000).unwrap(), epsilon = 1e-9);
        assert_abs_diff_eq!(36.1, est.estimate(&empty, None, 12_000).unwrap(), epsilon = 1e-9);

        // Outside the window the speed becomes unknown
        assert_eq!(None, est.estimate(&empty, None, 13_000));
    }

    #[test]
    fn reset_forgets() {
        let mut est = SpeedEstimator::new(&SpeedConfig::default());
        let empty = RingBuffer::new(4);
        est.estimate(&empty, Some(40.0), 0);
        est.reset();
        assert_eq!(None, est.estimate(&empty, None, 500));
    }
}
