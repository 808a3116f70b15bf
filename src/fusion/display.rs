//! User facing readouts, smoothed independently of the estimators

use tracing::debug;

use super::buffer::RingBuffer;
use crate::config::DisplayConfig;
use crate::geometry::{angular_diff_deg, circular_mean_deg, normalize_deg};

/// Short moving average of the emitted speeds
pub struct SpeedDisplay {
    buffer: RingBuffer<f64>,
}

impl SpeedDisplay {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            buffer: RingBuffer::new(config.speed_window),
        }
    }

    /// Rounded km/h to show, an unknown speed clears the average
    pub fn update(&mut self, kmh: Option<f64>) -> Option<f64> {
        match kmh.filter(|s| s.is_finite()) {
            Some(kmh) => {
                self.buffer.push(kmh);
                let avg = self.buffer.iter().sum::<f64>() / self.buffer.len() as f64;
                Some(avg.round())
            }
            None => {
                self.buffer.clear();
                None
            }
        }
    }
}

/// Circular moving average of headings with glitch suppression
pub struct HeadingDisplay {
    config: DisplayConfig,
    buffer: RingBuffer<f64>,
    displayed: Option<f64>,
}

impl HeadingDisplay {
    pub fn new(config: &DisplayConfig) -> Self {
        Self {
            config: config.clone(),
            buffer: RingBuffer::new(config.heading_window),
            displayed: None,
        }
    }

    /// Feed a heading, returns the new value to show when it changed.
    pub fn update(&mut self, heading: Option<f64>) -> Option<f64> {
        let degrees = match heading.filter(|h| h.is_finite()) {
            Some(h) => normalize_deg(h),
            None => {
                self.buffer.clear();
                self.displayed = None;
                return None;
            }
        };

        if let Some(shown) = self.displayed {
            let diff = angular_diff_deg(shown, degrees);
            if diff > self.config.glitch_deg && self.buffer.len() > 2 {
                debug!(diff, "Heading change too abrupt, ignored");
                return None;
            }
        }

        self.buffer.push(degrees);
        let mean = circular_mean_deg(self.buffer.iter().copied()).unwrap_or(degrees);
        let rounded = normalize_deg(mean.round());

        match self.displayed {
            Some(shown) if angular_diff_deg(shown, rounded) < self.config.min_change_deg => None,
            _ => {
                self.displayed = Some(rounded);
                Some(rounded)
            }
        }
    }

    pub fn displayed(&self) -> Option<f64> {
        self.displayed
    }
}

#[cfg(test)]
mod tests {
    use super::{HeadingDisplay, SpeedDisplay};
    use crate::config::DisplayConfig;
    use crate::geometry::angular_diff_deg;

    #[test]
    fn speed_average() {
        let mut disp = SpeedDisplay::new(&DisplayConfig::default());
        assert_eq!(Some(50.0), disp.update(Some(50.0)));
        assert_eq!(Some(55.0), disp.update(Some(60.0)));
        assert_eq!(Some(65.0), disp.update(Some(70.0)));
        assert_eq!(None, disp.update(None));
        assert_eq!(Some(30.0), disp.update(Some(30.0)));
    }

    #[test]
    fn heading_wraps_north() {
        let mut disp = HeadingDisplay::new(&DisplayConfig::default());
        disp.update(Some(350.0));
        disp.update(Some(10.0));
        let shown = disp.displayed().unwrap();
        assert!(angular_diff_deg(shown, 0.0) < 1.0, "got {}", shown);
    }

    #[test]
    fn glitch_suppressed() {
        let mut disp = HeadingDisplay::new(&DisplayConfig::default());
        for _ in 0..5 {
            disp.update(Some(100.0));
        }
        assert_eq!(Some(100.0), disp.displayed());

        for h in [200.0, 101.0] {
            disp.update(Some(h));
            let shown = disp.displayed().unwrap();
            assert!(angular_diff_deg(shown, 200.0) > 45.0, "jumped to {}", shown);
        }
        assert_eq!(Some(100.0), disp.displayed());
    }

    #[test]
    fn glitch_accepted_while_warming_up() {
        let mut disp = HeadingDisplay::new(&DisplayConfig::default());
        disp.update(Some(100.0));
        // Only one entry buffered, a wide turn is still taken
        assert_eq!(Some(150.0), disp.update(Some(200.0)));
    }

    #[test]
    fn small_changes_hidden() {
        let mut disp = HeadingDisplay::new(&DisplayConfig::default());
        assert_eq!(Some(90.0), disp.update(Some(90.0)));
        assert_eq!(None, disp.update(Some(90.4)));
        assert_eq!(None, disp.update(Some(91.0)));
        assert_eq!(Some(92.0), disp.update(Some(97.0)));

        assert_eq!(None, disp.update(None));
        assert_eq!(None, disp.displayed());
    }
}
