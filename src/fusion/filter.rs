//! Accuracy gate and rolling buffer of accepted samples

use tracing::debug;

use super::buffer::RingBuffer;
use super::sample::{AcceptedSample, RawSample};
use crate::config::FilterConfig;

pub struct PositionFilter {
    max_accuracy: f64,
    buffer: RingBuffer<AcceptedSample>,
}

impl PositionFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            max_accuracy: config.max_accuracy_m,
            buffer: RingBuffer::new(config.buffer_size),
        }
    }

    /// Gate a raw sample, buffering it when accepted.
    ///
    /// Rejections are silent: the buffer is left untouched and `None` is
    /// returned.
    pub fn accept(&mut self, raw: &RawSample) -> Option<AcceptedSample> {
        if !raw.accuracy.is_finite() || raw.accuracy > self.max_accuracy {
            debug!(accuracy = raw.accuracy, "Sample ignored: insufficient accuracy");
            return None;
        }

        let (lon, lat) = raw.coordinates.x_y();
        if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            debug!(lat, lon, "Sample ignored: invalid coordinates");
            return None;
        }

        let sample = AcceptedSample::from(raw);
        self.buffer.push(sample.clone());

        Some(sample)
    }

    pub fn buffer(&self) -> &RingBuffer<AcceptedSample> {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
