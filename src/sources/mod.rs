//! Input sources API

use serde::Deserialize;

use crate::fusion::RawSample;
use crate::radar::Candidate;
use crate::NavError;

/// Bulk radar data, loaded once at startup
pub trait CandidatesSource {
    /// Fetch every well formed radar, malformed ones are dropped
    fn fetch(&mut self) -> Result<Vec<Candidate>, NavError>;
}

/// Recorded position samples, for replays
pub trait SamplesSource {
    fn fetch(&mut self) -> Result<Vec<RawSample>, NavError>;
}

/// Column names of a samples file
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleFields {
    /// "lon, lat" pair, separated by `,`, `;` or a space
    pub coordinates: String,
    /// RFC3339 time
    pub time: String,
    pub accuracy: String,
    /// m/s
    pub speed: String,
    pub heading: String,
    /// Coordinates stored as "lat, lon"
    pub flip_coordinates: bool,
}

impl Default for SampleFields {
    fn default() -> Self {
        Self {
            coordinates: "coordinates".to_string(),
            time: "time".to_string(),
            accuracy: "accuracy".to_string(),
            speed: "speed".to_string(),
            heading: "heading".to_string(),
            flip_coordinates: false,
        }
    }
}

impl SampleFields {
    pub fn coordinates(&mut self, name: &str) -> &mut Self {
        self.coordinates = name.to_lowercase();

        self
    }

    pub fn time(&mut self, name: &str) -> &mut Self {
        self.time = name.to_lowercase();

        self
    }

    pub fn accuracy(&mut self, name: &str) -> &mut Self {
        self.accuracy = name.to_lowercase();

        self
    }

    pub fn speed(&mut self, name: &str) -> &mut Self {
        self.speed = name.to_lowercase();

        self
    }

    pub fn heading(&mut self, name: &str) -> &mut Self {
        self.heading = name.to_lowercase();

        self
    }

    pub fn flip(&mut self) -> &mut Self {
        self.flip_coordinates = true;

        self
    }

    pub fn done(&self) -> Self {
        self.clone()
    }
}

#[cfg(feature = "csv")]
mod csv_file;

#[cfg(feature = "csv")]
pub use csv_file::{CsvRadarSource, CsvSampleSource};
