//! Speed cameras ("radars") and their alerting along a route

pub mod alert;
pub mod proximity;

use geo::geometry::Point;

/// A fixed location speed camera
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    /// Identifier from the data source, may be empty
    pub id: String,
    pub coordinates: Point,
    /// Camera category, eg.: "Radar fixe"
    pub kind: String,
    pub road: String,
    pub town: String,
    pub department: String,
    /// Light vehicles limit, km/h
    pub limit: Option<u32>,
    /// Heavy vehicles limit, km/h
    pub heavy_limit: Option<u32>,
}

impl Candidate {
    pub fn basic(id: impl Into<String>, coordinates: Point) -> Self {
        Self {
            id: id.into(),
            coordinates,
            kind: String::new(),
            road: String::new(),
            town: String::new(),
            department: String::new(),
            limit: None,
            heavy_limit: None,
        }
    }

    /// Identity used for alert deduplication, the coordinates when the
    /// source has no id
    pub fn identity(&self) -> String {
        if self.id.is_empty() {
            format!("{},{}", self.coordinates.y(), self.coordinates.x())
        } else {
            self.id.clone()
        }
    }

    pub fn label(&self) -> &str {
        if self.kind.is_empty() {
            "Radar"
        } else {
            &self.kind
        }
    }

    /// Speed limit text, eg.: "80 km/h" or "70 km/h (HGV)"
    pub fn limit_text(&self) -> Option<String> {
        match (self.limit, self.heavy_limit) {
            (Some(l), _) => Some(format!("{} km/h", l)),
            (None, Some(h)) => Some(format!("{} km/h (HGV)", h)),
            (None, None) => None,
        }
    }

    /// Road, town and department joined for a detail popup
    pub fn location_text(&self) -> String {
        let department = if self.department.is_empty() {
            String::new()
        } else {
            format!("({})", self.department)
        };

        [self.road.as_str(), self.town.as_str(), department.as_str()]
            .iter()
            .filter(|s| !s.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(" · ")
    }
}
