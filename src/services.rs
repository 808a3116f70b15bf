//! Geocoding and routing collaborators
//!
//! The HTTP clients live outside of this crate, only their contracts are
//! defined here.

use async_trait::async_trait;
use geo::geometry::Point;
use tracing::{debug, warn};

use crate::route::RouteDescriptor;
use crate::NavError;

/// Places kept after merging every geocoder answer
pub const MAX_PLACES: usize = 5;

/// A geocoded place
#[derive(Clone, Debug, PartialEq)]
pub struct Place {
    pub name: String,
    pub coordinates: Point,
}

impl Place {
    pub fn new(name: impl Into<String>, coordinates: Point) -> Self {
        Self {
            name: name.into(),
            coordinates,
        }
    }
}

/// Free text search of places, best match first
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<Place>, NavError>;
}

/// Driving route between two points, `None` when the service has no route
#[async_trait]
pub trait Router: Send + Sync {
    async fn route(&self, origin: Point, destination: Point) -> Result<Option<RouteDescriptor>, NavError>;
}

/// Concatenate answers in geocoder order, keep the first place of each
/// name, limited to [`MAX_PLACES`]
pub fn merge_places(answers: Vec<Vec<Place>>) -> Vec<Place> {
    let mut merged: Vec<Place> = vec![];

    for place in answers.into_iter().flatten() {
        if merged.len() >= MAX_PLACES {
            break;
        }
        if !merged.iter().any(|p| p.name == place.name) {
            merged.push(place);
        }
    }

    merged
}

/// Query every geocoder, a failing one only loses its own answer
pub async fn search_places(geocoders: &[Box<dyn Geocoder>], query: &str) -> Vec<Place> {
    let mut answers = vec![];

    for geocoder in geocoders {
        match geocoder.search(query).await {
            Ok(places) => answers.push(places),
            Err(e) => warn!(query, "Geocoding failed: {}", e),
        }
    }

    merge_places(answers)
}

/// Geocode `query` and route from `origin` to its best match
pub async fn plan_route(
    geocoders: &[Box<dyn Geocoder>],
    router: &dyn Router,
    query: &str,
    origin: Point,
) -> Result<RouteDescriptor, NavError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(NavError::DestinationNotFound);
    }

    let places = search_places(geocoders, query).await;
    let best = places.first().ok_or(NavError::DestinationNotFound)?;
    debug!(destination = %best.name, "Destination found");

    match router.route(origin, best.coordinates).await? {
        Some(route) if route.points.len() >= 2 => Ok(route),
        _ => Err(NavError::NoRoute),
    }
}
