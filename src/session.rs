//! Tracking session and its controller

use std::fmt;

use geo::geometry::Point;
use tracing::{debug, info, warn};

use crate::config::NavigatorConfig;
use crate::fusion::pipeline::{Readouts, SensorFusion};
use crate::fusion::{FusedEstimate, RawSample};
use crate::radar::alert::{AlertEngine, AlertState, NextRadar, RadarAlert};
use crate::radar::proximity::RouteProximityIndex;
use crate::radar::Candidate;
use crate::route::RouteDescriptor;
use crate::NavError;

/// Failures reported by the location provider
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderError {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
}

/// Messages surfaced to the user
#[derive(Clone, Debug, PartialEq)]
pub enum Advisory {
    Radar(RadarAlert),
    Provider(ProviderError),
    RouteComputed {
        radars: usize,
        next: Option<NextRadar>,
        travel_time: Option<String>,
    },
    DestinationNotFound,
    NoRoute,
    RouteFailed,
}

impl Advisory {
    /// Dedup key of the advisory, only radar alerts have one
    pub fn identity(&self) -> Option<&str> {
        match self {
            Advisory::Radar(alert) => Some(&alert.identity),
            _ => None,
        }
    }

    /// Text for speech output
    pub fn spoken(&self) -> String {
        match self {
            Advisory::Radar(alert) => alert.spoken.clone(),
            Advisory::RouteComputed { radars, .. } => format!("Route computed. {} radars detected on the route.", radars),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::Radar(alert) => write!(f, "{}", alert.message),
            Advisory::Provider(ProviderError::PermissionDenied) => write!(f, "Location permission denied."),
            Advisory::Provider(ProviderError::PositionUnavailable) => {
                write!(f, "Position unavailable. Check that GPS is enabled.")
            }
            Advisory::Provider(ProviderError::Timeout) => write!(f, "Location timeout."),
            Advisory::RouteComputed {
                radars,
                next,
                travel_time,
            } => {
                write!(f, "Route computed")?;
                if let Some(time) = travel_time {
                    write!(f, " ({})", time)?;
                }
                write!(f, ". {} radars detected on the route.", radars)?;
                if let Some(next) = next {
                    write!(f, " Next: {}.", next)?;
                }
                Ok(())
            }
            Advisory::DestinationNotFound => write!(f, "Destination not found."),
            Advisory::NoRoute => write!(f, "Could not compute a route."),
            Advisory::RouteFailed => write!(f, "Error while computing the route."),
        }
    }
}

/// Where advisories end up: a toast, a speaker, a terminal
pub trait AdvisoryOutput {
    fn advise(&mut self, advisory: &Advisory);

    /// Every processed sample, radar alerts included
    fn tracking(&mut self, _update: &TrackingUpdate) {}
}

impl AdvisoryOutput for Vec<Advisory> {
    fn advise(&mut self, advisory: &Advisory) {
        self.push(advisory.clone());
    }
}

/// Result of one processed position sample
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingUpdate {
    pub estimate: FusedEstimate,
    pub readouts: Readouts,
    pub alert: Option<RadarAlert>,
    pub next_radar: Option<NextRadar>,
}

/// State of the current tracking session and route
pub struct TrackingSession {
    active: bool,
    fusion: SensorFusion,
    last_estimate: Option<FusedEstimate>,
    route: Option<RouteDescriptor>,
    index: RouteProximityIndex,
    alerts: AlertState,
}

impl TrackingSession {
    fn new(config: &NavigatorConfig) -> Self {
        Self {
            active: false,
            fusion: SensorFusion::new(config),
            last_estimate: None,
            route: None,
            index: RouteProximityIndex::new(&config.proximity),
            alerts: AlertState::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn last_estimate(&self) -> Option<&FusedEstimate> {
        self.last_estimate.as_ref()
    }

    pub fn route(&self) -> Option<&RouteDescriptor> {
        self.route.as_ref()
    }

    /// Radars within the buffer of the current route
    pub fn route_radars(&self) -> &[Candidate] {
        self.index.candidates()
    }

    pub fn alerts(&self) -> &AlertState {
        &self.alerts
    }
}

/// Owns the candidate set and drives the session from provider events
pub struct Navigator {
    candidates: Vec<Candidate>,
    engine: AlertEngine,
    session: TrackingSession,
}

impl Navigator {
    pub fn new(config: &NavigatorConfig, candidates: Vec<Candidate>) -> Self {
        info!(radars = candidates.len(), "Navigator ready");
        Self {
            candidates,
            engine: AlertEngine::new(&config.alert),
            session: TrackingSession::new(config),
        }
    }

    pub fn session(&self) -> &TrackingSession {
        &self.session
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Begin tracking, a no-op while already tracking
    pub fn start(&mut self) {
        if self.session.active {
            debug!("Tracking already active");
            return;
        }

        self.session.fusion.reset();
        self.session.last_estimate = None;
        self.session.active = true;
        info!("Tracking started");
    }

    /// Stop tracking and drop every buffered sample, the route is kept.
    ///
    /// The orientation sensor is released too, it needs a new opt-in.
    pub fn stop(&mut self) {
        if !self.session.active {
            return;
        }

        self.session.active = false;
        self.session.fusion.set_gyroscope(false);
        self.session.fusion.reset();
        self.session.last_estimate = None;
        info!("Tracking stopped");
    }

    pub fn set_gyroscope(&mut self, enabled: bool) {
        debug!(enabled, "Orientation sensor");
        self.session.fusion.set_gyroscope(enabled);
    }

    pub fn gyroscope_enabled(&self) -> bool {
        self.session.fusion.gyroscope_enabled()
    }

    /// Run a position sample to completion: fusion, then route progress.
    ///
    /// Nothing is produced while tracking is stopped or when the sample
    /// is rejected.
    pub fn process_sample(&mut self, raw: &RawSample, gyro_raw: Option<f64>) -> Option<TrackingUpdate> {
        if !self.session.active {
            debug!("Sample ignored, tracking stopped");
            return None;
        }

        let (estimate, readouts) = self.session.fusion.process(raw, gyro_raw)?;

        let mut alert = None;
        let mut next_radar = None;
        if self.session.route.is_some() {
            let radars = self.session.index.candidates();
            alert = self
                .engine
                .on_progress(estimate.coordinates, radars, &mut self.session.alerts, estimate.speed);
            next_radar = self.engine.nearest(estimate.coordinates, radars);
        }

        self.session.last_estimate = Some(estimate.clone());

        Some(TrackingUpdate {
            estimate,
            readouts,
            alert,
            next_radar,
        })
    }

    /// The location provider failed, no more samples until restarted
    pub fn provider_failed(&mut self, err: ProviderError) -> Advisory {
        warn!(error = ?err, "Location provider failed");
        self.stop();
        Advisory::Provider(err)
    }

    /// Replace the route, its radars and the alert record at once
    pub fn set_route(&mut self, route: RouteDescriptor) -> Advisory {
        let radars = self.session.index.rebuild(&self.candidates, &route.points).len();
        self.session.alerts.clear();

        let from: Option<Point> = self
            .session
            .last_estimate
            .as_ref()
            .map(|e| e.coordinates)
            .or_else(|| route.points.first().copied());
        let next = from.and_then(|p| self.engine.nearest(p, self.session.index.candidates()));
        let travel_time = route.travel_time();

        info!(
            radars,
            distance = %route.distance_km(),
            "Route set"
        );
        self.session.route = Some(route);

        Advisory::RouteComputed {
            radars,
            next,
            travel_time,
        }
    }

    /// A route request failed, the previous route stays in place
    pub fn route_failed(&self, err: &NavError) -> Advisory {
        warn!("Route request failed: {}", err);
        match err {
            NavError::DestinationNotFound => Advisory::DestinationNotFound,
            NavError::NoRoute => Advisory::NoRoute,
            _ => Advisory::RouteFailed,
        }
    }

    /// Handle the outcome of a route request
    pub fn route_computed(&mut self, result: Result<RouteDescriptor, NavError>) -> Advisory {
        match result {
            Ok(route) if route.points.len() >= 2 => self.set_route(route),
            Ok(_) => self.route_failed(&NavError::NoRoute),
            Err(e) => self.route_failed(&e),
        }
    }
}

#[cfg(test)]
mod tests;
