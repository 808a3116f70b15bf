//! Proximity alerts, at most one per radar and route

use std::collections::HashSet;
use std::fmt;

use geo::geometry::Point;
use tracing::info;

use super::Candidate;
use crate::config::AlertConfig;
use crate::geometry::distance_m;

/// Identities already alerted on the current route
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertState {
    alerted: HashSet<String>,
}

impl AlertState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.alerted.contains(identity)
    }

    /// Record an identity, false when it was already there
    pub fn insert(&mut self, identity: String) -> bool {
        self.alerted.insert(identity)
    }

    pub fn len(&self) -> usize {
        self.alerted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerted.is_empty()
    }

    pub fn clear(&mut self) {
        self.alerted.clear();
    }
}

/// A radar with its distance from the current position
#[derive(Clone, Debug, PartialEq)]
pub struct Ranked<'a> {
    pub candidate: &'a Candidate,
    pub distance_m: f64,
}

/// The "next radar" readout
#[derive(Clone, Debug, PartialEq)]
pub struct NextRadar {
    pub candidate: Candidate,
    pub distance_m: f64,
}

impl fmt::Display for NextRadar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} m, {}",
            self.candidate.label(),
            self.distance_m.round(),
            self.candidate.limit_text().unwrap_or_else(|| "—".to_string())
        )
    }
}

/// One shot warning for a radar ahead
#[derive(Clone, Debug, PartialEq)]
pub struct RadarAlert {
    pub identity: String,
    pub candidate: Candidate,
    pub distance_m: f64,
    /// Text to show
    pub message: String,
    /// Text to speak
    pub spoken: String,
}

impl RadarAlert {
    fn new(candidate: &Candidate, distance_m: f64, speed_kmh: Option<f64>) -> Self {
        let meters = distance_m.round();
        let speed = match speed_kmh {
            Some(s) => format!("{} km/h", s.round()),
            None => "—".to_string(),
        };
        let limit = candidate.limit_text();

        let message = format!(
            "⚠️ {} {} m ahead, limit {}. Speed {}.",
            candidate.label(),
            meters,
            limit.as_deref().unwrap_or("not specified"),
            speed
        );
        let spoken = format!(
            "Caution. Radar in {} meters. Limit {}.",
            meters,
            candidate
                .limit
                .map(|l| l.to_string())
                .unwrap_or_else(|| "not specified".to_string())
        );

        Self {
            identity: candidate.identity(),
            candidate: candidate.clone(),
            distance_m,
            message,
            spoken,
        }
    }
}

pub struct AlertEngine {
    config: AlertConfig,
}

impl AlertEngine {
    pub fn new(config: &AlertConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Radars sorted by distance, ties kept in list order, truncated to
    /// the configured length
    pub fn ranked<'a>(&self, position: Point, candidates: &'a [Candidate]) -> Vec<Ranked<'a>> {
        let mut ranked: Vec<Ranked> = candidates
            .iter()
            .map(|candidate| Ranked {
                candidate,
                distance_m: distance_m(position, candidate.coordinates),
            })
            .collect();

        ranked.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
        ranked.truncate(self.config.ranked_len.max(1));

        ranked
    }

    /// Closest radar, whatever its distance
    pub fn nearest(&self, position: Point, candidates: &[Candidate]) -> Option<NextRadar> {
        self.ranked(position, candidates)
            .into_iter()
            .next()
            .map(|r| NextRadar {
                candidate: r.candidate.clone(),
                distance_m: r.distance_m,
            })
    }

    /// Alert for the closest radar within the alert radius, unless that
    /// radar already alerted on this route.
    pub fn on_progress(
        &self,
        position: Point,
        candidates: &[Candidate],
        state: &mut AlertState,
        speed_kmh: Option<f64>,
    ) -> Option<RadarAlert> {
        let nearest = candidates
            .iter()
            .map(|c| (c, distance_m(position, c.coordinates)))
            .filter(|(_, d)| *d <= self.config.radius_m)
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        let (candidate, distance) = nearest;
        let identity = candidate.identity();
        if state.contains(&identity) {
            return None;
        }

        let alert = RadarAlert::new(candidate, distance, speed_kmh);
        info!(radar = %identity, distance = alert.distance_m.round(), "Radar ahead");
        state.insert(identity);

        Some(alert)
    }
}
