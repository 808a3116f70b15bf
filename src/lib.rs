//! radarahead - Speed camera alerts from live, noisy positions along a planned route

pub mod config;
mod error;
pub mod fusion;
pub mod geometry;
pub mod radar;
pub mod route;
pub mod runtime;
pub mod services;
pub mod session;
pub mod sources;

pub use config::NavigatorConfig;
pub use error::NavError;
pub use fusion::{FusedEstimate, RawSample};
pub use radar::alert::{NextRadar, RadarAlert};
pub use radar::Candidate;
pub use route::gpx::route_from_gpx;
pub use route::RouteDescriptor;
pub use runtime::{channel, EventLoop, NavEvent, NavHandle};
pub use session::{Advisory, AdvisoryOutput, Navigator, ProviderError, TrackingUpdate};
