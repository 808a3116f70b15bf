//! Event loop driving a [`Navigator`]
//!
//! Every provider callback becomes a [`NavEvent`] on a single queue, each
//! event is handled to completion before the next one. The orientation
//! sensor only overwrites the latest angle.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use geo::geometry::Point;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::fusion::RawSample;
use crate::route::RouteDescriptor;
use crate::services::{plan_route, Geocoder, Router};
use crate::session::{Advisory, AdvisoryOutput, Navigator, ProviderError};
use crate::NavError;

/// Quiet period of the destination search
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum NavEvent {
    Start,
    Stop,
    Position(RawSample),
    PositionError(ProviderError),
    SetGyroscope(bool),
    RouteComputed(Result<RouteDescriptor, NavError>),
    Shutdown,
}

/// Producer side, cheap to clone for every provider
#[derive(Clone)]
pub struct NavHandle {
    events: mpsc::Sender<NavEvent>,
    orientation: Arc<watch::Sender<Option<f64>>>,
}

impl NavHandle {
    pub async fn send(&self, event: NavEvent) -> Result<(), NavError> {
        self.events
            .send(event)
            .await
            .map_err(|_| NavError::service("event loop closed"))
    }

    /// Latest raw orientation angle, replaces the previous one
    pub fn set_orientation(&self, degrees: f64) {
        self.orientation.send_replace(Some(degrees));
    }
}

/// Consumer side, see [`EventLoop::run`]
pub struct EventLoop {
    events: mpsc::Receiver<NavEvent>,
    orientation: watch::Receiver<Option<f64>>,
    orientation_reset: Arc<watch::Sender<Option<f64>>>,
}

/// New event queue with room for `capacity` pending events
pub fn channel(capacity: usize) -> (NavHandle, EventLoop) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (otx, orx) = watch::channel(None);

    let otx = Arc::new(otx);

    let handle = NavHandle {
        events: tx,
        orientation: otx.clone(),
    };
    let event_loop = EventLoop {
        events: rx,
        orientation: orx,
        orientation_reset: otx,
    };

    (handle, event_loop)
}

impl EventLoop {
    /// Handle events until shutdown or until every handle is dropped
    pub async fn run<S: AdvisoryOutput>(mut self, mut navigator: Navigator, sink: &mut S) -> Navigator {
        info!("Event loop started");

        while let Some(event) = self.events.recv().await {
            match event {
                NavEvent::Start => navigator.start(),
                NavEvent::Stop => {
                    navigator.stop();
                    self.forget_orientation();
                }
                NavEvent::Position(raw) => {
                    let gyro = if navigator.gyroscope_enabled() {
                        *self.orientation.borrow()
                    } else {
                        None
                    };

                    if let Some(update) = navigator.process_sample(&raw, gyro) {
                        if let Some(alert) = &update.alert {
                            sink.advise(&Advisory::Radar(alert.clone()));
                        }
                        sink.tracking(&update);
                    }
                }
                NavEvent::PositionError(err) => {
                    sink.advise(&navigator.provider_failed(err));
                    self.forget_orientation();
                }
                NavEvent::SetGyroscope(enabled) => navigator.set_gyroscope(enabled),
                NavEvent::RouteComputed(result) => sink.advise(&navigator.route_computed(result)),
                NavEvent::Shutdown => break,
            }
        }

        navigator.stop();
        info!("Event loop finished");

        navigator
    }

    /// Angles read before a stop never reach a later session
    fn forget_orientation(&self) {
        self.orientation_reset.send_replace(None);
    }
}

/// Geocode and route off the loop, the outcome comes back as a
/// [`NavEvent::RouteComputed`]
pub fn spawn_route_request(
    geocoders: Arc<Vec<Box<dyn Geocoder>>>,
    router: Arc<dyn Router>,
    query: String,
    origin: Point,
    handle: NavHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        debug!(query = %query, "Route requested");
        let result = plan_route(&geocoders, router.as_ref(), &query, origin).await;

        if handle.send(NavEvent::RouteComputed(result)).await.is_err() {
            warn!("Route computed after the event loop closed");
        }
    })
}

/// Runs only the last scheduled task, once it was not replaced for the
/// whole delay
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();

        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            sleep(delay).await;
            task.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
