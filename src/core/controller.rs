//! Navigation controller
//!
//! Owns the session behind one mutex and wires the tracker to the callout
//! generator and the output sinks. Exactly one position source drives a
//! controller at a time; `start` cancels whichever driver was running before.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::callout::generate;
use crate::core::config::NavigationConfig;
use crate::core::error::{Error, Result};
use crate::core::geo::GeoPoint;
use crate::core::route::{extract, Route, RouteSummary, Waypoint};
use crate::core::sink::{DisplaySink, SpeechSink};
use crate::core::tracker::{NavigationSession, ProximityTracker, TrackerState};

/// Position fix as delivered by a sensor callback or a feed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    #[serde(default, alias = "lon", alias = "lng")]
    pub longitude: Option<f64>,
}

impl PositionUpdate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Validate into a point: both coordinates present, finite and in range
    pub fn to_point(&self) -> Result<GeoPoint> {
        let latitude = self
            .latitude
            .ok_or_else(|| Error::InvalidPositionUpdate("missing latitude".to_string()))?;
        let longitude = self
            .longitude
            .ok_or_else(|| Error::InvalidPositionUpdate("missing longitude".to_string()))?;

        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidPositionUpdate(format!(
                "latitude {latitude} out of range"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidPositionUpdate(format!(
                "longitude {longitude} out of range"
            )));
        }

        Ok(GeoPoint::new(latitude, longitude))
    }
}

impl From<GeoPoint> for PositionUpdate {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.latitude, point.longitude)
    }
}

/// Where position updates come from for one `start`
#[derive(Debug)]
pub enum PositionSource {
    /// Live fixes pushed by a sensor task or thread
    Live(mpsc::Receiver<PositionUpdate>),
    /// Replay the next few waypoint locations at a fixed cadence
    Simulated,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub next_index: usize,
    pub waypoint_count: usize,
    pub current_position: Option<GeoPoint>,
    pub active: bool,
    pub state: TrackerState,
}

struct Shared {
    session: Mutex<NavigationSession>,
    summary: Mutex<Option<RouteSummary>>,
    driver: Mutex<Option<CancellationToken>>,
    /// Held from trigger through sink delivery so callouts leave in driving order
    dispatch: Mutex<()>,
    tracker: ProximityTracker,
    config: NavigationConfig,
    speech: Arc<dyn SpeechSink>,
    display: Arc<dyn DisplaySink>,
}

/// Orchestrates route, tracker, callouts and sinks for one navigation session
#[derive(Clone)]
pub struct NavigationController {
    shared: Arc<Shared>,
}

impl NavigationController {
    pub fn new(
        config: NavigationConfig,
        speech: Arc<dyn SpeechSink>,
        display: Arc<dyn DisplaySink>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            shared: Arc::new(Shared {
                session: Mutex::new(NavigationSession::default()),
                summary: Mutex::new(None),
                driver: Mutex::new(None),
                dispatch: Mutex::new(()),
                tracker: ProximityTracker::new(config.proximity_threshold_m),
                config,
                speech,
                display,
            }),
        })
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.shared.config
    }

    /// Extract and install a new route.
    ///
    /// On failure the current session is left exactly as it was. On success
    /// the cursor rewinds to the first waypoint and `active` is unchanged.
    pub fn set_route(&self, route: &Route) -> Result<()> {
        let waypoints = extract(route)?;
        let summary = RouteSummary::from_route(route)?;
        let count = waypoints.len();

        self.shared.session.lock().replace_waypoints(waypoints);
        info!(
            "Route set: {} waypoints, {} to {}",
            count, summary.start_address, summary.end_address
        );
        *self.shared.summary.lock() = Some(summary);

        Ok(())
    }

    /// Activate the session and spawn a driver for `source` on the current runtime.
    ///
    /// The returned handle completes when the source is exhausted or the
    /// controller is stopped.
    pub fn start(&self, source: PositionSource) -> Result<JoinHandle<()>> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::InvalidInput(format!("navigation needs a tokio runtime: {e}")))?;

        let token = CancellationToken::new();
        if let Some(previous) = self.shared.driver.lock().replace(token.clone()) {
            debug!("Cancelling previous position driver");
            previous.cancel();
        }

        let resume_at = {
            let mut session = self.shared.session.lock();
            session.set_active(true);
            session.next_index()
        };

        let controller = self.clone();
        let join = match source {
            PositionSource::Live(rx) => {
                info!("Navigation started from waypoint {} (live positions)", resume_at + 1);
                handle.spawn(run_live(controller, rx, token))
            }
            PositionSource::Simulated => {
                info!("Navigation started from waypoint {} (simulated replay)", resume_at + 1);
                handle.spawn(run_simulation(controller, token))
            }
        };

        Ok(join)
    }

    /// Pause: deactivate and cancel the running driver. Waypoints and cursor are kept.
    pub fn stop(&self) {
        self.shared.session.lock().set_active(false);
        if let Some(token) = self.shared.driver.lock().take() {
            token.cancel();
        }
        info!("Navigation stopped");
    }

    /// Feed one position into the session.
    ///
    /// Invalid updates are dropped. When the update triggers a waypoint the
    /// callout is sent to both sinks and also returned. Concurrent callers are
    /// serialized, so sinks see callouts in the order the waypoints fired.
    pub fn update_position(&self, update: PositionUpdate) -> Option<String> {
        let position = match update.to_point() {
            Ok(position) => position,
            Err(e) => {
                debug!("Dropping position update: {e}");
                return None;
            }
        };

        // Lock order is dispatch then session; sinks run with only dispatch held
        let _dispatch = self.shared.dispatch.lock();
        let event = {
            let mut session = self.shared.session.lock();
            self.shared.tracker.on_position(&mut session, position)?
        };

        let callout = generate(&event.waypoint.instruction());
        self.shared.display.display(&callout);
        self.shared.speech.speak(&callout);

        Some(callout)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let session = self.shared.session.lock();
        SessionSnapshot {
            next_index: session.next_index(),
            waypoint_count: session.waypoints().len(),
            current_position: session.current_position(),
            active: session.is_active(),
            state: session.state(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.session.lock().is_active()
    }

    pub fn is_complete(&self) -> bool {
        self.shared.session.lock().is_complete()
    }

    pub fn next_waypoint(&self) -> Option<Waypoint> {
        self.shared.session.lock().next_waypoint().cloned()
    }

    pub fn distance_to_next(&self) -> Option<f64> {
        self.shared.session.lock().distance_to_next()
    }

    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.shared.session.lock().waypoints().to_vec()
    }

    pub fn route_summary(&self) -> Option<RouteSummary> {
        self.shared.summary.lock().clone()
    }

    /// Driver still allowed to run: its own token is live and the session is active
    fn driver_live(&self, token: &CancellationToken) -> bool {
        !token.is_cancelled() && self.is_active()
    }
}

/// Sleep unless cancelled first; true when the full delay elapsed
async fn sleep_or_cancel(delay: Duration, token: &CancellationToken) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn run_live(
    controller: NavigationController,
    mut rx: mpsc::Receiver<PositionUpdate>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => {
                debug!("Live position driver cancelled");
                break;
            }
            update = rx.recv() => match update {
                Some(update) => {
                    controller.update_position(update);
                }
                None => {
                    debug!("Live position feed closed");
                    break;
                }
            }
        }
    }
}

async fn run_simulation(controller: NavigationController, token: CancellationToken) {
    let config = controller.config().clone();

    if !sleep_or_cancel(config.simulation_start_delay, &token).await {
        return;
    }

    let (targets, total) = {
        let session = controller.shared.session.lock();
        let start = session.next_index();
        let targets: Vec<(usize, GeoPoint)> = session
            .waypoints()
            .iter()
            .enumerate()
            .skip(start)
            .take(config.simulation_max_waypoints)
            .map(|(index, waypoint)| (index, waypoint.location))
            .collect();
        (targets, session.waypoints().len())
    };

    let steps = targets.len();
    for (step, (index, location)) in targets.into_iter().enumerate() {
        if !controller.driver_live(&token) {
            debug!("Simulated replay cancelled before waypoint {}", index + 1);
            return;
        }

        info!("Simulating arrival at waypoint {}/{}", index + 1, total);
        controller.update_position(PositionUpdate::from(location));

        if step + 1 < steps && !sleep_or_cancel(config.simulation_interval, &token).await {
            debug!("Simulated replay cancelled during wait");
            return;
        }
    }

    debug!("Simulated replay finished");
}
