//! # Rally-copilot Library
//!
//! Turns a turn-by-turn route from a directions provider and a stream of
//! position fixes into rally pace-note callouts ("Three left!, 600 meters").
//!
//! ## Features
//!
//! - **Route extraction**: provider route documents become an ordered list of typed waypoints
//! - **Proximity tracking**: each waypoint fires exactly once when the car gets within 200 m
//! - **Rally terminology**: maneuver tags map onto Flat / Two / Three / Hairpin calls
//! - **Non-blocking output**: speech is queued to a worker, never stalling position processing
//! - **Simulation**: replay the first waypoints at a fixed cadence where no GPS is available
//!
//! ## Basic Usage
//!
//! ```rust
//! use rally_copilot::{generate_callout, Instruction};
//!
//! assert_eq!(generate_callout("turn-right", 600), "Three right!, 600 meters");
//! assert_eq!(generate_callout("turn-sharp-left", 80), "HAIRPIN left! now!");
//! assert_eq!(
//!     rally_copilot::generate(&Instruction::new("roundabout-right", 150)),
//!     "Roundabout ahead, 150"
//! );
//! ```
//!
//! ## Navigation
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rally_copilot::{
//!     LogSpeechEngine, NavigationConfig, NavigationController, PositionSource, SpeechQueue,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let route = rally_copilot::load_route("route.json", false)?;
//!
//!     let speech = SpeechQueue::spawn(Arc::new(LogSpeechEngine))?;
//!     let controller = NavigationController::new(
//!         NavigationConfig::default(),
//!         Arc::new(speech),
//!         Arc::new(|callout: &str| println!(">> {callout}")),
//!     )?;
//!
//!     controller.set_route(&route)?;
//!     controller.start(PositionSource::Simulated)?.await?;
//!     Ok(())
//! }
//! ```

use std::path::Path;

// Re-export core types that users might need
pub use crate::core::callout::{
    classify, format_callout, generate, preview_callouts, Direction, Instruction, RallyCall,
};
pub use crate::core::config::{NavigationConfig, DEFAULT_PROXIMITY_THRESHOLD_M};
pub use crate::core::controller::{
    NavigationController, PositionSource, PositionUpdate, SessionSnapshot,
};
pub use crate::core::error::{Error, Result};
pub use crate::core::geo::{distance, GeoPoint, EARTH_RADIUS_M};
pub use crate::core::route::{
    extract, strip_html, DirectionsResponse, Leg, Route, RouteSummary, StepRaw, Waypoint,
};
pub use crate::core::sink::{DisplaySink, LogSpeechEngine, SpeechEngine, SpeechQueue, SpeechSink};
pub use crate::core::tracker::{NavigationSession, ProximityTracker, TrackerState, TriggerEvent};

// Internal modules
mod core;

// C-compatible FFI bindings (optional)
#[cfg(feature = "c-bindings")]
pub mod ffi;

/// Parse a bare route document (`{ "legs": [...] }`)
///
/// # Examples
/// ```rust
/// let route = rally_copilot::parse_route(r#"{
///     "legs": [{
///         "start_address": "Beauchamp Ave", "end_address": "Warwick",
///         "steps": [{ "end_location": { "lat": 52.28, "lng": -1.54 },
///                     "distance": { "value": 320 }, "maneuver": "turn-left",
///                     "html_instructions": "Turn <b>left</b>" }]
///     }]
/// }"#)?;
/// assert_eq!(rally_copilot::extract(&route)?.len(), 1);
/// # Ok::<(), rally_copilot::Error>(())
/// ```
pub fn parse_route(json: &str) -> Result<Route> {
    Route::from_json(json)
}

/// Parse a full directions response and pick its first route
///
/// Non-`OK` statuses come back as `Error::RouteUnavailable` with a message
/// suitable for showing to the driver.
pub fn parse_directions(json: &str) -> Result<Route> {
    DirectionsResponse::from_json(json)?.into_route()
}

/// Read a route from disk; `directions` selects the full provider response format
pub fn load_route<P: AsRef<Path>>(path: P, directions: bool) -> Result<Route> {
    let json = std::fs::read_to_string(path)?;
    if directions {
        parse_directions(&json)
    } else {
        parse_route(&json)
    }
}

/// Callout for a maneuver tag and distance, e.g. `"Flat left, 250"`
pub fn generate_callout(maneuver: &str, distance_meters: u32) -> String {
    generate(&Instruction::new(maneuver, distance_meters))
}
