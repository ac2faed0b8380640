//! Proximity tracking over an ordered waypoint sequence
//!
//! The session holds a read cursor (`next_index`) into an immutable waypoint
//! list. The cursor only moves forward, one step per trigger, and sits at
//! `waypoints.len()` once the route is complete.

use log::{debug, info};
use serde::Serialize;

use crate::core::config::DEFAULT_PROXIMITY_THRESHOLD_M;
use crate::core::geo::{distance, GeoPoint};
use crate::core::route::Waypoint;

/// Where the tracker stands on the current route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrackerState {
    /// Waypoint at this index is armed
    Tracking(usize),
    /// Every waypoint has fired
    Complete,
}

/// Mutable navigation state for one route traversal
#[derive(Debug, Clone, Default)]
pub struct NavigationSession {
    waypoints: Vec<Waypoint>,
    next_index: usize,
    current_position: Option<GeoPoint>,
    active: bool,
}

impl NavigationSession {
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            ..Default::default()
        }
    }

    /// Swap in a new route and rewind the cursor; `active` is left alone
    pub fn replace_waypoints(&mut self, waypoints: Vec<Waypoint>) {
        self.waypoints = waypoints;
        self.next_index = 0;
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn next_waypoint(&self) -> Option<&Waypoint> {
        self.waypoints.get(self.next_index)
    }

    pub fn current_position(&self) -> Option<GeoPoint> {
        self.current_position
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn state(&self) -> TrackerState {
        if self.next_index >= self.waypoints.len() {
            TrackerState::Complete
        } else {
            TrackerState::Tracking(self.next_index)
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state() == TrackerState::Complete
    }

    /// Distance from the last accepted position to the armed waypoint
    pub fn distance_to_next(&self) -> Option<f64> {
        let position = self.current_position?;
        self.next_waypoint()
            .map(|waypoint| distance(&position, &waypoint.location))
    }
}

/// A waypoint came within the proximity threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerEvent {
    /// Index of the waypoint that fired
    pub index: usize,
    pub waypoint: Waypoint,
    /// Distance from the triggering position, in meters
    pub distance_m: f64,
}

/// Fires each waypoint at most once, in order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityTracker {
    threshold_m: f64,
}

impl Default for ProximityTracker {
    fn default() -> Self {
        Self::new(DEFAULT_PROXIMITY_THRESHOLD_M)
    }
}

impl ProximityTracker {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m }
    }

    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Feed one position into the session.
    ///
    /// Inactive sessions ignore the position entirely. Otherwise the position
    /// is recorded and, when the armed waypoint is strictly closer than the
    /// threshold, a trigger is returned and the cursor advances past it.
    pub fn on_position(
        &self,
        session: &mut NavigationSession,
        position: GeoPoint,
    ) -> Option<TriggerEvent> {
        if !session.active {
            return None;
        }
        session.current_position = Some(position);

        let index = session.next_index;
        let waypoint = session.waypoints.get(index)?;
        let d = distance(&position, &waypoint.location);
        debug!(
            "Waypoint {}/{} is {:.1} m away",
            index + 1,
            session.waypoints.len(),
            d
        );

        if d >= self.threshold_m {
            return None;
        }

        let event = TriggerEvent {
            index,
            waypoint: waypoint.clone(),
            distance_m: d,
        };
        session.next_index += 1;

        info!(
            "Reached waypoint {}/{} ({})",
            index + 1,
            session.waypoints.len(),
            event.waypoint.maneuver
        );
        if session.is_complete() {
            info!("Route complete");
        }

        Some(event)
    }
}
