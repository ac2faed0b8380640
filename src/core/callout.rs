//! Rally callout generation
//!
//! Maps a provider maneuver tag onto rally pace-note terminology and phrases
//! it by remaining distance. Classification is an ordered list of substring
//! rules; the first rule that matches wins.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::core::route::Waypoint;

/// Callouts above this distance spell out the unit
pub const FAR_TIER_M: u32 = 500;

/// Callouts at or below this distance are immediate
pub const NOW_TIER_M: u32 = 100;

/// Turn direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "left"),
            Direction::Right => write!(f, "right"),
        }
    }
}

/// Pace-note severity, gentlest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "call", content = "direction", rename_all = "lowercase")]
pub enum RallyCall {
    Straight,
    Flat(Direction),
    Two(Direction),
    Three(Direction),
    Hairpin(Direction),
}

impl RallyCall {
    pub fn direction(&self) -> Option<Direction> {
        match *self {
            RallyCall::Straight => None,
            RallyCall::Flat(d) | RallyCall::Two(d) | RallyCall::Three(d) | RallyCall::Hairpin(d) => {
                Some(d)
            }
        }
    }
}

impl fmt::Display for RallyCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RallyCall::Straight => write!(f, "straight"),
            RallyCall::Flat(d) => write!(f, "Flat {d}"),
            RallyCall::Two(d) => write!(f, "Two {d}"),
            RallyCall::Three(d) => write!(f, "Three {d}!"),
            RallyCall::Hairpin(d) => write!(f, "HAIRPIN {d}!"),
        }
    }
}

/// What the generator needs to know about the waypoint being announced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    pub maneuver: String,
    #[serde(default, deserialize_with = "clamped_meters")]
    pub distance_meters: u32,
}

impl Instruction {
    pub fn new(maneuver: impl Into<String>, distance_meters: u32) -> Self {
        Self {
            maneuver: maneuver.into(),
            distance_meters,
        }
    }

    /// Build from an unchecked distance; negative, NaN and missing become 0
    pub fn from_raw(maneuver: impl Into<String>, distance: Option<f64>) -> Self {
        Self::new(maneuver, clamp_meters(distance))
    }
}

fn clamp_meters(distance: Option<f64>) -> u32 {
    distance.map(|d| d.max(0.0) as u32).unwrap_or(0)
}

fn clamped_meters<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(clamp_meters(raw))
}

/// Classify a maneuver tag, case-insensitively
pub fn classify(maneuver: &str) -> RallyCall {
    let tag = maneuver.to_lowercase();

    let direction = if tag.contains("left") {
        Direction::Left
    } else if tag.contains("right") {
        Direction::Right
    } else {
        return RallyCall::Straight;
    };

    if tag.contains("sharp") || tag.contains("hairpin") {
        RallyCall::Hairpin(direction)
    } else if tag.contains("slight") {
        RallyCall::Flat(direction)
    } else if tag.contains("turn") {
        RallyCall::Three(direction)
    } else {
        RallyCall::Two(direction)
    }
}

/// Phrase a call by distance tier: far tiers name the distance, near ones say "now"
pub fn format_callout(call: RallyCall, distance_meters: u32) -> String {
    if distance_meters > FAR_TIER_M {
        format!("{call}, {distance_meters} meters")
    } else if distance_meters > NOW_TIER_M {
        format!("{call}, {distance_meters}")
    } else {
        format!("{call} now!")
    }
}

/// Matched against the tag as written, unlike `classify`
fn is_roundabout(maneuver: &str) -> bool {
    maneuver.contains("roundabout")
}

/// Full pipeline: classify, phrase, then apply the roundabout override
pub fn generate(instruction: &Instruction) -> String {
    if is_roundabout(&instruction.maneuver) {
        return format!("Roundabout ahead, {}", instruction.distance_meters);
    }
    format_callout(classify(&instruction.maneuver), instruction.distance_meters)
}

/// Callouts for a whole route in driving order
pub fn preview_callouts(waypoints: &[Waypoint]) -> Vec<String> {
    waypoints
        .iter()
        .map(|waypoint| generate(&waypoint.instruction()))
        .collect()
}
