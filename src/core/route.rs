//! Route documents and waypoint extraction
//!
//! The directions provider hands over a loosely typed JSON document. It is
//! validated exactly once here and turned into an ordered `Vec<Waypoint>`;
//! nothing downstream looks at the raw document again.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::callout::Instruction;
use crate::core::error::{Error, Result};
use crate::core::geo::GeoPoint;

/// Maneuver tag used when the provider leaves a step without one
pub const DEFAULT_MANEUVER: &str = "straight";

/// `{ "lat": .., "lng": .. }` as written by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

impl LatLng {
    /// Both coordinates present, finite and within WGS84 bounds
    pub fn to_point(self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng))
                if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng) =>
            {
                Some(GeoPoint::new(lat, lng))
            }
            _ => None,
        }
    }
}

/// `{ "text": "1.2 km", "value": 1234 }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub value: Option<f64>,
}

impl TextValue {
    /// Numeric value truncated into whole units, negatives and NaN clamped to 0
    fn whole_units(&self) -> u32 {
        self.value.map(|v| v.max(0.0) as u32).unwrap_or(0)
    }
}

/// One provider step, untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepRaw {
    #[serde(default)]
    pub start_location: Option<LatLng>,
    #[serde(default)]
    pub end_location: Option<LatLng>,
    #[serde(default)]
    pub distance: Option<TextValue>,
    #[serde(default)]
    pub duration: Option<TextValue>,
    #[serde(default)]
    pub maneuver: Option<String>,
    #[serde(default)]
    pub html_instructions: String,
}

/// One route leg between two stops
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default)]
    pub distance: Option<TextValue>,
    #[serde(default)]
    pub duration: Option<TextValue>,
    #[serde(default)]
    pub steps: Vec<StepRaw>,
}

impl Leg {
    pub fn distance_text(&self) -> &str {
        self.distance.as_ref().map(|d| d.text.as_str()).unwrap_or("")
    }

    pub fn duration_text(&self) -> &str {
        self.duration.as_ref().map(|d| d.text.as_str()).unwrap_or("")
    }
}

/// A provider route document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub legs: Option<Vec<Leg>>,
}

impl Route {
    /// Parse a bare route document
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Legs, or `MalformedRoute` when absent or empty
    pub fn legs(&self) -> Result<&[Leg]> {
        match self.legs.as_deref() {
            Some(legs) if !legs.is_empty() => Ok(legs),
            Some(_) => Err(Error::MalformedRoute("route has an empty legs list".to_string())),
            None => Err(Error::MalformedRoute("route has no legs".to_string())),
        }
    }
}

/// Full directions response: `{ status, routes, error_message? }`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl DirectionsResponse {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// First route of an `OK` response
    pub fn into_route(self) -> Result<Route> {
        if self.status != "OK" {
            return Err(Error::route_unavailable(&self.status, self.error_message.as_deref()));
        }
        self.routes
            .into_iter()
            .next()
            .ok_or_else(|| Error::MalformedRoute("OK response without routes".to_string()))
    }
}

/// One step of a route, anchored at its end location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Waypoint {
    pub location: GeoPoint,
    pub raw_instruction: String,
    pub distance_meters: u32,
    pub duration_seconds: u32,
    pub maneuver: String,
}

impl Waypoint {
    /// Projection handed to the callout generator
    pub fn instruction(&self) -> Instruction {
        Instruction::new(self.maneuver.clone(), self.distance_meters)
    }

    /// Provider instruction with markup removed
    pub fn plain_instruction(&self) -> String {
        strip_html(&self.raw_instruction)
    }
}

/// Flatten every step of every leg into driving order.
///
/// All or nothing: a single step without a usable end location fails the
/// whole route.
pub fn extract(route: &Route) -> Result<Vec<Waypoint>> {
    let legs = route.legs()?;
    let mut waypoints = Vec::with_capacity(legs.iter().map(|leg| leg.steps.len()).sum());

    for (leg_index, leg) in legs.iter().enumerate() {
        for (step_index, step) in leg.steps.iter().enumerate() {
            let location = step
                .end_location
                .and_then(LatLng::to_point)
                .ok_or_else(|| {
                    Error::MalformedRoute(format!(
                        "leg {leg_index} step {step_index} has no usable end_location"
                    ))
                })?;

            let maneuver = match step.maneuver.as_deref().map(str::trim) {
                Some(tag) if !tag.is_empty() => tag.to_string(),
                _ => DEFAULT_MANEUVER.to_string(),
            };

            waypoints.push(Waypoint {
                location,
                raw_instruction: step.html_instructions.clone(),
                distance_meters: step.distance.as_ref().map(TextValue::whole_units).unwrap_or(0),
                duration_seconds: step.duration.as_ref().map(TextValue::whole_units).unwrap_or(0),
                maneuver,
            });
        }
    }

    Ok(waypoints)
}

/// Headline numbers shown before a route is confirmed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub distance_text: String,
    pub duration_text: String,
    pub start_address: String,
    pub end_address: String,
    pub leg_count: usize,
    pub step_count: usize,
}

impl RouteSummary {
    pub fn from_route(route: &Route) -> Result<Self> {
        let legs = route.legs()?;
        let first = &legs[0];
        let last = &legs[legs.len() - 1];

        Ok(Self {
            distance_text: first.distance_text().to_string(),
            duration_text: first.duration_text().to_string(),
            start_address: first.start_address.clone(),
            end_address: last.end_address.clone(),
            leg_count: legs.len(),
            step_count: legs.iter().map(|leg| leg.steps.len()).sum(),
        })
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}\nFrom: {}\nTo: {}",
            self.distance_text, self.duration_text, self.start_address, self.end_address
        )
    }
}

/// Drop tags, decode the usual entities and collapse whitespace
pub fn strip_html(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&");

    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}
