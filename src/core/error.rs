//! Error types for rally-copilot
//!
//! One error enum covers route parsing, position validation and the speech
//! worker. Only `MalformedRoute` and `RouteUnavailable` are meant to reach a
//! user; position and speech failures are logged and swallowed by the
//! controller.

use thiserror::Error;

/// Main error type for rally-copilot operations
#[derive(Debug, Error)]
pub enum Error {
    /// Route document is missing legs, or a step lacks a location
    #[error("Malformed route: {0}")]
    MalformedRoute(String),

    /// Position update is missing a coordinate or is out of range
    #[error("Invalid position update: {0}")]
    InvalidPositionUpdate(String),

    /// Directions provider answered with a non-OK status
    #[error("Route unavailable ({status}): {message}")]
    RouteUnavailable { status: String, message: String },

    /// Route or position document is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid configuration or parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Speech engine could not deliver an utterance
    #[error("Speech failed: {0}")]
    SpeechFailed(String),
}

impl Error {
    /// User-facing message for a provider status code
    pub fn route_unavailable(status: &str, provider_message: Option<&str>) -> Self {
        let message = match status {
            "ZERO_RESULTS" => "No route found. Try a more specific destination.".to_string(),
            "NOT_FOUND" => "Location not found. Check your destination.".to_string(),
            "INVALID_REQUEST" => "Invalid request. Check your input.".to_string(),
            "OVER_QUERY_LIMIT" => "API quota exceeded.".to_string(),
            "REQUEST_DENIED" => "API key issue. Check your directions API key.".to_string(),
            other => match provider_message {
                Some(detail) => format!("Error: {other} ({detail})"),
                None => format!("Error: {other}"),
            },
        };

        Error::RouteUnavailable {
            status: status.to_string(),
            message,
        }
    }
}

/// Convenience result type for rally-copilot operations
pub type Result<T> = std::result::Result<T, Error>;
