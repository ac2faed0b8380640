//! CLI-specific utilities for rally-copilot
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod feed;
pub mod progress;

pub use feed::spawn_position_feed;
pub use progress::RouteProgress;
