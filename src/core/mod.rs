//! Core engine modules for rally-copilot
//!
//! Leaf modules first: `geo`, `route` and `callout` are pure; `tracker` owns
//! the cursor logic; `controller` wires everything to the outside world.

pub mod error;
pub mod config;
pub mod geo;
pub mod route;
pub mod callout;
pub mod tracker;
pub mod sink;
pub mod controller;
