//! Landscape simulation
//!
//! [`Landscape`] owns the fields of one wildfire landscape and drives the
//! propagation engine through reset, ignition and generation steps.
//! [`LandscapeConfig`] describes how its fields are sampled.

pub mod config;
pub mod landscape;

pub use config::LandscapeConfig;
pub use landscape::{Landscape, LandscapeState, LandscapeStats};
