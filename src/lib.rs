//! Webcam finger counting driving a 2D character.
//!
//! Frames flow one way: camera -> skin mask -> largest contour -> convexity
//! defects -> raw finger count (capture thread), then debounce -> sprite and
//! position (presentation loop).

pub mod camera;
pub mod capture;
pub mod config;
pub mod contour;
pub mod draw;
pub mod error;
pub mod fingers;
pub mod gesture;
pub mod present;
pub mod sprites;
pub mod types;
pub mod vision;

pub use error::Error;
