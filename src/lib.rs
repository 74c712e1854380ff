//! Headless character locomotion simulation.
//!
//! Exposes the locomotion motor, its physics world, and the session/server
//! harness for testing and library use.

pub mod config;
pub mod sim;
