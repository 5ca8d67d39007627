//! Integration test utilities for the Lingua API
//!
//! Spawns the API in-process over in-memory storage and drives it through
//! reqwest and the `lingua-client` coordinator.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
