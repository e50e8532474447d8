//! Strata Core
//!
//! Shared infrastructure for the Strata terrain renderer: logging bootstrap,
//! profiling hooks, configuration, math re-exports and bounding volumes.

pub mod config;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;

pub use config::Config;
