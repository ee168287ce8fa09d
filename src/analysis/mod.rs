//! Outcome classification and session statistics.

pub mod classifier;
pub mod metrics;

pub use classifier::*;
pub use metrics::*;
