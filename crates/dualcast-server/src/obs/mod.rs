//! Lightweight in-process observability.
//!
//! Counters are plain atomics; they are read by the throughput reporter and
//! by the `/stats` endpoint.

pub mod throughput;

pub use throughput::{run_reporter, ThroughputCounter};
