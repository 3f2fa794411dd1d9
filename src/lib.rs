//! procsnap - host telemetry snapshots for Linux.
//!
//! Reads point-in-time CPU, memory, swap, load, filesystem, network and
//! per-process records from `/proc` and a few system calls, computes deltas
//! between snapshots, and samples CPU usage periodically on a background
//! thread. The `procsnapd` binary is a small daemon built on top of it.

pub mod collector;
pub mod config;
pub mod model;
pub mod rates;
pub mod sampler;
pub mod util;
