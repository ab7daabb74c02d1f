//! Domain primitives for the serverless runtime benchmark.
//!
//! This crate owns deterministic dispatch behavior and its contracts: the
//! enumerated benchmark targets, the queue bindings handed to the dispatcher,
//! the burst delay curve, the committed deployment topology, and the workload
//! digest contract. It intentionally excludes AWS SDK and Lambda runtime
//! concerns.

pub mod burst;
pub mod contract;
pub mod topology;
pub mod workload;
