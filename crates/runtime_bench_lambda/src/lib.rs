//! AWS-oriented adapters and handlers for the runtime benchmark.
//!
//! This crate owns runtime integration details (Lambda handlers and queue
//! dispatch) around the pure primitives in `runtime_bench_core`. Handlers are
//! synchronous and talk to the queue through a narrow trait so tests can run
//! them against in-memory fakes.

pub mod adapters;
pub mod handlers;
