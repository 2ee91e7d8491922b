//! Domain types and pure logic for the draft generation pipeline.
//!
//! Everything in this crate is free of I/O: task and record models,
//! the task queue builder, per-record completion aggregates, poll
//! classification, output sizing, and run configuration.

pub mod aggregate;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod outcome;
pub mod poll;
pub mod queue;
pub mod run_events;
pub mod task;
pub mod types;
