#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Session-scoped conversation orchestration.
//!
//! Binds an incoming question to a durable conversation context, invokes
//! the model with that context, and records the resulting turn pair in both
//! the history provider and the audit log.

mod orchestrator;

pub use orchestrator::{Orchestrator, TurnOutcome};
