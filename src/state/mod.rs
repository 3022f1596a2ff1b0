//! State module for tracking scrape progress
//!
//! A scrape moves through a fixed sequence of stages. The orchestrator
//! advances a [`ScrapeStage`] as each step succeeds so that a failure can be
//! reported against the step that produced it.

mod stage;

pub use stage::ScrapeStage;
