//! keyscore-core: answer-key extraction, scoring, and population ranking.
//!
//! This crate defines the data model, the extraction heuristics, the score
//! calculator, and the population store abstraction that the rest of the
//! keyscore workspace builds on.

pub mod engine;
pub mod error;
pub mod extract;
pub mod model;
pub mod response;
pub mod scoring;
pub mod statistics;
pub mod store;
pub mod traits;
