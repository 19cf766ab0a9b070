//! # Configuration Module
//!
//! Tuning parameters for the size search and the input limits enforced
//! before it runs.

pub mod search;

pub use search::SearchConfig;
