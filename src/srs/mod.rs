//! Spaced repetition scheduling for vocabulary entries
//!
//! This module provides:
//! - Review state, rating and study log models
//! - The deterministic review scheduler
//! - Per-deck review statistics

pub mod algorithm;
pub mod models;
pub mod stats;

pub use algorithm::{format_interval, next_state, preview_intervals};
pub use models::*;
pub use stats::review_stats;
