//! # Raid Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Battlefield and stat-table fixtures
//! - Headless raid runner for full-battle scenario tests
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod scenarios;

/// Re-export proptest for convenience.
pub use proptest;
