//! Shared types and configuration for Tally.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding helpers with fixed decimal precision
//! - Typed IDs for type-safe entity references
//! - Engine configuration management

pub mod config;
pub mod types;

pub use config::{DuplicatePolicy, EngineConfig};
