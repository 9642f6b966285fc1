//! # Showlist Common Library
//!
//! Shared code for the showlist crates:
//! - Error type and result alias
//! - TOML configuration and root folder resolution
//! - SQLite database initialization (events, run log, run lock)
//! - Date/time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
