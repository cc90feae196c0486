//! # Test Monkey Common Library
//!
//! Shared code for the Test Monkey backend:
//! - Error taxonomy used across all operations
//! - Configuration loading
//! - Timestamp utilities

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
