//! Supabase Admin Gateway Common Types
//!
//! Shared configuration, error handling and request types for the gateway crates.

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod types;

pub use config::McpConfig;
pub use error::{Error, Result};
