//! Configuration management module
//!
//! This module handles configuration loading, validation, and persistence
//! from environment variables, configuration files and default values, and
//! turns the storage connection string into a resolved account.

pub mod connection;
pub mod settings;

pub use connection::*;
pub use settings::*;
