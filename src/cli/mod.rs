//! CLI module for azstore
//!
//! This module contains all command-line interface related functionality,
//! including command definitions, argument parsing, and command execution.

pub mod commands;

pub use commands::*;
