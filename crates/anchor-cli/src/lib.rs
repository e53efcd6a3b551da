//! Anchor CLI library components.
//!
//! This library exposes the command handlers and configuration loader for testing.

pub mod commands;
pub mod config;
