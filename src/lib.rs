//! esmake - incremental build tool for EJScript projects
//!
//! This library provides the core functionality for tracking build
//! configurations (`.bc` files), invoking the external EJScript compiler,
//! and turning its diagnostics into structured problems.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Build configurations, diagnostics, and orchestration
//! - [`infra`] - Infrastructure layer (filesystem, processes, state)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
