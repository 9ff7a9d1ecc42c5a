//! Configuration constants
//!
//! Fixed names and values shared across the crate: file extensions,
//! default compiler options, and state-file locations.

pub mod defaults;
