//! Core build logic
//!
//! This module contains the domain model and orchestration for esmake.
//! Host-facing I/O (tree walks, subprocesses, state persistence) lives in
//! [`crate::infra`]; the documents the domain itself owns (`.bc` files,
//! manifests) are parsed and written here.
//!
//! # Submodules
//!
//! - [`resource`] - Project-relative resource identities and change events
//! - [`options`] - Compiler option string parsing and rendering
//! - [`diagnostic`] - Compiler output parsing and problem records
//! - [`configuration`] - Build configurations and membership tracking
//! - [`config_file`] - The `.bc` configuration document format
//! - [`builder`] - Build orchestration
//! - [`settings`] - Project manifest and global settings
//! - [`cancel`] - Cancellation tokens

pub mod builder;
pub mod cancel;
pub mod config_file;
pub mod configuration;
pub mod diagnostic;
pub mod options;
pub mod resource;
pub mod settings;
