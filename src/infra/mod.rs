//! Infrastructure layer
//!
//! Host-facing I/O: project tree walks, the compiler subprocess, state
//! persistence, and the console/problem output seams.

pub mod compiler;
pub mod console;
pub mod dirs;
pub mod problems;
pub mod scan;
pub mod state;
