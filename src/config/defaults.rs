//! Default configuration values

/// File extension of compilable source files
pub const SOURCE_EXTENSION: &str = "es";

/// File extension of build configuration files
pub const CONFIG_EXTENSION: &str = "bc";

/// Compiler executable name looked up on PATH when not configured
pub const DEFAULT_COMPILER: &str = "ec";

/// Compiler options applied to newly created configurations
pub const DEFAULT_COMPILER_OPTIONS: &str = "--optimize 5 --standard --debug --warn 0";

/// Project manifest file name
pub const MANIFEST_FILE: &str = "esmake.toml";

/// Directory holding per-project build state
pub const STATE_DIR: &str = ".esmake";

/// State file name inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Starter configuration file written by `esmake init`
pub const STARTER_CONFIG_FILE: &str = "build.bc";

/// Resource entry that stands for every source file in the project
pub const INCLUDE_ALL_KEYWORD: &str = "ALL";

/// Poll interval while waiting for a compiler subprocess (in milliseconds)
pub const PROCESS_POLL_INTERVAL_MS: u64 = 25;

/// Minimum proptest iterations
pub const MIN_PROPTEST_ITERATIONS: u32 = 100;
