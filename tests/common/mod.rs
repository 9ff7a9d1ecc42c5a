//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// Creates a temporary directory for test projects and provides
/// utilities for setting up test scenarios.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Create a project that has already run `esmake init`
    #[allow(dead_code)]
    pub fn initialized(name: &str) -> Self {
        let project = Self::new();
        let output = project.esmake(&["init", "--name", name]);
        assert!(
            output.status.success(),
            "esmake init should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        project
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Command for the esmake binary rooted at this project
    ///
    /// Global settings are redirected under the temp directory and the
    /// ambient log filter is cleared, so neither the developer's real
    /// configuration nor their `RUST_LOG` leaks into a test.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_esmake"));
        cmd.current_dir(self.dir.path());
        cmd.env(
            "ESMAKE_CONFIG_DIR",
            self.dir.path().join(".esmake-test-config"),
        );
        cmd.env_remove("RUST_LOG");
        cmd
    }

    /// Run esmake with the given arguments and collect its output
    pub fn esmake(&self, args: &[&str]) -> Output {
        let mut cmd = self.command();
        cmd.args(args);
        cmd.output().expect("Failed to execute esmake")
    }

    /// Create a file in the test project
    #[allow(dead_code)]
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Create a directory in the test project
    #[allow(dead_code)]
    pub fn create_dir(&self, name: &str) {
        let path = self.dir.path().join(name);
        std::fs::create_dir_all(path).expect("Failed to create directory");
    }

    /// Remove a file from the test project
    #[allow(dead_code)]
    pub fn remove_file(&self, name: &str) {
        std::fs::remove_file(self.dir.path().join(name)).expect("Failed to remove file");
    }

    /// Check if a file exists in the test project
    #[allow(dead_code)]
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    #[allow(dead_code)]
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample manifest TOML for testing
#[allow(dead_code)]
pub const SAMPLE_MANIFEST: &str = r#"
[project]
name = "player"
"#;

/// Configuration file with two explicit members
#[allow(dead_code)]
pub const TWO_MEMBER_CONFIG: &str = r#"<buildConfigurations>
    <buildConfiguration name="main">
        <resource>src/a.es</resource>
        <resource>src/b.es</resource>
        <compilerOptions>--debug</compilerOptions>
    </buildConfiguration>
</buildConfigurations>
"#;

/// Configuration file whose single block includes every source file
#[allow(dead_code)]
pub const ALL_CONFIG: &str = r#"<buildConfigurations>
    <buildConfiguration name="everything">
        <resource>ALL</resource>
        <compilerOptions>--warn 1</compilerOptions>
    </buildConfiguration>
</buildConfigurations>
"#;

/// Write an executable shell script standing in for the compiler
///
/// The script body runs with `$@` holding the options and file paths the
/// build passed; diagnostics it prints follow the six-field grammar.
#[cfg(unix)]
#[allow(dead_code)]
pub fn write_fake_compiler(project: &TestProject, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = project.path().join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("Failed to write fake compiler");

    let mut perms = std::fs::metadata(&path)
        .expect("Failed to stat fake compiler")
        .permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("Failed to mark fake compiler executable");
    path
}
