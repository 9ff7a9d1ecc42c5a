//! Integration tests for `esmake init` command
//!
//! Covers:
//! - Creates esmake.toml and a starter build.bc in an empty directory
//! - The starter configuration includes every source file
//! - Fails when esmake.toml already exists without --force
//! - Overwrites with --force
//! - Keeps a handwritten build.bc
//! - --name overrides the directory-derived project name

mod common;

use assert_fs::prelude::*;
use common::TestProject;
use predicates::prelude::*;

/// Helper to run esmake init in an assert_fs temp dir
fn run_init(dir: &assert_fs::TempDir, args: &[&str]) -> std::process::Output {
    let mut cmd = std::process::Command::new(env!("CARGO_BIN_EXE_esmake"));
    cmd.current_dir(dir.path());
    cmd.env("ESMAKE_CONFIG_DIR", dir.path().join(".esmake-test-config"));
    cmd.arg("init");
    for arg in args {
        cmd.arg(arg);
    }
    cmd.output().expect("Failed to execute esmake init")
}

/// Test: Creates esmake.toml and build.bc in an empty directory
#[test]
fn test_init_creates_manifest_and_starter_configuration() {
    let dir = assert_fs::TempDir::new().expect("temp dir");

    let output = run_init(&dir, &["--name", "player"]);

    assert!(
        output.status.success(),
        "esmake init should succeed in an empty directory: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    dir.child("esmake.toml")
        .assert(predicate::path::is_file())
        .assert(predicate::str::contains("name = \"player\""));

    dir.child("build.bc")
        .assert(predicate::path::is_file())
        .assert(predicate::str::contains("buildConfiguration"))
        .assert(predicate::str::contains("ALL"));
}

/// Test: The starter configuration carries the default compiler options
#[test]
fn test_init_starter_configuration_has_default_options() {
    let dir = assert_fs::TempDir::new().expect("temp dir");

    let output = run_init(&dir, &["--name", "player"]);
    assert!(output.status.success());

    dir.child("build.bc")
        .assert(predicate::str::contains("compilerOptions"))
        .assert(predicate::str::contains("--optimize 5"));
}

/// Test: Fails when esmake.toml already exists without --force
#[test]
fn test_init_fails_when_manifest_exists_without_force() {
    let dir = assert_fs::TempDir::new().expect("temp dir");
    dir.child("esmake.toml")
        .write_str("[project]\nname = \"existing\"\n")
        .expect("seed manifest");

    let output = run_init(&dir, &[]);

    assert!(
        !output.status.success(),
        "esmake init should refuse to overwrite an existing manifest"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("--force"),
        "Error should mention --force: {stderr}"
    );

    dir.child("esmake.toml")
        .assert(predicate::str::contains("existing"));
}

/// Test: Succeeds with --force over an existing manifest
#[test]
fn test_init_force_overwrites_existing_manifest() {
    let dir = assert_fs::TempDir::new().expect("temp dir");
    dir.child("esmake.toml")
        .write_str("not even toml [[[")
        .expect("seed manifest");

    let output = run_init(&dir, &["--name", "fresh", "--force"]);

    assert!(
        output.status.success(),
        "esmake init --force should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    dir.child("esmake.toml")
        .assert(predicate::str::contains("name = \"fresh\""));
}

/// Test: A handwritten build.bc survives a plain re-init of the manifest
#[test]
fn test_init_keeps_handwritten_starter_configuration() {
    let dir = assert_fs::TempDir::new().expect("temp dir");
    dir.child("build.bc")
        .write_str(common::TWO_MEMBER_CONFIG)
        .expect("seed configuration");

    let output = run_init(&dir, &["--name", "player"]);

    assert!(
        output.status.success(),
        "esmake init should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    dir.child("build.bc")
        .assert(predicate::str::contains("src/a.es"))
        .assert(predicate::str::contains("ALL").not());
}

/// Test: The project name defaults to the directory name
#[test]
fn test_init_derives_name_from_directory() {
    let project = TestProject::new();
    project.create_dir("myapp");

    let mut cmd = project.command();
    cmd.current_dir(project.path().join("myapp"));
    cmd.arg("init");
    let output = cmd.output().expect("Failed to execute esmake init");

    assert!(
        output.status.success(),
        "esmake init should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let manifest = project.read_file("myapp/esmake.toml");
    assert!(
        manifest.contains("name = \"myapp\""),
        "Manifest should carry the directory name: {manifest}"
    );
}

/// Test: Init output names what was created
#[test]
fn test_init_reports_created_files() {
    let project = TestProject::new();

    let output = project.esmake(&["init", "--name", "demo"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("esmake.toml") && stdout.contains("build.bc"),
        "Init should report both created files: {stdout}"
    );
}

/// Test: --quiet suppresses the init report
#[test]
fn test_init_quiet_suppresses_report() {
    let project = TestProject::new();

    let output = project.esmake(&["--quiet", "init", "--name", "demo"]);

    assert!(output.status.success());
    assert!(
        output.stdout.is_empty(),
        "Quiet init should print nothing: {}",
        String::from_utf8_lossy(&output.stdout)
    );
}
