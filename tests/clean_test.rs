//! Integration tests for the `esmake clean` command
//!
//! Clean discards everything the builds recorded, so the next build
//! starts from scratch. Exclusion marks are user intent and survive.

mod common;

use common::{TestProject, SAMPLE_MANIFEST};

/// Test: Clean outside a project reports the missing manifest
#[test]
fn test_clean_without_manifest_fails() {
    let project = TestProject::new();

    let output = project.esmake(&["clean"]);

    assert!(!output.status.success(), "clean should fail without a manifest");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("esmake init"),
        "the error should point at init: {stderr}"
    );
}

/// Test: Clean reports what it reset
#[test]
fn test_clean_reports_what_it_reset() {
    let project = TestProject::new();
    project.create_file("esmake.toml", SAMPLE_MANIFEST);

    let output = project.esmake(&["clean"]);

    assert!(
        output.status.success(),
        "clean failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Cleaned build records"), "got: {stdout}");
    assert!(
        stdout.contains("next build"),
        "the follow-up hint should be printed: {stdout}"
    );
}

/// Test: Exclusion marks survive a clean
#[test]
fn test_clean_keeps_exclusion_marks() {
    let project = TestProject::new();
    project.create_file("esmake.toml", SAMPLE_MANIFEST);
    project.create_file("src/gen/lexer.es", "var generated = true\n");

    let exclude = project.esmake(&["exclude", "src/gen"]);
    assert!(
        exclude.status.success(),
        "exclude failed: {}",
        String::from_utf8_lossy(&exclude.stderr)
    );

    let before = project.read_file(".esmake/state.toml");
    assert!(
        before.contains("excluded"),
        "the mark should be persisted: {before}"
    );

    let clean = project.esmake(&["clean"]);
    assert!(clean.status.success());

    let after = project.read_file(".esmake/state.toml");
    assert!(
        after.contains("src/gen") && after.contains("excluded"),
        "clean must not discard exclusion marks: {after}"
    );
}

#[cfg(unix)]
mod unix {
    use super::common::{write_fake_compiler, TestProject, SAMPLE_MANIFEST, TWO_MEMBER_CONFIG};

    /// Test: Clean makes the next build recompile everything
    #[test]
    fn test_clean_forces_a_full_recompile() {
        let project = TestProject::new();
        project.create_file("esmake.toml", SAMPLE_MANIFEST);
        project.create_file("build.bc", TWO_MEMBER_CONFIG);
        project.create_file("src/a.es", "var a = 1\n");
        project.create_file("src/b.es", "var b = 2\n");
        let compiler = write_fake_compiler(&project, "fake-ec", "exit 0");
        let compiler = compiler.to_str().unwrap();

        let first = project.esmake(&["build", "--compiler", compiler]);
        assert!(
            first.status.success(),
            "first build failed: {}",
            String::from_utf8_lossy(&first.stderr)
        );
        assert!(String::from_utf8_lossy(&first.stdout).contains("Building configuration 'main'"));

        let second = project.esmake(&["build", "--compiler", compiler]);
        let stdout = String::from_utf8_lossy(&second.stdout);
        assert!(
            stdout.contains("Nothing to build"),
            "an unchanged project should be a no-op: {stdout}"
        );

        let clean = project.esmake(&["clean"]);
        assert!(
            clean.status.success(),
            "clean failed: {}",
            String::from_utf8_lossy(&clean.stderr)
        );

        let third = project.esmake(&["build", "--compiler", compiler]);
        let stdout = String::from_utf8_lossy(&third.stdout);
        assert!(
            stdout.contains("Building configuration 'main'"),
            "clean should force a recompile: {stdout}"
        );
    }
}
