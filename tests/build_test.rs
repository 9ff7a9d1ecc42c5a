//! Integration tests for `esmake build` command
//!
//! Covers:
//! - Fails without esmake.toml, advising `esmake init`
//! - Advises when the project has no .bc file
//! - Compiles configurations and turns diagnostics into problems
//! - A second build with no changes compiles nothing
//! - Editing a source rebuilds only its configurations
//! - --json streams problems as JSON lines on stdout
//! - Compiler resolution from global settings
//! - Missing compiler and timeouts are reported without aborting the pass

mod common;

use common::TestProject;

/// Test: Fails without a manifest
#[test]
fn test_build_without_manifest_fails() {
    let project = TestProject::new();

    let output = project.esmake(&["build"]);

    assert!(
        !output.status.success(),
        "build should fail outside a project"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("esmake init"),
        "Error should point at esmake init: {stderr}"
    );
}

/// Test: A project without .bc files gets the advisory, not an error
#[test]
fn test_build_without_configuration_files_advises() {
    let project = TestProject::new();
    project.create_file("esmake.toml", common::SAMPLE_MANIFEST);
    project.create_file("src/lonely.es", "var x = 1\n");

    let output = project.esmake(&["build"]);

    assert!(
        output.status.success(),
        "an empty pass is not an error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("No build configuration file (.bc) found in this project."),
        "Missing advisory: {stdout}"
    );
    assert!(
        stdout.contains("Create one with 'esmake init' before building."),
        "Missing advisory hint: {stdout}"
    );
}

/// Test: A missing compiler is echoed and the pass still finishes
#[test]
fn test_build_with_missing_compiler_reports_it() {
    let project = TestProject::new();
    project.create_file("esmake.toml", common::SAMPLE_MANIFEST);
    project.create_file("build.bc", common::TWO_MEMBER_CONFIG);
    project.create_file("src/a.es", "var a = 1\n");
    project.create_file("src/b.es", "var b = 2\n");

    let missing = project.path().join("no-such-compiler");
    let output = project.esmake(&["build", "--compiler", missing.to_str().unwrap()]);

    assert!(
        output.status.success(),
        "a failed launch is logged, not fatal: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Compiler not found"),
        "Console should echo the missing compiler: {stdout}"
    );
}

#[cfg(unix)]
mod unix {
    use super::common::{self, write_fake_compiler, TestProject};

    /// Project with one two-member configuration and a fake compiler
    fn compiling_project(compiler_body: &str) -> (TestProject, std::path::PathBuf) {
        let project = TestProject::new();
        project.create_file("esmake.toml", common::SAMPLE_MANIFEST);
        project.create_file("build.bc", common::TWO_MEMBER_CONFIG);
        project.create_file("src/a.es", "var a = 1\n");
        project.create_file("src/b.es", "var b = 2\n");
        let compiler = write_fake_compiler(&project, "fake-ec", compiler_body);
        (project, compiler)
    }

    fn build(project: &TestProject, compiler: &std::path::Path) -> std::process::Output {
        project.esmake(&["build", "--compiler", compiler.to_str().unwrap()])
    }

    /// Test: Diagnostics become problems on the right files
    #[test]
    fn test_build_reports_diagnostics_as_problems() {
        let (project, compiler) = compiling_project(
            r#"echo 'ec: a.es: 3: 1001: error: unexpected token'
echo 'ec: b.es: 7: 2002: warning: unused variable' >&2"#,
        );

        let output = build(&project, &compiler);

        assert!(
            !output.status.success(),
            "an error diagnostic should fail the build"
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        // Raw compiler output is echoed to the console.
        assert!(
            stdout.contains("ec: a.es: 3: 1001: error: unexpected token"),
            "stdout should echo compiler output: {stdout}"
        );
        // Problems land on project-relative resources.
        assert!(
            stderr.contains("src/a.es:3: error: unexpected token"),
            "stderr should carry the error problem: {stderr}"
        );
        assert!(
            stderr.contains("src/b.es:7: warning: unused variable"),
            "stderr should carry the warning problem: {stderr}"
        );
        assert!(
            stderr.contains("Build finished with 1 error(s)"),
            "exit should name the error count: {stderr}"
        );
    }

    /// Test: A clean pass prints the summary
    #[test]
    fn test_build_success_prints_summary() {
        let (project, compiler) = compiling_project("exit 0");

        let output = build(&project, &compiler);

        assert!(
            output.status.success(),
            "build should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("Building configuration 'main' (2 file(s))"),
            "console should announce the configuration: {stdout}"
        );
        assert!(
            stdout.contains("Build complete"),
            "summary should be printed: {stdout}"
        );
    }

    /// Test: A second build with no changes compiles nothing
    #[test]
    fn test_build_twice_without_changes_is_a_noop() {
        let (project, compiler) = compiling_project("exit 0");

        let first = build(&project, &compiler);
        assert!(first.status.success());

        let second = build(&project, &compiler);
        assert!(second.status.success());

        let stdout = String::from_utf8_lossy(&second.stdout);
        assert!(
            !stdout.contains("Building configuration"),
            "nothing changed, nothing should compile: {stdout}"
        );
        assert!(
            stdout.contains("Nothing to build"),
            "the no-op should be stated: {stdout}"
        );
    }

    /// Test: Editing a source file rebuilds its configuration
    #[test]
    fn test_source_edit_triggers_rebuild() {
        let (project, compiler) = compiling_project("exit 0");

        let first = build(&project, &compiler);
        assert!(first.status.success());

        project.create_file("src/a.es", "var a = 42\n");

        let second = build(&project, &compiler);
        assert!(second.status.success());
        let stdout = String::from_utf8_lossy(&second.stdout);
        assert!(
            stdout.contains("Building configuration 'main'"),
            "the owning configuration should rebuild: {stdout}"
        );
    }

    /// Test: Removing a source file rebuilds without it
    #[test]
    fn test_source_removal_rebuilds_remaining_members() {
        let (project, compiler) = compiling_project("exit 0");

        let first = build(&project, &compiler);
        assert!(first.status.success());

        project.remove_file("src/b.es");

        let second = build(&project, &compiler);
        assert!(second.status.success());
        let stdout = String::from_utf8_lossy(&second.stdout);
        assert!(
            stdout.contains("Building configuration 'main' (1 file(s))"),
            "only the surviving member should compile: {stdout}"
        );
    }

    /// Test: --full rebuilds even when nothing changed
    #[test]
    fn test_full_flag_forces_a_rebuild() {
        let (project, compiler) = compiling_project("exit 0");

        let first = build(&project, &compiler);
        assert!(first.status.success());

        let output = project.esmake(&["build", "--full", "--compiler", compiler.to_str().unwrap()]);
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("Building configuration 'main'"),
            "--full should recompile: {stdout}"
        );
    }

    /// Test: --json keeps stdout machine-readable
    #[test]
    fn test_json_streams_problems_on_stdout() {
        let (project, compiler) =
            compiling_project(r"echo 'ec: a.es: 3: 1001: error: unexpected token'");

        let mut cmd = project.command();
        cmd.args(["--json", "build", "--compiler", compiler.to_str().unwrap()]);
        let output = cmd.output().expect("Failed to execute esmake");

        assert!(!output.status.success(), "the error still fails the build");

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut saw_problem = false;
        for line in stdout.lines() {
            let value: serde_json::Value =
                serde_json::from_str(line).unwrap_or_else(|e| panic!("non-JSON stdout line {line:?}: {e}"));
            if value["severity"] == "error" {
                assert_eq!(value["resource"], "src/a.es");
                assert_eq!(value["line"], 3);
                saw_problem = true;
            }
        }
        assert!(saw_problem, "the error should be streamed as JSON: {stdout}");
    }

    /// Test: The compiler path can come from global settings
    #[test]
    fn test_compiler_resolved_from_global_settings() {
        let (project, compiler) = compiling_project("exit 0");
        project.create_file(
            ".esmake-test-config/config.toml",
            &format!("[compiler]\npath = \"{}\"\n", compiler.display()),
        );

        let output = project.esmake(&["build"]);

        assert!(
            output.status.success(),
            "global settings should supply the compiler: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("Building configuration 'main'"),
            "the configured compiler should run: {stdout}"
        );
    }

    /// Test: A hung compiler is killed after --timeout seconds
    #[test]
    fn test_timeout_kills_a_hung_compiler() {
        // exec makes the sleeper the direct child, so the kill reaches it.
        let (project, compiler) = compiling_project("exec sleep 30");

        let started = std::time::Instant::now();
        let output = project.esmake(&[
            "build",
            "--timeout",
            "1",
            "--compiler",
            compiler.to_str().unwrap(),
        ]);
        let elapsed = started.elapsed();

        assert!(
            elapsed < std::time::Duration::from_secs(10),
            "the build should not wait for the full sleep: {elapsed:?}"
        );
        assert!(
            output.status.success(),
            "a timed-out launch is logged, not fatal: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(
            stdout.contains("timed out"),
            "the timeout should be echoed: {stdout}"
        );
    }

    /// Test: The include-all sentinel picks up files created later
    #[test]
    fn test_include_all_configuration_tracks_new_sources() {
        let project = TestProject::new();
        project.create_file("esmake.toml", common::SAMPLE_MANIFEST);
        project.create_file("build.bc", common::ALL_CONFIG);
        project.create_file("src/a.es", "var a = 1\n");
        let compiler = write_fake_compiler(&project, "fake-ec", "exit 0");

        let first = build(&project, &compiler);
        assert!(first.status.success());
        assert!(
            String::from_utf8_lossy(&first.stdout)
                .contains("Building configuration 'everything' (1 file(s))"),
            "the sentinel expands to the single source"
        );

        project.create_file("src/new.es", "var n = 9\n");

        let second = build(&project, &compiler);
        assert!(second.status.success());
        assert!(
            String::from_utf8_lossy(&second.stdout)
                .contains("Building configuration 'everything' (2 file(s))"),
            "a new source joins the sentinel configuration: {}",
            String::from_utf8_lossy(&second.stdout)
        );
    }
}
