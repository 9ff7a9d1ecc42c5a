//! End-to-end walk through the esmake workflow
//!
//! init → check → build → edit → rebuild → exclude → clean, asserting
//! the observable console output at every step.

mod common;

use common::TestProject;

/// Test: A freshly initialized project passes check
#[test]
fn test_init_then_check_passes() {
    let project = TestProject::new();

    let init = project.esmake(&["init", "--name", "demo"]);
    assert!(
        init.status.success(),
        "init failed: {}",
        String::from_utf8_lossy(&init.stderr)
    );

    let check = project.esmake(&["check"]);
    assert!(
        check.status.success(),
        "check failed: {}",
        String::from_utf8_lossy(&check.stderr)
    );
    let stdout = String::from_utf8_lossy(&check.stdout);
    assert!(
        stdout.contains("demo: all source files"),
        "the starter configuration should include everything: {stdout}"
    );
    assert!(stdout.contains("Check passed"), "got: {stdout}");
}

#[cfg(unix)]
mod unix {
    use super::common::{write_fake_compiler, TestProject};

    fn stdout_of(output: &std::process::Output) -> String {
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    /// Test: The whole edit, exclude, and clean cycle behaves incrementally
    #[test]
    fn test_edit_exclude_clean_cycle() {
        let project = TestProject::new();

        let init = project.esmake(&["init", "--name", "player"]);
        assert!(
            init.status.success(),
            "init failed: {}",
            String::from_utf8_lossy(&init.stderr)
        );

        project.create_file("src/a.es", "var a = 1\n");
        project.create_file("src/b.es", "var b = 2\n");
        let compiler = write_fake_compiler(&project, "fake-ec", "exit 0");
        let compiler = compiler.to_str().unwrap();
        let build = |extra: &[&str]| {
            let mut args = vec!["build", "--compiler", compiler];
            args.extend_from_slice(extra);
            project.esmake(&args)
        };

        // First build compiles the starter configuration over both files.
        let first = build(&[]);
        assert!(
            first.status.success(),
            "first build failed: {}",
            String::from_utf8_lossy(&first.stderr)
        );
        let stdout = stdout_of(&first);
        assert!(
            stdout.contains("Building configuration 'player' (2 file(s))"),
            "got: {stdout}"
        );
        assert!(stdout.contains("Build complete"), "got: {stdout}");

        // Nothing changed, nothing builds.
        let second = build(&[]);
        let stdout = stdout_of(&second);
        assert!(stdout.contains("Nothing to build"), "got: {stdout}");

        // An edit dirties the configuration again.
        project.create_file("src/a.es", "var a = 2\n");
        let third = build(&[]);
        let stdout = stdout_of(&third);
        assert!(
            stdout.contains("Building configuration 'player'"),
            "an edited source should trigger a rebuild: {stdout}"
        );

        // Excluding a member shrinks the compiled set.
        let exclude = project.esmake(&["exclude", "src/b.es"]);
        assert!(exclude.status.success());
        let fourth = build(&["--full"]);
        let stdout = stdout_of(&fourth);
        assert!(
            stdout.contains("Building configuration 'player' (1 file(s))"),
            "got: {stdout}"
        );

        // Clean discards build records but keeps the exclusion mark.
        let clean = project.esmake(&["clean"]);
        assert!(clean.status.success());
        let fifth = build(&[]);
        let stdout = stdout_of(&fifth);
        assert!(
            stdout.contains("Building configuration 'player' (1 file(s))"),
            "the exclusion should survive the clean: {stdout}"
        );

        // Including the member restores it on the next full pass.
        let include = project.esmake(&["include", "src/b.es"]);
        assert!(include.status.success());
        let sixth = build(&["--full"]);
        let stdout = stdout_of(&sixth);
        assert!(
            stdout.contains("Building configuration 'player' (2 file(s))"),
            "got: {stdout}"
        );
    }
}
