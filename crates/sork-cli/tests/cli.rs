//! Runs the `sork` binary against small on-disk projects.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn touch(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture paths have a parent"))
        .expect("fixture directory should be created");
    fs::write(path, content).expect("fixture file should be written");
}

/// A project in `<tmp>/proj` with its build directory in `<tmp>/proj/build`.
fn project(files: &[(&str, &str)]) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("proj");
    touch(&root, ".sork", "{}");
    touch(&root, "build/compile_commands.json", "[]");
    for (path, content) in files {
        touch(&root, path, content);
    }
    (tmp, root)
}

fn sork(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sork"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("sork should start")
}

#[test]
fn list_checks_prints_registry_order() {
    let tmp = TempDir::new().expect("tempdir");
    let output = sork(tmp.path(), &["list-checks"]);

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "clang-format\nclang-tidy\ninclude_guard\nlicense_header\n"
    );
}

#[test]
fn check_reports_findings_and_succeeds() {
    let (_tmp, root) = project(&[
        ("src/foo.h", "int foo();\n"),
        ("src/bar.h", "#ifndef BAR_H\n#define BAR_H\n#endif // BAR_H\n"),
        ("src/bar.cpp", "int bar() { return 0; }\n"),
    ]);

    let output = sork(&root, &["check", "--checks", "include_guard"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("src/foo.h: error: missing include guard\n"), "{stdout}");
    assert!(!stdout.contains("src/bar.h: error"), "{stdout}");
    assert!(stdout.ends_with("[3/3] Checking source. Done.\n"), "{stdout}");
}

#[test]
fn check_limited_to_paths() {
    let (_tmp, root) = project(&[("src/foo.h", "int foo();\n"), ("lib/baz.h", "int baz();\n")]);

    let output = sork(&root, &["-b", "build", "check", "-c", "include_guard", "lib"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout.contains("lib/baz.h: error: missing include guard"), "{stdout}");
    assert!(!stdout.contains("src/foo.h"), "{stdout}");
}

#[test]
fn unknown_check_fails() {
    let (_tmp, root) = project(&[("src/foo.h", "")]);

    let output = sork(&root, &["check", "--checks", "cpplint"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cpplint"));
}

#[test]
fn missing_path_fails() {
    let (_tmp, root) = project(&[]);

    let output = sork(&root, &["check", "does/not/exist"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("does/not/exist"));
}

#[test]
fn every_missing_path_is_listed_even_when_first() {
    let (_tmp, root) = project(&[("a.cpp", "")]);

    let output = sork(&root, &["check", "-c", "include_guard", "missing1.cpp", "a.cpp", "missing2.cpp"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("no such file or directory"), "{stderr}");
    assert!(stderr.contains("missing1.cpp"), "{stderr}");
    assert!(stderr.contains("missing2.cpp"), "{stderr}");
    assert!(!stderr.contains("--build-path"), "{stderr}");
}
