//! Integration test: project resolution, source discovery and check
//! dispatch end-to-end, with stub checks standing in for external tools.

use sork_core::check::CheckError;
use sork_core::paths::{COMPILE_COMMANDS_JSON_PATH, DOT_SORK_PATH};
use sork_core::{check_file, concurrent, paths, source};
use sork_core::{Check, CheckBox, CheckRegistry, Progress, Project, SourceFile};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

fn touch(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture paths have a parent"))
        .expect("fixture directory should be created");
    fs::write(path, content).expect("fixture file should be written");
}

static RUNS: AtomicUsize = AtomicUsize::new(0);

struct Quiet;

impl Check for Quiet {
    fn name(&self) -> &'static str {
        "quiet"
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        RUNS.fetch_add(1, Ordering::SeqCst);
        file.content()?;
        Ok(None)
    }
}

struct Todo;

impl Check for Todo {
    fn name(&self) -> &'static str {
        "todo"
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        let found = file.content()?.contains("TODO");
        Ok(found.then(|| format!("{}: error: TODO left in file", file.path.display())))
    }
}

fn quiet(_: &Project) -> Result<CheckBox, CheckError> {
    Ok(Box::new(Quiet))
}

fn todo(_: &Project) -> Result<CheckBox, CheckError> {
    Ok(Box::new(Todo))
}

fn registry() -> CheckRegistry {
    CheckRegistry::new().with("quiet", quiet).with("todo", todo)
}

fn run_checks(project: &Project, tokens: &[String]) -> sork_core::Result<String> {
    let checks = registry().create(project, tokens)?;
    let files = source::find_source_files(project, None)?;
    let progress = Progress::new(Vec::new(), false);

    concurrent::for_each_with_progress(&progress, "Checking source", &files, Some(2), |file| {
        let output = check_file(&checks, file)?;
        Ok::<_, sork_core::Error>(Some(output))
    })?;

    Ok(String::from_utf8_lossy(&progress.into_inner()).into_owned())
}

#[test]
fn satisfied_checks_produce_no_diagnostics() {
    let tmp = TempDir::new().expect("tempdir");
    touch(tmp.path(), DOT_SORK_PATH, r#"{"source_paths": ["src"]}"#);
    touch(tmp.path(), &format!("build/{COMPILE_COMMANDS_JSON_PATH}"), "[]");
    touch(tmp.path(), "src/foo.cpp", "void foo()\n{\n}\n");

    let project = Project::new_in(tmp.path(), ".", "build").expect("project should load");
    let tokens = project.config.strings("checks").expect("checks is a list");
    assert!(tokens.is_empty());

    let before = RUNS.load(Ordering::SeqCst);
    let output = run_checks(&project, &tokens).expect("checks should run");

    assert_eq!(RUNS.load(Ordering::SeqCst) - before, 1);
    assert!(!output.contains("error"), "unexpected diagnostics: {output}");
    assert!(output.ends_with("[1/1] Checking source. Done.\n"));
}

#[test]
fn findings_are_reported_per_file() {
    let tmp = TempDir::new().expect("tempdir");
    touch(tmp.path(), &format!("build/{COMPILE_COMMANDS_JSON_PATH}"), "[]");
    touch(tmp.path(), "a.cpp", "// TODO\n");
    touch(tmp.path(), "b.cpp", "\n");
    touch(tmp.path(), "dir/c.h", "// TODO\n");

    let project = Project::new_in(tmp.path(), ".", "build").expect("project should load");
    let output = run_checks(&project, &["todo".to_string()]).expect("checks should run");

    assert!(output.contains("a.cpp: error: TODO left in file\n"));
    assert!(output.contains("dir/c.h: error: TODO left in file\n"));
    assert!(!output.contains("b.cpp: error"));
    assert!(output.ends_with("[3/3] Checking source. Done.\n"));
}

#[test]
fn unreadable_file_aborts_the_run() {
    let tmp = TempDir::new().expect("tempdir");
    touch(tmp.path(), &format!("build/{COMPILE_COMMANDS_JSON_PATH}"), "[]");
    touch(tmp.path(), "a.cpp", "");
    // Not valid UTF-8, so reading it as text fails.
    fs::write(tmp.path().join("b.cpp"), [0xff, 0xfe, 0xfd]).expect("fixture file should be written");

    let project = Project::new_in(tmp.path(), ".", "build").expect("project should load");
    let err = run_checks(&project, &["todo".to_string()]).expect_err("run should fail");

    assert!(err.to_string().contains("b.cpp"));
}

#[test]
fn generated_build_files_are_not_sources() {
    let tmp = TempDir::new().expect("tempdir");
    touch(tmp.path(), &format!("build/{COMPILE_COMMANDS_JSON_PATH}"), "[]");
    for file in ["a.cpp", "a.h", "dir/b.cpp", "build/generated.cpp"] {
        touch(tmp.path(), file, "");
    }

    let project = Project::new_in(tmp.path(), ".", "build").expect("project should load");
    let found: Vec<PathBuf> = source::find_source_files(&project, None)
        .expect("sources should be found")
        .into_iter()
        .map(|f| f.path)
        .collect();

    assert_eq!(
        found,
        vec![PathBuf::from("a.cpp"), PathBuf::from("a.h"), PathBuf::from("dir/b.cpp")]
    );
}

#[test]
fn build_path_is_found_for_project_path() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path();
    touch(root, "proj/.sork", "{}");
    touch(root, "proj/src/a.cpp", "");
    touch(root, &format!("build/proj/{COMPILE_COMMANDS_JSON_PATH}"), "[]");

    let project_path =
        paths::find_project_path_in(root, Path::new("proj/src/a.cpp")).expect("project root");
    let build_path = paths::find_build_path_in(root, &project_path).expect("build path");

    assert_eq!(project_path, PathBuf::from("proj"));
    assert_eq!(build_path, PathBuf::from("build/proj"));

    let project = Project::new_in(root, project_path, build_path).expect("project should load");
    let files = source::find_source_files(&project, None).expect("sources should be found");

    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, PathBuf::from("src/a.cpp"));
}
