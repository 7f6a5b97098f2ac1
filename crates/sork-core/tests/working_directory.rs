//! Resolution relative to the process working directory.
//!
//! Kept to a single test since it changes the working directory of the
//! whole test binary.

use sork_core::paths::{COMPILE_COMMANDS_JSON_PATH, DOT_SORK_PATH};
use sork_core::{paths, source, Project};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn relative_and_absolute_invocations_agree() {
    let tmp = TempDir::new().expect("tempdir");
    let root = paths::lexical_normalize(tmp.path());
    fs::create_dir_all(root.join("foo/src")).expect("fixture dirs");
    fs::create_dir_all(root.join("foo/build")).expect("fixture dirs");
    fs::write(root.join("foo").join(DOT_SORK_PATH), "{}").expect("config");
    fs::write(root.join("foo/src/a.cpp"), "").expect("source");
    fs::write(
        root.join("foo/build").join(COMPILE_COMMANDS_JSON_PATH),
        "[]",
    )
    .expect("database");

    std::env::set_current_dir(root.join("foo/src")).expect("cd into project");

    assert_eq!(paths::find_project_path(Path::new(".")).expect("project"), PathBuf::from(".."));
    assert_eq!(
        paths::find_build_path(Path::new("..")).expect("build"),
        PathBuf::from("../build")
    );
    assert_eq!(
        paths::find_build_path(&root.join("foo")).expect("build"),
        root.join("foo/build")
    );
    assert_eq!(
        paths::normalize_path(Path::new(".."), Path::new("a.cpp")).expect("normalize"),
        PathBuf::from("src/a.cpp")
    );

    let relative = Project::locate(Path::new("a.cpp"), None).expect("relative project");
    let absolute = Project::locate(&root.join("foo/src/a.cpp"), None).expect("absolute project");

    for project in [&relative, &absolute] {
        let files = source::find_source_files(project, Some(&[PathBuf::from("a.cpp")]))
            .expect("sources");
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, PathBuf::from("src/a.cpp"));
    }
}
