//! Built-in checks selected through the registry and run together.

use sork_checks::all_checks;
use sork_core::paths::{COMPILE_COMMANDS_JSON_PATH, DOT_SORK_PATH};
use sork_core::{check_file, source, Project};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "// Copyright 2024 Jane Doe\n";

fn touch(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().expect("fixture paths have a parent"))
        .expect("fixture directory should be created");
    fs::write(path, content).expect("fixture file should be written");
}

fn project(root: &Path) -> Project {
    touch(
        root,
        DOT_SORK_PATH,
        r#"{
            "checks": ["include_guard", "license"],
            "checks.include_guard": {"prefix": "DEMO_"},
            "checks.license_header": {
                "license": ["Copyright $year $author"],
                "prefix": "// ",
                "line_prefix": "",
                "suffix": "\n"
            }
        }"#,
    );
    touch(root, &format!("build/{COMPILE_COMMANDS_JSON_PATH}"), "[]");
    touch(
        root,
        "include/demo/api.h",
        &format!("{HEADER}#ifndef DEMO_DEMO_API_H\n#define DEMO_DEMO_API_H\n#endif // DEMO_DEMO_API_H\n"),
    );
    touch(root, "src/util.h", &format!("{HEADER}#ifndef UTIL_H\n#define UTIL_H\n#endif // UTIL_H\n"));
    touch(root, "src/main.cpp", "int main() { return 0; }\n");

    Project::new_in(root, ".", "build").expect("project should load")
}

#[test]
fn configured_checks_run_in_registry_order() {
    let tmp = TempDir::new().expect("tempdir");
    let project = project(tmp.path());
    let tokens = project.config.strings("checks").expect("checks is a list");

    let checks = all_checks().create(&project, &tokens).expect("checks should be created");
    let names: Vec<_> = checks.iter().map(|check| check.name()).collect();
    assert_eq!(names, vec!["include_guard", "license_header"]);

    let files = source::find_source_files(&project, None).expect("sources should be found");
    let outputs: Vec<(String, String)> = files
        .iter()
        .map(|file| {
            let output = check_file(&checks, file).expect("checks should run");
            (file.to_string(), output)
        })
        .collect();

    assert_eq!(
        outputs,
        vec![
            ("include/demo/api.h".to_string(), String::new()),
            ("src/main.cpp".to_string(), "src/main.cpp: error: invalid license header".to_string()),
            (
                "src/util.h".to_string(),
                "src/util.h:2:9: error: include guard name should be DEMO_UTIL_H\n\
                 src/util.h:3:9: error: include guard name should be DEMO_UTIL_H\n\
                 src/util.h:4:11: error: include guard name should be DEMO_UTIL_H"
                    .to_string()
            ),
        ]
    );
}
