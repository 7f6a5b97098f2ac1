//! License header check.
//!
//! The expected header is built from a template: either lines given in the
//! configuration, the header of a known license, or the header of the
//! license detected from `COPYING*`/`LICENSE*` files in the project root.
//! In the template `$project` stands for the configured project name,
//! `$year` for a year or a range of years and `$author` for any text.

use glob::{MatchOptions, Pattern};
use regex::Regex;
use sork_core::check::{Check, CheckBox, CheckError};
use sork_core::config::Section;
use sork_core::project::LICENSE_HEADER_SECTION;
use sork_core::{Project, SourceFile};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the check.
pub const NAME: &str = "license_header";

const YEAR_PATTERN: &str = "[0-9]{4}(-[0-9]{4})?";
const AUTHOR_PATTERN: &str = ".+";

const LICENSE_FILE_NAMES: &[&str] = &["COPYING", "LICENSE"];

/// A license known by key, recognized by the start of its license file.
#[derive(Debug)]
pub struct License {
    /// Lower case key used in the configuration.
    pub key: &'static str,
    content_pattern: &'static str,
    header_lines: &'static [&'static str],
}

impl License {
    /// Lines of the header every source file must start with.
    #[must_use]
    pub fn header_lines(&self) -> &'static [&'static str] {
        self.header_lines
    }

    fn matches_license_file(&self, content: &str) -> Result<bool, regex::Error> {
        Ok(Regex::new(&format!("^(?:{})", self.content_pattern))?.is_match(content))
    }
}

/// Licenses with built-in headers.
pub const LICENSES: &[License] = &[
    License {
        key: "apache2",
        content_pattern: r"\s*Apache License\s*\n\s*Version 2.0, January 2004",
        header_lines: &[
            "Copyright $year $author",
            "",
            "Licensed under the Apache License, Version 2.0 (the \"License\");",
            "you may not use this file except in compliance with the License.",
            "You may obtain a copy of the License at",
            "",
            "    http://www.apache.org/licenses/LICENSE-2.0",
            "",
            "Unless required by applicable law or agreed to in writing, software",
            "distributed under the License is distributed on an \"AS IS\" BASIS,",
            "WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.",
            "See the License for the specific language governing permissions and",
            "limitations under the License.",
        ],
    },
    License {
        key: "gplv2",
        content_pattern: r"\s*GNU GENERAL PUBLIC LICENSE\s*\n\s*Version 2, June 1991",
        header_lines: &[
            "This file is part of $project.",
            "",
            "Copyright (C) $year $author",
            "",
            "$project is free software; you can redistribute it and/or modify",
            "it under the terms of the GNU General Public License as published by",
            "the Free Software Foundation; either version 2 of the License, or",
            "(at your option) any later version.",
            "",
            "$project is distributed in the hope that it will be useful,",
            "but WITHOUT ANY WARRANTY; without even the implied warranty of",
            "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
            "GNU General Public License for more details.",
            "",
            "You should have received a copy of the GNU General Public License",
            "along with $project. If not, see <http://www.gnu.org/licenses/>.",
        ],
    },
    License {
        key: "gplv3",
        content_pattern: r"\s*GNU GENERAL PUBLIC LICENSE\s*\n\s*Version 3, 29 June 2007",
        header_lines: &[
            "This file is part of $project.",
            "",
            "Copyright (C) $year $author",
            "",
            "$project is free software: you can redistribute it and/or modify",
            "it under the terms of the GNU General Public License as published by",
            "the Free Software Foundation, either version 3 of the License, or",
            "(at your option) any later version.",
            "",
            "$project is distributed in the hope that it will be useful,",
            "but WITHOUT ANY WARRANTY; without even the implied warranty of",
            "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
            "GNU General Public License for more details.",
            "",
            "You should have received a copy of the GNU General Public License",
            "along with $project. If not, see <http://www.gnu.org/licenses/>.",
        ],
    },
    License {
        key: "lgplv2",
        content_pattern: r"\s*GNU LIBRARY GENERAL PUBLIC LICENSE\s*\n\s*Version 2, June 1991",
        header_lines: &[
            "This file is part of $project.",
            "",
            "Copyright (C) $year $author",
            "",
            "$project is free software; you can redistribute it and/or modify",
            "it under the terms of the GNU Library General Public License as published by",
            "the Free Software Foundation; either version 2 of the License, or",
            "(at your option) any later version.",
            "",
            "$project is distributed in the hope that it will be useful,",
            "but WITHOUT ANY WARRANTY; without even the implied warranty of",
            "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
            "GNU Library General Public License for more details.",
            "",
            "You should have received a copy of the GNU Library General Public License",
            "along with $project. If not, see <http://www.gnu.org/licenses/>.",
        ],
    },
    License {
        key: "lgplv2.1",
        content_pattern: r"\s*GNU LESSER GENERAL PUBLIC LICENSE\s*\n\s*Version 2.1, February 1999",
        header_lines: &[
            "This file is part of $project.",
            "",
            "Copyright (C) $year $author",
            "",
            "$project is free software; you can redistribute it and/or modify",
            "it under the terms of the GNU Lesser General Public License as published by",
            "the Free Software Foundation; either version 2.1 of the License, or",
            "(at your option) any later version.",
            "",
            "$project is distributed in the hope that it will be useful,",
            "but WITHOUT ANY WARRANTY; without even the implied warranty of",
            "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
            "GNU Lesser General Public License for more details.",
            "",
            "You should have received a copy of the GNU Lesser General Public License",
            "along with $project. If not, see <http://www.gnu.org/licenses/>.",
        ],
    },
    License {
        key: "lgplv3",
        content_pattern: r"\s*GNU LESSER GENERAL PUBLIC LICENSE\s*\n\s*Version 3, 29 June 2007",
        header_lines: &[
            "This file is part of $project.",
            "",
            "Copyright (C) $year $author",
            "",
            "$project is free software: you can redistribute it and/or modify",
            "it under the terms of the GNU Lesser General Public License as published by",
            "the Free Software Foundation, either version 3 of the License, or",
            "(at your option) any later version.",
            "",
            "$project is distributed in the hope that it will be useful,",
            "but WITHOUT ANY WARRANTY; without even the implied warranty of",
            "MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the",
            "GNU Lesser General Public License for more details.",
            "",
            "You should have received a copy of the GNU Lesser General Public License",
            "along with $project. If not, see <http://www.gnu.org/licenses/>.",
        ],
    },
];

/// Looks up a built-in license by key, ignoring case.
#[must_use]
pub fn find_license(key: &str) -> Option<&'static License> {
    let key = key.to_lowercase();
    LICENSES.iter().find(|license| license.key == key)
}

/// Checks that every file starts with the expected license header.
#[derive(Debug)]
pub struct LicenseHeaderCheck {
    regex: Regex,
}

/// Creates the check from the `checks.license_header` settings.
///
/// # Errors
///
/// Returns [`CheckError::License`] if the configured license is unknown or
/// no license can be detected, and [`CheckError::Config`] if the settings
/// have the wrong shape.
pub fn create(project: &Project) -> Result<CheckBox, CheckError> {
    let section = project.config.section(LICENSE_HEADER_SECTION)?;
    let lines = header_lines(project, &section)?;

    let template = join_header_lines(
        section.string("prefix")?,
        section.string("line_prefix")?,
        section.string("suffix")?,
        &lines,
    );

    Ok(Box::new(LicenseHeaderCheck {
        regex: header_regex(&template, section.string("project")?)?,
    }))
}

impl Check for LicenseHeaderCheck {
    fn name(&self) -> &'static str {
        NAME
    }

    fn run(&self, file: &SourceFile<'_>) -> Result<Option<String>, CheckError> {
        if self.regex.is_match(file.content()?) {
            return Ok(None);
        }

        Ok(Some(format!("{}: error: invalid license header", file.path.display())))
    }
}

fn header_lines(project: &Project, section: &Section<'_>) -> Result<Vec<String>, CheckError> {
    if let Ok(lines) = section.strings("license") {
        return Ok(lines);
    }

    let key = section.string("license")?;
    let license = if key.is_empty() {
        let license = detect_license(&project.absolute_project_path())?;
        debug!("Detected license {}", license.key);
        license
    } else {
        find_license(key).ok_or_else(|| CheckError::License(format!("{key} is an unknown license")))?
    };

    Ok(license.header_lines().iter().map(ToString::to_string).collect())
}

/// Joins header lines into the header text. Empty lines get the line
/// prefix without trailing whitespace.
#[must_use]
pub fn join_header_lines<S: AsRef<str>>(
    prefix: &str,
    line_prefix: &str,
    suffix: &str,
    lines: &[S],
) -> String {
    let body = lines
        .iter()
        .map(|line| match line.as_ref() {
            "" => line_prefix.trim_end().to_string(),
            line => format!("{line_prefix}{line}"),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{prefix}{body}{suffix}")
}

/// Compiles a header template into a regex matching at the start of a file.
///
/// # Errors
///
/// Returns [`CheckError::Regex`] if the resulting pattern is too large.
pub fn header_regex(template: &str, project_name: &str) -> Result<Regex, CheckError> {
    let pattern = regex::escape(template)
        .replace(r"\$year", YEAR_PATTERN)
        .replace(r"\$author", AUTHOR_PATTERN)
        .replace(r"\$project", &regex::escape(project_name));

    Ok(Regex::new(&format!("(?s)^{pattern}"))?)
}

fn find_license_files(project_path: &Path) -> Result<Vec<PathBuf>, CheckError> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::new()
    };
    let root = Pattern::escape(&project_path.to_string_lossy());

    let mut found = Vec::new();
    for name in LICENSE_FILE_NAMES {
        let pattern = format!("{root}/{name}*");
        let paths = glob::glob_with(&pattern, options)
            .map_err(|e| CheckError::License(format!("invalid license file pattern {pattern}: {e}")))?;
        found.extend(paths.filter_map(Result::ok).filter(|path| path.is_file()));
    }

    found.sort();
    found.dedup();
    Ok(found)
}

fn license_in_file(path: &Path) -> Result<&'static License, CheckError> {
    let content = fs::read_to_string(path)
        .map_err(|e| CheckError::License(format!("failed to read {}: {e}", path.display())))?;

    for license in LICENSES {
        if license.matches_license_file(&content)? {
            return Ok(license);
        }
    }

    Err(CheckError::License(format!("unknown license in {}", path.display())))
}

/// Determines the license of a project from its license files.
///
/// A single license file decides. A GPLv3 file next to an LGPLv3 file
/// means LGPLv3, since the LGPLv3 is a set of additional permissions on
/// top of the GPLv3.
///
/// # Errors
///
/// Returns [`CheckError::License`] if there are no license files, a file
/// holds an unknown license, or the combination cannot be resolved.
pub fn detect_license(project_path: &Path) -> Result<&'static License, CheckError> {
    let paths = find_license_files(project_path)?;
    if paths.is_empty() {
        return Err(CheckError::License(format!(
            "unable to find any license file in {}",
            project_path.display()
        )));
    }

    let licenses = paths
        .iter()
        .map(|path| license_in_file(path))
        .collect::<Result<Vec<_>, _>>()?;

    match licenses.as_slice() {
        [license] => Ok(*license),
        [a, b] if is_gplv3_and_lgplv3(a, b) || is_gplv3_and_lgplv3(b, a) => {
            find_license("lgplv3").ok_or_else(|| CheckError::License("lgplv3 is missing".to_string()))
        }
        _ => Err(CheckError::License(format!(
            "unable to determine license in {}",
            project_path.display()
        ))),
    }
}

fn is_gplv3_and_lgplv3(a: &License, b: &License) -> bool {
    a.key == "gplv3" && b.key == "lgplv3"
}
