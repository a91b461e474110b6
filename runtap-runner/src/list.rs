// Copyright (c) The runtap Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test list files and test program path resolution.

use crate::config::HarnessConfig;
use crate::errors::HarnessError;
use camino::{Utf8Path, Utf8PathBuf};

/// Reads a list of test names, one per line. Blank lines and lines starting
/// with `#` are skipped.
pub fn read_test_list(path: &Utf8Path) -> Result<Vec<String>, HarnessError> {
    let contents = std::fs::read_to_string(path).map_err(|source| HarnessError::ReadTestList {
        path: path.to_owned(),
        source,
    })?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect())
}

/// Resolves a test name to the program to run.
///
/// Each suffix in `-t`, `.t`, and none is tried against the current
/// directory, the build directory, and the source directory, in that order.
/// The first executable regular file wins. If nothing matches, the bare
/// name is returned and the spawn failure surfaces in the report.
pub fn find_test(name: &str, config: &HarnessConfig) -> Utf8PathBuf {
    let bases: [Option<&Utf8Path>; 3] = [
        Some(Utf8Path::new(".")),
        config.build_dir.as_deref(),
        config.source_dir.as_deref(),
    ];
    for suffix in ["-t", ".t", ""] {
        for base in bases.iter().flatten() {
            let candidate = base.join(format!("{name}{suffix}"));
            if is_valid_test(&candidate) {
                return candidate;
            }
        }
    }
    Utf8PathBuf::from(name)
}

#[cfg(unix)]
fn is_valid_test(path: &Utf8Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_valid_test(path: &Utf8Path) -> bool {
    path.metadata().map(|meta| meta.is_file()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino_tempfile::Utf8TempDir;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn list_skips_comments_and_blanks() {
        let dir = Utf8TempDir::new().unwrap();
        let path = dir.path().join("TESTS");
        std::fs::write(
            &path,
            indoc! {"
                # core tests
                util/messages
                util/xmalloc

                portable/asprintf
            "},
        )
        .unwrap();
        let names = read_test_list(&path).unwrap();
        assert_eq!(
            names,
            vec!["util/messages", "util/xmalloc", "portable/asprintf"]
        );
    }

    #[test]
    fn missing_list_is_an_error() {
        let dir = Utf8TempDir::new().unwrap();
        let err = read_test_list(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, HarnessError::ReadTestList { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn find_prefers_dash_t_then_dot_t() {
        use std::os::unix::fs::PermissionsExt;

        let dir = Utf8TempDir::new().unwrap();
        let build = dir.path().join("build");
        std::fs::create_dir(&build).unwrap();
        for file in ["build/demo-t", "build/demo.t"] {
            let path = dir.path().join(file);
            std::fs::write(&path, "#!/bin/sh\n").unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
        let config = HarnessConfig {
            build_dir: Some(build.clone()),
            ..HarnessConfig::default()
        };
        assert_eq!(find_test("demo", &config), build.join("demo-t"));

        std::fs::remove_file(build.join("demo-t")).unwrap();
        assert_eq!(find_test("demo", &config), build.join("demo.t"));
    }

    #[cfg(unix)]
    #[test]
    fn find_ignores_non_executable_files() {
        let dir = Utf8TempDir::new().unwrap();
        let build = dir.path().join("build");
        std::fs::create_dir(&build).unwrap();
        std::fs::write(build.join("demo-t"), "plain data\n").unwrap();
        let config = HarnessConfig {
            build_dir: Some(build),
            ..HarnessConfig::default()
        };
        // Falls back to the bare name so the spawn failure is reported.
        assert_eq!(find_test("demo", &config), Utf8PathBuf::from("demo"));
    }
}
