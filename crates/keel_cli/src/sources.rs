//! Path-spec parsing and source scanning.
//!
//! Input paths are given as `[[VERSION:]LIB:]PATH` where `VERSION` is a 2- or
//! 4-digit year forced onto every file of the spec, `LIB` is the destination
//! library (default `work`), and `PATH` is a directory (scanned recursively
//! for `*.vhd`/`*.vhdl`), a single file, or a non-recursive glob containing
//! `*` or `?`.

use std::path::{Path, PathBuf};

use keel_common::VhdlVersion;
use keel_resolve::Registry;
use keel_vhdl::{ExtractOptions, VhdlFile};

use crate::error::CliError;

/// How the files of a spec are admitted.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SpecKind {
    /// Plain inclusion.
    Include,
    /// Inclusion with style rules enforced.
    Strict,
    /// Inclusion with black-box components allowed.
    External,
}

/// A parsed `[[VERSION:]LIB:]PATH` input specification.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PathSpec {
    /// Version forced onto every file, overriding filename tags.
    pub version: Option<VhdlVersion>,
    /// Destination library, lowercased.
    pub library: String,
    /// The path, file, or glob to scan.
    pub path: String,
}

impl PathSpec {
    /// Parses a spec string. At most two colons are significant; the last
    /// segment is always the path.
    pub fn parse(spec: &str) -> Result<Self, CliError> {
        let parts: Vec<&str> = spec.splitn(3, ':').collect();
        let (version, library, path) = match parts.as_slice() {
            [path] => (None, "work", *path),
            [library, path] => (None, *library, *path),
            [version, library, path] => (Some(*version), *library, *path),
            _ => unreachable!("splitn(3) yields 1 to 3 parts"),
        };
        let version = version
            .map(|v| {
                v.parse::<VhdlVersion>()
                    .map_err(|e| CliError::Config(e.to_string()))
            })
            .transpose()?;
        Ok(Self {
            version,
            library: library.to_lowercase(),
            path: path.to_string(),
        })
    }
}

/// Scans one spec and adds everything it names to the registry.
pub fn add_spec(registry: &mut Registry, spec: &str, kind: SpecKind) -> Result<(), CliError> {
    let spec = PathSpec::parse(spec)?;
    let path = Path::new(&spec.path);
    if path.is_dir() {
        let mut files = Vec::new();
        collect_vhdl_files(path, &mut files)?;
        files.sort();
        for file in files {
            add_file(registry, &file, &spec, kind)?;
        }
        return Ok(());
    }
    if path.is_file() {
        return add_file(registry, path, &spec, kind);
    }
    if spec.path.contains('*') || spec.path.contains('?') {
        let entries = glob::glob(&spec.path)
            .map_err(|e| CliError::Config(format!("invalid pattern '{}': {e}", spec.path)))?;
        let mut matched = false;
        for entry in entries {
            let entry = entry.map_err(|e| CliError::Config(e.to_string()))?;
            if entry.is_file() {
                add_file(registry, &entry, &spec, kind)?;
                matched = true;
            }
        }
        if matched {
            return Ok(());
        }
    }
    Err(CliError::Config(format!(
        "file/directory not found: {}",
        spec.path
    )))
}

/// Recursively collects `*.vhd`/`*.vhdl` files under a directory.
fn collect_vhdl_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), CliError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_vhdl_files(&path, files)?;
        } else if is_vhdl_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Whether a path has a recognized VHDL extension, case-insensitively.
fn is_vhdl_file(path: &Path) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_lowercase(),
        None => return false,
    };
    name.ends_with(".vhd") || name.ends_with(".vhdl")
}

fn add_file(
    registry: &mut Registry,
    path: &Path,
    spec: &PathSpec,
    kind: SpecKind,
) -> Result<(), CliError> {
    let file = VhdlFile::parse(
        path,
        ExtractOptions {
            library: spec.library.clone(),
            override_version: spec.version,
            desired_version: registry.desired_version(),
            strict: kind == SpecKind::Strict,
            allow_black_box: kind == SpecKind::External,
        },
    )?;
    registry.insert(file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_resolve::Mode;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn parse_bare_path() {
        let spec = PathSpec::parse("/some/dir").unwrap();
        assert_eq!(spec.version, None);
        assert_eq!(spec.library, "work");
        assert_eq!(spec.path, "/some/dir");
    }

    #[test]
    fn parse_library_prefix() {
        let spec = PathSpec::parse("timeout:/some/dir").unwrap();
        assert_eq!(spec.version, None);
        assert_eq!(spec.library, "timeout");
        assert_eq!(spec.path, "/some/dir");
    }

    #[test]
    fn parse_version_and_library() {
        let spec = PathSpec::parse("93:timeout:/some/dir").unwrap();
        assert_eq!(spec.version, Some(VhdlVersion::V1993));
        assert_eq!(spec.library, "timeout");
        assert_eq!(spec.path, "/some/dir");
    }

    #[test]
    fn parse_library_is_lowercased() {
        let spec = PathSpec::parse("MyLib:/dir").unwrap();
        assert_eq!(spec.library, "mylib");
    }

    #[test]
    fn parse_bad_version_is_config_error() {
        let err = PathSpec::parse("abc:lib:/dir").unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err.to_string().contains("invalid VHDL version"));
    }

    #[test]
    fn directory_scan_is_recursive_and_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.vhd"), "entity b is end entity;").unwrap();
        fs::write(dir.path().join("sub/a.vhdl"), "entity a is end entity;").unwrap();
        fs::write(dir.path().join("notes.txt"), "not vhdl").unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        add_spec(
            &mut registry,
            dir.path().to_str().unwrap(),
            SpecKind::Include,
        )
        .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.VHD"), "entity a is end entity;").unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        add_spec(
            &mut registry,
            dir.path().to_str().unwrap(),
            SpecKind::Include,
        )
        .unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn single_file_spec() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.vhd");
        fs::write(&path, "entity a is end entity;").unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        add_spec(&mut registry, path.to_str().unwrap(), SpecKind::Include).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn glob_spec_is_non_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.vhd"), "entity a is end entity;").unwrap();
        fs::write(dir.path().join("sub/b.vhd"), "entity b is end entity;").unwrap();
        let pattern = format!("{}/*.vhd", dir.path().display());
        let mut registry = Registry::new(Mode::Simulation, None, None);
        add_spec(&mut registry, &pattern, SpecKind::Include).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn missing_path_is_config_error() {
        let mut registry = Registry::new(Mode::Simulation, None, None);
        let err = add_spec(&mut registry, "not-a-path", SpecKind::Include).unwrap_err();
        assert_eq!(err.kind(), "ConfigError");
        assert!(err
            .to_string()
            .contains("file/directory not found: not-a-path"));
    }

    #[test]
    fn version_override_applies_to_all_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.08.vhd"), "entity a is end entity;").unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        let spec = format!("93:mylib:{}", dir.path().display());
        add_spec(&mut registry, &spec, SpecKind::Include).unwrap();
        let (_, file) = registry.iter().next().unwrap();
        assert_eq!(file.library, "mylib");
        assert_eq!(file.version, VhdlVersion::V1993);
        assert!(file.versions.contains(&VhdlVersion::V1993));
        assert!(!file.versions.contains(&VhdlVersion::V2008));
    }

    #[test]
    fn strict_spec_enforces_style() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("wrong.vhd"), "entity other is end entity;").unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        let err = add_spec(
            &mut registry,
            dir.path().to_str().unwrap(),
            SpecKind::Strict,
        )
        .unwrap_err();
        assert_eq!(err.kind(), "StyleError");
    }
}
