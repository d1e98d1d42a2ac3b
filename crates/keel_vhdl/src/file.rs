//! Extraction of design-unit definitions and usages from one VHDL file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use keel_common::{TimeSpec, VhdlVersion};

use crate::error::ExtractError;
use crate::patterns;

/// Options controlling how a file is extracted.
#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Library the file's design units are compiled into.
    pub library: String,
    /// Forces the compatible-version set to exactly this version, overriding
    /// any filename tags.
    pub override_version: Option<VhdlVersion>,
    /// Version the surrounding analysis would prefer to compile with; used to
    /// select the file's own compile version from its compatible set.
    pub desired_version: VhdlVersion,
    /// Enforce style rules; violations fail the extraction.
    pub strict: bool,
    /// Allow components declared in this file to remain black boxes.
    pub allow_black_box: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            library: "work".to_string(),
            override_version: None,
            desired_version: VhdlVersion::V2008,
            strict: false,
            allow_black_box: false,
        }
    }
}

/// A single VHDL source file with its extracted definition and usage sets.
///
/// Identified by its canonical absolute path. Immutable once constructed;
/// the dependency resolver keeps its resolution results outside this type.
#[derive(Debug)]
pub struct VhdlFile {
    /// Canonical absolute path; the file's identity.
    pub path: PathBuf,
    /// Destination library name.
    pub library: String,
    /// Compatible language versions. Empty means universal.
    pub versions: BTreeSet<VhdlVersion>,
    /// The version this file is compiled with when it is used.
    pub version: VhdlVersion,
    /// Whether the file may be used in simulation mode.
    pub use_for_simulation: bool,
    /// Whether the file may be used in synthesis mode.
    pub use_for_synthesis: bool,
    /// Whether components declared here may remain black boxes.
    pub allow_black_box: bool,
    /// Whether style rules were enforced for this file.
    pub strict: bool,
    /// Entities defined in this file.
    pub entity_defs: BTreeSet<String>,
    /// Direct entity instantiations: (library, name), library absent for
    /// unqualified instantiations.
    pub entity_uses: BTreeSet<(Option<String>, String)>,
    /// Components declared in this file.
    pub component_defs: BTreeSet<String>,
    /// Component instantiations by name.
    pub component_uses: BTreeSet<String>,
    /// Packages defined in this file.
    pub package_defs: BTreeSet<String>,
    /// Package usages: (library, name).
    pub package_uses: BTreeSet<(String, String)>,
    /// Entity names suppressed by ignore pragmas.
    pub ignored_entities: BTreeSet<String>,
    /// Component names suppressed by ignore pragmas.
    pub ignored_components: BTreeSet<String>,
    /// Package names suppressed by ignore pragmas.
    pub ignored_packages: BTreeSet<String>,
    /// The file's single design unit name, when it has exactly one entity
    /// or exactly one package.
    pub unit: Option<String>,
    /// Whether the file defines any package.
    pub is_package: bool,
    /// Simulated-time timeout from the first timeout pragma, if any.
    pub sim_timeout: Option<TimeSpec>,
}

impl VhdlFile {
    /// Reads and extracts a VHDL file.
    ///
    /// The path is canonicalized first so that equal files compare equal
    /// regardless of how they were referenced. Fails with
    /// [`ExtractError::Io`] if the file cannot be read and with
    /// [`ExtractError::Style`] on a style violation under
    /// [`ExtractOptions::strict`].
    pub fn parse(path: &Path, options: ExtractOptions) -> Result<Self, ExtractError> {
        let io_err = |source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        };
        let path = std::fs::canonicalize(path).map_err(io_err)?;
        let raw = std::fs::read_to_string(&path)
            .map_err(|source| ExtractError::Io {
                path: path.clone(),
                source,
            })?
            .to_lowercase();

        let table = patterns::table();

        // Pragmas are scanned before comment stripping since they live in
        // comments. The first timeout pragma wins.
        let sim_timeout = table
            .timeout_pragma
            .captures(&raw)
            .and_then(|caps| caps[1].parse::<TimeSpec>().ok());
        let mut ignored_entities = BTreeSet::new();
        let mut ignored_components = BTreeSet::new();
        let mut ignored_packages = BTreeSet::new();
        for caps in table.ignore_pragma.captures_iter(&raw) {
            let name = caps[2].to_string();
            match &caps[1] {
                "entity" => ignored_entities.insert(name),
                "component" => ignored_components.insert(name),
                _ => ignored_packages.insert(name),
            };
        }

        // Strip comments line by line, then flatten so patterns can span
        // line breaks.
        let stripped = raw
            .lines()
            .map(|line| line.split("--").next().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(" ");

        let entity_defs: BTreeSet<String> = table
            .entity_def
            .captures_iter(&stripped)
            .map(|caps| caps[1].to_string())
            .collect();
        let entity_uses: BTreeSet<(Option<String>, String)> = table
            .entity_use
            .captures_iter(&stripped)
            .map(|caps| {
                let lib = caps.get(1).map(|m| m.as_str().to_string());
                (lib, caps[2].to_string())
            })
            .filter(|(_, name)| !ignored_entities.contains(name))
            .collect();
        let component_defs: BTreeSet<String> = table
            .component_def
            .captures_iter(&stripped)
            .map(|caps| caps[1].to_string())
            .collect();
        let component_uses: BTreeSet<String> = table
            .component_use
            .captures_iter(&stripped)
            .map(|caps| caps[1].to_string())
            .filter(|name| !ignored_components.contains(name))
            .collect();
        let package_defs: BTreeSet<String> = table
            .package_def
            .captures_iter(&stripped)
            .map(|caps| caps[1].to_string())
            .collect();
        let package_uses: BTreeSet<(String, String)> = table
            .package_use
            .captures_iter(&stripped)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .filter(|(_, name)| !ignored_packages.contains(name))
            .collect();

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let versions = match options.override_version {
            Some(version) => BTreeSet::from([version]),
            None => filename_version_tags(&file_name),
        };
        let version = VhdlVersion::closest_to(versions.iter().copied(), options.desired_version)
            .unwrap_or(options.desired_version);

        let unit = if entity_defs.len() + package_defs.len() == 1 {
            entity_defs
                .iter()
                .chain(package_defs.iter())
                .next()
                .cloned()
        } else {
            None
        };
        let is_package = !package_defs.is_empty();

        let file = Self {
            library: options.library,
            versions,
            version,
            use_for_simulation: !file_name.contains(".syn."),
            use_for_synthesis: !file_name.contains(".sim."),
            allow_black_box: options.allow_black_box,
            strict: options.strict,
            entity_defs,
            entity_uses,
            component_defs,
            component_uses,
            package_defs,
            package_uses,
            ignored_entities,
            ignored_components,
            ignored_packages,
            unit,
            is_package,
            sim_timeout,
            path,
        };

        if options.strict {
            file.check_style(&file_name)?;
        }
        Ok(file)
    }

    /// The file name without directories, for human-readable messages.
    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    fn check_style(&self, file_name: &str) -> Result<(), ExtractError> {
        let unit = match &self.unit {
            Some(unit) => unit,
            None => {
                return Err(ExtractError::Style(format!(
                    "{} contains multiple or zero design units",
                    self.path.display()
                )))
            }
        };
        if self.is_package && !unit.ends_with("_pkg") {
            return Err(ExtractError::Style(format!(
                "{} contains package without _pkg suffix",
                self.path.display()
            )));
        }
        let stem = file_name.split('.').next().unwrap_or("");
        if stem != unit {
            return Err(ExtractError::Style(format!(
                "filename does not match design unit for {}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Parses the version tags of a file name.
///
/// A tag is a segment strictly between two dots that is either a four-digit
/// year 1970–2069 or any two-digit number.
fn filename_version_tags(file_name: &str) -> BTreeSet<VhdlVersion> {
    let segments: Vec<&str> = file_name.split('.').collect();
    let mut tags = BTreeSet::new();
    if segments.len() < 3 {
        return tags;
    }
    for segment in &segments[1..segments.len() - 1] {
        let numeric = !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit());
        if !numeric {
            continue;
        }
        match (segment.len(), segment.parse::<u16>()) {
            (2, Ok(year)) => {
                tags.insert(VhdlVersion::from_year(year));
            }
            (4, Ok(year)) if (1970..=2069).contains(&year) => {
                tags.insert(VhdlVersion::from_year(year));
            }
            _ => {}
        }
    }
    tags
}
