//! The file registry and its version/mode filter policy.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use keel_common::VhdlVersion;
use keel_vhdl::VhdlFile;

use crate::error::ResolveError;
use crate::unit::{UnitKind, UnitRef};

/// The compilation mode the file filter operates under.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Mode {
    /// Compiling for simulation; synthesis-only files are rejected.
    #[default]
    Simulation,
    /// Compiling for synthesis; simulation-only files are rejected.
    Synthesis,
    /// No mode filtering.
    All,
}

/// Index of a file in the registry's arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct FileId(usize);

impl FileId {
    /// The arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Container of all VHDL files available for compilation, plus the global
/// filter policy.
///
/// Files are added during scanning; afterwards the registry is read-only and
/// resolution operates over it. Canonical paths are unique: re-adding a path
/// returns the existing entry.
pub struct Registry {
    mode: Mode,
    required_version: Option<VhdlVersion>,
    desired_version: VhdlVersion,
    files: Vec<VhdlFile>,
    ids_by_path: HashMap<PathBuf, FileId>,
}

impl Registry {
    /// Creates an empty registry.
    ///
    /// When `required_version` is set it becomes the desired version as well;
    /// otherwise `desired_version` applies, defaulting to VHDL-2008.
    pub fn new(
        mode: Mode,
        desired_version: Option<VhdlVersion>,
        required_version: Option<VhdlVersion>,
    ) -> Self {
        let desired_version = required_version
            .or(desired_version)
            .unwrap_or(VhdlVersion::V2008);
        Self {
            mode,
            required_version,
            desired_version,
            files: Vec::new(),
            ids_by_path: HashMap::new(),
        }
    }

    /// The mode filter in effect.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The required version filter, if any.
    pub fn required_version(&self) -> Option<VhdlVersion> {
        self.required_version
    }

    /// The version preferred when multiple candidates are available.
    pub fn desired_version(&self) -> VhdlVersion {
        self.desired_version
    }

    /// Adds a file, returning its id. A file with the same canonical path
    /// as an existing entry is not added again.
    pub fn insert(&mut self, file: VhdlFile) -> FileId {
        if let Some(&id) = self.ids_by_path.get(&file.path) {
            return id;
        }
        let id = FileId(self.files.len());
        self.ids_by_path.insert(file.path.clone(), id);
        self.files.push(file);
        id
    }

    /// Looks up a file by id.
    ///
    /// # Panics
    ///
    /// Panics if the id does not belong to this registry.
    pub fn file(&self, id: FileId) -> &VhdlFile {
        &self.files[id.0]
    }

    /// Iterates all files in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (FileId, &VhdlFile)> {
        self.files.iter().enumerate().map(|(i, f)| (FileId(i), f))
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the registry holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Returns the reason a file is rejected by the current policy, or
    /// `None` when the file is accepted.
    pub fn filter_reason(&self, file: &VhdlFile) -> Option<String> {
        match self.mode {
            Mode::Simulation if !file.use_for_simulation => {
                return Some(format!("{} is synthesis-only", file.basename()));
            }
            Mode::Synthesis if !file.use_for_synthesis => {
                return Some(format!("{} is simulation-only", file.basename()));
            }
            _ => {}
        }
        if let Some(required) = self.required_version {
            if !file.versions.is_empty() && !file.versions.contains(&required) {
                return Some(format!(
                    "{} is not compatible with VHDL {}",
                    file.basename(),
                    required
                ));
            }
        }
        None
    }

    /// Whether a file passes the current filter policy.
    pub fn is_accepted(&self, file: &VhdlFile) -> bool {
        self.filter_reason(file).is_none()
    }

    /// Resolves a design-unit reference to the single best-matching file.
    ///
    /// Candidates are the accepted files of the unit's library that define
    /// the name. Among them the version closest to the desired version wins
    /// (a universal candidate short-circuits to the desired version, ties go
    /// to the lower year); more than one survivor is an ambiguity error.
    pub fn resolve_unit(&self, unit: &UnitRef) -> Result<FileId, ResolveError> {
        let mut accepted = Vec::new();
        let mut filtered_reasons = Vec::new();
        for (id, file) in self.iter() {
            if file.library != unit.library || !defs(file, unit.kind).contains(&unit.name) {
                continue;
            }
            match self.filter_reason(file) {
                Some(reason) => filtered_reasons.push(reason),
                None => accepted.push(id),
            }
        }

        if accepted.is_empty() {
            if filtered_reasons.is_empty() {
                return Err(ResolveError::Missing { unit: unit.clone() });
            }
            return Err(ResolveError::Filtered {
                unit: unit.clone(),
                reasons: filtered_reasons,
            });
        }

        let mut version_options: BTreeSet<VhdlVersion> = BTreeSet::new();
        for &id in &accepted {
            let file = self.file(id);
            if file.versions.is_empty() {
                // A universal candidate makes the desired version reachable.
                version_options = BTreeSet::from([self.desired_version]);
                break;
            }
            version_options.extend(file.versions.iter().copied());
        }
        let best = match VhdlVersion::closest_to(version_options, self.desired_version) {
            Some(best) => best,
            None => self.desired_version,
        };

        let survivors: Vec<FileId> = accepted
            .into_iter()
            .filter(|&id| {
                let file = self.file(id);
                file.versions.is_empty() || file.versions.contains(&best)
            })
            .collect();

        match survivors.as_slice() {
            [id] => Ok(*id),
            _ => {
                let mut candidates: Vec<String> = survivors
                    .iter()
                    .map(|&id| self.file(id).path.display().to_string())
                    .collect();
                candidates.sort();
                Err(ResolveError::Ambiguous {
                    unit: unit.clone(),
                    candidates,
                })
            }
        }
    }
}

fn defs(file: &VhdlFile, kind: UnitKind) -> &BTreeSet<String> {
    match kind {
        UnitKind::Entity => &file.entity_defs,
        UnitKind::Package => &file.package_defs,
    }
}
