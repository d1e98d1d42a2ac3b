//! Per-file dependency resolution against the registry.

use std::collections::{BTreeSet, HashMap};

use keel_vhdl::VhdlFile;

use crate::error::ResolveError;
use crate::registry::{FileId, Registry};
use crate::unit::UnitRef;

/// Libraries that are always available and never resolved.
const STANDARD_LIBRARIES: [&str; 2] = ["ieee", "std"];

/// A file's resolved dependency sets.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FileDeps {
    /// Files that must be compiled before this file (package and direct
    /// entity usages).
    pub strong: BTreeSet<FileId>,
    /// Files that must be compiled somewhere in the run (entities reached
    /// only through component declarations).
    pub weak: BTreeSet<FileId>,
}

/// Memoizing resolution state over a populated, read-only [`Registry`].
///
/// Unit resolutions and per-file dependency sets are each computed at most
/// once; repeated queries return the stored result, so resolution is
/// idempotent by construction.
pub struct Analysis<'r> {
    registry: &'r Registry,
    units: HashMap<UnitRef, FileId>,
    deps: Vec<Option<FileDeps>>,
}

impl<'r> Analysis<'r> {
    /// Creates empty resolution state for a registry.
    pub fn new(registry: &'r Registry) -> Self {
        Self {
            registry,
            units: HashMap::new(),
            deps: (0..registry.len()).map(|_| None).collect(),
        }
    }

    /// The registry this analysis operates over.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Resolves a design-unit reference, memoized.
    pub fn resolve_unit(&mut self, unit: &UnitRef) -> Result<FileId, ResolveError> {
        if let Some(&id) = self.units.get(unit) {
            return Ok(id);
        }
        let id = self.registry.resolve_unit(unit)?;
        self.units.insert(unit.clone(), id);
        Ok(id)
    }

    /// Returns the file's dependency sets, computing them on first demand.
    pub fn dependencies(&mut self, id: FileId) -> Result<&FileDeps, ResolveError> {
        if self.deps[id.index()].is_none() {
            let deps = self.compute_dependencies(id)?;
            self.deps[id.index()] = Some(deps);
        }
        Ok(self.deps[id.index()]
            .as_ref()
            .expect("dependency slot filled above"))
    }

    fn compute_dependencies(&mut self, id: FileId) -> Result<FileDeps, ResolveError> {
        let registry = self.registry;
        let file = registry.file(id);
        let mut deps = FileDeps::default();

        // Files whose component declarations are visible here: the file
        // itself, then every package it uses, in resolution order.
        let mut decl_sources = vec![id];

        for (lib, name) in &file.package_uses {
            let library = effective_library(Some(lib.as_str()), file);
            if is_standard_library(&library) {
                continue;
            }
            let unit = UnitRef::package(library, name.clone());
            let dep = self
                .resolve_unit(&unit)
                .map_err(|e| e.in_context(unit.to_string(), file.path.display().to_string()))?;
            if dep == id {
                continue;
            }
            deps.strong.insert(dep);
            decl_sources.push(dep);
        }

        for (lib, name) in &file.entity_uses {
            let library = effective_library(lib.as_deref(), file);
            if is_standard_library(&library) {
                continue;
            }
            let unit = UnitRef::entity(library, name.clone());
            let dep = self
                .resolve_unit(&unit)
                .map_err(|e| e.in_context(unit.to_string(), file.path.display().to_string()))?;
            if dep != id {
                deps.strong.insert(dep);
            }
        }

        for component in &file.component_uses {
            let source = decl_sources
                .iter()
                .copied()
                .find(|&src| registry.file(src).component_defs.contains(component));
            let source = match source {
                Some(source) => source,
                None => {
                    let searched = decl_sources
                        .iter()
                        .map(|&src| registry.file(src).basename())
                        .collect();
                    return Err(ResolveError::MissingComponent {
                        component: component.clone(),
                        searched,
                    }
                    .in_context(
                        format!("component {component}"),
                        file.path.display().to_string(),
                    ));
                }
            };
            let source_file = registry.file(source);
            let unit = UnitRef::entity(source_file.library.clone(), component.clone());
            match self.resolve_unit(&unit) {
                Ok(dep) => {
                    if dep != id {
                        deps.weak.insert(dep);
                    }
                }
                Err(_) if source_file.allow_black_box => {}
                Err(e) => {
                    return Err(ResolveError::BlackBox {
                        source: Box::new(e),
                    }
                    .in_context(
                        format!("component {component}"),
                        file.path.display().to_string(),
                    ));
                }
            }
        }

        Ok(deps)
    }
}

/// Maps an optional usage library to the library resolution operates in:
/// `work` and unqualified usages refer to the using file's own library.
fn effective_library(lib: Option<&str>, file: &VhdlFile) -> String {
    match lib {
        Some(lib) if !lib.is_empty() && lib != "work" => lib.to_string(),
        _ => file.library.clone(),
    }
}

fn is_standard_library(lib: &str) -> bool {
    STANDARD_LIBRARIES.contains(&lib)
}
