//! Deterministic compile-order assembly and top-level selection.

use std::collections::{BTreeSet, HashSet, VecDeque};

use glob::Pattern;

use crate::error::ResolveError;
use crate::registry::FileId;
use crate::resolver::Analysis;
use crate::unit::UnitRef;

/// A dependency-first linear compile order with top-level marking.
#[derive(Debug)]
pub struct CompileOrder {
    files: Vec<FileId>,
    tops: BTreeSet<FileId>,
}

impl CompileOrder {
    /// The files in compile order: every strong dependency precedes its
    /// dependents.
    pub fn files(&self) -> &[FileId] {
        &self.files
    }

    /// Whether a file is a top-level: it defines at least one entity and no
    /// other ordered file depends on it.
    pub fn is_top(&self, id: FileId) -> bool {
        self.tops.contains(&id)
    }

    /// Number of ordered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the order contains no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Builds the compile order for the registry behind `analysis`.
///
/// Without `roots` every accepted unit definition is a seed. Each root is a
/// `[LIB.]NAME` glob (library defaults to `work`) expanded over the accepted
/// unit definitions; a root that matches nothing produces a stderr warning
/// and is skipped. Seeds are processed in reverse (kind, library, name)
/// order and dependency edges in canonical-path order, which makes the
/// result a pure function of the inputs.
pub fn compile_order(
    analysis: &mut Analysis<'_>,
    roots: &[String],
) -> Result<CompileOrder, ResolveError> {
    let registry = analysis.registry();

    let mut seeds: BTreeSet<UnitRef> = BTreeSet::new();
    for (_, file) in registry.iter() {
        if !registry.is_accepted(file) {
            continue;
        }
        for name in &file.entity_defs {
            seeds.insert(UnitRef::entity(file.library.clone(), name.clone()));
        }
        for name in &file.package_defs {
            seeds.insert(UnitRef::package(file.library.clone(), name.clone()));
        }
    }

    if !roots.is_empty() {
        seeds = expand_roots(&seeds, roots)?;
    }

    let mut builder = Builder {
        analysis,
        order: VecDeque::new(),
        present: HashSet::new(),
    };
    for unit in seeds.iter().rev() {
        let id = builder.analysis.resolve_unit(unit)?;
        builder.add(id, false)?;
    }

    let Builder {
        analysis, order, ..
    } = builder;
    let files: Vec<FileId> = order.into_iter().collect();

    let mut incoming: HashSet<FileId> = HashSet::new();
    for &id in &files {
        let deps = analysis.dependencies(id)?;
        incoming.extend(deps.strong.iter().copied());
        incoming.extend(deps.weak.iter().copied());
    }
    let registry = analysis.registry();
    let tops = files
        .iter()
        .copied()
        .filter(|&id| !registry.file(id).entity_defs.is_empty() && !incoming.contains(&id))
        .collect();

    Ok(CompileOrder { files, tops })
}

/// Expands `[LIB.]NAME` root globs over the accepted unit set.
fn expand_roots(
    seeds: &BTreeSet<UnitRef>,
    roots: &[String],
) -> Result<BTreeSet<UnitRef>, ResolveError> {
    let mut selected = BTreeSet::new();
    for root in roots {
        let root = root.to_lowercase();
        let (library, name) = match root.split_once('.') {
            Some((library, name)) => (library.to_string(), name.to_string()),
            None => ("work".to_string(), root.clone()),
        };
        let compile = |pattern: &str| {
            Pattern::new(pattern).map_err(|source| ResolveError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
        };
        let library_glob = compile(&library)?;
        let name_glob = compile(&name)?;
        let mut found = false;
        for unit in seeds {
            if library_glob.matches(&unit.library) && name_glob.matches(&unit.name) {
                selected.insert(unit.clone());
                found = true;
            }
        }
        if !found {
            eprintln!("Warning: {library}.{name} did not match anything.");
        }
    }
    Ok(selected)
}

struct Builder<'a, 'r> {
    analysis: &'a mut Analysis<'r>,
    order: VecDeque<FileId>,
    present: HashSet<FileId>,
}

impl Builder<'_, '_> {
    /// Ensures `id` is in the order. A newly visited file is pushed to the
    /// front and its dependencies are pulled in recursively; a file that is
    /// already present is relocated to the front only for strong edges.
    fn add(&mut self, id: FileId, strong: bool) -> Result<(), ResolveError> {
        if self.present.insert(id) {
            self.order.push_front(id);
            let deps = self.analysis.dependencies(id)?.clone();
            for dep in self.sorted_by_path(&deps.strong) {
                self.add(dep, true)?;
            }
            for dep in self.sorted_by_path(&deps.weak) {
                self.add(dep, false)?;
            }
            return Ok(());
        }
        if strong {
            let mut stack = vec![id];
            self.move_to_front(id, &mut stack)?;
        }
        Ok(())
    }

    /// Relocates `id` to the front of the order together with its strong
    /// dependencies. Revisiting a file already on the relocation stack means
    /// the strong edges form a cycle.
    fn move_to_front(&mut self, id: FileId, stack: &mut Vec<FileId>) -> Result<(), ResolveError> {
        if let Some(pos) = self.order.iter().position(|&f| f == id) {
            self.order.remove(pos);
        }
        self.order.push_front(id);
        let deps = self.analysis.dependencies(id)?.clone();
        for dep in self.sorted_by_path(&deps.strong) {
            if stack.contains(&dep) {
                let registry = self.analysis.registry();
                let mut files: Vec<String> = stack
                    .iter()
                    .map(|&f| registry.file(f).path.display().to_string())
                    .collect();
                files.push(registry.file(dep).path.display().to_string());
                return Err(ResolveError::Cycle { files });
            }
            stack.push(dep);
            self.move_to_front(dep, stack)?;
            stack.pop();
        }
        Ok(())
    }

    fn sorted_by_path(&self, set: &BTreeSet<FileId>) -> Vec<FileId> {
        let registry = self.analysis.registry();
        let mut ids: Vec<FileId> = set.iter().copied().collect();
        ids.sort_by(|&a, &b| registry.file(a).path.cmp(&registry.file(b).path));
        ids
    }
}
