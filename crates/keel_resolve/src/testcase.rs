//! Test-case selection over top-level entities.

use glob::Pattern;

use crate::error::ResolveError;
use crate::order::CompileOrder;
use crate::registry::{FileId, Registry};

/// A runnable test case: a top-level file and one of its entities.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TestCase {
    /// The file the entity is defined in.
    pub file: FileId,
    /// The entity name.
    pub unit: String,
}

#[derive(Debug)]
struct CompiledPattern {
    /// Match against the file path instead of the entity name.
    on_path: bool,
    /// A match clears the include flag instead of setting it.
    invert: bool,
    glob: Pattern,
}

/// An ordered list of test-case selection patterns.
///
/// Patterns apply left to right over each candidate entity: a positive match
/// sets the include flag, an inverted match (leading `!`) clears it. A
/// leading `:` matches the file's absolute path instead of the entity name;
/// `:!` combines the two. Globs match the entire name or path.
#[derive(Debug)]
pub struct PatternSet {
    patterns: Vec<CompiledPattern>,
}

impl PatternSet {
    /// Compiles a pattern list. An empty list defaults to `*_tc`.
    pub fn parse(patterns: &[String]) -> Result<Self, ResolveError> {
        let default = ["*_tc".to_string()];
        let patterns = if patterns.is_empty() {
            &default[..]
        } else {
            patterns
        };
        let mut compiled = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let mut rest = pattern.as_str();
            let on_path = rest.starts_with(':');
            if on_path {
                rest = &rest[1..];
            }
            let invert = rest.starts_with('!');
            if invert {
                rest = &rest[1..];
            }
            let glob = Pattern::new(rest).map_err(|source| ResolveError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            compiled.push(CompiledPattern {
                on_path,
                invert,
                glob,
            });
        }
        Ok(Self { patterns: compiled })
    }

    /// Selects the test cases among the order's top-level entities.
    ///
    /// Candidates are visited in compile order, entities of one file in name
    /// order, so the result is deterministic.
    pub fn filter(&self, registry: &Registry, order: &CompileOrder) -> Vec<TestCase> {
        let mut cases = Vec::new();
        for &id in order.files() {
            if !order.is_top(id) {
                continue;
            }
            let file = registry.file(id);
            let path = file.path.display().to_string();
            for unit in &file.entity_defs {
                let mut include = false;
                for pattern in &self.patterns {
                    let target = if pattern.on_path { &path } else { unit };
                    if pattern.glob.matches(target) {
                        include = !pattern.invert;
                    }
                }
                if include {
                    cases.push(TestCase {
                        file: id,
                        unit: unit.clone(),
                    });
                }
            }
        }
        cases
    }
}
