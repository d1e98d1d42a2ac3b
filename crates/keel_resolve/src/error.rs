//! Error types for design-unit resolution and compile ordering.

use crate::unit::UnitRef;

fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("\n - {item}"))
        .collect::<String>()
}

/// Errors raised while resolving design units or assembling a compile order.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The referenced unit is not defined in any registered file.
    #[error("could not find {unit}")]
    Missing {
        /// The unit that was looked up.
        unit: UnitRef,
    },

    /// The referenced unit exists, but only in files the current policy
    /// filters out.
    #[error("{unit} is defined, but only in files that were filtered out: {}", .reasons.join(", "))]
    Filtered {
        /// The unit that was looked up.
        unit: UnitRef,
        /// One human-readable reason per rejected candidate.
        reasons: Vec<String>,
    },

    /// More than one accepted file defines the unit at the chosen version.
    #[error("{unit} is defined in multiple, ambiguous files:{}", bullet_list(.candidates))]
    Ambiguous {
        /// The unit that was looked up.
        unit: UnitRef,
        /// Paths of the competing definitions.
        candidates: Vec<String>,
    },

    /// A component instantiation has no matching component declaration.
    #[error("could not find component declaration for {component} within {}", .searched.join(", "))]
    MissingComponent {
        /// The instantiated component name.
        component: String,
        /// The files that were searched for a declaration.
        searched: Vec<String>,
    },

    /// A declared component has no entity definition and black boxes are not
    /// allowed for the declaring file.
    #[error("black box: {source}")]
    BlackBox {
        /// The underlying entity-resolution failure.
        #[source]
        source: Box<ResolveError>,
    },

    /// A cycle through strong dependency edges.
    #[error("circular dependency:{}", bullet_list(.files))]
    Cycle {
        /// The files forming the cycle, in dependency order.
        files: Vec<String>,
    },

    /// An entity or pattern glob could not be compiled.
    #[error("invalid pattern '{pattern}': {source}")]
    Pattern {
        /// The offending pattern text.
        pattern: String,
        /// The glob compilation failure.
        #[source]
        source: glob::PatternError,
    },

    /// Wraps a nested failure with the resolution site for diagnosis.
    #[error("while resolving {what} in {file}:\n{source}")]
    Context {
        /// What was being resolved, e.g. `entity work.foo`.
        what: String,
        /// The file whose dependencies were being resolved.
        file: String,
        /// The nested failure.
        #[source]
        source: Box<ResolveError>,
    },
}

impl ResolveError {
    /// Wraps this error with the resolution site.
    pub fn in_context(self, what: impl Into<String>, file: impl Into<String>) -> Self {
        ResolveError::Context {
            what: what.into(),
            file: file.into(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_display() {
        let err = ResolveError::Missing {
            unit: UnitRef::entity("work", "foo"),
        };
        assert_eq!(err.to_string(), "could not find entity work.foo");
    }

    #[test]
    fn filtered_display_lists_reasons() {
        let err = ResolveError::Filtered {
            unit: UnitRef::entity("work", "foo"),
            reasons: vec![
                "foo.syn.vhd is synthesis-only".to_string(),
                "foo.93.vhd is not compatible with VHDL 2008".to_string(),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with(
            "entity work.foo is defined, but only in files that were filtered out:"
        ));
        assert!(msg.contains("synthesis-only"));
        assert!(msg.contains("not compatible"));
    }

    #[test]
    fn ambiguous_display_lists_paths() {
        let err = ResolveError::Ambiguous {
            unit: UnitRef::entity("work", "test_tc"),
            candidates: vec!["/a/test_tc.vhd".to_string(), "/b/test_tc.vhd".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("is defined in multiple, ambiguous files:"));
        assert!(msg.contains("\n - /a/test_tc.vhd"));
        assert!(msg.contains("\n - /b/test_tc.vhd"));
    }

    #[test]
    fn context_display_nests() {
        let err = ResolveError::Missing {
            unit: UnitRef::package("work", "util_pkg"),
        }
        .in_context("package work.util_pkg", "/src/top.vhd");
        let msg = err.to_string();
        assert!(msg.starts_with("while resolving package work.util_pkg in /src/top.vhd:"));
        assert!(msg.contains("could not find package work.util_pkg"));
    }

    #[test]
    fn black_box_display() {
        let err = ResolveError::BlackBox {
            source: Box::new(ResolveError::Missing {
                unit: UnitRef::entity("work", "macro"),
            }),
        };
        assert_eq!(
            err.to_string(),
            "black box: could not find entity work.macro"
        );
    }

    #[test]
    fn cycle_display() {
        let err = ResolveError::Cycle {
            files: vec!["/a.vhd".to_string(), "/b.vhd".to_string()],
        };
        assert_eq!(err.to_string(), "circular dependency:\n - /a.vhd\n - /b.vhd");
    }
}
