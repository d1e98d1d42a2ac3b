//! Precompiled pattern tables for the extractor.
//!
//! All patterns operate on lowercased text. Definition and usage patterns run
//! on comment-stripped text; the pragma patterns run on the raw source so
//! they can see inside comments.

use std::sync::OnceLock;

use regex::Regex;

/// The compiled scanner patterns, built once per process.
pub struct PatternTable {
    /// `entity IDENT is`
    pub entity_def: Regex,
    /// `: entity [LIB.]NAME` followed by `(`, `;`, `port`, or `generic`.
    pub entity_use: Regex,
    /// `component IDENT is`
    pub component_def: Regex,
    /// `: [component] IDENT port map` / `: [component] IDENT generic map`
    pub component_use: Regex,
    /// `package IDENT is`
    pub package_def: Regex,
    /// `use LIB.NAME[.suffix]`
    pub package_use: Regex,
    /// `-- pragma simulation timeout NUMBER [pnum]?s`
    pub timeout_pragma: Regex,
    /// `-- pragma vhdeps ignore {entity|component|package} NAME`
    pub ignore_pragma: Regex,
}

/// Returns the process-wide pattern table.
pub fn table() -> &'static PatternTable {
    static TABLE: OnceLock<PatternTable> = OnceLock::new();
    TABLE.get_or_init(|| {
        let compile = |pattern: &str| {
            Regex::new(pattern).unwrap_or_else(|e| panic!("bad builtin pattern {pattern}: {e}"))
        };
        PatternTable {
            entity_def: compile(r"\bentity\s+([a-z][a-z0-9_]*)\s+is\b"),
            entity_use: compile(
                r":\s*entity\s+(?:([a-z][a-z0-9_]*)\.)?([a-z][a-z0-9_]*)\s*(?:\(|;|port\b|generic\b)",
            ),
            component_def: compile(r"\bcomponent\s+([a-z][a-z0-9_]*)\s+is\b"),
            component_use: compile(
                r":\s*(?:component\s+)?([a-z][a-z0-9_]*)\s+(?:port|generic)\s+map\b",
            ),
            package_def: compile(r"\bpackage\s+([a-z][a-z0-9_]*)\s+is\b"),
            package_use: compile(r"\buse\s+([a-z][a-z0-9_]*)\.([a-z][a-z0-9_]*)"),
            timeout_pragma: compile(
                r"--\s*pragma\s+simulation\s+timeout\s+([0-9]+(?:\.[0-9]*)?\s+[pnum]?s)\b",
            ),
            ignore_pragma: compile(
                r"--\s*pragma\s+vhdeps\s+ignore\s+(entity|component|package)\s+([a-z][a-z0-9_]*)",
            ),
        }
    })
}
