//! Generic compile-order dump backend.
//!
//! Writes one line per file in compile order:
//! `{role} {library} {version} {absolute-path}` with `role` being `top` for
//! top-level files and `dep` for everything else.

use keel_resolve::{CompileOrder, Registry};

use crate::error::TargetError;
use crate::sink::OutputSink;

/// Writes the compile order to the sink. Always succeeds with exit code 0.
pub fn run(
    registry: &Registry,
    order: &CompileOrder,
    sink: &OutputSink,
) -> Result<i32, TargetError> {
    for &id in order.files() {
        let file = registry.file(id);
        let role = if order.is_top(id) { "top" } else { "dep" };
        sink.write_str(&format!(
            "{role} {} {} {}\n",
            file.library,
            file.version,
            file.path.display()
        ))?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_resolve::{compile_order, Analysis, Mode};
    use keel_vhdl::{ExtractOptions, VhdlFile};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn dump_lines_follow_the_format() {
        let dir = TempDir::new().unwrap();
        let mut registry = Registry::new(Mode::Simulation, None, None);
        for (name, contents) in [
            ("util_pkg.vhd", "package util_pkg is\nend package;".to_string()),
            (
                "top_tc.vhd",
                "use work.util_pkg.all;\nentity top_tc is end entity;".to_string(),
            ),
        ] {
            let path = dir.path().join(name);
            fs::write(&path, contents).unwrap();
            registry.insert(VhdlFile::parse(&path, ExtractOptions::default()).unwrap());
        }
        let mut analysis = Analysis::new(&registry);
        let order = compile_order(&mut analysis, &[]).unwrap();
        let (sink, handle) = OutputSink::memory();
        let code = run(&registry, &order, &sink).unwrap();
        assert_eq!(code, 0);

        let contents = handle.contents();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("dep work 2008 "));
        assert!(lines[0].ends_with("util_pkg.vhd"));
        assert!(lines[1].starts_with("top work 2008 "));
        assert!(lines[1].ends_with("top_tc.vhd"));
    }
}
