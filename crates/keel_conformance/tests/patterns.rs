//! Test-case pattern filtering over realistic fixture trees.

use keel_conformance::{analyze_project, Project};

fn entity(name: &str) -> String {
    format!("entity {name} is end entity;")
}

fn tc_project() -> Project {
    let project = Project::new();
    project.file("foo_tc.vhd", &entity("foo_tc"));
    project.file("bar_tc.vhd", &entity("bar_tc"));
    project.file("baz.vhd", &entity("baz"));
    project
}

#[test]
fn default_pattern_selects_tc_suffix_only() {
    let project = tc_project();
    let units = analyze_project(&project).test_case_units(&[], &[]).unwrap();
    assert_eq!(units, vec!["bar_tc", "foo_tc"]);
}

#[test]
fn positive_name_patterns() {
    let project = tc_project();
    let units = analyze_project(&project)
        .test_case_units(&[], &["foo_tc", "baz"])
        .unwrap();
    assert_eq!(units, vec!["baz", "foo_tc"]);
}

#[test]
fn negative_name_pattern_excludes_matches() {
    let project = tc_project();
    let units = analyze_project(&project)
        .test_case_units(&[], &["*_tc", "!foo*"])
        .unwrap();
    assert_eq!(units, vec!["bar_tc"]);
}

#[test]
fn filename_patterns_match_the_path() {
    let project = tc_project();
    let units = analyze_project(&project)
        .test_case_units(&[], &[":*_tc.vhd", "baz"])
        .unwrap();
    assert_eq!(units, vec!["bar_tc", "baz", "foo_tc"]);
}

#[test]
fn negative_filename_pattern() {
    let project = tc_project();
    let units = analyze_project(&project)
        .test_case_units(&[], &[":*.vhd", ":!*baz.vhd"])
        .unwrap();
    assert_eq!(units, vec!["bar_tc", "foo_tc"]);
}

#[test]
fn multiple_test_cases_in_one_file_are_selectable() {
    let project = Project::new();
    project.file(
        "test_tc.vhd",
        "entity foo_tc is end entity;\nentity bar_tc is end entity;\n\
         entity baz is end entity;",
    );
    let units = analyze_project(&project).test_case_units(&[], &[]).unwrap();
    assert_eq!(units, vec!["bar_tc", "foo_tc"]);
}

#[test]
fn vsim_script_lists_only_selected_cases() {
    let project = Project::new();
    project.file(
        "foo_tc.vhd",
        "-- pragma simulation timeout 2 ms\nentity foo_tc is end entity;",
    );
    project.file("helper.vhd", &entity("helper"));
    let script = analyze_project(&project).vsim_script(&[]).unwrap();
    assert!(script.contains("add_test work foo_tc "));
    assert!(script.contains("\"2 ms\""));
    assert!(!script.contains("add_test work helper"));
    // Every ordered file is compiled regardless of selection.
    assert!(script.contains("foo_tc.vhd"));
    assert!(script.contains("helper.vhd"));
}
