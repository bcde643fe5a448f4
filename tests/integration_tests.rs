//! End-to-end audit runs over synthetic project trees.

mod common;

use std::fs;
use std::path::PathBuf;

use common::write_jar;
use shipcheck::prelude::*;

/// Lay down a minimal project: packaged lib dir with two jars sharing an
/// entry, one source root, one resolved dependency list.
fn scaffold_project(base: &std::path::Path) -> PathBuf {
    let lib = base.join("dist").join("WEB-INF").join("lib");
    fs::create_dir_all(&lib).unwrap();
    write_jar(&lib.join("x.jar"), &["a.class", "b.class"]);
    write_jar(&lib.join("y.jar"), &["a.class", "c.class"]);

    let src = base.join("src").join("main").join("java");
    fs::create_dir_all(&src).unwrap();
    fs::write(src.join("App.java"), "\nimport foo;\nint x=1;\n}\n").unwrap();

    let deps = base.join("resolved.json");
    fs::write(
        &deps,
        r#"[
            {"group": "g1", "artifact": "A", "version": "1.0"},
            {"group": "g2", "artifact": "A", "version": "2.0"},
            {"group": "g1", "artifact": "B", "version": "1.0"},
            {"group": "g9", "artifact": "bom", "version": "3.0", "type": "pom"}
        ]"#,
    )
    .unwrap();
    deps
}

#[test]
fn full_audit_reports_all_three_sections() {
    let tmp = tempfile::tempdir().unwrap();
    let deps_input = scaffold_project(tmp.path());

    let config = Config::default();
    let request = AuditRequest {
        base_dir: tmp.path().to_path_buf(),
        deps_input: Some(deps_input),
        lib_dir: None,
        verbose: false,
    };
    let mut findings = FindingsLog::disabled();
    let outcome = run(&config, &request, &mut findings).unwrap();

    // Dependencies: artifact A duplicated across groups, B and the pom not.
    let dependencies = outcome.dependencies.expect("dependency report");
    let groups: Vec<_> = dependencies.duplicate_groups().collect();
    assert_eq!(groups.len(), 1);
    let (artifact, members) = groups[0];
    assert_eq!(artifact, "A");
    assert_eq!(members.len(), 2);

    // Classes: a.class owned by both jars.
    let classes = outcome.classes.expect("class report");
    let dupes: Vec<_> = classes.duplicates().collect();
    assert_eq!(dupes.len(), 1);
    let (entry, owners) = &dupes[0];
    assert_eq!(*entry, "a.class");
    let owner_names: Vec<&str> = owners.iter().map(String::as_str).collect();
    assert_eq!(owner_names, vec!["x.jar", "y.jar"]);
    assert_eq!(classes.total_duplicate_entries(), 1);
    assert_eq!(classes.implicated_archives().len(), 2);

    // Census: the single source file is real=1, filler=3.
    let census = outcome.census.expect("census report");
    assert_eq!(census.roots.len(), 1);
    assert_eq!(census.roots[0].files, 1);
    assert_eq!(census.totals.real, 1);
    assert_eq!(census.totals.filler, 3);
    assert_eq!(census.totals.total(), 4);
}

#[test]
fn audit_is_idempotent_over_an_unchanged_tree() {
    let tmp = tempfile::tempdir().unwrap();
    let deps_input = scaffold_project(tmp.path());

    let config = Config::default();
    let request = AuditRequest {
        base_dir: tmp.path().to_path_buf(),
        deps_input: Some(deps_input),
        lib_dir: None,
        verbose: false,
    };

    let mut findings = FindingsLog::disabled();
    let first = run(&config, &request, &mut findings).unwrap();
    let second = run(&config, &request, &mut findings).unwrap();

    assert_eq!(first.dependencies, second.dependencies);
    assert_eq!(first.classes, second.classes);
    assert_eq!(first.census, second.census);
}

#[test]
fn audit_without_inputs_is_all_quiet() {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::default();
    let request = AuditRequest {
        base_dir: tmp.path().to_path_buf(),
        ..AuditRequest::default()
    };
    let mut findings = FindingsLog::disabled();
    let outcome = run(&config, &request, &mut findings).unwrap();

    assert!(outcome.dependencies.is_none());
    assert!(!outcome.classes.expect("class report").has_duplicates());
    assert!(outcome.census.expect("census report").roots.is_empty());
}

#[test]
fn lib_dir_override_points_the_class_scan_elsewhere() {
    let tmp = tempfile::tempdir().unwrap();
    let alt = tmp.path().join("build").join("libs");
    fs::create_dir_all(&alt).unwrap();
    write_jar(&alt.join("one.jar"), &["dup.class"]);
    write_jar(&alt.join("two.jar"), &["dup.class"]);

    let config = Config::default();
    let request = AuditRequest {
        base_dir: tmp.path().to_path_buf(),
        lib_dir: Some(PathBuf::from("build/libs")),
        ..AuditRequest::default()
    };
    let mut findings = FindingsLog::disabled();
    let outcome = run(&config, &request, &mut findings).unwrap();

    let classes = outcome.classes.expect("class report");
    assert_eq!(classes.total_duplicate_entries(), 1);
}

#[test]
fn findings_log_captures_duplicate_events() {
    let tmp = tempfile::tempdir().unwrap();
    let deps_input = scaffold_project(tmp.path());
    let log_path = tmp.path().join("findings.jsonl");

    let config = Config::default();
    let request = AuditRequest {
        base_dir: tmp.path().to_path_buf(),
        deps_input: Some(deps_input),
        lib_dir: None,
        verbose: false,
    };
    let mut findings = FindingsLog::open(&log_path);
    run(&config, &request, &mut findings).unwrap();
    findings.flush();

    let raw = fs::read_to_string(&log_path).unwrap();
    let events: Vec<serde_json::Value> = raw
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    let kinds: Vec<&str> = events
        .iter()
        .map(|e| e["event"].as_str().unwrap())
        .collect();
    assert!(kinds.contains(&"audit_start"));
    assert!(kinds.contains(&"duplicate_dependency"));
    assert!(kinds.contains(&"duplicate_class"));
    assert!(kinds.contains(&"census_root"));
    assert!(kinds.contains(&"audit_complete"));
}
