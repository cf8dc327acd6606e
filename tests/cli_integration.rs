//! CLI Integration Tests
//!
//! Tests the resrun binary end-to-end against real resource files.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get the binary to test, rooted in the given directory.
fn resrun(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("resrun").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

/// A workspace with a `resources.yaml` of the given content.
fn workspace(resources_yaml: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("resources.yaml").write_str(resources_yaml).unwrap();
    dir
}

const LINEAR_GRAPH: &str = r#"
resources:
  - id: a
    name: A
    desc: first of the chain
    category: demo
    requires: [b]
  - id: b
    name: B
    desc: middle of the chain
    category: demo
    requires: [c]
  - id: c
    name: C
    desc: leaf of the chain
    category: other
"#;

// ============================================================================
// Usage & Help
// ============================================================================

#[test]
fn test_no_arguments_prints_usage() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir).assert().success().stdout(predicate::str::contains("Usage: resrun"));
}

#[test]
fn test_help_flag() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resource-graph runner"));
}

#[test]
fn test_version_flag() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_subcommand_without_ids_prints_usage() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .arg("depends")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: resrun"));
}

// ============================================================================
// Dependency listings (spec scenarios 1, 2, 5)
// ============================================================================

#[test]
fn test_depends_lists_transitive_paths() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["depends", "a"])
        .assert()
        .success()
        .stdout(predicate::eq("a\na -> b\na -> b -> c\n"));
}

#[test]
fn test_tree_list_is_leaves_first() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["tree-list", "a"])
        .assert()
        .success()
        .stdout(predicate::eq("c\nb\na\n"));
}

#[test]
fn test_rdepends_lists_dependents() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["rdepends", "c"])
        .assert()
        .success()
        .stdout(predicate::eq("c\nc -> b\nc -> b -> a\n"));
}

#[test]
fn test_tree_prints_bottom_up_chain() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["tree", "a"])
        .assert()
        .success()
        .stdout(predicate::eq("a <- b <- c\n"));
}

#[test]
fn test_cyclic_graph_terminates() {
    let dir = workspace(
        r#"
resources:
  - id: a
    requires: [c]
  - id: b
    requires: [a]
  - id: c
    requires: [b]
"#,
    );

    resrun(&dir)
        .args(["depends", "a"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .success()
        .stdout(predicate::eq("a\na -> c\na -> c -> b\n"));
}

// ============================================================================
// Show / Index / Category / Search
// ============================================================================

#[test]
fn test_show_prints_entry_block() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["show", "a"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 Id: a"))
        .stdout(predicate::str::contains("📛 Name: A"))
        .stdout(predicate::str::contains("🔗 Requirements: [b]"));
}

#[test]
fn test_show_unknown_id_fails() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir).args(["show", "missing"]).assert().failure();
}

#[test]
fn test_index_lists_every_resource() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 Id: a"))
        .stdout(predicate::str::contains("📦 Id: b"))
        .stdout(predicate::str::contains("📦 Id: c"))
        .stdout(predicate::str::contains("---"));
}

#[test]
fn test_category_lists_members() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["category", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 a"))
        .stdout(predicate::str::contains("📦 b"))
        .stdout(predicate::str::contains("📦 c").not());
}

#[test]
fn test_search_finds_by_description() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir)
        .args(["search", "leaf"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 Id: c"));
}

#[test]
fn test_search_zero_matches_fails() {
    let dir = workspace(LINEAR_GRAPH);
    resrun(&dir).args(["search", "zzzqqqxxx"]).assert().failure();
}

#[test]
fn test_search_restricted_to_field() {
    let dir = workspace(LINEAR_GRAPH);
    // "leaf" appears only in c's desc; an id-only search finds nothing.
    resrun(&dir).args(["search", "leaf", "id"]).assert().failure();
}

// ============================================================================
// Document merging (spec scenario 6)
// ============================================================================

#[test]
fn test_double_load_appends_and_last_write_wins() {
    let dir = TempDir::new().unwrap();
    dir.child("one.yaml")
        .write_str("resources:\n  - id: r1\n    requires: [r2]\n")
        .unwrap();
    dir.child("two.yaml")
        .write_str("resources:\n  - id: r1\n    requires: [r3]\n")
        .unwrap();

    // r1 is listed twice.
    resrun(&dir)
        .args(["--file", "one.yaml", "--file", "two.yaml", "index"])
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 Id: r1").count(2));

    // The dependency map keeps the last-loaded requires.
    resrun(&dir)
        .args(["--file", "one.yaml", "--file", "two.yaml", "depends", "r1"])
        .assert()
        .success()
        .stdout(predicate::eq("r1\nr1 -> r3\n"));
}

#[test]
fn test_missing_resource_file_fails() {
    let dir = TempDir::new().unwrap();
    resrun(&dir).args(["index"]).assert().failure();
}

#[test]
fn test_config_file_names_resources() {
    let dir = TempDir::new().unwrap();
    dir.child("custom.yaml").write_str("resources:\n  - id: from-config\n").unwrap();
    dir.child("resrun.yaml").write_str("resources:\n  - custom.yaml\n").unwrap();

    resrun(&dir)
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("📦 Id: from-config"));
}

// ============================================================================
// Run engine (spec scenario 4 and ordering)
// ============================================================================

#[test]
fn test_run_executes_steps_in_dependency_order() {
    let dir = workspace(
        r#"
resources:
  - id: app
    requires: [base]
    run:
      - name: app-step
        exec: echo app-step-output
        check: ["base-step-output", "app-step-output", "0"]
  - id: base
    run:
      - name: base-step
        exec: echo base-step-output
"#,
    );

    resrun(&dir)
        .args(["run", "app"])
        .assert()
        .success()
        .stdout(predicate::str::contains("base-step-output"))
        .stdout(predicate::str::contains("app-step-output"));
}

#[test]
fn test_run_skip_suppresses_execution() {
    let dir = workspace(
        r#"
resources:
  - id: guarded
    run:
      - name: touch-marker
        exec: touch skip_marker
        skip: ["ENV:SKIPME"]
"#,
    );

    resrun(&dir)
        .args(["run", "guarded"])
        .env("SKIPME", "1")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step skipped."));
    dir.child("skip_marker").assert(predicate::path::missing());
}

#[test]
fn test_run_without_skip_env_executes() {
    let dir = workspace(
        r#"
resources:
  - id: guarded
    run:
      - name: touch-marker
        exec: touch skip_marker
        skip: ["ENV:SKIPME"]
"#,
    );

    resrun(&dir)
        .args(["run", "guarded"])
        .env_remove("SKIPME")
        .assert()
        .success()
        .stdout(predicate::str::contains("Step skipped.").not());
    dir.child("skip_marker").assert(predicate::path::exists());
}

#[test]
fn test_run_nonzero_exit_fails() {
    let dir = workspace(
        r#"
resources:
  - id: broken
    run:
      - name: boom
        exec: exit 9
"#,
    );

    resrun(&dir).args(["run", "broken"]).assert().failure();
}

#[test]
fn test_run_failed_expect_fails() {
    let dir = workspace(
        r#"
resources:
  - id: wrong
    run:
      - name: speak
        exec: echo actual-output
        expect: ["text-that-never-appears"]
"#,
    );

    resrun(&dir).args(["run", "wrong"]).assert().failure();
}

#[test]
fn test_run_expect_sees_env_file_exports() {
    let dir = workspace(
        r#"
resources:
  - id: exporter
    run:
      - name: export-var
        exec: echo EXPORTED_BY_STEP=yes >> ${RUNNER_ENV}
        expect: ["ENV:EXPORTED_BY_STEP", "0"]
"#,
    );

    resrun(&dir).args(["run", "exporter"]).env_remove("EXPORTED_BY_STEP").assert().success();
}

#[test]
fn test_run_step_env_declarations() {
    let dir = workspace(
        r#"
resources:
  - id: enved
    run:
      - name: greet
        exec: echo greeting=${GREETING}
        env:
          - { name: GREETING, value: hello-from-env }
        check: ["greeting=hello-from-env"]
"#,
    );

    resrun(&dir).args(["run", "enved"]).assert().success();
}

#[test]
fn test_run_params_reach_commands() {
    let dir = workspace(
        r#"
resources:
  - id: parameterised
    run:
      - name: use-params
        exec: echo first=${RUNNER_PARAMS1} second=${RUNNER_PARAMS2}
        check: ["first=alpha second=beta"]
"#,
    );

    resrun(&dir)
        .args(["--params", "alpha;beta", "run", "parameterised"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first=alpha second=beta"));
}

#[test]
fn test_run_negated_rules() {
    let dir = workspace(
        r#"
resources:
  - id: negated
    run:
      - name: quiet
        exec: echo calm-output
        check: ["!explosion", "calm-output", "!1"]
"#,
    );

    resrun(&dir).args(["run", "negated"]).assert().success();
}

#[test]
fn test_run_grouped_expect_rules() {
    let dir = workspace(
        r#"
resources:
  - id: grouped
    run:
      - name: speak
        exec: echo grouped-output
        expect:
          - "0"
          - expect: ["grouped-output", "!missing-text"]
"#,
    );

    resrun(&dir).args(["run", "grouped"]).assert().success();
}

#[test]
fn test_run_rule_only_step_without_exec() {
    let dir = workspace(
        r#"
resources:
  - id: ruleonly
    run:
      - name: produce
        exec: echo produced-text
      - name: verify
        check: ["produced-text"]
"#,
    );

    resrun(&dir).args(["run", "ruleonly"]).assert().success();
}
