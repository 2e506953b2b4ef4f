//! End-to-end runs of `modverify check` and the auxiliary commands.

mod common;

use common::TestWorkspace;
use serde_json::json;

const SAMPLE: &str = "class Foo { std::string name; };";

fn rule_config(extra: Option<serde_json::Value>) -> serde_json::Value {
    let mut rules = vec![
        json!({"name": "std::string usage", "kind": "must_match", "pattern": "std::string"}),
        json!({"name": "No malloc", "kind": "must_not_match", "pattern": "malloc"}),
    ];
    rules.extend(extra);
    json!({
        "schema_version": 1,
        "rule_sets": {
            "basic": {"target": "src/foo.cpp", "rules": rules}
        }
    })
}

#[test]
fn all_rules_pass() {
    let ws = TestWorkspace::new();
    ws.write_config(&rule_config(None));
    ws.write_file("src/foo.cpp", SAMPLE);
    let out = ws.run(&["check", "basic"]);
    assert_eq!(out.code, 0, "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(out.stdout.contains("✅ PASS"));
    assert!(out.stdout.ends_with("Results: 2/2 checks passed\n"));
}

#[test]
fn one_failing_rule_fails_the_run() {
    let ws = TestWorkspace::new();
    ws.write_config(&rule_config(Some(json!({
        "name": "std::function usage", "kind": "must_match", "pattern": "std::function"
    }))));
    ws.write_file("src/foo.cpp", SAMPLE);
    let out = ws.run(&["check", "basic"]);
    assert_eq!(out.code, 1);
    assert!(out.stdout.contains("std::function usage       ❌ FAIL"));
    assert!(out.stdout.contains("Results: 2/3 checks passed"));
}

#[test]
fn missing_target_exits_one_without_results() {
    let ws = TestWorkspace::new();
    ws.write_config(&rule_config(None));
    let out = ws.run(&["check", "basic"]);
    assert_eq!(out.code, 1);
    assert!(out.stderr.contains("Error: src/foo.cpp not found"), "{}", out.stderr);
    assert!(!out.stdout.contains("checks passed"));
}

#[test]
fn file_flag_overrides_target() {
    let ws = TestWorkspace::new();
    ws.write_config(&rule_config(None));
    ws.write_file("other.cpp", "void* p = malloc(4);");
    let out = ws.run(&["check", "basic", "--file", "other.cpp", "--json"]);
    assert_eq!(out.code, 1);
    let report: serde_json::Value = serde_json::from_str(&out.stdout).expect("json report");
    assert_eq!(report["target"], "other.cpp");
    assert_eq!(report["passed"], 0);
    assert_eq!(report["checks"][1]["name"], "No malloc");
}

#[test]
fn built_in_modernization_rules_apply_without_config() {
    let ws = TestWorkspace::new();
    ws.write_file(
        "jansson-cpp/src/load.cpp",
        "#include <memory>\nnamespace jansson {\nclass Stream { std::string s; std::vector<int> v; std::function<void()> f; constexpr static int n = 1; void g() { auto x = 1; } };\n}\n",
    );
    let out = ws.run(&["check"]);
    assert_eq!(out.code, 0, "stdout: {}\nstderr: {}", out.stdout, out.stderr);
    assert!(out.stdout.contains("Results: 10/10 checks passed"));
}

#[test]
fn init_writes_default_config_once() {
    let ws = TestWorkspace::new();
    let out = ws.run(&["init"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    let written: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(ws.join("modverify.json")).expect("read config"),
    )
    .expect("parse config");
    assert_eq!(written["schema_version"], 1);
    assert!(written["pipelines"]["coverage"].is_object());

    let again = ws.run(&["init"]);
    assert_eq!(again.code, 1);
    assert!(again.stderr.contains("use --force"));
    assert_eq!(ws.run(&["init", "--force"]).code, 0);
}

#[test]
fn list_shows_pipelines_and_rule_sets() {
    let ws = TestWorkspace::new();
    let out = ws.run(&["list"]);
    assert_eq!(out.code, 0);
    assert!(out.stdout.contains("Config: <built-in>"));
    assert!(out.stdout.contains("coverage"));
    assert!(out.stdout.contains("./jansson-cpp/src/load.cpp"));
}

#[cfg(target_os = "linux")]
#[test]
fn per_user_config_is_used_when_no_local_file() {
    let ws = TestWorkspace::new();
    let user_config = ws.user_config_dir().join("modverify/config.json");
    std::fs::create_dir_all(user_config.parent().expect("parent")).expect("create config dir");
    let config = json!({
        "schema_version": 1,
        "pipelines": {"from-user-dir": {"steps": [{"name": "a", "shell": "true"}]}}
    });
    std::fs::write(&user_config, config.to_string()).expect("write user config");

    let out = ws.run(&["list"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert!(out.stdout.contains("modverify/config.json"), "{}", out.stdout);
    assert!(out.stdout.contains("from-user-dir"));

    ws.write_config(&json!({
        "schema_version": 1,
        "pipelines": {"local": {"steps": [{"name": "a", "shell": "true"}]}}
    }));
    let out = ws.run(&["list"]);
    assert!(out.stdout.contains("Config: modverify.json"), "{}", out.stdout);
    assert!(!out.stdout.contains("from-user-dir"));
}

#[cfg(unix)]
#[test]
fn capture_version_writes_stdout() {
    let ws = TestWorkspace::new();
    let out = ws.run(&["capture-version", "--program", "echo", "--out", "version.txt"]);
    assert_eq!(out.code, 0, "stderr: {}", out.stderr);
    assert_eq!(
        std::fs::read_to_string(ws.join("version.txt")).expect("read"),
        "--version\n"
    );
}

#[test]
fn capture_version_failure_exits_one() {
    let ws = TestWorkspace::new();
    let out = ws.run(&["capture-version", "--program", "modverify-no-such-tool"]);
    assert_eq!(out.code, 1);
    assert!(!ws.join("test.txt").exists());
}

#[test]
fn doctor_flags_missing_programs() {
    let ws = TestWorkspace::new();
    ws.write_config(&json!({
        "schema_version": 1,
        "pipelines": {
            "p": {"steps": [
                {"name": "a", "argv": ["modverify-no-such-tool"]},
                {"name": "b", "shell": "./built_binary"}
            ]}
        }
    }));
    let out = ws.run(&["doctor", "p"]);
    assert_eq!(out.code, 1);
    assert!(out.stdout.contains("not found on PATH  [p/a]"));
    assert!(out.stdout.contains("built by pipeline  [p/b]"));
}
