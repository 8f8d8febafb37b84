use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_fault-sieve")
}

fn write_file(path: &Path, content: &str) {
    fs::write(path, content).expect("failed to write test file");
}

fn run(args: &[&str]) -> Output {
    Command::new(bin())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("FAULT_SIEVE_CONFIG")
        .output()
        .expect("failed to run fault-sieve")
}

const RULES: &str = r#"{
    filter: [
        { name: "not-found", test: { equal: { binding: "HttpStatusCode", value: 404 } } },
        { name: "quiet-tests", channel: ["email"], test: { equal: { binding: "BaseException.Type", value: "TestException" } } },
    ],
}"#;

fn error_json(type_name: &str, status: u16, timestamp: &str) -> String {
    format!(
        r#"{{
            "exception": {{ "type_name": "{type_name}", "message": "{type_name} raised" }},
            "request": {{ "method": "GET", "path": "/checkout", "url": "/checkout" }},
            "status_code": {status},
            "timestamp": "{timestamp}"
        }}"#
    )
}

#[test]
fn test_check_lists_compiled_filters() {
    let dir = tempdir().expect("temp dir");
    let rules = dir.path().join("rules.json5");
    write_file(&rules, RULES);

    let output = run(&["-F", "json", "check", rules.to_str().expect("utf8 path")]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    let filters = json["filters"].as_array().expect("filters array");
    assert_eq!(filters.len(), 2);
    assert_eq!(filters[0]["name"], "not-found");
    assert_eq!(filters[1]["channels"][0], "email");
}

#[test]
fn test_check_reports_offending_entry() {
    let dir = tempdir().expect("temp dir");
    let rules = dir.path().join("rules.json5");
    write_file(
        &rules,
        r#"{ filter: [{ test: { true: {} } }, { test: { equal: { binding: "Nope", value: 1 } } }] }"#,
    );

    let output = run(&["check", rules.to_str().expect("utf8 path")]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("filter[1].test.equal"), "{stderr}");
}

#[test]
fn test_evaluate_prints_verdict_without_store() {
    let dir = tempdir().expect("temp dir");
    let rules = dir.path().join("rules.json5");
    let error = dir.path().join("error.json");
    write_file(&rules, RULES);
    write_file(&error, &error_json("TestException", 500, "2025-04-01T10:00:00Z"));

    let output = run(&[
        "evaluate",
        "--rules",
        rules.to_str().expect("utf8 path"),
        error.to_str().expect("utf8 path"),
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(json["suppress_recording"], false);
    assert_eq!(json["suppressed_channels"][0], "email");
}

#[test]
fn test_capture_then_list_and_show() {
    let dir = tempdir().expect("temp dir");
    let rules = dir.path().join("rules.json5");
    let store = dir.path().join("errors.jsonl");
    let config = dir.path().join("sieve.toml");
    write_file(&rules, RULES);
    write_file(
        &config,
        &format!(
            "application = \"shop\"\nhost = \"web-01\"\nrules = {:?}\nnotifiers = []\n\n[store]\nkind = \"file\"\npath = {:?}\n",
            rules.display().to_string(),
            store.display().to_string()
        ),
    );

    let captures = [
        ("TimeoutException", 504, "2025-04-01T10:00:00Z"),
        ("HttpException", 404, "2025-04-01T10:01:00Z"),
        ("TestException", 500, "2025-04-01T10:02:00Z"),
        ("TimeoutException", 504, "2025-04-02T09:00:00Z"),
    ];
    for (index, (type_name, status, timestamp)) in captures.iter().enumerate() {
        let error = dir.path().join(format!("error-{index}.json"));
        write_file(&error, &error_json(type_name, *status, timestamp));
        let output = run(&[
            "-c",
            config.to_str().expect("utf8 path"),
            "capture",
            error.to_str().expect("utf8 path"),
        ]);
        assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    }

    let output = run(&[
        "-c",
        config.to_str().expect("utf8 path"),
        "-F",
        "json",
        "list",
        "-f",
        "type = TimeoutException",
        "-n",
        "1",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(page["total"], 2);
    let records = page["records"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["error"]["host"], "web-01");
    let id = records[0]["id"].as_str().expect("id").to_string();

    let output = run(&["list", "--store", store.to_str().expect("utf8 path"), "-F", "json"]);
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(page["total"], 3, "404 is dismissed and never stored");

    let output = run(&[
        "list",
        "--store",
        store.to_str().expect("utf8 path"),
        "-f",
        "time = 2025-04-01",
        "-f",
        "garbage",
        "-F",
        "json",
    ]);
    let page: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json output");
    assert_eq!(page["total"], 2);

    let output = run(&["show", "-s", store.to_str().expect("utf8 path"), &id]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("TimeoutException"));
    assert!(stdout.contains("GET /checkout"));
}

#[test]
fn test_show_unknown_id_fails() {
    let dir = tempdir().expect("temp dir");
    let store = dir.path().join("errors.jsonl");

    let output = run(&[
        "show",
        "--store",
        store.to_str().expect("utf8 path"),
        "00000000-0000-4000-8000-000000000000",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No stored error"));

    let output = run(&["show", "--store", store.to_str().expect("utf8 path"), "not-a-uuid"]);
    assert!(!output.status.success());
}
