//! End-to-end tests driving the built `formwork` binary over temp
//! directories.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::tempdir;

fn formwork_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_formwork"))
}

fn run_formwork(args: &[&str]) -> Output {
    Command::new(formwork_bin())
        .args(args)
        .output()
        .expect("run formwork")
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn instances_run_rewrites_only_changed_files() {
    let dir = tempdir().unwrap();
    let dashed_path = dir.path().join("dashed.json");
    fs::write(
        &dashed_path,
        serde_json::to_vec(&json!({
            "parameterValues": { "user-name": "Ada" },
            "template": {
                "template": "Hello {{user-name}}",
                "parameterInfos": { "user-name": { "id": "user-name" } },
            },
        }))
        .unwrap(),
    )
    .unwrap();

    // Already migrated, stored pretty-printed; the run must compare values
    // and leave the bytes alone.
    let clean_path = dir.path().join("clean.json");
    fs::write(
        &clean_path,
        serde_json::to_string_pretty(&json!({
            "parameterValues": {},
            "template": { "template": "static", "parameterInfos": {} },
        }))
        .unwrap(),
    )
    .unwrap();
    let clean_before = fs::read(&clean_path).unwrap();

    let output = run_formwork(&[
        "instances",
        "0.7.0-to-0.8.0",
        dir.path().to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "formwork failed: {}",
        stderr_text(&output)
    );
    let log = stdout_text(&output);
    assert!(log.contains("Processing"), "log: {log}");
    assert!(log.contains("Overwriting"), "log: {log}");
    assert!(log.contains("2 instances seen, 1 rewritten"), "log: {log}");

    let rewritten = fs::read_to_string(&dashed_path).unwrap();
    assert_eq!(
        rewritten,
        r#"{"parameterValues":{"user_name":"Ada"},"template":{"parameterInfos":{"user_name":{"id":"user_name"}},"template":"Hello {{user_name}}"}}"#
    );
    assert_eq!(fs::read(&clean_path).unwrap(), clean_before);
}

#[test]
fn templates_run_writes_config_and_body_independently() {
    let dir = tempdir().unwrap();
    let template_dir = dir.path().join("web-server");
    fs::create_dir(&template_dir).unwrap();
    fs::write(
        template_dir.join("template.json"),
        "start {{instance-count}}",
    )
    .unwrap();
    fs::write(
        template_dir.join("template.conf"),
        "parameters {\n  instance-count {\n    type = \"int\"\n  }\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("README"), "not a template").unwrap();

    let output = run_formwork(&[
        "templates",
        "0.7.0-to-0.8.0",
        dir.path().to_str().unwrap(),
        "raw",
        "json",
    ]);
    assert!(
        output.status.success(),
        "formwork failed: {}",
        stderr_text(&output)
    );
    let log = stdout_text(&output);
    assert!(log.contains("Skipping"), "log: {log}");
    assert!(log.contains("was not a directory"), "log: {log}");
    assert!(
        log.contains("1 templates seen, 1 configs rewritten, 1 bodies rewritten, 1 entries skipped"),
        "log: {log}"
    );

    assert_eq!(
        fs::read_to_string(template_dir.join("template.json")).unwrap(),
        "start {{instance_count}}"
    );
    let config_text = fs::read_to_string(template_dir.join("template.conf")).unwrap();
    let config: Value = serde_json::from_str(&config_text).unwrap();
    assert_eq!(
        config,
        json!({
            "parameters": {
                "instance_count": { "id": "instance_count", "type": "int" },
            },
        })
    );
}

#[test]
fn template_type_wrap_writes_hocon() {
    let dir = tempdir().unwrap();
    let template_dir = dir.path().join("worker");
    fs::create_dir(&template_dir).unwrap();
    fs::write(template_dir.join("template.json"), "run {{task}}").unwrap();
    fs::write(
        template_dir.join("template.conf"),
        "parameters {\n  task {\n    type = \"string\"\n  }\n}\n",
    )
    .unwrap();

    let output = run_formwork(&[
        "templates",
        "0.9.0-to-0.9.1",
        dir.path().to_str().unwrap(),
        "hocon",
    ]);
    assert!(
        output.status.success(),
        "formwork failed: {}",
        stderr_text(&output)
    );
    assert!(
        stdout_text(&output)
            .contains("1 templates seen, 1 configs rewritten, 0 bodies rewritten, 0 entries skipped")
    );

    assert_eq!(
        fs::read_to_string(template_dir.join("template.conf")).unwrap(),
        "parameters {\n  task {\n    type {\n      name = \"string\"\n    }\n  }\n}\n"
    );
    assert_eq!(
        fs::read_to_string(template_dir.join("template.json")).unwrap(),
        "run {{task}}"
    );
}

#[test]
fn instance_chain_applies_every_step() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.json");
    fs::write(
        &path,
        serde_json::to_vec(&json!({
            "parameterValues": { "user-name": "Ada" },
            "template": { "template": "Hello {{user-name}}", "parameterInfos": {} },
        }))
        .unwrap(),
    )
    .unwrap();

    let output = run_formwork(&[
        "instances",
        "chain",
        dir.path().to_str().unwrap(),
        "--from",
        "0.7.0",
        "--parameter-type",
        "raw",
    ]);
    assert!(
        output.status.success(),
        "formwork failed: {}",
        stderr_text(&output)
    );

    let migrated: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(
        migrated,
        json!({
            "parameterValues": { "user_name": "Ada" },
            "template": {
                "template": "Hello {{user_name}}",
                "parameterInfos": {
                    "user_name": { "id": "user_name", "type": { "name": "raw" } },
                },
            },
        })
    );
}

#[test]
fn chain_without_type_tag_fails_before_touching_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("job.json");
    fs::write(
        &path,
        serde_json::to_vec(&json!({
            "parameterValues": {},
            "template": { "template": "{{x}}", "parameterInfos": {} },
        }))
        .unwrap(),
    )
    .unwrap();
    let before = fs::read(&path).unwrap();

    let output = run_formwork(&[
        "instances",
        "chain",
        dir.path().to_str().unwrap(),
        "--from",
        "0.7.0",
    ]);
    assert!(!output.status.success());
    assert!(
        stderr_text(&output).contains("instances-0.7.0-to-0.8.0-add-types"),
        "stderr: {}",
        stderr_text(&output)
    );
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn list_names_every_transition() {
    let output = run_formwork(&["list"]);
    assert!(
        output.status.success(),
        "formwork failed: {}",
        stderr_text(&output)
    );
    let log = stdout_text(&output);
    for name in [
        "instances-0.7.0-to-0.8.0",
        "instances-0.7.0-to-0.8.0-add-types",
        "instances-0.9.0-to-0.9.1",
        "templates-0.7.0-to-0.8.0",
        "templates-0.9.0-to-0.9.1",
    ] {
        assert!(log.contains(name), "missing {name} in: {log}");
    }
    assert!(log.contains("needs a parameter type"), "log: {log}");
}
