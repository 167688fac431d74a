//! End-to-end tests for the data-handling commands.

mod common;

use std::fs;

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;

use common::TestEnv;

// ============================================================================
// BOOTSTRAP
// ============================================================================

#[test]
fn test_bootstrap_set_then_get() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "DATABASE_URL", "postgres://localhost/x"])
        .assert()
        .success();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["get", "DATABASE_URL"])
        .assert()
        .success()
        .stdout("postgres://localhost/x\n");
}

#[test]
fn test_get_missing_variable_fails() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["get", "NOPE"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found in 'default'"));
}

#[test]
fn test_get_json_format() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "PORT", "8080"])
        .assert()
        .success();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["get", "PORT", "--format", "json"])
        .assert()
        .success()
        .stdout("{\"PORT\":\"8080\"}\n");
}

#[test]
fn test_init_config_requires_force_to_overwrite() {
    let env = TestEnv::new();
    let (_, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["init", "config", "--path"])
        .arg(&config)
        .args(["--recipients", &format!("a={public_key}")])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_init_config_rejects_private_key_material() {
    let env = TestEnv::new();
    env.kiln()
        .args([
            "init",
            "config",
            "--recipients",
            "a=AGE-SECRET-KEY-1QQPHG6EGHQ3RUPU4KSQ8LQYD2DSDE75WMVRV3KWEX52FSZDDS3SS3MDCPL",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("private key"));
}

// ============================================================================
// EXPORT
// ============================================================================

#[test]
fn test_export_shell_sorted() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    for (name, value) in [("DATABASE_URL", "postgres://localhost/x"), ("PORT", "8080")] {
        env.kiln()
            .args(["--config"])
            .arg(&config)
            .args(["--key"])
            .arg(&key)
            .args(["set", name, value])
            .assert()
            .success();
    }

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["export", "--format", "shell"])
        .assert()
        .success()
        .stdout("export DATABASE_URL='postgres://localhost/x'\nexport PORT='8080'\n");
}

#[test]
fn test_export_json_and_yaml() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "NAME", "kiln"])
        .assert()
        .success();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["export", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"NAME\": \"kiln\""));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["export", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("NAME: kiln"));
}

#[test]
fn test_export_empty_file_is_empty() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["export"])
        .assert()
        .success()
        .stdout("");
}

// ============================================================================
// SET --from-file
// ============================================================================

#[test]
fn test_set_from_json_merges_with_existing() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "KEEP", "original"])
        .assert()
        .success();

    let json_path = env.path().join("vars.json");
    fs::write(
        &json_path,
        r#"{"COUNT": 3, "RATIO": 2.5, "FLAG": true, "BLANK": null, "NAME": "x"}"#,
    )
    .unwrap();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "--from-file"])
        .arg(&json_path)
        .assert()
        .success();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["export", "--format", "shell"])
        .assert()
        .success()
        .stdout(
            "export BLANK=''\nexport COUNT='3'\nexport FLAG='true'\n\
             export KEEP='original'\nexport NAME='x'\nexport RATIO='2.5'\n",
        );
}

#[test]
fn test_set_from_json_rejects_arrays() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    let json_path = env.path().join("vars.json");
    fs::write(&json_path, r#"{"LIST": [1, 2]}"#).unwrap();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "--from-file"])
        .arg(&json_path)
        .assert()
        .failure()
        .code(1);
}

// ============================================================================
// APPLY
// ============================================================================

#[test]
fn test_apply_strict_and_lenient() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "A", "1"])
        .assert()
        .success();

    let template = env.path().join("app.tmpl");
    fs::write(&template, "a=${A} b=${B}").unwrap();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .arg("apply")
        .arg(&template)
        .arg("--strict")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("missing variables: B"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .arg("apply")
        .arg(&template)
        .assert()
        .success()
        .stdout("a=1 b=${B}");
}

#[test]
fn test_apply_writes_output_file() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "HOST", "db.local"])
        .assert()
        .success();

    let template = env.path().join("conf.tmpl");
    fs::write(&template, "host: ${HOST}\n").unwrap();
    let output = env.path().join("conf.out");

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .arg("apply")
        .arg(&template)
        .args(["--output"])
        .arg(&output)
        .assert()
        .success();

    assert_eq!(fs::read_to_string(&output).unwrap(), "host: db.local\n");
}

#[test]
fn test_apply_custom_delimiters() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "NAME", "kiln"])
        .assert()
        .success();

    let template = env.path().join("t.tmpl");
    fs::write(&template, "hello {{ NAME }}").unwrap();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .arg("apply")
        .arg(&template)
        .args(["--left-delimiter", "{{", "--right-delimiter", "}}"])
        .assert()
        .success()
        .stdout("hello kiln");
}

// ============================================================================
// INFO
// ============================================================================

#[test]
fn test_info_and_verify() {
    let env = TestEnv::new();
    let (key, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["set", "X", "1"])
        .assert()
        .success();

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["--key"])
        .arg(&key)
        .args(["info", "--verify"])
        .assert()
        .success()
        .stdout(predicate::str::contains("file: default"))
        .stdout(predicate::str::contains("exists: yes"))
        .stdout(predicate::str::contains("verified: yes (1 variable(s))"));
}

#[test]
fn test_info_unknown_file_lists_available() {
    let env = TestEnv::new();
    let (_, public_key) = env.make_key("k");
    let config = env.make_config(&format!("a={public_key}"));

    env.kiln()
        .args(["--config"])
        .arg(&config)
        .args(["info", "--file", "nope"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not configured"));
}
