use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

fn quill() -> Result<Command, Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("quill")?;
    cmd.env_remove("QUILL_API_URL")
        .env_remove("QUILL_TOKEN")
        .env_remove("QUILL_QUIET_MS")
        .env_remove("RUST_LOG");
    Ok(cmd)
}

#[test]
fn config_json_reads_yaml_and_redacts_token() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(
        dir.path().join("quill.yml"),
        r#"
api_url: "http://notes.example.com"
token: "super-secret"
quiet_ms: 750
"#,
    )?;

    let assert = quill()?
        .current_dir(dir.path())
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("super-secret").not());

    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let value: Value = serde_json::from_str(&stdout)?;
    assert_eq!(value["schema_version"], "quill-v1");
    assert_eq!(value["kind"], "settings");
    assert_eq!(value["data"]["api_url"], "http://notes.example.com");
    assert_eq!(value["data"]["token"], "********");
    assert_eq!(value["data"]["quiet_ms"], 750);
    assert_eq!(value["data"]["request_timeout_secs"], 30);

    Ok(())
}

#[test]
fn env_overrides_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    fs::write(dir.path().join("quill.yml"), "api_url: http://file.example.com\n")?;

    let assert = quill()?
        .current_dir(dir.path())
        .env("QUILL_API_URL", "http://env.example.com")
        .env("QUILL_QUIET_MS", "100")
        .args(["config", "--json"])
        .assert()
        .success();

    let value: Value = serde_json::from_slice(&assert.get_output().stdout)?;
    assert_eq!(value["data"]["api_url"], "http://env.example.com");
    assert_eq!(value["data"]["quiet_ms"], 100);
    assert_eq!(value["data"]["token"], Value::Null);

    Ok(())
}

#[test]
fn defaults_without_config_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    quill()?
        .current_dir(dir.path())
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:8000"))
        .stdout(predicate::str::contains("2000"));

    Ok(())
}

#[test]
fn explicit_missing_config_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    quill()?
        .current_dir(dir.path())
        .args(["--config", "nope.yml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.yml"));

    Ok(())
}

#[test]
fn short_title_input_is_rejected_locally() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;

    // Port 9 is never served; the request must not be attempted.
    quill()?
        .current_dir(dir.path())
        .args(["--api-url", "http://127.0.0.1:9", "transform", "--action", "title"])
        .write_stdin("too short")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 20 characters"));

    Ok(())
}

#[test]
fn push_rejects_non_json_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("draft.json");
    fs::write(&file, "just some prose")?;

    quill()?
        .current_dir(dir.path())
        .args(["--api-url", "http://127.0.0.1:9", "push", "abc"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not a valid JSON document"));

    Ok(())
}
