//! Shared helpers for integration tests.
//!
//! Each test gets an isolated directory that doubles as HOME, so key
//! discovery can never wander into the developer's real keys.

use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use tempfile::TempDir;

pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        TestEnv {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A kiln invocation with a scrubbed environment rooted in the test dir.
    pub fn kiln(&self) -> Command {
        let mut cmd = Command::cargo_bin("kiln").unwrap();
        cmd.current_dir(self.path())
            .env_remove("KILN_CONFIG_FILE")
            .env_remove("KILN_PRIVATE_KEY_FILE")
            .env_remove("EDITOR")
            .env("HOME", self.path());
        cmd
    }

    /// Generates a keypair at `name` and returns (key_path, public_key).
    pub fn make_key(&self, name: &str) -> (PathBuf, String) {
        let key_path = self.path().join(name);
        let output = self
            .kiln()
            .args(["init", "key", "--path"])
            .arg(&key_path)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "init key failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let public_key = String::from_utf8(output.stdout).unwrap().trim().to_string();
        assert!(public_key.starts_with("age1"));
        (key_path, public_key)
    }

    /// Creates a config at kiln.toml declaring the given recipient.
    pub fn make_config(&self, recipient_spec: &str) -> PathBuf {
        let config_path = self.path().join("kiln.toml");
        self.kiln()
            .args(["init", "config", "--path"])
            .arg(&config_path)
            .args(["--recipients", recipient_spec])
            .assert()
            .success();
        config_path
    }
}
