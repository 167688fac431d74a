//! Interactive editing of a decrypted environment file.
//!
//! The decrypted content is materialised into a short-lived temporary file
//! (memory-backed when `/dev/shm` is available), the external editor runs
//! over it, and a modified result is validated and re-encrypted. The temp
//! file is removed on every exit path, including cancellation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::codec;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::keys::Identity;
use crate::core::secret::{SecretBuffer, SecretMap};
use crate::core::store;
use crate::core::validate;
use crate::utils::env::Environment;
use crate::utils::signal::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

const EMPTY_SEED: &str = "\
# Add variables as KEY=value lines. Lines starting with '#' are ignored.\n";

/// What the edit session concluded.
#[derive(Debug, PartialEq, Eq)]
pub enum EditOutcome {
    /// The file was re-encrypted with this many variables.
    Saved(usize),
    /// The editor exited without touching the buffer.
    Unchanged,
}

/// Runs an interactive edit of `logical`.
pub fn edit(
    identity: &Identity,
    cfg: &Config,
    logical: &str,
    editor_flag: Option<&str>,
    env: &Environment,
    cancel: &CancelToken,
) -> Result<EditOutcome> {
    let editor = editor_flag
        .map(str::to_string)
        .or_else(|| env.editor.clone())
        .ok_or_else(|| {
            Error::config(
                "no editor configured",
                "pass --editor or set the EDITOR environment variable",
            )
        })?;
    validate::validate_editor(&editor)?;
    let editor_argv = shell_words::split(&editor)
        .map_err(|_| Error::validation("editor", "cannot parse the editor command line"))?;

    let current = store::get_all(identity, cfg, logical)?;

    // The NamedTempFile deletes itself on drop, which covers every exit
    // path out of this function.
    let mut tmp = tempfile::Builder::new()
        .prefix(".kiln-edit-")
        .suffix(".env")
        .tempfile_in(scratch_dir(env))
        .map_err(|e| Error::operation("tempfile creation", "editor", e))?;
    crate::utils::fs::set_mode(tmp.path(), 0o600)?;

    if current.is_empty() {
        tmp.write_all(EMPTY_SEED.as_bytes())
    } else {
        let seed = codec::serialise(current.iter().map(|(k, v)| (k, v.as_bytes())));
        tmp.write_all(seed.as_bytes())
    }
    .and_then(|_| tmp.flush())
    .map_err(|e| Error::operation("tempfile write", "editor", e))?;
    drop(current);

    let seeded_mtime = modified_at(tmp.path())?;

    run_editor(&editor_argv, tmp.path(), cancel)?;

    if modified_at(tmp.path())? == seeded_mtime {
        log::debug!("editor exited without modifying the buffer");
        return Ok(EditOutcome::Unchanged);
    }

    let edited = std::fs::read(tmp.path()).map_err(|e| Error::file_access(tmp.path(), e))?;
    let parsed = codec::parse(&edited)?;

    let mut map = SecretMap::new();
    for (key, value) in parsed {
        validate::validate_var_name(&key)?;
        validate::validate_env_value(&key, value.as_bytes())?;
        map.insert(key, SecretBuffer::from(value));
    }

    store::set_all(identity, cfg, logical, &map)?;
    Ok(EditOutcome::Saved(map.len()))
}

/// Prefer a memory-backed filesystem for the plaintext scratch file.
fn scratch_dir(env: &Environment) -> PathBuf {
    let shm = Path::new("/dev/shm");
    if shm.is_dir() {
        return shm.to_path_buf();
    }
    env.tmpdir
        .clone()
        .unwrap_or_else(std::env::temp_dir)
}

fn modified_at(path: &Path) -> Result<std::time::SystemTime> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| Error::file_access(path, e))
}

/// Runs the editor with inherited stdio under the cancellation token.
fn run_editor(argv: &[String], file: &Path, cancel: &CancelToken) -> Result<()> {
    // The editor stays in the terminal's foreground process group so
    // interactive editors keep control of the tty.
    let mut command = std::process::Command::new(&argv[0]);
    command.args(&argv[1..]).arg(file);

    let mut child = command
        .spawn()
        .map_err(|e| Error::operation("editor spawn", argv[0].clone(), e))?;

    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => return Ok(()),
            Ok(Some(status)) => {
                return Err(Error::operation(
                    "editor",
                    argv[0].clone(),
                    anyhow::anyhow!("exited with status {status}"),
                ));
            }
            _ => {}
        }
        if cancel.is_cancelled() {
            terminate(&mut child);
            return Err(Error::operation(
                "editor",
                argv[0].clone(),
                anyhow::anyhow!("interrupted by signal"),
            ));
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

fn terminate(child: &mut std::process::Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(child.id() as i32);
        if kill(pid, Signal::SIGTERM).is_err() {
            let _ = child.kill();
        }
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keys::{generate_keypair, load_identity};
    use tempfile::{tempdir, TempDir};

    struct Fixture {
        _dir: TempDir,
        cfg: Config,
        identity: Identity,
        env: Environment,
    }

    fn fixture() -> Fixture {
        let dir = tempdir().unwrap();
        let key_path = dir.path().join("kiln.key");
        let public_key = generate_keypair(&key_path, false, false).unwrap();
        let identity = load_identity(&key_path).unwrap();

        let mut cfg = Config::new();
        cfg.add_recipient("me", &public_key);
        cfg.config_dir = dir.path().to_path_buf();

        Fixture {
            _dir: dir,
            cfg,
            identity,
            env: Environment::default(),
        }
    }

    #[test]
    fn test_untouched_buffer_reports_unchanged() {
        let f = fixture();
        let outcome = edit(
            &f.identity,
            &f.cfg,
            "default",
            Some("true"),
            &f.env,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(outcome, EditOutcome::Unchanged);
        assert!(!store::env_file_path(&f.cfg, "default").unwrap().exists());
    }

    #[test]
    fn test_modified_buffer_is_saved() {
        let f = fixture();
        // The appended tempfile path becomes $0 inside the -c script.
        let editor = r#"sh -c 'sleep 0.1; printf "NEW=value\n" > "$0"'"#;
        let outcome = edit(
            &f.identity,
            &f.cfg,
            "default",
            Some(editor),
            &f.env,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(outcome, EditOutcome::Saved(1));

        let saved = store::get_all(&f.identity, &f.cfg, "default").unwrap();
        assert_eq!(saved.get("NEW").unwrap().as_bytes(), b"value");
    }

    #[test]
    fn test_invalid_edit_is_rejected() {
        let f = fixture();
        let editor = r#"sh -c 'sleep 0.1; printf "not a pair\n" > "$0"'"#;
        let result = edit(
            &f.identity,
            &f.cfg,
            "default",
            Some(editor),
            &f.env,
            &CancelToken::new(),
        );
        assert!(result.is_err());
        assert!(!store::env_file_path(&f.cfg, "default").unwrap().exists());
    }

    #[test]
    fn test_failing_editor_is_an_error() {
        let f = fixture();
        let result = edit(
            &f.identity,
            &f.cfg,
            "default",
            Some("false"),
            &f.env,
            &CancelToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_no_editor_anywhere_is_a_config_error() {
        let f = fixture();
        let result = edit(
            &f.identity,
            &f.cfg,
            "default",
            None,
            &f.env,
            &CancelToken::new(),
        );
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));
    }
}
