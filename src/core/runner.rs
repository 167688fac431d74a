//! Runner: spawns a child process with decrypted variables injected.
//!
//! The child inherits the parent's stdio and environment, with decrypted
//! values overriding parent values on key collision. It runs in its own
//! process group; cancellation (SIGINT/SIGTERM on the parent, or an elapsed
//! timeout) signals the group, waits, and reports failure. The decrypted
//! map is destroyed before the child's exit code is surfaced.

use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::time::{Duration, Instant};

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::keys::Identity;
use crate::core::store;
use crate::core::validate;
use crate::utils::signal::CancelToken;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// One `kiln run` request.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub argv: Vec<String>,
    pub dry_run: bool,
    pub timeout: Option<Duration>,
    pub workdir: Option<String>,
    pub shell: bool,
}

/// Why the child did not produce an exit code of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Interruption {
    Cancelled,
    TimedOut,
}

/// Validates the request, decrypts the file, and runs the child. Returns
/// the code the parent process should exit with.
pub fn execute(
    identity: &Identity,
    cfg: &Config,
    logical: &str,
    request: &RunRequest,
    cancel: &CancelToken,
) -> Result<i32> {
    validate::validate_command(&request.argv)?;
    if !logical.is_empty() {
        validate::validate_logical_file_name(logical)?;
    }
    if let Some(timeout) = request.timeout {
        validate::validate_timeout(timeout)?;
    }
    if let Some(workdir) = &request.workdir {
        validate::validate_working_directory(workdir)?;
    }

    let vars = store::get_all(identity, cfg, logical)?;

    if request.dry_run {
        println!("command: {}", shell_words::join(&request.argv));
        println!("variables ({}):", vars.len());
        for key in vars.keys() {
            println!("  {key}");
        }
        return Ok(0);
    }

    let mut command = build_command(request)?;
    for (key, value) in vars.iter() {
        command.env(key, value.to_string_lossy());
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command.spawn().map_err(|e| {
        Error::operation("spawn", shell_words::join(&request.argv), e)
    })?;

    let outcome = supervise(&mut child, request.timeout, cancel);

    // Zero the decrypted values before surfacing the child's fate.
    drop(vars);

    match outcome {
        Ok(status) => Ok(status),
        Err(Interruption::Cancelled) => Err(Error::operation(
            "run",
            logical.to_string(),
            anyhow::anyhow!("interrupted by signal"),
        )),
        Err(Interruption::TimedOut) => Err(Error::operation(
            "run",
            logical.to_string(),
            anyhow::anyhow!("timed out"),
        )),
    }
}

fn build_command(request: &RunRequest) -> Result<Command> {
    let mut command = if request.shell {
        let mut c = Command::new("sh");
        c.arg("-c").arg(shell_words::join(&request.argv));
        c
    } else {
        let program = resolve_program(&request.argv[0])?;
        let mut c = Command::new(program);
        c.args(&request.argv[1..]);
        c
    };
    if let Some(workdir) = &request.workdir {
        command.current_dir(workdir);
    }
    Ok(command)
}

/// `./x` and `../x` resolve to absolute paths so a workdir change cannot
/// redirect them; anything else goes through normal PATH lookup.
fn resolve_program(program: &str) -> Result<PathBuf> {
    if program.starts_with("./") || program.starts_with("../") {
        return std::fs::canonicalize(program)
            .map_err(|e| Error::file_access(Path::new(program), e));
    }
    Ok(PathBuf::from(program))
}

/// Waits for the child, polling for cancellation and the deadline.
fn supervise(
    child: &mut Child,
    timeout: Option<Duration>,
    cancel: &CancelToken,
) -> std::result::Result<i32, Interruption> {
    let started = Instant::now();
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Ok(status.code().unwrap_or(1));
        }
        if cancel.is_cancelled() {
            terminate(child);
            return Err(Interruption::Cancelled);
        }
        if let Some(limit) = timeout {
            if started.elapsed() >= limit {
                terminate(child);
                return Err(Interruption::TimedOut);
            }
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Terminates the child's whole process group, then reaps it.
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(child.id() as i32);
        if killpg(pid, Signal::SIGTERM).is_err() {
            let _ = child.kill();
        }
        // Grace period before escalating.
        for _ in 0..20 {
            if matches!(child.try_wait(), Ok(Some(_))) {
                return;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
        let _ = killpg(pid, Signal::SIGKILL);
    }
    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
    let _ = child.wait();
}
