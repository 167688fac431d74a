//! Pure validation predicates.
//!
//! Every surface that ingests external input funnels through these checks.
//! Each failure produces a structured [`Error::Validation`] naming the field
//! and the rule it violated; nothing here touches the filesystem except the
//! editor and working-directory checks, which must resolve real paths.

use std::path::{Component, Path};
use std::time::Duration;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::error::{Error, Result};

/// Maximum size of a single variable value.
pub const MAX_VALUE_LEN: usize = 1_048_576;

/// Maximum combined size of all values in one environment file.
pub const MAX_MAP_LEN: usize = 10 * 1_048_576;

/// Maximum length of a single command argument.
pub const MAX_ARG_LEN: usize = 4096;

/// Upper bound for `run --timeout`.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

lazy_static! {
    static ref VAR_NAME: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Variable names match `^[A-Za-z_][A-Za-z0-9_]*$`.
pub fn is_valid_var_name(s: &str) -> bool {
    VAR_NAME.is_match(s)
}

pub fn validate_var_name(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation("variable name", "must not be empty"));
    }
    if !is_valid_var_name(s) {
        return Err(Error::validation(
            "variable name",
            format!("'{s}' must match [A-Za-z_][A-Za-z0-9_]*"),
        ));
    }
    Ok(())
}

/// Logical file names are plain identifiers: no path separators, no `..`.
pub fn validate_logical_file_name(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation("file name", "must not be empty"));
    }
    if s.contains("..") || s.contains('/') {
        return Err(Error::validation(
            "file name",
            format!("'{s}' must not contain '..' or '/'"),
        ));
    }
    Ok(())
}

/// File paths must be non-empty and free of `..` components once absolute.
pub fn validate_file_path(s: &str) -> Result<()> {
    if s.is_empty() {
        return Err(Error::validation("file path", "must not be empty"));
    }
    let absolute = if Path::new(s).is_absolute() {
        Path::new(s).to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| Error::file_access(s, e))?
            .join(s)
    };
    if absolute.components().any(|c| c == Component::ParentDir) {
        return Err(Error::validation(
            "file path",
            format!("'{s}' must not contain '..' components"),
        ));
    }
    Ok(())
}

/// Value bytes: bounded length, no NUL, no C0 controls other than `\t`,
/// `\n`, `\r`.
pub fn is_valid_env_value(b: &[u8]) -> bool {
    b.len() <= MAX_VALUE_LEN && !b.iter().any(|&c| is_forbidden_byte(c))
}

pub fn validate_env_value(name: &str, b: &[u8]) -> Result<()> {
    if b.len() > MAX_VALUE_LEN {
        return Err(Error::validation(
            "variable value",
            format!("'{name}' exceeds {MAX_VALUE_LEN} bytes"),
        ));
    }
    if b.iter().any(|&c| is_forbidden_byte(c)) {
        return Err(Error::validation(
            "variable value",
            format!("'{name}' contains control bytes"),
        ));
    }
    Ok(())
}

/// Drops forbidden control bytes, keeping `\t`, `\n`, `\r`.
pub fn sanitise_env_value(b: &[u8]) -> Vec<u8> {
    b.iter().copied().filter(|&c| !is_forbidden_byte(c)).collect()
}

fn is_forbidden_byte(c: u8) -> bool {
    c == 0 || (c < 0x20 && c != b'\t' && c != b'\n' && c != b'\r')
}

/// Command argv: non-empty, each element bounded and NUL-free.
pub fn validate_command(argv: &[String]) -> Result<()> {
    if argv.is_empty() {
        return Err(Error::validation("command", "must not be empty"));
    }
    for arg in argv {
        if arg.len() > MAX_ARG_LEN {
            return Err(Error::validation(
                "command",
                format!("argument exceeds {MAX_ARG_LEN} bytes"),
            ));
        }
        if arg.bytes().any(|b| b == 0) {
            return Err(Error::validation("command", "argument contains NUL byte"));
        }
    }
    Ok(())
}

/// Timeouts: strictly positive, at most 24 hours.
pub fn validate_timeout(d: Duration) -> Result<()> {
    if d.is_zero() || d > MAX_TIMEOUT {
        return Err(Error::validation(
            "timeout",
            "must be greater than zero and at most 24h",
        ));
    }
    Ok(())
}

/// Parses `30`, `500ms`, `10s`, `5m`, or `2h` into a [`Duration`].
pub fn parse_timeout(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (digits, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => s.split_at(idx),
        None => (s, "s"),
    };
    let n: u64 = digits
        .parse()
        .map_err(|_| Error::validation("timeout", format!("'{s}' is not a duration")))?;
    let duration = match unit {
        "ms" => Duration::from_millis(n),
        "s" => Duration::from_secs(n),
        "m" => Duration::from_secs(n * 60),
        "h" => Duration::from_secs(n * 60 * 60),
        _ => {
            return Err(Error::validation(
                "timeout",
                format!("'{s}' has an unknown unit (use ms, s, m, or h)"),
            ))
        }
    };
    validate_timeout(duration)?;
    Ok(duration)
}

/// Editors must be non-empty, free of `..`, and resolvable on `$PATH`.
pub fn validate_editor(e: &str) -> Result<()> {
    if e.is_empty() {
        return Err(Error::validation("editor", "must not be empty"));
    }
    if e.contains("..") {
        return Err(Error::validation("editor", "must not contain '..'"));
    }
    let argv = shell_words::split(e)
        .map_err(|_| Error::validation("editor", format!("'{e}' is not a valid command line")))?;
    let program = argv
        .first()
        .ok_or_else(|| Error::validation("editor", "must not be empty"))?;
    if Path::new(program).is_absolute() || program.contains('/') {
        if !Path::new(program).exists() {
            return Err(Error::validation(
                "editor",
                format!("'{program}' does not exist"),
            ));
        }
    } else if which::which(program).is_err() {
        return Err(Error::validation(
            "editor",
            format!("'{program}' not found on PATH"),
        ));
    }
    Ok(())
}

/// Working directories must be valid paths that exist and are directories.
pub fn validate_working_directory(p: &str) -> Result<()> {
    validate_file_path(p)?;
    let path = Path::new(p);
    if !path.exists() {
        return Err(Error::validation(
            "working directory",
            format!("'{p}' does not exist"),
        ));
    }
    if !path.is_dir() {
        return Err(Error::validation(
            "working directory",
            format!("'{p}' is not a directory"),
        ));
    }
    Ok(())
}
