//! Process environment, captured once at startup.
//!
//! All environment variables kiln reads are gathered into a single struct at
//! the top of `main` and threaded through explicitly, so nothing in the core
//! consults the ambient environment at unpredictable points.

use std::path::PathBuf;

/// The environment variables kiln consumes.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    /// `KILN_CONFIG_FILE` — overrides the config path.
    pub config_file: Option<PathBuf>,

    /// `KILN_PRIVATE_KEY_FILE` — overrides private-key discovery.
    pub key_file: Option<PathBuf>,

    /// `EDITOR` — fallback editor for `kiln edit`.
    pub editor: Option<String>,

    /// `TMPDIR` — preferred temporary directory for the editor.
    pub tmpdir: Option<PathBuf>,

    /// The user's home directory.
    pub home: Option<PathBuf>,
}

impl Environment {
    /// Reads the process environment.
    pub fn capture() -> Self {
        Environment {
            config_file: std::env::var_os("KILN_CONFIG_FILE").map(PathBuf::from),
            key_file: std::env::var_os("KILN_PRIVATE_KEY_FILE").map(PathBuf::from),
            editor: std::env::var("EDITOR").ok().filter(|e| !e.is_empty()),
            tmpdir: std::env::var_os("TMPDIR").map(PathBuf::from),
            home: dirs::home_dir(),
        }
    }
}
