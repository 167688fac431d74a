//! CLI argument parsing for kiln.
//!
//! Uses clap derive macros for type-safe argument handling.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::core::validate::parse_timeout;

// ─────────────────────────────────────────────────────────────
// Cli: Top-level CLI structure
// ─────────────────────────────────────────────────────────────

/// kiln — manage age-encrypted environment files.
#[derive(Parser)]
#[command(
    name = "kiln",
    about = "Manage age-encrypted environment files",
    version,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the kiln.toml config file.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path to the private key file.
    #[arg(long, global = true, value_name = "PATH")]
    pub key: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

// ─────────────────────────────────────────────────────────────
// InitTarget: Subcommands for `kiln init`
// ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug, Clone)]
pub enum InitTarget {
    /// Generate a new age keypair.
    Key {
        /// Where to write the private key (default: ~/.kiln/kiln.key).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Protect the private key with a passphrase.
        #[arg(long)]
        encrypt: bool,

        /// Overwrite an existing key file.
        #[arg(long)]
        force: bool,
    },

    /// Create a kiln.toml config file.
    Config {
        /// Where to write the config (default: ./kiln.toml).
        #[arg(long, value_name = "PATH")]
        path: Option<PathBuf>,

        /// Initial recipients as name=public_key (repeatable).
        #[arg(long = "recipients", value_name = "NAME=KEY", required = true)]
        recipients: Vec<String>,

        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
}

// ─────────────────────────────────────────────────────────────
// Commands: All available subcommands
// ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialise a key or a config file.
    Init {
        #[command(subcommand)]
        target: InitTarget,
    },

    /// Set a variable (or many, from a JSON file).
    Set {
        /// Variable name.
        name: Option<String>,

        /// Variable value (omitted: prompt without echo).
        value: Option<String>,

        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Import variables from a JSON object file.
        #[arg(long, value_name = "PATH")]
        from_file: Option<PathBuf>,
    },

    /// Print one variable's value.
    Get {
        /// Variable name.
        name: String,

        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Output format: value or json.
        #[arg(long, default_value = "value")]
        format: String,
    },

    /// Edit the decrypted file in your editor.
    Edit {
        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Editor command (overrides $EDITOR).
        #[arg(long)]
        editor: Option<String>,
    },

    /// Print every variable in an export format.
    Export {
        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Output format: shell, json, or yaml.
        #[arg(long, default_value = "shell")]
        format: String,
    },

    /// Substitute variables into a template file.
    Apply {
        /// Template file path.
        template: PathBuf,

        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Write the result here instead of stdout.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Fail when the template references unset variables.
        #[arg(long)]
        strict: bool,

        /// Opening delimiter (requires --right-delimiter).
        #[arg(long, value_name = "STR")]
        left_delimiter: Option<String>,

        /// Closing delimiter (requires --left-delimiter).
        #[arg(long, value_name = "STR")]
        right_delimiter: Option<String>,
    },

    /// Run a command with the decrypted variables injected.
    Run {
        /// Command and arguments (after --).
        #[arg(last = true, required = true)]
        argv: Vec<String>,

        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Print the command and variable names without running.
        #[arg(long)]
        dry_run: bool,

        /// Kill the child after this long (e.g. 30s, 5m).
        #[arg(long, value_parser = parse_timeout, value_name = "DURATION")]
        timeout: Option<Duration>,

        /// Working directory for the child.
        #[arg(long, value_name = "PATH")]
        workdir: Option<String>,

        /// Run the joined argv through `sh -c`.
        #[arg(long)]
        shell: bool,
    },

    /// Add recipients and re-encrypt a file for them.
    Rekey {
        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Recipient to add as name=public_key (repeatable).
        #[arg(long = "add-recipient", value_name = "NAME=KEY", required = true)]
        add_recipient: Vec<String>,

        /// Replace an existing recipient registered under a different key.
        #[arg(long)]
        force: bool,
    },

    /// Show a file's path, recipients, and (with --verify) health.
    Info {
        /// Logical file name (default: "default").
        #[arg(long, default_value = "", hide_default_value = true)]
        file: String,

        /// Decrypt the file to prove the current key can open it.
        #[arg(long)]
        verify: bool,
    },
}
