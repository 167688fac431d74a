//! Config file support for kiln.toml.
//!
//! # Overview
//!
//! The config declares named recipients (age or SSH public keys), optional
//! flat groups of recipients, and one or more environment files, each with a
//! filename and an access-control list:
//!
//! ```toml
//! [recipients]
//! alice = "age1..."
//! bob = "ssh-ed25519 AAAA... bob@host"
//!
//! [groups]
//! backend = ["alice", "bob"]
//!
//! [files.default]
//! filename = ".kiln.env"
//! access = ["*"]
//!
//! [files.prod]
//! filename = "prod.env"
//! access = ["backend"]
//! ```
//!
//! Filenames are stored verbatim and resolved against the config file's
//! directory when used. Access tokens are recipient names, group names, or
//! the wildcard `*`.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Error, Result};
use crate::core::keys::validate_public_key;
use crate::utils::fs as fsutil;

/// Default logical file name used when the CLI omits `--file`.
pub const DEFAULT_FILE: &str = "default";

/// Default on-disk filename for the default environment file.
pub const DEFAULT_FILENAME: &str = ".kiln.env";

/// Default config file basename.
pub const CONFIG_BASENAME: &str = "kiln.toml";

/// One environment file declaration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// Path stored verbatim; resolved relative to the config directory.
    pub filename: String,

    /// Access tokens: recipient names, group names, or `*`.
    pub access: Vec<String>,
}

/// The in-memory model of a kiln.toml file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Recipient name → public key string.
    #[serde(default)]
    pub recipients: BTreeMap<String, String>,

    /// Group name → ordered member list. Flat; no nested groups.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,

    /// Logical name → file declaration.
    #[serde(default)]
    pub files: BTreeMap<String, FileEntry>,

    /// Directory the config was loaded from. Never serialised.
    #[serde(skip)]
    pub config_dir: PathBuf,
}

impl Config {
    /// A fresh config with no recipients and the default file entry.
    pub fn new() -> Self {
        let mut files = BTreeMap::new();
        files.insert(
            DEFAULT_FILE.to_string(),
            FileEntry {
                filename: DEFAULT_FILENAME.to_string(),
                access: vec!["*".to_string()],
            },
        );
        Config {
            recipients: BTreeMap::new(),
            groups: BTreeMap::new(),
            files,
            config_dir: PathBuf::new(),
        }
    }

    /// Loads and validates a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| Error::file_access(path, e))?;
        let mut config: Config = toml::from_str(&contents).map_err(|e| {
            Error::config(
                format!("cannot parse '{}': {e}", path.display()),
                "check kiln.toml syntax",
            )
        })?;

        config.config_dir = path
            .parent()
            .map(Path::to_path_buf)
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        config.validate()?;
        Ok(config)
    }

    /// Serialises and writes the config with mode 0600, creating the
    /// containing directory (mode 0700) if needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let serialised = toml::to_string_pretty(self).map_err(|e| {
            Error::operation("config serialisation", path.display().to_string(), e)
        })?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fsutil::ensure_private_dir(parent)?;
        }
        fsutil::atomic_write(path, serialised.as_bytes(), 0o600)
    }

    /// Structural validation: at least one recipient; every file entry has a
    /// filename and a non-empty access list; every access token and group
    /// member refers to something declared.
    pub fn validate(&self) -> Result<()> {
        if self.recipients.is_empty() {
            return Err(Error::config(
                "config declares no recipients",
                "add at least one recipient to kiln.toml",
            ));
        }

        for (name, key) in &self.recipients {
            if name.is_empty() {
                return Err(Error::config(
                    "empty recipient name",
                    "recipient names must be non-empty identifiers",
                ));
            }
            validate_public_key(key)?;
        }

        for (group, members) in &self.groups {
            if self.recipients.contains_key(group) {
                return Err(Error::config(
                    format!("group '{group}' collides with a recipient name"),
                    "rename the group or the recipient",
                ));
            }
            for member in members {
                if !self.recipients.contains_key(member) {
                    return Err(Error::config(
                        format!("group '{group}' references unknown recipient '{member}'"),
                        "declare the recipient or remove it from the group",
                    ));
                }
            }
        }

        for (logical, entry) in &self.files {
            if entry.filename.is_empty() {
                return Err(Error::config(
                    format!("file '{logical}' has an empty filename"),
                    "set a filename in kiln.toml",
                ));
            }
            let traverses = Path::new(&entry.filename)
                .components()
                .any(|c| c == std::path::Component::ParentDir);
            if traverses {
                return Err(Error::config(
                    format!("file '{logical}' filename must not contain '..'"),
                    "keep env files at or below the config directory",
                ));
            }
            if entry.access.is_empty() {
                return Err(Error::config(
                    format!("file '{logical}' has an empty access list"),
                    "grant at least one recipient, group, or '*'",
                ));
            }
            for token in &entry.access {
                if token != "*"
                    && !self.recipients.contains_key(token)
                    && !self.groups.contains_key(token)
                {
                    return Err(Error::config(
                        format!("file '{logical}' grants unknown name '{token}'"),
                        "declare the recipient or group in kiln.toml",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Inserts or overwrites a recipient.
    pub fn add_recipient(&mut self, name: impl Into<String>, key: impl Into<String>) {
        self.recipients.insert(name.into(), key.into());
    }

    /// Removes a recipient, reporting whether it existed.
    pub fn remove_recipient(&mut self, name: &str) -> bool {
        self.recipients.remove(name).is_some()
    }

    /// Looks up a file entry; the empty string means `default`. A miss lists
    /// the available logical names.
    pub fn get_env_file(&self, logical: &str) -> Result<(&str, &FileEntry)> {
        let logical = if logical.is_empty() { DEFAULT_FILE } else { logical };
        match self.files.get_key_value(logical) {
            Some((name, entry)) => Ok((name.as_str(), entry)),
            None => {
                let available: Vec<&str> = self.files.keys().map(String::as_str).collect();
                Err(Error::config(
                    format!("file '{logical}' not configured"),
                    format!(
                        "check kiln.toml file definitions (available: {})",
                        available.join(", ")
                    ),
                ))
            }
        }
    }

    /// Resolves a file entry's verbatim filename against the config
    /// directory.
    pub fn resolve_path(&self, entry: &FileEntry) -> PathBuf {
        let path = Path::new(&entry.filename);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config_dir.join(path)
        }
    }

    /// Expands a file's access list into the set of public keys it grants.
    ///
    /// `*` unions every declared recipient and terminates the walk. Group
    /// tokens union their still-declared members. Dangling tokens are
    /// silently skipped here; `validate` catches them at load time.
    pub fn resolve_file_access(&self, logical: &str) -> Result<BTreeSet<String>> {
        let (logical, entry) = self.get_env_file(logical)?;
        let mut keys = BTreeSet::new();

        for token in &entry.access {
            if token == "*" {
                keys.extend(self.recipients.values().cloned());
                break;
            }
            if let Some(members) = self.groups.get(token) {
                for member in members {
                    if let Some(key) = self.recipients.get(member) {
                        keys.insert(key.clone());
                    }
                }
            } else if let Some(key) = self.recipients.get(token) {
                keys.insert(key.clone());
            }
            // Unknown token: skip.
        }

        if keys.is_empty() {
            return Err(Error::config(
                format!("file '{logical}' access list resolves to no recipients"),
                "grant at least one declared recipient",
            ));
        }
        Ok(keys)
    }
}
