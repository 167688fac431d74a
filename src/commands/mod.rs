//! Command implementations.
//!
//! Each command builds on the core through a shared [`Context`] that
//! resolves the config path and private key once per invocation. Status
//! messages go to stderr; stdout carries only data.

pub mod apply;
pub mod edit;
pub mod export;
pub mod get;
pub mod info;
pub mod init;
pub mod rekey;
pub mod run;
pub mod set;

use std::path::PathBuf;

use crate::core::config::{Config, CONFIG_BASENAME};
use crate::core::error::Result;
use crate::core::keys::{self, Identity};
use crate::utils::env::Environment;
use crate::utils::signal::CancelToken;

/// Per-invocation state shared by every command.
pub struct Context {
    pub env: Environment,
    pub cancel: CancelToken,
    pub config_override: Option<PathBuf>,
    pub key_override: Option<PathBuf>,
    pub verbose: bool,
}

impl Context {
    /// `--config`, then `KILN_CONFIG_FILE`, then `./kiln.toml`.
    pub fn config_path(&self) -> PathBuf {
        self.config_override
            .clone()
            .or_else(|| self.env.config_file.clone())
            .unwrap_or_else(|| PathBuf::from(CONFIG_BASENAME))
    }

    pub fn load_config(&self) -> Result<Config> {
        Config::load(&self.config_path())
    }

    /// `--key` wins; otherwise standard discovery against the config.
    pub fn load_identity(&self, cfg: &Config) -> Result<Identity> {
        let path = match &self.key_override {
            Some(path) => path.clone(),
            None => keys::find_private_key(&self.env, Some(cfg))?,
        };
        log::debug!("using private key {}", path.display());
        keys::load_identity(&path)
    }
}
