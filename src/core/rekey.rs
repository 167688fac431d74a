//! Rekey planner: registers new recipients and re-encrypts a file so the
//! config never grants access the ciphertext cannot honour.
//!
//! Crash ordering: the re-encrypted ciphertext is renamed into place before
//! the config is saved, so an interrupted rekey can leave a ciphertext with
//! recipients the config does not yet list, but never the reverse.

use std::path::Path;

use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::keys::{validate_public_key, Identity};
use crate::core::store;

/// One `name=public_key` addition.
#[derive(Debug, Clone, PartialEq)]
pub struct Addition {
    pub name: String,
    pub public_key: String,
}

/// Parses a CLI `name=public_key` recipient spec.
pub fn parse_addition(spec: &str) -> Result<Addition> {
    let (name, key) = spec.split_once('=').ok_or_else(|| {
        Error::Input(format!("recipient spec '{spec}' must be name=public_key"))
    })?;
    let name = name.trim();
    let key = key.trim();
    if name.is_empty() {
        return Err(Error::Input("recipient name must not be empty".to_string()));
    }
    validate_public_key(key)?;
    Ok(Addition {
        name: name.to_string(),
        public_key: key.to_string(),
    })
}

/// Whether `name` already holds access to `entry`, directly, via `*`, or
/// through any declared group in the access list.
fn has_access(cfg: &Config, logical: &str, name: &str) -> bool {
    let Ok((_, entry)) = cfg.get_env_file(logical) else {
        return false;
    };
    for token in &entry.access {
        if token == "*" || token == name {
            return true;
        }
        if let Some(members) = cfg.groups.get(token) {
            if members.iter().any(|m| m == name) {
                return true;
            }
        }
        // Not this token; keep scanning the rest of the access list.
    }
    false
}

/// Applies the additions to `cfg`, re-encrypts the target file for the new
/// recipient set, and persists both — ciphertext first.
///
/// With `force`, a re-registration under a differing key overwrites the
/// existing recipient; without it, that conflict fails. Identical
/// re-registration is always a no-op.
pub fn rekey(
    identity: &Identity,
    cfg: &mut Config,
    config_path: &Path,
    logical: &str,
    additions: &[Addition],
    force: bool,
) -> Result<()> {
    if additions.is_empty() {
        return Err(Error::Input(
            "rekey needs at least one --add-recipient".to_string(),
        ));
    }

    // Reject conflicts before mutating anything.
    for addition in additions {
        if let Some(existing) = cfg.recipients.get(&addition.name) {
            if existing != &addition.public_key && !force {
                return Err(Error::config(
                    format!(
                        "recipient '{}' already exists with different key",
                        addition.name
                    ),
                    "pass --force to replace it",
                ));
            }
        }
    }

    // Load the current plaintext under the old recipient set before the
    // config changes.
    let path = store::env_file_path(cfg, logical)?;
    let existing_map = if path.exists() {
        Some(store::get_all(identity, cfg, logical)?)
    } else {
        None
    };

    for addition in additions {
        cfg.add_recipient(&addition.name, &addition.public_key);
    }

    let (logical_name, _) = cfg.get_env_file(logical)?;
    let logical_name = logical_name.to_string();
    for addition in additions {
        if !has_access(cfg, &logical_name, &addition.name) {
            if let Some(entry) = cfg.files.get_mut(&logical_name) {
                entry.access.push(addition.name.clone());
            }
        }
    }
    cfg.validate()?;

    match existing_map {
        Some(map) => {
            // Ciphertext before config: a crash between the two leaves the
            // broader ciphertext in place with the narrower config.
            store::set_all(identity, cfg, &logical_name, &map)?;
            cfg.save(config_path)?;
            log::debug!(
                "rekeyed '{}' for {} recipient(s)",
                logical_name,
                cfg.resolve_file_access(&logical_name)?.len()
            );
        }
        None => {
            // No ciphertext yet: the new set takes effect on first write.
            cfg.save(config_path)?;
        }
    }

    Ok(())
}
