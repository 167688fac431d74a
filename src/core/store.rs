//! Store: the stateless façade tying config, key material, envelope, and
//! codec together.
//!
//! Every operation takes an [`Identity`] and a [`Config`] plus the file's
//! logical name. A missing ciphertext file reads as the empty map; writes
//! are atomic rename-into-place with mode 0600.

use std::path::PathBuf;

use zeroize::Zeroizing;

use crate::core::codec;
use crate::core::config::Config;
use crate::core::envelope::{self, Envelope};
use crate::core::error::{Error, Result};
use crate::core::keys::Identity;
use crate::core::secret::{SecretBuffer, SecretMap};
use crate::core::validate::{self, MAX_MAP_LEN};
use crate::utils::fs as fsutil;

/// Resolves the logical name to the on-disk ciphertext path.
pub fn env_file_path(cfg: &Config, logical: &str) -> Result<PathBuf> {
    let (_, entry) = cfg.get_env_file(logical)?;
    Ok(cfg.resolve_path(entry))
}

fn build_envelope<'a>(
    cfg: &Config,
    logical: &str,
    identity: &'a Identity,
) -> Result<Envelope<'a>> {
    let keys = cfg.resolve_file_access(logical)?;
    let recipients = keys
        .iter()
        .map(|k| envelope::parse_recipient(k))
        .collect::<Result<Vec<_>>>()?;
    Ok(Envelope::new(recipients, vec![identity.as_age()]))
}

/// Decrypts and parses the file. A missing file yields the empty map.
pub fn get_all(identity: &Identity, cfg: &Config, logical: &str) -> Result<SecretMap> {
    let path = env_file_path(cfg, logical)?;
    if !path.exists() {
        log::debug!("'{}' does not exist yet; treating as empty", path.display());
        return Ok(SecretMap::new());
    }

    let ciphertext = std::fs::read(&path).map_err(|e| Error::file_access(&path, e))?;
    let envelope = build_envelope(cfg, logical, identity)?;
    let plaintext = envelope.decrypt(&ciphertext)?;

    let parsed = codec::parse(&plaintext)?;
    Ok(parsed
        .into_iter()
        .map(|(k, v)| (k, SecretBuffer::from(v)))
        .collect())
}

/// Fetches one variable, copied into a fresh buffer.
pub fn get_one(
    identity: &Identity,
    cfg: &Config,
    logical: &str,
    key: &str,
) -> Result<SecretBuffer> {
    let map = get_all(identity, cfg, logical)?;
    let (logical, _) = cfg.get_env_file(logical)?;
    match map.get(key) {
        Some(value) => Ok(value.duplicate()),
        None => Err(Error::config(
            format!("variable '{key}' not found in '{logical}'"),
            "list the file with 'kiln export' to see what is set",
        )),
    }
}

/// Inserts or replaces one variable and writes the file back.
pub fn set_one(
    identity: &Identity,
    cfg: &Config,
    logical: &str,
    key: &str,
    value: SecretBuffer,
) -> Result<()> {
    validate::validate_var_name(key)?;
    validate::validate_env_value(key, value.as_bytes())?;

    let mut map = get_all(identity, cfg, logical)?;
    map.insert(key, value);
    set_all(identity, cfg, logical, &map)
}

/// Serialises, encrypts for the file's resolved access set, and atomically
/// replaces the ciphertext.
pub fn set_all(identity: &Identity, cfg: &Config, logical: &str, map: &SecretMap) -> Result<()> {
    for (key, value) in map.iter() {
        validate::validate_var_name(key)?;
        validate::validate_env_value(key, value.as_bytes())?;
    }
    if map.total_value_len() > MAX_MAP_LEN {
        return Err(Error::validation(
            "environment file",
            format!("combined value size exceeds {MAX_MAP_LEN} bytes"),
        ));
    }

    let path = env_file_path(cfg, logical)?;
    let envelope = build_envelope(cfg, logical, identity)?;

    let plaintext = Zeroizing::new(codec::serialise(
        map.iter().map(|(k, v)| (k, v.as_bytes())),
    ));

    let ciphertext = if plaintext.is_empty() {
        // An emptied file still gets a valid envelope: encrypt the canonical
        // empty serialisation as a lone newline comment.
        envelope.encrypt(b"# empty\n")?
    } else {
        envelope.encrypt(plaintext.as_bytes())?
    };

    fsutil::atomic_write(&path, &ciphertext, 0o600)?;
    log::debug!("wrote {} variable(s) to {}", map.len(), path.display());
    Ok(())
}

/// Decrypt-and-discard, used by `info --verify`. Returns the variable count.
pub fn check(identity: &Identity, cfg: &Config, logical: &str) -> Result<usize> {
    let map = get_all(identity, cfg, logical)?;
    Ok(map.len())
}
