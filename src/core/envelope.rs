//! Thin adapter over age multi-recipient encryption.
//!
//! The envelope is content-addressed by recipient set: decryption consults
//! the ciphertext's own header stanzas, so a file encrypted for an old
//! recipient set stays decryptable by an identity the config has since
//! dropped.

use std::io::{Read, Write};

use zeroize::Zeroizing;

use crate::core::error::{Error, Result};

/// A parsed encryption recipient.
pub type Recipient = Box<dyn age::Recipient + Send>;

/// Parses `age1…` via the X25519 parser and `ssh-…` via the SSH recipient
/// parser; everything else fails with "unsupported key format".
pub fn parse_recipient(s: &str) -> Result<Recipient> {
    let s = s.trim();
    if s.starts_with("age1") {
        let recipient = s.parse::<age::x25519::Recipient>().map_err(|e| {
            Error::Input(format!("cannot parse age public key: {e}"))
        })?;
        return Ok(Box::new(recipient));
    }
    if s.starts_with("ssh-") {
        let recipient = s
            .parse::<age::ssh::Recipient>()
            .map_err(|_| Error::Input("cannot parse SSH public key".to_string()))?;
        return Ok(Box::new(recipient));
    }
    Err(Error::Input(format!(
        "unsupported key format: '{}'",
        s.chars().take(12).collect::<String>()
    )))
}

/// Stateful encrypt/decrypt adapter holding recipients and identities.
pub struct Envelope<'a> {
    recipients: Vec<Recipient>,
    identities: Vec<&'a dyn age::Identity>,
}

impl<'a> Envelope<'a> {
    pub fn new(recipients: Vec<Recipient>, identities: Vec<&'a dyn age::Identity>) -> Self {
        Envelope {
            recipients,
            identities,
        }
    }

    /// Encrypts `data` to every recipient. Fails on an empty recipient list
    /// or empty input.
    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        if self.recipients.is_empty() {
            return Err(Error::security(
                "refusing to encrypt with no recipients",
                "grant at least one recipient access",
            ));
        }
        if data.is_empty() {
            return Err(Error::Input("refusing to encrypt empty content".to_string()));
        }

        let encryptor = age::Encryptor::with_recipients(
            self.recipients.iter().map(|r| r.as_ref() as &dyn age::Recipient),
        )
        .map_err(|e| Error::operation("encryption", "envelope", e))?;

        let mut ciphertext = Vec::new();
        let mut writer = encryptor
            .wrap_output(&mut ciphertext)
            .map_err(|e| Error::operation("encryption", "envelope", e))?;
        writer
            .write_all(data)
            .and_then(|_| writer.finish().map(|_| ()))
            .map_err(|e| Error::operation("encryption", "envelope", e))?;

        log::debug!(
            "encrypted {} bytes for {} recipient(s)",
            data.len(),
            self.recipients.len()
        );
        Ok(ciphertext)
    }

    /// Decrypts `blob` with the held identities. Fails on an empty identity
    /// list, an empty blob, or when no identity can unwrap any stanza.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        if self.identities.is_empty() {
            return Err(Error::security(
                "no identity available for decryption",
                "load a private key first",
            ));
        }
        if blob.is_empty() {
            return Err(Error::Input("refusing to decrypt empty content".to_string()));
        }

        let decryptor = age::Decryptor::new(blob)
            .map_err(|e| Error::operation("decryption", "envelope", e))?;
        let mut reader = decryptor
            .decrypt(self.identities.iter().copied())
            .map_err(|e| match e {
                age::DecryptError::NoMatchingKeys => Error::security(
                    "access denied: none of your keys can open this file",
                    "ask an authorised recipient to rekey the file for you",
                ),
                other => Error::operation("decryption", "envelope", other),
            })?;

        let mut plaintext = Zeroizing::new(Vec::new());
        reader
            .read_to_end(&mut plaintext)
            .map_err(|e| Error::operation("decryption", "envelope", e))?;
        Ok(plaintext)
    }
}
