//! Owned secret containers with guaranteed zeroisation.
//!
//! Every plaintext secret and private-key blob held in memory lives inside a
//! [`SecretBuffer`], whose destructor overwrites the backing bytes with a
//! volatile write the compiler cannot elide (via the `zeroize` crate).
//! Decrypted environment maps are returned as an owning [`SecretMap`] so
//! consumers cannot forget to clean up.

use std::collections::BTreeMap;
use std::fmt;

use zeroize::Zeroize;

/// An owned byte region zeroed on destruction.
///
/// Cloning is explicit and produces an independent buffer carrying its own
/// zeroisation obligation. The buffer never reallocates after construction.
pub struct SecretBuffer {
    bytes: Vec<u8>,
}

impl SecretBuffer {
    /// Copies `bytes` into a fresh buffer.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        SecretBuffer { bytes: bytes.into() }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        SecretBuffer {
            bytes: bytes.to_vec(),
        }
    }

    /// Borrowed view of the secret bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The secret as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }

    /// Lossy UTF-8 rendering for display surfaces (export, dry-run).
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Explicit independent copy.
    pub fn duplicate(&self) -> Self {
        SecretBuffer {
            bytes: self.bytes.clone(),
        }
    }
}

impl Drop for SecretBuffer {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBuffer({} bytes)", self.bytes.len())
    }
}

impl PartialEq for SecretBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for SecretBuffer {}

impl From<String> for SecretBuffer {
    fn from(mut s: String) -> Self {
        // Take ownership of the String's allocation so no stray copy outlives
        // the buffer.
        let bytes = std::mem::take(&mut s).into_bytes();
        SecretBuffer { bytes }
    }
}

impl From<Vec<u8>> for SecretBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        SecretBuffer { bytes }
    }
}

/// A decrypted environment map owning every value as a [`SecretBuffer`].
///
/// Keys iterate in lexicographic order, which is also the display and export
/// order. Dropping the map zeroes every value.
#[derive(Debug, Default)]
pub struct SecretMap {
    inner: BTreeMap<String, SecretBuffer>,
}

impl SecretMap {
    pub fn new() -> Self {
        SecretMap {
            inner: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: SecretBuffer) {
        self.inner.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&SecretBuffer> {
        self.inner.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SecretBuffer> {
        self.inner.remove(key)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Keys in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.inner.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SecretBuffer)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Combined size of all values, for the map-size bound.
    pub fn total_value_len(&self) -> usize {
        self.inner.values().map(SecretBuffer::len).sum()
    }
}

impl FromIterator<(String, SecretBuffer)> for SecretMap {
    fn from_iter<I: IntoIterator<Item = (String, SecretBuffer)>>(iter: I) -> Self {
        SecretMap {
            inner: iter.into_iter().collect(),
        }
    }
}
