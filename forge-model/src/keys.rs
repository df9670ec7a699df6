//! API-key selection for providers configured with several keys.
//!
//! Selection is either a process-wide atomic round-robin ([`KeyRotation`]) or a stateless hash
//! of a request key ([`select_by_hash`]). Both are safe under concurrent requests.

use forge_core::{ForgeError, Result};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct KeyRotation {
    keys: Vec<String>,
    next: AtomicUsize,
}

impl KeyRotation {
    /// Fails when no non-blank key is supplied.
    pub fn new(keys: impl IntoIterator<Item = String>) -> Result<Self> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(ForgeError::Config("no API key configured".to_string()));
        }
        Ok(Self { keys, next: AtomicUsize::new(0) })
    }

    pub fn single(key: impl Into<String>) -> Result<Self> {
        Self::new([key.into()])
    }

    /// Next key in round-robin order.
    pub fn next_key(&self) -> &str {
        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[index]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Deterministic key choice for a request key: `keys[sha256(request_key) % keys.len()]`.
pub fn select_by_hash<'a>(keys: &'a [String], request_key: &str) -> Option<&'a str> {
    if keys.is_empty() {
        return None;
    }
    let digest = Sha256::digest(request_key.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    let index = (u64::from_be_bytes(prefix) % keys.len() as u64) as usize;
    Some(keys[index].as_str())
}
