//! Content addressing for the write path.
//!
//! Assets and relations are identified by the SHA-256 digest of their
//! canonical JSON encoding, so identical values always land on the same row
//! regardless of which source pushed them. The compiler never hashes; this
//! lives entirely on the store's write side.

use std::collections::HashMap;
use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{acquire_lock, Result, StoreError};

/// SHA-256 hasher with a memo cache keyed by the encoded input.
///
/// A bulk update hashes the same endpoint assets over and over; the cache
/// makes repeats a map lookup. One instance is scoped to one bulk update.
#[derive(Debug, Default)]
pub struct ContentHasher {
    cache: Mutex<HashMap<String, String>>,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes a serializable value, memoizing repeated inputs.
    pub fn hash<T: Serialize>(&self, value: &T) -> Result<String> {
        let encoded = serde_json::to_string(value)
            .map_err(|source| StoreError::Serialization(source.to_string()))?;
        let mut cache = acquire_lock(&self.cache)?;
        if let Some(known) = cache.get(&encoded) {
            return Ok(known.clone());
        }
        let digest = Sha256::digest(encoded.as_bytes());
        let id = BASE64.encode(digest);
        cache.insert(encoded, id.clone());
        Ok(id)
    }
}
