//! Round-robin credential pool

use crate::error::{EngineError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out provider keys in strict rotation.
///
/// The cursor advances once per call regardless of which symbol asked or
/// whether the request later succeeded, so load spreads evenly over the
/// pool. Backed by an atomic so concurrent fetches stay fair.
#[derive(Debug)]
pub struct KeyRotator {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyRotator {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(EngineError::Invalid("credential pool is empty".into()));
        }

        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Next key in the rotation
    pub fn next_key(&self) -> &str {
        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        &self.keys[index % self.keys.len()]
    }

    /// Number of keys handed out so far
    pub fn issued(&self) -> usize {
        self.cursor.load(Ordering::Relaxed)
    }

    pub fn pool_size(&self) -> usize {
        self.keys.len()
    }
}
