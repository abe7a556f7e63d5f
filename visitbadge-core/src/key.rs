//! Counter key type.
//!
//! A [`CacheKey`] identifies one page's counter in both the in-process cache
//! and the durable store. It is derived from the page identifier and a server
//! secret, so raw page identifiers never reach storage:
//!
//! ```
//! use visitbadge_core::CacheKey;
//!
//! let key = CacheKey::digest("github.com/user/repo", "secret");
//! assert_eq!(key.as_str().len(), CacheKey::LEN);
//! assert_eq!(key, CacheKey::digest("github.com/user/repo", "secret"));
//! assert_ne!(key, CacheKey::digest("github.com/user/repo", "other"));
//! ```
//!
//! [`CacheKey`] uses `Arc` internally for cheap cloning, since every cache hit
//! clones the key into a background resync task.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

/// Opaque fixed-length counter key (lowercase hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(Arc<str>);

impl CacheKey {
    /// Length of a digested key in characters.
    pub const LEN: usize = 64;

    /// Hashes `page_id` together with `secret` into a key.
    pub fn digest(page_id: &str, secret: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(page_id.as_bytes());
        hasher.update(secret.as_bytes());
        Self(Arc::from(hex::encode(hasher.finalize())))
    }

    /// Wraps an already computed key.
    ///
    /// Used when keys come from an external source (e.g. a migration from
    /// another hashing scheme) and in tests.
    pub fn from_raw(raw: impl Into<Arc<str>>) -> Self {
        Self(raw.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Approximate heap footprint of the key, used by byte-bounded caches.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.0.len()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_hex() {
        let key = CacheKey::digest("page", "key");
        assert_eq!(key.as_str().len(), CacheKey::LEN);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.as_str(), key.as_str().to_lowercase());
    }

    #[test]
    fn test_digest_hides_page_id() {
        let key = CacheKey::digest("my-page", "key");
        assert!(!key.as_str().contains("my-page"));
    }

    #[test]
    fn test_from_raw() {
        let key = CacheKey::from_raw("abc");
        assert_eq!(key.to_string(), "abc");
        assert_eq!(key.clone(), key);
    }
}
