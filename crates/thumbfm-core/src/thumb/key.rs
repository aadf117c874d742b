//! Cache keys derived from normalized paths.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::path::NormalizedPath;

/// SHA-256 digest of a normalized path's UTF-8 bytes.
///
/// Two spellings of the same path (slash style, trailing slash) normalize to
/// the same string and therefore share a key. Collisions are not detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentKey([u8; 32]);

impl ContentKey {
    pub fn of(path: &NormalizedPath) -> Self {
        let digest = Sha256::digest(path.as_str().as_bytes());
        Self(digest.into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
