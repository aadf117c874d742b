//! Path string normalization.
//!
//! Every component that uses a path as an identity (the resolver, the
//! thumbnail key, the invalidation coordinator) goes through [`normalize`]
//! first, so that `C:\photos\`, `C:/photos` and `C://photos/` all refer to the
//! same entry.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// A path in canonical string form: forward slashes only, no repeated
/// slashes, no trailing slash.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    /// Returns the normalized string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the normalization of an empty input.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the final path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Returns the path with the final segment removed.
    ///
    /// The parent of `/data` is the empty string, matching a plain split on `/`.
    pub fn parent(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Returns the normalized path of the direct child `name`.
    pub fn child(&self, name: &str) -> NormalizedPath {
        normalize(&join(self.as_str(), &format!("/{name}")))
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.0)
    }
}

/// Canonicalizes a path string.
///
/// Backslashes become forward slashes, runs of slashes collapse to one, and a
/// trailing slash is stripped. The bare root `/` is kept as is. Never fails;
/// an empty input yields an empty path.
pub fn normalize(path: &str) -> NormalizedPath {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        let c = if c == '\\' { '/' } else { c };
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    NormalizedPath(out)
}

/// Normalizes `path` and appends `suffix` verbatim.
///
/// No escaping happens here: a suffix containing `..` or separators is taken
/// as is, so names coming from clients must go through [`strip_name`] first.
pub fn join(path: &str, suffix: &str) -> String {
    let mut joined = normalize(path).into_string();
    joined.push_str(suffix);
    joined
}

/// Punctuation allowed in a file name besides letters, digits and `_`.
const NAME_PUNCTUATION: &str = "-+~.;,'`@!#$%&^()[]{}";

/// Reduces a client supplied name to characters safe for a single path segment.
///
/// Disallowed runs (separators, control characters, quotes, spaces...) turn
/// into a single space and the result is trimmed. `.` and `..` become empty.
pub fn strip_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let allowed = c.is_alphanumeric() || c == '_' || NAME_PUNCTUATION.contains(c);
        if allowed {
            out.push(c);
        } else if !out.ends_with(' ') {
            out.push(' ');
        }
    }
    let trimmed = out.trim();
    if trimmed == "." || trimmed == ".." {
        String::new()
    } else {
        trimmed.to_string()
    }
}
