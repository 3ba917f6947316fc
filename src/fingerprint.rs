//! Query fingerprinting for the optional result cache.
//!
//! A fingerprint is the SHA-256 hex digest of the normalized query text,
//! optionally salted with a caller-supplied scope (e.g. a model name) so the
//! same text fingerprints differently across incompatible cache scopes.
//! Normalization: lowercase, trim, collapse internal whitespace runs to a
//! single space. No stemming or stopword removal — this is a cache key, not
//! a search index.

use sha2::{Digest, Sha256};

/// Normalize query text for fingerprinting: trim, lowercase, collapse runs
/// of whitespace.
pub fn normalize(query_text: &str) -> String {
    query_text
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute the cache fingerprint for a query, optionally scoped.
pub fn fingerprint(query_text: &str, scope: Option<&str>) -> String {
    let normalized = normalize(query_text);
    let mut hasher = Sha256::new();
    if let Some(scope) = scope {
        hasher.update(scope.as_bytes());
        hasher.update(b"|");
    }
    hasher.update(normalized.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace_and_case() {
        assert_eq!(
            normalize("  What   IS   the  Status?  "),
            "what is the status?"
        );
    }

    #[test]
    fn fingerprint_is_deterministic() {
        let a = fingerprint("What is NATO's position?", None);
        let b = fingerprint("  what is nato's position?  ", None);
        assert_eq!(a, b);
    }

    #[test]
    fn fingerprint_differs_by_scope() {
        let a = fingerprint("same text", Some("scope-a"));
        let b = fingerprint("same text", Some("scope-b"));
        assert_ne!(a, b);
    }

    #[test]
    fn fingerprint_is_full_sha256_hex_length() {
        let fp = fingerprint("x", None);
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
