use crate::error::FibraError;
use crate::parsing::ParsedDocument;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Parsed documents keyed by the SHA-256 of their bytes and of the parse
/// context (format, backends, profile).
///
/// Owned by the caller; only successful parses are stored.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entries: HashMap<String, ParsedDocument>,
}

/// Hex SHA-256 of a document's bytes together with its parse context.
///
/// The same bytes parsed under a different context get a different key.
pub fn content_key(bytes: &[u8], context: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update((bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
    hasher.update(context.as_bytes());
    format!("{:x}", hasher.finalize())
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, bytes: &[u8], context: &str) -> Option<&ParsedDocument> {
        self.entries.get(&content_key(bytes, context))
    }

    /// Return the cached parse for `bytes` under `context`, or run `parse`
    /// and store its result.
    pub fn get_or_try_insert_with<F>(
        &mut self,
        bytes: &[u8],
        context: &str,
        parse: F,
    ) -> Result<ParsedDocument, FibraError>
    where
        F: FnOnce() -> Result<ParsedDocument, FibraError>,
    {
        let key = content_key(bytes, context);
        if let Some(hit) = self.entries.get(&key) {
            tracing::debug!(key = %key, "document cache hit");
            return Ok(hit.clone());
        }
        let parsed = parse()?;
        self.entries.insert(key, parsed.clone());
        Ok(parsed)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_key_is_sha256_hex() {
        let key = content_key(b"report", "pdf");
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key, content_key(b"report", "pdf"));
    }

    #[test]
    fn test_context_changes_key() {
        assert_ne!(content_key(b"report", "pdf"), content_key(b"report", "csv"));
        // Length prefix keeps the split between bytes and context unambiguous
        assert_ne!(content_key(b"ab", "c"), content_key(b"a", "bc"));
    }

    #[test]
    fn test_parse_runs_once_per_content() {
        let mut cache = DocumentCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            cache
                .get_or_try_insert_with(b"same bytes", "pdf", || {
                    calls += 1;
                    Ok(ParsedDocument::unreadable("empty"))
                })
                .unwrap();
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(b"same bytes", "pdf").is_some());
        assert!(cache.get(b"same bytes", "csv").is_none());
        assert!(cache.get(b"other bytes", "pdf").is_none());
    }

    #[test]
    fn test_failures_are_not_cached() {
        let mut cache = DocumentCache::new();
        let err = cache
            .get_or_try_insert_with(b"x", "pdf", || Err(FibraError::ParseError("bad".into())));
        assert!(err.is_err());
        assert!(cache.is_empty());

        cache
            .get_or_try_insert_with(b"x", "pdf", || Ok(ParsedDocument::unreadable("ok")))
            .unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
