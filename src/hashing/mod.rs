use blake3::Hasher;

/// Normalizes text for keying and case-insensitive comparisons: trims,
/// collapses internal whitespace runs to a single space, and lowercases.
///
/// Length rules operate on the original text; only keys, duplicate
/// detection, and lexical checks see the normalized form.
#[inline]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Computes the content key for a (model identifier, normalized text) pair.
///
/// # Key Derivation
///
/// The key is the full 256-bit BLAKE3 digest of `model | normalized_text`,
/// with a literal `|` separator so that `("ab", "c")` and `("a", "bc")`
/// cannot collide. Two texts that normalize identically share a key by
/// construction, which is what makes the cache and the vector store
/// content-addressed: re-analyzing unchanged content touches no provider.
///
/// The full 32-byte output is kept rather than a truncated u64 because keys
/// name durable rows on disk, where a collision would silently serve one
/// text's vector for another.
#[inline]
pub fn content_key(model: &str, normalized: &str) -> [u8; 32] {
    let mut hasher = Hasher::new();
    hasher.update(model.as_bytes());
    hasher.update(b"|");
    hasher.update(normalized.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Key for raw text: normalizes, then derives the content key.
#[inline]
pub fn text_key(model: &str, text: &str) -> [u8; 32] {
    content_key(model, &normalize_text(text))
}

/// Lowercase hex rendering of a content key, used for row file names.
#[inline]
pub fn key_hex(key: &[u8; 32]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(64);
    for byte in key {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_normalize_trims_and_collapses() {
        assert_eq!(normalize_text("  Quiet   Dishwashers  "), "quiet dishwashers");
        assert_eq!(normalize_text("one\ttwo\nthree"), "one two three");
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_normalize_lowercases_unicode() {
        assert_eq!(
            normalize_text("Najcichsze Zmywarki do Nowoczesnych Domów"),
            "najcichsze zmywarki do nowoczesnych domów"
        );
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text("  Mixed   CASE text ");
        let twice = normalize_text(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_content_key_determinism() {
        let key1 = content_key("mxbai-embed-large", "quiet dishwashers");
        let key2 = content_key("mxbai-embed-large", "quiet dishwashers");
        let key3 = content_key("mxbai-embed-large", "quiet dishwashers");

        assert_eq!(key1, key2);
        assert_eq!(key2, key3);
    }

    #[test]
    fn test_content_key_model_sensitivity() {
        let a = content_key("mxbai-embed-large", "same text");
        let b = content_key("nomic-embed-text", "same text");

        assert_ne!(a, b);
    }

    #[test]
    fn test_content_key_separator_prevents_ambiguity() {
        let a = content_key("ab", "c");
        let b = content_key("a", "bc");
        let c = content_key("abc", "");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn test_text_key_equivalence_classes() {
        let variants = [
            "Quiet Dishwashers",
            "  quiet   dishwashers ",
            "QUIET\tDISHWASHERS",
        ];

        let keys: HashSet<_> = variants.iter().map(|t| text_key("m", t)).collect();
        assert_eq!(keys.len(), 1);

        let other = text_key("m", "loud dishwashers");
        assert!(!keys.contains(&other));
    }

    #[test]
    fn test_text_key_empty_text() {
        let key = text_key("m", "");
        assert!(!key.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_key_hex_shape() {
        let key = content_key("m", "text");
        let hex = key_hex(&key);

        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hex, hex.to_lowercase());
    }

    #[test]
    fn test_key_hex_roundtrip_distinct() {
        let a = key_hex(&content_key("m", "a"));
        let b = key_hex(&content_key("m", "b"));
        assert_ne!(a, b);
    }
}
