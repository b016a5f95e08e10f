//! Key derivation for stored media.
//!
//! Every key is a single file name inside the media directory:
//! - Original: `<first 16 hex chars of hash>_<sanitized display name>`
//! - Restyled: `<full hash of the source>.restyled.png`

use memoria_error::{StorageError, StorageErrorKind};
use sha2::{Digest, Sha256};

/// Characters of the content hash that prefix an Original's key.
pub const HASH_PREFIX_LEN: usize = 16;

/// Longest sanitized display name, in bytes.
pub const MAX_DISPLAY_NAME_LEN: usize = 64;

/// Display name used when sanitization leaves nothing.
pub const FALLBACK_DISPLAY_NAME: &str = "upload";

const RESTYLED_SUFFIX: &str = ".restyled.png";

/// Compute SHA-256 hash of data as lowercase hex.
pub fn compute_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Reduce a user-supplied file name to a safe single path component.
///
/// ASCII alphanumerics, `.`, `-` and `_` survive; everything else becomes `_`.
/// Leading dots are stripped and the result is capped at
/// [`MAX_DISPLAY_NAME_LEN`] bytes.
pub fn sanitize_display_name(name: &str) -> String {
    // Drop any directory part a browser or CLI may have sent along.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let trimmed = cleaned.trim_start_matches('.');
    let truncated: String = trimmed.chars().take(MAX_DISPLAY_NAME_LEN).collect();

    if truncated.is_empty() || truncated.chars().all(|c| c == '_') {
        FALLBACK_DISPLAY_NAME.to_string()
    } else {
        truncated
    }
}

/// Key of an Original.
pub fn original_key(content_hash: &str, sanitized_name: &str) -> String {
    let prefix = &content_hash[..HASH_PREFIX_LEN.min(content_hash.len())];
    format!("{}_{}", prefix, sanitized_name)
}

/// Key of the Restyled derivative of `source_hash`.
///
/// This is the only place the derivative naming convention is defined.
pub fn derivative_key(source_hash: &str) -> String {
    format!("{}{}", source_hash, RESTYLED_SUFFIX)
}

/// Inverse of [`derivative_key`]: the source hash a derivative key names.
pub fn source_hash_of_derivative(key: &str) -> Option<&str> {
    let hash = key.strip_suffix(RESTYLED_SUFFIX)?;
    (hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_hexdigit())).then_some(hash)
}

/// Reject keys that could escape the media directory or name a temp file.
///
/// Temp files always start with `.`, which no generated key does, so a user
/// file named `draft.tmp` stays addressable.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty() || key.starts_with('.') || key.contains(['/', '\\', '\0']);
    if bad {
        return Err(StorageError::new(StorageErrorKind::InvalidKey(
            key.to_string(),
        )));
    }
    Ok(())
}
