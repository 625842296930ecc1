//! Filename normalization and idempotence keys.
//!
//! Source and destination repositories hold "the same" asset under
//! filenames that drift in casing, accents, and separators. Every stage
//! that asks "is this asset already there?" goes through the keys defined
//! here: `(id, filename)` for the local cache, the normalized base name
//! for anything remote.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// A filename split at its last dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameParts {
    pub base: String,
    /// Lower-cased extension, empty when the name has no dot.
    pub ext: String,
}

/// Canonicalize a filename for cross-repository matching.
///
/// Decomposes accented characters and drops the combining marks,
/// lower-cases, trims, and collapses every run of whitespace, `.`, `_`,
/// and `-` into a single `-`. Total and idempotent; empty input maps to
/// the empty string.
pub fn normalize(filename: &str) -> String {
    let stripped: String = filename
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    let lowered = stripped.to_lowercase();
    let trimmed = lowered.trim();

    let mut out = String::with_capacity(trimmed.len());
    let mut pending_sep = false;
    for c in trimmed.chars() {
        if c.is_whitespace() || matches!(c, '.' | '_' | '-') {
            pending_sep = true;
        } else {
            if pending_sep {
                out.push('-');
                pending_sep = false;
            }
            out.push(c);
        }
    }
    if pending_sep {
        out.push('-');
    }
    out
}

/// Split a filename at the last `.`.
///
/// Without a dot the whole name is the base and the extension is empty.
pub fn split_extension(filename: &str) -> FilenameParts {
    match filename.rfind('.') {
        Some(pos) => FilenameParts {
            base: filename[..pos].to_string(),
            ext: filename[pos + 1..].to_lowercase(),
        },
        None => FilenameParts {
            base: filename.to_string(),
            ext: String::new(),
        },
    }
}

/// Idempotence key for matching an asset against a remote inventory.
pub fn remote_key(filename: &str) -> String {
    normalize(&split_extension(filename).base)
}
