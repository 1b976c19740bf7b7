//! Email address extraction
//!
//! Scans raw page text (HTML or plain text) for email addresses. Besides the
//! plain `local@domain.tld` form, the bracketed obfuscations commonly used to
//! hide addresses from scrapers are recognized:
//!
//! | Separator | Variants |
//! |-----------|----------|
//! | `@` | `@`, `(at)`, `[at]`, `(@)`, `[@]` |
//! | `.` | `.`, `(dot)`, `[dot]`, `(.)`, `[.]` |
//!
//! Keywords are matched case-insensitively and may be surrounded by
//! whitespace, so `foo (AT) example [dot] com` yields `foo@example.com`.
//! The `@` separator may be spaced out as well (`info @ hotel.de`).
//!
//! # Known limitation
//!
//! Text is scanned in fixed-size chunks to bound the work done per match
//! attempt. An address that straddles a chunk boundary is not found.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Default chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 100_000;

/// File extensions that look like a TLD but mark an asset name (`logo@2x.png`)
const EXCLUDED_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".bmp", ".webp", ".svg"];

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b[a-z0-9._%+-]+\s*(?:\(at\)|\[at\]|\(@\)|\[@\]|@)\s*[a-z0-9.-]+(?:\s*(?:\(dot\)|\[dot\]|\(\.\)|\[\.\])\s*|\.)[a-z]{2,}\b",
    )
    .expect("email pattern is a valid regex")
});

static AT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(at\)|\[at\]|\(@\)|\[@\]").expect("at-token pattern is a valid regex")
});

static DOT_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\(dot\)|\[dot\]|\(\.\)|\[\.\]").expect("dot-token pattern is a valid regex")
});

static CLEAN_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^A-Za-z0-9]+").expect("clean-start pattern is a valid regex"));

static CLEAN_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9._%+-]+$").expect("clean-end pattern is a valid regex")
});

/// Extracts all email addresses from the given text
///
/// Returns a deduplicated set of lowercased addresses. An empty set is a valid
/// result. Calling this twice on the same input yields the same set.
///
/// # Example
///
/// ```
/// use lead_harvest::extract::extract_emails;
///
/// let emails = extract_emails("Contact: foo (at) example (dot) com");
/// assert!(emails.contains("foo@example.com"));
/// assert_eq!(emails.len(), 1);
/// ```
pub fn extract_emails(text: &str) -> HashSet<String> {
    extract_emails_chunked(text, DEFAULT_CHUNK_SIZE)
}

/// Extracts email addresses, scanning `text` in chunks of `chunk_size` bytes
///
/// Chunk boundaries are moved forward to the next UTF-8 character boundary.
pub fn extract_emails_chunked(text: &str, chunk_size: usize) -> HashSet<String> {
    let chunk_size = chunk_size.max(1);
    let mut emails = HashSet::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + chunk_size).min(text.len());
        while !text.is_char_boundary(end) {
            end += 1;
        }

        for found in EMAIL_PATTERN.find_iter(&text[start..end]) {
            if let Some(email) = clean_candidate(found.as_str()) {
                emails.insert(email);
            }
        }

        start = end;
    }

    emails
}

/// Turns a raw pattern match into a normalized address, or rejects it
fn clean_candidate(raw: &str) -> Option<String> {
    let cleaned = CLEAN_START.replace(raw, "");
    let cleaned = CLEAN_END.replace(&cleaned, "");
    let cleaned = AT_TOKEN.replace_all(&cleaned, "@");
    let cleaned = DOT_TOKEN.replace_all(&cleaned, ".");

    let email: String = cleaned
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if is_valid_email(&email) {
        Some(email)
    } else {
        tracing::trace!("Rejected email candidate: {}", raw);
        None
    }
}

/// Final structural check applied to every extracted address
///
/// An address is valid when it contains exactly one `@`, a non-empty local
/// part, and a domain with at least one `.` that neither starts nor ends with
/// a dot. Names ending in an image extension are rejected.
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    if !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || domain.contains("..")
    {
        return false;
    }

    let lower = email.to_lowercase();
    !EXCLUDED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}
