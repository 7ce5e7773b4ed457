//! Stable dedup identifiers for feed entries.
//!
//! Explicit guid/id wins; otherwise fall back to hashing the link, then the
//! title. Title-only hashing means two link-less entries with the same title
//! collide; that is the historical behavior and callers rely on it.

/// Resolve the dedup identifier for one parsed entry.
///
/// Pure and total: always yields a non-empty decision path, never fails.
pub fn resolve(explicit_id: &str, link: &str, title: &str) -> String {
    let explicit_id = explicit_id.trim();
    if !explicit_id.is_empty() {
        return explicit_id.to_owned();
    }
    let link = link.trim();
    if !link.is_empty() {
        return md5_hex(link);
    }
    md5_hex(title.trim())
}

fn md5_hex(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}
