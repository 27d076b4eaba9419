//! Pure path combination and canonicalization.
//!
//! These functions reconcile path-addressed backends with the rest of the
//! model: they never touch the file system and produce identical output for
//! identical input.

/// The path separator used by every path-addressed backend.
pub const SEPARATOR: char = '/';

/// Combine two path fragments with exactly one separator at the join point.
///
/// `None` is treated as the empty string on either side, so
/// `combine(None, None)` yields `"/"` and `combine(Some("Folder"), None)`
/// yields `"Folder/"`.
pub fn combine(a: Option<&str>, b: Option<&str>) -> String {
    let a = a.unwrap_or("");
    let b = b.unwrap_or("");
    if a.ends_with(SEPARATOR) || b.starts_with(SEPARATOR) {
        format!("{a}{b}")
    } else {
        format!("{a}{SEPARATOR}{b}")
    }
}

/// Canonicalize a path to its rooted form.
///
/// `None` propagates (no path stays no path), the empty string becomes the
/// root, and any other string gains a leading separator if it lacks one.
/// Already-rooted strings pass through unchanged, so the function is
/// idempotent.
pub fn clean(p: Option<&str>) -> Option<String> {
    let p = p?;
    if p.is_empty() {
        return Some(SEPARATOR.to_string());
    }
    if p.starts_with(SEPARATOR) {
        Some(p.to_string())
    } else {
        Some(format!("{SEPARATOR}{p}"))
    }
}

/// Return the parent path, or `None` for the root.
///
/// A trailing separator is stripped first, so `"/Folder/Sub"` and
/// `"/Folder/Sub/"` are equivalent inputs. The root has no parent; this is
/// absence, not an error.
pub fn parent_of(p: &str) -> Option<String> {
    let trimmed = p.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        // Input was the root (or all separators).
        return None;
    }
    match trimmed.rfind(SEPARATOR) {
        Some(0) => Some(SEPARATOR.to_string()),
        Some(idx) => Some(trimmed[..idx].to_string()),
        None => Some(SEPARATOR.to_string()),
    }
}

/// Return the last path segment, with any trailing separator stripped first.
///
/// The root returns itself: it has no proper name and `"/"` acts as the
/// boundary sentinel.
pub fn file_name(p: &str) -> String {
    let trimmed = p.trim_end_matches(SEPARATOR);
    if trimmed.is_empty() {
        return SEPARATOR.to_string();
    }
    match trimmed.rfind(SEPARATOR) {
        Some(idx) => trimmed[idx + 1..].to_string(),
        None => trimmed.to_string(),
    }
}
