//! Storage-key slugs for class codes and topic names.

/// Key used when a name has no usable characters.
pub const FALLBACK_SLUG: &str = "untitled";

/// Map a display name to a storage key.
///
/// Letters (accented included), digits, `_` and `-` are kept; every other
/// character becomes `_`. Runs of `_` collapse to one and are trimmed from
/// both ends. Never fails, and `slugify(&slugify(x)) == slugify(x)`.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        let ch = if ch.is_alphanumeric() || ch == '-' { ch } else { '_' };
        if ch == '_' && out.ends_with('_') {
            continue;
        }
        out.push(ch);
    }

    let slug = out.trim_matches('_');
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}
