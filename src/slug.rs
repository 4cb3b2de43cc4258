//! Slug normalization.
//!
//! Slugs are the human-readable alternate key of a product and appear in
//! storefront URLs. Every slug stored in the catalog has passed through
//! [`normalize`], so comparing two normalized slugs is a plain string
//! comparison.
//!
//! # Algorithm
//!
//! 1. Lowercase the input.
//! 2. Replace each maximal run of characters outside `[a-z0-9]` with a single `-`.
//! 3. Strip leading and trailing hyphens.
//! 4. Truncate to [`MAX_SLUG_LEN`] characters, dropping a hyphen the cut leaves at the end.

/// Maximum length of a normalized slug, in characters.
pub const MAX_SLUG_LEN: usize = 120;

/// Normalizes arbitrary text (a product name or a caller-supplied slug)
/// into a URL-safe slug.
///
/// The result contains only `[a-z0-9-]`, never starts or ends with a
/// hyphen, never contains two hyphens in a row, and is at most
/// [`MAX_SLUG_LEN`] characters long. Input with no ASCII alphanumerics
/// normalizes to the empty string.
///
/// ```
/// use catalog_store::slug::normalize;
///
/// assert_eq!(normalize("Hand-Thrown Mug (Blue)"), "hand-thrown-mug-blue");
/// assert_eq!(normalize("  --Mug 2--  "), "mug-2");
/// ```
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            // Runs at the very start are dropped instead of emitted.
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    // Only ASCII is left, so byte truncation is char truncation.
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}
