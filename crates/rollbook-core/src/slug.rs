//! Name normalization shared by the catalog, matchers and mutator.

/// Generate a slug (kebab-case, lowercase) from a display name.
///
/// ```
/// use rollbook_core::slugify;
///
/// assert_eq!(slugify("Octopus Guard"), "octopus-guard");
/// assert_eq!(slugify("  De La Riva (DLR)  "), "de-la-riva-dlr");
/// ```
pub fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Normalize free text for comparison: lowercase, punctuation and
/// separators folded to single spaces, trimmed.
///
/// ```
/// use rollbook_core::normalize_text;
///
/// assert_eq!(normalize_text("Closed-Guard > Armbar!"), "closed guard armbar");
/// ```
pub fn normalize_text(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
