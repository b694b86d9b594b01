//! Gi / no-gi normalization.

use rollbook_core::GiMode;

/// Map free text to a [`GiMode`] by exact spelling, ignoring case and
/// surrounding or repeated whitespace.
///
/// Unrecognized text yields `None`; nothing is guessed.
///
/// ```
/// use rollbook_core::GiMode;
/// use rollbook_reconcile::normalize_gi_mode;
///
/// assert_eq!(normalize_gi_mode(" No-Gi "), Some(GiMode::Nogi));
/// assert_eq!(normalize_gi_mode("kimono"), None);
/// ```
pub fn normalize_gi_mode(text: &str) -> Option<GiMode> {
    let key = text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    match key.as_str() {
        "gi" => Some(GiMode::Gi),
        "nogi" | "no-gi" | "no gi" | "no_gi" => Some(GiMode::Nogi),
        "both" | "gi/nogi" | "gi/no-gi" | "gi and nogi" | "gi & nogi" => Some(GiMode::Both),
        _ => None,
    }
}
