//! Difficulty level normalization.

use courseimport_shared::Difficulty;

/// Map a free-text level descriptor onto [`Difficulty`].
///
/// Keywords are checked in a fixed order (beginner, intermediate, advanced),
/// so "Beginner to Advanced" resolves to `Beginner`.
pub fn normalize_difficulty(text: &str) -> Option<Difficulty> {
    let normalized = text.to_lowercase();

    if normalized.contains("beginner") || normalized.contains("intro") {
        Some(Difficulty::Beginner)
    } else if normalized.contains("intermediate") || normalized.contains("intermed") {
        Some(Difficulty::Intermediate)
    } else if normalized.contains("advanced") || normalized.contains("expert") {
        Some(Difficulty::Advanced)
    } else {
        None
    }
}
