//! Text normalization and value parsers shared by every extractor.
//!
//! - [`normalize`]: entity decoding, whitespace collapsing, tag stripping
//! - [`duration`]: display phrases and ISO-8601 durations to whole minutes
//! - [`difficulty`]: free-text level descriptors to [`Difficulty`]
//!
//! All functions here are pure and total: malformed input yields `None` or
//! passes through, never an error.
//!
//! [`Difficulty`]: courseimport_shared::Difficulty

pub mod difficulty;
pub mod duration;
pub mod normalize;

pub use difficulty::normalize_difficulty;
pub use duration::{parse_duration_from_display, parse_iso_duration_to_minutes};
pub use normalize::{decode_html_entities, sanitize_multiline, sanitize_text, strip_html};
