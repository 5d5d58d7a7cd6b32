//! Course import orchestration.
//!
//! Fetches a course landing page, runs every extractor from
//! `courseimport-extract` over it, merges the drafts by confidence, and
//! normalizes the result into a [`CourseImportResult`].
//!
//! [`CourseImportResult`]: courseimport_shared::CourseImportResult

pub mod fetch;
pub mod importer;
pub mod merge;

pub use fetch::{FetchedPage, validate_url};
pub use importer::{CourseImporter, ImportStage, extract_course_suggestions};
pub use merge::{SuggestionMerger, SuggestionSet, normalize_course_suggestions};
