//! Extractor trait and the built-in extraction strategies.
//!
//! Each extractor reads the same HTML document independently and proposes a
//! partial draft. The registry fixes the order in which proposals are folded
//! into the merged suggestions; each source carries a fixed confidence, and a
//! later source replaces an earlier one at equal or higher confidence.

mod document_text;
mod html_body;
mod linked_data;
mod meta;
mod next_data;
mod outline;

use courseimport_shared::{Confidence, CourseFieldSuggestions};
use scraper::Html;

use crate::draft::PartialCourseDraft;

pub use document_text::DocumentTextExtractor;
pub use html_body::HtmlBodyExtractor;
pub use linked_data::LinkedDataExtractor;
pub use meta::MetaExtractor;
pub use next_data::NextDataExtractor;
pub use outline::extract_outline_items;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// What one extractor produced for one document.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Drafts in document order. Structured-data sources may yield several.
    pub drafts: Vec<PartialCourseDraft>,
    /// Non-fatal problems worth surfacing to the caller.
    pub warnings: Vec<String>,
}

impl Extraction {
    pub fn from_draft(draft: PartialCourseDraft) -> Self {
        let mut extraction = Self::default();
        extraction.push(draft);
        extraction
    }

    /// Keep `draft` unless it carries nothing.
    pub fn push(&mut self, draft: PartialCourseDraft) {
        if !draft.is_empty() {
            self.drafts.push(draft);
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// One strategy for reading course data out of a page.
///
/// Extractors never fail: malformed input becomes a warning and an empty
/// extraction.
pub trait Extractor: Send + Sync {
    /// Source tag recorded on every field this extractor wins.
    fn name(&self) -> &'static str;

    /// Confidence attached to this extractor's contributions.
    fn confidence(&self) -> Confidence;

    /// Whether to run at all, given what has been merged so far.
    fn should_run(&self, _merged: &CourseFieldSuggestions) -> bool {
        true
    }

    fn extract(&self, html: &str, doc: &Html) -> Extraction;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds the extractors in merge order.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Embedded app state first, then page body heuristics, linked data, meta
    /// tags and finally the plain-text description fallback. Linked data
    /// follows the body heuristics so it wins ties between the two.
    pub fn new() -> Self {
        Self {
            extractors: vec![
                Box::new(NextDataExtractor),
                Box::new(HtmlBodyExtractor),
                Box::new(LinkedDataExtractor),
                Box::new(MetaExtractor),
                Box::new(DocumentTextExtractor),
            ],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Extractor> {
        self.extractors.iter().map(|extractor| extractor.as_ref())
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
