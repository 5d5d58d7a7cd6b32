//! Course data extraction from landing-page HTML.
//!
//! Each [`Extractor`] reads one kind of signal (embedded app state, JSON-LD,
//! page body, meta tags, plain text) and proposes a [`PartialCourseDraft`].
//! The [`ExtractorRegistry`] fixes the order and weight of those proposals;
//! merging them is left to the caller.

mod dom;
pub mod draft;
pub mod extractors;

pub use draft::PartialCourseDraft;
pub use extractors::{
    DocumentTextExtractor, Extraction, Extractor, ExtractorRegistry, HtmlBodyExtractor,
    LinkedDataExtractor, MetaExtractor, NextDataExtractor, extract_outline_items,
};
