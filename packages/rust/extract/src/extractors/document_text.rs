//! Last-resort description from the page's visible text.

use std::sync::LazyLock;

use courseimport_shared::{Confidence, CourseFieldSuggestions};
use courseimport_text::{sanitize_text, strip_html};
use regex::Regex;
use scraper::Html;

use super::{Extraction, Extractor};
use crate::draft::PartialCourseDraft;

/// Characters of stripped text considered.
const TEXT_WINDOW: usize = 5000;

static BODY_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<body\b").expect("valid regex"));
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s").expect("valid regex"));

/// Uses the first sentence of the body text as a description. Runs only
/// when no other source produced one.
pub struct DocumentTextExtractor;

impl Extractor for DocumentTextExtractor {
    fn name(&self) -> &'static str {
        "text"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Low
    }

    fn should_run(&self, merged: &CourseFieldSuggestions) -> bool {
        merged.description.value.is_none()
    }

    fn extract(&self, html: &str, _doc: &Html) -> Extraction {
        let body = BODY_OPEN
            .find(html)
            .map_or(html, |open| &html[open.start()..]);

        let text = sanitize_text(&strip_html(body, false));
        let window: String = text.chars().take(TEXT_WINDOW).collect();

        let first_sentence = SENTENCE_END
            .split(&window)
            .next()
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
            .map(str::to_string);

        Extraction::from_draft(PartialCourseDraft {
            description: first_sentence,
            ..Default::default()
        })
    }
}
