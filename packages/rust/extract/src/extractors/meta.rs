//! `<meta>` tags and the document `<title>`.

use std::sync::LazyLock;

use courseimport_shared::Confidence;
use courseimport_text::{decode_html_entities, sanitize_text};
use scraper::{Html, Selector};

use super::{Extraction, Extractor};
use crate::draft::PartialCourseDraft;

static META: LazyLock<Selector> = LazyLock::new(|| Selector::parse("meta[content]").unwrap());
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("head title").unwrap());

/// Social and SEO tags: a weak signal, used to fill what richer sources left
/// empty.
pub struct MetaExtractor;

impl Extractor for MetaExtractor {
    fn name(&self) -> &'static str {
        "meta"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Low
    }

    fn extract(&self, _html: &str, doc: &Html) -> Extraction {
        let title = meta_content(doc, "og:title")
            .or_else(|| meta_content(doc, "twitter:title"))
            .or_else(|| {
                doc.select(&TITLE)
                    .next()
                    .map(|title| clean(&title.text().collect::<String>()))
                    .filter(|title| !title.is_empty())
            });

        let description =
            meta_content(doc, "description").or_else(|| meta_content(doc, "og:description"));

        let uses_code_examples = meta_content(doc, "keywords")
            .filter(|keywords| keywords.to_lowercase().contains("code example"))
            .map(|_| true);

        Extraction::from_draft(PartialCourseDraft {
            title,
            description,
            uses_code_examples,
            ..Default::default()
        })
    }
}

/// Content of the first `<meta>` whose `name` or `property` equals `key`.
fn meta_content(doc: &Html, key: &str) -> Option<String> {
    doc.select(&META)
        .find(|meta| {
            let element = meta.value();
            [element.attr("name"), element.attr("property")]
                .into_iter()
                .flatten()
                .any(|value| value.eq_ignore_ascii_case(key))
        })
        .and_then(|meta| meta.value().attr("content"))
        .map(clean)
        .filter(|content| !content.is_empty())
}

fn clean(value: &str) -> String {
    sanitize_text(&decode_html_entities(value))
}
