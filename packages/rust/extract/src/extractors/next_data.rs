//! Embedded Next.js application state (`<script id="__NEXT_DATA__">`).

use std::sync::LazyLock;

use courseimport_shared::{Confidence, CourseItem, Instructor};
use courseimport_text::{
    decode_html_entities, normalize_difficulty, parse_duration_from_display, sanitize_multiline,
    sanitize_text, strip_html,
};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{Extraction, Extractor};
use crate::dom::{self, ABOUT_HEADING, AUDIENCE_HEADING, GOALS_HEADING};
use crate::draft::{PartialCourseDraft, seconds_to_minutes};

static NEXT_DATA_SCRIPT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script#__NEXT_DATA__").unwrap());

const NOTEBOOK_LESSON: &str = "video_notebook";

/// Reads the course record a Next.js page ships as its hydration payload.
///
/// The most reliable source when present: values come straight from the CMS.
pub struct NextDataExtractor;

impl Extractor for NextDataExtractor {
    fn name(&self) -> &'static str {
        "next-data"
    }

    fn confidence(&self) -> Confidence {
        Confidence::High
    }

    fn extract(&self, _html: &str, doc: &Html) -> Extraction {
        let Some(script) = doc.select(&NEXT_DATA_SCRIPT).next() else {
            return Extraction::default();
        };

        let raw: String = script.text().collect();
        let Some(payload) = parse_payload(&raw) else {
            warn!(bytes = raw.len(), "unparseable __NEXT_DATA__ payload");
            let mut extraction = Extraction::default();
            extraction.warn("Failed to parse Next.js course payload");
            return extraction;
        };

        extract_from_payload(&payload)
    }
}

/// Entity-decoded JSON first, then the raw text as written.
pub(crate) fn parse_payload(raw: &str) -> Option<Value> {
    serde_json::from_str(&decode_html_entities(raw))
        .or_else(|_| serde_json::from_str(raw))
        .ok()
}

fn extract_from_payload(payload: &Value) -> Extraction {
    let mut extraction = Extraction::default();

    let Some(page_props) = payload.pointer("/props/pageProps").and_then(Value::as_object) else {
        extraction.warn("Next.js payload missing pageProps");
        return extraction;
    };

    let Some(course) = page_props.get("course").and_then(Value::as_object) else {
        extraction.warn("Next.js payload missing course data");
        return extraction;
    };

    let mut draft = PartialCourseDraft::default();

    match course.get("title").and_then(Value::as_str).map(sanitize_text) {
        Some(title) if !title.is_empty() => draft.title = Some(title),
        _ => extraction.warn("Course title missing in Next.js payload"),
    }

    let layout: &[Value] = course
        .get("visualEditor")
        .and_then(|editor| editor.get("pageLayout"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if let Some(hero) = layout
        .iter()
        .filter_map(Value::as_object)
        .find(|block| block.contains_key("level") || block.contains_key("duration"))
    {
        draft.difficulty = hero
            .get("level")
            .and_then(Value::as_str)
            .filter(|level| normalize_difficulty(level).is_some())
            .map(str::to_string);
        draft.duration = match hero.get("duration") {
            Some(Value::String(text)) => parse_duration_from_display(text).map(f64::from),
            Some(Value::Number(minutes)) => minutes.as_f64(),
            _ => None,
        };
    }

    let content = course.get("content").and_then(Value::as_str);

    draft.description = find_block_by_title(layout, &ABOUT_HEADING)
        .and_then(|block| block_text(block.get("body")?, true))
        .or_else(|| {
            course
                .get("seo")
                .and_then(|seo| seo.get("metaDesc"))
                .and_then(Value::as_str)
                .map(|desc| sanitize_text(&decode_html_entities(desc)))
                .filter(|desc| !desc.is_empty())
        })
        .or_else(|| block_text(course.get("content")?, true));

    draft.student_profile = find_block_by_title(layout, &AUDIENCE_HEADING)
        .and_then(|block| block_text(block.get("body")?, true))
        .or_else(|| {
            let fragment = Html::parse_fragment(content?);
            dom::section_text(fragment.root_element(), &AUDIENCE_HEADING)
        });

    draft.learning_goals = features_grid(layout).or_else(|| {
        let fragment = Html::parse_fragment(content?);
        let goals = dom::section_list(fragment.root_element(), &GOALS_HEADING);
        (!goals.is_empty()).then_some(goals)
    });

    draft.instructors = course
        .get("shortCourse")
        .and_then(|short| short.get("instructors"))
        .and_then(Value::as_array)
        .map(|entries| entries.iter().filter_map(instructor_entry).collect::<Vec<_>>())
        .filter(|instructors| !instructors.is_empty());

    if let Some((items, total_seconds)) = outline_lessons(page_props) {
        draft.course_items = Some(items);
        if draft.duration.is_none() && total_seconds > 0.0 {
            draft.duration = Some(f64::from(seconds_to_minutes(total_seconds)));
        }
    }

    let has_notebook = draft
        .course_items
        .as_ref()
        .is_some_and(|items| items.iter().any(|item| item.uses_code_example));
    if has_notebook || draft.combined_text().to_lowercase().contains("code") {
        draft.uses_code_examples = Some(true);
    }

    debug!(fields = draft.field_count(), "next-data draft");
    extraction.push(draft);
    extraction
}

fn find_block_by_title<'a>(layout: &'a [Value], pattern: &Regex) -> Option<&'a Map<String, Value>> {
    layout.iter().filter_map(Value::as_object).find(|block| {
        block
            .get("title")
            .and_then(Value::as_str)
            .is_some_and(|title| pattern.is_match(title))
    })
}

fn features_grid(layout: &[Value]) -> Option<Vec<String>> {
    let grid = layout
        .iter()
        .find_map(|block| block.get("featuresGrid")?.as_array())?;

    let goals: Vec<String> = grid
        .iter()
        .filter_map(|feature| {
            let text = feature
                .get("feature")
                .filter(|v| v.is_string())
                .or_else(|| feature.get("featureReachText").filter(|v| v.is_string()))?;
            block_text(text, false)
        })
        .collect();

    (!goals.is_empty()).then_some(goals)
}

fn instructor_entry(entry: &Value) -> Option<Instructor> {
    let instructor = entry.get("instructor")?;
    let name = sanitize_text(instructor.get("title")?.as_str()?);
    if name.is_empty() {
        return None;
    }

    let person = instructor.get("person");
    let title = person
        .and_then(|p| p.get("jobTitleRichText"))
        .filter(|v| v.is_string())
        .and_then(|rich| block_text(rich, false))
        .or_else(|| {
            person
                .and_then(|p| p.get("jobTitle"))
                .and_then(Value::as_str)
                .map(sanitize_text)
        })
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Instructor".to_string());

    Some(Instructor { name, title })
}

/// Lessons of the first outline group, with their summed length in seconds.
///
/// `outlineList` is normally a list of lesson groups; a flat lesson list is
/// accepted too.
fn outline_lessons(page_props: &Map<String, Value>) -> Option<(Vec<CourseItem>, f64)> {
    let outline = page_props.get("outlineList")?.as_array()?;
    let lessons = match outline.first()? {
        Value::Array(group) => group.as_slice(),
        Value::Object(_) => outline.as_slice(),
        _ => return None,
    };

    let mut total_seconds = 0.0;
    let items: Vec<CourseItem> = lessons
        .iter()
        .filter_map(|lesson| {
            let title = sanitize_text(lesson.get("name")?.as_str()?);
            if title.is_empty() {
                return None;
            }
            let seconds = lesson
                .get("time")
                .and_then(Value::as_f64)
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(0.0);
            total_seconds += seconds;

            Some(CourseItem {
                title,
                duration: seconds_to_minutes(seconds),
                uses_code_example: lesson.get("type").and_then(Value::as_str)
                    == Some(NOTEBOOK_LESSON),
            })
        })
        .collect();

    (!items.is_empty()).then_some((items, total_seconds))
}

/// Flatten a CMS rich-text value (string, array, or `text`/`content`/`children`
/// node) to plain text.
pub(crate) fn block_text(value: &Value, preserve_line_breaks: bool) -> Option<String> {
    let text = match value {
        Value::String(s) => {
            let stripped = strip_html(&decode_html_entities(s), preserve_line_breaks);
            finish(&stripped, preserve_line_breaks)
        }
        Value::Array(parts) => {
            let parts: Vec<String> = parts
                .iter()
                .filter_map(|part| block_text(part, preserve_line_breaks))
                .collect();
            let separator = if preserve_line_breaks { "\n" } else { " " };
            finish(&parts.join(separator), preserve_line_breaks)
        }
        Value::Object(node) => {
            let inner = ["text", "content"]
                .iter()
                .find_map(|key| node.get(*key).filter(|v| v.is_string()))
                .or_else(|| node.get("children").filter(|v| v.is_array()))?;
            return block_text(inner, preserve_line_breaks);
        }
        _ => return None,
    };

    (!text.is_empty()).then_some(text)
}

fn finish(text: &str, preserve_line_breaks: bool) -> String {
    if preserve_line_breaks {
        sanitize_multiline(text)
    } else {
        sanitize_text(text)
    }
}
