//! Schema.org `Course` nodes in `<script type="application/ld+json">` blocks.

use std::collections::HashSet;
use std::sync::LazyLock;

use courseimport_shared::{Confidence, Instructor};
use courseimport_text::{
    decode_html_entities, normalize_difficulty, parse_iso_duration_to_minutes, sanitize_multiline, sanitize_text,
    strip_html,
};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

use super::next_data::parse_payload;
use super::outline::extract_outline_items;
use super::{Extraction, Extractor};
use crate::draft::PartialCourseDraft;

static TYPED_SCRIPTS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script[type]").unwrap());

const LD_JSON_TYPE: &str = "application/ld+json";
const INSTRUCTOR_KEYS: &[&str] = &["instructor", "creator", "teacher"];

/// Maps every `Course`-typed JSON-LD node to a draft.
pub struct LinkedDataExtractor;

impl Extractor for LinkedDataExtractor {
    fn name(&self) -> &'static str {
        "json-ld"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Medium
    }

    fn extract(&self, _html: &str, doc: &Html) -> Extraction {
        let mut extraction = Extraction::default();

        let blocks = doc.select(&TYPED_SCRIPTS).filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case(LD_JSON_TYPE))
        });

        for (index, script) in blocks.enumerate() {
            let raw: String = script.text().collect();
            if raw.trim().is_empty() {
                continue;
            }
            let Some(payload) = parse_payload(&raw) else {
                warn!(block = index, "unparseable JSON-LD block");
                extraction.warn("Failed to parse JSON-LD block");
                continue;
            };

            for course in course_nodes(&payload) {
                let draft = course_draft(course);
                debug!(block = index, fields = draft.field_count(), "json-ld course");
                extraction.push(draft);
            }
        }

        extraction
    }
}

/// `Course`-typed objects in document order. Arrays and `@graph` wrappers are
/// flattened; other objects are searched for nested courses.
fn course_nodes(root: &Value) -> Vec<&Value> {
    let mut courses = Vec::new();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        match node {
            Value::Array(elements) => stack.extend(elements.iter().rev()),
            Value::Object(_) if is_course(node) => courses.push(node),
            Value::Object(object) => {
                let children: Vec<&Value> = object
                    .values()
                    .filter(|v| v.is_array() || v.is_object())
                    .collect();
                stack.extend(children.into_iter().rev());
            }
            _ => {}
        }
    }

    courses
}

/// `@type` names a course in any spelling: `Course`, `schema:Course`,
/// `https://schema.org/Course`.
fn is_course(node: &Value) -> bool {
    let names_course = |t: &str| t.to_lowercase().contains("course");
    match node.get("@type") {
        Some(Value::String(t)) => names_course(t),
        Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).any(names_course),
        _ => false,
    }
}

fn course_draft(course: &Value) -> PartialCourseDraft {
    let mut draft = PartialCourseDraft {
        title: string_field(course, "name").map(|s| sanitize_text(&s)),
        description: string_field(course, "description")
            .map(|s| sanitize_multiline(&decode_html_entities(&strip_html(&s, true)))),
        url: string_field(course, "url"),
        ..Default::default()
    };

    draft.learning_goals = match course.get("learningOutcome") {
        Some(Value::String(text)) => Some(split_sentences(text)),
        Some(Value::Array(outcomes)) => Some(
            outcomes
                .iter()
                .filter_map(Value::as_str)
                .map(sanitize_text)
                .collect(),
        ),
        _ => None,
    };

    draft.student_profile = match course.get("audience") {
        Some(Value::String(text)) => Some(sanitize_text(text)),
        Some(Value::Array(audiences)) => audiences
            .iter()
            .find_map(|a| a.get("description")?.as_str())
            .map(sanitize_text),
        Some(audience) => audience
            .get("description")
            .and_then(Value::as_str)
            .map(sanitize_text),
        None => None,
    };

    draft.difficulty = ["educationalLevel", "level"]
        .iter()
        .filter_map(|key| match course.get(*key)? {
            Value::String(s) => Some(s.clone()),
            level => level.get("name")?.as_str().map(str::to_string),
        })
        .find(|level| normalize_difficulty(level).is_some());

    draft.duration = ["timeRequired", "duration"]
        .iter()
        .filter_map(|key| course.get(*key)?.as_str())
        .chain(
            ["hasCourseInstance", "courseInstance"]
                .iter()
                .filter_map(|key| course.get(*key))
                .flat_map(one_or_many)
                .filter_map(|instance| instance.get("courseWorkload")?.as_str()),
        )
        .find_map(parse_iso_duration_to_minutes)
        .map(f64::from);

    draft.instructors = Some(instructors(course));

    let items = extract_outline_items(course);
    let outline_has_code = items.iter().any(|item| item.uses_code_example);
    draft.course_items = Some(items);

    let keyword_code = match course.get("keywords") {
        Some(Value::String(keywords)) => mentions_code_examples(keywords),
        Some(Value::Array(keywords)) => keywords
            .iter()
            .filter_map(Value::as_str)
            .any(mentions_code_examples),
        _ => false,
    };
    if keyword_code || outline_has_code {
        draft.uses_code_examples = Some(true);
    }

    drop_empty(draft)
}

fn instructors(course: &Value) -> Vec<Instructor> {
    let mut seen = HashSet::new();
    INSTRUCTOR_KEYS
        .iter()
        .filter_map(|key| course.get(*key))
        .flat_map(one_or_many)
        .filter_map(|person| match person {
            Value::String(name) => Some(Instructor {
                name: sanitize_text(name),
                title: "Instructor".to_string(),
            }),
            Value::Object(_) => {
                let name = sanitize_text(person.get("name")?.as_str()?);
                let title = person
                    .get("jobTitle")
                    .and_then(Value::as_str)
                    .map(sanitize_text)
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| "Instructor".to_string());
                Some(Instructor { name, title })
            }
            _ => None,
        })
        .filter(|instructor| !instructor.name.is_empty())
        .filter(|instructor| seen.insert(instructor.name.to_lowercase()))
        .collect()
}

fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(values) => values.iter().collect(),
        other => vec![other],
    }
}

fn string_field(node: &Value, key: &str) -> Option<String> {
    node.get(key)?.as_str().map(str::to_string)
}

fn mentions_code_examples(keywords: &str) -> bool {
    keywords.to_lowercase().contains("code example")
}

/// Sentences with their terminators kept; line breaks also separate.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            sentences.push(std::mem::take(&mut current));
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') && chars.peek().is_some_and(|next| next.is_whitespace()) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);

    sentences
        .iter()
        .map(|s| sanitize_text(s))
        .filter(|s| !s.is_empty())
        .collect()
}

/// Clear fields that carry no information so they cannot win a merge.
fn drop_empty(mut draft: PartialCourseDraft) -> PartialCourseDraft {
    fn non_empty_str(value: Option<String>) -> Option<String> {
        value.filter(|s| !s.is_empty())
    }
    fn non_empty_vec<T>(value: Option<Vec<T>>) -> Option<Vec<T>> {
        value.filter(|v| !v.is_empty())
    }

    draft.title = non_empty_str(draft.title);
    draft.description = non_empty_str(draft.description);
    draft.student_profile = non_empty_str(draft.student_profile);
    draft.url = non_empty_str(draft.url);
    draft.learning_goals = non_empty_vec(draft.learning_goals.map(|goals| {
        goals.into_iter().filter(|g| !g.is_empty()).collect()
    }));
    draft.instructors = non_empty_vec(draft.instructors);
    draft.course_items = non_empty_vec(draft.course_items);
    draft
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(blocks: &[&str]) -> Extraction {
        let scripts: String = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect();
        let doc = Html::parse_document(&format!("<html><head>{scripts}</head><body></body></html>"));
        LinkedDataExtractor.extract("", &doc)
    }

    #[test]
    fn maps_course_fields() {
        let extraction = run(&[r#"{
            "@context": "https://schema.org",
            "@type": "Course",
            "name": "Retrieval   Basics",
            "description": "<p>Search &amp; rank.</p>",
            "learningOutcome": "Index documents. Rank results!\nEvaluate recall",
            "audience": { "@type": "Audience", "description": "Backend engineers" },
            "educationalLevel": "Beginner",
            "timeRequired": "PT1H30M",
            "instructor": [
                { "@type": "Person", "name": "Ada Lovelace", "jobTitle": "Researcher" },
                { "@type": "Person", "name": "ada lovelace" }
            ],
            "creator": "Grace Hopper",
            "keywords": ["retrieval", "Code Examples"]
        }"#]);

        assert!(extraction.warnings.is_empty());
        let draft = &extraction.drafts[0];
        assert_eq!(draft.title.as_deref(), Some("Retrieval Basics"));
        assert_eq!(draft.description.as_deref(), Some("Search & rank."));
        assert_eq!(
            draft.learning_goals.as_deref(),
            Some(
                &[
                    "Index documents.".to_string(),
                    "Rank results!".to_string(),
                    "Evaluate recall".to_string()
                ][..]
            )
        );
        assert_eq!(draft.student_profile.as_deref(), Some("Backend engineers"));
        assert_eq!(draft.difficulty.as_deref(), Some("Beginner"));
        assert_eq!(draft.duration, Some(90.0));

        let instructors = draft.instructors.as_ref().unwrap();
        assert_eq!(instructors.len(), 2);
        assert_eq!(instructors[0].title, "Researcher");
        assert_eq!(instructors[1].name, "Grace Hopper");
        assert_eq!(instructors[1].title, "Instructor");

        assert_eq!(draft.uses_code_examples, Some(true));
        assert!(draft.course_items.is_none());
    }

    #[test]
    fn finds_courses_inside_graph_and_type_arrays() {
        let extraction = run(&[
            r#"{"@type": "Organization", "name": "Org"}"#,
            r#"{"@graph": [
                {"@type": "WebPage", "mainEntity": {"@type": ["COURSE", "Product"], "name": "First"}},
                {"@type": "course", "name": "Second", "learningOutcome": ["Read", "Write"]}
            ]}"#,
        ]);

        let titles: Vec<_> = extraction
            .drafts
            .iter()
            .filter_map(|d| d.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
        assert_eq!(extraction.drafts[1].learning_goals.as_ref().map(Vec::len), Some(2));
    }

    #[test]
    fn iri_and_prefixed_course_types() {
        let extraction = run(&[
            r#"{"@type": "https://schema.org/Course", "name": "IRI typed"}"#,
            r#"{"@type": ["Thing", "schema:Course"], "name": "Prefixed"}"#,
        ]);

        let titles: Vec<_> = extraction
            .drafts
            .iter()
            .filter_map(|d| d.title.as_deref())
            .collect();
        assert_eq!(titles, vec!["IRI typed", "Prefixed"]);
    }

    #[test]
    fn encoded_description_is_decoded() {
        // The decoded payload is not valid JSON, so the raw block is parsed.
        let extraction = run(&[r#"{
            "@type": "Course",
            "name": "Quoting",
            "description": "<p>Say &quot;hello&quot; and it&#8217;s fine.</p>"
        }"#]);
        assert_eq!(
            extraction.drafts[0].description.as_deref(),
            Some("Say \"hello\" and it's fine.")
        );
    }

    #[test]
    fn course_workload_supplies_duration() {
        let extraction = run(&[r#"{
            "@type": "Course",
            "name": "Workload",
            "hasCourseInstance": [{"@type": "CourseInstance", "courseWorkload": "PT2H"}]
        }"#]);
        assert_eq!(extraction.drafts[0].duration, Some(120.0));
    }

    #[test]
    fn outline_populates_items() {
        let extraction = run(&[r#"{
            "@type": "Course",
            "name": "Outlined",
            "hasPart": [
                {"@type": "LearningResource", "name": "Notebook lab", "timeRequired": "PT10M"},
                {"@type": "LearningResource", "name": "Recap", "timeRequired": "PT3M"}
            ]
        }"#]);
        let draft = &extraction.drafts[0];
        let items = draft.course_items.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].uses_code_example);
        assert_eq!(draft.uses_code_examples, Some(true));
    }

    #[test]
    fn malformed_block_warns_and_others_still_count() {
        let extraction = run(&[r#"{"@type": "Course", "name": "#, r#"{"@type": "Course", "name": "Ok"}"#]);
        assert_eq!(extraction.warnings, vec!["Failed to parse JSON-LD block"]);
        assert_eq!(extraction.drafts.len(), 1);
        assert_eq!(extraction.drafts[0].title.as_deref(), Some("Ok"));
    }

    #[test]
    fn unrecognized_level_is_ignored() {
        let extraction = run(&[r#"{"@type": "Course", "name": "X", "educationalLevel": "Graduate"}"#]);
        assert!(extraction.drafts[0].difficulty.is_none());
    }
}
