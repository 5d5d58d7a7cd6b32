//! Lesson outline discovery inside a JSON-LD `Course` node.

use std::collections::{HashSet, VecDeque};
use std::sync::LazyLock;

use courseimport_shared::CourseItem;
use courseimport_text::{parse_iso_duration_to_minutes, sanitize_text};
use regex::Regex;
use serde_json::Value;

use crate::draft::seconds_to_minutes;

/// Course properties that may hold lessons.
const OUTLINE_RELATIONS: &[&str] = &[
    "hasPart",
    "teaches",
    "courseInstance",
    "hasCourseInstance",
    "itemListElement",
    "hasCourseWork",
    "workExample",
];

/// Links followed from one outline node to the next.
const NESTED_RELATIONS: &[&str] = &["itemListElement", "hasPart"];

const TITLE_KEYS: &[&str] = &["name", "headline", "title"];
const DURATION_KEYS: &[&str] = &["timeRequired", "duration", "typicalLearningTime"];
const SECONDS_KEYS: &[&str] = &["seconds", "durationSeconds", "time"];
const POSITION_KEYS: &[&str] = &["position", "index"];

static CODE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code|notebook|script|demo").expect("valid regex"));

struct Candidate {
    order: usize,
    position: Option<f64>,
    item: CourseItem,
}

/// Collect lesson items reachable from `course` through outline relations.
///
/// Traversal is breadth-first over an explicit queue and visits each node at
/// most once. `ListItem` wrappers pass their position down to the wrapped
/// `item`. Nodes that expand into nested parts are treated as containers, not
/// lessons. The result is ordered by position (unpositioned nodes keep
/// discovery order after positioned ones) and deduplicated by
/// case-insensitive title.
pub fn extract_outline_items(course: &Value) -> Vec<CourseItem> {
    let mut queue: VecDeque<(&Value, Option<f64>)> = VecDeque::new();
    for relation in OUTLINE_RELATIONS {
        if let Some(value) = course.get(*relation) {
            queue.push_back((value, None));
        }
    }

    let mut visited: HashSet<*const Value> = HashSet::new();
    let mut candidates: Vec<Candidate> = Vec::new();

    while let Some((node, inherited_position)) = queue.pop_front() {
        if !visited.insert(std::ptr::from_ref(node)) {
            continue;
        }

        let object = match node {
            Value::Array(elements) => {
                queue.extend(elements.iter().map(|element| (element, inherited_position)));
                continue;
            }
            Value::Object(object) => object,
            _ => continue,
        };

        let position = first_number(node, POSITION_KEYS).or(inherited_position);

        if let Some(wrapped) = object.get("item").filter(|item| item.is_object()) {
            queue.push_back((wrapped, position));
            continue;
        }

        let mut is_container = false;
        for relation in NESTED_RELATIONS {
            if let Some(nested) = object.get(*relation).filter(|v| v.is_array() || v.is_object()) {
                queue.push_back((nested, None));
                is_container = true;
            }
        }
        if is_container {
            continue;
        }

        if let Some(item) = lesson_item(node) {
            candidates.push(Candidate {
                order: candidates.len(),
                position,
                item,
            });
        }
    }

    candidates.sort_by(|a, b| match (a.position, b.position) {
        (Some(x), Some(y)) => x.total_cmp(&y).then(a.order.cmp(&b.order)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.order.cmp(&b.order),
    });

    let mut seen_titles = HashSet::new();
    candidates
        .into_iter()
        .map(|candidate| candidate.item)
        .filter(|item| seen_titles.insert(item.title.to_lowercase()))
        .collect()
}

fn lesson_item(node: &Value) -> Option<CourseItem> {
    let title = TITLE_KEYS
        .iter()
        .filter_map(|key| node.get(*key)?.as_str())
        .map(sanitize_text)
        .find(|title| !title.is_empty())?;

    let mut hint_text = title.clone();
    if let Some(description) = node.get("description").and_then(Value::as_str) {
        hint_text.push(' ');
        hint_text.push_str(description);
    }
    match node.get("keywords") {
        Some(Value::String(keywords)) => {
            hint_text.push(' ');
            hint_text.push_str(keywords);
        }
        Some(Value::Array(keywords)) => {
            for keyword in keywords.iter().filter_map(Value::as_str) {
                hint_text.push(' ');
                hint_text.push_str(keyword);
            }
        }
        _ => {}
    }

    Some(CourseItem {
        title,
        duration: lesson_minutes(node),
        uses_code_example: CODE_HINT.is_match(&hint_text),
    })
}

/// An ISO-8601 duration field, then a bare number (hours below 10, minutes
/// otherwise), then a seconds field.
fn lesson_minutes(node: &Value) -> u32 {
    let iso = DURATION_KEYS
        .iter()
        .filter_map(|key| node.get(*key)?.as_str())
        .find_map(parse_iso_duration_to_minutes);
    if let Some(minutes) = iso {
        return minutes;
    }

    if let Some(amount) = first_number(node, DURATION_KEYS).filter(|n| *n > 0.0) {
        let minutes = if amount < 10.0 { amount * 60.0 } else { amount };
        return minutes.round().min(u32::MAX as f64) as u32;
    }

    first_number(node, SECONDS_KEYS)
        .map(seconds_to_minutes)
        .unwrap_or(0)
}

/// First finite numeric value (number or numeric string) under `keys`.
fn first_number(node: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| match node.get(*key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        })
        .find(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn titles(items: &[CourseItem]) -> Vec<&str> {
        items.iter().map(|item| item.title.as_str()).collect()
    }

    #[test]
    fn item_list_respects_positions() {
        let course = json!({
            "@type": "Course",
            "hasPart": {
                "@type": "ItemList",
                "itemListElement": [
                    { "@type": "ListItem", "position": 3, "item": { "name": "Wrap-up", "timeRequired": "PT5M" } },
                    { "@type": "ListItem", "position": 1, "item": { "name": "Intro", "timeRequired": "PT4M" } },
                    { "@type": "ListItem", "position": 2, "item": { "name": "Code walkthrough", "timeRequired": "PT12M" } }
                ]
            }
        });

        let items = extract_outline_items(&course);
        assert_eq!(titles(&items), vec!["Intro", "Code walkthrough", "Wrap-up"]);
        assert_eq!(items[0].duration, 4);
        assert!(items[1].uses_code_example);
        assert!(!items[2].uses_code_example);
    }

    #[test]
    fn unpositioned_lessons_follow_positioned_ones() {
        let course = json!({
            "hasPart": [
                { "name": "Bonus" },
                { "name": "Second", "position": 2 },
                { "name": "First", "position": "1" }
            ],
            "hasCourseWork": { "name": "Project", "description": "Jupyter notebook exercise" }
        });

        let items = extract_outline_items(&course);
        // hasCourseWork is reached before the hasPart elements are expanded.
        assert_eq!(titles(&items), vec!["First", "Second", "Project", "Bonus"]);
        assert!(items[2].uses_code_example);
    }

    #[test]
    fn duration_fallbacks() {
        let course = json!({
            "hasPart": [
                { "name": "Hours", "duration": 2 },
                { "name": "Minutes", "duration": 45 },
                { "name": "Seconds", "seconds": 150 },
                { "name": "Bad iso", "timeRequired": "soon", "time": 30 },
                { "name": "None" }
            ]
        });

        let minutes: Vec<u32> = extract_outline_items(&course)
            .iter()
            .map(|item| item.duration)
            .collect();
        assert_eq!(minutes, vec![120, 45, 3, 1, 0]);
    }

    #[test]
    fn duplicate_titles_are_dropped() {
        let course = json!({
            "hasPart": [ { "name": "Intro" }, { "name": "Setup" } ],
            "workExample": [ { "headline": "intro" }, { "title": "Deploy", "keywords": ["demo"] } ]
        });

        let items = extract_outline_items(&course);
        assert_eq!(titles(&items), vec!["Intro", "Setup", "Deploy"]);
        assert!(items[2].uses_code_example);
    }

    #[test]
    fn untitled_and_scalar_nodes_are_skipped() {
        let course = json!({
            "teaches": ["Prompting", 42],
            "hasCourseInstance": { "@type": "CourseInstance", "courseMode": "online" }
        });
        assert!(extract_outline_items(&course).is_empty());
    }
}
