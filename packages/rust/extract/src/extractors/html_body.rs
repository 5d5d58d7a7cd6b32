//! Heuristics over the rendered page body.

use std::collections::HashSet;
use std::sync::LazyLock;

use courseimport_shared::{Confidence, CourseItem, Instructor};
use courseimport_text::{normalize_difficulty, parse_duration_from_display};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::{Extraction, Extractor};
use crate::dom::{
    self, ABOUT_HEADING, AUDIENCE_HEADING, GOALS_HEADING, element_children, find_heading, is_tag,
    next_element_siblings, parent_element, text_of,
};
use crate::draft::PartialCourseDraft;

static H1: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h1").unwrap());
static H2: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static H3: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h3").unwrap());
static P: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static LI: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static LISTS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("ul, ol").unwrap());
static HERO: LazyLock<Selector> = LazyLock::new(|| Selector::parse("[data-hero]").unwrap());
static FEATURES_GRID: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#features-grid").unwrap());
static OUTLINE_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#course-outline").unwrap());
static LESSONS_LIST: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"ul[data-sentry-component="Lessons"]"#).unwrap());
static LESSON_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.text-base").unwrap());
static LESSON_DETAIL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.text-sm").unwrap());
static INSTRUCTORS_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#instructors").unwrap());
static INSTRUCTOR_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("#instructor-title").unwrap());

static OUTLINE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)course outline").expect("valid regex"));
static INSTRUCTOR_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)instructor").expect("valid regex"));
static CODE_EXAMPLE_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*Code\s*Examples?").expect("valid regex"));
static CODE_HINT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)code|notebook|script|demo").expect("valid regex"));

/// Reads what a visitor sees: headline, hero summary, titled sections, the
/// lesson outline and instructor cards.
pub struct HtmlBodyExtractor;

impl Extractor for HtmlBodyExtractor {
    fn name(&self) -> &'static str {
        "html-body"
    }

    fn confidence(&self) -> Confidence {
        Confidence::Medium
    }

    fn extract(&self, _html: &str, doc: &Html) -> Extraction {
        let root = doc.root_element();
        let mut draft = PartialCourseDraft {
            title: doc
                .select(&H1)
                .next()
                .map(text_of)
                .filter(|title| !title.is_empty()),
            description: dom::section_text(root, &ABOUT_HEADING),
            student_profile: dom::section_text(root, &AUDIENCE_HEADING),
            learning_goals: learning_goals(doc),
            instructors: instructors(doc),
            ..Default::default()
        };

        let hero = hero_summary(doc);
        draft.difficulty = hero.difficulty;

        if let Some(outline) = course_outline(doc) {
            let total: u32 = outline.items.iter().map(|item| item.duration).sum();
            let any_flagged = outline.items.iter().any(|item| item.uses_code_example);
            draft.uses_code_examples = match outline.code_examples {
                Some(count) if count > 0 => Some(true),
                _ if any_flagged => Some(true),
                Some(0) => Some(false),
                _ => None,
            };
            if hero.duration.is_none() && total > 0 {
                draft.duration = Some(f64::from(total));
            }
            draft.course_items = Some(outline.items);
        }
        if let Some(minutes) = hero.duration {
            draft.duration = Some(f64::from(minutes));
        }

        debug!(fields = draft.field_count(), "html-body draft");
        Extraction::from_draft(draft)
    }
}

// ---------------------------------------------------------------------------
// Hero summary
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct HeroSummary {
    difficulty: Option<String>,
    duration: Option<u32>,
}

/// Difficulty and stated length from the hero block's summary list.
///
/// The hero is `[data-hero]`. Without one, only a list inside the first
/// `h1` or immediately after it counts, so outline and instructor lists
/// elsewhere in a page-wide wrapper are never read as the summary.
fn hero_summary(doc: &Html) -> HeroSummary {
    let entries: Vec<String> = match doc.select(&HERO).next() {
        Some(hero) => hero.select(&LI).map(text_of).collect(),
        None => match doc.select(&H1).next() {
            Some(h1) => element_children(h1)
                .chain(next_element_siblings(h1).next())
                .filter(|el| is_tag(*el, "ul") || is_tag(*el, "ol"))
                .flat_map(element_children)
                .filter(|el| is_tag(*el, "li"))
                .map(text_of)
                .collect(),
            None => return HeroSummary::default(),
        },
    };

    HeroSummary {
        difficulty: entries
            .iter()
            .find(|entry| normalize_difficulty(entry).is_some())
            .cloned(),
        duration: entries
            .iter()
            .filter(|entry| entry.chars().any(|c| c.is_ascii_alphabetic()))
            .find_map(|entry| parse_duration_from_display(entry)),
    }
}

// ---------------------------------------------------------------------------
// Learning goals
// ---------------------------------------------------------------------------

fn learning_goals(doc: &Html) -> Option<Vec<String>> {
    let goals = match doc.select(&FEATURES_GRID).next() {
        Some(grid) => dom::list_item_texts(grid),
        None => dom::section_list(doc.root_element(), &GOALS_HEADING),
    };
    (!goals.is_empty()).then_some(goals)
}

// ---------------------------------------------------------------------------
// Course outline
// ---------------------------------------------------------------------------

struct Outline {
    items: Vec<CourseItem>,
    /// Stated number of code examples, when the summary line gives one.
    code_examples: Option<u32>,
}

fn course_outline(doc: &Html) -> Option<Outline> {
    let outline = match doc.select(&OUTLINE_ANCHOR).next() {
        Some(anchor) => anchored_outline(anchor),
        None => headed_outline(doc.root_element()),
    }?;
    (!outline.items.is_empty()).then_some(outline)
}

/// Layout with an `#course-outline` anchor followed by a summary card and a
/// `Lessons` list whose entries hold `p.text-base` titles and `p.text-sm`
/// details.
fn anchored_outline(anchor: ElementRef<'_>) -> Option<Outline> {
    let following: Vec<ElementRef<'_>> = next_element_siblings(anchor)
        .filter(|el| is_tag(*el, "div"))
        .collect();

    let code_examples = following
        .iter()
        .find(|div| {
            div.select(&H2)
                .next()
                .is_some_and(|h2| OUTLINE_HEADING.is_match(&text_of(h2)))
        })
        .and_then(|summary| code_example_count(&text_of(*summary)));

    let list = following
        .iter()
        .find_map(|div| div.select(&LESSONS_LIST).next())?;

    let items = element_children(list)
        .filter(|el| is_tag(*el, "li"))
        .filter_map(|li| {
            let title = li
                .select(&LESSON_TITLE)
                .next()
                .or_else(|| li.select(&P).next())
                .map(text_of)
                .filter(|title| !title.is_empty())?;
            let detail = li.select(&LESSON_DETAIL).next().map(text_of).unwrap_or_default();
            Some(lesson(title, &detail, &text_of(li)))
        })
        .collect();

    Some(Outline { items, code_examples })
}

/// Plain layout: a "Course Outline" heading followed by a list whose entries
/// start with the lesson title and carry type and length in later children.
fn headed_outline(root: ElementRef<'_>) -> Option<Outline> {
    let heading = find_heading(root, &OUTLINE_HEADING)?;
    let scope = parent_element(heading)?;
    let code_examples = code_example_count(&text_of(scope));

    let list = next_element_siblings(heading).find_map(|sibling| {
        if is_tag(sibling, "ul") || is_tag(sibling, "ol") {
            Some(sibling)
        } else {
            sibling.select(&LISTS).next()
        }
    })?;

    let items = element_children(list)
        .filter(|el| is_tag(*el, "li"))
        .filter_map(|li| {
            let full_text = text_of(li);
            let mut parts = element_children(li);
            let (title, detail) = match parts.next() {
                Some(first) => {
                    let rest: Vec<String> = parts.map(text_of).collect();
                    (text_of(first), rest.join(" "))
                }
                None => (full_text.clone(), String::new()),
            };
            (!title.is_empty()).then(|| lesson(title, &detail, &full_text))
        })
        .collect();

    Some(Outline { items, code_examples })
}

fn lesson(title: String, detail: &str, full_text: &str) -> CourseItem {
    CourseItem {
        title,
        duration: parse_duration_from_display(detail)
            .or_else(|| parse_duration_from_display(full_text))
            .unwrap_or(0),
        uses_code_example: CODE_HINT.is_match(detail),
    }
}

fn code_example_count(summary: &str) -> Option<u32> {
    CODE_EXAMPLE_COUNT
        .captures(summary)
        .and_then(|caps| caps[1].parse().ok())
}

// ---------------------------------------------------------------------------
// Instructors
// ---------------------------------------------------------------------------

fn instructors(doc: &Html) -> Option<Vec<Instructor>> {
    let found = match doc.select(&INSTRUCTORS_ANCHOR).next() {
        Some(anchor) => anchored_instructors(anchor),
        None => headed_instructors(doc.root_element()),
    };

    let mut seen = HashSet::new();
    let unique: Vec<Instructor> = found
        .into_iter()
        .filter(|instructor| seen.insert(instructor.name.to_lowercase()))
        .collect();
    (!unique.is_empty()).then_some(unique)
}

/// `#instructors` anchor, then an "Instructors" `h2`, then a container of
/// cards with an `h3` name and an `#instructor-title` role.
fn anchored_instructors(anchor: ElementRef<'_>) -> Vec<Instructor> {
    let Some(heading) = next_element_siblings(anchor)
        .filter(|el| is_tag(*el, "h2"))
        .find(|h2| INSTRUCTOR_HEADING.is_match(&text_of(*h2)))
    else {
        return Vec::new();
    };
    let Some(container) = next_element_siblings(heading).next() else {
        return Vec::new();
    };

    instructor_cards(container)
        .into_iter()
        .filter_map(|card| {
            let role = card.select(&INSTRUCTOR_TITLE).next().map(text_of);
            card_instructor(card, role)
        })
        .collect()
}

/// An "Instructors" heading followed by cards with an `h3` name and the role
/// in the first paragraph.
fn headed_instructors(root: ElementRef<'_>) -> Vec<Instructor> {
    let Some(heading) = find_heading(root, &INSTRUCTOR_HEADING) else {
        return Vec::new();
    };

    let level = heading_level(heading).unwrap_or(6);
    next_element_siblings(heading)
        .take_while(|el| heading_level(*el).is_none_or(|next| next > level))
        .flat_map(instructor_cards)
        .filter_map(|card| {
            let role = card
                .select(&INSTRUCTOR_TITLE)
                .next()
                .or_else(|| card.select(&P).next())
                .map(text_of);
            card_instructor(card, role)
        })
        .collect()
}

/// `1` for `h1` through `6` for `h6`.
fn heading_level(el: ElementRef<'_>) -> Option<u8> {
    match el.value().name().to_ascii_lowercase().as_str() {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

/// Innermost `div`s at or under `container` that hold an `h3`.
fn instructor_cards(container: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let holds_name = |el: ElementRef<'_>| is_tag(el, "div") && el.select(&H3).next().is_some();

    container
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| holds_name(*el))
        .filter(|el| {
            !el.descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(holds_name)
        })
        .collect()
}

fn card_instructor(card: ElementRef<'_>, role: Option<String>) -> Option<Instructor> {
    let name = card.select(&H3).next().map(text_of)?;
    if name.is_empty() {
        return None;
    }
    let title = role
        .filter(|role| !role.is_empty())
        .unwrap_or_else(|| "Instructor".to_string());
    Some(Instructor { name, title })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> String {
        let path = format!(
            "{}/../../../fixtures/html/{name}",
            env!("CARGO_MANIFEST_DIR")
        );
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
    }

    fn extract(html: &str) -> Extraction {
        HtmlBodyExtractor.extract(html, &Html::parse_document(html))
    }

    #[test]
    fn plain_layout_fixture() {
        let html = fixture("claude-code.html");
        let draft = extract(&html).drafts.remove(0);

        assert_eq!(
            draft.title.as_deref(),
            Some("Claude Code: A Highly Agentic Coding Assistant")
        );
        assert_eq!(draft.difficulty.as_deref(), Some("Intermediate"));
        assert_eq!(draft.duration, Some(110.0));
        assert_eq!(draft.learning_goals.as_ref().map(Vec::len), Some(3));
        assert!(
            draft
                .description
                .as_deref()
                .unwrap()
                .starts_with("In this course, you’ll learn best practices")
        );
        assert!(
            draft
                .student_profile
                .as_deref()
                .unwrap()
                .ends_with("familiar with Python and Git.")
        );

        let items = draft.course_items.as_ref().unwrap();
        assert_eq!(items.len(), 13);
        assert_eq!(items[0].title, "Introduction");
        assert_eq!(items[0].duration, 4);
        assert!(items.iter().all(|item| !item.uses_code_example));
        assert_eq!(items.iter().map(|item| item.duration).sum::<u32>(), 107);
        assert_eq!(draft.uses_code_examples, Some(false));

        let instructors = draft.instructors.as_ref().unwrap();
        assert_eq!(
            instructors,
            &vec![Instructor {
                name: "Elie Schoppik".into(),
                title: "Head of Technical Education at Anthropic".into(),
            }]
        );
    }

    #[test]
    fn plain_layout_with_code_examples() {
        let html = fixture("knowledge-graphs.html");
        let draft = extract(&html).drafts.remove(0);

        let flags: Vec<bool> = draft
            .course_items
            .as_ref()
            .unwrap()
            .iter()
            .map(|item| item.uses_code_example)
            .collect();
        assert_eq!(flags, vec![false, false, true, true, true, true, false, false]);
        assert_eq!(draft.uses_code_examples, Some(true));
        assert_eq!(draft.duration, Some(74.0));

        let names: Vec<_> = draft
            .instructors
            .as_ref()
            .unwrap()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Pavithra G K", "Lars Heling"]);
    }

    #[test]
    fn anchored_layout() {
        let html = r#"<html><body>
            <h1>Agent Memory</h1>
            <div id="features-grid"><ul><li>Persist state</li><li>Recall facts</li></ul></div>
            <a id="course-outline"></a>
            <div><h2>Course Outline</h2><span>3 Lessons・2 Code Examples</span></div>
            <div><ul data-sentry-component="Lessons">
                <li><p class="text-base">Welcome</p><p class="text-sm">Video・3 mins</p></li>
                <li><p class="text-base">Memory tools</p><p class="text-sm">Video with Code Example・14 mins</p></li>
                <li><p>Wrap up</p><span>2 mins</span></li>
                <li><p class="text-base"> </p></li>
            </ul></div>
            <a id="instructors"></a>
            <h2>Instructors</h2>
            <div>
              <div><div><h3>Ada Lovelace</h3><p id="instructor-title">Researcher</p></div></div>
              <div><h3>Grace Hopper</h3></div>
            </div>
        </body></html>"#;

        let draft = extract(html).drafts.remove(0);
        assert_eq!(draft.title.as_deref(), Some("Agent Memory"));
        assert_eq!(
            draft.learning_goals,
            Some(vec!["Persist state".to_string(), "Recall facts".to_string()])
        );

        let items = draft.course_items.as_ref().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].duration, 14);
        assert!(items[1].uses_code_example);
        assert_eq!(items[2].duration, 2);
        assert_eq!(draft.duration, Some(19.0));
        assert_eq!(draft.uses_code_examples, Some(true));
        assert!(draft.difficulty.is_none());

        let instructors = draft.instructors.as_ref().unwrap();
        assert_eq!(instructors.len(), 2);
        assert_eq!(instructors[0].title, "Researcher");
        assert_eq!(instructors[1].title, "Instructor");
    }

    #[test]
    fn page_wide_wrapper_is_not_a_hero() {
        let html = r#"<html><body><main>
            <h1>Data Pipelines</h1>
            <p>Move data reliably.</p>
            <section><h2>Course Outline</h2><ul>
                <li>Introduction Video 4 mins</li>
                <li>Ingest batches Video 20 mins</li>
            </ul></section>
        </main></body></html>"#;

        let draft = extract(html).drafts.remove(0);
        assert!(draft.difficulty.is_none());
        assert_eq!(draft.course_items.as_ref().map(Vec::len), Some(2));
        assert_eq!(draft.duration, Some(24.0));
    }

    #[test]
    fn summary_list_right_after_headline() {
        let html = r#"<html><body><main>
            <h1>Data Pipelines</h1>
            <ul><li>Advanced</li><li>2 Hours</li></ul>
            <section><h2>Course Outline</h2><ul><li>Beginner recap 5 mins</li></ul></section>
        </main></body></html>"#;

        let draft = extract(html).drafts.remove(0);
        assert_eq!(draft.difficulty.as_deref(), Some("Advanced"));
        assert_eq!(draft.duration, Some(120.0));
    }

    #[test]
    fn instructor_cards_stop_at_next_section_heading() {
        let html = r#"<html><body>
            <h2>Instructors</h2>
            <div><h3>Ada Lovelace</h3><p>Researcher</p></div>
            <h2>FAQ</h2>
            <div><div><h3>Is there a certificate?</h3><p>Yes.</p></div></div>
        </body></html>"#;

        let draft = extract(html).drafts.remove(0);
        let names: Vec<_> = draft
            .instructors
            .as_ref()
            .unwrap()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Ada Lovelace"]);
    }

    #[test]
    fn outline_without_code_count_leaves_flag_open() {
        let html = "<section><h2>Course Outline</h2><ol><li>Intro 5 mins</li></ol></section>";
        let draft = extract(html).drafts.remove(0);
        let items = draft.course_items.as_ref().unwrap();
        assert_eq!(items[0].title, "Intro 5 mins");
        assert_eq!(items[0].duration, 5);
        assert_eq!(draft.uses_code_examples, None);
    }

    #[test]
    fn page_without_signals_yields_no_draft() {
        let extraction = extract("<html><body><div>Nothing to see</div></body></html>");
        assert!(extraction.drafts.is_empty());
        assert!(extraction.warnings.is_empty());
    }
}
