//! Small DOM navigation helpers over `scraper` element references.

use std::sync::LazyLock;

use courseimport_text::{sanitize_multiline, sanitize_text};
use regex::Regex;
use scraper::{ElementRef, Selector};

static SECTION_HEADINGS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h2, h3").unwrap());
static TEXT_BLOCKS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p, li, h3, h4").unwrap());
static LIST_ITEMS: LazyLock<Selector> = LazyLock::new(|| Selector::parse("li").unwrap());
static PROSE: LazyLock<Selector> = LazyLock::new(|| Selector::parse(".prose").unwrap());

pub(crate) static ABOUT_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)about this course").expect("valid regex"));
pub(crate) static AUDIENCE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(who should join|who is this course for)").expect("valid regex")
});
pub(crate) static GOALS_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(what you[’']?ll learn|what you will learn|you will learn|learning objectives)")
        .expect("valid regex")
});

/// Whitespace-collapsed text content of an element.
pub(crate) fn text_of(el: ElementRef<'_>) -> String {
    sanitize_text(&el.text().collect::<String>())
}

pub(crate) fn is_tag(el: ElementRef<'_>, name: &str) -> bool {
    el.value().name().eq_ignore_ascii_case(name)
}

pub(crate) fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

pub(crate) fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

/// Nearest ancestor (excluding `el`) with the given tag name.
pub(crate) fn closest<'a>(el: ElementRef<'a>, name: &str) -> Option<ElementRef<'a>> {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|ancestor| is_tag(*ancestor, name))
}

pub(crate) fn next_element_siblings<'a>(
    el: ElementRef<'a>,
) -> impl Iterator<Item = ElementRef<'a>> {
    el.next_siblings().filter_map(ElementRef::wrap)
}

pub(crate) fn element_children<'a>(el: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    el.children().filter_map(ElementRef::wrap)
}

/// First `h2`/`h3` under `root` whose text matches `pattern`.
pub(crate) fn find_heading<'a>(root: ElementRef<'a>, pattern: &Regex) -> Option<ElementRef<'a>> {
    root.select(&SECTION_HEADINGS)
        .find(|heading| pattern.is_match(&text_of(*heading)))
}

/// The element holding the body of the section introduced by `heading`.
///
/// Tried in order: a following `.prose` sibling, a `.prose` block inside the
/// nearest enclosing `div`, a `section`/`article` the heading opens, the next
/// element sibling, and finally the heading's parent.
pub(crate) fn section_container(heading: ElementRef<'_>) -> Option<ElementRef<'_>> {
    if let Some(prose) = next_element_siblings(heading).find(|sibling| has_class(*sibling, "prose"))
    {
        return Some(prose);
    }

    if let Some(prose) = closest(heading, "div").and_then(|card| card.select(&PROSE).next()) {
        return Some(prose);
    }

    if let Some(parent) = parent_element(heading) {
        let opens_parent = element_children(parent)
            .next()
            .is_some_and(|first| first.id() == heading.id());
        if opens_parent && (is_tag(parent, "section") || is_tag(parent, "article")) {
            return Some(parent);
        }
    }

    next_element_siblings(heading)
        .next()
        .or_else(|| parent_element(heading))
}

/// Paragraph, sub-heading and list-item text of a container, blank-line
/// separated.
///
/// Falls back to the container's whole text when it has none of those.
pub(crate) fn container_text(container: ElementRef<'_>) -> Option<String> {
    let blocks: Vec<String> = container
        .select(&TEXT_BLOCKS)
        .map(text_of)
        .filter(|text| !text.is_empty())
        .collect();

    let text = if blocks.is_empty() {
        sanitize_multiline(&container.text().collect::<String>())
    } else {
        sanitize_multiline(&blocks.join("\n\n"))
    };

    (!text.is_empty()).then_some(text)
}

/// Non-empty `li` texts under `container`, in document order.
pub(crate) fn list_item_texts(container: ElementRef<'_>) -> Vec<String> {
    container
        .select(&LIST_ITEMS)
        .map(text_of)
        .filter(|text| !text.is_empty())
        .collect()
}

/// Body text of the section whose heading matches `pattern`.
pub(crate) fn section_text(root: ElementRef<'_>, pattern: &Regex) -> Option<String> {
    let heading = find_heading(root, pattern)?;
    let container = section_container(heading)?;
    container_text(container)
}

/// List items of the section whose heading matches `pattern`.
pub(crate) fn section_list(root: ElementRef<'_>, pattern: &Regex) -> Vec<String> {
    find_heading(root, pattern)
        .and_then(section_container)
        .map(list_item_texts)
        .unwrap_or_default()
}
