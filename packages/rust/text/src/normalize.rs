//! Whitespace, entity, and tag normalization for scraped text.

use std::sync::LazyLock;

use regex::{Captures, Regex};

// ---------------------------------------------------------------------------
// Whitespace
// ---------------------------------------------------------------------------

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapse every whitespace run to a single space and trim.
///
/// Used for single-line fields (titles, names, list items).
pub fn sanitize_text(value: &str) -> String {
    WHITESPACE_RE.replace_all(value, " ").trim().to_string()
}

/// Normalize paragraph text while keeping its line structure.
///
/// Each line is collapsed and trimmed, runs of blank lines become a single
/// blank line, and leading/trailing blank lines are dropped.
pub fn sanitize_multiline(value: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for raw in value.lines() {
        let line = sanitize_text(raw);
        if line.is_empty() {
            if lines.last().is_none_or(|last| last.is_empty()) {
                continue;
            }
        }
        lines.push(line);
    }

    lines.join("\n").trim().to_string()
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#(\d+)|#[xX]([0-9a-fA-F]+)|([a-zA-Z]+));").expect("valid regex")
});

fn named_entity(name: &str) -> Option<char> {
    let c = match name.to_ascii_lowercase().as_str() {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{00A0}',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        _ => return None,
    };
    Some(c)
}

/// Map typographic spaces and quotes to their ASCII counterparts.
fn ascii_variant(c: char) -> char {
    match c {
        '\u{00A0}' | '\u{2009}' | '\u{200A}' | '\u{202F}' => ' ',
        '\u{2018}' | '\u{2019}' | '\u{2032}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{2033}' => '"',
        other => other,
    }
}

/// Decode numeric and a fixed set of named HTML entities.
///
/// Decoded quotes, apostrophes and non-breaking spaces come out as ASCII.
/// Unknown entities and invalid code points are left untouched.
pub fn decode_html_entities(value: &str) -> String {
    ENTITY_RE
        .replace_all(value, |caps: &Captures| {
            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str().parse::<u32>().ok().and_then(char::from_u32)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
            } else {
                caps.get(3).and_then(|name| named_entity(name.as_str()))
            };

            match decoded {
                Some(c) => ascii_variant(c).to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tags
// ---------------------------------------------------------------------------

static SCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script\s*>").expect("valid regex"));
static STYLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style\s*>").expect("valid regex"));
static BR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?\s*>").expect("valid regex"));
static BLOCK_CLOSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</(?:p|div|section|article|li|ul|ol|h[1-6])\s*>").expect("valid regex")
});
static BLOCK_OPEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)<(?:p|div|section|article|li|ul|ol|h[1-6])\b[^>]*>").expect("valid regex")
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex"));

/// Remove markup from an HTML fragment.
///
/// `<script>` and `<style>` blocks are dropped with their contents. With
/// `preserve_line_breaks`, `<br>` and block-level tags become newlines and the
/// remaining tags vanish; otherwise every tag becomes a single space.
pub fn strip_html(html: &str, preserve_line_breaks: bool) -> String {
    let without_scripts = SCRIPT_RE.replace_all(html, "");
    let mut value = STYLE_RE.replace_all(&without_scripts, "").into_owned();

    if preserve_line_breaks {
        value = BR_RE.replace_all(&value, "\n").into_owned();
        value = BLOCK_CLOSE_RE.replace_all(&value, "\n").into_owned();
        value = BLOCK_OPEN_RE.replace_all(&value, "\n").into_owned();
    }

    let replacement = if preserve_line_breaks { "" } else { " " };
    TAG_RE.replace_all(&value, replacement).into_owned()
}
