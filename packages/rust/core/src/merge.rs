//! Folding extractor drafts into one suggestion set, then normalizing it.

use courseimport_extract::PartialCourseDraft;
use courseimport_shared::{Confidence, CourseFieldSuggestions, Difficulty, FieldSuggestion};
use courseimport_text::normalize_difficulty;
use tracing::debug;

/// Source label for durations recomputed from the lesson outline.
pub const COURSE_ITEMS_SOURCE: &str = "course-items";
/// Source label for the requested URL.
pub const INPUT_SOURCE: &str = "input";
/// Source label for values filled in when nothing was found.
pub const DEFAULT_SOURCE: &str = "default";

/// Course suggestions together with the review warnings collected so far.
#[derive(Debug, Clone, PartialEq)]
pub struct SuggestionSet {
    pub course: CourseFieldSuggestions,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Merger
// ---------------------------------------------------------------------------

/// Accumulates drafts into one [`CourseFieldSuggestions`] record.
///
/// A contribution replaces the current value when the current value is
/// absent or the contribution's confidence is greater than or equal to the
/// current one, so later sources win ties. Absent values and empty lists
/// never replace anything.
#[derive(Debug)]
pub struct SuggestionMerger {
    course: CourseFieldSuggestions,
    warnings: Vec<String>,
}

impl SuggestionMerger {
    pub fn new(url: &str) -> Self {
        Self {
            course: CourseFieldSuggestions::new(url),
            warnings: Vec::new(),
        }
    }

    /// The merged state so far.
    pub fn current(&self) -> &CourseFieldSuggestions {
        &self.course
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn extend_warnings(&mut self, warnings: impl IntoIterator<Item = String>) {
        self.warnings.extend(warnings);
    }

    /// Validate `draft` field by field and offer each value at `confidence`.
    pub fn fold(&mut self, draft: PartialCourseDraft, confidence: Confidence, source: &str) {
        let course = &mut self.course;

        offer(&mut course.title, non_blank(draft.title), confidence, source);
        offer(&mut course.description, non_blank(draft.description), confidence, source);
        offer(&mut course.student_profile, non_blank(draft.student_profile), confidence, source);
        offer(
            &mut course.learning_goals,
            draft
                .learning_goals
                .map(|goals| goals.into_iter().filter(|g| !g.trim().is_empty()).collect())
                .and_then(non_empty),
            confidence,
            source,
        );
        offer(
            &mut course.difficulty,
            draft.difficulty.as_deref().and_then(normalize_difficulty),
            confidence,
            source,
        );
        offer(&mut course.instructors, draft.instructors.and_then(non_empty), confidence, source);
        offer(&mut course.course_items, draft.course_items.and_then(non_empty), confidence, source);
        offer(&mut course.uses_code_examples, draft.uses_code_examples, confidence, source);
        offer(&mut course.url, non_blank(draft.url), confidence, source);

        match draft.duration {
            Some(minutes) if minutes.is_finite() && minutes >= 0.0 => {
                let minutes = minutes.round().min(f64::from(u32::MAX)) as u32;
                offer(&mut course.duration, Some(minutes), confidence, source);
            }
            Some(invalid) => {
                if replaces(&course.duration, confidence) {
                    debug!(source, value = invalid, "discarding invalid duration");
                    course.duration = FieldSuggestion {
                        value: None,
                        confidence: Confidence::Low,
                        source: course.duration.source.take(),
                    };
                    self.warnings
                        .push("Duration extracted but invalid; clearing value".to_string());
                }
            }
            None => {}
        }
    }

    pub fn finish(self) -> SuggestionSet {
        SuggestionSet {
            course: self.course,
            warnings: self.warnings,
        }
    }
}

fn replaces<T>(current: &FieldSuggestion<T>, confidence: Confidence) -> bool {
    current.value.is_none() || confidence >= current.confidence
}

fn offer<T>(field: &mut FieldSuggestion<T>, value: Option<T>, confidence: Confidence, source: &str) {
    match value {
        Some(value) if replaces(field, confidence) => {
            *field = FieldSuggestion::new(value, confidence, source);
        }
        _ => {}
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn non_empty<T>(values: Vec<T>) -> Option<Vec<T>> {
    (!values.is_empty()).then_some(values)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Final pass over merged suggestions.
///
/// Pins `url` to the requested URL, recomputes the total duration from the
/// lesson outline, and fills absent list fields, difficulty and the
/// code-example flag with low-confidence defaults. Returns the review
/// warnings this pass produced.
pub fn normalize_course_suggestions(mut course: CourseFieldSuggestions, url: &str) -> SuggestionSet {
    let mut warnings = Vec::new();

    course.url = FieldSuggestion::new(url.to_string(), Confidence::High, INPUT_SOURCE);

    let outline_total = course.course_items.value.as_ref().map(|items| {
        items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.duration))
    });
    if let Some(total) = outline_total.filter(|total| *total > 0) {
        let recomputed = course.duration.source.as_deref() == Some(COURSE_ITEMS_SOURCE);
        if let Some(stated) = course.duration.value.filter(|stated| *stated != total && !recomputed) {
            warnings.push(format!(
                "Course outline totals {total} minutes but the page states {stated}; using the outline total"
            ));
        }
        course.duration = FieldSuggestion::new(total, Confidence::High, COURSE_ITEMS_SOURCE);
    }

    default_list(&mut course.learning_goals, "Learning goals not detected", &mut warnings);
    default_list(&mut course.instructors, "Instructors not detected", &mut warnings);
    default_list(&mut course.course_items, "Course outline not detected", &mut warnings);

    if course.difficulty.value.is_none() {
        course.difficulty = FieldSuggestion {
            value: Some(Difficulty::Beginner),
            confidence: Confidence::Low,
            source: course.difficulty.source.take().or_else(|| Some(DEFAULT_SOURCE.into())),
        };
        warnings.push("Difficulty not detected; defaulted to Beginner".to_string());
    }

    if course.uses_code_examples.value.is_none() {
        course.uses_code_examples = FieldSuggestion {
            value: Some(false),
            confidence: Confidence::Low,
            source: course
                .uses_code_examples
                .source
                .take()
                .or_else(|| Some(DEFAULT_SOURCE.into())),
        };
    }

    SuggestionSet { course, warnings }
}

fn default_list<T>(field: &mut FieldSuggestion<Vec<T>>, warning: &str, warnings: &mut Vec<String>) {
    if field.value.as_ref().is_none_or(Vec::is_empty) {
        *field = FieldSuggestion {
            value: Some(Vec::new()),
            confidence: Confidence::Low,
            source: field.source.take(),
        };
        warnings.push(warning.to_string());
    }
}
