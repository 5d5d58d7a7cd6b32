//! Extractor-local staging record.

use courseimport_shared::{CourseItem, Instructor};

/// A best-effort, unvalidated guess at course fields produced by one extractor.
///
/// Every field is optional; `None` means "no information". Values are
/// loosely typed where the source is: `difficulty` is the raw level text and
/// `duration` may be fractional or out of range until the merger validates it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialCourseDraft {
    pub title: Option<String>,
    pub description: Option<String>,
    pub student_profile: Option<String>,
    pub learning_goals: Option<Vec<String>>,
    pub difficulty: Option<String>,
    /// Total course length in minutes.
    pub duration: Option<f64>,
    pub instructors: Option<Vec<Instructor>>,
    pub course_items: Option<Vec<CourseItem>>,
    pub uses_code_examples: Option<bool>,
    pub url: Option<String>,
}

impl PartialCourseDraft {
    /// `true` when the draft carries no information at all.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Number of populated fields, for tracing.
    pub fn field_count(&self) -> usize {
        [
            self.title.is_some(),
            self.description.is_some(),
            self.student_profile.is_some(),
            self.learning_goals.is_some(),
            self.difficulty.is_some(),
            self.duration.is_some(),
            self.instructors.is_some(),
            self.course_items.is_some(),
            self.uses_code_examples.is_some(),
            self.url.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    /// Free text gathered so far, for keyword heuristics.
    pub(crate) fn combined_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        parts.extend(self.description.as_deref());
        parts.extend(self.student_profile.as_deref());
        if let Some(goals) = &self.learning_goals {
            parts.extend(goals.iter().map(String::as_str));
        }
        if let Some(items) = &self.course_items {
            parts.extend(items.iter().map(|item| item.title.as_str()));
        }
        parts.join(" ")
    }
}

/// Round lesson seconds to whole minutes, never below one minute for a
/// non-zero length.
pub(crate) fn seconds_to_minutes(seconds: f64) -> u32 {
    if seconds.is_finite() && seconds > 0.0 {
        ((seconds / 60.0).round().max(1.0)).min(u32::MAX as f64) as u32
    } else {
        0
    }
}
