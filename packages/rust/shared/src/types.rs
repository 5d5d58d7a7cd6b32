//! Core domain types for course imports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Ordinal confidence tier attached to every suggestion (`low < medium < high`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}

// ---------------------------------------------------------------------------
// Course field value types
// ---------------------------------------------------------------------------

/// Closed difficulty enumeration used by the course form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        })
    }
}

/// A course instructor as shown on the landing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    /// Job title or role; "Instructor" when the page gives none.
    pub title: String,
}

/// One lesson of the course outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseItem {
    pub title: String,
    /// Lesson length in whole minutes.
    pub duration: u32,
    pub uses_code_example: bool,
}

// ---------------------------------------------------------------------------
// Suggestions
// ---------------------------------------------------------------------------

/// A course field value paired with a confidence tier and a source label.
///
/// `value == None` means the field is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSuggestion<T> {
    pub value: Option<T>,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl<T> FieldSuggestion<T> {
    /// An absent value at low confidence.
    pub fn empty() -> Self {
        Self {
            value: None,
            confidence: Confidence::Low,
            source: None,
        }
    }

    /// A present value with the given confidence and source label.
    pub fn new(value: T, confidence: Confidence, source: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            confidence,
            source: Some(source.into()),
        }
    }

    pub fn is_present(&self) -> bool {
        self.value.is_some()
    }
}

impl<T> Default for FieldSuggestion<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// The full set of suggestions for one imported course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseFieldSuggestions {
    pub title: FieldSuggestion<String>,
    pub description: FieldSuggestion<String>,
    pub student_profile: FieldSuggestion<String>,
    pub learning_goals: FieldSuggestion<Vec<String>>,
    pub difficulty: FieldSuggestion<Difficulty>,
    /// Total course length in minutes.
    pub duration: FieldSuggestion<u32>,
    pub instructors: FieldSuggestion<Vec<Instructor>>,
    pub course_items: FieldSuggestion<Vec<CourseItem>>,
    pub uses_code_examples: FieldSuggestion<bool>,
    pub url: FieldSuggestion<String>,
}

impl CourseFieldSuggestions {
    /// Fresh suggestions for an import of `url`: everything absent except the
    /// requested URL itself.
    pub fn new(url: &str) -> Self {
        Self {
            title: FieldSuggestion::empty(),
            description: FieldSuggestion::empty(),
            student_profile: FieldSuggestion::empty(),
            learning_goals: FieldSuggestion::empty(),
            difficulty: FieldSuggestion::empty(),
            duration: FieldSuggestion::empty(),
            instructors: FieldSuggestion::empty(),
            course_items: FieldSuggestion::empty(),
            uses_code_examples: FieldSuggestion::empty(),
            url: FieldSuggestion::new(url.to_string(), Confidence::High, "input"),
        }
    }
}

// ---------------------------------------------------------------------------
// CourseImportResult
// ---------------------------------------------------------------------------

/// Per-stage wall-clock timings of one import, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportTimings {
    pub fetch_ms: u64,
    pub extract_ms: u64,
    pub normalize_ms: u64,
}

/// Facts about the fetched document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMetadata {
    /// `Content-Type` header of the response, if any.
    pub content_type: Option<String>,
    pub fetched_at: DateTime<Utc>,
    /// UTF-8 byte length of the fetched HTML.
    pub html_bytes: usize,
    pub timings: ImportTimings,
}

/// The sole externally visible artifact of an import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseImportResult {
    pub source_url: String,
    pub course: CourseFieldSuggestions,
    /// Human-review notes for fields that could not be determined.
    pub warnings: Vec<String>,
    pub metadata: ImportMetadata,
    /// Leading slice of the fetched HTML; the full document is not retained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_html_preview: Option<String>,
}
