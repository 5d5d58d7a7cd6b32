//! Import orchestration: fetch, extract, normalize.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Instant;

use chrono::Utc;
use courseimport_extract::ExtractorRegistry;
use courseimport_shared::{
    CourseImportResult, ImportMetadata, ImportTimings, ImporterConfig, Result,
};
use reqwest::Client;
use scraper::Html;
use tracing::{debug, info, instrument, warn};

use crate::fetch::{FetchedPage, build_client, fetch_page, validate_url};
use crate::merge::{SuggestionMerger, SuggestionSet, normalize_course_suggestions};

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Where an import run currently is. `Failed` is reachable from every step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportStage {
    Idle,
    Fetching,
    Extracting,
    Normalizing,
    Done,
    Failed,
}

impl std::fmt::Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Normalizing => "normalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

#[derive(Debug)]
struct StageTracker {
    stage: ImportStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: ImportStage::Idle,
        }
    }

    fn advance(&mut self, next: ImportStage) {
        debug!(from = %self.stage, to = %next, "import stage");
        self.stage = next;
    }
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

/// Turns a course landing-page URL into reviewed-ready field suggestions.
///
/// Holds one HTTP client for its lifetime; every call to [`import`] owns its
/// own suggestion record and warning list.
///
/// [`import`]: CourseImporter::import
pub struct CourseImporter {
    config: ImporterConfig,
    client: Client,
    registry: ExtractorRegistry,
}

impl CourseImporter {
    pub fn new(config: ImporterConfig) -> Result<Self> {
        let client = build_client(&config)?;
        Ok(Self {
            config,
            client,
            registry: ExtractorRegistry::new(),
        })
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Fetch `url` and build suggestions from the page.
    ///
    /// Fails only at the fetch stage, with `FETCH_FAILED` or
    /// `UNSUPPORTED_CONTENT`. Extraction is best effort: anything it cannot
    /// determine becomes a default value plus a warning.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn import(&self, url: &str) -> Result<CourseImportResult> {
        let mut tracker = StageTracker::new();

        match self.run(url, &mut tracker).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracker.advance(ImportStage::Failed);
                warn!(error = %e, "course import failed");
                Err(e)
            }
        }
    }

    /// Build suggestions from HTML already in hand, as if it had been fetched
    /// from `url`.
    pub fn import_html(
        &self,
        url: &str,
        html: String,
        content_type: Option<String>,
    ) -> Result<CourseImportResult> {
        let url = validate_url(url)?;
        let page = FetchedPage {
            html,
            content_type,
            elapsed_ms: 0,
        };
        Ok(self.build_result(url.as_str(), page, Utc::now(), &mut StageTracker::new()))
    }

    async fn run(&self, input: &str, tracker: &mut StageTracker) -> Result<CourseImportResult> {
        tracker.advance(ImportStage::Fetching);
        let url = validate_url(input)?;
        let fetched_at = Utc::now();
        let page = fetch_page(&self.client, &url, &self.config.accept).await?;

        Ok(self.build_result(url.as_str(), page, fetched_at, tracker))
    }

    fn build_result(
        &self,
        url: &str,
        page: FetchedPage,
        fetched_at: chrono::DateTime<Utc>,
        tracker: &mut StageTracker,
    ) -> CourseImportResult {
        tracker.advance(ImportStage::Extracting);
        let started = Instant::now();
        let extracted = extract_with(&self.registry, &page.html, url);
        let extract_ms = started.elapsed().as_millis() as u64;

        tracker.advance(ImportStage::Normalizing);
        let started = Instant::now();
        let normalized = normalize_course_suggestions(extracted.course, url);
        let normalize_ms = started.elapsed().as_millis() as u64;

        let mut warnings = extracted.warnings;
        warnings.extend(normalized.warnings);

        let preview_chars = self.config.preview_chars;
        let raw_html_preview =
            (preview_chars > 0).then(|| page.html.chars().take(preview_chars).collect());

        tracker.advance(ImportStage::Done);
        info!(
            html_bytes = page.html.len(),
            warnings = warnings.len(),
            fetch_ms = page.elapsed_ms,
            extract_ms,
            "course import complete"
        );

        CourseImportResult {
            source_url: url.to_string(),
            course: normalized.course,
            warnings,
            metadata: ImportMetadata {
                content_type: page.content_type,
                fetched_at,
                html_bytes: page.html.len(),
                timings: ImportTimings {
                    fetch_ms: page.elapsed_ms,
                    extract_ms,
                    normalize_ms,
                },
            },
            raw_html_preview,
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Run every built-in extractor over `html` and merge their drafts.
///
/// The result is not normalized; pass it to
/// [`normalize_course_suggestions`] for defaults and the outline total.
pub fn extract_course_suggestions(html: &str, url: &str) -> SuggestionSet {
    extract_with(&ExtractorRegistry::new(), html, url)
}

fn extract_with(registry: &ExtractorRegistry, html: &str, url: &str) -> SuggestionSet {
    let doc = Html::parse_document(html);
    let mut merger = SuggestionMerger::new(url);

    for extractor in registry.iter() {
        let name = extractor.name();
        if !extractor.should_run(merger.current()) {
            debug!(extractor = name, "extractor skipped");
            continue;
        }

        let extraction = match catch_unwind(AssertUnwindSafe(|| extractor.extract(html, &doc))) {
            Ok(extraction) => extraction,
            Err(_) => {
                warn!(extractor = name, "extractor panicked");
                merger.warn(format!("{name} extraction failed; its results were skipped"));
                continue;
            }
        };

        debug!(
            extractor = name,
            drafts = extraction.drafts.len(),
            warnings = extraction.warnings.len(),
            "extractor finished"
        );
        merger.extend_warnings(extraction.warnings);
        for draft in extraction.drafts {
            merger.fold(draft, extractor.confidence(), name);
        }
    }

    merger.finish()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use courseimport_shared::{Confidence, Difficulty, ImportErrorKind, Instructor};
    use wiremock::matchers::{headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fixture(name: &str) -> String {
        let path = format!(
            "{}/../../../fixtures/html/{name}",
            env!("CARGO_MANIFEST_DIR")
        );
        std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
    }

    fn importer() -> CourseImporter {
        CourseImporter::new(ImporterConfig::default()).unwrap()
    }

    async fn serve_html(server: &MockServer, route: &str, html: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .and(headers("accept", vec!["text/html", "application/xhtml+xml"]))
            .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn imports_plain_course_page() {
        let server = MockServer::start().await;
        let html = fixture("claude-code.html");
        serve_html(&server, "/short-courses/claude-code/", html.clone()).await;

        let url = format!("{}/short-courses/claude-code/", server.uri());
        let result = importer().import(&url).await.unwrap();
        let course = &result.course;

        assert_eq!(result.source_url, url);
        assert_eq!(
            course.title.value.as_deref(),
            Some("Claude Code: A Highly Agentic Coding Assistant")
        );
        assert_eq!(course.title.source.as_deref(), Some("html-body"));
        assert_eq!(course.difficulty.value, Some(Difficulty::Intermediate));

        let items = course.course_items.value.as_ref().unwrap();
        assert_eq!(items.len(), 13);
        assert!(items.iter().all(|item| !item.uses_code_example));
        assert_eq!(course.uses_code_examples.value, Some(false));

        // The hero states 110 minutes but the lessons sum to 107; the outline
        // total wins and the gap is reported as a warning.
        assert_eq!(course.duration.value, Some(107));
        assert_eq!(course.duration.confidence, Confidence::High);
        assert_eq!(
            result.warnings,
            vec!["Course outline totals 107 minutes but the page states 110; using the outline total"]
        );

        assert_eq!(
            course.instructors.value,
            Some(vec![Instructor {
                name: "Elie Schoppik".into(),
                title: "Head of Technical Education at Anthropic".into(),
            }])
        );
        assert_eq!(course.learning_goals.value.as_ref().map(Vec::len), Some(3));
        assert_eq!(course.url.value.as_deref(), Some(url.as_str()));

        assert_eq!(result.metadata.html_bytes, html.len());
        assert_eq!(
            result.metadata.content_type.as_deref(),
            Some("text/html; charset=utf-8")
        );
        let preview = result.raw_html_preview.as_deref().unwrap();
        assert_eq!(preview.chars().count(), 2000.min(html.chars().count()));
        assert!(html.starts_with(preview));
    }

    #[tokio::test]
    async fn imports_course_with_code_examples() {
        let server = MockServer::start().await;
        serve_html(&server, "/kg", fixture("knowledge-graphs.html")).await;

        let result = importer()
            .import(&format!("{}/kg", server.uri()))
            .await
            .unwrap();
        let course = &result.course;

        let flags: Vec<bool> = course
            .course_items
            .value
            .as_ref()
            .unwrap()
            .iter()
            .map(|item| item.uses_code_example)
            .collect();
        assert_eq!(flags, vec![false, false, true, true, true, true, false, false]);
        assert_eq!(course.uses_code_examples.value, Some(true));
        // Stated 74 minutes, lessons sum to 72.
        assert_eq!(course.duration.value, Some(72));

        let names: Vec<_> = course
            .instructors
            .value
            .as_ref()
            .unwrap()
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(names, vec!["Pavithra G K", "Lars Heling"]);
    }

    #[tokio::test]
    async fn non_success_status_fails_fetch() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = importer()
            .import(&format!("{}/missing", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ImportErrorKind::FetchFailed));
        assert_eq!(err.to_string(), "FETCH_FAILED: Received status 404 from source");
    }

    #[tokio::test]
    async fn non_html_content_is_unsupported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(b"%PDF-1.7".to_vec(), "application/pdf"),
            )
            .mount(&server)
            .await;

        let err = importer()
            .import(&format!("{}/syllabus.pdf", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ImportErrorKind::UnsupportedContent));
    }

    #[tokio::test]
    async fn slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html></html>", "text/html")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = ImporterConfig {
            timeout: Duration::from_millis(200),
            ..ImporterConfig::default()
        };
        let err = CourseImporter::new(config)
            .unwrap()
            .import(&server.uri())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ImportErrorKind::FetchFailed));
        assert_eq!(
            err.to_string(),
            "FETCH_FAILED: Timed out while fetching the course page"
        );
    }

    #[tokio::test]
    async fn invalid_url_fails_before_fetching() {
        let err = importer().import("course page please").await.unwrap_err();
        assert_eq!(err.kind(), Some(ImportErrorKind::FetchFailed));
        assert_eq!(err.to_string(), "FETCH_FAILED: Invalid URL provided");
    }

    #[test]
    fn embedded_state_outranks_page_body_and_meta() {
        let result = importer()
            .import_html(
                "https://academy.example/courses/agentic-retrieval",
                fixture("next-data.html"),
                None,
            )
            .unwrap();
        let course = &result.course;

        assert_eq!(course.title.value.as_deref(), Some("Agentic Retrieval"));
        assert_eq!(course.title.source.as_deref(), Some("next-data"));
        assert_eq!(
            course.description.value.as_deref(),
            Some("Build retrieval agents that plan their own searches.\n\nEvaluate them with real queries.")
        );
        assert_eq!(
            course.student_profile.value.as_deref(),
            Some("Developers with basic Python.")
        );
        assert_eq!(
            course.learning_goals.value,
            Some(vec![
                "Plan multi-step searches".to_string(),
                "Grade retrieved passages".to_string()
            ])
        );
        assert_eq!(course.difficulty.value, Some(Difficulty::Beginner));
        assert_eq!(course.difficulty.confidence, Confidence::High);

        let minutes: Vec<u32> = course
            .course_items
            .value
            .as_ref()
            .unwrap()
            .iter()
            .map(|item| item.duration)
            .collect();
        assert_eq!(minutes, vec![3, 12, 15, 1]);
        assert_eq!(course.duration.value, Some(31));
        assert_eq!(course.uses_code_examples.value, Some(true));
        assert_eq!(
            course.instructors.value.as_ref().unwrap()[0].title,
            "Staff Engineer"
        );
        assert_eq!(
            result.warnings,
            vec!["Course outline totals 31 minutes but the page states 60; using the outline total"]
        );
        assert_eq!(result.metadata.timings.fetch_ms, 0);
    }

    #[test]
    fn linked_data_refines_page_heuristics() {
        let set = extract_course_suggestions(
            &fixture("json-ld.html"),
            "https://academy.example/prompting",
        );
        let course = &set.course;

        assert_eq!(course.title.value.as_deref(), Some("Prompt Engineering Basics"));
        assert_eq!(course.title.source.as_deref(), Some("json-ld"));
        assert_eq!(
            course.description.value.as_deref(),
            Some("Write prompts that hold up in production.")
        );
        assert_eq!(course.difficulty.value, Some(Difficulty::Advanced));
        assert_eq!(course.duration.value, Some(45));

        let titles: Vec<_> = course
            .course_items
            .value
            .as_ref()
            .unwrap()
            .iter()
            .map(|item| item.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Prompt anatomy", "Testing prompts"]);

        let normalized = normalize_course_suggestions(set.course, "https://academy.example/prompting");
        assert_eq!(normalized.course.duration.value, Some(35));
        assert_eq!(normalized.course.uses_code_examples.value, Some(true));
        assert_eq!(normalized.warnings.len(), 1);
    }

    #[test]
    fn bare_page_is_defaulted() {
        let result = importer()
            .import_html(
                "https://example.com/empty",
                "<html><body><p>Coming soon. Stay tuned.</p></body></html>".into(),
                Some("text/html".into()),
            )
            .unwrap();
        let course = &result.course;

        assert_eq!(course.description.value.as_deref(), Some("Coming soon"));
        assert_eq!(course.description.source.as_deref(), Some("text"));
        assert_eq!(course.description.confidence, Confidence::Low);
        assert_eq!(course.difficulty.value, Some(Difficulty::Beginner));
        assert_eq!(result.warnings.len(), 4);
    }

    #[test]
    fn stage_names() {
        assert_eq!(ImportStage::Normalizing.to_string(), "normalizing");
        assert_eq!(ImportStage::Failed.to_string(), "failed");
    }
}
