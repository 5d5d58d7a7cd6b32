//! Outbound page fetch: URL validation, the HTTP client, and response checks.

use std::time::Instant;

use courseimport_shared::{CourseImportError, ImporterConfig, Result};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tracing::{debug, instrument};
use url::Url;

/// A fetched HTML document.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub html: String,
    /// `Content-Type` response header, if the server sent one.
    pub content_type: Option<String>,
    pub elapsed_ms: u64,
}

/// Parse `input` as an absolute `http`/`https` URL.
pub fn validate_url(input: &str) -> Result<Url> {
    let url = Url::parse(input.trim())
        .map_err(|_| CourseImportError::fetch_failed("Invalid URL provided"))?;

    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(CourseImportError::fetch_failed("Invalid URL provided")),
        scheme => Err(CourseImportError::fetch_failed(format!(
            "Unsupported URL scheme: {scheme}"
        ))),
    }
}

/// Build the shared client: identifying user agent, bounded redirects and a
/// whole-request timeout.
pub fn build_client(config: &ImporterConfig) -> Result<Client> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .timeout(config.timeout)
        .build()
        .map_err(|e| CourseImportError::fetch_failed(format!("failed to build HTTP client: {e}")))
}

/// GET `url` once and return its body if it is a successful HTML response.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch_page(client: &Client, url: &Url, accept: &str) -> Result<FetchedPage> {
    let started = Instant::now();

    let response = client
        .get(url.as_str())
        .header(ACCEPT, accept)
        .send()
        .await
        .map_err(transport_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(CourseImportError::fetch_failed(format!(
            "Received status {} from source",
            status.as_u16()
        )));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    ensure_html(content_type.as_deref())?;

    let html = response.text().await.map_err(transport_error)?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    debug!(
        status = status.as_u16(),
        bytes = html.len(),
        elapsed_ms,
        "page fetched"
    );

    Ok(FetchedPage {
        html,
        content_type,
        elapsed_ms,
    })
}

/// A missing content type is given the benefit of the doubt.
pub fn ensure_html(content_type: Option<&str>) -> Result<()> {
    match content_type {
        Some(value) if !is_html_content_type(value) => Err(CourseImportError::unsupported_content(
            "The provided URL did not return HTML content",
        )),
        _ => Ok(()),
    }
}

fn is_html_content_type(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    value.contains("text/html") || value.contains("application/xhtml+xml")
}

fn transport_error(error: reqwest::Error) -> CourseImportError {
    if error.is_timeout() {
        CourseImportError::fetch_failed("Timed out while fetching the course page")
    } else {
        CourseImportError::fetch_failed(format!("Failed to fetch the course page: {error}"))
    }
}
