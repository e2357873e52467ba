//! Best-effort webpage text extraction.
//!
//! A single bounded fetch of the page followed by the text of its first few
//! `<p>` elements. No retries; callers decide what to do with a failure.

use std::{error::Error, time::Duration};

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::config::ExtractConfig;

static PARAGRAPH_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector is valid"));

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("failed to fetch or parse URL: {0}")]
    Fetch(String),
}

fn get_error(error: &reqwest::Error) -> String {
    match error.source() {
        Some(e) => match e.source() {
            Some(e) => format!("{error}: {e}"),
            None => format!("{error}: {e}"),
        },
        None => error.to_string(),
    }
}

/// Check that `url` parses, has a host and uses an allowed scheme.
pub fn validate_url(url: &str, allowed_schemes: &[String]) -> Result<Url, ExtractError> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| ExtractError::InvalidUrl(format!("{url}: {e}")))?;

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ExtractError::InvalidUrl(format!("{url}: missing host")));
    }

    if !allowed_schemes.iter().any(|s| s == parsed.scheme()) {
        return Err(ExtractError::InvalidUrl(format!(
            "{url}: scheme '{}' not allowed",
            parsed.scheme()
        )));
    }

    Ok(parsed)
}

/// Concatenate the text of the first `max_paragraphs` `<p>` elements.
pub fn paragraphs_text(html: &str, max_paragraphs: usize) -> String {
    let document = Html::parse_document(html);

    document
        .select(&PARAGRAPH_SELECTOR)
        .take(max_paragraphs)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct TextExtractor {
    config: ExtractConfig,
}

impl TextExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    /// Fetch `url` and return the text of its leading paragraphs.
    ///
    /// Blocking; call it from a thread that may block.
    pub fn extract(&self, url: &str) -> Result<String, ExtractError> {
        let url = validate_url(url, &self.config.allowed_schemes)?;
        let iden = format!("{}{}", url.host_str().unwrap_or_default(), url.path());

        let client = reqwest::blocking::Client::builder()
            .user_agent(self.config.user_agent.as_str())
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| ExtractError::Fetch(get_error(&e)))?;

        log::debug!("{iden}: requesting");

        let resp = client.get(url.clone()).send().map_err(|err| {
            log::warn!("{iden}: {}", get_error(&err));
            ExtractError::Fetch(get_error(&err))
        })?;

        let status = resp.status();
        if !status.is_success() {
            log::warn!("{iden}: {status}");
            return Err(ExtractError::Fetch(format!("{url} returned {status}")));
        }

        let html = resp.text().map_err(|err| ExtractError::Fetch(get_error(&err)))?;

        let text = paragraphs_text(&html, self.config.max_paragraphs);
        log::debug!("{iden}: extracted {} characters", text.len());

        Ok(text)
    }
}
