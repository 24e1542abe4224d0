use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Fatal errors of an extraction run. No partial result accompanies them.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("settings: {0}")]
    Settings(#[from] config::ConfigError),
    #[error("source unavailable: {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("worker task failed: {0}")]
    Worker(String),
}

impl ExtractError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        ExtractError::SourceUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Per-URL failure. Recorded in the crawl report and skipped.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("not an html page: {0}")]
    NotHtml(String),
    #[error("redirected off site to {0}")]
    OffSite(String),
}

/// A malformed fragment that was downgraded to the safest classification
/// instead of failing the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExtractionWarning {
    HeadingWithoutLevel { style: String, text: String },
    BadNumbering { value: String, text: String },
}

impl fmt::Display for ExtractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionWarning::HeadingWithoutLevel { style, text } => write!(
                f,
                "heading style {:?} has no level, kept as paragraph: {}",
                style,
                preview(text)
            ),
            ExtractionWarning::BadNumbering { value, text } => write!(
                f,
                "unparseable numbering id {:?}, numbering ignored: {}",
                value,
                preview(text)
            ),
        }
    }
}

fn preview(text: &str) -> String {
    if text.chars().count() <= 40 {
        text.to_string()
    } else {
        let head: String = text.chars().take(40).collect();
        format!("{}...", head)
    }
}
