use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ExtractError;

const ENV_PREFIX: &str = "CONTENT_TREE";
const DEFAULT_FILE: &str = "content_tree";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub crawl: CrawlSettings,
    pub extract: ExtractSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlSettings {
    /// Max in-flight fetches.
    pub concurrency: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub show_progress: bool,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            request_timeout_secs: 20,
            user_agent: concat!("content_tree/", env!("CARGO_PKG_VERSION")).to_string(),
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractSettings {
    /// Paragraphs and list items shorter than this are dropped.
    pub min_words: usize,
    pub container_selectors: Vec<String>,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            min_words: 10,
            container_selectors: [
                "article",
                "main",
                "section",
                "[role=main]",
                ".content",
                "#content",
                ".post-content",
                ".entry-content",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Items with shorter text are not persisted.
    pub min_chars: usize,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { min_chars: 50 }
    }
}

impl Settings {
    /// Layers an optional settings file (explicit path, or `content_tree.*` in
    /// the working directory) under `CONTENT_TREE__SECTION__KEY` variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ExtractError> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_FILE).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("extract.container_selectors")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.crawl.concurrency == 0 {
            return Err(ExtractError::Configuration(
                "crawl.concurrency must be at least 1".into(),
            ));
        }
        if self.extract.container_selectors.is_empty() {
            return Err(ExtractError::Configuration(
                "extract.container_selectors must not be empty".into(),
            ));
        }
        Ok(())
    }
}
