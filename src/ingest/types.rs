// src/ingest/types.rs
use anyhow::Result;

/// One headline as listed by a feed. Scoped to a single pipeline run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub headline: String,
    pub link: String, // may be empty when the feed item had no <link>
}

impl FeedEntry {
    pub fn new(headline: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            headline: headline.into(),
            link: link.into(),
        }
    }
}

/// Plain article text, or the placeholder produced when extraction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleText {
    pub text: String,
    pub placeholder: bool,
}

impl ArticleText {
    pub fn extracted(text: String) -> Self {
        Self {
            text,
            placeholder: false,
        }
    }

    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self {
            text: format!("Error fetching article: {cause}"),
            placeholder: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Entries in feed order, no dedup. Errors are mapped to "no entries" by the pipeline.
    async fn fetch_entries(&self, feed_url: &str) -> Result<Vec<FeedEntry>>;
    fn name(&self) -> &'static str;
}

#[async_trait::async_trait]
pub trait ArticleSource: Send + Sync {
    /// Never fails: extraction problems come back as an `ArticleText::failed` placeholder.
    async fn article_text(&self, url: &str) -> ArticleText;
    fn name(&self) -> &'static str;
}
