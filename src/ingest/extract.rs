//! Article text extraction: one GET, all `<p>` text, capped at [`ARTICLE_MAX_CHARS`].
//!
//! Failures never reach the caller; they come back as a placeholder text that is
//! still handed to the model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use metrics::counter;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, warn};

use crate::ingest::types::{ArticleSource, ArticleText};
use crate::ingest::{truncate_chars, ARTICLE_MAX_CHARS};

/// Some publishers reject requests without a browser-looking agent.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").expect("p selector"));

/// Join the text of every `<p>` with single spaces, trim, cap at 3000 chars.
pub fn extract_paragraph_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let joined = document
        .select(&PARAGRAPH)
        .map(|p| p.text().collect::<String>())
        .collect::<Vec<_>>()
        .join(" ");
    truncate_chars(joined.trim(), ARTICLE_MAX_CHARS)
}

pub struct HttpArticleExtractor {
    client: reqwest::Client,
}

impl HttpArticleExtractor {
    pub fn new(connect_timeout: Duration, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .context("building article http client")?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        self.client
            .get(url)
            .send()
            .await
            .context("article http get()")?
            .error_for_status()
            .context("article http status")?
            .text()
            .await
            .context("article http .text()")
    }
}

#[async_trait]
impl ArticleSource for HttpArticleExtractor {
    async fn article_text(&self, url: &str) -> ArticleText {
        match self.fetch_html(url).await {
            Ok(html) => {
                let text = extract_paragraph_text(&html);
                debug!(%url, chars = text.chars().count(), "article extracted");
                ArticleText::extracted(text)
            }
            Err(e) => {
                warn!(%url, error = %format!("{e:#}"), "article extraction failed");
                counter!("extraction_failures_total").increment(1);
                ArticleText::failed(format!("{e:#}"))
            }
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
