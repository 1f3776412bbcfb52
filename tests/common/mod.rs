// tests/common/mod.rs
//
// Shared helpers: a throwaway local HTTP server for fixture feeds/articles and
// scripted pipeline components.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::Router;

use financial_news_sentiment::analyze::ai_adapter::{InsightModel, ModelResponse, ResponseStatus};
use financial_news_sentiment::ingest::types::{ArticleSource, ArticleText, FeedEntry, FeedSource};
use financial_news_sentiment::rate_limit::RateLimiter;

pub const YAHOO_XML: &str = include_str!("../fixtures/yahoo_rss.xml");
pub const ARTICLE_HTML: &str = include_str!("../fixtures/article.html");

/// Serve `router` on an ephemeral localhost port; returns `http://127.0.0.1:<port>`.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("test server");
    });
    format!("http://{addr}")
}

/// Feed that returns a fixed list of entries, or an error.
pub struct StaticFeed(pub Result<Vec<FeedEntry>, String>);

impl StaticFeed {
    pub fn entries(n: usize) -> Self {
        Self(Ok((0..n)
            .map(|i| FeedEntry::new(format!("Headline {i}"), format!("https://example.test/{i}")))
            .collect()))
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_entries(&self, _feed_url: &str) -> Result<Vec<FeedEntry>> {
        self.0.clone().map_err(|e| anyhow!(e))
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Article source that always succeeds (or always fails) without touching the network.
pub struct StaticArticles {
    pub fail: bool,
}

#[async_trait]
impl ArticleSource for StaticArticles {
    async fn article_text(&self, url: &str) -> ArticleText {
        if self.fail {
            ArticleText::failed(format!("connection refused ({url})"))
        } else {
            ArticleText::extracted(format!("Body of {url}"))
        }
    }
    fn name(&self) -> &'static str {
        "static"
    }
}

/// Model that replays scripted replies in order (the last one repeats) and records
/// the article texts it was given.
pub struct ScriptedModel {
    replies: Mutex<VecDeque<ModelResponse>>,
    last: Mutex<Option<ModelResponse>>,
    pub seen_articles: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: Vec<ModelResponse>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            last: Mutex::new(None),
            seen_articles: Mutex::new(Vec::new()),
        }
    }

    pub fn always(text: &str) -> Self {
        Self::new(vec![ok(text)])
    }
}

pub fn ok(text: &str) -> ModelResponse {
    ModelResponse {
        raw_text: text.to_string(),
        approx_cost_tokens: 100.0,
        status: ResponseStatus::Completed,
    }
}

impl InsightModel for ScriptedModel {
    fn request<'a>(
        &'a self,
        _headline: &'a str,
        article: &'a str,
    ) -> Pin<Box<dyn Future<Output = ModelResponse> + Send + 'a>> {
        self.seen_articles.lock().unwrap().push(article.to_string());
        let next = self.replies.lock().unwrap().pop_front();
        let out = match next {
            Some(r) => {
                *self.last.lock().unwrap() = Some(r.clone());
                r
            }
            None => self
                .last
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| ModelResponse::failed("script exhausted")),
        };
        Box::pin(async move { out })
    }
    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Limiter that only counts acquisitions.
#[derive(Default)]
pub struct CountingLimiter(pub AtomicUsize);

impl CountingLimiter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateLimiter for CountingLimiter {
    async fn acquire(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn arc<T>(t: T) -> Arc<T> {
    Arc::new(t)
}
