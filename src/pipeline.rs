//! # Pipeline
//! One bounded, sequential run: feed -> article text -> model -> parse -> records.
//!
//! Every stage below the feed degrades instead of failing, so a run always completes
//! and yields whatever subset of records could be extracted.

use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyze::ai_adapter::DynInsightModel;
use crate::analyze::parser::{parse_response, ParsedInsight};
use crate::ingest::types::{ArticleSource, FeedSource};
use crate::rate_limit::RateLimiter;
use crate::records::{build_records, drop_parser_artifacts, RecordSet};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("pipeline_runs_total", "Completed pipeline runs.");
        describe_counter!("feed_entries_total", "Entries parsed from feeds.");
        describe_counter!("feed_errors_total", "Feed fetch/parse errors (run continued empty).");
        describe_counter!(
            "extraction_failures_total",
            "Articles replaced by an error placeholder."
        );
        describe_counter!("model_calls_total", "Model calls attempted.");
        describe_counter!("model_failures_total", "Model calls that failed.");
        describe_counter!("records_emitted_total", "Sentiment records kept after filtering.");
        describe_histogram!("feed_parse_ms", "Feed parse time in milliseconds.");
        describe_histogram!("pipeline_run_ms", "Wall time of a full run in milliseconds.");
        describe_gauge!("pipeline_approx_tokens", "Approximate tokens used by the last run.");
    });
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub feed_url: String,
    pub requested_limit: usize,
    pub entries_seen: usize,
    pub extraction_failures: usize,
    pub model_failures: usize,
    pub approx_tokens: f64,
    pub estimated_cost_usd: f64,
    pub records: RecordSet,
}

pub struct Pipeline {
    feeds: Arc<dyn FeedSource>,
    articles: Arc<dyn ArticleSource>,
    model: DynInsightModel,
    limiter: Arc<dyn RateLimiter>,
    cost_per_1k_tokens: f64,
    today: fn() -> NaiveDate,
}

impl Pipeline {
    pub fn new(
        feeds: Arc<dyn FeedSource>,
        articles: Arc<dyn ArticleSource>,
        model: DynInsightModel,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            feeds,
            articles,
            model,
            limiter,
            cost_per_1k_tokens: 0.0015,
            today: local_today,
        }
    }

    pub fn with_cost_per_1k_tokens(mut self, usd: f64) -> Self {
        self.cost_per_1k_tokens = usd;
        self
    }

    /// Override the capture date source (records are stamped per entry).
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn run(&self, feed_url: &str, limit: usize) -> RunReport {
        ensure_metrics_described();
        let t0 = Instant::now();

        let mut entries = match self.feeds.fetch_entries(feed_url).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %format!("{e:#}"), feed = self.feeds.name(), %feed_url, "feed error, nothing to do");
                counter!("feed_errors_total").increment(1);
                Vec::new()
            }
        };
        entries.truncate(limit);

        let mut records = RecordSet::new();
        let mut approx_tokens = 0.0;
        let mut extraction_failures = 0;
        let mut model_failures = 0;

        for (i, entry) in entries.iter().enumerate() {
            let article = self.articles.article_text(&entry.link).await;
            if article.placeholder {
                extraction_failures += 1;
            }

            self.limiter.acquire().await;
            let response = self.model.request(&entry.headline, article.as_str()).await;
            approx_tokens += response.approx_cost_tokens;

            // A failed call carries only our own error text; never mine it for pairs.
            let insight = if response.is_completed() {
                let parsed = parse_response(&response.raw_text);
                if parsed.is_empty() {
                    debug!(index = i, "reply had neither summary nor pairs");
                }
                parsed
            } else {
                model_failures += 1;
                ParsedInsight::default()
            };

            let produced = build_records(entry, &insight, (self.today)());
            debug!(
                index = i,
                headline = %entry.headline,
                pairs = produced.len(),
                "entry processed"
            );
            records.extend(produced);
        }

        let dropped = drop_parser_artifacts(&mut records);
        let estimated_cost_usd = approx_tokens / 1000.0 * self.cost_per_1k_tokens;

        counter!("pipeline_runs_total").increment(1);
        counter!("records_emitted_total").increment(records.len() as u64);
        gauge!("pipeline_approx_tokens").set(approx_tokens);
        histogram!("pipeline_run_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        info!(
            %feed_url,
            entries = entries.len(),
            records = records.len(),
            artifacts_dropped = dropped,
            extraction_failures,
            model_failures,
            approx_tokens = approx_tokens as u64,
            estimated_cost_usd,
            provider = self.model.provider_name(),
            "pipeline run finished"
        );

        RunReport {
            feed_url: feed_url.to_string(),
            requested_limit: limit,
            entries_seen: entries.len(),
            extraction_failures,
            model_failures,
            approx_tokens,
            estimated_cost_usd,
            records,
        }
    }
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}
