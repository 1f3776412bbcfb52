//! AI adapter: fixed prompt contract + provider abstraction.
//!
//! `Provider` does one raw completion call; `InsightRequester` wraps any provider with
//! the prompt, the cost heuristic and the fail-soft mapping the pipeline relies on.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ai::{is_mock_mode, AiConfig};

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Completed,
    Failed,
}

/// Raw model text plus the approximate token cost of the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub raw_text: String,
    pub approx_cost_tokens: f64,
    pub status: ResponseStatus,
}

impl ModelResponse {
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self {
            raw_text: format!("Error: {cause}"),
            approx_cost_tokens: 0.0,
            status: ResponseStatus::Failed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ResponseStatus::Completed
    }
}

/// Sampling knobs sent with every call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            max_tokens: 300,
        }
    }
}

/// What the pipeline talks to: one headline + article in, one response out. Never fails.
pub trait InsightModel: Send + Sync {
    fn request<'a>(
        &'a self,
        headline: &'a str,
        article: &'a str,
    ) -> Pin<Box<dyn Future<Output = ModelResponse> + Send + 'a>>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynInsightModel = Arc<dyn InsightModel>;

/// Render the fixed prompt for one article.
pub fn build_prompt(headline: &str, article: &str) -> String {
    format!(
        "Headline: {headline}

Article:
{article}

Summarize the article in 3 or 4 lines.
The summary must include what the article is about, what its conclusion is and how it arrived at the conclusion.
Then list the sentiment (bullish, bearish, or neutral) for each stock or company mentioned in the article.

Respond in this format exactly:
Summary: <summary>
Sentiments:
<Stock1>: <sentiment>
<Stock2>: <sentiment>
(If no specific stock is mentioned, just write 'general: <sentiment>')
"
    )
}

/// Approximate tokens for one call: prompt characters / 4 plus the full output budget.
/// A heuristic only; it does not follow any provider's tokenizer.
pub fn approx_cost_tokens(prompt: &str, max_tokens: u32) -> f64 {
    prompt.chars().count() as f64 / 4.0 + f64::from(max_tokens)
}

/// Factory: build the model client according to config and environment.
///
/// * If `AI_TEST_MODE=mock`, returns a deterministic mock.
/// * Else if `config.enabled == false`, every call fails (entries yield no records).
/// * Else builds the configured provider.
pub fn build_client_from_config(config: &AiConfig) -> Result<DynInsightModel> {
    let params = SamplingParams {
        temperature: config.temperature,
        max_tokens: config.max_tokens,
    };

    if is_mock_mode() {
        return Ok(Arc::new(InsightRequester::new(MockProvider::neutral(), params)));
    }
    if !config.enabled {
        return Ok(Arc::new(InsightRequester::new(DisabledProvider, params)));
    }

    match config.provider.as_str() {
        "openai" => {
            let provider = OpenAiProvider::new(
                &config.api_key,
                &config.model,
                &config.base_url,
                Duration::from_secs(config.connect_timeout_secs),
                Duration::from_secs(config.request_timeout_secs),
            )?;
            Ok(Arc::new(InsightRequester::new(provider, params)))
        }
        other => bail!("unsupported ai provider: {other}"),
    }
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: does a *real* remote call and returns the reply text.
pub trait Provider: Send + Sync + 'static {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        params: SamplingParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;
    fn name(&self) -> &'static str;
}

/// OpenAI Chat Completions provider.
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: &str,
        connect_timeout: Duration,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("financial-news-sentiment/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .context("building openai http client")?;
        Ok(Self {
            http,
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }
}

impl Provider for OpenAiProvider {
    fn complete<'a>(
        &'a self,
        prompt: &'a str,
        params: SamplingParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            if self.api_key.is_empty() {
                bail!("missing api key");
            }

            #[derive(Serialize)]
            struct Msg<'a> {
                role: &'a str,
                content: &'a str,
            }
            #[derive(Serialize)]
            struct Req<'a> {
                model: &'a str,
                messages: Vec<Msg<'a>>,
                temperature: f32,
                max_tokens: u32,
            }
            #[derive(Deserialize)]
            struct Resp {
                choices: Vec<Choice>,
            }
            #[derive(Deserialize)]
            struct Choice {
                message: ChoiceMsg,
            }
            #[derive(Deserialize)]
            struct ChoiceMsg {
                content: Option<String>,
            }

            let req = Req {
                model: &self.model,
                messages: vec![Msg {
                    role: "user",
                    content: prompt,
                }],
                temperature: params.temperature,
                max_tokens: params.max_tokens,
            };

            let resp = self
                .http
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&req)
                .send()
                .await
                .context("openai request")?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                bail!("openai returned {status}: {}", body.trim());
            }
            let body: Resp = resp.json().await.context("decoding openai response")?;
            body.choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .ok_or_else(|| anyhow!("openai response had no content"))
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Always errors; used when the model is disabled in config.
pub struct DisabledProvider;

impl Provider for DisabledProvider {
    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
        _params: SamplingParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async { Err(anyhow!("ai provider disabled in config")) })
    }
    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Fixed-reply provider for tests/local runs.
#[derive(Clone)]
pub struct MockProvider {
    pub fixed: String,
}

impl MockProvider {
    pub fn new(fixed: impl Into<String>) -> Self {
        Self {
            fixed: fixed.into(),
        }
    }

    pub fn neutral() -> Self {
        Self::new("Summary: No material news (mock).\nSentiments:\ngeneral: neutral")
    }
}

impl Provider for MockProvider {
    fn complete<'a>(
        &'a self,
        _prompt: &'a str,
        _params: SamplingParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

// ------------------------------------------------------------
// Prompt + fail-soft wrapper
// ------------------------------------------------------------

/// One attempt per article, no retry. Errors become a `Failed` response with zero cost.
pub struct InsightRequester<P: Provider> {
    inner: P,
    params: SamplingParams,
}

impl<P: Provider> InsightRequester<P> {
    pub fn new(inner: P, params: SamplingParams) -> Self {
        Self { inner, params }
    }

    async fn request_impl(&self, headline: &str, article: &str) -> ModelResponse {
        let prompt = build_prompt(headline, article);
        counter!("model_calls_total").increment(1);

        match self.inner.complete(&prompt, self.params).await {
            Ok(text) => {
                let cost = approx_cost_tokens(&prompt, self.params.max_tokens);
                debug!(provider = self.inner.name(), approx_tokens = cost, "model call ok");
                ModelResponse {
                    raw_text: text.trim().to_string(),
                    approx_cost_tokens: cost,
                    status: ResponseStatus::Completed,
                }
            }
            Err(e) => {
                warn!(provider = self.inner.name(), error = %format!("{e:#}"), "model call failed");
                counter!("model_failures_total").increment(1);
                ModelResponse::failed(format!("{e:#}"))
            }
        }
    }
}

impl<P: Provider> InsightModel for InsightRequester<P> {
    fn request<'a>(
        &'a self,
        headline: &'a str,
        article: &'a str,
    ) -> Pin<Box<dyn Future<Output = ModelResponse> + Send + 'a>> {
        Box::pin(self.request_impl(headline, article))
    }
    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_carries_inputs_and_format_contract() {
        let p = build_prompt("Fed holds rates", "Body text.");
        assert!(p.starts_with("Headline: Fed holds rates"));
        assert!(p.contains("Article:\nBody text."));
        assert!(p.contains("Summary: <summary>"));
        assert!(p.contains("<Stock1>: <sentiment>"));
        assert!(p.contains("'general: <sentiment>'"));
    }

    #[test]
    fn cost_is_chars_over_four_plus_budget() {
        assert_eq!(approx_cost_tokens("abcdefgh", 300), 302.0);
        assert_eq!(approx_cost_tokens("", 10), 10.0);
        // characters, not bytes
        assert_eq!(approx_cost_tokens("éééé", 0), 1.0);
    }

    #[tokio::test]
    async fn completed_response_is_trimmed_and_costed() {
        let r = InsightRequester::new(MockProvider::new("  Summary: ok\n"), SamplingParams::default());
        let out = r.request("H", "A").await;
        assert!(out.is_completed());
        assert_eq!(out.raw_text, "Summary: ok");
        let expected = approx_cost_tokens(&build_prompt("H", "A"), 300);
        assert_eq!(out.approx_cost_tokens, expected);
        assert_eq!(r.provider_name(), "mock");
    }

    #[tokio::test]
    async fn failure_maps_to_error_text_and_zero_cost() {
        let r = InsightRequester::new(DisabledProvider, SamplingParams::default());
        let out = r.request("H", "A").await;
        assert_eq!(out.status, ResponseStatus::Failed);
        assert_eq!(out.approx_cost_tokens, 0.0);
        assert!(out.raw_text.starts_with("Error: "));
    }

    #[tokio::test]
    async fn openai_without_key_fails_without_network() {
        let p = OpenAiProvider::new(
            "",
            "gpt-3.5-turbo",
            "http://127.0.0.1:9",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let out = InsightRequester::new(p, SamplingParams::default())
            .request("H", "A")
            .await;
        assert!(!out.is_completed());
    }
}
