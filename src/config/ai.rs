// src/config/ai.rs
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const ENV_AI_CONFIG_PATH: &str = "AI_CONFIG_PATH";
pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

/// Spacing below this is never allowed between model calls.
pub const MIN_CALL_SPACING_FLOOR_MS: u64 = 1_000;

/// `AI_TEST_MODE=mock` swaps the real provider for a fixed-reply mock.
pub fn is_mock_mode() -> bool {
    env::var("AI_TEST_MODE").is_ok_and(|v| v == "mock")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub enabled: bool,
    /// "openai" (case-insensitive)
    pub provider: String,
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    pub api_key: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// USD per 1000 tokens, used for the run's cost estimate.
    pub cost_per_1k_tokens: f64,
    pub min_call_spacing_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: "openai".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_key: "ENV".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.5,
            max_tokens: 300,
            cost_per_1k_tokens: 0.0015,
            min_call_spacing_ms: 1_500,
            connect_timeout_secs: 5,
            request_timeout_secs: 60,
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading ai config from {}", path.display()))?;
        let cfg: AiConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing ai config {}", path.display()))?;
        cfg.finish()
    }

    /// 1) $AI_CONFIG_PATH  2) config/ai.json  3) built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_AI_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_AI_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        let default_p = Path::new(DEFAULT_AI_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(default_p);
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        self.provider = self.provider.trim().to_lowercase();
        self.sanitize();
        self.resolve_api_key()?;
        Ok(self)
    }

    fn sanitize(&mut self) {
        let d = Self::default();
        if !(0.0..=2.0).contains(&self.temperature) {
            self.temperature = d.temperature;
        }
        if self.max_tokens == 0 {
            self.max_tokens = d.max_tokens;
        }
        if !self.cost_per_1k_tokens.is_finite() || self.cost_per_1k_tokens < 0.0 {
            self.cost_per_1k_tokens = d.cost_per_1k_tokens;
        }
        self.min_call_spacing_ms = self.min_call_spacing_ms.max(MIN_CALL_SPACING_FLOOR_MS);
        if self.connect_timeout_secs == 0 {
            self.connect_timeout_secs = d.connect_timeout_secs;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = d.request_timeout_secs;
        }
    }

    fn resolve_api_key(&mut self) -> Result<()> {
        if !self.api_key.trim().eq_ignore_ascii_case("env") {
            return Ok(());
        }
        // The key only matters when a real provider will be called.
        let needed = self.enabled && !is_mock_mode();
        self.api_key = match self.provider.as_str() {
            "openai" => match env::var("OPENAI_API_KEY") {
                Ok(k) => k,
                Err(_) if needed => bail!("Missing OPENAI_API_KEY env var"),
                Err(_) => String::new(),
            },
            other => bail!("Unsupported provider in config: {other}"),
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_prompt_contract() {
        let d = AiConfig::default();
        assert_eq!(d.model, "gpt-3.5-turbo");
        assert_eq!(d.max_tokens, 300);
        assert!((d.temperature - 0.5).abs() < f32::EPSILON);
        assert!(d.min_call_spacing_ms >= MIN_CALL_SPACING_FLOOR_MS);
    }

    #[test]
    fn sanitize_clamps_out_of_range_values() {
        let mut c = AiConfig {
            temperature: 7.0,
            max_tokens: 0,
            min_call_spacing_ms: 10,
            cost_per_1k_tokens: -1.0,
            connect_timeout_secs: 0,
            ..AiConfig::default()
        };
        c.sanitize();
        assert_eq!(c.connect_timeout_secs, 5);
        assert!((c.temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(c.max_tokens, 300);
        assert_eq!(c.min_call_spacing_ms, MIN_CALL_SPACING_FLOOR_MS);
        assert!((c.cost_per_1k_tokens - 0.0015).abs() < 1e-12);
    }

    #[test]
    fn literal_key_is_kept() {
        let mut c = AiConfig {
            api_key: "sk-literal".into(),
            ..AiConfig::default()
        };
        c.resolve_api_key().unwrap();
        assert_eq!(c.api_key, "sk-literal");
    }
}
