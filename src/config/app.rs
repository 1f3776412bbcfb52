// src/config/app.rs
use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Process settings read from the environment (see `.env.example`).
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub bind_addr: String,
    pub output_csv_path: PathBuf,
    pub article_limit_min: usize,
    pub article_limit_max: usize,
    pub article_limit_default: usize,
    /// TCP connect budget for feed and article fetches.
    pub connect_timeout: Duration,
    /// Whole-request budget for feed and article fetches.
    pub fetch_timeout: Duration,
    pub metrics_enabled: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            output_csv_path: PathBuf::from("financial_news_summary.csv"),
            article_limit_min: 1,
            article_limit_max: 40,
            article_limit_default: 5,
            connect_timeout: Duration::from_secs(5),
            fetch_timeout: Duration::from_secs(20),
            metrics_enabled: false,
        }
    }
}

impl AppSettings {
    pub fn from_env() -> Result<Self> {
        let d = Self::default();
        let s = Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or(d.bind_addr),
            output_csv_path: env::var("OUTPUT_CSV_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.output_csv_path),
            article_limit_min: d.article_limit_min,
            article_limit_max: parse_env("ARTICLE_LIMIT_MAX")?.unwrap_or(d.article_limit_max),
            article_limit_default: parse_env("ARTICLE_LIMIT_DEFAULT")?
                .unwrap_or(d.article_limit_default),
            connect_timeout: parse_env("CONNECT_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.connect_timeout),
            fetch_timeout: parse_env("FETCH_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(d.fetch_timeout),
            metrics_enabled: env::var("METRICS_ENABLED").is_ok_and(|v| v == "1"),
        };
        if s.article_limit_max < s.article_limit_min {
            bail!("ARTICLE_LIMIT_MAX must be >= {}", s.article_limit_min);
        }
        s.check_limit(s.article_limit_default)
            .context("ARTICLE_LIMIT_DEFAULT")?;
        Ok(s)
    }

    /// Accepts a requested article count if it lies within the configured bounds.
    pub fn check_limit(&self, n: usize) -> Result<usize> {
        if n < self.article_limit_min || n > self.article_limit_max {
            bail!(
                "article limit must be within {}..={}, got {n}",
                self.article_limit_min,
                self.article_limit_max
            );
        }
        Ok(n)
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(v) => v
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("invalid {key}={v}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_bounds_are_inclusive() {
        let s = AppSettings::default();
        assert!(s.check_limit(0).is_err());
        assert_eq!(s.check_limit(1).unwrap(), 1);
        assert_eq!(s.check_limit(40).unwrap(), 40);
        assert!(s.check_limit(41).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_rejects_garbage() {
        env::set_var("ARTICLE_LIMIT_MAX", "10");
        env::set_var("OUTPUT_CSV_PATH", "/tmp/out.csv");
        env::set_var("CONNECT_TIMEOUT_SECS", "2");
        let s = AppSettings::from_env().unwrap();
        assert_eq!(s.article_limit_max, 10);
        assert_eq!(s.connect_timeout, Duration::from_secs(2));
        assert_eq!(s.fetch_timeout, Duration::from_secs(20));
        assert_eq!(s.output_csv_path, PathBuf::from("/tmp/out.csv"));

        env::set_var("ARTICLE_LIMIT_MAX", "lots");
        assert!(AppSettings::from_env().is_err());

        env::remove_var("ARTICLE_LIMIT_MAX");
        env::remove_var("OUTPUT_CSV_PATH");
        env::remove_var("CONNECT_TIMEOUT_SECS");
    }
}
