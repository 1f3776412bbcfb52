// src/runner.rs
//! Wires config into a [`Pipeline`] and executes runs: pipeline, CSV, session swap.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::analyze::ai_adapter::build_client_from_config;
use crate::config::{AiConfig, AppSettings, Sector, SectorCatalog};
use crate::ingest::extract::HttpArticleExtractor;
use crate::ingest::providers::rss::RssFeedReader;
use crate::pipeline::Pipeline;
use crate::rate_limit::FixedSpacing;
use crate::records::write_csv;
use crate::session::{RunSnapshot, Session};

pub struct Runner {
    pipeline: Pipeline,
    sectors: SectorCatalog,
    settings: AppSettings,
    session: Arc<Session>,
    // runs never interleave
    run_lock: tokio::sync::Mutex<()>,
}

impl Runner {
    pub fn new(
        pipeline: Pipeline,
        sectors: SectorCatalog,
        settings: AppSettings,
        session: Arc<Session>,
    ) -> Self {
        Self {
            pipeline,
            sectors,
            settings,
            session,
            run_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Production wiring: RSS over HTTP, HTTP article extraction, configured model,
    /// fixed spacing between model calls.
    pub fn from_config(
        ai: &AiConfig,
        sectors: SectorCatalog,
        settings: AppSettings,
        session: Arc<Session>,
    ) -> Result<Self> {
        info!(
            "AI cfg loaded: provider={}, model={}, enabled={}, key_len={}",
            ai.provider,
            ai.model,
            ai.enabled,
            ai.api_key.len()
        );
        let spacing = FixedSpacing::from_millis(ai.min_call_spacing_ms);
        info!(
            spacing_ms = spacing.interval().as_millis() as u64,
            connect_timeout_s = settings.connect_timeout.as_secs(),
            fetch_timeout_s = settings.fetch_timeout.as_secs(),
            "pipeline wiring"
        );
        let pipeline = Pipeline::new(
            Arc::new(RssFeedReader::http(
                settings.connect_timeout,
                settings.fetch_timeout,
            )?),
            Arc::new(HttpArticleExtractor::new(
                settings.connect_timeout,
                settings.fetch_timeout,
            )?),
            build_client_from_config(ai)?,
            Arc::new(spacing),
        )
        .with_cost_per_1k_tokens(ai.cost_per_1k_tokens);
        Ok(Self::new(pipeline, sectors, settings, session))
    }

    pub fn sectors(&self) -> &SectorCatalog {
        &self.sectors
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Validate a run request: known sector (default when absent) and in-range limit.
    pub fn resolve(&self, sector: Option<&str>, limit: Option<usize>) -> Result<(Sector, usize)> {
        let sector = match sector {
            Some(name) => self
                .sectors
                .get(name)
                .ok_or_else(|| {
                    anyhow!(
                        "unknown sector: {name} (known: {})",
                        self.sectors.names().join(", ")
                    )
                })?,
            None => self.sectors.default_sector(),
        };
        let limit = self
            .settings
            .check_limit(limit.unwrap_or(self.settings.article_limit_default))?;
        Ok((sector.clone(), limit))
    }

    /// Run one sector to completion, persist the CSV and replace the session snapshot.
    /// Never fails: feed/article/model problems only thin out the records.
    pub async fn run(&self, sector: &Sector, limit: usize) -> Arc<RunSnapshot> {
        let _guard = self.run_lock.lock().await;
        info!(sector = %sector.name, limit, "run started");

        let report = self.pipeline.run(&sector.url, limit).await;

        let path = &self.settings.output_csv_path;
        let csv_path = match write_csv(path, &report.records) {
            Ok(()) => {
                info!(path = %path.display(), rows = report.records.len(), "csv written");
                Some(path.clone())
            }
            Err(e) => {
                warn!(path = %path.display(), error = %format!("{e:#}"), "csv write failed");
                None
            }
        };

        let snapshot = Arc::new(RunSnapshot {
            sector: sector.name.clone(),
            completed_at: Utc::now(),
            csv_path,
            report,
        });
        self.session.replace(Arc::clone(&snapshot));
        snapshot
    }
}
