// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod aggregate;
pub mod analyze;
pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod pipeline;
pub mod rate_limit;
pub mod records;
pub mod runner;
pub mod session;

// ---- Re-exports for stable public API ----
pub use crate::analyze::ai_adapter;
pub use crate::api::create_router;
pub use crate::pipeline::{Pipeline, RunReport};
pub use crate::runner::Runner;
pub use crate::session::{RunSnapshot, Session};

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global tracing subscriber.
/// `RUST_LOG` drives the filter; `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("financial_news_sentiment=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    // try_init: tests and embedding hosts may already have a subscriber
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

fn load_config() -> Result<(config::AiConfig, config::SectorCatalog, config::AppSettings)> {
    let ai = config::AiConfig::load_default()?;
    let sectors = config::sectors::load_sectors_default()?;
    let settings = config::AppSettings::from_env()?;
    Ok((ai, sectors, settings))
}

/// Build the runner from config files + environment.
pub fn runner_from_env() -> Result<Runner> {
    let (ai, sectors, settings) = load_config()?;
    Runner::from_config(&ai, sectors, settings, Arc::new(Session::new()))
}

/// Full in-process app: API routes, plus `/metrics` when `METRICS_ENABLED=1`.
pub fn app() -> Result<axum::Router> {
    let (ai, sectors, settings) = load_config()?;
    let metrics_enabled = settings.metrics_enabled;
    let runner = Runner::from_config(&ai, sectors, settings, Arc::new(Session::new()))?;

    let mut router = api::create_router(api::AppState::new(Arc::new(runner)));
    if metrics_enabled {
        let m = metrics::Metrics::init(ai.min_call_spacing_ms)?;
        router = router.merge(m.router());
    }
    Ok(router)
}
