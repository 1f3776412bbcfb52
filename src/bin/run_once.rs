//! Batch mode: run one sector through the pipeline, write the CSV, log the totals.
//!
//!   SECTOR=Technology ARTICLE_LIMIT=5 cargo run --bin run_once

use anyhow::Context;
use financial_news_sentiment::aggregate::AggregateTable;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    financial_news_sentiment::init_tracing();

    let runner = financial_news_sentiment::runner_from_env()?;

    let sector = std::env::var("SECTOR").ok();
    let limit = std::env::var("ARTICLE_LIMIT")
        .ok()
        .map(|v| v.trim().parse::<usize>())
        .transpose()
        .context("ARTICLE_LIMIT must be an integer")?;
    let (sector, limit) = runner.resolve(sector.as_deref(), limit)?;

    let snap = runner.run(&sector, limit).await;
    let table = AggregateTable::from_records(snap.records());

    for i in table.instruments() {
        let cols = table
            .sentiments()
            .iter()
            .map(|s| format!("{s}={}", table.count(i, s)))
            .collect::<Vec<_>>()
            .join(" ");
        info!(instrument = i, "{cols}");
    }
    info!(
        sector = %snap.sector,
        records = snap.records().len(),
        approx_tokens = snap.report.approx_tokens as u64,
        "estimated prompting cost: ${:.4}",
        snap.report.estimated_cost_usd
    );
    match &snap.csv_path {
        Some(p) => println!("CSV saved as '{}'", p.display()),
        None => println!("CSV was not written; see log"),
    }
    Ok(())
}
