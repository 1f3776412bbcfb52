//! # Sentiment records
//! Fan-out of one parsed reply into one row per entity, plus the post-run artifact
//! filter, the record filters offered to the control panel, and CSV output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::analyze::parser::ParsedInsight;
use crate::ingest::types::FeedEntry;

/// Column order of the output file.
pub const CSV_HEADER: [&str; 6] = ["date", "headline", "summary", "instrument", "sentiment", "url"];

/// Entity label the parser produces from a stray `Sentiments:` header line.
const ARTIFACT_INSTRUMENT: &str = "sentiments";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentRecord {
    #[serde(with = "ymd")]
    pub date: NaiveDate,
    pub headline: String,
    pub summary: String,
    pub instrument: String,
    pub sentiment: String,
    pub url: String,
}

pub type RecordSet = Vec<SentimentRecord>;

/// One record per `(entity, sentiment)` pair; none when the insight has no pairs.
pub fn build_records(
    entry: &FeedEntry,
    insight: &ParsedInsight,
    date: NaiveDate,
) -> Vec<SentimentRecord> {
    insight
        .sentiments
        .iter()
        .map(|(instrument, sentiment)| SentimentRecord {
            date,
            headline: entry.headline.clone(),
            summary: insight.summary.clone(),
            instrument: instrument.clone(),
            sentiment: sentiment.clone(),
            url: entry.link.clone(),
        })
        .collect()
}

pub fn is_parser_artifact(instrument: &str) -> bool {
    instrument.to_lowercase() == ARTIFACT_INSTRUMENT
}

/// Drop rows whose instrument is the `Sentiments` header misread as an entity.
/// Returns how many were dropped.
pub fn drop_parser_artifacts(records: &mut RecordSet) -> usize {
    let before = records.len();
    records.retain(|r| !is_parser_artifact(&r.instrument));
    before - records.len()
}

/// Sorted, unique instruments (filter choices).
pub fn instruments(records: &[SentimentRecord]) -> Vec<String> {
    let set: std::collections::BTreeSet<&str> =
        records.iter().map(|r| r.instrument.as_str()).collect();
    set.into_iter().map(str::to_string).collect()
}

/// Post-run view filter. `None` or `"all"` leaves a dimension unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RecordFilter {
    pub sentiment: Option<String>,
    pub instrument: Option<String>,
}

impl RecordFilter {
    pub fn matches(&self, r: &SentimentRecord) -> bool {
        fn ok(want: &Option<String>, have: &str) -> bool {
            match want.as_deref() {
                None | Some("all") => true,
                Some(w) => w == have,
            }
        }
        ok(&self.sentiment, &r.sentiment) && ok(&self.instrument, &r.instrument)
    }

    pub fn apply<'a>(&self, records: &'a [SentimentRecord]) -> Vec<&'a SentimentRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Overwrite `path` with a header row plus one row per record.
pub fn write_csv(path: &Path, records: &[SentimentRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut w = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    w.write_record(CSV_HEADER)?;
    for r in records {
        w.serialize(r)
            .with_context(|| format!("writing row for {}", r.instrument))?;
    }
    w.flush().with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

mod ymd {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FMT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&d.format(FMT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        NaiveDate::parse_from_str(&raw, FMT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::parser::parse_response;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()
    }

    fn rec(instrument: &str, sentiment: &str) -> SentimentRecord {
        SentimentRecord {
            date: day(),
            headline: "h".into(),
            summary: "s".into(),
            instrument: instrument.into(),
            sentiment: sentiment.into(),
            url: "https://example.test".into(),
        }
    }

    #[test]
    fn one_record_per_pair_sharing_provenance() {
        let entry = FeedEntry::new("Chipmakers rally", "https://example.test/chips");
        let insight = parse_response("Summary: up\nNVDA: bullish\nAMD: neutral");
        let out = build_records(&entry, &insight, day());
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.headline == "Chipmakers rally"
            && r.summary == "up"
            && r.url == "https://example.test/chips"
            && r.date == day()));
        assert_eq!(out[0].instrument, "NVDA");
        assert_eq!(out[1].sentiment, "neutral");
    }

    #[test]
    fn zero_pairs_zero_records() {
        let entry = FeedEntry::new("h", "u");
        let insight = parse_response("Summary: only a summary");
        assert!(build_records(&entry, &insight, day()).is_empty());
    }

    #[test]
    fn artifact_filter_is_case_insensitive() {
        let mut v = vec![rec("Sentiments", "see below"), rec("SENTIMENTS", ""), rec("AAPL", "bullish")];
        assert_eq!(drop_parser_artifacts(&mut v), 2);
        assert_eq!(v.len(), 1);
        assert_eq!(v[0].instrument, "AAPL");
    }

    #[test]
    fn filters_compose_and_all_means_any() {
        let v = vec![rec("AAPL", "bullish"), rec("AAPL", "bearish"), rec("MSFT", "bullish")];
        let f = RecordFilter {
            sentiment: Some("bullish".into()),
            instrument: Some("all".into()),
        };
        assert_eq!(f.apply(&v).len(), 2);
        let f = RecordFilter {
            sentiment: Some("bullish".into()),
            instrument: Some("MSFT".into()),
        };
        assert_eq!(f.apply(&v), vec![&v[2]]);
        assert_eq!(RecordFilter::default().apply(&v).len(), 3);
    }

    #[test]
    fn instrument_choices_sorted_unique() {
        let v = vec![rec("MSFT", "x"), rec("AAPL", "y"), rec("MSFT", "z")];
        assert_eq!(instruments(&v), vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out/summary.csv");
        write_csv(&p, &[rec("AAPL", "bullish")]).unwrap();
        let s = fs::read_to_string(&p).unwrap();
        let mut lines = s.lines();
        assert_eq!(lines.next(), Some("date,headline,summary,instrument,sentiment,url"));
        assert_eq!(lines.next(), Some("2024-05-17,h,s,AAPL,bullish,https://example.test"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_for_empty_set_is_header_only_and_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("summary.csv");
        write_csv(&p, &[rec("AAPL", "bullish"), rec("MSFT", "bearish")]).unwrap();
        write_csv(&p, &[]).unwrap();
        let s = fs::read_to_string(&p).unwrap();
        assert_eq!(s, "date,headline,summary,instrument,sentiment,url\n");
    }
}
