//! # Aggregation
//! Pure, order-independent `(instrument, sentiment) -> count` table derived from a
//! record set, plus the per-sentiment bar series a chart needs.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::records::SentimentRecord;

/// Instruments as rows, observed sentiments as columns, missing cells zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateTable {
    sentiments: Vec<String>,
    rows: BTreeMap<String, BTreeMap<String, usize>>,
}

/// One bar group of the chart: a sentiment, its color, one count per instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub sentiment: String,
    pub color: &'static str,
    pub values: Vec<usize>,
}

impl AggregateTable {
    pub fn from_records(records: &[SentimentRecord]) -> Self {
        let sentiments: BTreeSet<&str> = records.iter().map(|r| r.sentiment.as_str()).collect();

        let mut rows: BTreeMap<String, BTreeMap<String, usize>> = BTreeMap::new();
        for r in records {
            let row = rows.entry(r.instrument.clone()).or_insert_with(|| {
                sentiments.iter().map(|s| (s.to_string(), 0)).collect()
            });
            *row.entry(r.sentiment.clone()).or_insert(0) += 1;
        }

        Self {
            sentiments: sentiments.into_iter().map(str::to_string).collect(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row labels, sorted.
    pub fn instruments(&self) -> Vec<&str> {
        self.rows.keys().map(String::as_str).collect()
    }

    /// Column labels, sorted.
    pub fn sentiments(&self) -> &[String] {
        &self.sentiments
    }

    pub fn count(&self, instrument: &str, sentiment: &str) -> usize {
        self.rows
            .get(instrument)
            .and_then(|row| row.get(sentiment))
            .copied()
            .unwrap_or(0)
    }

    pub fn row(&self, instrument: &str) -> Option<&BTreeMap<String, usize>> {
        self.rows.get(instrument)
    }

    pub fn row_total(&self, instrument: &str) -> usize {
        self.rows
            .get(instrument)
            .map(|row| row.values().sum())
            .unwrap_or(0)
    }

    pub fn series(&self) -> Vec<ChartSeries> {
        self.sentiments
            .iter()
            .map(|s| ChartSeries {
                sentiment: s.clone(),
                color: sentiment_color(s),
                values: self.rows.keys().map(|i| self.count(i, s)).collect(),
            })
            .collect()
    }
}

pub fn sentiment_color(sentiment: &str) -> &'static str {
    match sentiment {
        "bullish" => "#2ca02c",
        "neutral" => "#ff7f0e",
        "bearish" => "#d62728",
        _ => "gray",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(instrument: &str, sentiment: &str) -> SentimentRecord {
        SentimentRecord {
            date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            headline: "h".into(),
            summary: "s".into(),
            instrument: instrument.into(),
            sentiment: sentiment.into(),
            url: "u".into(),
        }
    }

    fn sample() -> Vec<SentimentRecord> {
        vec![
            rec("AAPL", "bullish"),
            rec("MSFT", "bearish"),
            rec("AAPL", "bullish"),
            rec("AAPL", "neutral"),
            rec("general", "neutral"),
        ]
    }

    #[test]
    fn counts_and_zero_fill() {
        let t = AggregateTable::from_records(&sample());
        assert_eq!(t.instruments(), vec!["AAPL", "MSFT", "general"]);
        assert_eq!(t.sentiments(), ["bearish", "bullish", "neutral"]);
        assert_eq!(t.count("AAPL", "bullish"), 2);
        assert_eq!(t.count("MSFT", "bullish"), 0);
        assert_eq!(t.row("MSFT").unwrap().len(), 3);
        assert_eq!(t.count("TSLA", "bullish"), 0);
    }

    #[test]
    fn row_totals_match_record_counts() {
        let recs = sample();
        let t = AggregateTable::from_records(&recs);
        for i in t.instruments() {
            let direct = recs.iter().filter(|r| r.instrument == i).count();
            let by_cols: usize = t.sentiments().iter().map(|s| t.count(i, s)).sum();
            assert_eq!(by_cols, direct, "instrument {i}");
            assert_eq!(t.row_total(i), direct);
        }
    }

    #[test]
    fn order_independent() {
        let mut recs = sample();
        let a = AggregateTable::from_records(&recs);
        recs.reverse();
        assert_eq!(a, AggregateTable::from_records(&recs));
    }

    #[test]
    fn empty_input_empty_table() {
        let t = AggregateTable::from_records(&[]);
        assert!(t.is_empty());
        assert!(t.series().is_empty());
    }

    #[test]
    fn series_follow_instrument_order_with_colors() {
        let t = AggregateTable::from_records(&sample());
        let s = t.series();
        assert_eq!(s.len(), 3);
        assert_eq!(s[1].sentiment, "bullish");
        assert_eq!(s[1].color, "#2ca02c");
        assert_eq!(s[1].values, vec![2, 0, 0]);
        assert_eq!(sentiment_color("mixed"), "gray");
    }
}
