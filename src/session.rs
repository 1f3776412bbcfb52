//! Session state: the last completed run, kept so filters and charts can be
//! re-rendered without re-fetching. Replaced wholesale by each run, never merged.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::aggregate::AggregateTable;
use crate::pipeline::RunReport;
use crate::records::{instruments, RecordFilter, SentimentRecord};

#[derive(Debug, Clone, Serialize)]
pub struct RunSnapshot {
    pub sector: String,
    pub completed_at: DateTime<Utc>,
    /// Where the CSV landed; `None` if writing it failed.
    pub csv_path: Option<PathBuf>,
    pub report: RunReport,
}

impl RunSnapshot {
    pub fn records(&self) -> &[SentimentRecord] {
        &self.report.records
    }

    /// Derived on every call; nothing is cached next to the records.
    pub fn aggregate(&self) -> AggregateTable {
        AggregateTable::from_records(self.records())
    }

    pub fn filtered(&self, filter: &RecordFilter) -> Vec<SentimentRecord> {
        filter.apply(self.records()).into_iter().cloned().collect()
    }

    pub fn instruments(&self) -> Vec<String> {
        instruments(self.records())
    }
}

#[derive(Debug, Default)]
pub struct Session {
    current: RwLock<Option<Arc<RunSnapshot>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new snapshot, returning the one it replaced.
    pub fn replace(&self, snapshot: Arc<RunSnapshot>) -> Option<Arc<RunSnapshot>> {
        let mut g = self.current.write().unwrap_or_else(|p| p.into_inner());
        g.replace(snapshot)
    }

    pub fn current(&self) -> Option<Arc<RunSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }
}
