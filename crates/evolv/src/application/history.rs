//! History Store
//!
//! Append-only log of turns and events over a `HistorySink`. Appends are
//! serialized so concurrent turns keep their order.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{errors::DomainError, HistoryRecord};
use crate::ports::HistorySink;

pub const DEFAULT_HISTORY_WINDOW: usize = 10;

pub struct HistoryStore {
    sink: Arc<dyn HistorySink>,
    append_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(sink: Arc<dyn HistorySink>) -> Self {
        Self {
            sink,
            append_lock: Mutex::new(()),
        }
    }

    pub async fn append(&self, record: &HistoryRecord) -> Result<(), DomainError> {
        let _guard = self.append_lock.lock().await;
        self.sink.append(&record.to_line()).await
    }

    /// Append, logging instead of failing
    pub async fn record(&self, record: HistoryRecord) {
        if let Err(e) = self.append(&record).await {
            tracing::warn!("Failed to append history: {}", e);
        }
    }

    /// All parseable records in append order
    pub async fn records(&self) -> Result<Vec<HistoryRecord>, DomainError> {
        let lines = self.sink.read_all().await?;
        Ok(lines
            .iter()
            .filter_map(|line| HistoryRecord::from_line(line))
            .collect())
    }

    /// Context handed to the composer.
    ///
    /// Only capability-creation events, newest `window` of them; turns and
    /// notices never appear here.
    pub async fn projection(&self, window: usize) -> String {
        let records = match self.records().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Failed to read history: {}", e);
                return String::new();
            }
        };

        let created: Vec<String> = records
            .iter()
            .filter(|r| matches!(r, HistoryRecord::CapabilityCreated { .. }))
            .map(HistoryRecord::describe)
            .collect();

        let start = created.len().saturating_sub(window);
        created[start..].join("\n")
    }
}
