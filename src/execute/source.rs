//! The external row source capability.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::error::RowSourceError;
use crate::model::Row;

/// Token for cooperative cancellation of a running report.
///
/// Uses an AtomicBool internally. Clone is cheap and shares state.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new token (not cancelled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Supplies the candidate rows for the tables a report references.
///
/// This is the only suspension point in an execution. Implementations may
/// be backed by a relational query, an API call, or an in-memory cache;
/// they receive the cancellation token so a caller navigating away does
/// not leave orphaned work behind. The fetch returns one denormalized
/// snapshot; the executor never goes back for more rows.
#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch(
        &self,
        tables: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Row>, RowSourceError>;
}

/// In-memory row source over a fixed snapshot.
///
/// The test and demo collaborator; also backs the CLI's JSON row files.
#[derive(Debug, Clone, Default)]
pub struct MemoryRowSource {
    rows: Vec<Row>,
}

impl MemoryRowSource {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Parse rows from a JSON array of flat objects.
    pub fn from_json(json: &str) -> Result<Self, RowSourceError> {
        let rows: Vec<Row> = serde_json::from_str(json)
            .map_err(|e| RowSourceError::InvalidData(e.to_string()))?;
        Ok(Self::new(rows))
    }
}

#[async_trait]
impl RowSource for MemoryRowSource {
    async fn fetch(
        &self,
        _tables: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<Row>, RowSourceError> {
        if cancel.is_cancelled() {
            return Err(RowSourceError::Other("fetch cancelled".to_string()));
        }
        Ok(self.rows.clone())
    }
}
