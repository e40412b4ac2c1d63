//! Aggregation strategy for grouped and summary output.
//!
//! The reporting surface only exposes grouping, not an aggregation-function
//! picker, so `count` is the only shipped strategy. The trait keeps the
//! pipeline shape fixed if richer aggregates (sum, avg, min, max) are added
//! later.

use crate::model::{Row, Value};

/// Collapses a partition of rows to one value for a field.
pub trait Aggregator: Send + Sync {
    /// Wire name of the aggregate, used in summary metrics.
    fn name(&self) -> &'static str;

    /// Aggregate value for `field` over the partition.
    fn aggregate(&self, rows: &[Row], field: &str) -> Value;
}

/// Counts the rows in the partition.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountAggregator;

impl Aggregator for CountAggregator {
    fn name(&self) -> &'static str {
        "count"
    }

    fn aggregate(&self, rows: &[Row], _field: &str) -> Value {
        Value::Number(rows.len() as f64)
    }
}
