//! Report execution pipeline.
//!
//! Stages run in a fixed order: filter, date-range narrowing, group, sort,
//! shape. Execution is a pure function of the validated config and the row
//! snapshot; concurrent executions share nothing mutable. A wrong runtime
//! type anywhere in a filtered, grouped, or sorted field aborts the whole
//! run, since a partially computed report is worse than a clear failure.

pub mod aggregate;
pub mod error;
pub mod source;

pub use aggregate::{Aggregator, CountAggregator};
pub use error::{ExecuteResult, ExecutionError, RowSourceError};
pub use source::{CancellationToken, MemoryRowSource, RowSource};

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use crate::filter::{self, EvaluatorOptions};
use crate::model::{FieldType, Row, SortDirection, Value};
use crate::shape::{self, ReportResult};
use crate::validate::ValidatedConfig;

/// Runs validated report configurations against a row source.
#[derive(Clone)]
pub struct ReportExecutor {
    options: EvaluatorOptions,
    aggregator: Arc<dyn Aggregator>,
}

impl Default for ReportExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportExecutor {
    /// Executor with default options and count aggregation.
    pub fn new() -> Self {
        Self {
            options: EvaluatorOptions::default(),
            aggregator: Arc::new(CountAggregator),
        }
    }

    pub fn with_options(mut self, options: EvaluatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Swap the aggregation strategy used for grouped and summary output.
    pub fn with_aggregator(mut self, aggregator: Arc<dyn Aggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Execute a report: fetch, filter, narrow, group, sort, shape.
    ///
    /// Cancellation is observed between stages and propagated into the
    /// fetch; a cancelled run returns [`ExecutionError::Cancelled`] and no
    /// partial result.
    pub async fn execute(
        &self,
        config: &ValidatedConfig,
        source: &dyn RowSource,
        cancel: &CancellationToken,
    ) -> ExecuteResult<ReportResult> {
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        debug!(report = config.name(), tables = ?config.tables(), "fetching rows");
        // Cancellation wins over whatever error an interrupted fetch reports.
        let rows = match source.fetch(config.tables(), cancel).await {
            Ok(rows) => rows,
            Err(_) if cancel.is_cancelled() => return Err(ExecutionError::Cancelled),
            Err(e) => return Err(e.into()),
        };
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }
        debug!(report = config.name(), rows = rows.len(), "fetched snapshot");

        let rows = self.filter_stage(config, rows)?;
        let rows = date_range_stage(config, rows)?;
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        let rows = self.group_stage(config, rows)?;
        let rows = sort_stage(config, rows)?;
        if cancel.is_cancelled() {
            return Err(ExecutionError::Cancelled);
        }

        debug!(report = config.name(), rows = rows.len(), "shaping result");
        Ok(shape::shape(rows, config, self.aggregator.as_ref())?)
    }

    /// Keep rows where every filter matches; filters compose with AND.
    fn filter_stage(&self, config: &ValidatedConfig, rows: Vec<Row>) -> ExecuteResult<Vec<Row>> {
        if config.filters().is_empty() {
            return Ok(rows);
        }
        let mut kept = Vec::with_capacity(rows.len());
        'rows: for row in rows {
            for f in config.filters() {
                let field_type = field_type_of(config, &f.field);
                if !filter::matches(f, field_type, &row, &self.options)? {
                    continue 'rows;
                }
            }
            kept.push(row);
        }
        Ok(kept)
    }

    /// Partition rows by the groupBy value tuple (first-seen order) and
    /// collapse each partition: key fields keep their value, every other
    /// selected field carries the aggregate.
    fn group_stage(&self, config: &ValidatedConfig, rows: Vec<Row>) -> ExecuteResult<Vec<Row>> {
        let group_by = config.group_by();
        if group_by.is_empty() {
            return Ok(rows);
        }

        let mut keys: Vec<Vec<Value>> = Vec::new();
        let mut partitions: Vec<Vec<Row>> = Vec::new();
        for row in rows {
            let mut key = Vec::with_capacity(group_by.len());
            for field in group_by {
                let value = row.get(field).cloned().unwrap_or(Value::Null);
                let declared = field_type_of(config, field);
                if !value.is_null() && !value.matches_type(declared) {
                    return Err(ExecutionError::TypeMismatch {
                        field: field.clone(),
                        expected: declared,
                        found: value.type_name(),
                    });
                }
                key.push(value);
            }
            match keys.iter().position(|k| *k == key) {
                Some(i) => partitions[i].push(row),
                None => {
                    keys.push(key);
                    partitions.push(vec![row]);
                }
            }
        }

        let mut out = Vec::with_capacity(keys.len());
        for (key, partition) in keys.into_iter().zip(partitions) {
            let mut row = Row::new();
            for (field, value) in group_by.iter().zip(key) {
                row.insert(field.clone(), value);
            }
            for field in config.fields() {
                if group_by.contains(field) {
                    continue;
                }
                row.insert(field.clone(), self.aggregator.aggregate(&partition, field));
            }
            out.push(row);
        }
        Ok(out)
    }
}

/// Apply the optional date window as an implicit inclusive `between`.
fn date_range_stage(config: &ValidatedConfig, rows: Vec<Row>) -> ExecuteResult<Vec<Row>> {
    let range = match config.date_range() {
        Some(range) => range,
        None => return Ok(rows),
    };

    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        let keep = match row.get(&range.field).unwrap_or(&Value::Null) {
            // Same null semantics as an inclusion filter.
            Value::Null => false,
            Value::Date(d) => *d >= range.start && *d <= range.end,
            other => {
                return Err(ExecutionError::TypeMismatch {
                    field: range.field.clone(),
                    expected: FieldType::Date,
                    found: other.type_name(),
                })
            }
        };
        if keep {
            kept.push(row);
        }
    }
    Ok(kept)
}

/// Stable multi-key sort; ties keep their pre-sort relative order.
fn sort_stage(config: &ValidatedConfig, mut rows: Vec<Row>) -> ExecuteResult<Vec<Row>> {
    if config.order_by().is_empty() {
        return Ok(rows);
    }

    // Check every sort value up front so the comparator itself cannot fail.
    let grouped = !config.group_by().is_empty();
    for order in config.order_by() {
        let declared = field_type_of(config, &order.field);
        let aggregated = grouped && !config.group_by().contains(&order.field);
        let expected = if aggregated {
            // Aggregated fields hold counts after grouping.
            FieldType::Number
        } else {
            declared
        };
        for row in &rows {
            match row.get(&order.field) {
                None => return Err(ExecutionError::MissingSortField(order.field.clone())),
                Some(v) if !v.is_null() && !v.matches_type(expected) => {
                    return Err(ExecutionError::TypeMismatch {
                        field: order.field.clone(),
                        expected,
                        found: v.type_name(),
                    });
                }
                _ => {}
            }
        }
    }

    rows.sort_by(|a, b| {
        for order in config.order_by() {
            let va = a.get(&order.field).unwrap_or(&Value::Null);
            let vb = b.get(&order.field).unwrap_or(&Value::Null);
            let ord = match order.direction {
                SortDirection::Asc => sort_cmp(va, vb),
                SortDirection::Desc => sort_cmp(va, vb).reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(rows)
}

/// Total order over values for sorting: nulls after everything else, then
/// the native order of the type. Mixed-type columns are rejected before the
/// sort runs, so the cross-type fallback only keeps the order total.
fn sort_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Greater,
        (_, Value::Null) => Ordering::Less,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x.total_cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Text(x), Value::Text(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 4,
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::Date(_) => 2,
        Value::Text(_) => 3,
    }
}

fn field_type_of(config: &ValidatedConfig, field: &str) -> FieldType {
    config
        .field_type(field)
        .expect("validated config tracks every referenced field")
}
