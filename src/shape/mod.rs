//! Shaping computed rows into the requested output form.
//!
//! The same row set maps to three shapes: a table keeps rows as-is, a chart
//! becomes a categorical series, a summary becomes one aggregate metric per
//! selected field. Axis assignment is never guessed: if the preconditions
//! for a chart are not met by the pipeline's output, shaping fails.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::execute::Aggregator;
use crate::model::{ChartKind, Row, Value};
use crate::validate::{OutputShape, ValidatedConfig};

/// The final shaped output, ready for rendering or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ReportResult {
    Table {
        /// Selected field ids, in selection order.
        columns: Vec<String>,
        rows: Vec<Row>,
    },
    Chart {
        chart: ChartKind,
        series: Vec<SeriesPoint>,
    },
    Summary {
        metrics: Vec<Metric>,
    },
}

/// One categorical data point of a chart series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Display key for the point, the string form of `x`.
    pub key: String,
    pub x: Value,
    pub y: Value,
}

/// One scalar of a summary result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub field: String,
    pub aggregate: String,
    pub value: Value,
}

/// The computed rows cannot satisfy the requested output shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("chart requires a categorical field for the x axis")]
    NoCategoricalAxis,

    #[error("chart requires a numeric or aggregated field for the y axis")]
    NoValueAxis,

    /// Pie slices must be unique categories; duplicates mean the rows were
    /// not grouped down to one per category.
    #[error("pie chart category '{0}' appears more than once")]
    DuplicatePieCategory(String),
}

/// Shape the final row set according to the config's output kind.
pub fn shape(
    rows: Vec<Row>,
    config: &ValidatedConfig,
    aggregator: &dyn Aggregator,
) -> Result<ReportResult, ShapeError> {
    match config.shape() {
        OutputShape::Table => Ok(ReportResult::Table {
            columns: config.fields().to_vec(),
            rows,
        }),
        OutputShape::Chart(chart) => shape_chart(rows, config, chart),
        OutputShape::Summary => Ok(shape_summary(rows, config, aggregator)),
    }
}

fn shape_chart(
    rows: Vec<Row>,
    config: &ValidatedConfig,
    chart: ChartKind,
) -> Result<ReportResult, ShapeError> {
    let group_by = config.group_by();
    let grouped = !group_by.is_empty();
    let aggregated = |field: &str| grouped && !group_by.iter().any(|g| g == field);

    // x: first selected field still carrying categorical values. A
    // categorical field that was aggregated away holds counts and no longer
    // qualifies.
    let x_field = config
        .fields()
        .iter()
        .find(|f| {
            !aggregated(f.as_str())
                && config
                    .field_type(f.as_str())
                    .is_some_and(|ty| ty.is_categorical())
        })
        .ok_or(ShapeError::NoCategoricalAxis)?;

    // y: first remaining field that is numeric by declaration or by
    // aggregation.
    let y_field = config
        .fields()
        .iter()
        .find(|f| {
            f.as_str() != x_field.as_str()
                && (aggregated(f.as_str())
                    || config.field_type(f.as_str()).is_some_and(|ty| ty.is_numeric()))
        })
        .ok_or(ShapeError::NoValueAxis)?;

    let mut series = Vec::with_capacity(rows.len());
    for row in &rows {
        let x = row.get(x_field).cloned().unwrap_or(Value::Null);
        let y = row.get(y_field).cloned().unwrap_or(Value::Null);
        series.push(SeriesPoint {
            key: x.to_string(),
            x,
            y,
        });
    }

    if chart == ChartKind::Pie {
        let mut seen = HashSet::new();
        for point in &series {
            if !seen.insert(point.key.clone()) {
                return Err(ShapeError::DuplicatePieCategory(point.key.clone()));
            }
        }
    }

    Ok(ReportResult::Chart { chart, series })
}

fn shape_summary(rows: Vec<Row>, config: &ValidatedConfig, aggregator: &dyn Aggregator) -> ReportResult {
    let metrics = config
        .fields()
        .iter()
        .map(|field| Metric {
            field: field.clone(),
            aggregate: aggregator.name().to_string(),
            value: aggregator.aggregate(&rows, field),
        })
        .collect();
    ReportResult::Summary { metrics }
}
