//! Export transforms for shaped results.
//!
//! Each export is a pure transform of a [`ReportResult`]: CSV bytes for
//! tables and summaries, a renderer-ready chart spec for chart images, and
//! a document payload for PDF generation. None of these render pixels; they
//! produce the data contract a renderer or print service consumes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ChartKind;
use crate::shape::{Metric, ReportResult, SeriesPoint};

/// Default canvas for chart image payloads, matching the dashboard's
/// standard card size.
const CHART_WIDTH: u32 = 800;
const CHART_HEIGHT: u32 = 450;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The result shape does not fit the requested export format.
    #[error("{format} export does not support {shape} results")]
    UnsupportedShape {
        format: &'static str,
        shape: &'static str,
    },

    #[error("failed to encode CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to finish CSV buffer: {0}")]
    CsvFlush(String),
}

/// Serialize a table or summary result to CSV bytes.
///
/// The header row carries field ids for tables and the fixed
/// `field,aggregate,value` triple for summaries. Chart series have no
/// tabular contract and are rejected.
pub fn to_csv(result: &ReportResult) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    match result {
        ReportResult::Table { columns, rows } => {
            writer.write_record(columns)?;
            for row in rows {
                let record: Vec<String> = columns
                    .iter()
                    .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default())
                    .collect();
                writer.write_record(&record)?;
            }
        }
        ReportResult::Summary { metrics } => {
            writer.write_record(["field", "aggregate", "value"])?;
            for metric in metrics {
                let value = metric.value.to_string();
                writer.write_record([
                    metric.field.as_str(),
                    metric.aggregate.as_str(),
                    value.as_str(),
                ])?;
            }
        }
        ReportResult::Chart { .. } => {
            return Err(ExportError::UnsupportedShape {
                format: "CSV",
                shape: "chart",
            });
        }
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::CsvFlush(e.to_string()))
}

/// PNG-ready chart description: everything a renderer needs to draw the
/// image, serialized for handoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartImageSpec {
    pub chart: ChartKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub series: Vec<SeriesPoint>,
}

/// Build a chart image payload from a chart result.
pub fn to_chart_image(result: &ReportResult, title: &str) -> Result<ChartImageSpec, ExportError> {
    match result {
        ReportResult::Chart { chart, series } => Ok(ChartImageSpec {
            chart: *chart,
            title: title.to_string(),
            width: CHART_WIDTH,
            height: CHART_HEIGHT,
            series: series.clone(),
        }),
        other => Err(ExportError::UnsupportedShape {
            format: "chart image",
            shape: shape_name(other),
        }),
    }
}

/// PDF-ready document payload: a title plus one section per result shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfDocument {
    pub title: String,
    pub sections: Vec<PdfSection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PdfSection {
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<String>>,
    },
    Chart(ChartImageSpec),
    Metrics(Vec<Metric>),
}

/// Build a PDF document payload from any result shape.
pub fn to_pdf(result: &ReportResult, title: &str) -> Result<PdfDocument, ExportError> {
    let section = match result {
        ReportResult::Table { columns, rows } => PdfSection::Table {
            columns: columns.clone(),
            rows: rows
                .iter()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| row.get(c).map(ToString::to_string).unwrap_or_default())
                        .collect()
                })
                .collect(),
        },
        ReportResult::Chart { .. } => PdfSection::Chart(to_chart_image(result, title)?),
        ReportResult::Summary { metrics } => PdfSection::Metrics(metrics.clone()),
    };

    Ok(PdfDocument {
        title: title.to_string(),
        sections: vec![section],
    })
}

fn shape_name(result: &ReportResult) -> &'static str {
    match result {
        ReportResult::Table { .. } => "table",
        ReportResult::Chart { .. } => "chart",
        ReportResult::Summary { .. } => "summary",
    }
}
