//! # Tabula
//!
//! An ad-hoc report definition and execution engine.
//!
//! A caller assembles a declarative [`model::ReportConfig`] (selected
//! fields, filters, grouping, ordering, output shape) against a
//! [`registry::FieldRegistry`] of typed reportable fields, validates it,
//! and executes it over an abstract row source.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          ReportConfig (wire/persisted definition)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate, against FieldRegistry]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ValidatedConfig (invariants discharged)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [execute, over a RowSource]
//! ┌─────────────────────────────────────────────────────────┐
//! │   filter → date range → group → sort → shape             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │    ReportResult (table / chart series / summary)         │
//! │    → CSV / chart-image / PDF export payloads             │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Validation collects every violation in one pass so the caller can show
//! complete field-level feedback; execution is all-or-nothing and fails on
//! the first unrecoverable condition.

pub mod config;
pub mod execute;
pub mod export;
pub mod filter;
pub mod model;
pub mod registry;
pub mod shape;
pub mod validate;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::Settings;
    pub use crate::execute::{
        Aggregator, CancellationToken, CountAggregator, ExecutionError, MemoryRowSource,
        ReportExecutor, RowSource, RowSourceError,
    };
    pub use crate::export::{to_chart_image, to_csv, to_pdf, ChartImageSpec, PdfDocument};
    pub use crate::filter::EvaluatorOptions;
    pub use crate::model::{
        ChartKind, DateRange, FieldType, FilterValue, Operator, OrderBy, ReportConfig,
        ReportField, ReportFilter, ReportKind, Row, SortDirection, Value,
    };
    pub use crate::registry::FieldRegistry;
    pub use crate::shape::{Metric, ReportResult, SeriesPoint};
    pub use crate::validate::{validate, OutputShape, ValidatedConfig, ValidationError};
}

pub use execute::ReportExecutor;
pub use registry::FieldRegistry;
pub use shape::ReportResult;
pub use validate::{validate, ValidatedConfig, ValidationError};
