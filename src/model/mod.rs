//! Core data model for report definitions.

pub mod field;
pub mod report;
pub mod row;
pub mod value;

pub use field::{FieldType, ReportField};
pub use report::{
    ChartKind, DateRange, FilterValue, Operator, OrderBy, ReportConfig, ReportFilter, ReportKind,
    SortDirection,
};
pub use row::Row;
pub use value::Value;
