//! Report configuration: the wire/persisted description of a report.
//!
//! `ReportConfig` is a plain serializable structure (no closures, no
//! registry references) so it can be stored and replayed by callers that
//! persist or schedule reports. Field names follow the persisted camelCase
//! form; operators and kinds use their snake_case wire spellings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FieldType, Value};

/// Output shape selected by a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Table,
    Chart,
    Summary,
}

/// Chart rendering family for `ReportKind::Chart`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Area,
}

/// Filter comparison operator.
///
/// A closed set: the validator checks legality against the field type once,
/// and the evaluator pattern-matches exhaustively so no operator can go
/// silently unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Between,
    In,
    NotIn,
}

impl Operator {
    /// Operator legality per field type.
    ///
    /// Substring operators apply to text-like fields only; range operators
    /// require an orderable type. Equality and membership work everywhere.
    pub fn supports(self, field_type: FieldType) -> bool {
        match self {
            Operator::Equals | Operator::NotEquals | Operator::In | Operator::NotIn => true,
            Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
                matches!(field_type, FieldType::Text | FieldType::Enum)
            }
            Operator::GreaterThan | Operator::LessThan | Operator::Between => {
                field_type.is_orderable()
            }
        }
    }

    /// Whether this operator takes a value list rather than a single scalar.
    pub fn wants_list(self) -> bool {
        matches!(self, Operator::Between | Operator::In | Operator::NotIn)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Equals => "equals",
            Operator::NotEquals => "not_equals",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::Between => "between",
            Operator::In => "in",
            Operator::NotIn => "not_in",
        };
        f.write_str(name)
    }
}

/// Comparator payload of a filter: one scalar, or a list for
/// `between`/`in`/`not_in`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    One(Value),
    Many(Vec<Value>),
}

impl FilterValue {
    pub fn one(value: impl Into<Value>) -> Self {
        FilterValue::One(value.into())
    }

    pub fn many(values: impl IntoIterator<Item = Value>) -> Self {
        FilterValue::Many(values.into_iter().collect())
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            FilterValue::One(v) => Some(v),
            FilterValue::Many(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            FilterValue::Many(vs) => Some(vs),
            FilterValue::One(_) => None,
        }
    }

    /// All scalar values carried by this comparator.
    pub fn values(&self) -> &[Value] {
        match self {
            FilterValue::One(v) => std::slice::from_ref(v),
            FilterValue::Many(vs) => vs,
        }
    }
}

/// A single predicate applied to candidate rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFilter {
    pub field: String,
    pub operator: Operator,
    pub value: FilterValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl ReportFilter {
    pub fn new(field: impl Into<String>, operator: Operator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Sort direction for `orderBy` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// A single multi-key sort entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Inclusive date window applied as an implicit filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    pub field: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The full declarative description of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartKind>,
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<ReportFilter>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
}

impl ReportConfig {
    /// Start a config with the given name and output kind; everything else
    /// is filled in builder-style.
    pub fn new(name: impl Into<String>, kind: ReportKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            chart_type: None,
            fields: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
            order_by: Vec::new(),
            date_range: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_chart_type(mut self, chart_type: ChartKind) -> Self {
        self.chart_type = Some(chart_type);
        self
    }

    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, filter: ReportFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_group_by<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn with_date_range(mut self, date_range: DateRange) -> Self {
        self.date_range = Some(date_range);
        self
    }
}
