//! Validation of report configurations.
//!
//! `validate` runs every structural check in one pass and collects all
//! violations, so a caller can surface the complete error list as
//! field-level feedback instead of fixing one problem per round trip. On
//! success it produces a [`ValidatedConfig`], the only input the executor
//! accepts; the pipeline never re-checks these invariants.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    ChartKind, FieldType, Operator, ReportConfig, ReportFilter, ReportKind, Value,
};
use crate::registry::FieldRegistry;

/// Validation error.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// No fields selected.
    EmptyFields,
    /// The same field is selected more than once.
    DuplicateField { field: String },
    /// Reference to a field id the registry does not know.
    UnknownField { context: String, field: String },
    /// Operator not legal for the field's declared type.
    InvalidOperatorForType {
        field: String,
        operator: Operator,
        field_type: FieldType,
    },
    /// Filter value shape does not match the operator.
    ArityMismatch {
        field: String,
        operator: Operator,
        expected: String,
    },
    /// Filter comparator value is of the wrong type for the field.
    ValueTypeMismatch {
        field: String,
        field_type: FieldType,
        found: String,
    },
    /// Chart report without a chart type.
    MissingChartType,
    /// Pie charts are single-series; more than one numeric field selected.
    PieChartMultipleValueAxes { fields: Vec<String> },
    /// Date range references a non-date field or has inverted bounds.
    InvalidDateRange { field: String, issue: String },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyFields => {
                write!(f, "report must select at least one field")
            }
            ValidationError::DuplicateField { field } => {
                write!(f, "field '{}' is selected more than once", field)
            }
            ValidationError::UnknownField { context, field } => {
                write!(f, "{} references unknown field '{}'", context, field)
            }
            ValidationError::InvalidOperatorForType {
                field,
                operator,
                field_type,
            } => {
                write!(
                    f,
                    "operator '{}' is not valid for {} field '{}'",
                    operator, field_type, field
                )
            }
            ValidationError::ArityMismatch {
                field,
                operator,
                expected,
            } => {
                write!(
                    f,
                    "operator '{}' on field '{}' requires {}",
                    operator, field, expected
                )
            }
            ValidationError::ValueTypeMismatch {
                field,
                field_type,
                found,
            } => {
                write!(
                    f,
                    "filter value for {} field '{}' has type {}",
                    field_type, field, found
                )
            }
            ValidationError::MissingChartType => {
                write!(f, "chart reports require a chart type")
            }
            ValidationError::PieChartMultipleValueAxes { fields } => {
                write!(
                    f,
                    "pie charts are single-series but multiple numeric fields are selected: {}",
                    fields.join(", ")
                )
            }
            ValidationError::InvalidDateRange { field, issue } => {
                write!(f, "invalid date range on field '{}': {}", field, issue)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Output shape of a validated report, with the required-if `chartType`
/// invariant already discharged: only the chart variant carries a chart
/// kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    Table,
    Chart(ChartKind),
    Summary,
}

/// A configuration known to satisfy every structural invariant.
///
/// Produced only by [`validate`]; carries the original wire config plus the
/// resolved type of every referenced field, so downstream stages never
/// consult the registry again.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedConfig {
    config: ReportConfig,
    types: BTreeMap<String, FieldType>,
    shape: OutputShape,
    tables: Vec<String>,
}

impl ValidatedConfig {
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn fields(&self) -> &[String] {
        &self.config.fields
    }

    pub fn filters(&self) -> &[ReportFilter] {
        &self.config.filters
    }

    pub fn group_by(&self) -> &[String] {
        &self.config.group_by
    }

    pub fn order_by(&self) -> &[crate::model::OrderBy] {
        &self.config.order_by
    }

    pub fn date_range(&self) -> Option<&crate::model::DateRange> {
        self.config.date_range.as_ref()
    }

    pub fn shape(&self) -> OutputShape {
        self.shape
    }

    /// Declared type of a referenced field. Every field named anywhere in
    /// the config is present.
    pub fn field_type(&self, id: &str) -> Option<FieldType> {
        self.types.get(id).copied()
    }

    /// Source tables referenced by the report, deduplicated in first-use
    /// order; handed to the row source fetch.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Borrow the underlying wire config.
    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Recover the persisted representation.
    pub fn into_config(self) -> ReportConfig {
        self.config
    }
}

/// Validate a report configuration against the field registry.
///
/// All checks run; none short-circuits the others.
pub fn validate(
    config: &ReportConfig,
    registry: &FieldRegistry,
) -> Result<ValidatedConfig, Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_fields(config, registry, &mut errors);
    validate_filters(config, registry, &mut errors);
    validate_grouping_and_order(config, registry, &mut errors);
    validate_chart(config, registry, &mut errors);
    validate_date_range(config, registry, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    let mut types = BTreeMap::new();
    let mut tables = Vec::new();
    let mut seen_tables = BTreeSet::new();
    let referenced = config
        .fields
        .iter()
        .chain(config.filters.iter().map(|f| &f.field))
        .chain(config.group_by.iter())
        .chain(config.order_by.iter().map(|o| &o.field))
        .chain(config.date_range.iter().map(|r| &r.field));
    for id in referenced {
        // All references resolved above, otherwise we returned errors.
        if let Some(field) = registry.resolve(id) {
            types.insert(id.clone(), field.field_type);
            if seen_tables.insert(field.table.clone()) {
                tables.push(field.table.clone());
            }
        }
    }

    let shape = match config.kind {
        ReportKind::Table => OutputShape::Table,
        // chart_type presence was checked in validate_chart
        ReportKind::Chart => match config.chart_type {
            Some(kind) => OutputShape::Chart(kind),
            None => unreachable!("missing chart type is a validation error"),
        },
        ReportKind::Summary => OutputShape::Summary,
    };

    Ok(ValidatedConfig {
        config: config.clone(),
        types,
        shape,
        tables,
    })
}

fn validate_fields(
    config: &ReportConfig,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) {
    if config.fields.is_empty() {
        errors.push(ValidationError::EmptyFields);
    }

    let mut seen = BTreeSet::new();
    for id in &config.fields {
        if !seen.insert(id) {
            errors.push(ValidationError::DuplicateField { field: id.clone() });
        }
        if registry.resolve(id).is_none() {
            errors.push(ValidationError::UnknownField {
                context: "fields".to_string(),
                field: id.clone(),
            });
        }
    }
}

fn validate_filters(
    config: &ReportConfig,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for filter in &config.filters {
        let field_type = match registry.field_type(&filter.field) {
            Some(ty) => ty,
            None => {
                errors.push(ValidationError::UnknownField {
                    context: "filters".to_string(),
                    field: filter.field.clone(),
                });
                continue;
            }
        };

        let legal = filter.operator.supports(field_type);
        if !legal {
            errors.push(ValidationError::InvalidOperatorForType {
                field: filter.field.clone(),
                operator: filter.operator,
                field_type,
            });
        }

        validate_filter_arity(filter, errors);

        if legal {
            for value in filter.value.values() {
                if !value.matches_type(field_type) {
                    errors.push(ValidationError::ValueTypeMismatch {
                        field: filter.field.clone(),
                        field_type,
                        found: value.type_name().to_string(),
                    });
                }
            }
        }
    }
}

fn validate_filter_arity(filter: &ReportFilter, errors: &mut Vec<ValidationError>) {
    let push = |errors: &mut Vec<ValidationError>, expected: &str| {
        errors.push(ValidationError::ArityMismatch {
            field: filter.field.clone(),
            operator: filter.operator,
            expected: expected.to_string(),
        });
    };

    match filter.operator {
        Operator::Between => {
            if filter.value.as_list().map(<[Value]>::len) != Some(2) {
                push(errors, "exactly 2 values");
            }
        }
        Operator::In | Operator::NotIn => {
            if filter.value.as_list().map_or(true, <[Value]>::is_empty) {
                push(errors, "a non-empty value list");
            }
        }
        _ => {
            if filter.value.as_scalar().is_none() {
                push(errors, "a single value");
            }
        }
    }
}

fn validate_grouping_and_order(
    config: &ReportConfig,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) {
    for id in &config.group_by {
        if registry.resolve(id).is_none() {
            errors.push(ValidationError::UnknownField {
                context: "groupBy".to_string(),
                field: id.clone(),
            });
        }
    }
    for order in &config.order_by {
        if registry.resolve(&order.field).is_none() {
            errors.push(ValidationError::UnknownField {
                context: "orderBy".to_string(),
                field: order.field.clone(),
            });
        }
    }
}

fn validate_chart(
    config: &ReportConfig,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) {
    if config.kind != ReportKind::Chart {
        return;
    }

    match config.chart_type {
        None => errors.push(ValidationError::MissingChartType),
        Some(ChartKind::Pie) => {
            let numeric: Vec<String> = config
                .fields
                .iter()
                .filter(|id| {
                    registry
                        .field_type(id.as_str())
                        .is_some_and(FieldType::is_numeric)
                })
                .cloned()
                .collect();
            if numeric.len() > 1 {
                errors.push(ValidationError::PieChartMultipleValueAxes { fields: numeric });
            }
        }
        Some(_) => {}
    }
}

fn validate_date_range(
    config: &ReportConfig,
    registry: &FieldRegistry,
    errors: &mut Vec<ValidationError>,
) {
    let range = match &config.date_range {
        Some(range) => range,
        None => return,
    };

    match registry.field_type(&range.field) {
        None => {
            errors.push(ValidationError::UnknownField {
                context: "dateRange".to_string(),
                field: range.field.clone(),
            });
        }
        Some(FieldType::Date) => {}
        Some(other) => {
            errors.push(ValidationError::InvalidDateRange {
                field: range.field.clone(),
                issue: format!("field is of type {}, expected date", other),
            });
        }
    }

    if range.start > range.end {
        errors.push(ValidationError::InvalidDateRange {
            field: range.field.clone(),
            issue: format!("start {} is after end {}", range.start, range.end),
        });
    }
}
