//! Pure predicate evaluation for report filters.
//!
//! `matches` assumes the filter was validated against the field's declared
//! type; it never coerces between types. An operator/type combination that
//! slipped past validation fails with a type mismatch instead of producing
//! a silent false match.

use std::cmp::Ordering;

use crate::execute::ExecutionError;
use crate::model::{FieldType, Operator, ReportFilter, Row, Value};

/// Tunable evaluator behavior.
///
/// Case sensitivity of text `equals`/`in` was not pinned down by the
/// original reporting surface, so it is an option here rather than a
/// hardcoded rule. The default is case-insensitive.
#[derive(Debug, Clone)]
pub struct EvaluatorOptions {
    /// Fold case when comparing text values with `equals`/`not_equals`/
    /// `in`/`not_in`. Substring operators are always case-insensitive.
    pub case_insensitive_text: bool,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        Self {
            case_insensitive_text: true,
        }
    }
}

/// Evaluate one filter against one row.
///
/// Null or missing row values never satisfy an inclusion filter; only
/// `not_equals` (against a non-null comparator) and `not_in` keep such
/// rows, so missing data is excluded rather than silently matched.
pub fn matches(
    filter: &ReportFilter,
    field_type: FieldType,
    row: &Row,
    options: &EvaluatorOptions,
) -> Result<bool, ExecutionError> {
    let value = row.get(&filter.field).unwrap_or(&Value::Null);

    if value.is_null() {
        return Ok(match filter.operator {
            Operator::NotEquals => filter.value.as_scalar().is_some_and(|c| !c.is_null()),
            Operator::NotIn => true,
            _ => false,
        });
    }

    match filter.operator {
        Operator::Equals => {
            let comparator = scalar_comparator(filter, field_type, value)?;
            values_equal(filter, field_type, value, comparator, options)
        }
        Operator::NotEquals => {
            let comparator = scalar_comparator(filter, field_type, value)?;
            Ok(!values_equal(filter, field_type, value, comparator, options)?)
        }
        Operator::Contains | Operator::StartsWith | Operator::EndsWith => {
            let comparator = scalar_comparator(filter, field_type, value)?;
            substring_test(filter, field_type, value, comparator)
        }
        Operator::GreaterThan => {
            let comparator = scalar_comparator(filter, field_type, value)?;
            Ok(ordered_compare(filter, field_type, value, comparator)? == Ordering::Greater)
        }
        Operator::LessThan => {
            let comparator = scalar_comparator(filter, field_type, value)?;
            Ok(ordered_compare(filter, field_type, value, comparator)? == Ordering::Less)
        }
        Operator::Between => {
            let bounds = filter
                .value
                .as_list()
                .ok_or_else(|| mismatch(filter, field_type, &filter.value.values()[0]))?;
            let [lo, hi] = bounds else {
                return Err(ExecutionError::TypeMismatch {
                    field: filter.field.clone(),
                    expected: field_type,
                    found: "malformed between bounds",
                });
            };
            // Inclusive at both bounds.
            Ok(ordered_compare(filter, field_type, value, lo)? != Ordering::Less
                && ordered_compare(filter, field_type, value, hi)? != Ordering::Greater)
        }
        Operator::In => in_list(filter, field_type, value, options),
        Operator::NotIn => Ok(!in_list(filter, field_type, value, options)?),
    }
}

fn in_list(
    filter: &ReportFilter,
    field_type: FieldType,
    value: &Value,
    options: &EvaluatorOptions,
) -> Result<bool, ExecutionError> {
    let list = filter
        .value
        .as_list()
        .ok_or_else(|| mismatch(filter, field_type, value))?;
    for candidate in list {
        if values_equal(filter, field_type, value, candidate, options)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Structural equality on the field's native type.
fn values_equal(
    filter: &ReportFilter,
    field_type: FieldType,
    value: &Value,
    comparator: &Value,
    options: &EvaluatorOptions,
) -> Result<bool, ExecutionError> {
    match field_type {
        FieldType::Text | FieldType::Enum => {
            let a = text_of(filter, field_type, value)?;
            let b = text_of(filter, field_type, comparator)?;
            if options.case_insensitive_text {
                Ok(a.to_lowercase() == b.to_lowercase())
            } else {
                Ok(a == b)
            }
        }
        FieldType::Number => {
            let a = number_of(filter, value)?;
            let b = number_of(filter, comparator)?;
            Ok(a == b)
        }
        FieldType::Date => {
            let a = date_of(filter, value)?;
            let b = date_of(filter, comparator)?;
            Ok(a == b)
        }
        FieldType::Boolean => {
            let a = bool_of(filter, value)?;
            let b = bool_of(filter, comparator)?;
            Ok(a == b)
        }
    }
}

/// Substring tests are text-only and always case-insensitive.
fn substring_test(
    filter: &ReportFilter,
    field_type: FieldType,
    value: &Value,
    comparator: &Value,
) -> Result<bool, ExecutionError> {
    let hay = text_of(filter, field_type, value)?.to_lowercase();
    let needle = text_of(filter, field_type, comparator)?.to_lowercase();
    Ok(match filter.operator {
        Operator::Contains => hay.contains(&needle),
        Operator::StartsWith => hay.starts_with(&needle),
        Operator::EndsWith => hay.ends_with(&needle),
        _ => unreachable!("substring_test called for a non-substring operator"),
    })
}

/// Strict ordering on number or date fields.
fn ordered_compare(
    filter: &ReportFilter,
    field_type: FieldType,
    value: &Value,
    comparator: &Value,
) -> Result<Ordering, ExecutionError> {
    match field_type {
        FieldType::Number => {
            let a = number_of(filter, value)?;
            let b = number_of(filter, comparator)?;
            Ok(a.total_cmp(&b))
        }
        FieldType::Date => {
            let a = date_of(filter, value)?;
            let b = date_of(filter, comparator)?;
            Ok(a.cmp(&b))
        }
        // Ordering on other types never passes validation.
        _ => Err(mismatch(filter, field_type, value)),
    }
}

fn scalar_comparator<'a>(
    filter: &'a ReportFilter,
    field_type: FieldType,
    row_value: &Value,
) -> Result<&'a Value, ExecutionError> {
    filter
        .value
        .as_scalar()
        .ok_or_else(|| mismatch(filter, field_type, row_value))
}

fn text_of<'a>(
    filter: &ReportFilter,
    field_type: FieldType,
    value: &'a Value,
) -> Result<&'a str, ExecutionError> {
    value
        .as_text()
        .ok_or_else(|| mismatch(filter, field_type, value))
}

fn number_of(filter: &ReportFilter, value: &Value) -> Result<f64, ExecutionError> {
    value
        .as_number()
        .ok_or_else(|| mismatch(filter, FieldType::Number, value))
}

fn date_of(filter: &ReportFilter, value: &Value) -> Result<chrono::NaiveDate, ExecutionError> {
    value
        .as_date()
        .ok_or_else(|| mismatch(filter, FieldType::Date, value))
}

fn bool_of(filter: &ReportFilter, value: &Value) -> Result<bool, ExecutionError> {
    value
        .as_bool()
        .ok_or_else(|| mismatch(filter, FieldType::Boolean, value))
}

fn mismatch(filter: &ReportFilter, expected: FieldType, found: &Value) -> ExecutionError {
    ExecutionError::TypeMismatch {
        field: filter.field.clone(),
        expected,
        found: found.type_name(),
    }
}
