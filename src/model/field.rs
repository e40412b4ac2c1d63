//! Reportable field descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic type of a reportable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Date,
    Boolean,
    Enum,
}

impl FieldType {
    /// Whether values of this type carry a numeric magnitude.
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number)
    }

    /// Whether values of this type can serve as a categorical chart axis.
    pub fn is_categorical(self) -> bool {
        !self.is_numeric()
    }

    /// Whether values of this type have a total order usable by range
    /// operators (`greater_than`, `less_than`, `between`).
    pub fn is_orderable(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Date)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Number => "number",
            FieldType::Date => "date",
            FieldType::Boolean => "boolean",
            FieldType::Enum => "enum",
        };
        f.write_str(name)
    }
}

/// A typed, labeled column available for reporting.
///
/// Fields are defined once per deployment and addressed by `id`; the
/// `table` is a display grouping only, since execution runs over a single
/// denormalized row stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportField {
    pub id: String,
    pub table: String,
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl ReportField {
    pub fn new(
        id: impl Into<String>,
        table: impl Into<String>,
        label: impl Into<String>,
        field_type: FieldType,
    ) -> Self {
        Self {
            id: id.into(),
            table: table.into(),
            label: label.into(),
            field_type,
        }
    }
}
