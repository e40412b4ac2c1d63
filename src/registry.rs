//! Static catalogue of reportable fields.

use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::model::{FieldType, ReportField};

/// Errors raised while building a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two descriptors share the same id.
    #[error("duplicate field id: '{0}'")]
    DuplicateId(String),
}

/// Read-only catalogue of [`ReportField`] descriptors, keyed by id.
///
/// Built once at startup (typically from the settings file) and never
/// mutated afterwards, so it can be shared freely between concurrent
/// report executions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRegistry {
    fields: Vec<ReportField>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// Build a registry, rejecting duplicate field ids.
    pub fn new(fields: Vec<ReportField>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (i, field) in fields.iter().enumerate() {
            if index.insert(field.id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateId(field.id.clone()));
            }
        }
        Ok(Self { fields, index })
    }

    /// Look up a field descriptor by id.
    pub fn resolve(&self, id: &str) -> Option<&ReportField> {
        self.index.get(id).map(|&i| &self.fields[i])
    }

    /// Shorthand for the declared type of a field.
    pub fn field_type(&self, id: &str) -> Option<FieldType> {
        self.resolve(id).map(|f| f.field_type)
    }

    /// Fields grouped by source table, in a stable display order: tables
    /// alphabetically, fields in registry definition order within a table.
    pub fn by_table(&self) -> BTreeMap<&str, Vec<&ReportField>> {
        let mut tables: BTreeMap<&str, Vec<&ReportField>> = BTreeMap::new();
        for field in &self.fields {
            tables.entry(field.table.as_str()).or_default().push(field);
        }
        tables
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReportField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
