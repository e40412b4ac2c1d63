//! TOML-based deployment settings.
//!
//! The settings file carries the per-deployment field catalogue and
//! evaluator options, with environment variable expansion. Example:
//!
//! ```toml
//! [evaluator]
//! case_insensitive_text = true
//!
//! [[fields]]
//! id = "product.category"
//! table = "products"
//! label = "Category"
//! type = "enum"
//!
//! [[fields]]
//! id = "order.total"
//! table = "orders"
//! label = "Order Total"
//! type = "number"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::filter::EvaluatorOptions;
use crate::model::ReportField;
use crate::registry::{FieldRegistry, RegistryError};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid field catalogue: {0}")]
    Registry(#[from] RegistryError),
}

/// Root settings structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Evaluator options.
    pub evaluator: EvaluatorSettings,

    /// The deployment's reportable field catalogue.
    pub fields: Vec<ReportField>,
}

/// Filter evaluator options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EvaluatorSettings {
    /// Case-insensitive text equality. The default follows the evaluator's
    /// documented default.
    pub case_insensitive_text: bool,
}

impl Default for EvaluatorSettings {
    fn default() -> Self {
        Self {
            case_insensitive_text: true,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, expanding `${VAR}`/`$VAR` references.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        Self::from_str(&raw)
    }

    /// Parse settings from TOML text.
    pub fn from_str(raw: &str) -> Result<Self, SettingsError> {
        let expanded = expand_env_vars(raw)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Build the field registry from the catalogue.
    pub fn registry(&self) -> Result<FieldRegistry, SettingsError> {
        Ok(FieldRegistry::new(self.fields.clone())?)
    }

    pub fn evaluator_options(&self) -> EvaluatorOptions {
        EvaluatorOptions {
            case_insensitive_text: self.evaluator.case_insensitive_text,
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut var_name = String::new();
                while let Some(ch) = chars.next_if(|&ch| ch != '}') {
                    var_name.push(ch);
                }
                chars.next(); // consume '}'
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                let mut var_name = String::new();
                while let Some(ch) = chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_') {
                    var_name.push(ch);
                }
                if var_name.is_empty() {
                    // A lone $, keep it.
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
