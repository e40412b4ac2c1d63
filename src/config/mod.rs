//! Deployment configuration.

pub mod settings;

pub use settings::{expand_env_vars, EvaluatorSettings, Settings, SettingsError};
