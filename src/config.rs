//! Table configuration
//!
//! A [`TableConfig`] is attached to every table. It can be built in code or
//! loaded from TOML, YAML or JSON documents.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Timestamp formats accepted by `time` columns when no explicit list is given
pub const DEFAULT_TIME_FORMATS: &[&str] = &[
    "%+",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d",
];

/// Configuration shared by a table and the tables derived from it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Ordered timestamp formats (chrono syntax). The first matching format wins.
    pub time_formats: Vec<String>,
    /// Maximum number of rows written by `Table::print` and `Display`
    pub max_print_rows: usize,
    /// Suffix appended to a right-side join column whose name is already taken
    pub join_suffix: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            time_formats: DEFAULT_TIME_FORMATS.iter().map(|s| s.to_string()).collect(),
            max_print_rows: 100,
            join_suffix: "_right".to_string(),
        }
    }
}

impl TableConfig {
    /// Creates a builder
    pub fn builder() -> TableConfigBuilder {
        TableConfigBuilder::new()
    }

    /// Parses a TOML document
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: TableConfig = toml::from_str(src)?;
        config.validate()
    }

    /// Parses a YAML document
    pub fn from_yaml_str(src: &str) -> Result<Self> {
        let config: TableConfig = serde_yaml::from_str(src)?;
        config.validate()
    }

    /// Parses a JSON document
    pub fn from_json_str(src: &str) -> Result<Self> {
        let config: TableConfig =
            serde_json::from_str(src).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()
    }

    fn validate(self) -> Result<Self> {
        if self.join_suffix.is_empty() {
            return Err(Error::Config("join_suffix must not be empty".to_string()));
        }
        if self.time_formats.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::Config("time_formats contains an empty format".to_string()));
        }
        Ok(self)
    }
}

/// Builder for TableConfig
pub struct TableConfigBuilder {
    config: TableConfig,
}

impl TableConfigBuilder {
    /// Creates a new builder
    pub fn new() -> Self {
        TableConfigBuilder {
            config: TableConfig::default(),
        }
    }

    /// Replaces the accepted timestamp formats
    pub fn time_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.time_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the maximum printed rows
    pub fn max_print_rows(mut self, rows: usize) -> Self {
        self.config.max_print_rows = rows;
        self
    }

    /// Sets the join suffix
    pub fn join_suffix(mut self, suffix: &str) -> Self {
        self.config.join_suffix = suffix.to_string();
        self
    }

    /// Builds the config
    pub fn build(self) -> Result<TableConfig> {
        self.config.validate()
    }
}

impl Default for TableConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
