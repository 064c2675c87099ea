//! Mapper configuration.

use serde::{Deserialize, Serialize};

use automap_model::Value;

/// Ancestor names whose builders use `set`-prefixed setters by default.
pub const DEFAULT_SETTER_BUILDER_BASES: &[&str] = &["SpecificRecordBase"];

/// Placeholder logged instead of property values unless `log_values` is set.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Options controlling a [`Mapper`](crate::Mapper).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Register unknown types on first use instead of failing.
    pub auto_register: bool,
    /// Destination types with one of these names in their ancestry get
    /// builders described with the naming setter convention.
    pub setter_builder_bases: Vec<String>,
    /// Log mapped values verbatim. Off by default since mapped objects may
    /// carry sensitive data.
    pub log_values: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            auto_register: true,
            setter_builder_bases: DEFAULT_SETTER_BUILDER_BASES
                .iter()
                .map(ToString::to_string)
                .collect(),
            log_values: false,
        }
    }
}

impl MapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auto_register(mut self, enabled: bool) -> Self {
        self.auto_register = enabled;
        self
    }

    pub fn with_setter_builder_base(mut self, name: impl Into<String>) -> Self {
        self.setter_builder_bases.push(name.into());
        self
    }

    pub fn with_log_values(mut self, enabled: bool) -> Self {
        self.log_values = enabled;
        self
    }

    /// Value as it may appear in log output.
    pub(crate) fn loggable(&self, value: &Value) -> String {
        if self.log_values {
            value.to_string()
        } else {
            REDACTED_VALUE.to_string()
        }
    }
}
