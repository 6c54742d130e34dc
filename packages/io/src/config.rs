//! Configuration constants and the handler option bag.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{IoError, Result};

/// Name of the bundled OSM XML handler.
pub const OSM_FORMAT: &str = "osm";

/// Extension matched by the OSM handler (with the leading dot).
pub const OSM_EXTENSION: &str = ".osm";

/// Name of the bundled YAML handler.
pub const YAML_FORMAT: &str = "yaml";

/// Extension matched by the YAML handler (with the leading dot).
pub const YAML_EXTENSION: &str = ".yaml";

/// OSM option: value of the `upload` attribute on the root element.
pub const JOSM_UPLOAD: &str = "josm_upload";

/// OSM option: write elevation tags with two decimals.
pub const JOSM_FORMAT_ELEVATION: &str = "josm_format_elevation";

/// Values accepted for [`JOSM_UPLOAD`].
pub const JOSM_UPLOAD_VALUES: [&str; 3] = ["true", "false", "never"];

/// Relation type tag of lanelets in persisted data.
pub const LANELET_TYPE: &str = "lanelet";

/// Tag marking a closed way as an area (polygon).
pub const AREA_TAG: &str = "area";

/// Tag holding the elevation of a node.
pub const ELEVATION_TAG: &str = "ele";

/// Lanelet roles.
pub const ROLE_LEFT: &str = "left";
pub const ROLE_RIGHT: &str = "right";
pub const ROLE_REGULATORY_ELEMENT: &str = "regulatory_element";

/// A single option value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Options passed to handler construction.
///
/// Keys are handler-specific; each handler validates the ones it knows and
/// ignores the rest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Configuration {
    values: BTreeMap<String, ConfigValue>,
}

impl Configuration {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.values.get(key)? {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.values.get(key)? {
            ConfigValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    #[must_use]
    pub fn get_float(&self, key: &str) -> Option<f64> {
        match self.values.get(key)? {
            ConfigValue::Float(x) => Some(*x),
            #[allow(clippy::cast_precision_loss)]
            ConfigValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.values.get(key)? {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Read an optional string option restricted to `allowed`.
///
/// # Errors
/// `InvalidConfig` if the option is present but not a string or not allowed.
pub fn choice_option<'c>(
    config: &'c Configuration,
    key: &str,
    allowed: &[&str],
) -> Result<Option<&'c str>> {
    let Some(value) = config.get(key) else {
        return Ok(None);
    };
    match value {
        ConfigValue::String(s) if allowed.contains(&s.as_str()) => Ok(Some(s)),
        other => Err(IoError::InvalidConfig {
            key: key.to_string(),
            reason: format!("expected one of {}, got '{other}'", allowed.join(", ")),
        }),
    }
}

/// Read an optional boolean option.
///
/// # Errors
/// `InvalidConfig` if the option is present but not a bool.
pub fn bool_option(config: &Configuration, key: &str) -> Result<Option<bool>> {
    match config.get(key) {
        None => Ok(None),
        Some(ConfigValue::Bool(b)) => Ok(Some(*b)),
        Some(other) => Err(IoError::InvalidConfig {
            key: key.to_string(),
            reason: format!("expected a bool, got '{other}'"),
        }),
    }
}
