//! String-valued attributes with soft typed accessors.
//!
//! Map files store every attribute as text. The accessors here interpret
//! that text on demand and return `None` when it does not parse, so a
//! malformed value never aborts a query.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::primitives::Id;

/// Speed with an optional unit: `50`, `50 km/h`, `30mph`, `13.9 m/s`.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static VELOCITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(\d+(?:\.\d+)?)\s*(km/h|kmh|kph|mph|m/s|mps)?\s*$").expect("valid regex")
});

const MPH_TO_KMH: f64 = 1.609_344;
const MPS_TO_KMH: f64 = 3.6;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeValue(String);

impl AttributeValue {
    /// Create a value from its textual form.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.0
    }

    /// Interpret as a boolean.
    ///
    /// Accepts `true`/`false`, `yes`/`no` and `1`/`0`, case-insensitive.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.0.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }

    /// Interpret as a signed integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        self.0.trim().parse().ok()
    }

    /// Interpret as a floating point number. NaN is rejected.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|f| !f.is_nan())
    }

    /// Interpret as a primitive id.
    #[must_use]
    pub fn as_id(&self) -> Option<Id> {
        self.as_int()
    }

    /// Interpret as a speed and convert it to km/h.
    ///
    /// A bare number is taken to be km/h already.
    ///
    /// # Examples
    /// ```
    /// use lanemap_core::AttributeValue;
    ///
    /// assert_eq!(AttributeValue::new("50 km/h").as_velocity(), Some(50.0));
    /// assert_eq!(AttributeValue::new("10 m/s").as_velocity(), Some(36.0));
    /// assert_eq!(AttributeValue::new("fast").as_velocity(), None);
    /// ```
    #[must_use]
    pub fn as_velocity(&self) -> Option<f64> {
        let caps = VELOCITY_PATTERN.captures(&self.0)?;
        let magnitude: f64 = caps.get(1)?.as_str().parse().ok()?;
        let factor = match caps.get(2).map(|m| m.as_str()) {
            None | Some("km/h" | "kmh" | "kph") => 1.0,
            Some("mph") => MPH_TO_KMH,
            Some(_) => MPS_TO_KMH,
        };
        Some(magnitude * factor)
    }

    /// Interpret through a `FromStr` implementation, typically an enum.
    #[must_use]
    pub fn parse<T: FromStr>(&self) -> Option<T> {
        self.0.trim().parse().ok()
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self(i.to_string())
    }
}

impl From<f64> for AttributeValue {
    fn from(f: f64) -> Self {
        Self(f.to_string())
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self(b.to_string())
    }
}

/// Attributes of a primitive or relation, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap(BTreeMap<String, AttributeValue>);

impl AttributeMap {
    /// Create an empty attribute map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Get the raw text of a value by key.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(AttributeValue::value)
    }

    /// Insert a value, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove a value, returning it.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
