//! Open-ended attribute bag attached to a user activity.
//!
//! # Responsibility
//! - Model supplementary fields as a string-keyed map of scalar values.
//! - Encode the bag to a JSON document and decode it back.
//!
//! # Invariants
//! - The encoded form is always a JSON object; the empty bag is `{}`.
//! - `decode(encode(bag)) == bag` for every encodable bag.
//! - A document that is not an object of scalars never decodes to a default.

use serde::de::{self, Deserializer, Unexpected, Visitor};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{BTreeMap, Iter};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Subjective note on how the knee felt during the activity.
pub const KNEE_FEELING: &str = "knee_feeling";

/// One scalar attribute value.
///
/// Serialized without a tag, so the document reads as plain JSON
/// (`"sore"`, `3`, `2.5`, `true`). Unsigned integers above `i64::MAX` are
/// rejected on decode rather than widened to floats.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value),
            Self::Integer(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("a string, boolean, 64-bit signed integer or float")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(AttributeValue::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(AttributeValue::Integer(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        i64::try_from(value)
            .map(AttributeValue::Integer)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        Ok(AttributeValue::Float(value))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(AttributeValue::Text(value.to_string()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(AttributeValue::Text(value))
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Error produced by the attribute bag codec.
#[derive(Debug)]
pub enum AttributeError {
    /// A float attribute is NaN or infinite and has no JSON form.
    NonFiniteNumber { key: String },
    /// The serializer rejected the bag.
    Encode(serde_json::Error),
    /// The stored bytes are not a JSON object of scalar values.
    Malformed(serde_json::Error),
}

impl AttributeError {
    /// Failure happened while producing a document.
    pub fn is_encoding(&self) -> bool {
        matches!(self, Self::NonFiniteNumber { .. } | Self::Encode(_))
    }

    /// Failure happened while reading a stored document.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl Display for AttributeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteNumber { key } => {
                write!(f, "attribute `{key}` is not a finite number")
            }
            Self::Encode(err) => write!(f, "could not encode attributes: {err}"),
            Self::Malformed(err) => write!(f, "malformed attributes document: {err}"),
        }
    }
}

impl Error for AttributeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NonFiniteNumber { .. } => None,
            Self::Encode(err) => Some(err),
            Self::Malformed(err) => Some(err),
        }
    }
}

/// Extensible set of supplementary fields on a user activity.
///
/// Compared by value; key order never affects equality or the encoded form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeBag(BTreeMap<String, AttributeValue>);

impl AttributeBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces one attribute, returning the previous value.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    /// Returns the attribute as text, if present and textual.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::as_text)
    }

    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.0.remove(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, AttributeValue> {
        self.0.iter()
    }

    /// Encodes the bag as a JSON object document.
    ///
    /// # Errors
    /// - `NonFiniteNumber` when a float attribute is NaN or infinite; the
    ///   serializer would otherwise silently write `null`.
    pub fn encode(&self) -> Result<String, AttributeError> {
        if let Some((key, _)) = self
            .0
            .iter()
            .find(|(_, value)| matches!(value, AttributeValue::Float(number) if !number.is_finite()))
        {
            return Err(AttributeError::NonFiniteNumber { key: key.clone() });
        }

        serde_json::to_string(&self.0).map_err(AttributeError::Encode)
    }

    /// Decodes a stored JSON document into a bag.
    ///
    /// # Errors
    /// - `Malformed` when the bytes are not UTF-8 JSON, the top level is not
    ///   an object, or any value is null, an array or an object.
    pub fn decode(bytes: &[u8]) -> Result<Self, AttributeError> {
        serde_json::from_slice::<BTreeMap<String, AttributeValue>>(bytes)
            .map(Self)
            .map_err(AttributeError::Malformed)
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeBag
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

impl<'a> IntoIterator for &'a AttributeBag {
    type Item = (&'a String, &'a AttributeValue);
    type IntoIter = Iter<'a, String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
