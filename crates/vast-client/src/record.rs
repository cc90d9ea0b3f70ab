//! Request parameters and response shapes
//!
//! Every call produces exactly one of three shapes, chosen statically by the
//! call site through the [`ResponseShape`] trait:
//!
//! - [`Record`]: one resource instance
//! - [`RecordSet`]: an ordered list of records
//! - [`EmptyRecord`]: the "no content" token (deletes)
//!
//! Hooks see the dynamic form of the same value, [`ResponseValue`].

use crate::error::{Error, Result};
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::ops::{Deref, DerefMut};

//  ######################################################
//              PARAMS
//  ######################################################

/// Generic key-value parameters used for query strings and request bodies.
///
/// # Example
///
/// ```rust
/// use vast_client::Params;
///
/// let params = Params::new()
///     .with("name", "myview")
///     .with("tenant_id", 1);
/// assert_eq!(params.to_query(), "name=myview&tenant_id=1");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    /// Create empty params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key-value pair, consuming and returning `self`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Insert a key-value pair, returning the previous value if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Get a value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Remove a value by key.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over key-value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Serialize into a URL-encoded query string.
    ///
    /// String values are used as-is; every other value is stringified as its
    /// JSON text (`1`, `true`, `["NFS"]`).
    pub fn to_query(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.0 {
            serializer.append_pair(key, &stringify(value));
        }
        serializer.finish()
    }

    /// Serialize into a JSON request body.
    pub fn to_body(&self) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(&self.0)?))
    }

    /// Merge another set of params into this one.
    ///
    /// When `keep_existing` is true, keys already present are left untouched
    /// and the incoming value is skipped. Otherwise incoming values overwrite.
    pub fn update(&mut self, other: Params, keep_existing: bool) {
        for (key, value) in other.0 {
            if keep_existing && self.0.contains_key(&key) {
                continue;
            }
            self.0.insert(key, value);
        }
    }

    /// Borrow the underlying JSON map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//  ######################################################
//              RESPONSE SHAPES
//  ######################################################

/// A single resource instance as an open key-value structure.
///
/// Carries a hidden resource-type tag stamped by the dispatcher. The tag is
/// not part of the serialized fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
    resource_type: Option<String>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resource kind this record was returned for, if stamped.
    pub fn resource_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }

    /// Stamp the resource kind unless one is already set.
    pub fn stamp_resource_type(&mut self, resource_type: &str) {
        if self.resource_type.is_none() {
            self.resource_type = Some(resource_type.to_string());
        }
    }

    /// Extract the `id` field.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecord`] if the field is missing or is not a number.
    pub fn id(&self) -> Result<i64> {
        let value = self
            .fields
            .get("id")
            .ok_or_else(|| Error::InvalidRecord("record does not have an id field".to_string()))?;
        to_int(value)
    }

    /// Get a field as a string slice, if it is a JSON string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Decode this record into a typed container.
    ///
    /// Field mapping follows the container's serde attributes. Lenient scalar
    /// conversions are available through the [`coerce`] helpers.
    ///
    /// # Example
    ///
    /// ```rust
    /// use serde::Deserialize;
    /// use vast_client::{Record, record::coerce};
    ///
    /// #[derive(Deserialize)]
    /// struct View {
    ///     #[serde(deserialize_with = "coerce::i64")]
    ///     id: i64,
    ///     name: String,
    /// }
    ///
    /// let record: Record = serde_json::from_str(r#"{"id": "5", "name": "myview"}"#).unwrap();
    /// let view: View = record.fill().unwrap();
    /// assert_eq!(view.id, 5);
    /// ```
    pub fn fill<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(Error::from)
    }

    /// Consume the record and return its fields.
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl Deref for Record {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.fields
    }
}

impl DerefMut for Record {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.fields
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            resource_type: None,
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Record::from)
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.resource_type.as_deref().unwrap_or("<Unknown>");
        write!(f, "{}: {}", name, Value::Object(self.fields.clone()))
    }
}

/// An ordered list of records, in API response order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet(Vec<Record>);

impl RecordSet {
    /// Create an empty record set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume the set and return the records.
    pub fn into_vec(self) -> Vec<Record> {
        self.0
    }
}

impl Deref for RecordSet {
    type Target = Vec<Record>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RecordSet {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl FromIterator<Record> for RecordSet {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RecordSet {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "[]");
        }
        writeln!(f, "[")?;
        for record in &self.0 {
            writeln!(f, "  {}", record)?;
        }
        write!(f, "]")
    }
}

/// The typed "no content" response token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyRecord;

impl fmt::Display for EmptyRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<>")
    }
}

/// Dynamic form of a response, handed to interceptors.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    /// A single record
    Record(Record),
    /// A list of records
    RecordSet(RecordSet),
    /// No content
    Empty(EmptyRecord),
}

impl ResponseValue {
    /// Name of the contained shape.
    pub fn shape_name(&self) -> &'static str {
        match self {
            ResponseValue::Record(_) => Record::NAME,
            ResponseValue::RecordSet(_) => RecordSet::NAME,
            ResponseValue::Empty(_) => EmptyRecord::NAME,
        }
    }
}

impl fmt::Display for ResponseValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseValue::Record(r) => r.fmt(f),
            ResponseValue::RecordSet(rs) => rs.fmt(f),
            ResponseValue::Empty(e) => e.fmt(f),
        }
    }
}

/// A response shape the dispatcher can produce.
///
/// Implemented for [`Record`], [`RecordSet`] and [`EmptyRecord`] only.
pub trait ResponseShape: Sized + Send + 'static + private::Sealed {
    /// Human-readable shape name used in errors.
    const NAME: &'static str;

    /// Whether the response body must be read at all.
    const READS_BODY: bool = true;

    /// Decode a response body. `envelope` names a wrapper key around lists.
    fn decode(body: &[u8], envelope: Option<&str>) -> Result<Self>;

    /// Stamp the resource kind onto every contained record lacking one.
    fn stamp(&mut self, resource_type: &str);

    /// Convert into the dynamic form.
    fn into_value(self) -> ResponseValue;

    /// Convert back from the dynamic form; a different shape is an error.
    fn from_value(value: ResponseValue) -> Result<Self>;
}

mod private {
    pub trait Sealed {}
    impl Sealed for super::Record {}
    impl Sealed for super::RecordSet {}
    impl Sealed for super::EmptyRecord {}
}

fn shape_mismatch(expected: &'static str, found: &ResponseValue) -> Error {
    Error::Interceptor(format!(
        "interceptor returned {} where {} was expected",
        found.shape_name(),
        expected
    ))
}

impl ResponseShape for Record {
    const NAME: &'static str = "Record";

    fn decode(body: &[u8], _envelope: Option<&str>) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::decode(Self::NAME, e))
    }

    fn stamp(&mut self, resource_type: &str) {
        self.stamp_resource_type(resource_type);
    }

    fn into_value(self) -> ResponseValue {
        ResponseValue::Record(self)
    }

    fn from_value(value: ResponseValue) -> Result<Self> {
        match value {
            ResponseValue::Record(r) => Ok(r),
            other => Err(shape_mismatch(Self::NAME, &other)),
        }
    }
}

impl ResponseShape for RecordSet {
    const NAME: &'static str = "RecordSet";

    fn decode(body: &[u8], envelope: Option<&str>) -> Result<Self> {
        let value: Value = serde_json::from_slice(body).map_err(|e| Error::decode(Self::NAME, e))?;
        let list = match (value, envelope) {
            (list @ Value::Array(_), _) => list,
            (Value::Object(mut obj), Some(key)) => match obj.remove(key) {
                Some(list @ Value::Array(_)) => list,
                _ => {
                    return Err(Error::decode(
                        Self::NAME,
                        format!("object without a '{}' list", key),
                    ));
                }
            },
            (other, _) => {
                return Err(Error::decode(
                    Self::NAME,
                    format!("expected a JSON array, found {}", json_type(&other)),
                ));
            }
        };
        serde_json::from_value(list).map_err(|e| Error::decode(Self::NAME, e))
    }

    fn stamp(&mut self, resource_type: &str) {
        for record in self.iter_mut() {
            record.stamp_resource_type(resource_type);
        }
    }

    fn into_value(self) -> ResponseValue {
        ResponseValue::RecordSet(self)
    }

    fn from_value(value: ResponseValue) -> Result<Self> {
        match value {
            ResponseValue::RecordSet(rs) => Ok(rs),
            other => Err(shape_mismatch(Self::NAME, &other)),
        }
    }
}

impl ResponseShape for EmptyRecord {
    const NAME: &'static str = "EmptyRecord";
    const READS_BODY: bool = false;

    fn decode(_body: &[u8], _envelope: Option<&str>) -> Result<Self> {
        Ok(EmptyRecord)
    }

    fn stamp(&mut self, _resource_type: &str) {}

    fn into_value(self) -> ResponseValue {
        ResponseValue::Empty(self)
    }

    fn from_value(value: ResponseValue) -> Result<Self> {
        match value {
            ResponseValue::Empty(e) => Ok(e),
            other => Err(shape_mismatch(Self::NAME, &other)),
        }
    }
}

/// Convert a JSON number into an integer identifier.
///
/// Integers are taken as-is and floats are truncated; anything else is rejected.
pub(crate) fn to_int(value: &Value) -> Result<i64> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64().filter(|f| f.is_finite()) {
                Ok(f as i64)
            } else {
                Err(Error::InvalidRecord(format!("id {} out of range", n)))
            }
        }
        other => Err(Error::InvalidRecord(format!(
            "unexpected type for id field: {}",
            json_type(other)
        ))),
    }
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Lenient scalar conversions for use with `#[serde(deserialize_with = ...)]`.
pub mod coerce {
    use serde::de::{Deserializer, Error as _};
    use serde::Deserialize;
    use serde_json::Value;

    /// Accept a string or a number and produce a string.
    pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            other => Err(D::Error::custom(format!(
                "expected string or number, found {}",
                super::json_type(&other)
            ))),
        }
    }

    /// Accept an integer, an integral float, or a numeric string and produce an `i64`.
    pub fn i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
                .ok_or_else(|| D::Error::custom(format!("{} is not an integer", n))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|e| D::Error::custom(format!("cannot convert string to int: {}", e))),
            other => Err(D::Error::custom(format!(
                "expected integer or numeric string, found {}",
                super::json_type(&other)
            ))),
        }
    }
}
