//! Decoded parameter values.
//!
//! A [`Value`] is one node of a decoded request tree. Mappings are always
//! represented as [`Parameters`], never as a raw map, so the permission flag
//! exists at every nesting level.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::Parameters;

/// A symbolic atom, such as an enum-like tag sent by a client.
///
/// Symbols and strings address the same slot when used as keys; as values
/// they stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a symbol with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the symbol name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

/// Handle to a file uploaded as part of a multipart request.
///
/// The file contents stay on disk; only the handle travels through filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    original_filename: String,
    content_type: Option<String>,
    path: PathBuf,
}

impl UploadedFile {
    /// Creates a handle for an upload stored at `path`.
    pub fn new(original_filename: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            original_filename: original_filename.into(),
            content_type: None,
            path: path.into(),
        }
    }

    /// Sets the content type reported by the client.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Returns the filename as sent by the client.
    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    /// Returns the content type reported by the client, if any.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns where the upload is stored.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Runtime type of a scalar value, as checked against the scalar whitelist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// UTF-8 text
    String,
    /// Symbolic atom
    Symbol,
    /// Explicit null
    Null,
    /// Any integer or floating point number
    Numeric,
    /// `true` or `false`
    Boolean,
    /// Calendar date
    Date,
    /// Date with time of day and offset
    Time,
    /// Binary stream contents
    Binary,
    /// Uploaded file handle
    UploadedFile,
}

impl ScalarKind {
    /// Every scalar kind, with `String` first since it is by far the most common.
    pub const ALL: [ScalarKind; 9] = [
        ScalarKind::String,
        ScalarKind::Symbol,
        ScalarKind::Null,
        ScalarKind::Numeric,
        ScalarKind::Boolean,
        ScalarKind::Date,
        ScalarKind::Time,
        ScalarKind::Binary,
        ScalarKind::UploadedFile,
    ];
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarKind::String => write!(f, "string"),
            ScalarKind::Symbol => write!(f, "symbol"),
            ScalarKind::Null => write!(f, "null"),
            ScalarKind::Numeric => write!(f, "numeric"),
            ScalarKind::Boolean => write!(f, "boolean"),
            ScalarKind::Date => write!(f, "date"),
            ScalarKind::Time => write!(f, "time"),
            ScalarKind::Binary => write!(f, "binary"),
            ScalarKind::UploadedFile => write!(f, "uploaded_file"),
        }
    }
}

/// A node in a decoded parameter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Explicit null
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Symbolic atom
    Symbol(Symbol),
    /// Calendar date
    Date(NaiveDate),
    /// Timestamp with offset
    Time(DateTime<FixedOffset>),
    /// Contents of a binary stream
    Binary(Vec<u8>),
    /// Uploaded file handle
    File(UploadedFile),
    /// Ordered sequence
    Array(Vec<Value>),
    /// Nested mapping
    Params(Parameters),
    /// A decoded value of some type the whitelist knows nothing about.
    ///
    /// Carries the type name for diagnostics. Never a permitted scalar.
    Foreign(String),
}

impl Value {
    /// Returns the scalar kind of this value, or `None` for arrays, nested
    /// parameters and foreign values.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Null => Some(ScalarKind::Null),
            Value::Bool(_) => Some(ScalarKind::Boolean),
            Value::Integer(_) | Value::Float(_) => Some(ScalarKind::Numeric),
            Value::String(_) => Some(ScalarKind::String),
            Value::Symbol(_) => Some(ScalarKind::Symbol),
            Value::Date(_) => Some(ScalarKind::Date),
            Value::Time(_) => Some(ScalarKind::Time),
            Value::Binary(_) => Some(ScalarKind::Binary),
            Value::File(_) => Some(ScalarKind::UploadedFile),
            Value::Array(_) | Value::Params(_) | Value::Foreign(_) => None,
        }
    }

    /// Returns `true` for null, `false`, whitespace-only strings and empty
    /// arrays or mappings.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Null | Value::Bool(false) => true,
            Value::String(s) => s.trim().is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::Params(params) => params.is_empty(),
            _ => false,
        }
    }

    /// Short name of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Binary(_) => "binary",
            Value::File(_) => "uploaded_file",
            Value::Array(_) => "array",
            Value::Params(_) => "parameters",
            Value::Foreign(_) => "foreign",
        }
    }

    /// Returns the text if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the elements if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the nested parameters if this is a mapping.
    pub fn as_params(&self) -> Option<&Parameters> {
        match self {
            Value::Params(params) => Some(params),
            _ => None,
        }
    }

    /// Returns the nested parameters mutably if this is a mapping.
    pub fn as_params_mut(&mut self) -> Option<&mut Parameters> {
        match self {
            Value::Params(params) => Some(params),
            _ => None,
        }
    }

    /// Marks every `Parameters` reachable from this value as permitted.
    pub(crate) fn permit_all(&mut self) {
        match self {
            Value::Params(params) => {
                params.permit_all();
            }
            Value::Array(items) => items.iter_mut().for_each(Value::permit_all),
            _ => {}
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<Symbol> for Value {
    fn from(symbol: Symbol) -> Self {
        Value::Symbol(symbol)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(time: DateTime<FixedOffset>) -> Self {
        Value::Time(time)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(time: DateTime<Utc>) -> Self {
        Value::Time(time.into())
    }
}

impl From<UploadedFile> for Value {
    fn from(file: UploadedFile) -> Self {
        Value::File(file)
    }
}

impl From<Parameters> for Value {
    fn from(params: Parameters) -> Self {
        Value::Params(params)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n
                    .as_f64()
                    .map_or_else(|| Value::Foreign(n.to_string()), Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Params(Parameters::from(map)),
        }
    }
}
