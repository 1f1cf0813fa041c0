//! The permission-tracking parameter container.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::{Config, MissingParameterAction};
use crate::notification::Notification;
use crate::{Declaration, Error, Value};

/// An ordered, string-keyed mapping of decoded request data that remembers
/// whether it has been permitted.
///
/// `Parameters` built from raw input start out unpermitted. The only ways to
/// obtain permitted parameters are [`permit`](Self::permit), which returns a
/// filtered copy, and [`permit_all`](Self::permit_all), which trusts an
/// entire subtree in place.
///
/// Keys are looked up by their text, so a [`Symbol`](crate::Symbol) and a
/// string with the same name address the same slot. Lookups and inserts are
/// hashed; iteration follows insertion order.
///
/// # Examples
///
/// ```
/// use strong_params::{Config, Declaration, Parameters, Value};
/// use serde_json::json;
///
/// let params = Parameters::from_json(json!({
///     "book": { "title": "Romeo and Juliet", "price": 12 },
///     "admin": true
/// }))
/// .unwrap();
///
/// let permitted = params
///     .permit_with(
///         &[Declaration::nested("book", ["title"])],
///         &Config::default(),
///     )
///     .unwrap();
///
/// assert!(permitted.is_permitted());
/// assert!(permitted.get("admin").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Parameters {
    entries: IndexMap<String, Value>,
    permitted: bool,
}

impl Parameters {
    /// Creates an empty, unpermitted container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds unpermitted parameters from a decoded JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotAnObject`] unless the document is a JSON object.
    pub fn from_json(json: serde_json::Value) -> Result<Self, Error> {
        match Value::from(json) {
            Value::Params(params) => Ok(params),
            other => Err(Error::NotAnObject {
                found: other.type_name(),
            }),
        }
    }

    /// Returns `true` once these parameters have been filtered or explicitly
    /// trusted.
    ///
    /// This is the only thing a mass-assignment collaborator needs to check.
    pub fn is_permitted(&self) -> bool {
        self.permitted
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if `key` is present.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        self.entries.contains_key(key.as_ref())
    }

    /// Returns the value stored at `key`.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Value> {
        self.entries.get(key.as_ref())
    }

    /// Returns the value stored at `key` mutably.
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Value> {
        self.entries.get_mut(key.as_ref())
    }

    /// Returns the value stored at `key`, failing if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterMissing`] if `key` is not present.
    pub fn fetch(&self, key: impl AsRef<str>) -> Result<&Value, Error> {
        let key = key.as_ref();
        self.get(key).ok_or_else(|| Error::missing(key))
    }

    /// Stores `value` at `key`, keeping the position of an existing key.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Removes `key` and returns its value, keeping the order of the
    /// remaining keys.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Value> {
        self.entries.shift_remove(key.as_ref())
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Iterates over key/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the value at `key`, applying the missing-parameter policy of
    /// the process-wide configuration when it is blank.
    ///
    /// See [`require_with`](Self::require_with).
    pub fn require(&self, key: impl AsRef<str>) -> Result<Option<&Value>, Error> {
        self.require_with(key, Config::global())
    }

    /// Alias for [`require`](Self::require).
    pub fn required(&self, key: impl AsRef<str>) -> Result<Option<&Value>, Error> {
        self.require(key)
    }

    /// Returns the value at `key`, applying the missing-parameter policy of
    /// `config` when it is absent or blank.
    ///
    /// Under [`MissingParameterAction::Raise`] a blank value fails. Under
    /// [`MissingParameterAction::Log`] a `missing_parameter` notification is
    /// emitted and the blank value (or `None`) is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterMissing`] when the value is blank and the
    /// policy is `Raise`.
    ///
    /// # Examples
    ///
    /// ```
    /// use strong_params::{Config, Error, Parameters};
    /// use serde_json::json;
    ///
    /// let params = Parameters::from_json(json!({ "magazine": { "name": "Mjallo!" } })).unwrap();
    ///
    /// let err = params.require_with("book", &Config::default()).unwrap_err();
    /// assert_eq!(err, Error::missing("book"));
    /// ```
    pub fn require_with(
        &self,
        key: impl AsRef<str>,
        config: &Config,
    ) -> Result<Option<&Value>, Error> {
        let key = key.as_ref();
        let value = self.get(key);

        if value.map_or(true, Value::is_blank) {
            match config.action_on_missing_parameter {
                MissingParameterAction::Log => {
                    config.notify(&Notification::MissingParameter {
                        key: key.to_string(),
                    });
                }
                MissingParameterAction::Raise => return Err(Error::missing(key)),
            }
        }

        Ok(value)
    }

    /// Marks these parameters and every nested `Parameters` as permitted.
    ///
    /// Idempotent. Nested parameters inside arrays are included.
    pub fn permit_all(&mut self) -> &mut Self {
        for value in self.entries.values_mut() {
            value.permit_all();
        }
        self.permitted = true;
        self
    }

    /// Filters these parameters against `declarations` using the
    /// process-wide configuration.
    ///
    /// See [`permit_with`](Self::permit_with).
    pub fn permit(&self, declarations: &[Declaration]) -> Result<Parameters, Error> {
        self.permit_with(declarations, Config::global())
    }

    /// Filters these parameters against `declarations`.
    ///
    /// Returns a new, permitted container holding only the matched
    /// substructure. `self` is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnpermittedParameters`] when unmatched keys are found
    /// and the unpermitted-parameters action is `Raise`.
    pub fn permit_with(
        &self,
        declarations: &[Declaration],
        config: &Config,
    ) -> Result<Parameters, Error> {
        config.filter().permit(self, declarations, config)
    }

    /// Returns a new container with only the listed keys.
    ///
    /// The permitted flag is copied as-is; slicing does not filter.
    pub fn slice<K: AsRef<str>>(&self, keys: &[K]) -> Parameters {
        let wanted: HashSet<&str> = keys.iter().map(|k| k.as_ref()).collect();
        let entries = self
            .entries
            .iter()
            .filter(|(k, _)| wanted.contains(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Parameters {
            entries,
            permitted: self.permitted,
        }
    }
}

/// Structural equality: same keys mapped to equal values, in any order.
///
/// The permitted flag is not compared.
impl PartialEq for Parameters {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for Parameters {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}
