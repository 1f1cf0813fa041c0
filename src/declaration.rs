//! The whitelist grammar passed to [`Parameters::permit`](crate::Parameters::permit).

use serde_json::Value as Json;

use crate::{Error, Symbol};

/// One item of a whitelist.
///
/// A `permit` call takes an ordered list of declarations. Each one names a
/// key and describes what that key may contain.
///
/// # Examples
///
/// ```
/// use strong_params::Declaration;
///
/// // title, comment_ids: [], authors: [name, { address: [city] }]
/// let declarations = vec![
///     Declaration::from("title"),
///     Declaration::array("comment_ids"),
///     Declaration::nested(
///         "authors",
///         [
///             Declaration::from("name"),
///             Declaration::nested("address", ["city"]),
///         ],
///     ),
/// ];
/// assert_eq!(declarations[2].key(), "authors");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    /// Accept the key only if its value is a permitted scalar.
    Scalar(String),
    /// Accept the key only if its value is an array of permitted scalars.
    ArrayOfScalars(String),
    /// Recurse into the mapping (or each mapping of an array or fields-for
    /// collection) under the key.
    Nested {
        /// Key holding the nested mapping
        key: String,
        /// Declarations applied to each nested mapping
        declarations: Vec<Declaration>,
    },
    /// Accept the key as an opaque scalar-typed value.
    ///
    /// Behaves like [`Declaration::Scalar`] for scalar values. A mapping
    /// found under an opaque key passes through unfiltered in the default
    /// filter and is rejected by the transitional filter.
    Opaque(String),
}

impl Declaration {
    /// Declares a scalar key.
    pub fn scalar(key: impl Into<String>) -> Self {
        Declaration::Scalar(key.into())
    }

    /// Declares a key holding an array of scalars.
    pub fn array(key: impl Into<String>) -> Self {
        Declaration::ArrayOfScalars(key.into())
    }

    /// Declares a key holding nested parameters filtered by `declarations`.
    pub fn nested<D, I>(key: impl Into<String>, declarations: I) -> Self
    where
        D: Into<Declaration>,
        I: IntoIterator<Item = D>,
    {
        Declaration::Nested {
            key: key.into(),
            declarations: declarations.into_iter().map(Into::into).collect(),
        }
    }

    /// Declares an opaque, scalar-typed key.
    pub fn opaque(key: impl Into<String>) -> Self {
        Declaration::Opaque(key.into())
    }

    /// Returns the key this declaration applies to.
    pub fn key(&self) -> &str {
        match self {
            Declaration::Scalar(key)
            | Declaration::ArrayOfScalars(key)
            | Declaration::Opaque(key)
            | Declaration::Nested { key, .. } => key,
        }
    }

    /// Parses declarations from their JSON-shaped form.
    ///
    /// | JSON | declaration |
    /// |---|---|
    /// | `"title"` | `Scalar("title")` |
    /// | `{"ids": []}` | `ArrayOfScalars("ids")` |
    /// | `{"book": "pages"}` | `Nested("book", [Scalar("pages")])` |
    /// | `{"book": ["title", {...}]}` | `Nested("book", [...])` |
    /// | `{"book": {"authors": [...]}}` | `Nested("book", [Nested("authors", ...)])` |
    ///
    /// The top level may be a single item or an array of items. Opaque
    /// declarations have no JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeclaration`] for numbers, booleans, nulls or
    /// nested arrays in item position.
    ///
    /// # Examples
    ///
    /// ```
    /// use strong_params::Declaration;
    /// use serde_json::json;
    ///
    /// let parsed = Declaration::parse(&json!(["title", { "comment_ids": [] }])).unwrap();
    /// assert_eq!(
    ///     parsed,
    ///     vec![Declaration::scalar("title"), Declaration::array("comment_ids")]
    /// );
    /// ```
    pub fn parse(json: &Json) -> Result<Vec<Declaration>, Error> {
        match json {
            Json::Array(items) => parse_items(items),
            other => parse_item(other),
        }
    }
}

fn parse_items(items: &[Json]) -> Result<Vec<Declaration>, Error> {
    let mut declarations = Vec::with_capacity(items.len());
    for item in items {
        declarations.extend(parse_item(item)?);
    }
    Ok(declarations)
}

fn parse_item(item: &Json) -> Result<Vec<Declaration>, Error> {
    match item {
        Json::String(key) => Ok(vec![Declaration::scalar(key.as_str())]),
        Json::Object(map) => map
            .iter()
            .map(|(key, sub)| parse_sub_declaration(key, sub))
            .collect(),
        other => Err(Error::invalid_declaration(format!(
            "expected a key or a mapping, found {other}"
        ))),
    }
}

fn parse_sub_declaration(key: &str, sub: &Json) -> Result<Declaration, Error> {
    match sub {
        Json::Array(items) if items.is_empty() => Ok(Declaration::array(key)),
        Json::Array(items) => Ok(Declaration::nested(key, parse_items(items)?)),
        Json::String(_) | Json::Object(_) => Ok(Declaration::nested(key, parse_item(sub)?)),
        other => Err(Error::invalid_declaration(format!(
            "unsupported sub-declaration for `{key}`: {other}"
        ))),
    }
}

impl From<&str> for Declaration {
    fn from(key: &str) -> Self {
        Declaration::scalar(key)
    }
}

impl From<String> for Declaration {
    fn from(key: String) -> Self {
        Declaration::Scalar(key)
    }
}

impl From<Symbol> for Declaration {
    fn from(key: Symbol) -> Self {
        Declaration::Scalar(key.into())
    }
}
