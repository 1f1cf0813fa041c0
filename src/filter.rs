//! The filtering algorithm behind [`Parameters::permit`].
//!
//! A [`Filter`] walks one nesting level of input against a list of
//! [`Declaration`]s, copying whatever matches into a fresh output. Nested
//! mappings are filtered by recursing through [`Parameters::permit_with`], so
//! every level reports its own unmatched keys and the configured filter
//! implementation applies all the way down.
//!
//! Two built-in implementations share the algorithm and differ only where a
//! value does not fit its declaration's shape:
//!
//! | situation | [`DefaultFilter`] | [`TransitionalFilter`] |
//! |---|---|---|
//! | mapping under an opaque declaration | passed through unfiltered | unmatched |
//! | fields-for entry that does not match | kept as `null` | dropped |
//!
//! The transitional filter also logs and passes unmatched keys through unless
//! configured otherwise (see [`FilterMode`]).

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::{Config, FilterMode, UnpermittedAction, UnpermittedHandler};
use crate::notification::Notification;
use crate::{Declaration, Error, Parameters, Value};

// `start_date(1i)`, `start_date(2i)`, `amount(1f)`, `position(3)`
static INDEXED_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<base>.+)\([0-9]+[if]?\)$").expect("indexed field pattern is valid")
});

// Keys of a fields-for collection: `0`, `1`, `-1`
static FIELDS_FOR_INDEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("fields-for pattern is valid"));

/// Returns the base key of a multi-part field key such as `start_date(1i)`.
///
/// The index is one or more ASCII digits followed by an optional `i` or `f`
/// type suffix.
pub fn indexed_field_base(key: &str) -> Option<&str> {
    INDEXED_FIELD
        .captures(key)
        .and_then(|caps| caps.name("base"))
        .map(|base| base.as_str())
}

/// Returns `true` if every key of `params` is an optionally negative integer,
/// the shape form builders use for collections of nested records.
pub fn is_fields_for_collection(params: &Parameters) -> bool {
    params.keys().all(|k| FIELDS_FOR_INDEX.is_match(k))
}

/// A whitelist filter implementation.
///
/// [`Config::filter`] selects the implementation `permit` uses. Custom
/// implementations can be plugged in with [`Config::with_custom_filter`];
/// they usually drive a [`Filter`] and adjust its result.
pub trait ParameterFilter: fmt::Debug + Send + Sync {
    /// Filters `input` against `declarations`, returning permitted output.
    fn permit(
        &self,
        input: &Parameters,
        declarations: &[Declaration],
        config: &Config,
    ) -> Result<Parameters, Error>;
}

/// The enforcing filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultFilter;

impl ParameterFilter for DefaultFilter {
    fn permit(
        &self,
        input: &Parameters,
        declarations: &[Declaration],
        config: &Config,
    ) -> Result<Parameters, Error> {
        Filter::new(input, config, FilterMode::Default).permit(declarations)
    }
}

/// The soft-migration filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionalFilter;

impl ParameterFilter for TransitionalFilter {
    fn permit(
        &self,
        input: &Parameters,
        declarations: &[Declaration],
        config: &Config,
    ) -> Result<Parameters, Error> {
        Filter::new(input, config, FilterMode::Transitional).permit(declarations)
    }
}

/// One filtering pass over a single level of input.
///
/// # Examples
///
/// ```
/// use strong_params::{Config, Declaration, Filter, FilterMode, Parameters};
/// use serde_json::json;
///
/// let input = Parameters::from_json(json!({
///     "book": { "pages": 65 },
///     "fishing": "Turnips"
/// }))
/// .unwrap();
/// let config = Config::default();
///
/// let mut filter = Filter::new(&input, &config, FilterMode::Default);
/// filter.apply(&[Declaration::nested("book", ["pages"])]).unwrap();
/// assert_eq!(filter.unpermitted_keys(), vec!["fishing"]);
///
/// let output = filter.finish().unwrap();
/// assert!(output.is_permitted());
/// assert!(output.contains_key("book"));
/// ```
#[derive(Debug)]
pub struct Filter<'a> {
    input: &'a Parameters,
    config: &'a Config,
    mode: FilterMode,
    output: Parameters,
    matched: HashSet<String>,
}

impl<'a> Filter<'a> {
    /// Creates a filter over `input`.
    ///
    /// With the passthrough handler the output starts as a copy of the input;
    /// otherwise it starts empty.
    pub fn new(input: &'a Parameters, config: &'a Config, mode: FilterMode) -> Self {
        let output = match config.unpermitted_handler() {
            UnpermittedHandler::Passthrough => input.clone(),
            UnpermittedHandler::Filter => Parameters::new(),
        };

        Self {
            input,
            config,
            mode,
            output,
            matched: HashSet::new(),
        }
    }

    /// Applies `declarations`, finalizes and returns the permitted output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnpermittedParameters`] under the `Raise` policy,
    /// from this level or any nested one.
    pub fn permit(mut self, declarations: &[Declaration]) -> Result<Parameters, Error> {
        self.apply(declarations)?;
        self.finish()
    }

    /// Matches `declarations` against the input, in order.
    ///
    /// # Errors
    ///
    /// Propagates failures from nested levels.
    pub fn apply(&mut self, declarations: &[Declaration]) -> Result<(), Error> {
        for declaration in declarations {
            match declaration {
                Declaration::Scalar(key) => self.scalar_filter(key),
                Declaration::ArrayOfScalars(key) => self.array_of_scalars_filter(key),
                Declaration::Nested { key, declarations } => {
                    self.nested_filter(key, declarations)?
                }
                Declaration::Opaque(key) => self.opaque_filter(key),
            }
        }
        Ok(())
    }

    /// Input keys no declaration matched so far, in input order, excluding
    /// keys reserved by the host framework.
    pub fn unpermitted_keys(&self) -> Vec<String> {
        self.input
            .keys()
            .filter(|k| !self.is_matched(k) && !self.config.is_never_unpermitted(k))
            .map(str::to_string)
            .collect()
    }

    /// Applies the unpermitted-parameters policy and returns the output,
    /// marked permitted throughout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnpermittedParameters`] under the `Raise` policy.
    pub fn finish(self) -> Result<Parameters, Error> {
        self.unpermitted_parameters()?;

        let mut output = self.output;
        output.permit_all();
        Ok(output)
    }

    fn unpermitted_parameters(&self) -> Result<(), Error> {
        let action = self.config.unpermitted_action();
        if action == UnpermittedAction::Disabled {
            return Ok(());
        }

        let keys = self.unpermitted_keys();
        if keys.is_empty() {
            return Ok(());
        }

        match action {
            UnpermittedAction::Log => {
                self.config
                    .notify(&Notification::UnpermittedParameters { keys });
                Ok(())
            }
            UnpermittedAction::Raise => Err(Error::unpermitted(keys)),
            UnpermittedAction::Disabled => Ok(()),
        }
    }

    fn scalar_filter(&mut self, key: &str) {
        let input = self.input;

        if let Some(value) = input.get(key) {
            if self.is_permitted_scalar(value) {
                self.accept(key, value.clone());
            }
        }

        for (indexed_key, value) in input.iter() {
            if !(indexed_key.starts_with(key) && indexed_key.ends_with(')')) {
                continue;
            }
            if indexed_field_base(indexed_key) == Some(key) && self.is_permitted_scalar(value) {
                self.accept(indexed_key, value.clone());
            }
        }
    }

    fn array_of_scalars_filter(&mut self, key: &str) {
        if let Some(value) = self.declared_value(key) {
            if self.is_array_of_permitted_scalars(value) {
                self.accept(key, value.clone());
            }
        }
    }

    fn opaque_filter(&mut self, key: &str) {
        let Some(value) = self.declared_value(key) else {
            return;
        };

        match value {
            value if self.is_permitted_scalar(value) => self.accept(key, value.clone()),
            Value::Params(_) if self.mode == FilterMode::Default => {
                self.accept(key, value.clone())
            }
            _ => {}
        }
    }

    fn nested_filter(&mut self, key: &str, declarations: &[Declaration]) -> Result<(), Error> {
        let Some(value) = self.declared_value(key) else {
            return Ok(());
        };

        if let Some(filtered) = self.each_element(value, declarations)? {
            self.accept(key, filtered);
        }
        Ok(())
    }

    /// Filters `value` element-wise, keeping its shape.
    ///
    /// Arrays keep the order of matching elements; a non-empty array with no
    /// matching element does not match at all. Fields-for collections keep
    /// their keys. Anything else is filtered as a single element.
    fn each_element(
        &self,
        value: &Value,
        declarations: &[Declaration],
    ) -> Result<Option<Value>, Error> {
        match value {
            Value::Array(items) => {
                let mut kept = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(element) = self.permit_element(item, None, declarations)? {
                        kept.push(element);
                    }
                }

                if !items.is_empty() && kept.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Array(kept)))
                }
            }
            Value::Params(collection) if is_fields_for_collection(collection) => {
                let mut kept = Parameters::new();
                for (index, item) in collection.iter() {
                    match self.permit_element(item, Some(index), declarations)? {
                        Some(element) => {
                            kept.insert(index, element);
                        }
                        None if self.mode == FilterMode::Default => {
                            kept.insert(index, Value::Null);
                        }
                        None => {}
                    }
                }
                Ok(Some(Value::Params(kept)))
            }
            single => self.permit_element(single, None, declarations),
        }
    }

    fn permit_element(
        &self,
        element: &Value,
        index: Option<&str>,
        declarations: &[Declaration],
    ) -> Result<Option<Value>, Error> {
        if let Value::Params(params) = element {
            return params
                .permit_with(declarations, self.config)
                .map(|permitted| Some(Value::Params(permitted)));
        }

        // {"authors": {"0": []}} accepts a scalar array at index 0
        let declared_as_array = index.is_some_and(|index| {
            declarations
                .iter()
                .any(|d| matches!(d, Declaration::ArrayOfScalars(k) if k == index))
        });

        if declared_as_array && self.is_array_of_permitted_scalars(element) {
            Ok(Some(element.clone()))
        } else {
            Ok(None)
        }
    }

    // Keys of mapping declarations are skipped when their value is null or
    // `false`.
    fn declared_value(&self, key: &str) -> Option<&'a Value> {
        self.input
            .get(key)
            .filter(|v| !matches!(v, Value::Null | Value::Bool(false)))
    }

    fn is_permitted_scalar(&self, value: &Value) -> bool {
        value
            .scalar_kind()
            .is_some_and(|kind| self.config.permitted_scalars.contains(kind))
    }

    fn is_array_of_permitted_scalars(&self, value: &Value) -> bool {
        match value {
            Value::Array(items) => items.iter().all(|item| self.is_permitted_scalar(item)),
            _ => false,
        }
    }

    fn accept(&mut self, key: &str, value: Value) {
        self.output.insert(key, value);
        if !self.is_matched(key) {
            self.matched.insert(key.to_string());
        }
    }

    fn is_matched(&self, key: &str) -> bool {
        self.matched.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::NotificationLog;
    use crate::value::ScalarKind;
    use crate::ScalarWhitelist;
    use serde_json::json;
    use std::sync::Arc;

    fn params(json: serde_json::Value) -> Parameters {
        Parameters::from_json(json).unwrap()
    }

    #[test]
    fn indexed_field_base_accepts_digit_suffixes() {
        assert_eq!(indexed_field_base("start_date(1i)"), Some("start_date"));
        assert_eq!(indexed_field_base("amount(12f)"), Some("amount"));
        assert_eq!(indexed_field_base("position(3)"), Some("position"));
        assert_eq!(indexed_field_base("foo(000i)"), Some("foo"));
    }

    #[test]
    fn indexed_field_base_rejects_other_shapes() {
        assert_eq!(indexed_field_base("start_date"), None);
        assert_eq!(indexed_field_base("start_date()"), None);
        assert_eq!(indexed_field_base("start_date(1x)"), None);
        assert_eq!(indexed_field_base("start_date(i)"), None);
        assert_eq!(indexed_field_base("start_date(-1i)"), None);
        assert_eq!(indexed_field_base("(1i)"), None);
    }

    #[test]
    fn fields_for_collections_have_integer_keys() {
        assert!(is_fields_for_collection(&params(json!({ "0": {}, "-1": {} }))));
        assert!(!is_fields_for_collection(&params(json!({ "0": {}, "name": "x" }))));
        assert!(!is_fields_for_collection(&params(json!({ "1.5": {} }))));
    }

    #[test]
    fn indexed_fields_follow_their_base_declaration() {
        let input = params(json!({
            "start_date(1i)": "2020",
            "start_date(2i)": "05",
            "start_date(3i)": ["nope"],
            "end_date(1i)": "2021"
        }));

        let output = DefaultFilter
            .permit(&input, &[Declaration::scalar("start_date")], &Config::default())
            .unwrap();

        assert_eq!(
            output.keys().collect::<Vec<_>>(),
            vec!["start_date(1i)", "start_date(2i)"]
        );
    }

    #[test]
    fn scalar_whitelist_is_configurable() {
        let input = params(json!({ "title": "Hamlet", "pages": 200 }));
        let config = Config::default()
            .with_permitted_scalars(ScalarWhitelist::new([ScalarKind::String]));

        let output = input
            .permit_with(
                &[Declaration::scalar("title"), Declaration::scalar("pages")],
                &config,
            )
            .unwrap();

        assert!(output.contains_key("title"));
        assert!(!output.contains_key("pages"));
    }

    #[test]
    fn foreign_values_are_never_scalars() {
        let mut input = Parameters::new();
        input.insert("id", Value::Foreign("Object".to_string()));

        let output = input
            .permit_with(&[Declaration::scalar("id")], &Config::default())
            .unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn null_under_mapping_declaration_is_skipped() {
        let input = params(json!({ "ids": null, "book": null, "title": null }));
        let config = Config::default();
        let mut filter = Filter::new(&input, &config, FilterMode::Default);
        filter
            .apply(&[
                Declaration::array("ids"),
                Declaration::nested("book", ["title"]),
                Declaration::scalar("title"),
            ])
            .unwrap();

        assert_eq!(filter.unpermitted_keys(), vec!["ids", "book"]);
    }

    #[test]
    fn false_under_mapping_declaration_is_skipped() {
        let input = params(json!({ "kind": false, "ids": false, "book": false, "draft": false }));
        let config = Config::default();
        let mut filter = Filter::new(&input, &config, FilterMode::Default);
        filter
            .apply(&[
                Declaration::opaque("kind"),
                Declaration::array("ids"),
                Declaration::nested("book", ["title"]),
                Declaration::scalar("draft"),
            ])
            .unwrap();

        assert_eq!(filter.unpermitted_keys(), vec!["kind", "ids", "book"]);
        let output = filter.finish().unwrap();
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["draft"]);
        assert_eq!(output.get("draft"), Some(&Value::Bool(false)));
    }

    #[test]
    fn wide_input_is_filtered_in_one_pass() {
        let wide: serde_json::Map<String, serde_json::Value> = (0..50_000)
            .map(|i| (format!("k{i}"), json!(i)))
            .collect();
        let input = Parameters::from(wide);
        assert_eq!(input.len(), 50_000);
        assert_eq!(input.get("k49999"), Some(&Value::from(49_999)));

        let config = Config::default();
        let mut filter = Filter::new(&input, &config, FilterMode::Default);
        filter
            .apply(&[Declaration::scalar("k1"), Declaration::scalar("k42")])
            .unwrap();

        assert_eq!(filter.unpermitted_keys().len(), 49_998);
        let output = filter.finish().unwrap();
        assert_eq!(output.keys().collect::<Vec<_>>(), vec!["k1", "k42"]);
    }

    #[test]
    fn wide_fields_for_collection_keeps_every_index() {
        let collection: serde_json::Map<String, serde_json::Value> = (0..20_000)
            .map(|i| (i.to_string(), json!({ "name": "x", "extra": 1 })))
            .collect();
        let input = params(json!({ "authors_attributes": collection }));

        let output = input
            .permit_with(
                &[Declaration::nested("authors_attributes", ["name"])],
                &Config::default(),
            )
            .unwrap();

        let authors = output
            .get("authors_attributes")
            .and_then(Value::as_params)
            .unwrap();
        assert_eq!(authors.len(), 20_000);
        assert_eq!(authors.keys().last(), Some("19999"));
    }

    #[test]
    fn reserved_keys_are_never_unpermitted() {
        let input = params(json!({ "controller": "books", "action": "create", "x": 1 }));
        let config = Config::default();
        let mut filter = Filter::new(&input, &config, FilterMode::Default);
        filter.apply(&[]).unwrap();

        assert_eq!(filter.unpermitted_keys(), vec!["x"]);
    }

    #[test]
    fn index_declared_arrays_inside_fields_for_collections() {
        let input = params(json!({
            "tags": { "0": ["a", "b"], "1": [{ "x": 1 }] }
        }));

        let output = input
            .permit_with(
                &[Declaration::nested("tags", [Declaration::array("0")])],
                &Config::default(),
            )
            .unwrap();

        let tags = output.get("tags").and_then(Value::as_params).unwrap();
        assert_eq!(tags.get("0"), Some(&Value::from(vec!["a", "b"])));
        assert_eq!(tags.get("1"), Some(&Value::Null));
    }

    #[test]
    fn opaque_declarations_differ_by_mode() {
        let input = params(json!({ "genre": { "name": "Tragedy" }, "kind": "play" }));
        let declarations = [Declaration::opaque("genre"), Declaration::opaque("kind")];

        let default = DefaultFilter
            .permit(&input, &declarations, &Config::default())
            .unwrap();
        assert!(default.contains_key("genre"));
        assert!(default.contains_key("kind"));

        let strict = Config::default()
            .with_filter_mode(FilterMode::Transitional)
            .with_unpermitted_handler(UnpermittedHandler::Filter);
        let transitional = input.permit_with(&declarations, &strict).unwrap();
        assert!(!transitional.contains_key("genre"));
        assert!(transitional.contains_key("kind"));
    }

    #[test]
    fn nested_failures_abort_the_whole_call() {
        let input = params(json!({ "book": { "title": "Hamlet", "isbn": "x" } }));
        let config = Config::default().with_unpermitted_action(UnpermittedAction::Raise);

        let err = input
            .permit_with(&[Declaration::nested("book", ["title"])], &config)
            .unwrap_err();

        assert_eq!(err, Error::unpermitted(vec!["isbn".to_string()]));
    }

    #[derive(Debug)]
    struct DropEverything;

    impl ParameterFilter for DropEverything {
        fn permit(
            &self,
            _input: &Parameters,
            _declarations: &[Declaration],
            _config: &Config,
        ) -> Result<Parameters, Error> {
            let mut output = Parameters::new();
            output.permit_all();
            Ok(output)
        }
    }

    #[test]
    fn custom_filter_replaces_built_in_one() {
        let log = Arc::new(NotificationLog::new());
        let config = Config::default()
            .with_custom_filter(Arc::new(DropEverything))
            .with_notifier(log.clone());
        let input = params(json!({ "title": "Hamlet" }));

        let output = input.permit_with(&[Declaration::scalar("title")], &config).unwrap();

        assert!(output.is_empty());
        assert!(output.is_permitted());
        assert!(log.is_empty());
    }

    mod proptests {
        use super::*;
        use crate::test_utils::{arb_flat_parameters, arb_key};
        use proptest::prelude::*;

        proptest! {
            /// Property: unmatched keys are exactly input keys minus output keys
            #[test]
            fn proptest_unmatched_is_input_minus_output(
                input in arb_flat_parameters(),
                declared in prop::collection::vec(arb_key(), 0..6),
            ) {
                let config = Config::default();
                let declarations: Vec<Declaration> =
                    declared.iter().map(|k| Declaration::scalar(k.as_str())).collect();

                let mut filter = Filter::new(&input, &config, FilterMode::Default);
                filter.apply(&declarations).unwrap();
                let unmatched = filter.unpermitted_keys();
                let output = filter.finish().unwrap();

                let expected: Vec<String> = input
                    .keys()
                    .filter(|k| !output.contains_key(k) && !config.is_never_unpermitted(k))
                    .map(str::to_string)
                    .collect();
                prop_assert_eq!(unmatched, expected);
            }

            /// Property: an array of mappings keeps order and length under a nested declaration
            #[test]
            fn proptest_array_of_mappings_keeps_shape(
                names in prop::collection::vec("[a-z]{1,8}", 1..8),
            ) {
                let authors: Vec<Value> = names
                    .iter()
                    .map(|n| Value::from([("name", n.as_str()), ("born", "1564")]
                        .into_iter()
                        .collect::<Parameters>()))
                    .collect();
                let mut input = Parameters::new();
                input.insert("authors", Value::Array(authors));

                let output = input
                    .permit_with(&[Declaration::nested("authors", ["name"])], &Config::default())
                    .unwrap();

                let kept = output.get("authors").and_then(Value::as_array).unwrap();
                prop_assert_eq!(kept.len(), names.len());
                for (element, name) in kept.iter().zip(&names) {
                    let element = element.as_params().unwrap();
                    prop_assert_eq!(element.get("name"), Some(&Value::from(name.as_str())));
                    prop_assert!(!element.contains_key("born"));
                    prop_assert!(element.is_permitted());
                }
            }
        }
    }
}
