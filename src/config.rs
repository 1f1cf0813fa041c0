//! Filtering configuration.
//!
//! A [`Config`] is assembled once, typically at startup, and passed by
//! reference into every operation. Nothing in this crate mutates a `Config`
//! while requests are being processed.

use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::filter::{DefaultFilter, ParameterFilter, TransitionalFilter};
use crate::notification::{Notification, NotificationSink};
use crate::value::ScalarKind;

static GLOBAL: OnceLock<Config> = OnceLock::new();

/// What `require` does when a required key is absent or blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingParameterAction {
    /// Fail with [`Error::ParameterMissing`](crate::Error::ParameterMissing).
    #[default]
    Raise,
    /// Emit a `missing_parameter` notification and return the blank value.
    Log,
}

/// What `permit` does when input keys have no matching declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpermittedAction {
    /// Do nothing.
    Disabled,
    /// Emit one `unpermitted_parameters` notification per filtered level.
    Log,
    /// Fail with [`Error::UnpermittedParameters`](crate::Error::UnpermittedParameters).
    Raise,
}

/// What happens to unmatched keys in the filtered output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnpermittedHandler {
    /// Leave unmatched keys out of the output.
    Filter,
    /// Copy the whole input into the output and only report unmatched keys.
    Passthrough,
}

/// Which built-in filter implementation `permit` uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Enforcing filter.
    #[default]
    Default,
    /// Soft-migration filter: logs and passes through unless told otherwise,
    /// and is stricter about values that do not match their declaration's
    /// shape.
    Transitional,
}

impl FilterMode {
    /// Unpermitted-parameters action used when none is configured.
    pub fn default_unpermitted_action(self) -> UnpermittedAction {
        match self {
            FilterMode::Default => UnpermittedAction::Disabled,
            FilterMode::Transitional => UnpermittedAction::Log,
        }
    }

    /// Unpermitted-parameters handler used when none is configured.
    pub fn default_unpermitted_handler(self) -> UnpermittedHandler {
        match self {
            FilterMode::Default => UnpermittedHandler::Filter,
            FilterMode::Transitional => UnpermittedHandler::Passthrough,
        }
    }
}

/// What the mass-assignment check does with unpermitted parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenAttributesAction {
    /// Fail with [`Error::ForbiddenAttributes`](crate::Error::ForbiddenAttributes).
    #[default]
    Raise,
    /// Emit a `forbidden_attributes` notification and allow the assignment.
    Log,
}

/// The set of scalar kinds a value may have to be accepted by a scalar
/// declaration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ScalarWhitelist {
    kinds: Vec<ScalarKind>,
}

impl ScalarWhitelist {
    /// Creates a whitelist accepting exactly `kinds`.
    pub fn new(kinds: impl IntoIterator<Item = ScalarKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Returns `true` if `kind` is whitelisted.
    pub fn contains(&self, kind: ScalarKind) -> bool {
        self.kinds.contains(&kind)
    }
}

impl Default for ScalarWhitelist {
    fn default() -> Self {
        Self::new(ScalarKind::ALL)
    }
}

/// Configuration for requiring, filtering and assigning parameters.
///
/// # Examples
///
/// ```
/// use strong_params::{Config, FilterMode, UnpermittedAction, UnpermittedHandler};
///
/// let config = Config::default().with_unpermitted_action(UnpermittedAction::Raise);
/// assert_eq!(config.unpermitted_action(), UnpermittedAction::Raise);
/// assert_eq!(config.unpermitted_handler(), UnpermittedHandler::Filter);
///
/// let transitional = Config::default().with_filter_mode(FilterMode::Transitional);
/// assert_eq!(transitional.unpermitted_action(), UnpermittedAction::Log);
/// assert_eq!(transitional.unpermitted_handler(), UnpermittedHandler::Passthrough);
/// ```
///
/// Loading from a serde format:
///
/// ```
/// use strong_params::{Config, MissingParameterAction, UnpermittedAction};
///
/// let config: Config = serde_json::from_str(
///     r#"{ "action_on_missing_parameter": "log", "action_on_unpermitted_parameters": "raise" }"#,
/// )
/// .unwrap();
/// assert_eq!(config.action_on_missing_parameter, MissingParameterAction::Log);
/// assert_eq!(config.unpermitted_action(), UnpermittedAction::Raise);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Policy for blank required keys.
    pub action_on_missing_parameter: MissingParameterAction,
    /// Policy for unmatched keys; `None` uses the filter mode's default.
    pub action_on_unpermitted_parameters: Option<UnpermittedAction>,
    /// Output handling for unmatched keys; `None` uses the filter mode's default.
    pub unpermitted_parameters_handler: Option<UnpermittedHandler>,
    /// Built-in filter implementation.
    pub filter_implementation: FilterMode,
    /// Policy for mass assignment from unpermitted parameters.
    pub action_on_forbidden_attributes: ForbiddenAttributesAction,
    /// Scalar kinds accepted by scalar declarations.
    pub permitted_scalars: ScalarWhitelist,
    /// Keys injected by the host framework that are never reported as
    /// unpermitted.
    pub never_unpermitted: Vec<String>,
    /// Replaces the built-in filter when set.
    #[serde(skip)]
    pub custom_filter: Option<Arc<dyn ParameterFilter>>,
    /// Receives every notification in addition to the tracing event.
    #[serde(skip)]
    pub notifier: Option<Arc<dyn NotificationSink>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            action_on_missing_parameter: MissingParameterAction::default(),
            action_on_unpermitted_parameters: None,
            unpermitted_parameters_handler: None,
            filter_implementation: FilterMode::default(),
            action_on_forbidden_attributes: ForbiddenAttributesAction::default(),
            permitted_scalars: ScalarWhitelist::default(),
            never_unpermitted: vec!["controller".to_string(), "action".to_string()],
            custom_filter: None,
            notifier: None,
        }
    }
}

impl Config {
    /// Installs the process-wide configuration.
    ///
    /// Can only succeed once; a second call hands the rejected configuration
    /// back.
    pub fn install(config: Config) -> Result<(), Config> {
        GLOBAL.set(config)
    }

    /// Returns the process-wide configuration, or the defaults if none was
    /// installed.
    pub fn global() -> &'static Config {
        GLOBAL.get_or_init(Config::default)
    }

    /// Sets the missing-parameter policy.
    pub fn with_missing_parameter_action(mut self, action: MissingParameterAction) -> Self {
        self.action_on_missing_parameter = action;
        self
    }

    /// Sets the unpermitted-parameters policy.
    pub fn with_unpermitted_action(mut self, action: UnpermittedAction) -> Self {
        self.action_on_unpermitted_parameters = Some(action);
        self
    }

    /// Sets the unpermitted-parameters output handling.
    pub fn with_unpermitted_handler(mut self, handler: UnpermittedHandler) -> Self {
        self.unpermitted_parameters_handler = Some(handler);
        self
    }

    /// Selects a built-in filter implementation.
    pub fn with_filter_mode(mut self, mode: FilterMode) -> Self {
        self.filter_implementation = mode;
        self
    }

    /// Replaces the built-in filter.
    pub fn with_custom_filter(mut self, filter: Arc<dyn ParameterFilter>) -> Self {
        self.custom_filter = Some(filter);
        self
    }

    /// Sets the mass-assignment policy.
    pub fn with_forbidden_attributes_action(mut self, action: ForbiddenAttributesAction) -> Self {
        self.action_on_forbidden_attributes = action;
        self
    }

    /// Replaces the scalar whitelist.
    pub fn with_permitted_scalars(mut self, whitelist: ScalarWhitelist) -> Self {
        self.permitted_scalars = whitelist;
        self
    }

    /// Replaces the set of keys never reported as unpermitted.
    pub fn with_never_unpermitted<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.never_unpermitted = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Routes notifications to `sink` as well as to tracing.
    pub fn with_notifier(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(sink);
        self
    }

    /// The effective unpermitted-parameters policy.
    pub fn unpermitted_action(&self) -> UnpermittedAction {
        self.action_on_unpermitted_parameters
            .unwrap_or_else(|| self.filter_implementation.default_unpermitted_action())
    }

    /// The effective unpermitted-parameters output handling.
    pub fn unpermitted_handler(&self) -> UnpermittedHandler {
        self.unpermitted_parameters_handler
            .unwrap_or_else(|| self.filter_implementation.default_unpermitted_handler())
    }

    /// The filter implementation `permit` dispatches to.
    pub fn filter(&self) -> &dyn ParameterFilter {
        match (&self.custom_filter, self.filter_implementation) {
            (Some(custom), _) => custom.as_ref(),
            (None, FilterMode::Default) => &DefaultFilter,
            (None, FilterMode::Transitional) => &TransitionalFilter,
        }
    }

    /// Returns `true` if `key` is reserved by the host framework.
    pub fn is_never_unpermitted(&self, key: &str) -> bool {
        self.never_unpermitted.iter().any(|k| k == key)
    }

    /// Emits `notification` through tracing and the configured sink.
    pub fn notify(&self, notification: &Notification) {
        notification.emit();
        if let Some(sink) = &self.notifier {
            sink.notify(notification);
        }
    }
}
