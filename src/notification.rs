//! Fire-and-forget notifications about missing, unpermitted and forbidden
//! parameters.
//!
//! Every notification is emitted as a structured `tracing` event under the
//! `strong_params` target. A [`NotificationSink`] configured on
//! [`Config`](crate::Config) receives it as well; [`NotificationLog`] is an
//! in-memory sink for tests and diagnostics.

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Something worth telling the host application about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A required key was absent or blank and the policy is to log.
    MissingParameter {
        /// The required key
        key: String,
    },
    /// Input keys at one nesting level had no matching declaration.
    UnpermittedParameters {
        /// Unmatched keys, in input order
        keys: Vec<String>,
    },
    /// Unfiltered parameters reached mass assignment and the policy is to log.
    ForbiddenAttributes,
}

impl Notification {
    /// Stable event name, used as the `event` field of the tracing event.
    pub fn name(&self) -> &'static str {
        match self {
            Notification::MissingParameter { .. } => "missing_parameter",
            Notification::UnpermittedParameters { .. } => "unpermitted_parameters",
            Notification::ForbiddenAttributes => "forbidden_attributes",
        }
    }

    /// Emits this notification as a `tracing` debug event.
    pub fn emit(&self) {
        match self {
            Notification::MissingParameter { key } => {
                tracing::debug!(target: "strong_params", event = self.name(), key = %key, "{}", self);
            }
            Notification::UnpermittedParameters { keys } => {
                tracing::debug!(target: "strong_params", event = self.name(), keys = ?keys, "{}", self);
            }
            Notification::ForbiddenAttributes => {
                tracing::debug!(target: "strong_params", event = self.name(), "{}", self);
            }
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::MissingParameter { key } => write!(f, "Missing parameter: {}", key),
            Notification::UnpermittedParameters { keys } => {
                write!(f, "Unpermitted parameters: {}", keys.join(", "))
            }
            Notification::ForbiddenAttributes => write!(f, "Forbidden attributes"),
        }
    }
}

/// Receives notifications.
///
/// Implementations must not block for long or fail: notifications are
/// delivered synchronously from inside `permit` and `require`.
pub trait NotificationSink: fmt::Debug + Send + Sync {
    /// Handles one notification.
    fn notify(&self, notification: &Notification);
}

/// In-memory notification recorder.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strong_params::{Config, MissingParameterAction, Notification, NotificationLog, Parameters};
///
/// let log = Arc::new(NotificationLog::new());
/// let config = Config::default()
///     .with_missing_parameter_action(MissingParameterAction::Log)
///     .with_notifier(log.clone());
///
/// Parameters::new().require_with("book", &config).unwrap();
///
/// assert_eq!(
///     log.notifications(),
///     vec![Notification::MissingParameter { key: "book".to_string() }]
/// );
/// ```
#[derive(Debug, Default)]
pub struct NotificationLog {
    notifications: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded notifications, oldest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    /// Returns the keys of every recorded `UnpermittedParameters`
    /// notification, flattened in recording order.
    pub fn unpermitted_keys(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|n| match n {
                Notification::UnpermittedParameters { keys } => Some(keys.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Returns the number of recorded notifications.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clears all recorded notifications.
    pub fn clear(&self) {
        self.lock().clear();
    }

    // A panic while recording cannot leave the vector half-written.
    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for NotificationLog {
    fn notify(&self, notification: &Notification) {
        self.lock().push(notification.clone());
    }
}
