//! The boundary to mass-assignment collaborators.
//!
//! A persistence layer that accepts whole attribute maps should refuse maps
//! that never went through filtering. It only needs one bit of information
//! for that, exposed through [`Trust`].

use std::collections::{BTreeMap, HashMap};

use crate::config::{Config, ForbiddenAttributesAction};
use crate::notification::Notification;
use crate::{Error, Parameters};

/// Answers whether a source of attributes may be bulk-assigned.
pub trait Trust {
    /// Returns `false` only for attribute sources that carry a trust flag
    /// and have not been permitted.
    fn is_permitted(&self) -> bool;
}

impl Trust for Parameters {
    fn is_permitted(&self) -> bool {
        Parameters::is_permitted(self)
    }
}

// Plain maps never came from request decoding.
impl<K, V, S> Trust for HashMap<K, V, S> {
    fn is_permitted(&self) -> bool {
        true
    }
}

impl<K, V> Trust for BTreeMap<K, V> {
    fn is_permitted(&self) -> bool {
        true
    }
}

impl<T: Trust + ?Sized> Trust for &T {
    fn is_permitted(&self) -> bool {
        (**self).is_permitted()
    }
}

/// Checks `attributes` before a mass assignment, using the process-wide
/// configuration.
///
/// See [`sanitize_for_mass_assignment_with`].
pub fn sanitize_for_mass_assignment<T: Trust + ?Sized>(attributes: &T) -> Result<&T, Error> {
    sanitize_for_mass_assignment_with(attributes, Config::global())
}

/// Checks `attributes` before a mass assignment.
///
/// Unpermitted attributes fail under [`ForbiddenAttributesAction::Raise`];
/// under [`ForbiddenAttributesAction::Log`] a `forbidden_attributes`
/// notification is emitted and the attributes are handed back anyway.
///
/// # Errors
///
/// Returns [`Error::ForbiddenAttributes`] for unpermitted attributes under
/// the `Raise` policy.
///
/// # Examples
///
/// ```
/// use strong_params::{sanitize_for_mass_assignment_with, Config, Declaration, Error, Parameters};
/// use serde_json::json;
///
/// let config = Config::default();
/// let params = Parameters::from_json(json!({ "a": "b" })).unwrap();
///
/// assert_eq!(
///     sanitize_for_mass_assignment_with(&params, &config).unwrap_err(),
///     Error::ForbiddenAttributes
/// );
///
/// let permitted = params.permit_with(&[Declaration::scalar("a")], &config).unwrap();
/// assert!(sanitize_for_mass_assignment_with(&permitted, &config).is_ok());
/// ```
pub fn sanitize_for_mass_assignment_with<'a, T: Trust + ?Sized>(
    attributes: &'a T,
    config: &Config,
) -> Result<&'a T, Error> {
    if !attributes.is_permitted() {
        match config.action_on_forbidden_attributes {
            ForbiddenAttributesAction::Log => config.notify(&Notification::ForbiddenAttributes),
            ForbiddenAttributesAction::Raise => return Err(Error::ForbiddenAttributes),
        }
    }
    Ok(attributes)
}
