//! Declarative whitelisting of decoded request parameters.
//!
//! Request bodies and query strings arrive as arbitrarily nested, untrusted
//! key/value trees. This crate filters such a tree down to the keys and
//! shapes an application explicitly declared, recursively, and keeps track
//! of which keys were rejected.
//!
//! # Core Types
//!
//! - [`Parameters`]: ordered key/value container carrying a `permitted` flag
//! - [`Value`]: one node of a decoded tree
//! - [`Declaration`]: one item of a whitelist (scalar key, array of scalars,
//!   nested mapping, opaque key)
//! - [`Config`]: policies for missing, unpermitted and forbidden parameters
//! - [`Filter`]: the matching algorithm behind [`Parameters::permit`]
//! - [`Notification`]: events emitted through `tracing` and an optional sink
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use strong_params::{Config, Declaration, NotificationLog, Parameters, UnpermittedAction};
//! use serde_json::json;
//!
//! let log = Arc::new(NotificationLog::new());
//! let config = Config::default()
//!     .with_unpermitted_action(UnpermittedAction::Log)
//!     .with_notifier(log.clone());
//!
//! let params = Parameters::from_json(json!({
//!     "book": {
//!         "title": "Romeo and Juliet",
//!         "authors": [{ "name": "William Shakespeare", "born": "1564-04-26" }]
//!     },
//!     "magazine": "Mjallo!"
//! }))
//! .unwrap();
//!
//! let permitted = params
//!     .permit_with(
//!         &[Declaration::nested(
//!             "book",
//!             [Declaration::from("title"), Declaration::nested("authors", ["name"])],
//!         )],
//!         &config,
//!     )
//!     .unwrap();
//!
//! assert!(permitted.is_permitted());
//! assert!(!permitted.contains_key("magazine"));
//! assert_eq!(log.unpermitted_keys(), vec!["born", "magazine"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod assignment;
mod config;
mod declaration;
mod error;
mod filter;
mod notification;
mod params;
mod value;

#[cfg(test)]
mod test_utils;

pub use assignment::{sanitize_for_mass_assignment, sanitize_for_mass_assignment_with, Trust};
pub use config::{
    Config, FilterMode, ForbiddenAttributesAction, MissingParameterAction, ScalarWhitelist,
    UnpermittedAction, UnpermittedHandler,
};
pub use declaration::Declaration;
pub use error::Error;
pub use filter::{
    indexed_field_base, is_fields_for_collection, DefaultFilter, Filter, ParameterFilter,
    TransitionalFilter,
};
pub use notification::{Notification, NotificationLog, NotificationSink};
pub use params::Parameters;
pub use value::{ScalarKind, Symbol, UploadedFile, Value};
