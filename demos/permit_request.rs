//! Request filtering demonstration.
//!
//! This example walks one decoded request body through the crate:
//! 1. Decode the body into unpermitted parameters
//! 2. Require the `book` subtree
//! 3. Permit only the declared keys, logging the rest
//! 4. Hand the permitted attributes to a mass-assignment check
//!
//! Run with: `cargo run --example permit_request`

use std::sync::Arc;

use serde_json::json;
use strong_params::{
    sanitize_for_mass_assignment_with, Config, Declaration, Error, NotificationLog, Parameters,
    UnpermittedAction, Value,
};

/// Simulates decoding a JSON request body
fn decode_body() -> Result<Parameters, Error> {
    Parameters::from_json(json!({
        "controller": "books",
        "action": "create",
        "book": {
            "title": "Romeo and Juliet",
            "price": 12,
            "authors_attributes": {
                "0": { "name": "William Shakespeare", "born": "1564-04-26" },
                "1": { "name": "Christopher Marlowe" }
            },
            "admin": true
        },
        "magazine": "Mjallo!"
    }))
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Request Filtering Demo ===\n");

    let log = Arc::new(NotificationLog::new());
    let config = Config::default()
        .with_unpermitted_action(UnpermittedAction::Log)
        .with_notifier(log.clone());

    let params = decode_body()?;
    println!("1. Decoded {} top-level keys (permitted: {})", params.len(), params.is_permitted());

    let book = params
        .require_with("book", &config)?
        .and_then(Value::as_params)
        .ok_or_else(|| Error::missing("book"))?;
    println!("2. Required `book` with {} keys", book.len());

    let declarations = Declaration::parse(&json!([
        "title",
        "price",
        { "authors_attributes": ["name"] }
    ]))?;
    let permitted = book.permit_with(&declarations, &config)?;
    println!("3. Permitted keys: {:?}", permitted.keys().collect::<Vec<_>>());
    println!("   Rejected keys:  {:?}", log.unpermitted_keys());

    match sanitize_for_mass_assignment_with(book, &config) {
        Ok(_) => println!("4. Raw book accepted (unexpected)"),
        Err(err) => println!("4. Raw book refused: {err}"),
    }
    let attributes = sanitize_for_mass_assignment_with(&permitted, &config)?;
    println!("   Permitted book accepted with {} attributes", attributes.len());

    Ok(())
}
