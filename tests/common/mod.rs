//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value as Json;
use strong_params::{Config, NotificationLog, Parameters, UnpermittedAction};

/// Builds unpermitted parameters from a JSON literal.
pub fn params(json: Json) -> Parameters {
    Parameters::from_json(json).expect("test input is a JSON object")
}

/// A config that logs unpermitted parameters into the returned log.
pub fn logging(config: Config) -> (Config, Arc<NotificationLog>) {
    let log = Arc::new(NotificationLog::new());
    let config = config
        .with_unpermitted_action(UnpermittedAction::Log)
        .with_notifier(log.clone());
    (config, log)
}

/// Follows a path of keys through nested parameters.
pub fn dig<'a>(params: &'a Parameters, path: &[&str]) -> &'a strong_params::Value {
    let (last, parents) = path.split_last().expect("path is not empty");
    let mut current = params;
    for key in parents {
        current = current
            .get(key)
            .and_then(strong_params::Value::as_params)
            .unwrap_or_else(|| panic!("`{key}` holds nested parameters"));
    }
    current
        .get(last)
        .unwrap_or_else(|| panic!("`{last}` is present"))
}

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a debug-level fmt subscriber and returns what it printed.
pub fn capture_logs<F: FnOnce()>(f: F) -> String {
    let capture = Capture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);

    let bytes = capture.0.lock().unwrap().clone();
    String::from_utf8(bytes).expect("log output is UTF-8")
}
