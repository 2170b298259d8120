//! Audit sink
//!
//! Client events and logins are written as one JSON object per line to the
//! operational log stream (stdout in production). Nothing is buffered or
//! persisted; a record exists only once it has been written. A client event
//! that cannot be written fails its request; a login record is best-effort.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{SecondsFormat, Utc};
use kubegate_common::LogEvent;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct AuditSink {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl AuditSink {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    /// Record an event posted by `caller`, stamped with the current time.
    ///
    /// The record is on the stream once this returns `Ok`; a failed write is
    /// returned to the caller.
    pub fn emit(&self, event: &LogEvent, caller: &str) -> io::Result<()> {
        debug!(caller, level = %event.level, "Recording client event");
        self.write(&json!({
            "ts": now(),
            "caller": caller,
            "ui_log": event,
        }))
        .map_err(|e| {
            error!("Failed to write audit record: {}", e);
            e
        })
    }

    /// Record a successful login. Best-effort: a failed write is only logged.
    pub fn login(&self, user: &str) {
        let record = json!({
            "ts": now(),
            "event": "login",
            "user": user,
        });
        if let Err(e) = self.write(&record) {
            warn!("Failed to write login record for {}: {}", user, e);
        }
    }

    fn write(&self, record: &Value) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(writer, "{}", record)?;
        writer.flush()
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
