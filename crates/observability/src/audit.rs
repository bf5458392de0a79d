//! Append-only audit trail.
//!
//! One JSON object per line:
//! `{"time": RFC3339, "level": "info"|"error"|"success", "msg": ..., <payload>}`.
//! Appends are serialized through a mutex around the file handle. Each append
//! is one small `write_all` on a file opened in append mode, so callers on
//! async handlers hold the lock only for that write.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use ::tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditLevel {
    Info,
    Error,
    Success,
}

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("cannot open audit log {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot append to audit log {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot encode audit event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    pub time: DateTime<Utc>,
    pub level: AuditLevel,
    pub msg: String,
    pub payload: Map<String, Value>,
}

impl AuditEvent {
    pub fn new(level: AuditLevel, msg: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            msg: msg.into(),
            payload: Map::new(),
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self::new(AuditLevel::Info, msg)
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::new(AuditLevel::Error, msg)
    }

    pub fn success(msg: impl Into<String>) -> Self {
        Self::new(AuditLevel::Success, msg)
    }

    /// Attach a payload field. Values that fail to serialize are recorded as null.
    pub fn with(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.payload.insert(key.into(), value);
        self
    }

    /// The JSON line for this event. Payload keys never shadow the envelope.
    pub fn to_line(&self) -> Result<String, AuditError> {
        let mut obj = self.payload.clone();
        obj.insert(
            "time".into(),
            Value::String(self.time.to_rfc3339_opts(SecondsFormat::Secs, true)),
        );
        obj.insert("level".into(), serde_json::to_value(self.level)?);
        obj.insert("msg".into(), Value::String(self.msg.clone()));
        Ok(serde_json::to_string(&Value::Object(obj))?)
    }
}

/// Where audit events go.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;
}

impl<S> AuditSink for std::sync::Arc<S>
where
    S: AuditSink + ?Sized,
{
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        (**self).record(event)
    }
}

/// JSON-lines file sink.
#[derive(Debug)]
pub struct JsonlAuditLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditLog {
    /// Open (or create) the log for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| AuditError::Open {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "audit log opened");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for JsonlAuditLog {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut line = event.to_line()?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(|e| {
            warn!(path = %self.path.display(), "audit log lock poisoned; continuing");
            e.into_inner()
        });
        file.write_all(line.as_bytes()).map_err(|source| AuditError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

/// Collects events in memory (tests/dev).
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
        Ok(())
    }
}
