//! Error types surfaced by the calculators and registries.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a whole calculator call.
#[derive(Debug, Error)]
pub enum UsageError {
    #[error("data directory must be a non-empty path")]
    InvalidDataDirectory,

    #[error("could not find a filesystem containing {}", .0.display())]
    MountNotFound(PathBuf),

    #[error("could not take {what} snapshot: {source}")]
    SnapshotUnavailable {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("no CPU temperature sensor reported a value")]
    SensorUnavailable,
}

impl UsageError {
    pub fn snapshot(what: &'static str, source: io::Error) -> Self {
        UsageError::SnapshotUnavailable { what, source }
    }
}

/// Failure of one per-application lookup. Calculators recover from it by
/// attributing zero to that application.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("lookup for app '{app_id}' failed: {reason}")]
pub struct AppLookupError {
    pub app_id: String,
    pub reason: String,
}

impl AppLookupError {
    pub fn new(app_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            reason: reason.into(),
        }
    }
}
