//! Errors raised while loading, parsing, or generating a timetable.
//!
//! Everything downstream of ingestion is infallible: a missing day or hour
//! is a standby slot, not an error.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimetableError>;

#[derive(Debug, Error)]
pub enum TimetableError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("timetable is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to fetch timetable: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("timetable server returned status {status}")]
    Status { status: u16 },

    #[error("unknown day name {0:?}")]
    UnknownDay(String),

    #[error("malformed hour key {0:?} (expected \"HH:00\")")]
    BadHourKey(String),

    #[error("malformed CSV row {line} in {file}: {reason}")]
    CsvRow {
        file: String,
        line: usize,
        reason: String,
    },
}

impl TimetableError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
