//! Timetable source: fetch the document once per session and parse it.

use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, TimetableError};
use crate::schedule::Schedule;

/// Where the document lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimetableSource {
    Url(String),
    File(PathBuf),
}

impl TimetableSource {
    /// `http://` and `https://` are URLs; anything else is a path.
    pub fn parse(source: &str) -> Self {
        let source = source.trim();
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Url(source.to_string())
        } else {
            Self::File(PathBuf::from(source))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Url(url) => url.clone(),
            Self::File(path) => path.display().to_string(),
        }
    }
}

pub async fn load(source: &TimetableSource) -> Result<Schedule> {
    let schedule = match source {
        TimetableSource::Url(url) => fetch_url(url).await?,
        TimetableSource::File(path) => load_file(path).await?,
    };
    info!(
        "Loaded timetable from {} ({} airing slots)",
        source.describe(),
        schedule.airing_slots()
    );
    Ok(schedule)
}

pub async fn load_file(path: &Path) -> Result<Schedule> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| TimetableError::io(path, e))?;
    Schedule::from_json_str(&content)
}

async fn fetch_url(url: &str) -> Result<Schedule> {
    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(TimetableError::Status {
            status: response.status().as_u16(),
        });
    }
    let text = response.text().await?;
    Schedule::from_json_str(&text)
}
