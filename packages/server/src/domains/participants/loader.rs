use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Marker prefixed to display names of withdrawn participants.
const CANCELLED_MARKER: &str = "[cancelled] ";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed row in {path}: {source}")]
    Row {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// One row of `<year>.csv`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ParticipantRow {
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub ticket_class: String,
    /// Comma separated ("A, B, C"); empty for solo entries.
    #[serde(default)]
    pub members: String,
    #[serde(rename = "iso_code", default)]
    pub country_code: String,
}

impl ParticipantRow {
    /// Display name without the withdrawal marker.
    pub fn name(&self) -> &str {
        self.display_name
            .strip_prefix(CANCELLED_MARKER)
            .unwrap_or(&self.display_name)
    }

    pub fn is_cancelled(&self) -> bool {
        self.display_name.starts_with(CANCELLED_MARKER)
    }

    /// Team member names, in listed order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members
            .split(", ")
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Load `<dir>/<year>.csv`.
///
/// A season without a file is empty, not an error: new seasons are announced
/// before their participant list exists.
pub fn load_season(dir: &Path, year: i32) -> Result<Vec<ParticipantRow>, DatasetError> {
    let path = dir.join(format!("{}.csv", year));
    if !path.exists() {
        tracing::warn!(year, path = %path.display(), "No participant dataset for season");
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(&path)
        .map_err(|source| DatasetError::Open {
            path: path.clone(),
            source,
        })?;

    let mut rows = Vec::new();
    for row in reader.deserialize::<ParticipantRow>() {
        rows.push(row.map_err(|source| DatasetError::Row {
            path: path.clone(),
            source,
        })?);
    }

    tracing::debug!(year, rows = rows.len(), "Loaded participant dataset");
    Ok(rows)
}
