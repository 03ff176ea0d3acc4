//! On-disk snapshots of raw match batches.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument};

use super::types::Match;
use crate::error::SnapshotError;

static SNAPSHOT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,128}$").expect("valid regex"));

const EXTENSION: &str = "json";

/// Stores match batches as JSON files in one directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a snapshot name, accepting an optional `.json` suffix.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, SnapshotError> {
        let stem = name.strip_suffix(".json").unwrap_or(name);
        if !SNAPSHOT_NAME.is_match(stem) {
            return Err(SnapshotError::InvalidName(name.to_string()));
        }
        Ok(self.dir.join(format!("{stem}.{EXTENSION}")))
    }

    /// Write a batch, replacing any snapshot with the same name.
    #[instrument(skip(self, matches), fields(count = matches.len()))]
    pub async fn save(&self, name: &str, matches: &[Match]) -> Result<PathBuf, SnapshotError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.dir).await?;

        let json = serde_json::to_vec_pretty(matches)?;
        tokio::fs::write(&path, json).await?;

        debug!(path = %path.display(), "Snapshot saved");
        Ok(path)
    }

    /// Read a batch back.
    #[instrument(skip(self))]
    pub async fn load(&self, name: &str) -> Result<Vec<Match>, SnapshotError> {
        let path = self.path_for(name)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(SnapshotError::NotFound(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let matches: Vec<Match> = serde_json::from_slice(&bytes)?;
        debug!(count = matches.len(), "Snapshot loaded");
        Ok(matches)
    }

    /// Stored snapshot names, sorted. A missing directory lists as empty.
    pub async fn list(&self) -> Result<Vec<String>, SnapshotError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if SNAPSHOT_NAME.is_match(stem) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }
}
