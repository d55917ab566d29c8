//! Saved policy text on disk.
//!
//! One UTF-8 file per site, `<name>_privacy_policy.txt`, in a flat directory.

use chrono::{DateTime, Utc};
use policylens_core::{AppError, AppResult};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const FILE_SUFFIX: &str = "_privacy_policy.txt";

/// A policy artifact found in the store.
#[derive(Debug, Clone, Serialize)]
pub struct SavedPolicy {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct PolicyStore {
    dir: PathBuf,
}

/// Keep names usable as file names on every platform.
///
/// Not injective: `a:b` and `a_b` share a file, and the later save wins.
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

/// Logical name encoded in an artifact path, if it is one.
pub fn name_from_path(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|f| f.to_str())
        .and_then(|f| f.strip_suffix(FILE_SUFFIX))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

impl PolicyStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}{}", sanitize(name), FILE_SUFFIX))
    }

    /// Write policy text, replacing any earlier copy.
    ///
    /// Names that sanitize to the same file name replace each other.
    pub fn save(&self, name: &str, text: &str) -> AppResult<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            AppError::Storage(format!("Failed to create {:?}: {}", self.dir, e))
        })?;

        let path = self.path_for(name);
        if path.exists() {
            tracing::warn!("Replacing saved policy {:?} with '{}'", path, name);
        }
        fs::write(&path, text)
            .map_err(|e| AppError::Storage(format!("Failed to write {:?}: {}", path, e)))?;

        tracing::info!("Saved policy for '{}' to {:?}", name, path);
        Ok(path)
    }

    /// Text saved under `name`.
    pub fn load(&self, name: &str) -> AppResult<String> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(AppError::Storage(format!(
                "No saved policy named '{}' in {:?}",
                name, self.dir
            )));
        }
        read_text(&path)
    }

    /// Every saved policy, sorted by name. A missing directory is empty.
    pub fn list(&self) -> AppResult<Vec<SavedPolicy>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut saved = Vec::new();
        for entry in WalkDir::new(&self.dir)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = name_from_path(entry.path()) else {
                continue;
            };

            let metadata = entry.metadata().map_err(|e| {
                AppError::Storage(format!("Failed to stat {:?}: {}", entry.path(), e))
            })?;

            saved.push(SavedPolicy {
                name,
                path: entry.path().to_path_buf(),
                size_bytes: metadata.len(),
                saved_at: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        saved.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(saved)
    }
}

/// Read a policy file from anywhere on disk.
pub fn read_text(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .map_err(|e| AppError::Storage(format!("Failed to read {:?}: {}", path, e)))
}
