//! Persisting cleaned datasets.
//!
//! Files are written atomically: the CSV goes to a sibling temp file which is
//! then renamed over the destination, so a reader never sees half a file.

use crate::config::CleaningConfig;
use crate::error::{CleaningError, Result, ResultExt};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Where [`DatasetWriter::save_unique`] put a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDataset {
    /// Generated identifier, the prefix of the file name.
    pub file_id: String,
    pub path: PathBuf,
}

impl SavedDataset {
    /// File name without its directory, e.g. `3f2a..._cleaned.csv`.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Writes datasets to disk as CSV with a header row.
pub struct DatasetWriter;

impl DatasetWriter {
    /// Save a DataFrame to `path`, creating parent directories.
    ///
    /// Returns the path written.
    pub fn save(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let rows = df.height();
        write_atomic(path, |writer| {
            CsvWriter::new(writer)
                .include_header(true)
                .finish(df)
                .context("Failed to serialize dataset as CSV")
        })?;

        info!("Saved {} rows to {}", rows, path.display());
        Ok(path.to_path_buf())
    }

    /// Save CSV text verbatim to `path`.
    pub fn save_csv_text(data: &str, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        write_atomic(path, |writer| {
            writer
                .write_all(data.as_bytes())
                .context(format!("Failed to write {}", path.display()))
        })?;

        info!("Saved CSV text to {}", path.display());
        Ok(path.to_path_buf())
    }

    /// Save under a fresh name `<dir>/<uuid>_<suffix>.csv`.
    pub fn save_unique(
        df: &mut DataFrame,
        dir: impl AsRef<Path>,
        suffix: &str,
    ) -> Result<SavedDataset> {
        let file_id = Uuid::new_v4().to_string();
        let path = dir.as_ref().join(format!("{}_{}.csv", file_id, suffix));
        let path = Self::save(df, path)?;
        Ok(SavedDataset { file_id, path })
    }
}

pub(crate) fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<fs::File>) -> Result<()>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .context(format!("Failed to create directory {}", parent.display()))?;
    }

    let tmp_path = path.with_extension(format!("tmp-{}", Uuid::new_v4()));
    let result = fs::File::create(&tmp_path)
        .context(format!("Failed to create {}", tmp_path.display()))
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer
                .flush()
                .context(format!("Failed to flush {}", tmp_path.display()))
        })
        .and_then(|()| {
            fs::rename(&tmp_path, path).context(format!(
                "Failed to rename {} to {}",
                tmp_path.display(),
                path.display()
            ))
        });

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

/// Restricts save destinations to a set of allowed directories.
#[derive(Debug, Clone)]
pub struct PathGuard {
    allowed: Vec<PathBuf>,
}

impl PathGuard {
    pub fn new<I, P>(dirs: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let allowed = dirs
            .into_iter()
            .map(|dir| normalize(dir.as_ref()))
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to resolve allowed directories")?;
        Ok(Self { allowed })
    }

    /// Guard allowing the configured uploads and results directories.
    pub fn from_config(config: &CleaningConfig) -> Result<Self> {
        Self::new([&config.uploads_dir, &config.results_dir])
    }

    /// Resolve `path` and check it lies inside an allowed directory.
    pub fn check(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let path = path.as_ref();
        let resolved = normalize(path).context(format!("Failed to resolve {}", path.display()))?;

        if self.allowed.iter().any(|dir| resolved.starts_with(dir)) {
            debug!("Path {} allowed", resolved.display());
            Ok(resolved)
        } else {
            Err(CleaningError::PathNotAllowed(path.to_path_buf()))
        }
    }
}

/// Absolute form of `path` with `.`/`..` removed and symlinks resolved on
/// the part that already exists.
fn normalize(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut lexical = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                lexical.pop();
            }
            Component::CurDir => {}
            other => lexical.push(other),
        }
    }

    let mut existing = lexical.as_path();
    let mut rest = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name.to_os_string());
                existing = parent;
            }
            _ => return Ok(lexical),
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in rest.iter().rev() {
        resolved.push(name);
    }
    Ok(resolved)
}
