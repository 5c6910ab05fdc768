//! Directory-backed provider: one file per execution unit.
//!
//! Unit `k` lives in `<dir>/<k>.jsonl` or `<dir>/<k>.log`; the JSONL file wins
//! when both exist.

use crate::model::{LogLine, ProviderError, SectionKey};
use crate::parser;
use crate::source::LogProvider;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File extensions recognised as unit logs, in lookup order.
const UNIT_EXTENSIONS: [&str; 2] = ["jsonl", "log"];

/// Serves units from `<root>/<key>.jsonl` or `<root>/<key>.log`.
#[derive(Debug, Clone)]
pub struct DirectoryProvider {
    root: PathBuf,
}

impl DirectoryProvider {
    /// Provider rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the units are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Candidate files for a unit. Keys that would escape the directory have none.
    fn candidates(&self, key: &SectionKey) -> Vec<PathBuf> {
        let raw = key.as_str();
        if raw.contains(['/', '\\']) || raw == "." || raw == ".." {
            return Vec::new();
        }
        UNIT_EXTENSIONS
            .iter()
            .map(|ext| self.root.join(format!("{raw}.{ext}")))
            .collect()
    }
}

#[async_trait]
impl LogProvider for DirectoryProvider {
    async fn fetch(&self, key: &SectionKey) -> Result<Vec<LogLine>, ProviderError> {
        for path in self.candidates(key) {
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(source) => {
                    return Err(ProviderError::Io {
                        key: key.clone(),
                        path,
                        source,
                    })
                }
            };

            let text = String::from_utf8_lossy(&bytes);
            let parsed = parser::parse_log(&text);
            if parsed.malformed > 0 {
                warn!(
                    key = %key,
                    path = %path.display(),
                    malformed = parsed.malformed,
                    "Kept malformed log records as plain text"
                );
            }
            debug!(key = %key, lines = parsed.lines.len(), "Read unit log");
            return Ok(parsed.lines);
        }

        Err(ProviderError::NotFound { key: key.clone() })
    }
}

/// Unit keys found in `dir`, sorted by name.
///
/// Files without a recognised extension, and subdirectories, are skipped.
///
/// # Errors
///
/// Returns `ProviderError::Discovery` if the directory cannot be listed.
pub async fn discover_units(dir: &Path) -> Result<Vec<SectionKey>, ProviderError> {
    let discovery_error = |source| ProviderError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(discovery_error)?;
    let mut stems = BTreeSet::new();

    while let Some(entry) = entries.next_entry().await.map_err(discovery_error)? {
        let file_type = entry.file_type().await.map_err(discovery_error)?;
        if !file_type.is_file() {
            continue;
        }
        let path = entry.path();
        let recognised = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| UNIT_EXTENSIONS.contains(&ext));
        if !recognised {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            stems.insert(stem.to_string());
        }
    }

    Ok(stems
        .into_iter()
        .filter_map(|stem| SectionKey::new(stem).ok())
        .collect())
}
