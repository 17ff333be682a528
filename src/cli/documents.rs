//! Loading plain-text documents from a directory

use crate::error::{RagError, Result};
use std::path::{Path, PathBuf};

/// A loaded text document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub text: String,
}

impl Document {
    /// File name for display
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Load every non-empty `.txt` file directly inside `dir`, sorted by path
///
/// A missing directory is created and yields no documents. Files that cannot
/// be read as UTF-8 are skipped with a warning.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>> {
    if !dir.exists() {
        tracing::warn!("Directory {:?} does not exist, creating it", dir);
        std::fs::create_dir_all(dir).map_err(|e| RagError::Io {
            source: e,
            context: format!("Failed to create directory: {:?}", dir),
        })?;
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| RagError::Io {
        source: e,
        context: format!("Failed to read directory: {:?}", dir),
    })?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    let mut documents = Vec::new();
    for path in paths {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                let text = text.trim();
                if text.is_empty() {
                    tracing::debug!("Skipping empty file {:?}", path);
                    continue;
                }
                tracing::info!("Loaded text file: {:?}", path);
                documents.push(Document {
                    path,
                    text: text.to_string(),
                });
            }
            Err(e) => tracing::warn!("Error loading {:?}: {}", path, e),
        }
    }

    Ok(documents)
}
