//! Raw file discovery and reading

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::error::IngestError;

/// A discovered file to load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

/// A file read from disk and parsed
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Parent directory, stored as the raw row's `file_path`
    pub file_path: String,
    pub file_name: String,
    pub size: u64,
    /// Hex SHA-256 of the content
    pub content_hash: String,
    pub document: serde_json::Value,
}

impl SourceFile {
    /// `file_path/file_name`, as recorded in the raw table
    pub fn source_path(&self) -> String {
        if self.file_path.is_empty() {
            self.file_name.clone()
        } else {
            format!("{}/{}", self.file_path, self.file_name)
        }
    }
}

/// Hex SHA-256 of file content
pub fn content_hash(content: &[u8]) -> String {
    format!("{:x}", Sha256::digest(content))
}

/// Discover files matching a glob pattern below `base_path`
///
/// When `base_path` names a file, its directory is searched instead. Results
/// are sorted by path.
pub fn discover_files(base_path: &Path, pattern: &str) -> Result<Vec<DiscoveredFile>, IngestError> {
    if !base_path.exists() {
        return Err(IngestError::SourceNotFound(base_path.to_path_buf()));
    }
    let base = if base_path.is_file() {
        base_path.parent().unwrap_or(Path::new("."))
    } else {
        base_path
    };

    let full_pattern = format!("{}/{}", base.display(), pattern);
    let entries = glob::glob(&full_pattern)
        .map_err(|e| IngestError::InvalidPattern(format!("{}: {}", pattern, e)))?;

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    let metadata = fs::metadata(&path)?;
                    files.push(DiscoveredFile {
                        path,
                        size: metadata.len(),
                    });
                }
            }
            Err(e) => {
                tracing::warn!("Error accessing path: {}", e);
            }
        }
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

/// Read, hash and parse a JSON file
pub fn read_file(path: &Path) -> Result<SourceFile, IngestError> {
    let content = fs::read(path)?;
    let document: serde_json::Value =
        serde_json::from_slice(&content).map_err(|e| IngestError::JsonParse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

    let file_path = path
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SourceFile {
        path: path.to_path_buf(),
        file_path,
        file_name,
        size: content.len() as u64,
        content_hash: content_hash(&content),
        document,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discover_sorted_and_recursive() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("2024/01")).unwrap();
        fs::write(dir.path().join("b.json"), "[]").unwrap();
        fs::write(dir.path().join("2024/01/a.json"), "[]").unwrap();
        fs::write(dir.path().join("notes.txt"), "skip").unwrap();

        let files = discover_files(dir.path(), "**/*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.json", "b.json"]);
    }

    #[test]
    fn test_discover_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = discover_files(&dir.path().join("absent"), "*.json").unwrap_err();
        assert!(matches!(err, IngestError::SourceNotFound(_)));
    }

    #[test]
    fn test_read_file_splits_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("campsites.json");
        fs::write(&path, r#"[{"assetId": 1}]"#).unwrap();

        let file = read_file(&path).unwrap();
        assert_eq!(file.file_name, "campsites.json");
        assert_eq!(file.file_path, dir.path().display().to_string());
        assert_eq!(file.content_hash.len(), 64);
        assert!(file.document.is_array());
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(read_file(&path), Err(IngestError::JsonParse { .. })));
    }
}
