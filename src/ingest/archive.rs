//! Moving loaded files from the `raw` tree to the `archive` tree

use std::fs;
use std::path::{Component, Path, PathBuf};

use super::error::IngestError;

/// Archive location of a raw file
///
/// The innermost directory named `raw` is replaced with `archive`, so
/// `raw` directories further up the tree are left alone. Returns `None`
/// for files outside a `raw` tree.
pub fn archive_path(path: &Path) -> Option<PathBuf> {
    let file_name = path.file_name()?;
    let dirs: Vec<Component> = path.parent()?.components().collect();
    let index = dirs.iter().rposition(|c| c.as_os_str() == "raw")?;

    let mut archived = PathBuf::new();
    for (i, component) in dirs.iter().enumerate() {
        if i == index {
            archived.push("archive");
        } else {
            archived.push(component);
        }
    }
    archived.push(file_name);
    Some(archived)
}

/// Move a file to its archive location, replacing any previous copy
///
/// Returns the new location, or `None` when the file is not under a `raw`
/// tree and was left in place.
pub fn archive_file(path: &Path) -> Result<Option<PathBuf>, IngestError> {
    let Some(target) = archive_path(path) else {
        tracing::warn!("{} is not under a raw directory, leaving in place", path.display());
        return Ok(None);
    };

    let wrap = |error| IngestError::Archive {
        path: path.to_path_buf(),
        error,
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    if target.exists() {
        fs::remove_file(&target).map_err(wrap)?;
    }
    fs::rename(path, &target).map_err(wrap)?;

    tracing::info!("Archived {} to {}", path.display(), target.display());
    Ok(Some(target))
}
