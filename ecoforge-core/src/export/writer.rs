use crate::error::EcoforgeError;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// A rendered output file, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub file_name: &'static str,
    pub content: String,
}

/// Writes to a temporary file in the target directory, then renames it over `path`.
pub fn write_atomic(path: &Path, content: &str) -> Result<(), EcoforgeError> {
    let io_error = |e: io::Error| EcoforgeError::FileIO(path.display().to_string(), e);
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(io_error)?;
    file.write_all(content.as_bytes()).map_err(io_error)?;
    file.as_file().sync_all().map_err(io_error)?;
    file.persist(path).map_err(|e| io_error(e.error))?;
    Ok(())
}

/// Writes every artifact into `dir`, creating it when needed.
pub fn write_artifacts(dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, EcoforgeError> {
    fs::create_dir_all(dir).map_err(|e| EcoforgeError::FileIO(dir.display().to_string(), e))?;
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = dir.join(artifact.file_name);
        write_atomic(&path, &artifact.content)?;
        info!(path = %path.display(), bytes = artifact.content.len(), "artifact written");
        written.push(path);
    }
    Ok(written)
}
