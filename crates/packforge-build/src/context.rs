use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Packs a build-context directory into a gzip-compressed tar, the form the
/// Docker Engine build endpoint accepts. Entry paths are relative to `dir`;
/// symlinks are stored as links.
pub fn archive_context(dir: &Path) -> Result<Vec<u8>, ContextError> {
    if !dir.is_dir() {
        return Err(ContextError::NotADirectory(dir.to_path_buf()));
    }

    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.follow_symlinks(false);

    builder
        .append_dir_all(".", dir)
        .map_err(|e| ContextError::Append {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let encoder = builder.into_inner().map_err(|e| ContextError::Finish {
        path: dir.to_path_buf(),
        source: e,
    })?;
    let bytes = encoder.finish().map_err(|e| ContextError::Finish {
        path: dir.to_path_buf(),
        source: e,
    })?;

    tracing::debug!(path = %dir.display(), bytes = bytes.len(), "build context archived");
    Ok(bytes)
}

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("build context {0} is not a directory")]
    NotADirectory(PathBuf),
    #[error("failed to add {path} to the build context archive")]
    Append {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to finish the build context archive for {path}")]
    Finish {
        path: PathBuf,
        source: std::io::Error,
    },
}
