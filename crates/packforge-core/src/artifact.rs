use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

/// Second resolution. Two runs within the same second produce the same name.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Archive extension written by the container.
pub const ARTIFACT_EXTENSION: &str = "tgz";

/// The archive a packaging run delivers to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub host_path: PathBuf,
}

impl Artifact {
    pub fn new(product: &str, output_dir: &Path, now: DateTime<Utc>) -> Self {
        let filename = artifact_filename(product, now);
        let host_path = output_dir.join(&filename);
        Self {
            filename,
            host_path,
        }
    }

    /// Name the artifact after the current UTC time.
    pub fn generate(product: &str, output_dir: &Path) -> Self {
        Self::new(product, output_dir, Utc::now())
    }
}

/// `<product>_<YYYY-MM-DDTHH-MM-SS>.tgz`
pub fn artifact_filename(product: &str, now: DateTime<Utc>) -> String {
    format!(
        "{product}_{ts}.{ARTIFACT_EXTENSION}",
        ts = now.format(TIMESTAMP_FORMAT)
    )
}
