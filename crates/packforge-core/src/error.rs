use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    // ── Path resolution ──
    #[error("failed to resolve tools directory {path}")]
    ToolsDirResolve {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("tools directory {0} has no parent; cannot locate the repository root")]
    NoRepoRoot(PathBuf),

    #[error("failed to create output directory {path}")]
    OutputDirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{0} not found next to the Dockerfile; nothing to run inside the container")]
    MissingPackagingScript(PathBuf),
}
