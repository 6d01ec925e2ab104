//! Core types and configuration for packforge.
//!
//! This crate defines the `packforge.toml` schema ([`PackforgeConfig`]),
//! host-side path resolution ([`ProjectPaths`]), artifact naming
//! ([`Artifact`]), and shared error types.

pub mod artifact;
pub mod config;
pub mod error;
pub mod paths;

pub use artifact::{Artifact, artifact_filename};
pub use config::{
    ContainerConfig, DiagnosticsConfig, PackforgeConfig, ProjectConfig, TimeoutConfig,
};
pub use error::{Error, Result};
pub use paths::{BuildContext, ProjectPaths};

/// Packaging script expected beside the Dockerfile in the tools directory.
pub const PACKAGING_SCRIPT: &str = "bundle_deploy.sh";

/// Build descriptor inside the tools directory.
pub const DOCKERFILE_NAME: &str = "Dockerfile";

/// Host output directory, relative to the repository root.
pub const OUTPUT_DIR_NAME: &str = "build_output";

/// Environment variable carrying the artifact filename into the container.
pub const ARTIFACT_ENV: &str = "ARTIFACT";
