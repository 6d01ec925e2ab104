//! Packaging command generation and build-context archiving for packforge.
//!
//! # Packaging run
//!
//! ```text
//! packforge
//!   1. Context  ── tar.gz of the tools directory (Dockerfile + bundle_deploy.sh)
//!   2. Build    ── image built from the context, tagged from packforge.toml
//!   3. Command  ── PackagingCommand::standard() → bash -lc "<script>"
//!   4. Run      ── container with output (rw) and tools (ro) mounts
//!   5. Deliver  ── <repo>/build_output/<product>_<timestamp>.tgz
//! ```
//!
//! # In-container steps
//!
//! The tools directory is mounted read-only, so the packaging script is
//! copied to a writable location before it is touched:
//! copy → normalize line endings → chmod → execute → archive `deploy/` →
//! announce the archive path.

pub mod command;
pub mod context;

pub use command::{ContainerLayout, PackagingCommand, Step, escape_quoted};
pub use context::{ContextError, archive_context};
