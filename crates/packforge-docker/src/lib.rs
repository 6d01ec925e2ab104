//! Container runtime operations and the packaging pipeline for packforge.
//!
//! [`Orchestrator`] resolves host paths, builds the image through an
//! [`ImageBuilder`], and hands the result to a [`ContainerRunner`]. All
//! runtime access goes through [`ContainerRuntime`]; [`DockerRuntime`] is
//! the bollard-backed implementation.

pub mod builder;
pub mod console;
pub mod docker;
pub mod pipeline;
pub mod runner;
pub mod runtime;

pub use builder::{BuildError, ImageBuilder};
pub use console::Console;
pub use docker::DockerRuntime;
pub use pipeline::{Delivered, Orchestrator, PipelineError, PipelineOutcome, Stage};
pub use runner::{
    CleanupWarning, ContainerLease, ContainerRunner, DEFAULT_TAIL_LINES, RunError, RunReport,
};
pub use runtime::{
    AccessMode, BuildChunk, ChunkStream, ContainerRuntime, ContainerSpec, Image, ImageDetails,
    LogStream, RuntimeError, VolumeBinding,
};
