use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use futures_util::stream::BoxStream;
use packforge_build::ContextError;
use packforge_core::BuildContext;

/// Progress of an image build, in arrival order.
pub type ChunkStream = BoxStream<'static, Result<BuildChunk, RuntimeError>>;

/// Combined stdout/stderr of a container, in arrival order.
pub type LogStream = BoxStream<'static, Result<Vec<u8>, RuntimeError>>;

/// Container runtime operations used by the packaging pipeline.
///
/// Production code uses [`DockerRuntime`](crate::DockerRuntime), tests use
/// mockall-generated mocks.
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime: Send + Sync {
    /// Build and tag an image from `context`, removing intermediate containers.
    fn build_image(&self, context: &BuildContext) -> ChunkStream;

    async fn inspect_image(&self, name: &str) -> Result<ImageDetails, RuntimeError>;

    /// Create (but do not start) a detached container. Returns its id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;

    /// Follow the container's output until it exits.
    fn container_logs(&self, id: &str) -> LogStream;

    /// The last `lines` lines of output, without following.
    async fn tail_logs(&self, id: &str, lines: usize) -> Result<Vec<u8>, RuntimeError>;

    /// Block until the container stops and return its exit code.
    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError>;

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), RuntimeError>;
}

// ── Build progress ──

/// One message of the image-build stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildChunk {
    Stream(String),
    Status(String),
    Progress(String),
    /// Terminal: the build failed.
    Error(String),
}

impl BuildChunk {
    /// Pick the meaningful field of a raw build message. An error wins over
    /// progress text; a message with only empty fields yields nothing.
    pub fn from_fields(
        stream: Option<String>,
        status: Option<String>,
        progress: Option<String>,
        error: Option<String>,
    ) -> Option<Self> {
        let present = |field: Option<String>| field.filter(|s| !s.is_empty());

        present(error)
            .map(BuildChunk::Error)
            .or_else(|| present(stream).map(BuildChunk::Stream))
            .or_else(|| present(status).map(BuildChunk::Status))
            .or_else(|| present(progress).map(BuildChunk::Progress))
    }

    pub fn text(&self) -> &str {
        match self {
            BuildChunk::Stream(s)
            | BuildChunk::Status(s)
            | BuildChunk::Progress(s)
            | BuildChunk::Error(s) => s,
        }
    }
}

// ── Images ──

/// What the runtime reports about a locally stored image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageDetails {
    pub id: Option<String>,
    pub tags: Vec<String>,
}

impl ImageDetails {
    /// First tag, else the content id.
    pub fn reference(&self) -> Option<Image> {
        self.tags
            .iter()
            .chain(self.id.iter())
            .find(|r| !r.is_empty())
            .map(|r| Image {
                reference: r.clone(),
            })
    }
}

/// A concrete image reference (tag or content id) to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub reference: String,
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference)
    }
}

// ── Containers ──

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadWrite,
    ReadOnly,
}

impl AccessMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessMode::ReadWrite => "rw",
            AccessMode::ReadOnly => "ro",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeBinding {
    pub host_path: PathBuf,
    pub mount_path: String,
    pub access: AccessMode,
}

impl VolumeBinding {
    /// `host:container:mode`, the Docker bind syntax.
    pub fn bind_spec(&self) -> String {
        format!(
            "{}:{}:{}",
            self.host_path.display(),
            self.mount_path,
            self.access.as_str()
        )
    }
}

/// Everything needed to create the packaging container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub image_reference: String,
    pub command: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub volume_bindings: Vec<VolumeBinding>,
    pub detached: bool,
}

impl ContainerSpec {
    /// `KEY=VALUE` pairs, sorted by key.
    pub fn env_list(&self) -> Vec<String> {
        self.environment
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect()
    }

    pub fn binds(&self) -> Vec<String> {
        self.volume_bindings
            .iter()
            .map(VolumeBinding::bind_spec)
            .collect()
    }

    pub fn binding_for(&self, mount_path: &str) -> Option<&VolumeBinding> {
        self.volume_bindings
            .iter()
            .find(|b| b.mount_path == mount_path)
    }
}

// ── Errors ──

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("cannot connect to the container runtime: {detail}")]
    Connect { detail: String },

    #[error("container runtime call `{operation}` failed: {detail}")]
    Api {
        operation: &'static str,
        detail: String,
    },

    #[error("failed to prepare the build context")]
    Context { source: ContextError },
}

impl RuntimeError {
    pub fn api(operation: &'static str, detail: impl fmt::Display) -> Self {
        RuntimeError::Api {
            operation,
            detail: detail.to_string(),
        }
    }
}
