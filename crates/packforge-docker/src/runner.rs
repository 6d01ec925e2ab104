use std::collections::BTreeMap;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures_util::{FutureExt, StreamExt};
use packforge_build::{ContainerLayout, PackagingCommand};
use packforge_core::{ARTIFACT_ENV, Artifact, ProjectPaths};

use crate::console::Console;
use crate::runtime::{
    AccessMode, ContainerRuntime, ContainerSpec, Image, RuntimeError, VolumeBinding,
};

/// Default number of log lines echoed to stderr after a failed run.
pub const DEFAULT_TAIL_LINES: usize = 50;

/// Runs the packaging container and guarantees its removal.
pub struct ContainerRunner<'a, R: ContainerRuntime> {
    runtime: &'a R,
    layout: ContainerLayout,
    tail_lines: usize,
    timeout: Option<Duration>,
}

/// Outcome of one container run. `cleanup` is reported separately so a
/// failed removal never changes `result`.
#[derive(Debug)]
pub struct RunReport {
    pub result: Result<(), RunError>,
    pub cleanup: Option<CleanupWarning>,
}

impl<'a, R: ContainerRuntime> ContainerRunner<'a, R> {
    pub fn new(runtime: &'a R, layout: ContainerLayout) -> Self {
        Self {
            runtime,
            layout,
            tail_lines: DEFAULT_TAIL_LINES,
            timeout: None,
        }
    }

    pub fn with_tail_lines(mut self, tail_lines: usize) -> Self {
        self.tail_lines = tail_lines;
        self
    }

    /// Bound start + log streaming + wait. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The container the runner would create for `image` and `artifact`.
    pub fn container_spec(
        &self,
        image: &Image,
        artifact: &Artifact,
        paths: &ProjectPaths,
    ) -> ContainerSpec {
        let command = PackagingCommand::standard(&self.layout);

        ContainerSpec {
            image_reference: image.reference.clone(),
            command: command.argv(),
            environment: BTreeMap::from([(ARTIFACT_ENV.to_owned(), artifact.filename.clone())]),
            volume_bindings: vec![
                VolumeBinding {
                    host_path: paths.output_dir.clone(),
                    mount_path: self.layout.output_mount.clone(),
                    access: AccessMode::ReadWrite,
                },
                VolumeBinding {
                    host_path: paths.tools_dir.clone(),
                    mount_path: self.layout.tools_mount.clone(),
                    access: AccessMode::ReadOnly,
                },
            ],
            detached: true,
        }
    }

    /// Create, start, stream, and wait on the packaging container.
    ///
    /// Once creation succeeds the container is force-removed exactly once,
    /// whether the run succeeds, fails, times out, or panics.
    pub async fn run(
        &self,
        image: &Image,
        artifact: &Artifact,
        paths: &ProjectPaths,
        console: &mut Console<'_>,
    ) -> RunReport {
        let spec = self.container_spec(image, artifact, paths);

        let lease = match ContainerLease::create(self.runtime, &spec).await {
            Ok(lease) => lease,
            Err(source) => {
                return RunReport {
                    result: Err(RunError::Create { source }),
                    cleanup: None,
                };
            }
        };

        let supervised = AssertUnwindSafe(self.supervise(lease.id(), console))
            .catch_unwind()
            .await;
        let cleanup = lease.release().await;

        match supervised {
            Ok(result) => RunReport { result, cleanup },
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    async fn supervise(&self, id: &str, console: &mut Console<'_>) -> Result<(), RunError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.drive(id, console))
                .await
                .map_err(|_elapsed| RunError::TimedOut(limit))?,
            None => self.drive(id, console).await,
        }
    }

    async fn drive(&self, id: &str, console: &mut Console<'_>) -> Result<(), RunError> {
        self.runtime
            .start_container(id)
            .await
            .map_err(|source| RunError::Start { source })?;

        let mut logs = self.runtime.container_logs(id);
        while let Some(chunk) = logs.next().await {
            let bytes = chunk.map_err(|source| RunError::Stream { source })?;
            console.forward(&bytes);
        }

        let code = self
            .runtime
            .wait_container(id)
            .await
            .map_err(|source| RunError::Wait { source })?;

        tracing::info!(container = id, code, "container finished");

        if code != 0 {
            console.error_line(&format!("error: container exited with code {code}"));
            self.print_tail(id, console).await;
            return Err(RunError::Exited { code });
        }

        Ok(())
    }

    /// Best effort: a failure here must not hide the exit code.
    async fn print_tail(&self, id: &str, console: &mut Console<'_>) {
        match self.runtime.tail_logs(id, self.tail_lines).await {
            Ok(tail) => console.forward_error(&tail),
            Err(e) => {
                tracing::debug!(container = id, error = %e, "could not fetch log tail");
            }
        }
    }
}

// ── Scoped container ──

/// A created container that must be released with [`ContainerLease::release`].
pub struct ContainerLease<'a, R: ContainerRuntime> {
    runtime: &'a R,
    id: String,
    released: bool,
}

impl<'a, R: ContainerRuntime> ContainerLease<'a, R> {
    pub async fn create(runtime: &'a R, spec: &ContainerSpec) -> Result<Self, RuntimeError> {
        let id = runtime.create_container(spec).await?;
        tracing::debug!(container = %id, image = %spec.image_reference, "container created");
        Ok(Self {
            runtime,
            id,
            released: false,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Force-remove the container. A failure is returned as a warning.
    pub async fn release(mut self) -> Option<CleanupWarning> {
        self.released = true;
        match self.runtime.remove_container(&self.id, true).await {
            Ok(()) => {
                tracing::debug!(container = %self.id, "container removed");
                None
            }
            Err(source) => {
                let warning = CleanupWarning {
                    container_id: self.id.clone(),
                    detail: source.to_string(),
                };
                tracing::warn!(container = %self.id, error = %source, "container removal failed");
                Some(warning)
            }
        }
    }
}

impl<R: ContainerRuntime> Drop for ContainerLease<'_, R> {
    fn drop(&mut self) {
        if !self.released {
            // Reached only when the owning future is dropped mid-run.
            tracing::warn!(container = %self.id, "container left behind; remove it with `docker rm -f`");
        }
    }
}

// ── Errors ──

/// Container removal failed. Reported, never escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupWarning {
    pub container_id: String,
    pub detail: String,
}

impl fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to remove container {}: {}",
            self.container_id, self.detail
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to create the packaging container")]
    Create { source: RuntimeError },

    #[error("failed to start the packaging container")]
    Start { source: RuntimeError },

    #[error("lost the packaging container's log stream")]
    Stream { source: RuntimeError },

    #[error("failed waiting for the packaging container")]
    Wait { source: RuntimeError },

    #[error("packaging container timed out after {}s", .0.as_secs())]
    TimedOut(Duration),

    #[error("packaging container exited with code {code}")]
    Exited { code: i64 },
}
