use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use packforge_build::ContainerLayout;
use packforge_core::{Artifact, PackforgeConfig, ProjectPaths};

use crate::builder::{BuildError, ImageBuilder};
use crate::console::Console;
use crate::docker::DockerRuntime;
use crate::runner::{CleanupWarning, ContainerRunner, RunError};
use crate::runtime::{ContainerRuntime, Image, RuntimeError};

/// Pipeline position. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResolvingPaths,
    BuildingImage,
    RunningContainer,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ResolvingPaths => "resolving paths",
            Stage::BuildingImage => "building image",
            Stage::RunningContainer => "running container",
            Stage::Done => "done",
            Stage::Failed => "failed",
        })
    }
}

/// A successful packaging run.
#[derive(Debug, Clone)]
pub struct Delivered {
    pub paths: ProjectPaths,
    pub image: Image,
    pub artifact: Artifact,
}

#[derive(Debug)]
pub struct PipelineOutcome {
    pub result: Result<Delivered, PipelineError>,
    /// Container removals that failed; never affects `result`.
    pub warnings: Vec<CleanupWarning>,
}

impl PipelineOutcome {
    pub fn stage(&self) -> Stage {
        match self.result {
            Ok(_) => Stage::Done,
            Err(_) => Stage::Failed,
        }
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(_) => 0,
            Err(e) => e.exit_code(),
        }
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sequences path resolution, image build, and the packaging run.
/// Nothing is retried.
pub struct Orchestrator<R: ContainerRuntime = DockerRuntime> {
    runtime: R,
    config: PackforgeConfig,
    clock: Clock,
}

impl Orchestrator<DockerRuntime> {
    pub fn connect(config: PackforgeConfig) -> Result<Self, RuntimeError> {
        Ok(Self::with_runtime(DockerRuntime::connect()?, config))
    }
}

impl<R: ContainerRuntime> Orchestrator<R> {
    pub fn with_runtime(runtime: R, config: PackforgeConfig) -> Self {
        Self {
            runtime,
            config,
            clock: Box::new(Utc::now),
        }
    }

    /// Replace the time source used to name artifacts.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn config(&self) -> &PackforgeConfig {
        &self.config
    }

    pub async fn run(&self, tools_dir: &Path, console: &mut Console<'_>) -> PipelineOutcome {
        let mut warnings = Vec::new();
        let result = self.drive(tools_dir, console, &mut warnings).await;

        match &result {
            Ok(delivered) => {
                tracing::info!(
                    stage = %Stage::Done,
                    artifact = %delivered.artifact.host_path.display(),
                    "packaging finished"
                );
                console.line("");
                console.line("artifact ready:");
                console.line(&delivered.artifact.host_path.display().to_string());
            }
            Err(e) => {
                tracing::debug!(stage = %Stage::Failed, failed_in = %e.stage(), error = %e, "packaging failed");
                console.error_line(&format!("error: {}", error_chain(e)));
            }
        }

        PipelineOutcome { result, warnings }
    }

    async fn drive(
        &self,
        tools_dir: &Path,
        console: &mut Console<'_>,
        warnings: &mut Vec<CleanupWarning>,
    ) -> Result<Delivered, PipelineError> {
        tracing::info!(stage = %Stage::ResolvingPaths, tools_dir = %tools_dir.display());
        let paths = ProjectPaths::resolve(tools_dir)
            .map_err(|source| PipelineError::Configuration { source })?;

        // Named up front so the container and the host agree on the file.
        let artifact = Artifact::new(&self.config.project.product, &paths.output_dir, (self.clock)());

        tracing::info!(stage = %Stage::BuildingImage, tag = %self.config.project.image_name);
        console.line(&format!(
            "building image from {}...",
            paths.tools_dir.display()
        ));
        let context = paths.build_context(&self.config.project.image_name);
        let image = ImageBuilder::new(&self.runtime)
            .with_timeout(self.config.timeouts.build())
            .build(&context, console)
            .await
            .map_err(|source| PipelineError::Build { source })?;

        tracing::info!(stage = %Stage::RunningContainer, image = %image, artifact = %artifact.filename);
        console.line("running container: bundle & package...");
        let report = ContainerRunner::new(
            &self.runtime,
            ContainerLayout::from_config(&self.config.container),
        )
        .with_tail_lines(self.config.diagnostics.tail_lines)
        .with_timeout(self.config.timeouts.run())
        .run(&image, &artifact, &paths, console)
        .await;

        if let Some(warning) = report.cleanup {
            console.error_line(&format!("warning: {warning}"));
            warnings.push(warning);
        }
        report.result?;

        Ok(Delivered {
            paths,
            image,
            artifact,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot start packaging")]
    Configuration { source: packforge_core::Error },

    #[error("image build did not complete")]
    Build { source: BuildError },

    #[error("could not create or start the packaging container")]
    ContainerCreation { source: RunError },

    #[error("packaging container exited with code {code}")]
    ContainerExecution { code: i64 },

    #[error("packaging container failed")]
    Runtime { source: RunError },
}

impl PipelineError {
    /// Container exit code when the container itself failed, otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::ContainerExecution { code } => match i32::try_from(*code) {
                Ok(code) if code != 0 => code,
                _ => 1,
            },
            _ => 1,
        }
    }

    /// Stage the pipeline was in when it failed.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Configuration { .. } => Stage::ResolvingPaths,
            PipelineError::Build { .. } => Stage::BuildingImage,
            PipelineError::ContainerCreation { .. }
            | PipelineError::ContainerExecution { .. }
            | PipelineError::Runtime { .. } => Stage::RunningContainer,
        }
    }
}

impl From<RunError> for PipelineError {
    fn from(error: RunError) -> Self {
        match error {
            RunError::Exited { code } => PipelineError::ContainerExecution { code },
            RunError::Create { .. } | RunError::Start { .. } => {
                PipelineError::ContainerCreation { source: error }
            }
            other => PipelineError::Runtime { source: other },
        }
    }
}

/// `outer: cause: root cause`
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
