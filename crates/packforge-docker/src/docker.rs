use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
    WaitContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::BuildImageOptions;
use bollard::models::{BuildInfo, HostConfig};
use futures_util::{StreamExt, TryStreamExt, future, stream};
use packforge_build::archive_context;
use packforge_core::BuildContext;

use crate::runtime::{
    BuildChunk, ChunkStream, ContainerRuntime, ContainerSpec, ImageDetails, LogStream,
    RuntimeError,
};

/// Docker Engine API runtime backed by bollard.
#[derive(Debug, Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connect using `DOCKER_HOST` or the platform's default socket.
    /// No request is made until the first operation.
    pub fn connect() -> Result<Self, RuntimeError> {
        let docker = Docker::connect_with_local_defaults().map_err(|e| RuntimeError::Connect {
            detail: e.to_string(),
        })?;
        Ok(Self { docker })
    }

    pub fn with_client(docker: Docker) -> Self {
        Self { docker }
    }
}

impl ContainerRuntime for DockerRuntime {
    fn build_image(&self, context: &BuildContext) -> ChunkStream {
        let archive = match archive_context(&context.context_directory) {
            Ok(bytes) => bytes,
            Err(source) => {
                return stream::iter(vec![Err(RuntimeError::Context { source })]).boxed();
            }
        };

        let options = BuildImageOptions {
            dockerfile: context.dockerfile_name.clone(),
            t: context.image_tag.clone(),
            rm: true,
            forcerm: true,
            ..Default::default()
        };

        tracing::debug!(
            context = %context.context_directory.display(),
            tag = %context.image_tag,
            "submitting image build"
        );

        self.docker
            .build_image(options, None, Some(archive.into()))
            .filter_map(|item| {
                future::ready(match item {
                    Ok(info) => chunk_from_info(info).map(Ok),
                    // Newer engines report build failures as stream errors
                    // rather than as an `error` field.
                    Err(BollardError::DockerStreamError { error }) => {
                        Some(Ok(BuildChunk::Error(error)))
                    }
                    Err(e) => Some(Err(RuntimeError::api("build_image", e))),
                })
            })
            .boxed()
    }

    async fn inspect_image(&self, name: &str) -> Result<ImageDetails, RuntimeError> {
        let inspect = self
            .docker
            .inspect_image(name)
            .await
            .map_err(|e| RuntimeError::api("inspect_image", e))?;

        Ok(ImageDetails {
            id: inspect.id,
            tags: inspect.repo_tags.unwrap_or_default(),
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError> {
        let config = Config {
            image: Some(spec.image_reference.clone()),
            cmd: Some(spec.command.clone()),
            env: Some(spec.env_list()),
            attach_stdin: Some(false),
            attach_stdout: Some(!spec.detached),
            attach_stderr: Some(!spec.detached),
            host_config: Some(HostConfig {
                binds: Some(spec.binds()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await
            .map_err(|e| RuntimeError::api("create_container", e))?;

        for warning in &response.warnings {
            tracing::warn!(container = %response.id, %warning, "runtime warning on create");
        }

        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), RuntimeError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| RuntimeError::api("start_container", e))
    }

    fn container_logs(&self, id: &str) -> LogStream {
        let options = LogsOptions::<String> {
            follow: true,
            stdout: true,
            stderr: true,
            tail: "all".to_owned(),
            ..Default::default()
        };

        self.docker
            .logs(id, Some(options))
            .map(|item| {
                item.map(|output| output.into_bytes().to_vec())
                    .map_err(|e| RuntimeError::api("logs", e))
            })
            .boxed()
    }

    async fn tail_logs(&self, id: &str, lines: usize) -> Result<Vec<u8>, RuntimeError> {
        let options = LogsOptions::<String> {
            follow: false,
            stdout: true,
            stderr: true,
            tail: lines.to_string(),
            ..Default::default()
        };

        let outputs: Vec<_> = self
            .docker
            .logs(id, Some(options))
            .try_collect()
            .await
            .map_err(|e| RuntimeError::api("logs", e))?;

        Ok(outputs
            .into_iter()
            .flat_map(|output| output.into_bytes().to_vec())
            .collect())
    }

    async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError> {
        let mut waits = self
            .docker
            .wait_container(id, None::<WaitContainerOptions<String>>)
            .boxed();

        match waits.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // bollard surfaces a non-zero exit as an error carrying the code
            Some(Err(BollardError::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(RuntimeError::api("wait_container", e)),
            None => Err(RuntimeError::api(
                "wait_container",
                "wait stream ended without an exit status",
            )),
        }
    }

    async fn remove_container(&self, id: &str, force: bool) -> Result<(), RuntimeError> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force,
                    ..Default::default()
                }),
            )
            .await
            .map_err(|e| RuntimeError::api("remove_container", e))
    }
}

fn chunk_from_info(info: BuildInfo) -> Option<BuildChunk> {
    let error = info
        .error
        .filter(|e| !e.is_empty())
        .or_else(|| info.error_detail.and_then(|detail| detail.message));
    BuildChunk::from_fields(info.stream, info.status, info.progress, error)
}

#[cfg(test)]
mod tests {
    use bollard::models::ErrorDetail;

    use super::*;

    #[test]
    fn stream_message_becomes_stream_chunk() {
        let info = BuildInfo {
            stream: Some("Step 1/4 : FROM debian\n".to_owned()),
            ..Default::default()
        };
        assert_eq!(
            chunk_from_info(info),
            Some(BuildChunk::Stream("Step 1/4 : FROM debian\n".to_owned()))
        );
    }

    #[test]
    fn error_detail_is_used_when_error_missing() {
        let info = BuildInfo {
            error_detail: Some(ErrorDetail {
                code: Some(1),
                message: Some("returned a non-zero code: 2".to_owned()),
            }),
            ..Default::default()
        };
        assert_eq!(
            chunk_from_info(info),
            Some(BuildChunk::Error("returned a non-zero code: 2".to_owned()))
        );
    }

    #[test]
    fn empty_error_falls_back_to_error_detail() {
        let info = BuildInfo {
            error: Some(String::new()),
            error_detail: Some(ErrorDetail {
                code: None,
                message: Some("boom".to_owned()),
            }),
            ..Default::default()
        };
        assert_eq!(
            chunk_from_info(info),
            Some(BuildChunk::Error("boom".to_owned()))
        );
    }

    #[test]
    fn aux_only_message_yields_nothing() {
        let info = BuildInfo {
            id: Some("sha256:abc".to_owned()),
            ..Default::default()
        };
        assert_eq!(chunk_from_info(info), None);
    }
}
