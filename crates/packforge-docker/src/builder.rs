use std::time::Duration;

use futures_util::StreamExt;
use packforge_core::BuildContext;

use crate::console::Console;
use crate::runtime::{BuildChunk, ContainerRuntime, Image, RuntimeError};

/// Drives an image build and resolves the resulting image reference.
pub struct ImageBuilder<'a, R: ContainerRuntime> {
    runtime: &'a R,
    timeout: Option<Duration>,
}

impl<'a, R: ContainerRuntime> ImageBuilder<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self {
            runtime,
            timeout: None,
        }
    }

    /// Bound the time spent consuming build progress. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the image, echoing progress, then look it up by tag.
    ///
    /// The first [`BuildChunk::Error`] aborts the build; no image is
    /// trusted afterwards even if the runtime would otherwise report one.
    pub async fn build(
        &self,
        context: &BuildContext,
        console: &mut Console<'_>,
    ) -> Result<Image, BuildError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.consume(context, console))
                .await
                .map_err(|_elapsed| BuildError::TimedOut(limit))??,
            None => self.consume(context, console).await?,
        }

        self.resolve(&context.image_tag).await
    }

    async fn consume(
        &self,
        context: &BuildContext,
        console: &mut Console<'_>,
    ) -> Result<(), BuildError> {
        let mut chunks = self.runtime.build_image(context);

        while let Some(chunk) = chunks.next().await {
            match chunk.map_err(|source| BuildError::Runtime { source })? {
                BuildChunk::Error(message) => {
                    console.error_line(&message);
                    tracing::debug!(tag = %context.image_tag, %message, "image build failed");
                    return Err(BuildError::Failed(message));
                }
                progress => console.line(progress.text()),
            }
        }

        Ok(())
    }

    async fn resolve(&self, tag: &str) -> Result<Image, BuildError> {
        let details = self
            .runtime
            .inspect_image(tag)
            .await
            .map_err(|source| BuildError::Lookup {
                tag: tag.to_owned(),
                source,
            })?;

        let image = details
            .reference()
            .ok_or_else(|| BuildError::NoReference(tag.to_owned()))?;

        tracing::info!(tag, image = %image, "image built");
        Ok(image)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The daemon's message has already been echoed to stderr.
    #[error("image build failed")]
    Failed(String),

    #[error("image build stream failed")]
    Runtime { source: RuntimeError },

    #[error("built image '{tag}' could not be found")]
    Lookup { tag: String, source: RuntimeError },

    #[error("built image '{0}' has neither a tag nor an id")]
    NoReference(String),

    #[error("image build timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}
