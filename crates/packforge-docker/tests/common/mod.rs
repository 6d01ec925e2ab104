#![allow(dead_code)]

use std::io::{self, Write};
use std::path::PathBuf;

use futures_util::{StreamExt, stream};
use mockall::mock;
use packforge_core::BuildContext;
use packforge_docker::{
    BuildChunk, ChunkStream, ContainerRuntime, ContainerSpec, Image, ImageDetails, LogStream,
    RuntimeError,
};
use tempfile::TempDir;

mock! {
    pub Runtime {}

    impl ContainerRuntime for Runtime {
        fn build_image(&self, context: &BuildContext) -> ChunkStream;
        async fn inspect_image(&self, name: &str) -> Result<ImageDetails, RuntimeError>;
        async fn create_container(&self, spec: &ContainerSpec) -> Result<String, RuntimeError>;
        async fn start_container(&self, id: &str) -> Result<(), RuntimeError>;
        fn container_logs(&self, id: &str) -> LogStream;
        async fn tail_logs(&self, id: &str, lines: usize) -> Result<Vec<u8>, RuntimeError>;
        async fn wait_container(&self, id: &str) -> Result<i64, RuntimeError>;
        async fn remove_container(&self, id: &str, force: bool) -> Result<(), RuntimeError>;
    }
}

pub fn chunks(items: &[BuildChunk]) -> ChunkStream {
    stream::iter(items.iter().cloned().map(Ok).collect::<Vec<_>>()).boxed()
}

pub fn logs(parts: &[&str]) -> LogStream {
    stream::iter(
        parts
            .iter()
            .map(|p| Ok(p.as_bytes().to_vec()))
            .collect::<Vec<_>>(),
    )
    .boxed()
}

pub fn tagged(tag: &str) -> ImageDetails {
    ImageDetails {
        id: Some("sha256:0123abcd".to_owned()),
        tags: vec![tag.to_owned()],
    }
}

pub fn image() -> Image {
    Image {
        reference: "deceptus_engine:latest".to_owned(),
    }
}

pub fn api_error(operation: &'static str) -> RuntimeError {
    RuntimeError::api(operation, "daemon unavailable")
}

/// A repository with `docker/Dockerfile` and `docker/bundle_deploy.sh`.
pub struct Repo {
    _dir: TempDir,
    pub root: PathBuf,
    pub tools_dir: PathBuf,
}

impl Repo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let tools_dir = root.join("docker");
        std::fs::create_dir(&tools_dir).unwrap();
        std::fs::write(tools_dir.join("Dockerfile"), "FROM debian:bookworm\n").unwrap();
        std::fs::write(tools_dir.join("bundle_deploy.sh"), "#!/bin/bash\necho ok\n").unwrap();
        Self {
            _dir: dir,
            root,
            tools_dir,
        }
    }

    pub fn without_script() -> Self {
        let repo = Self::new();
        std::fs::remove_file(repo.tools_dir.join("bundle_deploy.sh")).unwrap();
        repo
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root.join("build_output")
    }
}

/// Panics on the first write.
pub struct PanickingWriter;

impl Write for PanickingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        panic!("writer exploded");
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

pub fn text(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).into_owned()
}
