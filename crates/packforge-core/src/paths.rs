use std::path::{Path, PathBuf};

use crate::{DOCKERFILE_NAME, OUTPUT_DIR_NAME, PACKAGING_SCRIPT};

/// Host-side locations for one packaging run.
///
/// The tools directory holds the `Dockerfile` and the packaging script and
/// doubles as the image build context. Its parent is the repository root,
/// under which the output directory lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub repo_root: PathBuf,
    pub tools_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl ProjectPaths {
    /// Resolve all paths from the tools directory.
    ///
    /// Creates the output directory (and parents) when missing, then checks
    /// that the packaging script is present.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolsDirResolve`](crate::Error::ToolsDirResolve) if the tools directory cannot be canonicalized
    /// - [`Error::NoRepoRoot`](crate::Error::NoRepoRoot) if the tools directory is a filesystem root
    /// - [`Error::OutputDirCreate`](crate::Error::OutputDirCreate) if the output directory cannot be created
    /// - [`Error::MissingPackagingScript`](crate::Error::MissingPackagingScript) if the packaging script is absent
    pub fn resolve(tools_dir: &Path) -> crate::Result<Self> {
        let tools_dir = tools_dir
            .canonicalize()
            .map_err(|e| crate::Error::ToolsDirResolve {
                path: tools_dir.to_path_buf(),
                source: e,
            })?;

        let repo_root = tools_dir
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| crate::Error::NoRepoRoot(tools_dir.clone()))?;

        let output_dir = repo_root.join(OUTPUT_DIR_NAME);
        std::fs::create_dir_all(&output_dir).map_err(|e| crate::Error::OutputDirCreate {
            path: output_dir.clone(),
            source: e,
        })?;

        let paths = Self {
            repo_root,
            tools_dir,
            output_dir,
        };

        let script = paths.packaging_script();
        if !script.is_file() {
            return Err(crate::Error::MissingPackagingScript(script));
        }

        tracing::debug!(
            repo_root = %paths.repo_root.display(),
            tools_dir = %paths.tools_dir.display(),
            output_dir = %paths.output_dir.display(),
            "paths resolved"
        );

        Ok(paths)
    }

    pub fn packaging_script(&self) -> PathBuf {
        self.tools_dir.join(PACKAGING_SCRIPT)
    }

    /// Build context rooted at the tools directory.
    pub fn build_context(&self, image_tag: &str) -> BuildContext {
        BuildContext {
            context_directory: self.tools_dir.clone(),
            dockerfile_name: DOCKERFILE_NAME.to_owned(),
            image_tag: image_tag.to_owned(),
        }
    }
}

/// Inputs of one image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub context_directory: PathBuf,
    pub dockerfile_name: String,
    pub image_tag: String,
}
