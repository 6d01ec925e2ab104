use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// File name of the optional configuration at the repository root.
pub const CONFIG_FILE_NAME: &str = "packforge.toml";

/// packforge.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackforgeConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub container: ContainerConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Artifact filename prefix (`<product>_<timestamp>.tgz`)
    #[serde(default = "default_product")]
    pub product: String,
    /// Tag given to the built image
    #[serde(default = "default_image_name")]
    pub image_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Home directory of the build user inside the image.
    /// The output and tools mounts live directly beneath it.
    #[serde(default = "default_home")]
    pub home: String,
    /// Working directory the packaging script runs in
    #[serde(default = "default_workdir")]
    pub workdir: String,
    /// Shell used to run the generated command (invoked as `<shell> -lc`)
    #[serde(default = "default_shell")]
    pub shell: String,
}

/// Upper bounds on the two blocking phases. Absent means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default)]
    pub build_secs: Option<u64>,
    #[serde(default)]
    pub run_secs: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Container log lines echoed to stderr when the container fails
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            product: default_product(),
            image_name: default_image_name(),
        }
    }
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            home: default_home(),
            workdir: default_workdir(),
            shell: default_shell(),
        }
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            tail_lines: default_tail_lines(),
        }
    }
}

impl ContainerConfig {
    /// Mount point of the host output directory (read-write).
    pub fn output_mount(&self) -> String {
        format!("{}/output", self.home.trim_end_matches('/'))
    }

    /// Mount point of the host tools directory (read-only).
    pub fn tools_mount(&self) -> String {
        format!("{}/tools", self.home.trim_end_matches('/'))
    }
}

impl TimeoutConfig {
    pub fn build(&self) -> Option<Duration> {
        self.build_secs.map(Duration::from_secs)
    }

    pub fn run(&self) -> Option<Duration> {
        self.run_secs.map(Duration::from_secs)
    }
}

impl PackforgeConfig {
    /// Load from packforge.toml in the given directory, or return defaults if not found.
    pub fn load(repo_root: &Path) -> crate::Result<Self> {
        let config_path = repo_root.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else {
            tracing::debug!(path = %config_path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Load from an explicit file. Unlike [`PackforgeConfig::load`], a
    /// missing file is an error.
    pub fn load_file(config_path: &Path) -> crate::Result<Self> {
        let content =
            std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                path: config_path.to_path_buf(),
                source: e,
            })?;
        toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
            path: config_path.to_path_buf(),
            source: e,
        })
    }
}

fn default_product() -> String {
    "deceptus".to_owned()
}

fn default_image_name() -> String {
    "deceptus_engine".to_owned()
}

fn default_home() -> String {
    "/home/builder".to_owned()
}

fn default_workdir() -> String {
    "/home/builder/deceptus_engine/build".to_owned()
}

fn default_shell() -> String {
    "bash".to_owned()
}

fn default_tail_lines() -> usize {
    50
}
