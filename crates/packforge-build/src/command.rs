use packforge_core::{ARTIFACT_ENV, ContainerConfig, PACKAGING_SCRIPT};

/// Directory the packaging script fills; archived relative to the workdir.
pub const DEPLOY_DIR: &str = "deploy";

/// Writable location the packaging script is copied to.
pub const SCRATCH_DIR: &str = "/tmp";

/// Container-side paths the packaging command refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerLayout {
    pub shell: String,
    pub workdir: String,
    pub tools_mount: String,
    pub output_mount: String,
}

impl ContainerLayout {
    pub fn from_config(config: &ContainerConfig) -> Self {
        Self {
            shell: config.shell.clone(),
            workdir: config.workdir.clone(),
            tools_mount: config.tools_mount(),
            output_mount: config.output_mount(),
        }
    }
}

/// One action of the in-container packaging command.
///
/// Paths are rendered between double quotes as given; callers escape
/// literal text with [`escape_quoted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Copy a file out of the read-only tools mount.
    Copy { from: String, to: String },
    /// Strip carriage returns in place (on a writable copy only).
    NormalizeLineEndings { path: String },
    MakeExecutable { path: String },
    Execute { interpreter: String, path: String },
    /// `tar czf <destination> -C <source_dir> .`
    Archive {
        source_dir: String,
        destination: String,
    },
    /// Print the archive path for the operator.
    Announce { path: String },
}

impl Step {
    fn render(&self) -> String {
        match self {
            Step::Copy { from, to } => format!("cp \"{from}\" \"{to}\""),
            Step::NormalizeLineEndings { path } => {
                let lf = format!("{path}.lf");
                format!(
                    "if command -v sed >/dev/null 2>&1; then\n  \
                     sed 's/\\r$//' \"{path}\" > \"{lf}\" || true\n\
                     else\n  \
                     tr -d '\\r' < \"{path}\" > \"{lf}\" || true\n\
                     fi\n\
                     mv \"{lf}\" \"{path}\""
                )
            }
            Step::MakeExecutable { path } => format!("chmod +x \"{path}\""),
            Step::Execute { interpreter, path } => format!("{interpreter} \"{path}\""),
            Step::Archive {
                source_dir,
                destination,
            } => format!("tar czf \"{destination}\" -C \"{source_dir}\" ."),
            Step::Announce { path } => format!("echo \"tarball: {path}\""),
        }
    }
}

/// Escape `text` for use between double quotes in a POSIX shell, so that
/// `\`, `"`, `$` and backticks are taken literally.
pub fn escape_quoted(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// The shell command run inside the packaging container, kept as a list
/// of [`Step`]s until it is rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagingCommand {
    shell: String,
    workdir: String,
    steps: Vec<Step>,
}

impl PackagingCommand {
    pub fn new(shell: &str, workdir: &str, steps: Vec<Step>) -> Self {
        Self {
            shell: shell.to_owned(),
            workdir: workdir.to_owned(),
            steps,
        }
    }

    /// copy → normalize → chmod → execute → archive → announce
    ///
    /// Layout paths are escaped for double quotes; only the `ARTIFACT`
    /// reference in the archive path is left for the shell to expand.
    pub fn standard(layout: &ContainerLayout) -> Self {
        let mounted = format!("{}/{PACKAGING_SCRIPT}", escape_quoted(&layout.tools_mount));
        let scratch = format!("{SCRATCH_DIR}/{PACKAGING_SCRIPT}");
        let archive = format!(
            "{}/${{{ARTIFACT_ENV}}}",
            escape_quoted(&layout.output_mount)
        );

        Self::new(
            &layout.shell,
            &layout.workdir,
            vec![
                Step::Copy {
                    from: mounted,
                    to: scratch.clone(),
                },
                Step::NormalizeLineEndings {
                    path: scratch.clone(),
                },
                Step::MakeExecutable {
                    path: scratch.clone(),
                },
                Step::Execute {
                    interpreter: layout.shell.clone(),
                    path: scratch,
                },
                Step::Archive {
                    source_dir: DEPLOY_DIR.to_owned(),
                    destination: archive.clone(),
                },
                Step::Announce { path: archive },
            ],
        )
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn workdir(&self) -> &str {
        &self.workdir
    }

    /// Render as a POSIX shell script that stops at the first failing step.
    pub fn script(&self) -> String {
        let mut lines = vec![
            "set -euo pipefail".to_owned(),
            format!("cd \"{}\"", escape_quoted(&self.workdir)),
        ];
        lines.extend(self.steps.iter().map(Step::render));
        lines.join("\n") + "\n"
    }

    /// Container command: `<shell> -lc "<script>"`.
    pub fn argv(&self) -> Vec<String> {
        vec![self.shell.clone(), "-lc".to_owned(), self.script()]
    }
}
