use std::path::Path;

use packforge_core::PackforgeConfig;
use packforge_docker::{Console, Orchestrator};

/// Run the packaging pipeline and return the process exit code.
///
/// Pipeline failures are reported on stderr by the pipeline itself and
/// only show up here as a non-zero code. Errors returned from this function
/// happen before the pipeline starts.
pub async fn package(tools_dir: &Path, config_path: Option<&Path>) -> anyhow::Result<i32> {
    let config = match config_path {
        Some(path) => PackforgeConfig::load_file(path)?,
        // The repository root is the tools directory's parent.
        None => PackforgeConfig::load(&tools_dir.join(".."))?,
    };

    let orchestrator = Orchestrator::connect(config)?;

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let mut console = Console::new(&mut stdout, &mut stderr);
    let outcome = orchestrator.run(tools_dir, &mut console).await;

    for warning in &outcome.warnings {
        tracing::warn!(container = %warning.container_id, "container may need manual removal");
    }

    Ok(outcome.exit_code())
}
