mod commands;

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "packforge",
    about = "Build the packaging image and deliver a timestamped deploy archive"
)]
#[command(version)]
struct Cli {
    /// Directory holding the Dockerfile and bundle_deploy.sh
    #[arg(long, default_value = "docker")]
    tools_dir: PathBuf,

    /// Configuration file [default: <repo root>/packforge.toml]
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries build progress and container output only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = commands::package(&cli.tools_dir, cli.config.as_deref()).await?;
    if code != 0 {
        std::process::exit(code);
    }

    Ok(())
}
