//! Maintenance tasks for the storefront suite
//!
//! ```text
//! cargo run -p xtask -- report        # build the HTML report from the results dir
//! cargo run -p xtask -- clean         # drop this worker/attempt's videos and traces
//! cargo run -p xtask -- clean --all   # drop every artifact directory
//! cargo run -p xtask -- settings      # print the resolved settings
//! ```

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::Path;
use storefront_e2e::{ArtifactLayout, Settings, report};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Storefront suite maintenance tasks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the report from collected results
    Report,
    /// Remove recorded artifacts
    Clean {
        /// Remove every worker's artifacts, results and report
        #[arg(long)]
        all: bool,
    },
    /// Print the settings resolved from the environment
    Settings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_e2e::logging::init();
    let cli = Cli::parse();
    let settings = Settings::from_env();

    match cli.command {
        Command::Report => match report::generate(&settings).await? {
            Some(dir) => println!("Report written to {}", dir.display()),
            None => bail!(
                "report generator '{}' not found on PATH",
                settings.report_command
            ),
        },
        Command::Clean { all } => {
            let targets = if all {
                vec![
                    settings.video_dir.clone(),
                    settings.trace_dir.clone(),
                    settings.results_dir.clone(),
                    settings.report_dir.clone(),
                ]
            } else {
                let layout = ArtifactLayout::from_settings(&settings);
                vec![layout.video_namespace(), layout.trace_namespace()]
            };
            for dir in &targets {
                remove_dir(dir).await?;
            }
        }
        Command::Settings => println!("{settings:#?}"),
    }

    Ok(())
}

async fn remove_dir(dir: &Path) -> anyhow::Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {
            tracing::info!(dir = %dir.display(), "Removed");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", dir.display())),
    }
}
