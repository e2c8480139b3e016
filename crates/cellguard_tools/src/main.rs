//! Cellguard - Development Tools

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cellguard-tools")]
#[command(about = "Development tools for Cellguard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate zone data files
    Validate {
        /// Path to the zone directory
        #[arg(default_value = "assets/zones")]
        path: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating zone files in: {path}");
            match cellguard_tools::validate::validate_zone_directory(std::path::Path::new(&path)) {
                Ok(report) => {
                    for file in &report.files {
                        match &file.zone_id {
                            Some(id) if file.problems.is_empty() => {
                                tracing::info!("{}: zone '{id}' ok", file.path.display());
                            }
                            _ => {
                                for problem in &file.problems {
                                    tracing::error!("{}: {problem}", file.path.display());
                                }
                            }
                        }
                    }
                    if report.is_valid() {
                        tracing::info!("Validation passed ({} zones)", report.files.len());
                    } else {
                        tracing::error!("Validation failed: {} problems", report.problem_count());
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
    }
}
