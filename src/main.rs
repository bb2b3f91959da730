use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use review_coverage::cli;
use review_coverage::model::CoverageKind;
use review_coverage::project_config::DEFAULT_PLUGIN_NAME;
use review_coverage::provider::{CoverageProvider, Settings};
use review_coverage::transport::UreqTransport;

/// Test-coverage annotations for code-review changes.
#[derive(Parser)]
#[command(name = "review-coverage", version, about)]
struct Cli {
    /// Plugin name used to read the project's coverage config.
    #[arg(long, global = true, env = "REVIEW_COVERAGE_PLUGIN", default_value = DEFAULT_PLUGIN_NAME)]
    plugin_name: String,

    /// Fetch coverage even if the project has not enabled it.
    #[arg(long, global = true, env = "REVIEW_COVERAGE_SKIP_CONFIG")]
    skip_config: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show covered and uncovered line ranges for one file.
    Ranges {
        /// Change URL, e.g. https://host/c/project/+/123/4/path/to/file.cc
        url: String,

        /// File path, when the URL does not include one.
        #[arg(long)]
        path: Option<String>,
    },

    /// Show per-file coverage percentages for a patchset.
    Percentages {
        /// Change URL naming a patchset.
        url: String,

        /// Percentage kinds to show (default: all).
        #[arg(long, value_enum, value_delimiter = ',')]
        kind: Vec<CoverageKind>,
    },

    /// List files with low incremental coverage.
    Check {
        /// Change URL naming a patchset.
        url: String,
    },

    /// Show whether coverage is enabled for the change's project.
    Config {
        /// Change URL.
        url: String,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let settings = Settings {
        plugin_name: cli.plugin_name,
        require_enabled: !cli.skip_config,
    };
    let provider = CoverageProvider::new(Arc::new(UreqTransport::new()), &settings);

    let output = match cli.command {
        Commands::Ranges { url, path } => cli::cmd_ranges(&provider, &url, path.as_deref()).await?,
        Commands::Percentages { url, kind } => cli::cmd_percentages(&provider, &url, &kind).await?,
        Commands::Check { url } => cli::cmd_check(&provider, &url).await?,
        Commands::Config { url } => cli::cmd_config(&provider, &url).await?,
    };
    print!("{output}");
    Ok(())
}
