mod commands;
mod dates;
mod render;
mod selection;
mod utils;

use std::path::PathBuf;

use anyhow::Result;
use calmerge_core::SubprocessProvider;
use calmerge_core::config::CalmergeConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "calmerge")]
#[command(about = "Merge events from several calendars into a single .ics file")]
struct Cli {
    /// Log what happens to each calendar (same as RUST_LOG=info)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Provider to use instead of the configured one (e.g. "ics", "outlook")
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the calendars the provider can export
    Sources,
    /// Export calendars for a date range into one merged .ics file
    Export {
        /// First day to export (YYYY-MM-DD). Defaults to next Monday
        #[arg(long)]
        from: Option<String>,

        /// Last day to export, inclusive (YYYY-MM-DD). Defaults to six days after --from
        #[arg(long)]
        to: Option<String>,

        /// Calendar to include, by number, name or identity (repeatable)
        #[arg(short, long = "calendar", conflicts_with = "all")]
        calendars: Vec<String>,

        /// Include every calendar without prompting
        #[arg(long)]
        all: bool,

        /// Output file. Defaults to Merged_Export_<from>_to_<to>.ics in output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the output file if it already exists
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CalmergeConfig::load()?;

    init_logging(&config, cli.verbose);

    let provider_name = cli.provider.as_deref().unwrap_or(&config.provider);
    let provider =
        SubprocessProvider::from_name(provider_name).with_timeout(config.provider_timeout());

    match cli.command {
        Commands::Sources => commands::sources::run(&provider).await,
        Commands::Export {
            from,
            to,
            calendars,
            all,
            output,
            force,
        } => {
            let today = chrono::Local::now().date_naive();
            let window = dates::window_from_args(from.as_deref(), to.as_deref(), today)?;
            let args = commands::export::ExportArgs {
                window,
                selectors: calendars,
                all,
                output,
                force,
            };
            commands::export::run(&provider, &config, args).await
        }
    }
}

/// Logs go to stderr; stdout is kept for the export report.
fn init_logging(config: &CalmergeConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
