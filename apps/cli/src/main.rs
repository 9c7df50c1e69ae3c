//! Tagsmith CLI - batch image analysis from the command line
//!
//! Pushes a directory of images through a vision model with bounded
//! concurrency, prints live progress, and exports the collected records
//! as JSON and CSV.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Tagsmith - batch image analysis through vision models
#[derive(Parser, Debug)]
#[command(
    name = "tagsmith",
    author,
    version,
    about = "Tagsmith - batch image analysis through vision models",
    long_about = "Tagsmith pushes a folder of images through a vision model with bounded\nconcurrency and per-item retry, then exports the structured results as JSON and CSV."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a directory of images
    ///
    /// Scans the directory for image files, runs each through the selected
    /// model, and writes the results next to the images (or to --output-dir).
    /// Ctrl-C stops the run; everything finished so far is still exported.
    Run {
        /// Directory containing the images
        dir: PathBuf,

        /// Provider (pollinations, openrouter, groq, gemini, huggingface, together)
        #[arg(short, long)]
        provider: Option<String>,

        /// Model identifier (defaults to the provider's default model)
        #[arg(short, long)]
        model: Option<String>,

        /// API key (falls back to the provider's environment variable)
        #[arg(long)]
        api_key: Option<String>,

        /// Answer language (en, ar, both)
        #[arg(long)]
        language: Option<String>,

        /// Seed for providers that support reproducible sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Number of images processed at once
        #[arg(short, long)]
        concurrency: Option<usize>,

        /// Retries per image after the first failed attempt
        #[arg(long)]
        max_retries: Option<u32>,

        /// Delay between attempts, in milliseconds
        #[arg(long)]
        retry_delay_ms: Option<u64>,

        /// Directory for the exported JSON/CSV (defaults to the image directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Export format (json, csv, both)
        #[arg(long)]
        format: Option<String>,

        /// Rename pattern for target file names, {i} is the 1-based index
        #[arg(long)]
        rename: Option<String>,

        /// Instruction sent with every image
        #[arg(long)]
        instruction: Option<String>,

        /// JSON structure the model must fill in
        #[arg(long)]
        structure: Option<String>,

        /// Config file (defaults to ./tagsmith.toml when present)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List supported providers and their default models
    Providers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).without_time().with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match args.command {
        Command::Run {
            dir,
            provider,
            model,
            api_key,
            language,
            seed,
            concurrency,
            max_retries,
            retry_delay_ms,
            output_dir,
            format,
            rename,
            instruction,
            structure,
            config,
        } => {
            let overrides = config::Overrides {
                provider,
                model,
                api_key,
                language,
                seed,
                concurrency,
                max_retries,
                retry_delay_ms,
                output_dir,
                format,
                rename,
                instruction,
                structure,
            };
            let settings = config::Settings::load(config.as_deref(), overrides)?;
            commands::run::execute(&dir, settings).await
        }
        Command::Providers => {
            commands::providers::execute();
            Ok(())
        }
    }
}
