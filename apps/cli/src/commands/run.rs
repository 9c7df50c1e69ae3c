//! `tagsmith run` - the batch analysis command.
//!
//! Scans a directory, drives the engine, renders progress lines as events
//! arrive, and exports whatever finished. Ctrl-C requests a stop; the
//! engine settles every item before the export runs.

use crate::config::Settings;
use anyhow::Context;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tagsmith_core::{
    BatchEngine, EngineEvent, ItemStatus, NamingRule, OutputNaming, RunConfig, export,
};
use tagsmith_models::{ProviderConfig, build_model};
use tracing::warn;

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "gif", "webp", "bmp"];

/// Hard cap on batch size; larger folders are truncated with a warning.
const MAX_IMAGES: usize = 100;

pub async fn execute(dir: &Path, settings: Settings) -> anyhow::Result<()> {
    let sources = scan_images(dir)?;
    anyhow::ensure!(!sources.is_empty(), "no images found in {}", dir.display());
    println!("{} {} image(s) in {}", "Found".bold(), sources.len(), dir.display());

    let mut provider_config = ProviderConfig::new(settings.provider);
    provider_config.model_id = settings.model.clone();
    provider_config.api_key = settings.api_key.clone();
    provider_config.seed = settings.seed;
    let model = build_model(&provider_config, settings.prompt.clone())
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    println!(
        "{} {} / {}",
        "Using".bold(),
        settings.provider.as_str().green(),
        model.model_id()
    );

    let output_dir = settings.output_dir.clone().unwrap_or_else(|| dir.to_path_buf());
    let naming = OutputNaming {
        rule: settings
            .rename
            .clone()
            .map_or(NamingRule::Original, NamingRule::Pattern),
        output_dir: output_dir.display().to_string(),
    };
    let run_config = RunConfig {
        concurrency: settings.concurrency,
        max_retries: settings.max_retries,
        retry_delay: settings.retry_delay,
    };

    let total = sources.len();
    let engine = Arc::new(
        BatchEngine::new(sources, run_config, naming).map_err(|e| anyhow::anyhow!("{e}"))?,
    );

    let printer = tokio::spawn(print_events(engine.subscribe(), total));

    let control = engine.control();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n{}", "Stopping after in-flight items settle...".yellow());
            control.stop();
        }
    });

    let outcome = engine.run(model).await.map_err(|e| anyhow::anyhow!("{e}"))?;
    let _ = printer.await;

    print_report(&engine);
    if outcome.completed {
        println!("{} {}/{} items done", "Run complete:".green().bold(), outcome.done, outcome.total);
    } else {
        println!("{} {}/{} items done", "Run stopped:".yellow().bold(), outcome.done, outcome.total);
    }

    export_results(&engine, &output_dir, &settings)?;
    Ok(())
}

/// Collects image files in name order, truncating to the batch cap.
fn scan_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    paths.sort();

    if paths.len() > MAX_IMAGES {
        warn!(found = paths.len(), cap = MAX_IMAGES, "truncating oversized batch");
        eprintln!(
            "{} {} images found, processing only the first {}",
            "Warning:".yellow().bold(),
            paths.len(),
            MAX_IMAGES
        );
        paths.truncate(MAX_IMAGES);
    }
    Ok(paths)
}

/// Renders engine events until the run emits its terminal event.
async fn print_events(
    mut events: tokio::sync::broadcast::Receiver<EngineEvent>,
    total: usize,
) {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            // A slow terminal may drop some updates; the run itself is unaffected.
            Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
            Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
        };
        match event {
            EngineEvent::ItemUpdated(update) => {
                let marker = match update.status {
                    ItemStatus::Done => "done".green(),
                    ItemStatus::Error => "error".red(),
                    ItemStatus::Processing => "working".cyan(),
                    ItemStatus::Pending => "pending".normal(),
                };
                let detail = if update.sub_label.is_empty() {
                    update.label
                } else {
                    format!("{} ({})", update.label, update.sub_label)
                };
                println!(
                    "  [{}/{}] {:>3}%  {:<8} {}",
                    update.item_id + 1,
                    total,
                    update.progress,
                    marker,
                    detail
                );
            }
            EngineEvent::BatchProgress { snapshot, phase } => {
                if snapshot.total > 0 && snapshot.active == 0 {
                    println!("  {} {}% ({})", "batch".bold(), snapshot.percentage(), phase);
                }
            }
            EngineEvent::RunFinished { .. } | EngineEvent::RunStopped => break,
        }
    }
}


fn print_report(engine: &BatchEngine) {
    for item in engine.report() {
        match item.status {
            ItemStatus::Done => println!("  {} {}", "ok".green(), item.file_name),
            ItemStatus::Error => println!(
                "  {} {} ({})",
                "failed".red(),
                item.file_name,
                item.error.unwrap_or_default()
            ),
            _ => println!("  {} {}", "unsettled".yellow(), item.file_name),
        }
    }
}

fn export_results(
    engine: &BatchEngine,
    output_dir: &Path,
    settings: &Settings,
) -> anyhow::Result<()> {
    let results = engine.results();
    if results.is_empty() {
        println!("{}", "Nothing to export.".dimmed());
        return Ok(());
    }
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    if settings.format.includes_json() {
        let path = output_dir.join("tagsmith_results.json");
        export::write_json(&path, &results).map_err(|e| anyhow::anyhow!("{e}"))?;
        println!("{} {}", "Wrote".bold(), path.display());
    }
    if settings.format.includes_csv() {
        let path = output_dir.join("tagsmith_results.csv");
        export::write_csv(&path, &results).map_err(|e| anyhow::anyhow!("{e}"))?;
        println!("{} {}", "Wrote".bold(), path.display());
    }
    Ok(())
}
