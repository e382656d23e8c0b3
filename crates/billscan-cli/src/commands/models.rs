//! Models command - inspect model artifacts.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use billscan_core::ml::{artifact_status, ArtifactStatus};
use billscan_core::models::config::ModelConfig;
use billscan_core::{ExtractionMode, ModelStore};

use super::load_config;
use super::serve::parse_mode;

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,

    /// Model artifact directory (default from configuration)
    #[arg(long, global = true)]
    model_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// Show which artifact files are present for each field
    Status,

    /// Load the artifacts a mode needs, as the server would at startup
    Check {
        /// Mode to check (default from configuration)
        #[arg(value_parser = parse_mode)]
        mode: Option<ExtractionMode>,
    },
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = args.model_dir {
        config.models.model_dir = dir;
    }

    match args.command {
        ModelsCommand::Status => show_status(&config.models),
        ModelsCommand::Check { mode } => {
            check_mode(&config.models, mode.unwrap_or(config.extraction.mode))
        }
    }
}

fn mark(present: bool) -> console::StyledObject<&'static str> {
    if present {
        style("✓").green()
    } else {
        style("✗").red()
    }
}

fn classifier_summary(status: &ArtifactStatus) -> String {
    match (status.onnx_model, status.labels, status.linear_model) {
        (true, true, _) => "onnx".to_string(),
        (true, false, _) => "onnx (labels missing)".to_string(),
        (false, _, true) => "linear".to_string(),
        (false, _, false) => "missing".to_string(),
    }
}

fn show_status(models: &ModelConfig) -> anyhow::Result<()> {
    println!(
        "{} {}",
        style("Model directory:").bold(),
        models.model_dir.display()
    );
    println!();

    for status in artifact_status(models) {
        println!(
            "  {} {:<9} vectorizer {}  classifier {}",
            mark(status.is_complete()),
            style(status.kind.as_str()).cyan(),
            mark(status.vectorizer),
            classifier_summary(&status)
        );
    }

    println!();
    for mode in [ExtractionMode::Rules, ExtractionMode::Hybrid, ExtractionMode::Ml] {
        let ready = mode_ready(models, mode);
        println!("  {} {} mode", mark(ready), mode);
    }

    Ok(())
}

fn mode_ready(models: &ModelConfig, mode: ExtractionMode) -> bool {
    let status = artifact_status(models);
    mode.required_fields().iter().all(|kind| {
        status
            .iter()
            .any(|s| s.kind == *kind && s.is_complete())
    })
}

fn check_mode(models: &ModelConfig, mode: ExtractionMode) -> anyhow::Result<()> {
    let store = ModelStore::load(models, mode.required_fields())?;

    println!(
        "{} {} mode ready: {} field model(s) loaded from {}",
        style("✓").green(),
        style(mode).cyan().bold(),
        store.len(),
        models.model_dir.display()
    );
    Ok(())
}
