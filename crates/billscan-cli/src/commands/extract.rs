//! Extract command - run extraction on a single text file or image.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use billscan_core::ocr::sniff_mime;
use billscan_core::{build_extractor, create_adapter, ExtractionMode, GenerationClient};

use super::load_config;
use super::serve::parse_mode;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file: plain text, or an image to OCR first
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Extraction mode (default from configuration)
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<ExtractionMode>,

    /// Model artifact directory
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// Send the text to the generation endpoint instead
    #[arg(long)]
    llm: bool,

    /// Show confidence scores after the output
    #[arg(long)]
    show_confidence: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if let Some(mode) = args.mode {
        config.extraction.mode = mode;
    }
    if let Some(dir) = &args.model_dir {
        config.models.model_dir = dir.clone();
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }
    let data = fs::read(&args.input)?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let text = if is_image(&args.input, &data) {
        pb.set_message("Running OCR...");
        let ocr = create_adapter(&config.ocr)?
            .ok_or_else(|| anyhow::anyhow!("OCR is disabled in configuration"))?;
        ocr.extract_text(data).await?
    } else {
        String::from_utf8(data)
            .map_err(|_| anyhow::anyhow!("{} is neither an image nor UTF-8 text", args.input.display()))?
    };
    debug!("Input text has {} chars", text.len());

    let output = if args.llm {
        pb.set_message("Waiting for generation endpoint...");
        let reply = GenerationClient::new(&config.llm).extract(&text).await?;
        serde_json::to_string_pretty(&serde_json::json!({ "extracted_data": reply }))?
    } else {
        pb.set_message("Extracting fields...");
        let extractor = build_extractor(config.extraction.mode, &config.models)?;
        let fields = extractor.extract(&text)?;

        if args.show_confidence {
            pb.suspend(|| print_confidence(&fields));
        }

        let mut response = fields.to_response();
        response.raw_text = Some(text);
        serde_json::to_string_pretty(&response)?
    };

    pb.finish_and_clear();

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn is_image(path: &Path, data: &[u8]) -> bool {
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| matches!(e.as_str(), "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" | "webp"));
    by_extension || sniff_mime(data).is_some()
}

fn print_confidence(fields: &billscan_core::ExtractedFields) {
    eprintln!("{} Confidence ({}):", style("ℹ").blue(), fields.mode);
    for kind in billscan_core::FieldKind::ALL {
        let value = fields.get(kind);
        match value.confidence {
            Some(c) => eprintln!("  {:<9} {:.1}%", kind.as_str(), c * 100.0),
            None => eprintln!("  {:<9} {}", kind.as_str(), style("n/a").dim()),
        }
    }
}
