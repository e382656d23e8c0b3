//! Serve command - run the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use console::style;
use tracing::info;

use billscan_core::models::config::BillscanConfig;
use billscan_core::{build_extractor, create_adapter, ExtractionMode, GenerationClient};
use billscan_server::{build_router, serve, AppState};

use super::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to bind, e.g. 0.0.0.0:8080
    #[arg(short, long)]
    bind: Option<String>,

    /// Extraction mode for /process_bill
    #[arg(short, long, value_parser = parse_mode)]
    mode: Option<ExtractionMode>,

    /// Model artifact directory
    #[arg(long)]
    model_dir: Option<PathBuf>,

    /// OCR engine data directory
    #[arg(long)]
    ocr_data_dir: Option<PathBuf>,

    /// Start without an OCR engine
    #[arg(long)]
    no_ocr: bool,

    /// Generation endpoint URL
    #[arg(long)]
    llm_url: Option<String>,

    /// Generation model name
    #[arg(long)]
    llm_model: Option<String>,
}

pub(crate) fn parse_mode(s: &str) -> Result<ExtractionMode, String> {
    s.parse()
}

impl ServeArgs {
    fn apply(self, config: &mut BillscanConfig) {
        if let Some(bind) = self.bind {
            config.server.bind = bind;
        }
        if let Some(mode) = self.mode {
            config.extraction.mode = mode;
        }
        if let Some(dir) = self.model_dir {
            config.models.model_dir = dir;
        }
        if let Some(dir) = self.ocr_data_dir {
            config.ocr.data_dir = dir;
        }
        if self.no_ocr {
            config.ocr.enabled = false;
        }
        if let Some(url) = self.llm_url {
            config.llm.endpoint = url;
        }
        if let Some(model) = self.llm_model {
            config.llm.model = model;
        }
    }
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;
    args.apply(&mut config);

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind))?;

    // Everything below is built once; a missing artifact stops startup.
    let extractor = build_extractor(config.extraction.mode, &config.models)
        .context("failed to load model artifacts")?;
    let ocr = create_adapter(&config.ocr).context("failed to start OCR engine")?;
    let llm = GenerationClient::new(&config.llm);

    info!(
        "Mode {}, OCR {}, generation via {} ({})",
        config.extraction.mode,
        ocr.as_ref().map_or("disabled", |o| o.backend_name()),
        llm.endpoint(),
        llm.model()
    );

    let state = AppState::new(extractor, ocr, llm);
    let router = build_router(state, config.server.max_body_bytes);

    eprintln!(
        "{} billscan {} listening on {}",
        style("✓").green(),
        config.extraction.mode,
        style(addr).cyan()
    );

    serve(addr, router).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_flags_override_config() {
        let args = ServeArgs {
            bind: Some("127.0.0.1:3000".to_string()),
            mode: Some(ExtractionMode::Hybrid),
            model_dir: None,
            ocr_data_dir: None,
            no_ocr: true,
            llm_url: None,
            llm_model: Some("llama3".to_string()),
        };

        let mut config = BillscanConfig::default();
        args.apply(&mut config);

        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.extraction.mode, ExtractionMode::Hybrid);
        assert!(!config.ocr.enabled);
        assert_eq!(config.llm.model, "llama3");
        assert_eq!(config.llm.endpoint, "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("ml").unwrap(), ExtractionMode::Ml);
        assert!(parse_mode("deep").is_err());
    }
}
