//! Subcommands and the configuration loading they share.

pub mod config;
pub mod extract;
pub mod models;
pub mod serve;

use std::path::{Path, PathBuf};

use tracing::debug;

use billscan_core::BillscanConfig;

/// `<config dir>/billscan/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("billscan")
        .join("config.json")
}

/// Read the config file without environment overrides.
///
/// An explicit path must exist; the default path is optional.
pub fn read_config_file(config_path: Option<&str>) -> anyhow::Result<BillscanConfig> {
    let config = match config_path {
        Some(path) => BillscanConfig::from_file(Path::new(path))?,
        None => {
            let path = default_config_path();
            if path.exists() {
                debug!("Using config file {}", path.display());
                BillscanConfig::from_file(&path)?
            } else {
                BillscanConfig::default()
            }
        }
    };
    Ok(config)
}

/// Config file, then `BILLSCAN_*` environment overrides.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<BillscanConfig> {
    let mut config = read_config_file(config_path)?;
    config.apply_env()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(read_config_file(missing.to_str()).is_err());
    }

    #[test]
    fn test_explicit_path_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "llm": { "model": "llama3" } }"#).unwrap();

        let config = read_config_file(path.to_str()).unwrap();
        assert_eq!(config.llm.model, "llama3");
    }
}
