//! CLI subcommands.

pub mod batch;
pub mod config;
pub mod export;
pub mod process;

use contex_core::models::config::ContexConfig;

/// Load configuration from an explicit path, or fall back to defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<ContexConfig> {
    match config_path {
        Some(path) => Ok(ContexConfig::from_file(std::path::Path::new(path))?),
        None => Ok(ContexConfig::default()),
    }
}
