//! CLI configuration utilities

use anyhow::{Context, Result};
use catalog_core::CatalogConfig;
use catalog_http::{CatalogClient, CatalogClientBuilder, FileStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Load configuration from `path`, or from defaults and the environment
pub fn load_config(path: Option<&Path>, state_dir: Option<PathBuf>) -> Result<CatalogConfig> {
    let mut config = match path {
        Some(path) => CatalogConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => CatalogConfig::from_env().context("Failed to load configuration")?,
    };
    if let Some(state_dir) = state_dir {
        config.state_dir = state_dir;
    }
    Ok(config)
}

/// Client whose credentials persist in the state directory
pub fn build_client(config: &CatalogConfig) -> Result<CatalogClient> {
    let store = Arc::new(FileStore::new(config.credentials_path()));
    let client = CatalogClientBuilder::from_config(config, store).build()?;
    Ok(client)
}
