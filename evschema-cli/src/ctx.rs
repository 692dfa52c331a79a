//! Application context and state management.
//!
//! [`AppContext`] holds what every command needs: the engine configuration
//! and the schema catalog, loaded once from the paths given on the command
//! line.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use colored::Colorize;
use evschema::{
    config::EngineConfig,
    data::catalog::{BundleCatalog, SchemaCatalog},
};

/// Default configuration file looked up in the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".evschema.toml";

/// Paths given on the command line.
#[derive(Default, Clone)]
pub struct PathConfig {
    /// Catalog bundle file.
    pub catalog: PathBuf,
    /// Engine configuration file.
    pub config: Option<PathBuf>,
}

impl PathConfig {
    /// Gets the configuration path, falling back to [`DEFAULT_CONFIG_PATH`].
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

/// The main application context holding all state.
#[derive(Clone)]
pub struct AppContext {
    pub paths: PathConfig,
    pub config: EngineConfig,
    pub catalog: Arc<dyn SchemaCatalog>,
}

impl AppContext {
    /// Loads the configuration and the catalog bundle.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the catalog cannot
    /// be read.
    pub async fn load(paths: PathConfig) -> anyhow::Result<Self> {
        let config_path = paths.config_path();
        let config = EngineConfig::load(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        debug!("config: {config:?}");

        let catalog = BundleCatalog::load(&paths.catalog)
            .await
            .with_context(|| format!("Failed to load catalog {}", paths.catalog.display()))?;
        println!(
            "{}",
            format!(
                "Catalog {}: {} schemas, {} published property lists",
                paths.catalog.display(),
                catalog.schemas.len(),
                catalog.properties.len()
            )
            .dimmed()
        );

        Ok(Self {
            paths,
            config,
            catalog: Arc::new(catalog),
        })
    }
}
