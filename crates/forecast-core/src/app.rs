use anyhow::Result;
use std::sync::Arc;

use crate::Config;

/// Application state and lifecycle manager
pub struct App {
    config: Arc<Config>,
}

impl App {
    /// Create an application around an already-loaded config
    pub fn with_config(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Make sure the data directory exists
    pub fn initialize(&mut self) -> Result<()> {
        std::fs::create_dir_all(&self.config.data_dir)?;
        tracing::info!(
            "Application initialized, data directory {}",
            self.config.data_dir.display()
        );
        Ok(())
    }

    /// Shutdown the application
    pub fn shutdown(&mut self) -> Result<()> {
        tracing::info!("Shutting down application");
        Ok(())
    }

    /// Get reference to application config
    pub fn config(&self) -> &Config {
        &self.config
    }
}
