pub mod config;
pub mod error;
pub mod storage;

pub use config::{CarouselConfig, Config, HomeLocation, UnitSystem, ValidationResult, WeatherConfig};
pub use error::{AppError, ConfigError, StorageError};
pub use storage::{load_record, save_record, JsonFileStore, KeyValueStore, MemoryStore};

use anyhow::Result;

/// Initialize logging for the application
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Vader core initialized");
    Ok(())
}
