use std::sync::Arc;

use vader_carousel::WeatherApp;
use vader_core::{AppError, Config, JsonFileStore, KeyValueStore};
use vader_weather::{location, WeatherProvider};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    vader_core::init()?;

    if let Err(e) = run().await {
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }
    Ok(())
}

async fn run() -> Result<(), AppError> {
    let (config, validation) = Config::load_validated()?;
    if !validation.warnings.is_empty() {
        tracing::info!("Loaded config with {} warning(s)", validation.warnings.len());
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(config.state_dir())?);
    let provider = WeatherProvider::new(&config.weather)?;
    let app = WeatherApp::new(provider, store, &config);

    let here = match location::get_current_location(config.weather.home).await {
        Ok(location) => Some(location),
        Err(e) => {
            tracing::info!("Location unavailable ({}), using {}", e, config.weather.default_city);
            None
        }
    };

    if let Err(e) = app.boot(here).await {
        tracing::warn!("Boot fetch failed: {}", e);
    }

    let view = app.snapshot();
    println!("Vader - {}", view.city);
    if let Some(error) = &view.error {
        println!("  ! {}", error);
    }
    for (index, panel) in app.panels().iter().enumerate() {
        let marker = if index == view.active_index { '>' } else { ' ' };
        let temp = panel
            .cached
            .as_ref()
            .and_then(|entry| entry.weather.main.temp)
            .map(|t| format!("{:.1}{}", t, view.units.temperature_suffix()))
            .unwrap_or_else(|| "--".to_string());
        println!(
            "{} {:<28} {:>8}  {:?}",
            marker, panel.entry.place.name, temp, panel.entry.role
        );
    }

    Ok(())
}
