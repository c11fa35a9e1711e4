//! Scripted weather source and surfaces shared by the engine tests.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use vader_carousel::{CarouselSurface, MapHost, MapWidget, MarkerId, SurfaceId, WeatherApp};
use vader_core::{Config, KeyValueStore, MemoryStore};
use vader_weather::{
    CoordinateKey, ForecastSnapshot, Suggestion, UnitSystem, WeatherError, WeatherSnapshot,
    WeatherSource,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    WeatherByName(String),
    WeatherByCoords(CoordinateKey),
    Forecast(CoordinateKey),
    Suggest(String),
}

#[derive(Debug, Clone)]
pub struct City {
    pub name: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub temp: f64,
}

pub const STOCKHOLM: City = City {
    name: "Stockholm",
    country: "SE",
    lat: 59.33,
    lon: 18.07,
    temp: 21.0,
};

pub const MALMO: City = City {
    name: "Malmö",
    country: "SE",
    lat: 55.6,
    lon: 13.0,
    temp: 14.0,
};

pub const GOTEBORG: City = City {
    name: "Göteborg",
    country: "SE",
    lat: 57.7,
    lon: 11.97,
    temp: 16.0,
};

pub const STORUMAN: City = City {
    name: "Storuman",
    country: "SE",
    lat: 65.1,
    lon: 17.1,
    temp: 4.0,
};

impl City {
    pub fn key(&self) -> CoordinateKey {
        CoordinateKey::new(self.lat, self.lon)
    }

    pub fn label(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    pub fn place(&self) -> vader_weather::Place {
        vader_weather::Place::new(self.label(), self.lat, self.lon)
    }
}

#[derive(Default)]
struct Script {
    cities: Vec<City>,
    calls: Vec<Call>,
    delays: HashMap<CoordinateKey, Duration>,
    failing_forecasts: HashSet<CoordinateKey>,
    suggest_delay: Duration,
    suggest_fails: bool,
}

/// In-memory weather provider. Clones share one script and call log.
#[derive(Clone, Default)]
pub struct FakeSource {
    script: Arc<Mutex<Script>>,
}

impl FakeSource {
    pub fn new() -> Self {
        let source = Self::default();
        source.script.lock().cities = vec![STOCKHOLM, MALMO, GOTEBORG, STORUMAN];
        source
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().calls.clone()
    }

    pub fn weather_calls_for(&self, city: &City) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == Call::WeatherByCoords(city.key()))
            .count()
    }

    pub fn suggest_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Suggest(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    /// Delay weather responses for `city`, by name or coordinates.
    pub fn delay(&self, city: &City, delay: Duration) {
        self.script.lock().delays.insert(city.key(), delay);
    }

    pub fn fail_forecast(&self, city: &City) {
        self.script.lock().failing_forecasts.insert(city.key());
    }

    pub fn delay_suggestions(&self, delay: Duration) {
        self.script.lock().suggest_delay = delay;
    }

    pub fn fail_suggestions(&self) {
        self.script.lock().suggest_fails = true;
    }

    fn record(&self, call: Call) {
        self.script.lock().calls.push(call);
    }

    fn city_named(&self, name: &str) -> Option<City> {
        let wanted = name.split(',').next().unwrap_or(name).trim().to_lowercase();
        self.script
            .lock()
            .cities
            .iter()
            .find(|c| c.name.to_lowercase() == wanted)
            .cloned()
    }

    fn city_at(&self, lat: f64, lon: f64) -> Option<City> {
        let key = CoordinateKey::new(lat, lon);
        self.script
            .lock()
            .cities
            .iter()
            .find(|c| c.key() == key)
            .cloned()
    }

    fn delay_for(&self, key: &CoordinateKey) -> Duration {
        self.script
            .lock()
            .delays
            .get(key)
            .copied()
            .unwrap_or_default()
    }

    async fn respond(&self, city: &City, units: UnitSystem) -> WeatherSnapshot {
        let delay = self.delay_for(&city.key());
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        weather_snapshot(city, units)
    }
}

pub fn weather_snapshot(city: &City, units: UnitSystem) -> WeatherSnapshot {
    let temp = match units {
        UnitSystem::Metric => city.temp,
        UnitSystem::Imperial => city.temp * 9.0 / 5.0 + 32.0,
    };
    serde_json::from_value(serde_json::json!({
        "coord": {"lat": city.lat, "lon": city.lon},
        "weather": [{"id": 800, "main": "Clear", "description": "klar himmel", "icon": "01d"}],
        "main": {"temp": temp, "feels_like": temp, "temp_min": temp - 2.0, "temp_max": temp + 2.0,
                 "pressure": 1015, "humidity": 60},
        "visibility": 10000,
        "wind": {"speed": 3.0},
        "sys": {"country": city.country, "sunrise": 1717208000, "sunset": 1717273000},
        "timezone": 7200,
        "name": city.name,
        "dt": 1717250000
    }))
    .unwrap()
}

pub fn forecast_snapshot(city: &City) -> ForecastSnapshot {
    serde_json::from_value(serde_json::json!({
        "list": [
            {"dt": 1717250400, "main": {"temp": city.temp, "temp_min": city.temp - 1.0,
                                        "temp_max": city.temp + 1.0}},
            {"dt": 1717261200, "main": {"temp": city.temp - 3.0}}
        ],
        "city": {"name": city.name, "country": city.country, "timezone": 7200}
    }))
    .unwrap()
}

impl WeatherSource for FakeSource {
    async fn current_by_name(
        &self,
        name: &str,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.record(Call::WeatherByName(name.to_string()));
        match self.city_named(name) {
            Some(city) => Ok(self.respond(&city, units).await),
            None => Err(WeatherError::NotFound(format!("404: {}", name))),
        }
    }

    async fn current_by_coords(
        &self,
        lat: f64,
        lon: f64,
        units: UnitSystem,
    ) -> Result<WeatherSnapshot, WeatherError> {
        self.record(Call::WeatherByCoords(CoordinateKey::new(lat, lon)));
        match self.city_at(lat, lon) {
            Some(city) => Ok(self.respond(&city, units).await),
            None => Err(WeatherError::NotFound(format!("404: {},{}", lat, lon))),
        }
    }

    async fn forecast_by_coords(
        &self,
        lat: f64,
        lon: f64,
        _units: UnitSystem,
    ) -> Result<ForecastSnapshot, WeatherError> {
        let key = CoordinateKey::new(lat, lon);
        self.record(Call::Forecast(key.clone()));
        let failing = self.script.lock().failing_forecasts.contains(&key);
        if failing {
            return Err(WeatherError::ForecastUnavailable("503".to_string()));
        }
        match self.city_at(lat, lon) {
            Some(city) => Ok(forecast_snapshot(&city)),
            None => Err(WeatherError::ForecastUnavailable("404".to_string())),
        }
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>, WeatherError> {
        self.record(Call::Suggest(query.to_string()));
        let (delay, fails) = {
            let script = self.script.lock();
            (script.suggest_delay, script.suggest_fails)
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(WeatherError::SuggestionsUnavailable("500".to_string()));
        }

        let prefix = query.to_lowercase();
        let cities = self.script.lock().cities.clone();
        Ok(cities
            .iter()
            .filter(|c| c.name.to_lowercase().starts_with(&prefix))
            .take(limit)
            .map(|c| Suggestion {
                name: c.name.to_string(),
                state: None,
                country: Some(c.country.to_string()),
                lat: c.lat,
                lon: c.lon,
            })
            .collect())
    }
}

/// Records every scroll command.
#[derive(Default)]
pub struct RecordingSurface {
    pub scrolls: Mutex<Vec<usize>>,
}

impl CarouselSurface for RecordingSurface {
    fn scroll_to(&self, index: usize) {
        self.scrolls.lock().push(index);
    }
}

/// Map host with a single fixed surface; records marker positions.
#[derive(Default)]
pub struct RecordingMap {
    pub markers: Arc<Mutex<Vec<(f64, f64)>>>,
    pub widgets: Mutex<usize>,
}

struct RecordingWidget {
    markers: Arc<Mutex<Vec<(f64, f64)>>>,
    next: MarkerId,
}

impl MapWidget for RecordingWidget {
    fn add_marker(&mut self, lat: f64, lon: f64) -> MarkerId {
        self.markers.lock().push((lat, lon));
        self.next += 1;
        self.next
    }

    fn remove_marker(&mut self, _marker: MarkerId) {}

    fn set_view(&mut self, _lat: f64, _lon: f64, _zoom: u8) {}

    fn teardown(&mut self) {}
}

impl MapHost for RecordingMap {
    fn surface(&self) -> Option<SurfaceId> {
        Some(1)
    }

    fn create_widget(&self, _surface: SurfaceId) -> Box<dyn MapWidget> {
        *self.widgets.lock() += 1;
        Box::new(RecordingWidget {
            markers: self.markers.clone(),
            next: 0,
        })
    }
}

pub fn memory_store() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

pub fn app_with_store(source: &FakeSource, store: Arc<dyn KeyValueStore>) -> WeatherApp<FakeSource> {
    WeatherApp::new(source.clone(), store, &Config::default())
}

pub fn app(source: &FakeSource) -> WeatherApp<FakeSource> {
    app_with_store(source, memory_store())
}

/// Let spawned tasks and (paused) timers run to completion.
pub async fn settle_for(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
