//! End-to-end tests for WeatherProvider against a mock HTTP server, feeding
//! the weather cache.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use vader_core::{JsonFileStore, KeyValueStore, UnitSystem, WeatherConfig};
use vader_weather::{CacheEntry, CoordinateKey, WeatherCacheStore, WeatherProvider, WeatherSource};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn malmo_weather() -> serde_json::Value {
    serde_json::json!({
        "coord": {"lat": 55.6059, "lon": 13.0007},
        "weather": [{"id": 500, "main": "Rain", "description": "lätt regn", "icon": "10d"}],
        "main": {"temp": 12.4, "feels_like": 11.8, "temp_min": 11.0, "temp_max": 13.2,
                 "pressure": 1009, "humidity": 81},
        "visibility": 8000,
        "wind": {"speed": 7.2, "gust": 11.3, "deg": 250},
        "clouds": {"all": 90},
        "rain": {"1h": 0.6},
        "sys": {"country": "SE", "sunrise": 1717208900, "sunset": 1717270600},
        "timezone": 7200,
        "name": "Malmö",
        "dt": 1717250000
    })
}

fn malmo_forecast() -> serde_json::Value {
    serde_json::json!({
        "list": [
            {"dt": 1717250400, "main": {"temp": 12.0, "temp_min": 11.5, "temp_max": 12.5},
             "weather": [{"description": "lätt regn"}], "pop": 0.7, "rain": {"3h": 1.1}},
            {"dt": 1717261200, "main": {"temp": 10.0, "temp_min": 9.0, "temp_max": 10.4},
             "weather": [{"description": "mulet"}], "pop": 0.2}
        ],
        "city": {"name": "Malmö", "country": "SE", "timezone": 7200,
                 "coord": {"lat": 55.6059, "lon": 13.0007}}
    })
}

async fn mount_malmo(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Malmö"))
        .and(query_param("lang", "sv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(malmo_weather()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .and(query_param("lat", "55.6059"))
        .and(query_param("lon", "13.0007"))
        .respond_with(ResponseTemplate::new(200).set_body_json(malmo_forecast()))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_weather_then_forecast_lands_in_cache() {
    let server = MockServer::start().await;
    mount_malmo(&server).await;
    let provider = WeatherProvider::with_base_url("test_key", &server.uri());

    let weather = provider
        .current_by_name("Malmö", UnitSystem::Metric)
        .await
        .unwrap();
    let forecast = provider
        .forecast_by_coords(weather.coord.lat, weather.coord.lon, UnitSystem::Metric)
        .await
        .unwrap();

    assert_eq!(weather.label(), "Malmö, SE");
    assert_eq!(weather.precipitation_mm(), Some(0.6));
    assert_eq!(weather.visibility_km(), Some(8.0));
    assert_eq!(forecast.local_day_range(1717250000), Some((9.0, 12.5)));

    let dir = tempfile::tempdir().unwrap();
    let key = CoordinateKey::new(weather.coord.lat, weather.coord.lon);
    let entry = CacheEntry { weather, forecast };
    {
        let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let mut cache = WeatherCacheStore::load(store);
        cache.put(key.clone(), entry.clone());
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::open(dir.path()).unwrap());
    let cache = WeatherCacheStore::load(store);
    assert_eq!(key.as_str(), "55.6059,13.0007");
    assert_eq!(cache.get(&key), Some(&entry));
}

#[tokio::test]
async fn test_provider_from_config() {
    let server = MockServer::start().await;
    mount_malmo(&server).await;

    let config = WeatherConfig {
        api_base_url: format!("{}/", server.uri()),
        api_key: "configured_key".to_string(),
        ..WeatherConfig::default()
    };
    let provider = WeatherProvider::new(&config).unwrap();

    let weather = provider
        .current_by_name("Malmö", UnitSystem::Metric)
        .await
        .unwrap();
    assert_eq!(weather.name, "Malmö");
}

#[tokio::test]
async fn test_suggestions_through_source_trait() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/geo/1.0/direct"))
        .and(query_param("q", "Malm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"name": "Malmö", "country": "SE", "lat": 55.6059, "lon": 13.0007},
            {"name": "Malmberget", "state": "Norrbotten", "country": "SE", "lat": 67.17, "lon": 20.66}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let provider = WeatherProvider::with_base_url("test_key", &server.uri());
    let suggestions = provider.suggest("Malm", 5).await.unwrap();

    let labels: Vec<_> = suggestions.iter().map(|s| s.label()).collect();
    assert_eq!(labels, vec!["Malmö, SE", "Malmberget, Norrbotten, SE"]);
}
