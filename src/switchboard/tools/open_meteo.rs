//! Geocoding and current-conditions lookups against the Open-Meteo APIs.
//!
//! The weather agent depends on the [`Geocoder`] and [`ForecastService`] traits; [`OpenMeteo`]
//! implements both over HTTP. Any non-2xx answer is a failure of that call.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::switchboard::agent::{AgentError, TemperatureUnit};
use crate::switchboard::tools::http_client::{HttpClient, HttpClientError};

pub const GEOCODING_BASE_URL: &str = "https://geocoding-api.open-meteo.com";
pub const FORECAST_BASE_URL: &str = "https://api.open-meteo.com";

/// First geocoding hit for a place name.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoPlace {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// The `current_weather` block of a forecast.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub weathercode: i64,
    #[serde(default)]
    pub windspeed: Option<f64>,
    #[serde(default)]
    pub winddirection: Option<f64>,
    #[serde(default)]
    pub time: Option<String>,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a place name; `Ok(None)` when nothing matched.
    async fn geocode(&self, name: &str) -> Result<Option<GeoPlace>, AgentError>;
}

#[async_trait]
pub trait ForecastService: Send + Sync {
    async fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, AgentError>;
}

#[derive(Deserialize)]
struct GeocodingResponse {
    #[serde(default)]
    results: Option<Vec<GeoPlace>>,
}

#[derive(Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    current_weather: Option<CurrentWeather>,
}

fn service_error(context: &str) -> impl Fn(HttpClientError) -> AgentError + '_ {
    move |e| AgentError::Service(format!("{}: {}", context, e))
}

/// HTTP client for the public Open-Meteo geocoding and forecast endpoints.
#[derive(Debug, Clone)]
pub struct OpenMeteo {
    geocoding: HttpClient,
    forecast: HttpClient,
}

impl Default for OpenMeteo {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteo {
    pub fn new() -> Self {
        Self::with_base_urls(GEOCODING_BASE_URL, FORECAST_BASE_URL)
    }

    pub fn with_base_urls(geocoding: &str, forecast: &str) -> Self {
        Self {
            geocoding: HttpClient::new(geocoding),
            forecast: HttpClient::new(forecast),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.geocoding = self.geocoding.with_timeout(timeout);
        self.forecast = self.forecast.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl Geocoder for OpenMeteo {
    async fn geocode(&self, name: &str) -> Result<Option<GeoPlace>, AgentError> {
        let response = self
            .geocoding
            .get(
                "/v1/search",
                &[("name", name), ("count", "1"), ("language", "en"), ("format", "json")],
            )
            .await
            .map_err(service_error("Geocoding API error"))?;
        if !response.is_success() {
            return Err(AgentError::Service(format!(
                "Geocoding API error: {}",
                response.status
            )));
        }
        let parsed: GeocodingResponse = serde_json::from_str(&response.body)
            .map_err(|e| AgentError::Service(format!("Geocoding API error: {}", e)))?;
        Ok(parsed.results.and_then(|r| r.into_iter().next()))
    }
}

#[async_trait]
impl ForecastService for OpenMeteo {
    async fn current_weather(
        &self,
        latitude: f64,
        longitude: f64,
        unit: TemperatureUnit,
    ) -> Result<CurrentWeather, AgentError> {
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let response = self
            .forecast
            .get(
                "/v1/forecast",
                &[
                    ("latitude", latitude.as_str()),
                    ("longitude", longitude.as_str()),
                    ("current_weather", "true"),
                    ("temperature_unit", unit.as_str()),
                ],
            )
            .await
            .map_err(service_error("Forecast API error"))?;
        if !response.is_success() {
            return Err(AgentError::Service(format!(
                "Forecast API error: {}",
                response.status
            )));
        }
        let parsed: ForecastResponse = serde_json::from_str(&response.body)
            .map_err(|e| AgentError::Service(format!("Forecast API error: {}", e)))?;
        parsed.current_weather.ok_or_else(|| {
            AgentError::Service("No current weather data in forecast response.".into())
        })
    }
}
