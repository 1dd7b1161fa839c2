//! Current conditions for a place name or a coordinate pair.
//!
//! A place name is sanitised (trailing punctuation stripped), geocoded using only the part
//! before its first comma, and reported under the geocoder's name when it supplies one.
//! Coordinates skip geocoding and are reported as `"Coords: {lat}, {lon}"`. Reports are cached
//! per lookup and unit for a configurable TTL.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::switchboard::agent::{
    decode_validated, Agent, AgentError, AgentInput, AgentOutput, WeatherInput, WeatherReport,
};
use crate::switchboard::schema::{FieldSpec, FieldType, ObjectSchema, Schema, Violation};
use crate::switchboard::tools::open_meteo::{ForecastService, Geocoder};

pub const NAME: &str = "weather";

lazy_static! {
    static ref TRAILING_JUNK: Regex = Regex::new(r"[^a-zA-Z0-9\s,]+$").unwrap();
}

/// Human-readable conditions for an Open-Meteo weather code.
pub fn describe_weather_code(code: i64) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        _ => "Unknown",
    }
}

/// Strip trailing characters other than letters, digits, whitespace and commas, then trim.
pub fn sanitize_location(location: &str) -> String {
    TRAILING_JUNK.replace(location, "").trim().to_string()
}

fn weather_input_refinement(fields: &Map<String, Value>) -> Option<Violation> {
    let has_location = fields
        .get("location")
        .and_then(Value::as_str)
        .map_or(false, |l| !l.is_empty());
    let has_coords = fields.contains_key("latitude") && fields.contains_key("longitude");
    if has_location || has_coords {
        None
    } else {
        Some(Violation::new(
            Vec::new(),
            "Either location or both latitude and longitude must be provided.",
        ))
    }
}

struct CachedReport {
    report: WeatherReport,
    expires_at: Instant,
}

pub struct WeatherAgent {
    geocoder: Arc<dyn Geocoder>,
    forecast: Arc<dyn ForecastService>,
    cache_ttl: Duration,
    cache: Mutex<HashMap<String, CachedReport>>,
    input_schema: Schema,
    output_schema: Schema,
}

impl WeatherAgent {
    pub fn new(geocoder: Arc<dyn Geocoder>, forecast: Arc<dyn ForecastService>) -> Self {
        let units = ["celsius", "fahrenheit"];
        Self {
            geocoder,
            forecast,
            cache_ttl: Duration::from_secs(5 * 60),
            cache: Mutex::new(HashMap::new()),
            input_schema: Schema::Object(
                ObjectSchema::new()
                    .field(
                        FieldSpec::new("location", FieldType::String)
                            .with_description("City or place name, e.g. \"Paris, France\""),
                    )
                    .field(
                        FieldSpec::new("unit", FieldType::String)
                            .one_of(&units)
                            .with_default(Value::from("fahrenheit")),
                    )
                    .field(FieldSpec::new("latitude", FieldType::Number))
                    .field(FieldSpec::new("longitude", FieldType::Number))
                    .refine(weather_input_refinement),
            ),
            output_schema: Schema::Object(
                ObjectSchema::new()
                    .field(FieldSpec::new("location", FieldType::String).required())
                    .field(FieldSpec::new("temperature", FieldType::Number).required())
                    .field(FieldSpec::new("unit", FieldType::String).one_of(&units).required())
                    .field(FieldSpec::new("conditions", FieldType::String).required()),
            ),
        }
    }

    /// How long a report is served from cache. Zero disables caching.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Number of reports currently held, expired ones included until the next write.
    pub fn cached_entries(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    fn cached(&self, key: &str) -> Option<WeatherReport> {
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.report.clone()),
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    fn remember(&self, key: String, report: &WeatherReport) {
        if self.cache_ttl.is_zero() {
            return;
        }
        let now = Instant::now();
        let mut cache = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cache.retain(|_, entry| entry.expires_at > now);
        cache.insert(
            key,
            CachedReport {
                report: report.clone(),
                expires_at: now + self.cache_ttl,
            },
        );
    }

    async fn lookup(&self, input: WeatherInput) -> Result<WeatherReport, AgentError> {
        let (location, latitude, longitude) = match (input.latitude, input.longitude) {
            (Some(latitude), Some(longitude)) => {
                log::info!(
                    "[Agent: weather] Lookup for coords: {}, {} in {}",
                    latitude,
                    longitude,
                    input.unit.as_str()
                );
                (
                    format!("Coords: {:.2}, {:.2}", latitude, longitude),
                    latitude,
                    longitude,
                )
            }
            _ => {
                let location = input
                    .location
                    .as_deref()
                    .map(sanitize_location)
                    .filter(|l| !l.is_empty())
                    .ok_or_else(|| {
                        AgentError::InvalidInput("Location name or coordinates required.".into())
                    })?;
                let simple = location.split(',').next().unwrap_or("").trim().to_string();
                log::info!(
                    "[Agent: weather] Geocoding \"{}\" in {}",
                    simple,
                    input.unit.as_str()
                );
                let place = self
                    .geocoder
                    .geocode(&simple)
                    .await?
                    .ok_or_else(|| AgentError::NotFound(format!("Location not found: {}", location)))?;
                let name = place.name.filter(|n| !n.is_empty()).unwrap_or(location);
                (name, place.latitude, place.longitude)
            }
        };

        let current = self
            .forecast
            .current_weather(latitude, longitude, input.unit)
            .await?;

        Ok(WeatherReport {
            location,
            temperature: current.temperature,
            unit: input.unit,
            conditions: describe_weather_code(current.weathercode).to_string(),
        })
    }
}

fn cache_key(input: &WeatherInput) -> String {
    match (input.latitude, input.longitude) {
        (Some(lat), Some(lon)) => format!("{},{}-{}", lat, lon, input.unit.as_str()),
        _ => format!(
            "{}-{}",
            input.location.as_deref().unwrap_or("").to_lowercase(),
            input.unit.as_str()
        ),
    }
}

#[async_trait]
impl Agent for WeatherAgent {
    fn name(&self) -> &str {
        NAME
    }

    fn description(&self) -> &str {
        "Provides current weather conditions and temperature forecasts for a specific location."
    }

    fn input_schema(&self) -> &Schema {
        &self.input_schema
    }

    fn output_schema(&self) -> &Schema {
        &self.output_schema
    }

    fn from_validated(&self, value: Value) -> Result<AgentInput, Vec<Violation>> {
        decode_validated(value).map(AgentInput::Weather)
    }

    async fn execute(&self, input: AgentInput) -> Result<AgentOutput, AgentError> {
        let input = match input {
            AgentInput::Weather(input) => input,
            other => return Err(AgentError::wrong_input(NAME, &other)),
        };

        let key = cache_key(&input);
        if let Some(report) = self.cached(&key) {
            log::debug!("[Agent: weather] Cache hit for {}", key);
            return Ok(AgentOutput::Weather(report));
        }

        let report = self.lookup(input).await.map_err(|e| {
            log::error!("[Agent: weather] Error during execution: {}", e);
            e
        })?;
        self.remember(key, &report);
        Ok(AgentOutput::Weather(report))
    }
}
