//! Weather tools backed by the OpenWeather REST API.
//!
//! - `weather_current`: conditions right now
//! - `weather_forecast`: daily min/max over the next few days, aggregated
//!   from 3-hourly slots

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use zaprelay_core::error::ToolError;
use zaprelay_core::tool::Tool;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
/// The free forecast endpoint covers five days.
const MAX_FORECAST_DAYS: u64 = 5;
/// Forecast slots per day (3-hour steps).
const SLOTS_PER_DAY: u64 = 8;

/// Shared HTTP client for both weather tools.
pub struct OpenWeatherClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_default(),
        }
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        tool_name: &str,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, ToolError> {
        let failed = |reason: String| ToolError::ExecutionFailed {
            tool_name: tool_name.to_string(),
            reason,
        };

        let response = self
            .client
            .get(format!("{}/{endpoint}", self.base_url))
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(failed(format!("OpenWeather returned {}: {body}", status.as_u16())));
        }

        response.json().await.map_err(|e| failed(e.to_string()))
    }
}

fn city_argument(arguments: &serde_json::Value) -> Result<&str, ToolError> {
    arguments["city"]
        .as_str()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'city' argument".into()))
}

/// First letter upper-case, the rest lower-case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub struct WeatherCurrentTool {
    client: Arc<OpenWeatherClient>,
}

impl WeatherCurrentTool {
    pub fn new(client: Arc<OpenWeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherCurrentTool {
    fn name(&self) -> &str {
        "weather_current"
    }

    fn description(&self) -> &str {
        "Get the current weather for a city: temperature, conditions, humidity, and wind speed."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, optionally with country code (e.g. 'Campinas,BR')"
                }
            },
            "required": ["city"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let city = city_argument(&arguments)?;
        let current: CurrentWeather = self
            .client
            .get(self.name(), "weather", &[("q", city.to_string())])
            .await?;

        let description = current
            .weather
            .first()
            .map(|w| capitalize(&w.description))
            .unwrap_or_default();
        let output = format!(
            "Agora em {}: {}°C, {}, umidade de {}% e vento de {} m/s.",
            capitalize(city),
            current.main.temp,
            description,
            current.main.humidity,
            current.wind.speed
        );
        debug!(city, "Current weather fetched");
        Ok(output)
    }
}

pub struct WeatherForecastTool {
    client: Arc<OpenWeatherClient>,
}

impl WeatherForecastTool {
    pub fn new(client: Arc<OpenWeatherClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Tool for WeatherForecastTool {
    fn name(&self) -> &str {
        "weather_forecast"
    }

    fn description(&self) -> &str {
        "Get the daily minimum and maximum temperature forecast for a city for the next 1 to 5 days."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "city": {
                    "type": "string",
                    "description": "City name, optionally with country code"
                },
                "days": {
                    "type": "integer",
                    "description": "Number of days to forecast (1-5)",
                    "minimum": 1,
                    "maximum": 5
                }
            },
            "required": ["city", "days"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let city = city_argument(&arguments)?;
        let days = arguments["days"]
            .as_u64()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'days' argument".into()))?
            .clamp(1, MAX_FORECAST_DAYS);

        let forecast: Forecast = self
            .client
            .get(
                self.name(),
                "forecast",
                &[("q", city.to_string()), ("cnt", (days * SLOTS_PER_DAY).to_string())],
            )
            .await?;

        // An empty forecast is reported to the model as text, not as a failure.
        Ok(summarize_forecast(city, days, &forecast.list).unwrap_or_else(|| {
            format!("Não foi possível obter a previsão do tempo para {}.", capitalize(city))
        }))
    }
}

/// Group slots by calendar date and report each day's min and max.
fn summarize_forecast(city: &str, days: u64, slots: &[ForecastSlot]) -> Option<String> {
    if slots.is_empty() {
        return None;
    }

    let mut daily: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for slot in slots {
        let date = slot.dt_txt.split(' ').next().unwrap_or("Data desconhecida");
        let entry = daily
            .entry(date)
            .or_insert((slot.main.temp_min, slot.main.temp_max));
        entry.0 = entry.0.min(slot.main.temp_min);
        entry.1 = entry.1.max(slot.main.temp_max);
    }

    let days_text: Vec<String> = daily
        .iter()
        .map(|(date, (min, max))| format!("{date}: Mín {min}°C, Máx {max}°C"))
        .collect();

    Some(format!(
        "Previsão para {} para os próximos {days} dia(s): {}.",
        capitalize(city),
        days_text.join("; ")
    ))
}

// --- OpenWeather API types ---

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: CurrentMain,
    #[serde(default)]
    weather: Vec<Condition>,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
struct CurrentMain {
    temp: f64,
    humidity: u32,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct Forecast {
    #[serde(default)]
    list: Vec<ForecastSlot>,
}

#[derive(Debug, Deserialize)]
struct ForecastSlot {
    #[serde(default)]
    dt_txt: String,
    main: SlotMain,
}

#[derive(Debug, Deserialize)]
struct SlotMain {
    temp_min: f64,
    temp_max: f64,
}
