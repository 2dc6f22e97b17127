//! Weather tool.
//!
//! Geolocates the machine via ipinfo.io, then fetches current, high, and low
//! temperatures from the open-meteo forecast API and returns a one-line
//! summary the model can quote in notes and reports.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{MuleError, Result};

use super::{Tool, ToolContext};

const IPINFO_URL: &str = "https://ipinfo.io/json";
const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Geolocation response from ipinfo.io.
#[derive(Debug, Deserialize)]
struct IpInfoResponse {
    /// "lat,lon" pair
    loc: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Forecast response from open-meteo.
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
    daily: DailyWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
}

#[derive(Debug, Deserialize)]
struct DailyWeather {
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
}

/// Tool reporting the weather at the machine's IP-derived location.
pub struct WeatherTool {
    client: Client,
}

impl WeatherTool {
    /// Create a new weather tool with a default HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a weather tool with a custom HTTP client.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Render the summary line from location and forecast data.
    fn summarize(loc: &IpInfoResponse, forecast: &ForecastResponse, date: &str) -> Result<String> {
        let high = forecast
            .daily
            .temperature_2m_max
            .first()
            .ok_or_else(|| MuleError::Tool("forecast response missing daily highs".to_string()))?;
        let low = forecast
            .daily
            .temperature_2m_min
            .first()
            .ok_or_else(|| MuleError::Tool("forecast response missing daily lows".to_string()))?;

        Ok(format!(
            "Country: {}, City: {}, Date: {}, Current: {}°C, High: {}°C, Low: {}°C",
            loc.country.as_deref().unwrap_or("unknown"),
            loc.region.as_deref().unwrap_or("unknown"),
            date,
            forecast.current.temperature_2m,
            high,
            low,
        ))
    }
}

impl Default for WeatherTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather_from_ip"
    }

    fn description(&self) -> &str {
        "Gets the current, high, and low temperature in Celsius for this machine's location"
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn invoke(&self, _args: Value, _ctx: &ToolContext) -> Result<String> {
        let loc: IpInfoResponse = self.client.get(IPINFO_URL).send().await?.json().await?;
        debug!(loc = %loc.loc, "Geolocated via ipinfo.io");

        let (lat, lon) = loc
            .loc
            .split_once(',')
            .ok_or_else(|| MuleError::Tool(format!("unexpected location format: {}", loc.loc)))?;

        let forecast: ForecastResponse = self
            .client
            .get(FORECAST_URL)
            .query(&[
                ("latitude", lat),
                ("longitude", lon),
                ("current", "temperature_2m"),
                ("daily", "temperature_2m_max,temperature_2m_min"),
                ("temperature_unit", "celsius"),
                ("timezone", "auto"),
            ])
            .send()
            .await?
            .json()
            .await?;

        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        Self::summarize(&loc, &forecast, &today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_loc() -> IpInfoResponse {
        IpInfoResponse {
            loc: "48.8566,2.3522".to_string(),
            region: Some("Ile-de-France".to_string()),
            country: Some("FR".to_string()),
        }
    }

    fn sample_forecast() -> ForecastResponse {
        ForecastResponse {
            current: CurrentWeather {
                temperature_2m: 18.5,
            },
            daily: DailyWeather {
                temperature_2m_max: vec![22.1],
                temperature_2m_min: vec![12.3],
            },
        }
    }

    #[test]
    fn test_weather_tool_metadata() {
        let tool = WeatherTool::new();
        assert_eq!(tool.name(), "weather_from_ip");
        assert!(tool.description().contains("Celsius"));
    }

    #[test]
    fn test_summarize() {
        let summary =
            WeatherTool::summarize(&sample_loc(), &sample_forecast(), "2025-06-01").unwrap();
        assert_eq!(
            summary,
            "Country: FR, City: Ile-de-France, Date: 2025-06-01, Current: 18.5°C, High: 22.1°C, Low: 12.3°C"
        );
    }

    #[test]
    fn test_summarize_missing_fields() {
        let loc = IpInfoResponse {
            loc: "0,0".to_string(),
            region: None,
            country: None,
        };
        let summary = WeatherTool::summarize(&loc, &sample_forecast(), "2025-06-01").unwrap();
        assert!(summary.contains("Country: unknown"));
        assert!(summary.contains("City: unknown"));
    }

    #[test]
    fn test_summarize_empty_daily() {
        let forecast = ForecastResponse {
            current: CurrentWeather {
                temperature_2m: 10.0,
            },
            daily: DailyWeather {
                temperature_2m_max: vec![],
                temperature_2m_min: vec![],
            },
        };
        let err = WeatherTool::summarize(&sample_loc(), &forecast, "2025-06-01").unwrap_err();
        assert!(err.to_string().contains("daily highs"));
    }

    #[test]
    fn test_ipinfo_parsing() {
        let json = r#"{"loc": "35.68,139.69", "region": "Tokyo", "country": "JP", "ip": "1.2.3.4"}"#;
        let parsed: IpInfoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.loc, "35.68,139.69");
        assert_eq!(parsed.region.as_deref(), Some("Tokyo"));
    }

    #[test]
    fn test_forecast_parsing() {
        let json = r#"{
            "current": {"temperature_2m": 18.5, "time": "2025-06-01T12:00"},
            "daily": {
                "temperature_2m_max": [22.1],
                "temperature_2m_min": [12.3],
                "time": ["2025-06-01"]
            }
        }"#;
        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.current.temperature_2m, 18.5);
        assert_eq!(parsed.daily.temperature_2m_max[0], 22.1);
    }
}
