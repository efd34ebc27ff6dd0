use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{Coordinate, CountryCode, Fetched, WeatherRecord},
    provider::{get_json, trim_base_url},
    units::Units,
};

use super::WeatherSource;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
const API: &str = "openweather";

/// OpenWeatherMap current-weather client.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    units: Units,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String, units: Units) -> Self {
        Self {
            api_key,
            units,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    fn normalize(&self, parsed: OwResponse) -> Result<WeatherRecord, FetchError> {
        let first = parsed
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Parse("weather array is empty".to_string()))?;

        let sys = parsed.sys.unwrap_or_default();
        let country = sys
            .country
            .ok_or_else(|| FetchError::Parse("response has no sys.country".to_string()))?
            .parse::<CountryCode>()?;

        Ok(WeatherRecord {
            location_name: parsed.name,
            country,
            temperature_k: self.units.temperature_to_kelvin(parsed.main.temp),
            feels_like_k: self.units.temperature_to_kelvin(parsed.main.feels_like),
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: self.units.speed_to_mps(parsed.wind.map_or(0.0, |w| w.speed)),
            condition: first.main,
            description: first.description,
            icon_id: first.icon,
            sunrise: sys.sunrise.and_then(unix_to_utc),
            sunset: sys.sunset.and_then(unix_to_utc),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    #[serde(default)]
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: Option<OwWind>,
    sys: Option<OwSys>,
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch(&self, coord: Coordinate) -> Fetched<WeatherRecord> {
        let url = format!("{}/weather", self.base_url);
        tracing::debug!(
            "GET {url} lat={} lon={} units={:?}",
            coord.latitude(),
            coord.longitude(),
            self.units
        );

        let mut query = vec![
            ("lat", coord.latitude().to_string()),
            ("lon", coord.longitude().to_string()),
            ("appid", self.api_key.clone()),
        ];
        if let Some(units) = self.units.query_value() {
            query.push(("units", units.to_string()));
        }

        let (parsed, headers) =
            get_json::<OwResponse>(self.http.get(&url).query(&query), API).await;
        let record = parsed.and_then(|parsed| self.normalize(parsed));

        if let Ok(record) = &record {
            tracing::info!(
                "Weather for {}, {}: {}",
                record.location_name,
                record.country,
                record.description
            );
        }

        Fetched::new(record.into(), headers)
    }
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<OwResponse, FetchError> {
        serde_json::from_str(json).map_err(FetchError::from)
    }

    #[test]
    fn normalizes_imperial_to_kelvin() {
        let client = OpenWeatherClient::new("KEY".into(), Units::Imperial);
        let parsed = parse(
            r#"{"name":"Troy","main":{"temp":32,"feels_like":32,"humidity":40},
                "weather":[{"main":"Snow","description":"light snow","icon":"13d"}],
                "wind":{"speed":10},"sys":{"country":"us"}}"#,
        )
        .unwrap();

        let record = client.normalize(parsed).unwrap();
        assert!((record.temperature_k - 273.15).abs() < 1e-9);
        assert!((record.wind_speed_mps - 4.4704).abs() < 1e-9);
        assert_eq!(record.country.as_str(), "US");
        assert_eq!(record.sunrise, None);
    }

    #[test]
    fn empty_weather_array_is_a_parse_error() {
        let client = OpenWeatherClient::new("KEY".into(), Units::Standard);
        let parsed = parse(
            r#"{"main":{"temp":280,"feels_like":279,"humidity":10},
                "weather":[],"sys":{"country":"US"}}"#,
        )
        .unwrap();

        assert!(matches!(client.normalize(parsed), Err(FetchError::Parse(_))));
    }

    #[test]
    fn missing_country_is_a_parse_error() {
        let client = OpenWeatherClient::new("KEY".into(), Units::Standard);
        let parsed = parse(
            r#"{"main":{"temp":280,"feels_like":279,"humidity":10},
                "weather":[{"main":"Clouds","description":"overcast clouds","icon":"04d"}]}"#,
        )
        .unwrap();

        assert!(matches!(client.normalize(parsed), Err(FetchError::Parse(_))));
    }

    #[test]
    fn missing_main_fails_to_deserialize() {
        assert!(parse(r#"{"weather":[]}"#).is_err());
        assert!(parse(r#"{"main":{"temp":1,"feels_like":1,"humidity":1}}"#).is_err());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client =
            OpenWeatherClient::new("KEY".into(), Units::Standard).with_base_url("http://x/");
        assert_eq!(client.base_url, "http://x");
    }
}
