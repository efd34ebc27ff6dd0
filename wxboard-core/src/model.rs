use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use anyhow::anyhow;

use crate::error::FetchError;

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinate")]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

/// Unchecked wire form, validated on the way into [`Coordinate`].
#[derive(Deserialize)]
struct RawCoordinate {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinate> for Coordinate {
    type Error = anyhow::Error;

    fn try_from(raw: RawCoordinate) -> anyhow::Result<Self> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(anyhow!("latitude {latitude} is outside -90..=90"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!("longitude {longitude} is outside -180..=180"));
        }
        Ok(Self { latitude, longitude })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

impl FromStr for Coordinate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s
            .split(',')
            .map(|num| num.trim().parse::<f64>())
            .collect::<Vec<_>>()[..]
        {
            [Ok(lat), Ok(lon)] => Self::new(lat, lon),
            _ => Err(anyhow!("invalid coordinate {s:?}, expected LAT,LON")),
        }
    }
}

/// A coordinate with a human-readable label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub name: String,
    #[serde(flatten)]
    pub coordinate: Coordinate,
}

impl NamedLocation {
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self { name: name.into(), coordinate }
    }

    /// Troy, NY.
    pub fn troy() -> Self {
        Self {
            name: "Troy, NY".to_string(),
            coordinate: Coordinate { latitude: 42.7284, longitude: -73.6918 },
        }
    }
}

impl Default for NamedLocation {
    fn default() -> Self {
        Self::troy()
    }
}

/// ISO 3166 alpha-2 code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountryCode(String);

impl CountryCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_lower(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl FromStr for CountryCode {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self, FetchError> {
        if s.len() == 2 && s.bytes().all(|b| b.is_ascii_alphabetic()) {
            Ok(Self(s.to_ascii_uppercase()))
        } else {
            Err(FetchError::Parse(format!("invalid country code {s:?}")))
        }
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current conditions, normalized to Kelvin and metres per second.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord {
    pub location_name: String,
    pub country: CountryCode,
    pub temperature_k: f64,
    pub feels_like_k: f64,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    /// Condition group, e.g. "Clear" or "Rain".
    pub condition: String,
    pub description: String,
    pub icon_id: String,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub title: String,
    pub url: String,
    pub source_name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsDigest {
    pub headline: String,
    pub articles: Vec<Article>,
}

/// Current pollutant readings. Concentrations are in µg/m³.
#[derive(Debug, Clone, PartialEq)]
pub struct AirQuality {
    pub aqi: Option<i64>,
    pub pm2_5: Option<f64>,
    pub pm10: Option<f64>,
    pub ozone: Option<f64>,
    pub no2: Option<f64>,
    pub co: Option<f64>,
    pub so2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuxiliaryRecord {
    News(NewsDigest),
    /// `None` when the API had no current readings for the coordinate.
    AirQuality(Option<AirQuality>),
}

impl AuxiliaryRecord {
    /// Zero articles or no readings. Still a successful fetch.
    pub fn is_empty(&self) -> bool {
        match self {
            AuxiliaryRecord::News(digest) => digest.articles.is_empty(),
            AuxiliaryRecord::AirQuality(readings) => readings.is_none(),
        }
    }
}

/// What the auxiliary client is keyed on.
#[derive(Debug, Clone, PartialEq)]
pub enum AuxiliaryKey {
    Coordinate(Coordinate),
    Country(CountryCode),
}

/// Result of a single fetch stage. Failures are values, never panics.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(T),
    Failure(FetchError),
}

impl<T> FetchOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success(_))
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            FetchOutcome::Success(value) => Some(value),
            FetchOutcome::Failure(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Success(_) => None,
            FetchOutcome::Failure(err) => Some(err),
        }
    }

    /// Raw failure reason, if any. Not meant for end users.
    pub fn reason(&self) -> Option<String> {
        self.failure().map(ToString::to_string)
    }
}

impl<T> From<Result<T, FetchError>> for FetchOutcome<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => FetchOutcome::Success(value),
            Err(err) => FetchOutcome::Failure(err),
        }
    }
}

/// Response headers seen by one API call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderSnapshot {
    pub api: String,
    pub headers: Vec<(String, String)>,
}

impl HeaderSnapshot {
    pub fn empty(api: &str) -> Self {
        Self { api: api.to_string(), headers: Vec::new() }
    }

    pub fn from_response(api: &str, map: &reqwest::header::HeaderMap) -> Self {
        let headers = map
            .iter()
            .map(|(name, value)| {
                let value = value.to_str().map(str::to_string).unwrap_or_else(|_| {
                    String::from_utf8_lossy(value.as_bytes()).into_owned()
                });
                (name.as_str().to_string(), value)
            })
            .collect();
        Self { api: api.to_string(), headers }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A fetch outcome together with the headers of the response that produced it.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    pub outcome: FetchOutcome<T>,
    pub headers: HeaderSnapshot,
}

impl<T> Fetched<T> {
    pub fn new(outcome: FetchOutcome<T>, headers: HeaderSnapshot) -> Self {
        Self { outcome, headers }
    }
}
