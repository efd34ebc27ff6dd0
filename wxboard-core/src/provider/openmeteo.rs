use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{AirQuality, AuxiliaryKey, AuxiliaryRecord, Coordinate, Fetched, HeaderSnapshot},
    provider::{get_json, trim_base_url},
};

use super::AuxiliarySource;

const DEFAULT_BASE_URL: &str = "https://air-quality-api.open-meteo.com/v1";
const API: &str = "open-meteo";
const CURRENT_FIELDS: &str =
    "european_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,ozone,sulphur_dioxide";

/// Open-Meteo air-quality client. Keyless.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    base_url: String,
    http: Client,
}

impl Default for OpenMeteoClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OpenMeteoClient {
    pub fn new() -> Self {
        Self { base_url: DEFAULT_BASE_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }

    async fn current(&self, coord: Coordinate) -> Fetched<AuxiliaryRecord> {
        let url = format!("{}/air-quality", self.base_url);
        tracing::debug!("GET {url} latitude={} longitude={}", coord.latitude(), coord.longitude());

        let request = self.http.get(&url).query(&[
            ("latitude", coord.latitude().to_string()),
            ("longitude", coord.longitude().to_string()),
            ("current", CURRENT_FIELDS.to_string()),
        ]);

        let (parsed, headers) = get_json::<OmResponse>(request, API).await;

        let record = parsed.map(|parsed| {
            let readings = parsed.current.map(AirQuality::from);
            if readings.is_none() {
                tracing::info!("No current air-quality readings at {coord}");
            }
            AuxiliaryRecord::AirQuality(readings)
        });

        Fetched::new(record.into(), headers)
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    european_aqi: Option<f64>,
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    ozone: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    carbon_monoxide: Option<f64>,
    sulphur_dioxide: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    current: Option<OmCurrent>,
}

impl From<OmCurrent> for AirQuality {
    fn from(c: OmCurrent) -> Self {
        AirQuality {
            aqi: c.european_aqi.map(|v| v.round() as i64),
            pm2_5: c.pm2_5,
            pm10: c.pm10,
            ozone: c.ozone,
            no2: c.nitrogen_dioxide,
            co: c.carbon_monoxide,
            so2: c.sulphur_dioxide,
        }
    }
}

#[async_trait]
impl AuxiliarySource for OpenMeteoClient {
    fn name(&self) -> &'static str {
        API
    }

    async fn fetch(&self, key: &AuxiliaryKey) -> Fetched<AuxiliaryRecord> {
        match key {
            AuxiliaryKey::Coordinate(coord) => self.current(*coord).await,
            AuxiliaryKey::Country(_) => Fetched::new(
                Err(FetchError::UnsupportedKey { client: API, key: "country code" }).into(),
                HeaderSnapshot::empty(API),
            ),
        }
    }
}
