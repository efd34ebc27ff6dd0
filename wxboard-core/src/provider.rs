use crate::{
    Config,
    config::Variant,
    error::FetchError,
    model::{AuxiliaryKey, AuxiliaryRecord, Coordinate, Fetched, HeaderSnapshot, WeatherRecord},
    provider::{newsapi::NewsApiClient, openmeteo::OpenMeteoClient, openweather::OpenWeatherClient},
};
use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::{convert::TryFrom, fmt::Debug};

pub mod newsapi;
pub mod openmeteo;
pub mod openweather;

pub(crate) const USER_AGENT: &str = concat!("wxboard/", env!("CARGO_PKG_VERSION"));

/// APIs that need a credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiId {
    OpenWeather,
    NewsApi,
}

impl ApiId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiId::OpenWeather => "openweather",
            ApiId::NewsApi => "newsapi",
        }
    }

    /// Environment variable that overrides the stored key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ApiId::OpenWeather => "WXBOARD_OPENWEATHER_KEY",
            ApiId::NewsApi => "WXBOARD_NEWSAPI_KEY",
        }
    }

    pub const fn all() -> &'static [ApiId] {
        &[ApiId::OpenWeather, ApiId::NewsApi]
    }
}

impl std::fmt::Display for ApiId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ApiId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "openweather" => Ok(ApiId::OpenWeather),
            "newsapi" => Ok(ApiId::NewsApi),
            _ => Err(anyhow::anyhow!(
                "Unknown API '{value}'. Supported APIs: openweather, newsapi."
            )),
        }
    }
}

/// Current weather for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch(&self, coord: Coordinate) -> Fetched<WeatherRecord>;
}

/// The second feed shown next to the weather.
#[async_trait]
pub trait AuxiliarySource: Send + Sync + Debug {
    /// Short label used in logs and header dumps.
    fn name(&self) -> &'static str;

    async fn fetch(&self, key: &AuxiliaryKey) -> Fetched<AuxiliaryRecord>;
}

/// Construct the weather client from config.
pub fn weather_source_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherSource>> {
    let api_key = config.require_api_key(ApiId::OpenWeather)?;

    let mut client = OpenWeatherClient::new(api_key.to_owned(), config.variant.units());
    if let Some(base) = &config.endpoints.weather {
        client = client.with_base_url(base);
    }

    Ok(Box::new(client))
}

/// Construct the auxiliary client for the configured variant.
pub fn auxiliary_source_from_config(config: &Config) -> anyhow::Result<Box<dyn AuxiliarySource>> {
    let boxed: Box<dyn AuxiliarySource> = match config.variant {
        Variant::News => {
            let api_key = config.require_api_key(ApiId::NewsApi)?;
            let mut client = NewsApiClient::new(api_key.to_owned());
            if let Some(base) = &config.endpoints.news {
                client = client.with_base_url(base);
            }
            Box::new(client)
        }
        Variant::AirQuality => {
            let mut client = OpenMeteoClient::new();
            if let Some(base) = &config.endpoints.air_quality {
                client = client.with_base_url(base);
            }
            Box::new(client)
        }
    };

    Ok(boxed)
}

/// Send a GET and decode a JSON body, keeping whatever headers came back.
///
/// Never returns early with `?`: every failure becomes the `Err` half so the
/// caller can still hand the headers to inspection.
pub(crate) async fn get_json<T: DeserializeOwned>(
    request: RequestBuilder,
    api: &'static str,
) -> (Result<T, FetchError>, HeaderSnapshot) {
    let res = match request.send().await {
        Ok(res) => res,
        Err(err) => {
            let err = FetchError::from(err);
            tracing::warn!("{api} request failed: {err}");
            return (Err(err), HeaderSnapshot::empty(api));
        }
    };

    let headers = HeaderSnapshot::from_response(api, res.headers());
    let status = res.status();

    // The status decides the outcome even when the body is cut short.
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        tracing::warn!("{api} request failed with status {status}: {}", truncate_body(&body));
        return (Err(FetchError::Http { status: status.as_u16() }), headers);
    }

    let body = match res.text().await {
        Ok(body) => body,
        Err(err) => {
            let err = FetchError::from(err);
            tracing::warn!("Failed to read {api} response body: {err}");
            return (Err(err), headers);
        }
    };

    let parsed = serde_json::from_str(&body).map_err(|err| {
        tracing::warn!("Failed to parse {api} JSON: {err}");
        FetchError::from(err)
    });

    (parsed, headers)
}

pub(crate) fn trim_base_url(base: &str) -> String {
    base.trim_end_matches('/').to_string()
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
