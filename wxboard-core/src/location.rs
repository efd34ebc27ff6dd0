//! Where to fetch weather for.
//!
//! A [`Geolocator`] is the device-location capability; [`LocationProvider`]
//! wraps one with a timeout and a configured fallback so that resolving a
//! location never fails.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{
    error::LocationError,
    model::{Coordinate, NamedLocation},
    provider::trim_base_url,
};

const DEFAULT_IP_GEOLOCATION_URL: &str = "http://ip-api.com";
const DEVICE_LOCATION_LABEL: &str = "Your location";

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinate, LocationError>;
}

/// Device location is switched off.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocator;

#[async_trait]
impl Geolocator for NoGeolocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Err(LocationError::Unsupported)
    }
}

/// Always answers with the same coordinate.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocator(pub Coordinate);

#[async_trait]
impl Geolocator for FixedGeolocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        Ok(self.0)
    }
}

/// Approximate location from the public IP address (ip-api.com JSON format).
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    base_url: String,
    http: Client,
}

impl Default for IpGeolocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IpGeolocator {
    pub fn new() -> Self {
        Self { base_url: DEFAULT_IP_GEOLOCATION_URL.to_string(), http: Client::new() }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = trim_base_url(base_url);
        self
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn locate(&self) -> Result<Coordinate, LocationError> {
        let url = format!("{}/json/", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.without_url().to_string()))?;

        if !res.status().is_success() {
            return Err(LocationError::Unavailable(format!("status {}", res.status())));
        }

        let body: IpApiResponse = res
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.without_url().to_string()))?;

        if body.status != "success" {
            return Err(LocationError::Unavailable(
                body.message.unwrap_or_else(|| body.status.clone()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                Coordinate::new(lat, lon).map_err(|e| LocationError::Unavailable(e.to_string()))
            }
            _ => Err(LocationError::Unavailable("response had no coordinates".to_string())),
        }
    }
}

/// Outcome of [`LocationProvider::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLocation {
    pub location: NamedLocation,
    /// Set when the geolocator failed and the configured default was used.
    pub fallback_used: bool,
    /// Why the fallback was used.
    pub reason: Option<LocationError>,
}

#[derive(Debug)]
pub struct LocationProvider {
    geolocator: Box<dyn Geolocator>,
    fallback: NamedLocation,
    timeout: Duration,
}

impl LocationProvider {
    pub fn new(
        geolocator: Box<dyn Geolocator>,
        fallback: NamedLocation,
        timeout: Duration,
    ) -> Self {
        Self { geolocator, fallback, timeout }
    }

    pub fn fallback(&self) -> &NamedLocation {
        &self.fallback
    }

    /// Device location if available, otherwise the fallback. Never fails.
    pub async fn resolve(&self) -> ResolvedLocation {
        let located = match tokio::time::timeout(self.timeout, self.geolocator.locate()).await {
            Ok(result) => result,
            Err(_) => Err(LocationError::Timeout),
        };

        match located {
            Ok(coordinate) => {
                tracing::info!("Located device at {coordinate}");
                ResolvedLocation {
                    location: NamedLocation::new(DEVICE_LOCATION_LABEL, coordinate),
                    fallback_used: false,
                    reason: None,
                }
            }
            Err(err) => {
                tracing::warn!("{err}; falling back to {}", self.fallback.name);
                ResolvedLocation {
                    location: self.fallback.clone(),
                    fallback_used: true,
                    reason: Some(err),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Denied;

    #[async_trait]
    impl Geolocator for Denied {
        async fn locate(&self) -> Result<Coordinate, LocationError> {
            Err(LocationError::PermissionDenied)
        }
    }

    #[derive(Debug)]
    struct Hangs;

    #[async_trait]
    impl Geolocator for Hangs {
        async fn locate(&self) -> Result<Coordinate, LocationError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(LocationError::Unsupported)
        }
    }

    fn provider(geolocator: Box<dyn Geolocator>) -> LocationProvider {
        LocationProvider::new(geolocator, NamedLocation::troy(), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn uses_device_location_when_available() {
        let here = Coordinate::new(51.5, -0.12).unwrap();
        let resolved = provider(Box::new(FixedGeolocator(here))).resolve().await;

        assert!(!resolved.fallback_used);
        assert_eq!(resolved.location.coordinate, here);
        assert_eq!(resolved.location.name, "Your location");
    }

    #[tokio::test]
    async fn falls_back_when_denied() {
        let resolved = provider(Box::new(Denied)).resolve().await;

        assert!(resolved.fallback_used);
        assert_eq!(resolved.location, NamedLocation::troy());
        assert_eq!(resolved.reason, Some(LocationError::PermissionDenied));
    }

    #[tokio::test]
    async fn falls_back_when_unsupported() {
        let resolved = provider(Box::new(NoGeolocator)).resolve().await;
        assert!(resolved.fallback_used);
        assert_eq!(resolved.reason, Some(LocationError::Unsupported));
    }

    #[tokio::test]
    async fn falls_back_on_timeout() {
        let resolved = provider(Box::new(Hangs)).resolve().await;
        assert!(resolved.fallback_used);
        assert_eq!(resolved.reason, Some(LocationError::Timeout));
    }
}
