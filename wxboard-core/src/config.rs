use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    model::NamedLocation,
    provider::ApiId,
    units::{TemperatureStyle, Units},
};

const DEFAULT_LOCATE_TIMEOUT_SECS: u64 = 10;

/// Credentials for a single API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,
}

/// Which auxiliary feed accompanies the weather panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Imperial weather, then headlines for the reported country.
    News,
    /// Kelvin weather alongside air quality for the same coordinate.
    #[default]
    AirQuality,
}

impl Variant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::News => "news",
            Variant::AirQuality => "air-quality",
        }
    }

    pub fn units(&self) -> Units {
        match self {
            Variant::News => Units::Imperial,
            Variant::AirQuality => Units::Standard,
        }
    }

    pub fn temperature_style(&self) -> TemperatureStyle {
        match self {
            Variant::News => TemperatureStyle::Fahrenheit,
            Variant::AirQuality => TemperatureStyle::Dual,
        }
    }

    /// Whether the auxiliary call needs the weather result first.
    pub fn auxiliary_depends_on_weather(&self) -> bool {
        matches!(self, Variant::News)
    }

    pub fn docs_url(&self) -> &'static str {
        match self {
            Variant::News => "https://newsapi.org/docs",
            Variant::AirQuality => "https://open-meteo.com/en/docs/air-quality-api",
        }
    }

    /// APIs that need a key for this variant.
    pub fn required_apis(&self) -> &'static [ApiId] {
        match self {
            Variant::News => &[ApiId::OpenWeather, ApiId::NewsApi],
            Variant::AirQuality => &[ApiId::OpenWeather],
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Variant {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "news" => Ok(Variant::News),
            "air-quality" | "airquality" | "aq" => Ok(Variant::AirQuality),
            _ => Err(anyhow!("Unknown variant '{value}'. Supported variants: news, air-quality.")),
        }
    }
}

/// Base URL overrides, mostly useful for pointing at a mock server.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Endpoints {
    pub weather: Option<String>,
    pub news: Option<String>,
    pub air_quality: Option<String>,
    pub geolocation: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub variant: Variant,

    /// Upper bound on waiting for device location.
    #[serde(default = "default_locate_timeout_secs")]
    pub locate_timeout_secs: u64,

    /// Where to look when device location is unavailable or not requested.
    #[serde(default)]
    pub default_location: NamedLocation,

    /// Example TOML:
    /// [apis.openweather]
    /// api_key = "..."
    #[serde(default)]
    pub apis: HashMap<String, ApiConfig>,

    #[serde(default)]
    pub endpoints: Endpoints,
}

fn default_locate_timeout_secs() -> u64 {
    DEFAULT_LOCATE_TIMEOUT_SECS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            locate_timeout_secs: DEFAULT_LOCATE_TIMEOUT_SECS,
            default_location: NamedLocation::default(),
            apis: HashMap::new(),
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Load config from the platform config dir, or defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to the platform config dir, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "wxboard", "wxboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Replace stored keys with ones supplied at startup, e.g. from the environment.
    ///
    /// `lookup` is handed each API's variable name (`WXBOARD_OPENWEATHER_KEY`, ...).
    pub fn apply_key_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for id in ApiId::all() {
            if let Some(key) = lookup(id.env_var()).filter(|k| !k.trim().is_empty()) {
                tracing::debug!("Using {} key from {}", id, id.env_var());
                self.upsert_api_key(*id, key.trim().to_string());
            }
        }
    }

    /// Set or replace an API key.
    pub fn upsert_api_key(&mut self, id: ApiId, api_key: String) {
        self.apis.insert(id.as_str().to_string(), ApiConfig { api_key });
    }

    /// Returns API key for an API, if present.
    pub fn api_key(&self, id: ApiId) -> Option<&str> {
        self.apis.get(id.as_str()).map(|cfg| cfg.api_key.as_str())
    }

    pub fn is_api_configured(&self, id: ApiId) -> bool {
        self.api_key(id).is_some()
    }

    pub fn require_api_key(&self, id: ApiId) -> Result<&str> {
        self.api_key(id).ok_or_else(|| {
            anyhow!(
                "No API key configured for '{id}'.\n\
                 Hint: run `wxboard configure {id}` or set {}.",
                id.env_var()
            )
        })
    }

    pub fn locate_timeout(&self) -> Duration {
        Duration::from_secs(self.locate_timeout_secs)
    }
}
