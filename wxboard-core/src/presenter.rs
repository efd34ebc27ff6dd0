//! Pure mapping from fetch outcomes to view-models.
//!
//! Nothing here touches the network or the terminal: the time zone and the
//! current time are passed in, so every output is reproducible.

use chrono::{DateTime, FixedOffset, Local, Offset, TimeZone, Timelike, Utc};

use crate::{
    config::Variant,
    error::FetchError,
    model::{AirQuality, AuxiliaryRecord, FetchOutcome, NewsDigest, WeatherRecord},
    units::{TemperatureStyle, format_temperature, format_wind},
};

const ICON_URL_BASE: &str = "https://openweathermap.org/img/wn";
const TIME_FORMAT: &str = "%-I:%M:%S %p";
const MISSING: &str = "n/a";

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherPanel {
    pub title: String,
    pub description: String,
    pub temperature: String,
    pub feels_like: String,
    pub humidity: String,
    pub wind: String,
    pub icon_url: String,
    pub icon_alt: String,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub suggestion: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherView {
    Ready(WeatherPanel),
    Unavailable { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewsItem {
    pub title: String,
    pub url: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirQualityRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuxiliaryView {
    News { headline: String, items: Vec<NewsItem> },
    AirQuality { rows: Vec<AirQualityRow> },
    /// Successful fetch with nothing to show.
    Empty { headline: Option<String>, message: String },
    Unavailable { message: String },
}

struct SuggestionRule {
    keyword: &'static str,
    /// Rule only applies before this local hour.
    before_hour: Option<u32>,
    message: &'static str,
}

// First match wins.
const SUGGESTIONS: &[SuggestionRule] = &[
    SuggestionRule { keyword: "rain", before_hour: None, message: "Take an umbrella ☔" },
    SuggestionRule { keyword: "snow", before_hour: None, message: "Bundle up ❄️" },
    SuggestionRule { keyword: "clear", before_hour: Some(18), message: "Great time for a walk!" },
];
const DEFAULT_SUGGESTION: &str = "Enjoy your day!";

/// One-line suggestion for the conditions and local hour.
pub fn suggestion(condition: &str, description: &str, local_hour: u32) -> &'static str {
    let condition = condition.to_lowercase();
    let description = description.to_lowercase();

    SUGGESTIONS
        .iter()
        .find(|rule| {
            (condition.contains(rule.keyword) || description.contains(rule.keyword))
                && rule.before_hour.is_none_or(|h| local_hour < h)
        })
        .map_or(DEFAULT_SUGGESTION, |rule| rule.message)
}

pub fn icon_url(icon_id: &str) -> String {
    format!("{ICON_URL_BASE}/{icon_id}@2x.png")
}

#[derive(Debug, Clone, Copy)]
enum Zone {
    Fixed(FixedOffset),
    /// Machine time zone, looked up for each instant so DST changes apply.
    Local,
}

impl Zone {
    fn offset_at(&self, at: DateTime<Utc>) -> FixedOffset {
        match self {
            Zone::Fixed(offset) => *offset,
            Zone::Local => Local.offset_from_utc_datetime(&at.naive_utc()).fix(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Presenter {
    variant: Variant,
    style: TemperatureStyle,
    zone: Zone,
}

impl Presenter {
    pub fn new(variant: Variant, offset: FixedOffset) -> Self {
        Self { variant, style: variant.temperature_style(), zone: Zone::Fixed(offset) }
    }

    /// Presenter in the machine's time zone.
    pub fn local(variant: Variant) -> Self {
        Self { variant, style: variant.temperature_style(), zone: Zone::Local }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    fn local_time(&self, at: DateTime<Utc>) -> String {
        at.with_timezone(&self.zone.offset_at(at)).format(TIME_FORMAT).to_string()
    }

    pub fn render_weather(
        &self,
        outcome: &FetchOutcome<WeatherRecord>,
        now: DateTime<Utc>,
    ) -> WeatherView {
        match outcome {
            FetchOutcome::Success(record) => WeatherView::Ready(self.weather_panel(record, now)),
            FetchOutcome::Failure(err) => {
                WeatherView::Unavailable { message: weather_failure_message(err) }
            }
        }
    }

    fn weather_panel(&self, record: &WeatherRecord, now: DateTime<Utc>) -> WeatherPanel {
        let title = if record.location_name.is_empty() {
            record.country.to_string()
        } else {
            format!("{}, {}", record.location_name, record.country)
        };
        let local_hour = now.with_timezone(&self.zone.offset_at(now)).hour();

        WeatherPanel {
            title,
            description: record.description.clone(),
            temperature: format_temperature(record.temperature_k, self.style),
            feels_like: format_temperature(record.feels_like_k, self.style),
            humidity: format!("{}%", record.humidity_pct),
            wind: format_wind(record.wind_speed_mps, self.style),
            icon_url: icon_url(&record.icon_id),
            icon_alt: record.description.clone(),
            sunrise: record.sunrise.map(|t| self.local_time(t)),
            sunset: record.sunset.map(|t| self.local_time(t)),
            suggestion: suggestion(&record.condition, &record.description, local_hour).to_string(),
        }
    }

    pub fn render_auxiliary(&self, outcome: &FetchOutcome<AuxiliaryRecord>) -> AuxiliaryView {
        match outcome {
            FetchOutcome::Success(AuxiliaryRecord::News(digest)) => news_view(digest),
            FetchOutcome::Success(AuxiliaryRecord::AirQuality(Some(readings))) => {
                AuxiliaryView::AirQuality { rows: air_quality_rows(readings) }
            }
            FetchOutcome::Success(AuxiliaryRecord::AirQuality(None)) => AuxiliaryView::Empty {
                headline: None,
                message: "No air-quality data available.".to_string(),
            },
            FetchOutcome::Failure(err) => {
                AuxiliaryView::Unavailable { message: self.auxiliary_failure_message(err) }
            }
        }
    }

    fn auxiliary_failure_message(&self, err: &FetchError) -> String {
        let message = match (self.variant, err) {
            (Variant::News, FetchError::DependencyFailed { .. }) => "News unavailable.",
            (Variant::News, _) => "Could not fetch news.",
            (Variant::AirQuality, FetchError::DependencyFailed { .. }) => {
                "Air quality unavailable."
            }
            (Variant::AirQuality, _) => "Could not fetch air quality.",
        };
        message.to_string()
    }
}

fn weather_failure_message(err: &FetchError) -> String {
    match err {
        FetchError::Http { status } => format!("Weather data unavailable (HTTP {status})."),
        FetchError::Parse(_) => "Could not parse weather data.".to_string(),
        _ => "Weather data unavailable.".to_string(),
    }
}

fn news_view(digest: &NewsDigest) -> AuxiliaryView {
    if digest.articles.is_empty() {
        return AuxiliaryView::Empty {
            headline: Some(digest.headline.clone()),
            message: "No top headlines found.".to_string(),
        };
    }

    let items = digest
        .articles
        .iter()
        .map(|a| NewsItem {
            title: a.title.clone(),
            url: a.url.clone(),
            source: a.source_name.clone(),
        })
        .collect();

    AuxiliaryView::News { headline: digest.headline.clone(), items }
}

fn concentration(value: Option<f64>) -> String {
    value.map_or_else(|| MISSING.to_string(), |v| format!("{v} µg/m³"))
}

fn air_quality_rows(aq: &AirQuality) -> Vec<AirQualityRow> {
    vec![
        AirQualityRow {
            label: "European AQI",
            value: aq.aqi.map_or_else(|| MISSING.to_string(), |v| v.to_string()),
        },
        AirQualityRow { label: "PM2.5", value: concentration(aq.pm2_5) },
        AirQualityRow { label: "PM10", value: concentration(aq.pm10) },
        AirQualityRow { label: "Ozone (O₃)", value: concentration(aq.ozone) },
        AirQualityRow { label: "Nitrogen Dioxide (NO₂)", value: concentration(aq.no2) },
        AirQualityRow { label: "Carbon Monoxide (CO)", value: concentration(aq.co) },
        AirQualityRow { label: "Sulphur Dioxide (SO₂)", value: concentration(aq.so2) },
    ]
}
