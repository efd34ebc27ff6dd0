//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Mutex;

use wxboard_core::{AuxiliaryView, Region, Surface, WeatherView};

pub const TROY_WEATHER: &str = r#"{
    "main": {"temp": 295, "feels_like": 294, "humidity": 50},
    "weather": [{"description": "clear sky", "icon": "01d", "main": "Clear"}],
    "wind": {"speed": 3},
    "sys": {"country": "US", "sunrise": 1700000000, "sunset": 1700040000},
    "name": "Troy"
}"#;

pub const AIR_QUALITY: &str = r#"{
    "latitude": 42.72, "longitude": -73.69,
    "current": {
        "time": "2026-10-16T10:00", "interval": 3600,
        "european_aqi": 21, "pm10": 9.4, "pm2_5": 5.2, "carbon_monoxide": 180.0,
        "nitrogen_dioxide": 4.1, "ozone": 61.0, "sulphur_dioxide": 0.9
    }
}"#;

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).expect("fixture is valid JSON")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Loading(Region),
    Notice(String),
    Weather(WeatherView),
    Auxiliary(AuxiliaryView),
}

/// Surface that remembers what was drawn, in order.
#[derive(Debug, Default)]
pub struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn weather(&self) -> Option<WeatherView> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Weather(view) => Some(view),
            _ => None,
        })
    }

    pub fn auxiliary(&self) -> Option<AuxiliaryView> {
        self.events().into_iter().rev().find_map(|e| match e {
            Event::Auxiliary(view) => Some(view),
            _ => None,
        })
    }

    pub fn notices(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Notice(msg) => Some(msg),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}

impl Surface for Recorder {
    fn loading(&self, region: Region) {
        self.push(Event::Loading(region));
    }

    fn notice(&self, message: &str) {
        self.push(Event::Notice(message.to_string()));
    }

    fn show_weather(&self, view: &WeatherView) {
        self.push(Event::Weather(view.clone()));
    }

    fn show_auxiliary(&self, view: &AuxiliaryView) {
        self.push(Event::Auxiliary(view.clone()));
    }
}
