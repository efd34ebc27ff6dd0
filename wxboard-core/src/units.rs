//! Unit conversion and the two temperature display styles.

use serde::{Deserialize, Serialize};

const KELVIN_OFFSET: f64 = 273.15;
const MPS_PER_MPH: f64 = 0.44704;

/// Unit system requested from the weather API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Kelvin and m/s. The API default, no `units` parameter.
    #[default]
    Standard,
    /// Fahrenheit and mph.
    Imperial,
}

impl Units {
    /// Value for the `units` query parameter, if one is sent.
    pub fn query_value(self) -> Option<&'static str> {
        match self {
            Units::Standard => None,
            Units::Imperial => Some("imperial"),
        }
    }

    pub fn temperature_to_kelvin(self, value: f64) -> f64 {
        match self {
            Units::Standard => value,
            Units::Imperial => fahrenheit_to_kelvin(value),
        }
    }

    pub fn speed_to_mps(self, value: f64) -> f64 {
        match self {
            Units::Standard => value,
            Units::Imperial => value * MPS_PER_MPH,
        }
    }
}

/// How temperatures and wind are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureStyle {
    /// `26.9°C / 80.3°F`, wind in m/s.
    Dual,
    /// `72°F`, wind in mph, both rounded.
    Fahrenheit,
}

pub fn kelvin_to_celsius(k: f64) -> f64 {
    k - KELVIN_OFFSET
}

pub fn celsius_to_fahrenheit(c: f64) -> f64 {
    c * 9.0 / 5.0 + 32.0
}

pub fn kelvin_to_fahrenheit(k: f64) -> f64 {
    celsius_to_fahrenheit(kelvin_to_celsius(k))
}

pub fn fahrenheit_to_kelvin(f: f64) -> f64 {
    (f - 32.0) * 5.0 / 9.0 + KELVIN_OFFSET
}

pub fn mps_to_mph(mps: f64) -> f64 {
    mps / MPS_PER_MPH
}

pub fn format_temperature(kelvin: f64, style: TemperatureStyle) -> String {
    match style {
        TemperatureStyle::Dual => {
            let c = kelvin_to_celsius(kelvin);
            let f = celsius_to_fahrenheit(c);
            format!("{c:.1}°C / {f:.1}°F")
        }
        TemperatureStyle::Fahrenheit => format!("{}°F", rounded(kelvin_to_fahrenheit(kelvin))),
    }
}

pub fn format_wind(mps: f64, style: TemperatureStyle) -> String {
    match style {
        TemperatureStyle::Dual => format!("{mps} m/s"),
        TemperatureStyle::Fahrenheit => format!("{} mph", rounded(mps_to_mph(mps))),
    }
}

// `round` keeps the sign of -0.4, which would print as "-0".
fn rounded(v: f64) -> f64 {
    v.round() + 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_format_of_300_kelvin() {
        assert_eq!(format_temperature(300.0, TemperatureStyle::Dual), "26.9°C / 80.3°F");
    }

    #[test]
    fn fahrenheit_format_rounds() {
        let k = fahrenheit_to_kelvin(71.6);
        assert_eq!(format_temperature(k, TemperatureStyle::Fahrenheit), "72°F");
    }

    #[test]
    fn imperial_values_normalize_to_si() {
        let k = Units::Imperial.temperature_to_kelvin(32.0);
        assert!((k - 273.15).abs() < 1e-9);

        let mps = Units::Imperial.speed_to_mps(10.0);
        assert!((mps - 4.4704).abs() < 1e-9);
        assert_eq!(Units::Standard.speed_to_mps(3.0), 3.0);
    }

    #[test]
    fn wind_formats() {
        assert_eq!(format_wind(3.0, TemperatureStyle::Dual), "3 m/s");
        assert_eq!(
            format_wind(Units::Imperial.speed_to_mps(7.4), TemperatureStyle::Fahrenheit),
            "7 mph"
        );
    }

    #[test]
    fn query_value() {
        assert_eq!(Units::Standard.query_value(), None);
        assert_eq!(Units::Imperial.query_value(), Some("imperial"));
    }
}
