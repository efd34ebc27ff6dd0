use wxboard_core::{
    AuxiliaryView, HeaderSnapshot, Region, Surface, WeatherView, presenter::WeatherPanel,
};

/// Draws each region to stdout as soon as it is handed over.
#[derive(Debug, Default)]
pub struct TerminalSurface;

impl TerminalSurface {
    fn emit(&self, block: String) {
        // One print per block so concurrent regions never interleave lines.
        print!("{block}");
    }
}

impl Surface for TerminalSurface {
    fn loading(&self, region: Region) {
        let what = match region {
            Region::Weather => "weather",
            Region::Auxiliary => "auxiliary feed",
        };
        self.emit(format!("Loading {what}...\n"));
    }

    fn notice(&self, message: &str) {
        self.emit(format!("! {message}\n"));
    }

    fn show_weather(&self, view: &WeatherView) {
        self.emit(format_weather(view));
    }

    fn show_auxiliary(&self, view: &AuxiliaryView) {
        self.emit(format_auxiliary(view));
    }
}

fn section(title: &str) -> String {
    format!("\n== {title} ==\n")
}

fn format_panel(panel: &WeatherPanel) -> String {
    let mut out = format!("{} - {}\n", panel.title, panel.description);
    out.push_str(&format!(
        "  Temperature: {} (feels like {})\n",
        panel.temperature, panel.feels_like
    ));
    out.push_str(&format!("  Humidity: {} | Wind: {}\n", panel.humidity, panel.wind));

    if let (Some(sunrise), Some(sunset)) = (&panel.sunrise, &panel.sunset) {
        out.push_str(&format!("  Sunrise: {sunrise} | Sunset: {sunset}\n"));
    }

    out.push_str(&format!("  Icon: {}\n", panel.icon_url));
    out.push_str(&format!("  {}\n", panel.suggestion));
    out
}

pub fn format_weather(view: &WeatherView) -> String {
    let mut out = section("Weather");
    match view {
        WeatherView::Ready(panel) => out.push_str(&format_panel(panel)),
        WeatherView::Unavailable { message } => out.push_str(&format!("  {message}\n")),
    }
    out
}

pub fn format_auxiliary(view: &AuxiliaryView) -> String {
    match view {
        AuxiliaryView::News { headline, items } => {
            let mut out = section(headline);
            for (n, item) in items.iter().enumerate() {
                out.push_str(&format!("  {}. {}", n + 1, item.title));
                if !item.source.is_empty() {
                    out.push_str(&format!(" ({})", item.source));
                }
                out.push_str(&format!("\n     {}\n", item.url));
            }
            out
        }
        AuxiliaryView::AirQuality { rows } => {
            let mut out = section("Air quality");
            let width = rows.iter().map(|r| r.label.chars().count()).max().unwrap_or(0);
            for row in rows {
                let pad = width - row.label.chars().count();
                out.push_str(&format!("  {}:{} {}\n", row.label, " ".repeat(pad), row.value));
            }
            out
        }
        AuxiliaryView::Empty { headline, message } => {
            let mut out = section(headline.as_deref().unwrap_or("Auxiliary"));
            out.push_str(&format!("  {message}\n"));
            out
        }
        AuxiliaryView::Unavailable { message } => {
            let mut out = section("Auxiliary");
            out.push_str(&format!("  {message}\n"));
            out
        }
    }
}

pub fn format_headers(snapshots: &[&HeaderSnapshot]) -> String {
    let mut out = String::new();
    for snapshot in snapshots {
        out.push_str(&format!("=== {} headers ===\n", snapshot.api));
        if snapshot.headers.is_empty() {
            out.push_str("  (no response)\n");
        }
        for (name, value) in &snapshot.headers {
            out.push_str(&format!("  {name}: {value}\n"));
        }
    }
    out
}
