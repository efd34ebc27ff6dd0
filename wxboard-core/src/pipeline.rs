//! Run orchestration: locate, fetch weather and the auxiliary feed, render.
//!
//! Each stage writes only its own region of the [`Surface`], so a slow or
//! failing stage never blanks or blocks the other one. Runs are independent:
//! a new run does not cancel one still in flight, and whichever finishes last
//! owns the display.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{
    Config,
    config::Variant,
    error::FetchError,
    location::{IpGeolocator, LocationProvider, ResolvedLocation},
    model::{
        AuxiliaryKey, AuxiliaryRecord, FetchOutcome, Fetched, HeaderSnapshot, NamedLocation,
        WeatherRecord,
    },
    presenter::{AuxiliaryView, Presenter, WeatherView},
    provider::{
        AuxiliarySource, WeatherSource, auxiliary_source_from_config, weather_source_from_config,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Weather,
    Auxiliary,
}

/// Where view-models end up. Implementations decide how to draw them.
pub trait Surface: Send + Sync {
    fn loading(&self, region: Region);
    fn notice(&self, message: &str);
    fn show_weather(&self, view: &WeatherView);
    fn show_auxiliary(&self, view: &AuxiliaryView);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    LocatingUser,
    FetchingWeather,
    FetchingAuxiliary,
    Rendered,
    /// Absorbing: once a stage has failed the run ends here.
    Errored,
}

/// What started a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// Configured default location (initial load, refresh).
    Default,
    /// Ask the geolocator, falling back to the default location.
    Locate,
    /// Explicit location override.
    At(NamedLocation),
}

#[derive(Debug, Default)]
struct Transitions(Vec<PipelineState>);

impl Transitions {
    fn current(&self) -> PipelineState {
        self.0.last().copied().unwrap_or(PipelineState::Idle)
    }

    fn enter(&mut self, run_id: u64, state: PipelineState) {
        if self.current() == PipelineState::Errored {
            return;
        }
        tracing::debug!(run_id, "{:?} -> {:?}", self.current(), state);
        self.0.push(state);
    }
}

/// Everything a run produced, owned by whoever triggered it.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: u64,
    pub location: ResolvedLocation,
    pub weather: Fetched<WeatherRecord>,
    pub auxiliary: Fetched<AuxiliaryRecord>,
    /// States visited, starting with `Idle`.
    pub states: Vec<PipelineState>,
}

impl RunReport {
    pub fn final_state(&self) -> PipelineState {
        self.states.last().copied().unwrap_or(PipelineState::Idle)
    }

    /// Response headers from this run, weather first.
    pub fn headers(&self) -> [&HeaderSnapshot; 2] {
        [&self.weather.headers, &self.auxiliary.headers]
    }
}

pub struct Pipeline {
    variant: Variant,
    locations: LocationProvider,
    weather: Box<dyn WeatherSource>,
    auxiliary: Box<dyn AuxiliarySource>,
    presenter: Presenter,
    clock: fn() -> DateTime<Utc>,
    next_run: AtomicU64,
}

impl Pipeline {
    pub fn new(
        variant: Variant,
        locations: LocationProvider,
        weather: Box<dyn WeatherSource>,
        auxiliary: Box<dyn AuxiliarySource>,
        presenter: Presenter,
    ) -> Self {
        Self {
            variant,
            locations,
            weather,
            auxiliary,
            presenter,
            clock: Utc::now,
            next_run: AtomicU64::new(1),
        }
    }

    /// Wire up clients, geolocation and presenter from config.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        for id in config.variant.required_apis() {
            config.require_api_key(*id)?;
        }

        let mut geolocator = IpGeolocator::new();
        if let Some(base) = &config.endpoints.geolocation {
            geolocator = geolocator.with_base_url(base);
        }

        let locations = LocationProvider::new(
            Box::new(geolocator),
            config.default_location.clone(),
            config.locate_timeout(),
        );

        Ok(Self::new(
            config.variant,
            locations,
            weather_source_from_config(config)?,
            auxiliary_source_from_config(config)?,
            Presenter::local(config.variant),
        ))
    }

    /// Replace the clock used for time-of-day decisions.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    #[tracing::instrument(level = "info", skip(self, surface))]
    pub async fn run(&self, trigger: Trigger, surface: &dyn Surface) -> RunReport {
        let run_id = self.next_run.fetch_add(1, Ordering::Relaxed);
        let mut states = Transitions::default();
        states.enter(run_id, PipelineState::Idle);

        surface.loading(Region::Weather);
        surface.loading(Region::Auxiliary);

        states.enter(run_id, PipelineState::LocatingUser);
        let location = self.locate(trigger).await;
        if location.fallback_used {
            surface.notice(&format!(
                "Could not get your location. Showing weather for {} instead.",
                location.location.name
            ));
        }
        tracing::info!(
            run_id,
            "Fetching for {} ({})",
            location.location.name,
            location.location.coordinate
        );

        let (weather, auxiliary) = if self.variant.auxiliary_depends_on_weather() {
            self.run_sequential(run_id, &location.location, surface, &mut states).await
        } else {
            self.run_concurrent(run_id, &location.location, surface, &mut states).await
        };

        if weather.outcome.is_success() && auxiliary.outcome.is_success() {
            states.enter(run_id, PipelineState::Rendered);
        } else {
            states.enter(run_id, PipelineState::Errored);
        }

        tracing::info!(run_id, "Run finished in state {:?}", states.current());

        RunReport { run_id, location, weather, auxiliary, states: states.0 }
    }

    async fn locate(&self, trigger: Trigger) -> ResolvedLocation {
        match trigger {
            Trigger::Locate => self.locations.resolve().await,
            Trigger::Default => ResolvedLocation {
                location: self.locations.fallback().clone(),
                fallback_used: false,
                reason: None,
            },
            Trigger::At(location) => {
                ResolvedLocation { location, fallback_used: false, reason: None }
            }
        }
    }

    async fn fetch_weather(&self, location: &NamedLocation) -> Fetched<WeatherRecord> {
        let mut fetched = self.weather.fetch(location.coordinate).await;
        if let FetchOutcome::Success(record) = &mut fetched.outcome {
            if record.location_name.is_empty() {
                record.location_name = location.name.clone();
            }
        }
        fetched
    }

    fn show_weather(&self, fetched: &Fetched<WeatherRecord>, surface: &dyn Surface) {
        let view = self.presenter.render_weather(&fetched.outcome, (self.clock)());
        surface.show_weather(&view);
    }

    fn show_auxiliary(&self, fetched: &Fetched<AuxiliaryRecord>, surface: &dyn Surface) {
        let view = self.presenter.render_auxiliary(&fetched.outcome);
        surface.show_auxiliary(&view);
    }

    /// Weather and auxiliary are independent; each renders as soon as it lands.
    async fn run_concurrent(
        &self,
        run_id: u64,
        location: &NamedLocation,
        surface: &dyn Surface,
        states: &mut Transitions,
    ) -> (Fetched<WeatherRecord>, Fetched<AuxiliaryRecord>) {
        states.enter(run_id, PipelineState::FetchingWeather);
        states.enter(run_id, PipelineState::FetchingAuxiliary);

        let weather = async {
            let fetched = self.fetch_weather(location).await;
            self.show_weather(&fetched, surface);
            fetched
        };

        let auxiliary = async {
            let key = AuxiliaryKey::Coordinate(location.coordinate);
            let fetched = self.auxiliary.fetch(&key).await;
            self.show_auxiliary(&fetched, surface);
            fetched
        };

        tokio::join!(weather, auxiliary)
    }

    /// Auxiliary is keyed on the weather result and waits for it.
    async fn run_sequential(
        &self,
        run_id: u64,
        location: &NamedLocation,
        surface: &dyn Surface,
        states: &mut Transitions,
    ) -> (Fetched<WeatherRecord>, Fetched<AuxiliaryRecord>) {
        states.enter(run_id, PipelineState::FetchingWeather);
        let weather = self.fetch_weather(location).await;
        self.show_weather(&weather, surface);

        let auxiliary = match &weather.outcome {
            FetchOutcome::Success(record) => {
                states.enter(run_id, PipelineState::FetchingAuxiliary);
                self.auxiliary.fetch(&AuxiliaryKey::Country(record.country.clone())).await
            }
            FetchOutcome::Failure(err) => {
                tracing::warn!(
                    run_id,
                    "Skipping {}: weather failed ({err})",
                    self.auxiliary.name()
                );
                states.enter(run_id, PipelineState::Errored);
                Fetched::new(
                    FetchOutcome::Failure(FetchError::DependencyFailed { stage: "weather" }),
                    HeaderSnapshot::empty(self.auxiliary.name()),
                )
            }
        };
        self.show_auxiliary(&auxiliary, surface);

        (weather, auxiliary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errored_is_absorbing() {
        let mut t = Transitions::default();
        t.enter(1, PipelineState::Idle);
        t.enter(1, PipelineState::FetchingWeather);
        t.enter(1, PipelineState::Errored);
        t.enter(1, PipelineState::FetchingAuxiliary);
        t.enter(1, PipelineState::Rendered);

        assert_eq!(t.current(), PipelineState::Errored);
        assert_eq!(
            t.0,
            [PipelineState::Idle, PipelineState::FetchingWeather, PipelineState::Errored]
        );
    }

    #[test]
    fn from_config_requires_the_variant_keys() {
        let mut cfg = Config::default();
        let err = Pipeline::from_config(&cfg).err().expect("weather key is missing");
        assert!(err.to_string().contains("openweather"));

        cfg.variant = Variant::News;
        cfg.upsert_api_key(crate::ApiId::OpenWeather, "KEY".into());
        let err = Pipeline::from_config(&cfg).err().expect("news key is missing");
        assert!(err.to_string().contains("newsapi"));

        cfg.upsert_api_key(crate::ApiId::NewsApi, "KEY".into());
        assert!(Pipeline::from_config(&cfg).is_ok());
    }

    #[test]
    fn empty_transitions_start_idle() {
        assert_eq!(Transitions::default().current(), PipelineState::Idle);
    }
}
