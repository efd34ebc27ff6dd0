//! Core library for the `wxboard` weather board.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location resolution with a fallback
//! - Clients for the weather API and the auxiliary feeds (news, air quality)
//! - A presenter turning fetch outcomes into view-models
//! - The pipeline that sequences all of the above per run
//!
//! It is used by `wxboard-cli`, but the [`pipeline::Surface`] trait lets any
//! other front end render the same view-models.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod pipeline;
pub mod presenter;
pub mod provider;
pub mod units;

pub use config::{Config, Variant};
pub use error::{FetchError, LocationError};
pub use model::{
    AuxiliaryKey, AuxiliaryRecord, Coordinate, CountryCode, FetchOutcome, Fetched, HeaderSnapshot,
    NamedLocation, WeatherRecord,
};
pub use pipeline::{Pipeline, PipelineState, Region, RunReport, Surface, Trigger};
pub use presenter::{AuxiliaryView, Presenter, WeatherView};
pub use provider::{ApiId, AuxiliarySource, WeatherSource};
