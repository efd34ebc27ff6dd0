use anyhow::{Context, anyhow};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use std::fmt;

use wxboard_core::{
    ApiId, Config, Coordinate, NamedLocation, Pipeline, RunReport, Trigger, Variant,
};

use crate::terminal::{TerminalSurface, format_headers};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "wxboard", version, about = "Weather plus news or air quality for where you are")]
pub struct Cli {
    /// More log output on stderr (-v info, -vv debug). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key for "openweather" or "newsapi".
    Configure {
        api: String,
    },

    /// Fetch once and print both panels.
    Show {
        #[command(flatten)]
        target: TargetArgs,

        /// Also print the response headers of this run.
        #[arg(long)]
        headers: bool,
    },

    /// Interactive board with refresh, location and header inspection.
    Board {
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Print where the config file lives.
    ConfigPath,
}

#[derive(Debug, Args)]
pub struct TargetArgs {
    /// "news" or "air-quality"; defaults to the configured variant.
    #[arg(long)]
    variant: Option<String>,

    /// Explicit location instead of the configured default.
    #[arg(long, value_name = "LAT,LON", conflicts_with = "locate", allow_hyphen_values = true)]
    at: Option<Coordinate>,

    /// Label for --at.
    #[arg(long, requires = "at")]
    name: Option<String>,

    /// Try to detect the current location first.
    #[arg(long)]
    locate: bool,
}

impl TargetArgs {
    fn trigger(&self) -> Trigger {
        match (self.at, self.locate) {
            (Some(coordinate), _) => Trigger::At(NamedLocation::new(
                self.name.clone().unwrap_or_else(|| "Custom location".to_string()),
                coordinate,
            )),
            (None, true) => Trigger::Locate,
            (None, false) => Trigger::Default,
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { api } => configure(&api),
            Command::Show { target, headers } => {
                let pipeline = build_pipeline(&target)?;
                let report = pipeline.run(target.trigger(), &TerminalSurface).await;
                if headers {
                    print!("\n{}", format_headers(&report.headers()));
                }
                Ok(())
            }
            Command::Board { target } => board(&target).await,
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
        }
    }
}

/// Config file, then keys from the environment, then command-line overrides.
fn load_config(target: &TargetArgs) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    config.apply_key_overrides(|name| std::env::var(name).ok());

    if let Some(variant) = &target.variant {
        config.variant = Variant::try_from(variant.as_str())?;
    }

    Ok(config)
}

fn build_pipeline(target: &TargetArgs) -> anyhow::Result<Pipeline> {
    let config = load_config(target)?;
    tracing::info!("Variant: {}", config.variant);
    Pipeline::from_config(&config)
}

fn configure(api: &str) -> anyhow::Result<()> {
    let id = ApiId::try_from(api)?;
    let mut config = Config::load()?;

    let key = Password::new(&format!("API key for {id}:"))
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let key = key.trim();
    if key.is_empty() {
        return Err(anyhow!("API key must not be empty"));
    }
    config.upsert_api_key(id, key.to_string());

    if id == ApiId::NewsApi && config.variant != Variant::News {
        let switch = Confirm::new("Show news next to the weather by default?")
            .with_default(true)
            .prompt()
            .context("Failed to read answer")?;
        if switch {
            config.variant = Variant::News;
        }
    }

    config.save()?;
    println!("Saved {id} key to {}", Config::config_file_path()?.display());

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BoardAction {
    Refresh,
    Locate,
    SetLocation,
    ShowHeaders,
    OpenDocs,
    Quit,
}

impl BoardAction {
    const ALL: [BoardAction; 6] = [
        BoardAction::Refresh,
        BoardAction::Locate,
        BoardAction::SetLocation,
        BoardAction::ShowHeaders,
        BoardAction::OpenDocs,
        BoardAction::Quit,
    ];
}

impl fmt::Display for BoardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BoardAction::Refresh => "Refresh",
            BoardAction::Locate => "Use my location",
            BoardAction::SetLocation => "Set location...",
            BoardAction::ShowHeaders => "Show response headers",
            BoardAction::OpenDocs => "Open documentation",
            BoardAction::Quit => "Quit",
        })
    }
}

fn prompt_location() -> anyhow::Result<Option<NamedLocation>> {
    let input = Text::new("Location as LAT,LON:")
        .prompt_skippable()
        .context("Failed to read location")?;

    let Some(input) = input.filter(|s| !s.trim().is_empty()) else {
        return Ok(None);
    };

    match input.parse::<Coordinate>() {
        Ok(coordinate) => Ok(Some(NamedLocation::new("Custom location", coordinate))),
        Err(err) => {
            println!("! {err}");
            Ok(None)
        }
    }
}

async fn board(target: &TargetArgs) -> anyhow::Result<()> {
    let pipeline = build_pipeline(target)?;
    let surface = TerminalSurface;

    // Headers of the most recent run, for inspection.
    let mut last: RunReport = pipeline.run(target.trigger(), &surface).await;
    let mut refresh_trigger = target.trigger();

    loop {
        println!();
        let action = Select::new("What next?", BoardAction::ALL.to_vec())
            .prompt_skippable()
            .context("Failed to read menu choice")?;

        match action.unwrap_or(BoardAction::Quit) {
            BoardAction::Refresh => {
                last = pipeline.run(refresh_trigger.clone(), &surface).await;
            }
            BoardAction::Locate => {
                refresh_trigger = Trigger::Locate;
                last = pipeline.run(Trigger::Locate, &surface).await;
            }
            BoardAction::SetLocation => {
                if let Some(location) = prompt_location()? {
                    refresh_trigger = Trigger::At(location);
                    last = pipeline.run(refresh_trigger.clone(), &surface).await;
                }
            }
            BoardAction::ShowHeaders => {
                print!("{}", format_headers(&last.headers()));
            }
            BoardAction::OpenDocs => {
                let url = pipeline.variant().docs_url();
                if let Err(err) = open::that(url) {
                    tracing::warn!("Could not open browser: {err}");
                    println!("Documentation: {url}");
                }
            }
            BoardAction::Quit => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_parses_target_arguments() {
        let cli = Cli::try_parse_from([
            "wxboard",
            "show",
            "--variant",
            "news",
            "--at",
            "60.39,5.32",
            "--name",
            "Bergen",
            "--headers",
        ])
        .unwrap();

        let Command::Show { target, headers } = cli.command else { panic!("expected show") };
        assert!(headers);
        assert_eq!(target.variant.as_deref(), Some("news"));

        let Trigger::At(location) = target.trigger() else { panic!("expected explicit location") };
        assert_eq!(location.name, "Bergen");
        assert_eq!(location.coordinate.latitude(), 60.39);
    }

    #[test]
    fn locate_conflicts_with_at() {
        let err = Cli::try_parse_from(["wxboard", "show", "--locate", "--at", "1,2"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn bad_coordinate_is_rejected() {
        assert!(Cli::try_parse_from(["wxboard", "board", "--at", "91,0"]).is_err());
    }

    #[test]
    fn default_trigger_without_flags() {
        let cli = Cli::try_parse_from(["wxboard", "-v", "board"]).unwrap();
        assert_eq!(cli.verbose, 1);
        let Command::Board { target } = cli.command else { panic!("expected board") };
        assert_eq!(target.trigger(), Trigger::Default);
    }

    #[test]
    fn southern_hemisphere_coordinates_parse() {
        let cli = Cli::try_parse_from(["wxboard", "show", "--at", "-33.87,151.21"]).unwrap();
        let Command::Show { target, .. } = cli.command else { panic!("expected show") };
        assert_eq!(target.at.map(|c| c.latitude()), Some(-33.87));
    }

    #[test]
    fn locate_flag_asks_for_device_location() {
        let cli = Cli::try_parse_from(["wxboard", "show", "--locate"]).unwrap();
        let Command::Show { target, .. } = cli.command else { panic!("expected show") };
        assert_eq!(target.trigger(), Trigger::Locate);
    }
}
