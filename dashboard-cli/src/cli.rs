use anyhow::{Context, Result, anyhow, bail};
use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use dashboard_core::{
    Config, Coordinates, Dashboard, FixedPosition, UnitSystem, provider::source_from_config,
};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text};

use crate::render::DashboardView;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather-dashboard", version, about = "Weather dashboard in your terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the API key, default units and default location.
    Configure,

    /// Show the dashboard once and exit.
    Show(LocationArgs),

    /// Keep the dashboard open and search interactively.
    Interactive(LocationArgs),
}

#[derive(Debug, Args)]
pub struct LocationArgs {
    /// Address or location name.
    pub location: Option<String>,

    /// Latitude of the current position.
    #[arg(long, requires = "lon", allow_negative_numbers = true)]
    pub lat: Option<f64>,

    /// Longitude of the current position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    pub lon: Option<f64>,

    /// Unit system: metric or imperial. Defaults to the configured one.
    #[arg(long)]
    pub units: Option<UnitSystem>,
}

impl LocationArgs {
    fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// One line typed at the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Search(String),
    ToggleUnits,
    Locate,
    Refresh,
    Redraw,
    Quit,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" => Input::Redraw,
        ":units" | ":u" => Input::ToggleUnits,
        ":here" | ":h" => Input::Locate,
        ":refresh" | ":r" => Input::Refresh,
        ":quit" | ":q" => Input::Quit,
        query => Input::Search(query.to_string()),
    }
}

fn parse_coordinates(input: &str) -> Result<Coordinates> {
    let (lat, lon) = input
        .split_once(',')
        .ok_or_else(|| anyhow!("Expected coordinates as 'latitude, longitude'"))?;

    let lat: f64 = lat.trim().parse().context("Invalid latitude")?;
    let lon: f64 = lon.trim().parse().context("Invalid longitude")?;

    let coords = Coordinates::new(lat, lon);
    if !coords.is_valid() {
        bail!("Coordinates out of range: {coords}");
    }
    Ok(coords)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show(args) => show(args).await,
            Command::Interactive(args) => interactive(args).await,
        }
    }
}

fn build_dashboard(config: &Config, args: &LocationArgs) -> Result<Dashboard> {
    let source = source_from_config(config)?;
    let units = args.units.unwrap_or(config.units);
    let position = args.coordinates().or(config.home);

    Ok(Dashboard::new(source, units).with_geolocator(Box::new(FixedPosition::new(position))))
}

/// Initial fetch: explicit name, explicit coordinates, configured location, then home position.
async fn load_initial(dashboard: &mut Dashboard, config: &Config, args: &LocationArgs) -> bool {
    if let Some(location) = args.location.as_deref() {
        dashboard.search(location).await;
    } else if let Some(coords) = args.coordinates() {
        dashboard.fetch_by_coordinates(coords).await;
    } else if let Some(location) = config.default_location() {
        dashboard.search(location).await;
    } else {
        return dashboard.locate().await;
    }
    true
}

fn print_dashboard(dashboard: &mut Dashboard) {
    dashboard.tick(Utc::now());
    println!("{}", DashboardView::new(dashboard.state(), Local));
}

async fn show(args: LocationArgs) -> Result<()> {
    let config = Config::load()?;
    let mut dashboard = build_dashboard(&config, &args)?;

    if !load_initial(&mut dashboard, &config, &args).await {
        bail!(
            "No location given.\n\
             Hint: pass a location, use --lat/--lon, or run `weather-dashboard configure`."
        );
    }

    if let Some(error) = dashboard.state().error() {
        bail!("{error}");
    }

    print_dashboard(&mut dashboard);
    Ok(())
}

async fn interactive(args: LocationArgs) -> Result<()> {
    let config = Config::load()?;
    let mut dashboard = build_dashboard(&config, &args)?;

    load_initial(&mut dashboard, &config, &args).await;

    loop {
        print_dashboard(&mut dashboard);

        let prompt = tokio::task::spawn_blocking(|| {
            Text::new("Search location...")
                .with_help_message(":units toggle °C/°F, :here locate, :refresh, :quit")
                .prompt()
        })
        .await
        .context("Prompt task failed")?;

        let line = match prompt {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("Failed to read input"),
        };

        let input = parse_input(&line);
        tracing::debug!(?input, "prompt input");

        match input {
            Input::Search(query) => dashboard.search(&query).await,
            Input::ToggleUnits => dashboard.toggle_units().await,
            Input::Locate => {
                dashboard.locate().await;
            }
            Input::Refresh => dashboard.refresh().await,
            Input::Redraw => {}
            Input::Quit => break,
        }
    }

    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load_from(&Config::config_file_path()?)?;

    let mut key_prompt = Password::new("OpenWeather API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation();
    if config.api_key().is_some() {
        key_prompt = key_prompt.with_help_message("Leave empty to keep the current key");
    }
    let key = key_prompt.prompt()?;
    if !key.trim().is_empty() {
        config.api_key = Some(key.trim().to_string());
    }
    if config.api_key().is_none() {
        bail!("An API key is required. Get one at https://openweathermap.org/api");
    }

    let units = UnitSystem::all().to_vec();
    let start = units.iter().position(|u| *u == config.units).unwrap_or(0);
    config.units = Select::new("Default units:", units)
        .with_starting_cursor(start)
        .prompt()?;

    let location = Text::new("Default location (optional):")
        .with_initial_value(config.default_location().unwrap_or_default())
        .prompt()?;
    config.default_location = Some(location.trim().to_string()).filter(|l| !l.is_empty());

    let home = Text::new("Home coordinates as 'lat, lon' (optional):")
        .with_initial_value(
            &config
                .home
                .map(|c| format!("{}, {}", c.latitude, c.longitude))
                .unwrap_or_default(),
        )
        .prompt()?;
    config.home = match home.trim() {
        "" => None,
        value => Some(parse_coordinates(value)?),
    };

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
