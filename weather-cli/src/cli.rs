use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use tracing::{debug, info, warn};
use weather_core::{
    Config, ProviderId, WeatherApiClient,
    dashboard::{DEFAULT_RECORD_COUNT, DashboardLoader, DashboardState, DashboardView},
    map::MapController,
    provider::{
        ConditionsProvider, default_provider_from_config, ipapi::IpApiLocator,
        provider_from_config,
    },
};

use crate::render::{TextCharts, TextMap, format_record, format_record_row, format_summary};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather tracker CLI")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider.
    Configure {
        /// Provider short name, e.g. "openweather" or "weatherapi".
        provider: String,
    },

    /// Show or set the weather API server URL.
    Server {
        /// New base URL, e.g. "http://localhost:3000".
        url: Option<String>,
    },

    /// Chart the most recent records.
    Dashboard {
        /// How many records to chart.
        #[arg(long, default_value_t = DEFAULT_RECORD_COUNT)]
        limit: u64,
    },

    /// Show current conditions on the map: your location, a city or a coordinate.
    Map {
        /// City to search for.
        #[arg(long, conflicts_with = "at")]
        search: Option<String>,

        /// Coordinate to inspect, as "LAT,LON".
        #[arg(long, value_parser = parse_lat_lon, allow_hyphen_values = true)]
        at: Option<(f64, f64)>,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Look up current conditions for a city and save them to the API.
    Record {
        city: String,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,
    },

    /// Show the most recently saved record.
    Latest,

    /// Show the most recent record whose city contains NAME.
    City { name: String },

    /// List saved records, newest first.
    List {
        #[arg(long, default_value_t = 1)]
        page: u64,

        #[arg(long, default_value_t = 10)]
        limit: u64,
    },

    /// Delete a saved record by id.
    Delete { id: String },

    /// Count saved records by condition.
    Summary,
}

fn parse_lat_lon(raw: &str) -> Result<(f64, f64), String> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected LAT,LON, got '{raw}'"))?;
    let lat: f64 = lat
        .trim()
        .parse()
        .map_err(|_| format!("invalid latitude '{}'", lat.trim()))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|_| format!("invalid longitude '{}'", lon.trim()))?;

    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("latitude {lat} is outside -90..=90"));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("longitude {lon} is outside -180..=180"));
    }
    Ok((lat, lon))
}

fn conditions_provider(
    config: &Config,
    provider: Option<&str>,
) -> anyhow::Result<Box<dyn ConditionsProvider>> {
    match provider {
        Some(name) => {
            let id = ProviderId::try_from(name)?;
            debug!(provider = %id, "Using requested conditions provider");
            provider_from_config(id, config)
        }
        None => {
            debug!(provider = ?config.default_provider, "Using default conditions provider");
            default_provider_from_config(config)
        }
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let mut config = Config::load()?;
        let server_url = config.server_url().to_string();
        let client = || WeatherApiClient::new(server_url.clone());
        debug!(server = %server_url, command = ?self.command, "Running command");

        match self.command {
            Command::Configure { provider } => configure(&mut config, &provider)?,

            Command::Server { url } => match url {
                Some(url) => {
                    config.set_server_url(&url)?;
                    config.save()?;
                    println!("Server URL set to {}", config.server_url());
                }
                None => println!("{}", config.server_url()),
            },

            Command::Dashboard { limit } => {
                let state = DashboardLoader::new(client()).with_count(limit).load().await;
                let mut view = DashboardView::new(TextCharts::default());
                view.render(&state);

                match state {
                    DashboardState::Placeholder => println!(
                        "No weather data to chart yet. Save some with `weather record <city>`."
                    ),
                    DashboardState::Ready(_) => print!("{}", view.renderer().output()),
                }
            }

            Command::Map {
                search,
                at,
                provider,
            } => {
                let provider = conditions_provider(&config, provider.as_deref())?;
                let mut map =
                    MapController::new(Box::new(IpApiLocator::new()), provider, TextMap::default());

                match (search, at) {
                    (Some(city), _) => map.search(&city).await,
                    (None, Some((lat, lon))) => map.click(lat, lon).await,
                    (None, None) => map.load().await,
                };

                for line in map.surface().transcript() {
                    println!("{line}");
                }
            }

            Command::Record { city, provider } => {
                let provider = conditions_provider(&config, provider.as_deref())?;
                let location = provider
                    .geocode(&city)
                    .await
                    .inspect_err(|e| warn!(city = %city, error = %e, "Geocoding failed"))
                    .with_context(|| format!("Could not find '{city}'"))?;
                let conditions = provider
                    .current(location.lat, location.lon)
                    .await
                    .with_context(|| {
                        format!("Could not fetch conditions for {}", location.display_name())
                    })?;

                let saved = client()
                    .save(&conditions.into_new_record())
                    .await
                    .inspect_err(|e| warn!(error = %e, "Saving the record failed"))?;
                info!(id = %saved.id, city = %saved.city, "Saved weather record");
                println!("Saved:\n{}", format_record(&saved));
            }

            Command::Latest => println!("{}", format_record(&client().latest().await?)),

            Command::City { name } => println!("{}", format_record(&client().by_city(&name).await?)),

            Command::List { page, limit } => {
                let page = client().all(page, limit).await?;
                if page.records.is_empty() {
                    println!("No weather records found.");
                }
                for record in &page.records {
                    println!("{}", format_record_row(record));
                }
                let p = page.pagination;
                println!("Page {} of {} ({} records)", p.page, p.pages.max(1), p.total);
            }

            Command::Delete { id } => println!("{}", client().delete(&id).await?),

            Command::Summary => println!("{}", format_summary(&client().summary().await?)),
        }

        Ok(())
    }
}

fn configure(config: &mut Config, provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;

    let prompt = format!("API key for {id}:");
    let api_key = Password::new(&prompt)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        bail!("API key must not be empty");
    }

    config.set_api_key(id, api_key.to_string());

    if config.default_provider_id().ok() != Some(id) {
        let make_default = Confirm::new(&format!("Make {id} the default provider?"))
            .with_default(false)
            .prompt()
            .context("Failed to read answer")?;
        if make_default {
            config.set_default_provider(id);
        }
    }

    config.save()?;
    println!(
        "Saved {id} credentials to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_coordinate_pairs() {
        assert_eq!(parse_lat_lon("48.85, 2.35"), Ok((48.85, 2.35)));
        assert_eq!(parse_lat_lon("-33.87,151.21"), Ok((-33.87, 151.21)));
        assert!(parse_lat_lon("48.85").is_err());
        assert!(parse_lat_lon("north,2").is_err());
        assert!(parse_lat_lon("95,2").is_err());
    }

    #[test]
    fn map_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from(["weather", "map", "--at", "-33.87,151.21"]).unwrap();
        match cli.command {
            Command::Map { at, search, .. } => {
                assert_eq!(at, Some((-33.87, 151.21)));
                assert!(search.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn map_search_and_at_conflict() {
        assert!(
            Cli::try_parse_from(["weather", "map", "--search", "Paris", "--at", "1,2"]).is_err()
        );
    }

    #[test]
    fn list_defaults() {
        let cli = Cli::try_parse_from(["weather", "list"]).unwrap();
        assert!(matches!(cli.command, Command::List { page: 1, limit: 10 }));

        let cli = Cli::try_parse_from(["weather", "dashboard"]).unwrap();
        assert!(matches!(cli.command, Command::Dashboard { limit: 10 }));
    }

    #[test]
    fn summary_takes_no_arguments() {
        let cli = Cli::try_parse_from(["weather", "summary"]).unwrap();
        assert!(matches!(cli.command, Command::Summary));
        assert!(Cli::try_parse_from(["weather", "summary", "Rain"]).is_err());
    }
}
