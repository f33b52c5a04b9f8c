mod analyze;
mod lookup;

use clap::{Parser, Subcommand};
use prospecto_core::Coordinates;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "prospecto-cli")]
#[command(about = "Prospecto command line interface")]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, clap::Args)]
struct PointArgs {
    /// Latitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    /// Longitude in decimal degrees
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
}

impl PointArgs {
    fn coordinates(self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reverse-geocode a point against Nominatim and IBGE
    Inspect {
        #[command(flatten)]
        point: PointArgs,
    },
    /// List establishments near a point
    Places {
        #[command(flatten)]
        point: PointArgs,
    },
    /// Forward-geocode a street address
    Geocode {
        #[arg(long)]
        street: String,
        #[arg(long, default_value = "")]
        number: String,
        #[arg(long)]
        city: String,
        #[arg(long, default_value = "")]
        state: String,
    },
    /// Search the IBGE address index
    FindAddress {
        /// Free-text address
        query: String,
    },
    /// Run the whole workflow for a point: inspect, pick, enrich
    Analyze {
        #[command(flatten)]
        point: PointArgs,
        /// Place to analyze; defaults to the first nearby result
        #[arg(long)]
        place_id: Option<String>,
        /// Analyze the point itself instead of a listed place
        #[arg(long, conflicts_with = "place_id")]
        alternative: bool,
        /// Known CNPJ to seed the enrichment with
        #[arg(long)]
        tax_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = prospecto_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Inspect { point } => {
            lookup::run_inspect(&config, point.coordinates(), cli.json).await
        }
        Commands::Places { point } => {
            lookup::run_places(&config, point.coordinates(), cli.json).await
        }
        Commands::Geocode {
            street,
            number,
            city,
            state,
        } => {
            let query = prospecto_geo::AddressQuery {
                street,
                number,
                city,
                state,
            };
            lookup::run_geocode(&config, &query, cli.json).await
        }
        Commands::FindAddress { query } => {
            lookup::run_find_address(&config, &query, cli.json).await
        }
        Commands::Analyze {
            point,
            place_id,
            alternative,
            tax_id,
        } => {
            let options = analyze::AnalyzeOptions {
                point: point.coordinates(),
                place_id,
                alternative,
                tax_id,
                json: cli.json,
            };
            analyze::run_analyze(&config, options).await
        }
    }
}

#[cfg(test)]
mod tests;
