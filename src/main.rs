use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use flightpax_search::{
    config::Config,
    models::{ManifestMessage, Passenger, ReservationMessage},
    search::{InMemoryEngine, SearchService},
    AppError,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "flightpax")]
#[command(about = "Flight passenger search CLI", version, long_about = None)]
struct Cli {
    /// Use an in-process engine instead of the configured one
    #[arg(long)]
    memory: bool,

    /// Manifest message files to index before running the command
    #[arg(long = "seed-manifest", value_name = "FILE")]
    seed_manifests: Vec<PathBuf>,

    /// Reservation message files to index before running the command
    #[arg(long = "seed-reservation", value_name = "FILE")]
    seed_reservations: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show engine connection status
    Status,

    /// Free-text passenger search
    Search {
        #[arg(value_name = "QUERY")]
        query: String,

        #[arg(short, long, default_value = "1")]
        page: usize,

        #[arg(short = 's', long, default_value = "20")]
        page_size: usize,

        #[arg(long, default_value = "")]
        sort: String,

        #[arg(short = 'd', long, default_value = "desc")]
        direction: String,
    },

    /// Find records linked to a passenger by name or travel document
    Links {
        /// JSON file holding the passenger
        #[arg(long, value_name = "FILE")]
        passenger: PathBuf,

        #[arg(short, long, default_value = "1")]
        page: usize,

        #[arg(short = 's', long, default_value = "20")]
        page_size: usize,

        #[arg(long, default_value = "")]
        sort: String,

        #[arg(short = 'd', long, default_value = "desc")]
        direction: String,
    },

    /// Index a manifest message from a JSON file
    IndexManifest {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Index a reservation message from a JSON file
    IndexReservation {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.observability.log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if config.observability.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load().map_err(AppError::from).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {} ({})", e, e.error_code());
        eprintln!("Using default configuration");
        Config::default()
    });
    init_tracing(&config);

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Starting flightpax");

    let service = SearchService::new(config.engine.clone());
    let connected = if cli.memory {
        let engine = InMemoryEngine::new().map_err(AppError::from)?;
        service.connect_with(Arc::new(engine)).await
    } else {
        service.connect(&config).await
    };

    for path in &cli.seed_manifests {
        let message: ManifestMessage = read_json(path)?;
        service.index_manifest_message(&message).await;
    }
    for path in &cli.seed_reservations {
        let message: ReservationMessage = read_json(path)?;
        service.index_reservation_message(&message).await;
    }

    match cli.command {
        Commands::Status => {
            print_json(&json!({
                "available": connected,
                "engine": if cli.memory { "memory" } else { "elastic" },
                "index": service.config().index_name,
                "docType": service.config().doc_type,
            }))?;
        }

        Commands::Search {
            query,
            page,
            page_size,
            sort,
            direction,
        } => {
            let results = service
                .search_passengers(&query, page, page_size, &sort, &direction)
                .await
                .map_err(AppError::from)?;
            print_json(&results)?;
        }

        Commands::Links {
            passenger,
            page,
            page_size,
            sort,
            direction,
        } => {
            let passenger: Passenger = read_json(&passenger)?;
            let results = service
                .find_passenger_links(&passenger, page, page_size, &sort, &direction)
                .await
                .map_err(AppError::from)?;
            print_json(&results)?;
        }

        Commands::IndexManifest { file } => {
            if !connected {
                bail!("Search engine not available");
            }
            let message: ManifestMessage = read_json(&file)?;
            print_json(&service.index_manifest_message(&message).await)?;
        }

        Commands::IndexReservation { file } => {
            if !connected {
                bail!("Search engine not available");
            }
            let message: ReservationMessage = read_json(&file)?;
            print_json(&service.index_reservation_message(&message).await)?;
        }
    }

    service.close();
    Ok(())
}
