//! CLI binary entry point for campsite-cli

#[cfg(feature = "cli")]
use campsite_warehouse::api::Endpoint;
#[cfg(feature = "cli")]
use campsite_warehouse::cli::commands::{
    fetch::{FetchArgs, handle_fetch},
    ingest::{IngestArgs, handle_ingest},
    init::{InitArgs, handle_init},
    run::{RunArgs, handle_run},
    show::{ShowArgs, handle_show},
};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "campsite-cli")]
#[command(about = "Load campsite API documents and build warehouse tables")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Write a sample .campsites.toml
    Init {
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },

    /// Fetch an API endpoint and save the response as a raw file
    Fetch {
        /// Endpoint: campsites, alerts or detail
        endpoint: Endpoint,
        /// Asset id of a single campsite detail
        #[arg(long, conflicts_with = "listing")]
        id: Option<i64>,
        /// Saved campsite listing; fetches the detail of every campsite in it
        #[arg(long)]
        listing: Option<PathBuf>,
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },

    /// Load raw files into an endpoint's source table
    Ingest {
        /// Endpoint: campsites, alerts or detail
        endpoint: Endpoint,
        /// Directory or file to load (defaults to the endpoint's raw directory)
        path: Option<PathBuf>,
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },

    /// Build staging views and merge marts
    Run {
        /// Models to run, with their upstream models (repeatable)
        #[arg(short, long)]
        select: Vec<String>,
        /// Rebuild incremental marts from scratch
        #[arg(long)]
        full_refresh: bool,
        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },

    /// List tables, or print the rows of one
    Show {
        /// Mart, staging model or raw table name
        table: Option<String>,
        /// Maximum number of rows to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
        /// Print as JSON
        #[arg(long)]
        json: bool,
        /// Project directory
        #[arg(short, long, default_value = ".")]
        project: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Init { project, force } => handle_init(&InitArgs { project, force }),
        Commands::Fetch {
            endpoint,
            id,
            listing,
            project,
        } => handle_fetch(&FetchArgs {
            project,
            endpoint,
            id,
            listing,
        }),
        Commands::Ingest {
            endpoint,
            path,
            project,
        } => handle_ingest(&IngestArgs {
            project,
            endpoint,
            path,
        }),
        Commands::Run {
            select,
            full_refresh,
            json,
            project,
        } => handle_run(&RunArgs {
            project,
            select,
            full_refresh,
            json,
        }),
        Commands::Show {
            table,
            limit,
            json,
            project,
        } => handle_show(&ShowArgs {
            project,
            table,
            limit,
            json,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature is not enabled. Build with --features cli");
    std::process::exit(1);
}
