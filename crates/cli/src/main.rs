use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    beacon_gateway::AppState,
    beacon_history::{Field, FieldValue, HistoryStore},
    beacon_resolver::YoutubeResolver,
};

#[derive(Parser)]
#[command(name = "beacon", about = "Beacon — live-channel tracker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Address to bind to (overrides config value).
    #[arg(long, global = true)]
    bind: Option<String>,
    /// Port to listen on (overrides config value).
    #[arg(long, global = true)]
    port: Option<u16>,
    /// Directory of grouped channel documents (overrides config value).
    #[arg(long, global = true, env = "BEACON_DATA_DIR")]
    data_dir: Option<PathBuf>,
    /// Explicit config file path (skips discovery).
    #[arg(long, global = true, env = "BEACON_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the tracker server (default when no subcommand is provided).
    Serve,
    /// Load the store, rewrite the canonical group layout, and exit.
    Dump,
    /// Query the store offline by a single field.
    Lookup {
        /// Field to match (e.g. yt_id, yt_handle, name).
        #[arg(long)]
        field: Field,
        /// Value the field must equal.
        #[arg(long)]
        value: String,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "beacon starting");

    let config = match cli.config {
        Some(ref path) => beacon_config::load_config(path)?,
        None => beacon_config::discover_and_load(),
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.tracker.data_dir.clone());

    match cli.command {
        // Default: start the server when no subcommand is provided.
        None | Some(Commands::Serve) => {
            let bind = cli.bind.unwrap_or(config.server.bind);
            let port = cli.port.unwrap_or(config.server.port);

            let store = Arc::new(HistoryStore::open(&data_dir)?);
            info!(
                channels = store.channel_count(),
                data_dir = %data_dir.display(),
                "store loaded"
            );

            let state = AppState {
                store,
                resolver: Arc::new(YoutubeResolver::new(config.tracker.base_url)),
                max_age: config.tracker.max_age_secs,
            };
            beacon_gateway::start_gateway(&bind, port, state).await
        },
        Some(Commands::Dump) => {
            // Opening the store loads every group document and force-flushes
            // the normalized layout back out.
            let store = HistoryStore::open(&data_dir)?;
            info!(channels = store.channel_count(), "group layout rewritten");
            Ok(())
        },
        Some(Commands::Lookup { field, value }) => {
            let store = HistoryStore::open(&data_dir)?;
            let matches = store.find_all(&[(field, FieldValue::from(value))]);
            if matches.is_empty() {
                eprintln!("no matching channels");
            } else {
                for snapshot in matches {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                }
            }
            Ok(())
        },
    }
}
