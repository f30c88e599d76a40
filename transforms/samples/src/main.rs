use aerospike_connect_inbound::reader::memory::MemoryStore;
use aerospike_connect_samples::logging;
use aerospike_connect_samples::registry::build_registry;
use aerospike_connect_samples::replay::{replay, ReplayConfig, ReplayError, ReplaySummary};
use clap::Parser;
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::BufReader;

/// Replays recorded Kafka messages through the configured inbound transforms
/// against an in-memory store
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Topic and logging settings
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// JSON-lines file with one Kafka record per line
    #[arg(short, long, required = true)]
    input: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match ReplayConfig::from_file(args.config.as_str()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load config: {}", err);
            return;
        }
    };
    let _logger = match logging::init(&config.logging) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("Failed to initialize logging: {}", err);
            return;
        }
    };
    match run(&args, &config).await {
        Ok(summary) => log::info!("Replay finished: {:?}", summary),
        Err(err) => log::error!("Replay failed: {}", err),
    };

    log::debug!("Replay stopped");
}

async fn run(args: &Args, config: &ReplayConfig) -> Result<ReplaySummary, ReplayError> {
    let registry = build_registry()?;
    let input = BufReader::new(File::open(args.input.as_str()).await?);
    let store = Arc::new(MemoryStore::new());
    let summary = replay(&config.inbound, &registry, input, store.clone()).await?;
    for (key, record) in store.snapshot() {
        log::debug!("[{}] {:?}", key, record.bins);
    }
    Ok(summary)
}
