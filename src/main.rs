//! wager-engine server binary

use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};
use tracing::info;
use wager_engine::{
    api::{init_tracing, ApiServer, AppState},
    config::{AppConfig, ConfigLoader},
    games::CasinoSettings,
    games::UserId,
    ledger::MemoryLedger,
    notifications::LogNotifier,
    MemoryConfigStore, WagerEngine,
};

/// Casino wager engine
#[derive(Parser)]
#[command(name = "wager-engine")]
#[command(about = "Wager session engine with an HTTP API")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Game settings JSON, overrides `settings_path` from the config
        #[arg(short, long)]
        settings: Option<PathBuf>,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Fixed RNG seed for reproducible outcomes
        #[arg(long)]
        rng_seed: Option<u64>,

        /// Open an in-memory account, `USER_ID:BALANCE` in minor units. Repeatable.
        #[arg(long = "account", value_parser = parse_account)]
        accounts: Vec<(UserId, u64)>,
    },

    /// Write the default configuration to a TOML file
    InitConfig {
        #[arg(default_value = "wager.toml")]
        path: PathBuf,
    },

    /// Write the default game settings to a JSON file
    InitSettings {
        #[arg(default_value = "casino_settings.json")]
        path: PathBuf,
    },
}

fn parse_account(raw: &str) -> Result<(UserId, u64), String> {
    let (user, balance) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected USER_ID:BALANCE, got '{}'", raw))?;
    let user = user.trim().parse().map_err(|e| format!("invalid user id '{}': {}", user, e))?;
    let balance = balance
        .trim()
        .parse()
        .map_err(|e| format!("invalid balance '{}': {}", balance, e))?;
    Ok((user, balance))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let loader = match &cli.config {
        Some(path) => ConfigLoader::new().with_path(path),
        None => ConfigLoader::new(),
    };

    match cli.command {
        Commands::Serve {
            settings,
            host,
            port,
            rng_seed,
            accounts,
        } => {
            let mut config = loader.load()?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            if rng_seed.is_some() {
                config.engine.rng_seed = rng_seed;
            }
            if let Some(path) = settings {
                config.settings_path = Some(path.to_string_lossy().to_string());
            }
            serve(config, accounts).await
        }
        Commands::InitConfig { path } => {
            loader.save(&AppConfig::default(), &path.to_string_lossy())?;
            info!("Wrote default configuration to {}", path.display());
            Ok(())
        }
        Commands::InitSettings { path } => {
            std::fs::write(&path, serde_json::to_string_pretty(&CasinoSettings::default())?)?;
            info!("Wrote default game settings to {}", path.display());
            Ok(())
        }
    }
}

async fn serve(config: AppConfig, accounts: Vec<(UserId, u64)>) -> Result<(), Box<dyn std::error::Error>> {
    let settings = match &config.settings_path {
        Some(path) => {
            info!("Loading game settings from {}", path);
            CasinoSettings::load_json(path)?
        }
        None => CasinoSettings::default(),
    };

    let ledger = Arc::new(MemoryLedger::new());
    for (user_id, balance) in accounts {
        ledger.open_account(user_id, balance)?;
        info!(user_id, balance, "account opened");
    }

    let engine = WagerEngine::builder(ledger, Arc::new(MemoryConfigStore::new(settings)?))
        .notifier(Arc::new(LogNotifier))
        .settings(config.engine.clone())
        .build();
    let metrics = engine.metrics();

    let state = Arc::new(AppState {
        engine: Arc::new(engine),
        metrics,
        admin_token: config.server.admin_token.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    });

    ApiServer::new(config.server, state).run().await
}
