use clap::Parser;
use money_tracker::{StoreConfig, DEFAULT_CURRENCY_SYMBOL};
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config/money_tracker.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: PathBuf,
    pub in_memory: bool,
    pub currency_symbol: String,
    pub unique_names: bool,
    pub log_level: String,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("money_tracker.db"),
            in_memory: false,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
            unique_names: true,
            log_level: "info".to_string(),
            log_file: PathBuf::from("money_tracker.log"),
        }
    }
}

impl AppConfig {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            unique_names: self.unique_names,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "money-tracker", version, about = "Record and review expenses")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override the database file.
    #[arg(long)]
    database: Option<PathBuf>,
    /// Keep everything in memory; nothing is written to disk.
    #[arg(long)]
    in_memory: bool,
    /// Override the currency symbol shown next to amounts.
    #[arg(long)]
    currency_symbol: Option<String>,
    /// Allow several expenses with the same name.
    #[arg(long)]
    allow_duplicate_names: bool,
    /// Override the log filter (e.g. debug).
    #[arg(long)]
    log_level: Option<String>,
}

pub fn load() -> anyhow::Result<AppConfig> {
    resolve(Args::parse())
}

fn resolve(args: Args) -> anyhow::Result<AppConfig> {
    let config_path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("MONEY_TRACKER"));
    let mut settings: AppConfig = builder.build()?.try_deserialize()?;

    if let Some(database) = args.database {
        settings.database = database;
    }
    if args.in_memory {
        settings.in_memory = true;
    }
    if let Some(symbol) = args.currency_symbol {
        settings.currency_symbol = symbol;
    }
    if args.allow_duplicate_names {
        settings.unique_names = false;
    }
    if let Some(level) = args.log_level {
        settings.log_level = level;
    }

    Ok(settings)
}
