// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

mod config;

use anyhow::{Context, Result};
use money_tracker::Store;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let settings = config::load()?;
    init_logging(&settings)?;

    tracing::info!(version = money_tracker::VERSION, "starting money tracker");

    // The store is required; without it there is nothing to show
    let store = open_store(&settings).map_err(|err| {
        tracing::error!("failed to open expense store: {err}");
        err
    })?;

    run_ui_mode(store, &settings)
}

fn init_logging(settings: &config::AppConfig) -> Result<()> {
    // The terminal belongs to the UI, so logs go to a file
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&settings.log_file)
        .with_context(|| format!("Failed to open log file {}", settings.log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "money_tracker={level}",
            level = settings.log_level
        )))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();

    Ok(())
}

fn open_store(settings: &config::AppConfig) -> Result<Store> {
    let store = if settings.in_memory {
        Store::open_in_memory(settings.store_config())?
    } else {
        Store::open(&settings.database, settings.store_config()).with_context(|| {
            format!("Could not open database {}", settings.database.display())
        })?
    };
    Ok(store)
}

#[cfg(feature = "tui")]
fn run_ui_mode(store: Store, settings: &config::AppConfig) -> Result<()> {
    let mut app = ui::App::new(store, settings.currency_symbol.clone())
        .context("Failed to load expenses")?;
    ui::run_ui(&mut app)?;

    tracing::info!("ui closed");
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_store: Store, _settings: &config::AppConfig) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    std::process::exit(1);
}
