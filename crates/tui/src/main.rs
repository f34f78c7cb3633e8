mod input;
mod renderer;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use roadview_core::live::{LiveVehicleState, TrendSeriesBuffer};
use roadview_core::model::NetworkStore;
use roadview_core::ViewerSettings;
use tracing::info;
use tracing_subscriber::EnvFilter;

const LOG_FILE: &str = "roadview-tui.log";

struct Args {
    config: Option<PathBuf>,
    settings: PathBuf,
}

fn parse_args() -> Result<Args> {
    let mut args = Args {
        config: None,
        settings: PathBuf::from("roadview.json"),
    };
    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--settings" => {
                args.settings = it.next().map(PathBuf::from).context("--settings needs a path")?;
            }
            "-h" | "--help" => {
                eprintln!("Usage: roadview-tui [config.sumocfg] [--settings roadview.json]");
                std::process::exit(0);
            }
            _ => args.config = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

/// Log to a file; the terminal is owned by the alternate screen.
fn init_logging() -> Result<()> {
    let file = std::fs::File::create(LOG_FILE).with_context(|| format!("creating {LOG_FILE}"))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roadview=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    init_logging()?;
    let args = parse_args()?;

    let mut settings = ViewerSettings::load(&args.settings)?;
    if let Some(config) = args.config {
        settings.config_path = config;
    }

    info!(config = %settings.config_path.display(), "starting terminal viewer");

    let store = NetworkStore::default();
    let vehicles = Arc::new(LiveVehicleState::new());
    let trends = Arc::new(TrendSeriesBuffer::new(settings.trend_capacity));

    renderer::run_tui(renderer::Shared {
        store: &store,
        vehicles: &vehicles,
        trends: &trends,
        settings: &settings,
    })
}
