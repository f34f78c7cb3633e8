use std::path::PathBuf;

use anyhow::{Context, Result};
use roadview_core::ViewerSettings;
use roadview_ui::RoadviewApp;
use tracing::info;
use tracing_subscriber::EnvFilter;

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
                eprintln!("Usage: roadview [config.sumocfg] [--settings roadview.json]");
                std::process::exit(0);
            }
            _ => args.config = Some(PathBuf::from(arg)),
        }
    }
    Ok(args)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("roadview=info")),
        )
        .init();

    let args = parse_args()?;
    let mut settings = ViewerSettings::load(&args.settings)?;
    if let Some(config) = args.config {
        settings.config_path = config;
    }
    info!(config = %settings.config_path.display(), "starting desktop viewer");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("roadview")
            .with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };
    eframe::run_native(
        "roadview",
        options,
        Box::new(move |cc| Ok(Box::new(RoadviewApp::new(cc, settings)))),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with error: {e}"))
}
