mod app;
mod catalog;
mod config;
mod constellation;
mod diagnostics;
mod headless;
mod layout;
mod util;

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, anyhow};
use clap::Parser;
use eframe::egui::vec2;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::catalog::{JsonFileSource, SkillSource, fetch_all};
use crate::config::EngineConfig;

const WINDOW_SIZE: [f32; 2] = [1440.0, 920.0];

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON file holding the skill catalog.
    #[arg(long)]
    catalog: PathBuf,
    /// Acting user id; defaults to the catalog's `currentUser`.
    #[arg(long)]
    user: Option<String>,
    /// Optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Re-fetch the catalog every N seconds.
    #[arg(long)]
    refresh_secs: Option<u64>,
    /// Print the settled layout as JSON instead of opening a window.
    #[arg(long)]
    dump_layout: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skill_constellation=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn dump_layout(source: &dyn SkillSource, config: &EngineConfig) -> anyhow::Result<()> {
    let fetch = fetch_all(source).context("failed to fetch the skill catalog")?;
    let dump = headless::settle_layout(fetch, config, vec2(WINDOW_SIZE[0], WINDOW_SIZE[1]));

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &dump).context("failed to write layout dump")?;
    writeln!(stdout).context("failed to write layout dump")?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = EngineConfig::load(args.config.as_deref())
        .with_context(|| format!("failed to load configuration from {:?}", args.config))?;
    let file_source = JsonFileSource::new(&args.catalog, args.user);
    tracing::info!(catalog = %file_source.path().display(), "using skill catalog");
    let source: Arc<dyn SkillSource> = Arc::new(file_source);

    if args.dump_layout {
        return dump_layout(source.as_ref(), &config);
    }

    let refresh_every = args
        .refresh_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs);
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size(WINDOW_SIZE),
        ..Default::default()
    };

    eframe::run_native(
        "skill-constellation",
        options,
        Box::new(move |cc| {
            Ok(Box::new(app::SkillConstellationApp::new(
                cc,
                source,
                config,
                refresh_every,
            )))
        }),
    )
    .map_err(|error| anyhow!("viewer exited with an error: {error}"))
}
