mod routes;
mod state;
mod tick_loop;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;
use parking_lot::Mutex;
use siege_core::Difficulty;
use siege_world::{build_initial_state, load_content, SaveStore};
use state::{AppState, SimState};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "siege_daemon", about = "Fortress Siege HTTP daemon")]
struct Cli {
    #[arg(long, default_value_t = 3001)]
    port: u16,
    #[arg(long, default_value = "./content")]
    content_dir: String,
    /// Resume from and autosave into this directory.
    #[arg(long)]
    save_dir: Option<PathBuf>,
    /// Used when there is no save to resume.
    #[arg(long, default_value = "veteran")]
    difficulty: Difficulty,
    /// Let the autopilot play at this many cycles per second (0 = manual).
    #[arg(long, default_value_t = 0.0)]
    autoplay: f64,
    #[arg(long, default_value = "http://localhost:5173")]
    cors_origin: String,
}

fn build_sim(cli: &Cli) -> Result<SimState> {
    let content = load_content(&cli.content_dir)?;
    let store = cli.save_dir.as_ref().map(SaveStore::new);
    let resumed = store.as_ref().and_then(SaveStore::load);
    let game_state = match resumed {
        Some(state) => {
            tracing::info!(cycle = state.cycle, "resuming saved game");
            state
        }
        None => build_initial_state(&content, cli.difficulty),
    };
    Ok(SimState::new(game_state, content, store))
}

/// Slowest and fastest autoplay paces accepted by `--autoplay`.
const AUTOPLAY_RANGE: std::ops::RangeInclusive<f64> = 0.01..=1000.0;

fn check_autoplay_rate(cycles_per_sec: f64) -> Result<()> {
    anyhow::ensure!(
        cycles_per_sec.is_finite() && cycles_per_sec >= 0.0,
        "--autoplay must be a non-negative number, got {cycles_per_sec}"
    );
    anyhow::ensure!(
        cycles_per_sec <= 0.0 || AUTOPLAY_RANGE.contains(&cycles_per_sec),
        "--autoplay must be 0 or between {} and {} cycles per second, got {cycles_per_sec}",
        AUTOPLAY_RANGE.start(),
        AUTOPLAY_RANGE.end()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    check_autoplay_rate(cli.autoplay)?;
    let cors_origin: HeaderValue = cli
        .cors_origin
        .parse()
        .with_context(|| format!("invalid --cors-origin: {}", cli.cors_origin))?;
    let sim = Arc::new(Mutex::new(build_sim(&cli)?));
    let (event_tx, _) = tokio::sync::broadcast::channel(256);
    let app_state = AppState {
        sim: sim.clone(),
        event_tx: event_tx.clone(),
        paused: Arc::new(AtomicBool::new(false)),
        cycles_per_sec: cli.autoplay,
    };

    if cli.autoplay > 0.0 {
        tokio::spawn(tick_loop::run_autoplay(
            sim,
            event_tx,
            app_state.paused.clone(),
            cli.autoplay,
        ));
    }

    let app = routes::make_router_with_cors(app_state, cors_origin);
    let addr = format!("0.0.0.0:{}", cli.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!(%addr, autoplay = cli.autoplay, "siege_daemon listening");
    axum::serve(listener, app).await.context("serving HTTP")?;
    Ok(())
}
