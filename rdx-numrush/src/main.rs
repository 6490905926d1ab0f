use anyhow::Result;
use colored::Colorize;
use numrush::prelude::*;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    // 2. Load the configuration, optionally from a TOML file given as the first argument.
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = NumrushConfig::load(config_path.as_deref())?;
    info!(point_count = config.point_count, "configuration loaded");

    // 3. Create the engine.
    let engine = NumrushEngine::start(config)?;

    // 4. Spawn concurrent tasks to listen to the event streams.
    spawn_event_listeners(&engine);

    // 5. Let autoplay clear a board, then lose one on purpose.
    let cleared = play_autoplay_round(&engine).await?;
    report(&cleared);
    let lost = play_wrong_click_round(&engine).await?;
    report(&lost);

    engine.shutdown().await;
    Ok(())
}

/// Spawns tasks that log every event the engine broadcasts.
fn spawn_event_listeners(engine: &NumrushEngine) {
    let mut system_rx = engine.subscribe_system_events();
    tokio::spawn(async move {
        while let Ok(event) = system_rx.recv().await {
            info!("[SYSTEM] => {:?}", event);
        }
    });

    let mut game_rx = engine.subscribe_game_events();
    tokio::spawn(async move {
        while let Ok(event) = game_rx.recv().await {
            info!("[GAME] => {:?}", event);
        }
    });
}

async fn play_autoplay_round(engine: &NumrushEngine) -> Result<Snapshot> {
    let mut snapshots = engine.watch_snapshots();
    engine.set_autoplay_enabled(true).await?;
    engine.start_game().await?;
    let done = snapshots.wait_for(|s| s.phase.is_terminal()).await?.clone();
    engine.set_autoplay_enabled(false).await?;
    Ok(done)
}

async fn play_wrong_click_round(engine: &NumrushEngine) -> Result<Snapshot> {
    engine.start_game().await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    engine.click(1).await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    let outcome = engine.click(engine.snapshot().point_count + 1).await?;
    info!(?outcome, "deliberate wrong click");
    Ok(engine.snapshot())
}

fn report(snapshot: &Snapshot) {
    let banner = match snapshot.tone {
        MessageTone::Success => snapshot.message.green().bold(),
        MessageTone::Failure => snapshot.message.red().bold(),
        MessageTone::Neutral => snapshot.message.normal(),
    };
    println!(
        "{} {} in {:.1}s (next was {})",
        snapshot.session.to_string().dimmed(),
        banner,
        snapshot.elapsed_secs,
        snapshot.expected_next
    );
}
