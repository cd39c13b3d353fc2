use std::sync::Arc;

use ractor::Actor;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use whack::config::Config;
use whack::poker::{stop_pokers, PokerActor, PokerArguments};
use whack::{hammer, render};
use whack_core::Grid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Frames go to stdout, so logs go to stderr.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whack=info,whack_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        cols = config.layout.cols(),
        rows = config.layout.rows(),
        tick_ms = u64::try_from(config.timing.tick.as_millis()).unwrap_or(u64::MAX),
        pokers = config.poke_intervals.len(),
        "whack starting"
    );

    let grid = Arc::new(Grid::new(config.layout, config.timing));
    grid.start()?;

    // Pokers, renderer and hammer all stop on this token; the grid has its own.
    let shutdown = tokio_util::sync::CancellationToken::new();

    let mut pokers = Vec::with_capacity(config.poke_intervals.len());
    for (i, interval) in config.poke_intervals.iter().enumerate() {
        let (poker, handle) = Actor::spawn(
            Some(format!("poker.{i}")),
            PokerActor,
            PokerArguments {
                grid: grid.clone(),
                interval: *interval,
                poker_id: format!("poker:{i}"),
            },
        )
        .await
        .map_err(|e| anyhow::anyhow!("failed to spawn poker {i}: {e}"))?;
        pokers.push((poker, handle));
    }

    let renderer = tokio::spawn(render::run_renderer(
        grid.clone(),
        config.frame_interval,
        config.frame_format,
        tokio::io::stdout(),
        shutdown.clone(),
    ));

    let hammer = tokio::spawn(hammer::run_hammer(
        grid.clone(),
        hammer::spawn_stdin_reader(),
        shutdown.clone(),
    ));

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("ctrl-c received");
        }
        _ = shutdown.cancelled() => {}
    }

    shutdown.cancel();
    // In-flight pokes land before the gophers go away.
    stop_pokers(pokers).await?;
    grid.shutdown().await;

    if let Err(e) = renderer.await? {
        tracing::warn!(error = %e, "renderer stopped with an error");
    }
    hammer.await?;

    info!("whack stopped");
    Ok(())
}
