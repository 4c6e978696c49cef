use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use headsup::Result;
use headsup::config::Config;
use headsup::decay::{NON_DISMISSIBLE_BONUS, PRIORITY_BONUS};
use headsup::error::{ConfigError, Error};
use headsup::overlay::{Collaborators, Engine, LAYOUT_ANIMATION_TIME};
use headsup::platform::{MonotonicClock, Surface};
use headsup::telemetry::{LogFormat, init_tracing};
use tokio::io::AsyncReadExt;
use tokio::signal;
use tokio::time::sleep;
use tracing::{info, warn};

use super::cli::Cli;
use super::replay;
use super::surface::{LogFeed, LogSurface, NoAssets, NoSignals, StaticSettings};

const DEFAULT_CONFIG: &str = "headsup.toml";

pub async fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.log_filter.as_deref(), LogFormat::from_json_flag(cli.json_logs))?;

    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let mut config = Config::from_env_and_file(&config_path)?;
    if let Some(decay) = cli.decay_time {
        config.overlay.decay_time = decay;
    }
    if !(cli.speed.is_finite() && cli.speed > 0.0) {
        return Err(Error::from(ConfigError::InvalidField {
            field: "cli.speed",
            message: "value must be a positive number".to_string(),
        }));
    }

    let steps = replay::parse(&read_script(cli.script).await?)?;
    info!(steps = steps.len(), "script loaded");

    let parts = Collaborators {
        feed: Arc::new(LogFeed),
        signals: Arc::new(NoSignals),
        settings: Arc::new(StaticSettings(config.overlay.clone())),
        surfaces: Box::new(|| -> Box<dyn Surface> { Box::new(LogSurface::default()) }),
        assets: Arc::new(NoAssets),
        clock: Arc::new(MonotonicClock::new()),
    };
    let (engine, handle) = Engine::new(&config, parts);
    let engine_task = tokio::spawn(engine.run());
    handle.start()?;

    let drain = drain_time(config.overlay.decay_time);
    let played = tokio::select! {
        biased;
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, stopping replay");
            Ok(())
        }
        res = async {
            replay::play(steps, &handle, cli.speed).await?;
            sleep(drain).await;
            Ok::<(), Error>(())
        } => res,
    };

    if handle.shutdown().is_err() {
        info!("engine already stopped");
    }
    match engine_task.await {
        Ok(res) => res?,
        Err(err) => warn!(error = %err, "engine task terminated unexpectedly"),
    }
    played
}

async fn read_script(path: Option<PathBuf>) -> Result<String> {
    let Some(path) = path else {
        let mut text = String::new();
        tokio::io::stdin()
            .read_to_string(&mut text)
            .await
            .map_err(|source| ConfigError::FileRead {
                path: PathBuf::from("<stdin>"),
                source,
            })?;
        return Ok(text);
    };
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| Error::from(ConfigError::FileRead { path, source }))
}

/// Assez long pour que l'entrée la plus lente expire et que la sortie se termine.
fn drain_time(decay: Duration) -> Duration {
    if decay.is_zero() {
        return LAYOUT_ANIMATION_TIME;
    }
    decay + PRIORITY_BONUS * 2 + NON_DISMISSIBLE_BONUS + LAYOUT_ANIMATION_TIME * 2
}
