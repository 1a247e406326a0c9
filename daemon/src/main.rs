mod audio;
mod condition;
mod config;
mod detector;
mod event;
mod monitor;
mod paths;
mod player;
mod proxy_flag;
mod speech;
mod startup;
mod status;
mod tun_adapter;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::condition::{ConditionId, ConditionSource};
use crate::config::{ConfigStore, FileConfigStore, SharedConfig};
use crate::detector::Direction;
use crate::monitor::{Monitor, Sources};
use crate::player::NotificationPlayer;

#[derive(Parser, Debug)]
#[command(name = "proxymon", version)]
#[command(about = "Announces when the system proxy or a TUN adapter turns on or off")]
struct Args {
    /// Start without the startup banner (used by the autostart entry)
    #[arg(long)]
    silent: bool,

    /// Config file to use instead of the per-user default
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Remove the autostart registration and exit
    #[arg(long)]
    unregister_startup: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play one notification with the current settings and exit
    Test {
        /// `proxy` or `tun`
        condition: ConditionId,
        #[arg(value_enum)]
        state: TestState,
    },
    /// List the installed speech voices
    Voices,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum TestState {
    On,
    Off,
}

impl From<TestState> for Direction {
    fn from(state: TestState) -> Self {
        match state {
            TestState::On => Direction::BecameActive,
            TestState::Off => Direction::BecameInactive,
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
            .parse_lossy("proxymon=debug")
    });
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    if args.unregister_startup {
        return startup::unregister_startup();
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = args.config.unwrap_or_else(paths::config_file_path);
    // The watcher compares against the absolute paths notify reports.
    let config_path = std::path::absolute(&config_path)
        .with_context(|| format!("Invalid config path: {}", config_path.display()))?;
    let store = FileConfigStore::new(&config_path);
    let initial_config = store.load();

    let player = Arc::new(NotificationPlayer::new(
        Arc::new(audio::ClipSink),
        Arc::new(speech::SapiSpeech),
    ));

    // ── One-shot commands ─────────────────────────────────────────────────────
    match args.command {
        Some(Command::Voices) => {
            let voices = player.voices().context("Failed to list voices")?;
            for voice in voices {
                println!("{voice}");
            }
            return Ok(());
        }
        Some(Command::Test { condition, state }) => {
            let direction = Direction::from(state);
            let outcome = tokio::task::spawn_blocking(move || {
                player.preview(condition, direction, &initial_config)
            })
            .await
            .context("Test playback task failed")?;
            println!("{condition} {state:?}: {outcome:?}");
            return Ok(());
        }
        None => {}
    }

    // Give the settings window a file to edit on first run.
    if !store.path().exists() {
        if let Err(e) = store.save(&initial_config) {
            warn!("Failed to write default config: {e:#}");
        }
    }
    if let Err(e) = startup::sync_startup(initial_config.run_on_startup) {
        warn!("Failed to update startup registration: {e:#}");
    }

    // ── Monitor ───────────────────────────────────────────────────────────────
    let mut run_on_startup = initial_config.run_on_startup;
    let shared_config = SharedConfig::new(initial_config);

    let mut sources = Sources::new();
    sources.insert(
        ConditionId::Proxy,
        Box::new(proxy_flag::ProxyFlagSource) as Box<dyn ConditionSource>,
    );
    sources.insert(ConditionId::Tun, Box::new(tun_adapter::TunAdapterSource));

    let mut monitor = Monitor::new(shared_config.clone(), sources, player)
        .context("Failed to start monitoring")?
        .with_status_file(config_path.with_file_name(paths::STATUS_FILE_NAME));
    monitor.start().await;

    let (event_tx, mut event_rx) = mpsc::channel::<event::DaemonEvent>(16);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path.clone(), event_tx.clone()));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(event::DaemonEvent::Shutdown).await;
            }
        });
    }

    if !args.silent {
        println!("proxymon v{} started (config: {})", env!("CARGO_PKG_VERSION"), config_path.display());
    }
    info!(config = %config_path.display(), "Daemon started");

    // ── Event loop ────────────────────────────────────────────────────────────
    while let Some(evt) = event_rx.recv().await {
        match evt {
            event::DaemonEvent::ConfigReloaded(new_config) => {
                info!("Config reloaded");
                if let Err(e) = new_config.validate() {
                    warn!("Reloaded config is inconsistent: {e}");
                }
                if new_config.run_on_startup != run_on_startup {
                    run_on_startup = new_config.run_on_startup;
                    if let Err(e) = startup::sync_startup(run_on_startup) {
                        warn!("Failed to update startup registration: {e:#}");
                    }
                }
                shared_config.replace(new_config);
                // Saving settings always leaves monitoring running.
                monitor.start().await;
            }

            event::DaemonEvent::Shutdown => {
                info!("Shutting down");
                monitor.shutdown().await;
                break;
            }
        }
    }

    Ok(())
}
