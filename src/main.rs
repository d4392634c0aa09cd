//! Application entry point — Piper Tray.
//!
//! # Startup sequence
//!
//! 1. Load [`AppConfig`] from `settings.conf` (defaults on first run).
//! 2. Initialise logging (stderr, plus the log file when enabled).
//! 3. Verify the `piper` binary exists — its absence is fatal.
//! 4. Open the audio output thread and build the synthesis engine.
//! 5. Spawn the hotkey listener thread and the ctrl-c handler.
//! 6. Run the clipboard monitor loop until shutdown.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;

use piper_tray::{
    config::{AppConfig, AppPaths},
    hotkey::HotkeyListener,
    logging,
    monitor::{ArboardSource, ClipboardMonitor, ControlEvent},
    notify::Notifier,
    pipeline::PipelineRunner,
    playback::{rodio_out::RodioOutput, PlaybackController},
    synth::PiperEngine,
};

fn main() -> anyhow::Result<()> {
    // 1. Configuration
    let paths = AppPaths::new();
    let config = AppConfig::load(&paths);

    // 2. Logging
    logging::init(config.logging, &paths.log_file);
    log::info!(
        "piper-tray starting (model={}, speed={}, logging={})",
        config.model,
        config.speed,
        config.logging
    );

    let notifier = Notifier::new(true);

    // 3. Fatal startup check: the synthesis binary must exist.
    let Some(piper) = paths.piper_binary() else {
        let message = format!(
            "piper binary not found next to the executable or in {}",
            paths.config_dir.display()
        );
        log::error!("{message}");
        notifier.error("Piper Tray", &message);
        anyhow::bail!(message);
    };
    log::info!("piper executable found at {}", piper.display());

    // 4. Runtime (monitor loop + pipeline runs + subprocess I/O)
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(run(config, paths, piper, notifier));
    Ok(())
}

async fn run(
    config: AppConfig,
    paths: AppPaths,
    piper: std::path::PathBuf,
    notifier: Notifier,
) {
    // Audio output and synthesis engine
    let output = Arc::new(RodioOutput::spawn());
    let playback = Arc::new(PlaybackController::new(output));
    let synth = Arc::new(PiperEngine::new(piper));

    let runner = Arc::new(PipelineRunner::new(
        config,
        paths,
        synth,
        Arc::clone(&playback),
        notifier.clone(),
    ));

    // Control channel: hotkey, signal handler (and a future tray menu)
    // all push the same events.
    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>(16);

    let _hotkey = HotkeyListener::start(control_tx.clone());

    let signal_tx = control_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("ctrl-c received, shutting down");
            let _ = signal_tx.send(ControlEvent::Shutdown).await;
        }
    });

    let monitor = ClipboardMonitor::new(ArboardSource::new(), runner, playback, notifier);
    monitor.run(control_rx).await;

    log::info!("piper-tray exiting");
}
