//! Pipeline runner — drives one Sanitize → Synthesize → Play execution.
//!
//! # Pipeline flow
//!
//! ```text
//! run(clipboard text)
//!   ├─ load dictionaries (re-read from disk every run)
//!   ├─ sanitize            — empty result → logged no-op, run ends
//!   ├─ synthesize          — empty audio  → logged error, no playback
//!   └─ play                — completes or is stopped by the user
//! ```
//!
//! Every failure path is logged and ends the run early; the system returns
//! to idle and keeps polling. Unexpected failures (spawn/IO/playback) are
//! additionally surfaced once through the notifier. The caller owns the
//! busy flag and clears it on every exit path, so nothing here may block
//! forever.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{AppConfig, AppPaths};
use crate::dict::Dictionaries;
use crate::notify::Notifier;
use crate::playback::{PlaybackController, PlaybackError};
use crate::sanitize::sanitize;
use crate::synth::{SynthEngine, SynthError, SynthesisRequest};

// ---------------------------------------------------------------------------
// PipelineError
// ---------------------------------------------------------------------------

/// Errors that can surface inside a pipeline run.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Synth(#[from] SynthError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl PipelineError {
    /// Whether this failure warrants a user-visible notification.
    ///
    /// An empty audio result is an expected per-run condition (logged
    /// only); everything else means something in the environment broke.
    fn notifies_user(&self) -> bool {
        !matches!(self, PipelineError::Synth(SynthError::EmptyAudio))
    }
}

// ---------------------------------------------------------------------------
// PipelineRunner
// ---------------------------------------------------------------------------

/// Executes pipeline runs. Cheap to share behind an `Arc`.
pub struct PipelineRunner {
    config: AppConfig,
    paths: AppPaths,
    synth: Arc<dyn SynthEngine>,
    playback: Arc<PlaybackController>,
    notifier: Notifier,
}

impl PipelineRunner {
    pub fn new(
        config: AppConfig,
        paths: AppPaths,
        synth: Arc<dyn SynthEngine>,
        playback: Arc<PlaybackController>,
        notifier: Notifier,
    ) -> Self {
        Self {
            config,
            paths,
            synth,
            playback,
            notifier,
        }
    }

    /// Run the pipeline once for `text`.
    ///
    /// Never panics and never returns an error: all failures are handled
    /// at this boundary so the monitor's drop guard is the only cleanup
    /// the caller needs.
    pub async fn run(&self, text: &str) {
        log::debug!("pipeline: run starting ({} chars)", text.chars().count());

        if let Err(e) = self.run_inner(text).await {
            log::error!("pipeline run failed: {e}");
            if e.notifies_user() {
                self.notifier.error("Piper Tray", &e.to_string());
            }
        }
    }

    async fn run_inner(&self, text: &str) -> Result<(), PipelineError> {
        // ── 1. Sanitize ──────────────────────────────────────────────────
        let dicts = Dictionaries::load(&self.paths);
        let sanitized = sanitize(text, &dicts);

        if sanitized.is_empty() {
            log::info!("pipeline: nothing to synthesize after sanitization");
            return Ok(());
        }

        // ── 2. Synthesize ────────────────────────────────────────────────
        let request = SynthesisRequest::new(&self.config, sanitized);
        let audio = self.synth.synthesize(&request).await?;

        if audio.is_empty() {
            return Err(SynthError::EmptyAudio.into());
        }

        log::info!(
            "pipeline: {} bytes of audio ({:.1}s)",
            audio.len(),
            audio.duration_secs()
        );

        // ── 3. Play ──────────────────────────────────────────────────────
        let outcome = self.playback.play(audio).await?;
        log::info!("pipeline: playback {}", outcome.label());

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
