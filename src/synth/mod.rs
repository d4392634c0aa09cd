//! Synthesis orchestrator: drives the external `piper` process.
//!
//! [`SynthEngine`] is the seam the pipeline talks to. It is object-safe and
//! `Send + Sync` so it can be held behind an `Arc<dyn SynthEngine>`.
//!
//! [`PiperEngine`] is the production implementation: it launches `piper`
//! with the model and length-scale from the request, feeds the sanitized
//! text on stdin, and collects the raw PCM from stdout while a background
//! task drains stderr into the log.
//!
//! `MockSynthEngine` (under `#[cfg(test)]`) records invocations and returns
//! canned audio so pipeline tests need no piper binary.

pub mod piper;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AppConfig;
use crate::playback::AudioBuffer;

pub use piper::PiperEngine;

// ---------------------------------------------------------------------------
// SynthesisRequest
// ---------------------------------------------------------------------------

/// One synthesis job, constructed fresh per pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    /// Voice model file name, passed via `--model`.
    pub model: String,
    /// Length-scale (always finite and positive), passed via
    /// `--length-scale`.
    pub speed: f32,
    /// Sanitized, newline-delimited UTF-8 text.
    pub text: String,
}

impl SynthesisRequest {
    pub fn new(config: &AppConfig, text: String) -> Self {
        Self {
            model: config.model.clone(),
            speed: config.speed,
            text,
        }
    }
}

// ---------------------------------------------------------------------------
// SynthError
// ---------------------------------------------------------------------------

/// All errors that can arise from the synthesis subsystem.
#[derive(Debug, Clone, Error)]
pub enum SynthError {
    /// The engine process could not be launched.
    #[error("failed to launch synthesis engine: {0}")]
    Spawn(String),

    /// Writing the text to the engine's stdin failed.
    #[error("failed to feed text to synthesis engine: {0}")]
    Stdin(String),

    /// Reading the audio from the engine's stdout failed.
    #[error("failed to read audio from synthesis engine: {0}")]
    Stdout(String),

    /// The engine exited without producing any audio bytes.
    #[error("no audio data received from synthesis engine")]
    EmptyAudio,
}

// ---------------------------------------------------------------------------
// SynthEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech synthesis engines.
///
/// # Contract
///
/// - Empty request text is a no-op: no process is spawned and an empty
///   buffer is returned (callers short-circuit before synthesis anyway).
/// - A successful result is raw PCM in the fixed playback format
///   (22050 Hz, 16-bit signed LE, mono).
/// - An empty output stream yields [`SynthError::EmptyAudio`].
#[async_trait]
pub trait SynthEngine: Send + Sync {
    /// Synthesize `request.text` into an audio buffer.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<AudioBuffer, SynthError>;
}

// Compile-time assertion: Box<dyn SynthEngine> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SynthEngine>) {}
};

// ---------------------------------------------------------------------------
// MockSynthEngine
// ---------------------------------------------------------------------------

#[cfg(test)]
pub use mock::MockSynthEngine;
