//! Playback controller: streams a raw PCM buffer to the output device with
//! prompt, cooperative cancellation.
//!
//! # Architecture
//!
//! [`AudioOutput`] abstracts the device; the production implementation is
//! [`RodioOutput`](rodio_out::RodioOutput). Starting a playback yields a
//! [`PlaybackHandle`] that reports completion and can be halted.
//!
//! [`PlaybackController::play`] waits for completion by polling the handle
//! every [`POLL_INTERVAL`] instead of blocking, so a [`stop`] from the
//! hotkey or menu is observed within one interval. Exactly one playback is
//! active at a time; the controller keeps the handle in a single slot and
//! clears it when playback ends either way, so stale handles are never
//! acted upon.
//!
//! # State machine
//!
//! ```text
//! NotStarted ──play──▶ Playing ──sink drained──▶ Completed
//!                         └──────stop()────────▶ Stopped
//! ```
//!
//! `Stopped` and `Completed` both release the device and are equivalent to
//! the pipeline; only the log line differs.
//!
//! [`stop`]: PlaybackController::stop

pub mod rodio_out;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;

/// Sample rate of the PCM the synthesis engine produces.
pub const SAMPLE_RATE: u32 = 22050;
/// The engine produces mono audio.
pub const CHANNELS: u16 = 1;
/// How often the controller re-checks the active handle while playing.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// AudioBuffer
// ---------------------------------------------------------------------------

/// Raw linear PCM as produced by the synthesis engine: 22050 Hz, 16-bit
/// signed little-endian, mono.
///
/// Ownership transfers from the synthesis orchestrator to the playback
/// controller; the buffer is discarded after playback ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioBuffer {
    bytes: Vec<u8>,
}

impl AudioBuffer {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Playback length in seconds at the fixed format.
    pub fn duration_secs(&self) -> f32 {
        (self.bytes.len() / 2) as f32 / SAMPLE_RATE as f32
    }

    /// Decode the little-endian i16 frames into f32 samples in `[-1.0, 1.0)`
    /// for the mixer. A trailing odd byte is dropped.
    pub fn into_samples(self) -> Vec<f32> {
        self.bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// PlaybackState / PlaybackError
// ---------------------------------------------------------------------------

/// States of a playback. `Stopped` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No playback has been started yet.
    NotStarted,
    /// Audio is streaming to the output device.
    Playing,
    /// The user stopped playback before the buffer drained.
    Stopped,
    /// The buffer drained naturally.
    Completed,
}

impl PlaybackState {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::NotStarted => "not started",
            PlaybackState::Playing => "playing",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Completed => "completed",
        }
    }
}

/// Errors from the playback subsystem.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// The output device could not be opened or the output thread is gone.
    #[error("audio output failed: {0}")]
    Output(String),
}

// ---------------------------------------------------------------------------
// AudioOutput / PlaybackHandle traits
// ---------------------------------------------------------------------------

/// Handle to one in-flight playback.
pub trait PlaybackHandle: Send + Sync {
    /// `true` once the audio has drained or the handle was halted.
    fn is_done(&self) -> bool;
    /// Halt output immediately and release the device. Idempotent.
    fn halt(&self);
}

/// Object-safe, thread-safe audio device abstraction.
pub trait AudioOutput: Send + Sync {
    /// Begin playing `audio`, returning a handle to poll and halt it.
    fn start(&self, audio: AudioBuffer) -> Result<Arc<dyn PlaybackHandle>, PlaybackError>;
}

// ---------------------------------------------------------------------------
// PlaybackController
// ---------------------------------------------------------------------------

/// Owns the single active playback slot and the stop semantics.
pub struct PlaybackController {
    output: Arc<dyn AudioOutput>,
    /// The currently active handle. Single-writer ([`play`]); the stop
    /// handler only ever takes it.
    ///
    /// [`play`]: Self::play
    active: Mutex<Option<Arc<dyn PlaybackHandle>>>,
    stop_requested: AtomicBool,
    state: Mutex<PlaybackState>,
}

impl PlaybackController {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            active: Mutex::new(None),
            stop_requested: AtomicBool::new(false),
            state: Mutex::new(PlaybackState::NotStarted),
        }
    }

    /// Play `audio` to completion or until stopped.
    ///
    /// Returns the terminal state reached. Cancellation is cooperative: the
    /// handle is polled every [`POLL_INTERVAL`], so a concurrent [`stop`]
    /// takes effect within one interval.
    ///
    /// The pipeline's busy flag guarantees at most one caller at a time.
    ///
    /// [`stop`]: Self::stop
    pub async fn play(&self, audio: AudioBuffer) -> Result<PlaybackState, PlaybackError> {
        self.stop_requested.store(false, Ordering::SeqCst);

        let handle = self.output.start(audio)?;
        {
            let mut active = self.active.lock().unwrap();
            debug_assert!(active.is_none(), "overlapping playback");
            *active = Some(Arc::clone(&handle));
        }
        *self.state.lock().unwrap() = PlaybackState::Playing;
        log::debug!("playback started");

        while !handle.is_done() {
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let outcome = if self.stop_requested.swap(false, Ordering::SeqCst) {
            PlaybackState::Stopped
        } else {
            PlaybackState::Completed
        };

        *self.active.lock().unwrap() = None;
        *self.state.lock().unwrap() = outcome;
        Ok(outcome)
    }

    /// Halt the active playback, if any.
    ///
    /// Safe to call from any thread and a no-op when nothing is playing or
    /// the previous playback already ended — a stale handle is never acted
    /// upon because the slot is cleared when playback ends.
    pub fn stop(&self) {
        let handle = self.active.lock().unwrap().take();
        if let Some(handle) = handle {
            self.stop_requested.store(true, Ordering::SeqCst);
            handle.halt();
            log::info!("audio playback stopped by user");
        } else {
            log::debug!("stop requested but nothing is playing");
        }
    }

    pub fn is_playing(&self) -> bool {
        self.active.lock().unwrap().is_some()
    }

    pub fn state(&self) -> PlaybackState {
        *self.state.lock().unwrap()
    }
}

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::mock::MockOutput;
    use super::*;

    fn controller(output: Arc<MockOutput>) -> PlaybackController {
        PlaybackController::new(output)
    }

    fn buffer(len: usize) -> AudioBuffer {
        AudioBuffer::from_bytes(vec![0u8; len])
    }

    #[test]
    fn samples_decode_little_endian_i16() {
        let buf = AudioBuffer::from_bytes(vec![0x00, 0x00, 0x00, 0x80, 0xff, 0x7f]);
        let samples = buf.into_samples();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], 0.0);
        assert_eq!(samples[1], -1.0);
        assert!((samples[2] - 32767.0 / 32768.0).abs() < f32::EPSILON);
    }

    #[test]
    fn trailing_odd_byte_is_dropped() {
        let buf = AudioBuffer::from_bytes(vec![0, 0, 7]);
        assert_eq!(buf.into_samples().len(), 1);
    }

    #[test]
    fn duration_reflects_the_fixed_format() {
        // One second: 22050 frames * 2 bytes.
        let buf = buffer(44100);
        assert!((buf.duration_secs() - 1.0).abs() < 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn natural_completion_reaches_completed() {
        let output = Arc::new(MockOutput::auto_completing());
        let controller = controller(Arc::clone(&output));

        let outcome = controller.play(buffer(4)).await.expect("play");
        assert_eq!(outcome, PlaybackState::Completed);
        assert_eq!(controller.state(), PlaybackState::Completed);
        assert!(!controller.is_playing());
        assert_eq!(output.started_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_playback_reaches_stopped_within_one_poll() {
        let output = Arc::new(MockOutput::default());
        let controller = Arc::new(controller(Arc::clone(&output)));

        let player = Arc::clone(&controller);
        let play_task = tokio::spawn(async move { player.play(buffer(4)).await });

        // Let play() store its handle and enter the poll loop.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(controller.is_playing());

        controller.stop();
        let handle = output.last_handle().expect("a playback was started");
        assert!(handle.was_halted());

        let outcome = play_task.await.expect("join").expect("play");
        assert_eq!(outcome, PlaybackState::Stopped);
        assert!(!controller.is_playing());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_when_idle_is_a_no_op() {
        let output = Arc::new(MockOutput::default());
        let controller = controller(Arc::clone(&output));

        controller.stop();
        assert_eq!(controller.state(), PlaybackState::NotStarted);

        // And again after a completed playback: the stale handle must not
        // resurrect a Stopped outcome for the next run.
        let output2 = Arc::new(MockOutput::auto_completing());
        let controller2 = PlaybackController::new(Arc::clone(&output2) as Arc<dyn AudioOutput>);
        let outcome = controller2.play(buffer(2)).await.expect("play");
        assert_eq!(outcome, PlaybackState::Completed);
        controller2.stop();
        assert_eq!(controller2.state(), PlaybackState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn second_play_after_stop_completes_normally() {
        let output = Arc::new(MockOutput::default());
        let controller = Arc::new(controller(Arc::clone(&output)));

        let player = Arc::clone(&controller);
        let first = tokio::spawn(async move { player.play(buffer(4)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.stop();
        assert_eq!(
            first.await.expect("join").expect("play"),
            PlaybackState::Stopped
        );

        // A fresh playback is unaffected by the earlier stop request.
        let player = Arc::clone(&controller);
        let second = tokio::spawn(async move { player.play(buffer(4)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        output.last_handle().expect("second playback").finish();
        assert_eq!(
            second.await.expect("join").expect("play"),
            PlaybackState::Completed
        );
    }
}
