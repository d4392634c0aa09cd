//! Clipboard monitor — polls the clipboard and drives the pipeline.
//!
//! # Re-entrancy
//!
//! The monitor ticks once per second. A tick observed while a pipeline run
//! is in flight produces no action at all: the clipboard is not even read,
//! so the dropped text is never queued and novelty tracking is only ever
//! updated by the value that *starts* a run. The guard is a single atomic
//! busy flag, set before the run's first step and cleared by a drop guard
//! on every exit path of the spawned task (panics included).
//!
//! # Control channel
//!
//! The run loop multiplexes the poll interval with [`ControlEvent`]s. The
//! global hotkey and any menu collaborator push the same
//! [`ControlEvent::StopPlayback`], so the playback controller only ever
//! sees one unified stop signal.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::notify::Notifier;
use crate::pipeline::PipelineRunner;
use crate::playback::PlaybackController;

/// How often the clipboard is sampled.
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// ControlEvent
// ---------------------------------------------------------------------------

/// Events injected into the monitor loop by external collaborators
/// (global hotkey, tray menu, signal handler).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Halt the active playback, if any.
    StopPlayback,
    /// Toggle clipboard monitoring on/off without resetting novelty
    /// tracking.
    ToggleMonitoring,
    /// Leave the run loop.
    Shutdown,
}

// ---------------------------------------------------------------------------
// ClipboardSource
// ---------------------------------------------------------------------------

/// Errors reading the clipboard. Always recoverable: the monitor treats
/// them as "no text this tick" and retries on the next one.
#[derive(Debug, Clone, Error)]
pub enum ClipboardError {
    #[error("clipboard access failed: {0}")]
    Access(String),
}

/// Abstraction over the system clipboard so the monitor can be tested
/// without one.
pub trait ClipboardSource: Send {
    /// Current clipboard text; `None` when empty or non-text.
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError>;
}

/// Production source backed by `arboard`.
///
/// A short-lived `arboard::Clipboard` is created per read rather than held
/// across calls, because the handle is not `Send` on all platforms and is
/// cheap to create.
#[derive(Debug, Default)]
pub struct ArboardSource;

impl ArboardSource {
    pub fn new() -> Self {
        Self
    }
}

impl ClipboardSource for ArboardSource {
    fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ClipboardError::Access(e.to_string()))?;
        // get_text errors when the clipboard is empty or holds non-text
        // data — both are "nothing to speak", not failures.
        Ok(clipboard.get_text().ok().filter(|text| !text.is_empty()))
    }
}

// ---------------------------------------------------------------------------
// BusyGuard
// ---------------------------------------------------------------------------

/// Clears the busy flag when dropped, so no exit path of a pipeline run —
/// including a panic — can leave the monitor wedged.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ---------------------------------------------------------------------------
// ClipboardMonitor
// ---------------------------------------------------------------------------

/// Polls the clipboard and triggers pipeline runs.
pub struct ClipboardMonitor<S: ClipboardSource> {
    source: S,
    runner: Arc<PipelineRunner>,
    playback: Arc<PlaybackController>,
    notifier: Notifier,
    busy: Arc<AtomicBool>,
    /// The last clipboard value that started a run. Text dropped while
    /// busy is deliberately not recorded here.
    last_spoken: Option<String>,
    monitoring: bool,
}

impl<S: ClipboardSource> ClipboardMonitor<S> {
    pub fn new(
        source: S,
        runner: Arc<PipelineRunner>,
        playback: Arc<PlaybackController>,
        notifier: Notifier,
    ) -> Self {
        Self {
            source,
            runner,
            playback,
            notifier,
            busy: Arc::new(AtomicBool::new(false)),
            last_spoken: None,
            monitoring: false,
        }
    }

    /// Enable polling and announce the transition. Novelty tracking is
    /// preserved across stop/start cycles.
    pub fn start(&mut self) {
        if !self.monitoring {
            self.monitoring = true;
            log::info!("clipboard monitoring started");
            self.notifier
                .info("Piper Tray", "Clipboard monitoring started");
        }
    }

    /// Disable polling and announce the transition.
    pub fn stop(&mut self) {
        if self.monitoring {
            self.monitoring = false;
            log::info!("clipboard monitoring stopped");
            self.notifier
                .info("Piper Tray", "Clipboard monitoring stopped");
        }
    }

    fn toggle(&mut self) {
        if self.monitoring {
            self.stop();
        } else {
            self.start();
        }
    }

    /// One poll tick. Returns the text that should start a run, if any.
    ///
    /// While a run is in flight this returns `None` without touching the
    /// clipboard — drop, not queue.
    fn poll_tick(&mut self) -> Option<String> {
        if !self.monitoring || self.busy.load(Ordering::SeqCst) {
            return None;
        }

        let text = match self.source.read_text() {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                // Another process may hold the clipboard; retry next tick.
                log::debug!("clipboard read failed, retrying next tick: {e}");
                return None;
            }
        };

        if self.last_spoken.as_deref() == Some(text.as_str()) {
            return None;
        }

        self.last_spoken = Some(text.clone());
        Some(text)
    }

    /// Mark the monitor busy and run the pipeline on a spawned task.
    ///
    /// The busy flag is set before the task starts and cleared by a drop
    /// guard, so no error or panic inside the run can leave it stuck.
    fn spawn_run(&self, text: String) {
        self.busy.store(true, Ordering::SeqCst);
        let guard = BusyGuard(Arc::clone(&self.busy));
        let runner = Arc::clone(&self.runner);

        tokio::spawn(async move {
            let _guard = guard;
            runner.run(&text).await;
        });
    }

    /// Run until a `Shutdown` event arrives or the control channel closes.
    pub async fn run(mut self, mut control_rx: mpsc::Receiver<ControlEvent>) {
        self.start();

        let mut ticks = tokio::time::interval(POLL_INTERVAL);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    if let Some(text) = self.poll_tick() {
                        self.spawn_run(text);
                    }
                }
                event = control_rx.recv() => match event {
                    Some(ControlEvent::StopPlayback) => self.playback.stop(),
                    Some(ControlEvent::ToggleMonitoring) => self.toggle(),
                    Some(ControlEvent::Shutdown) | None => break,
                }
            }
        }

        self.playback.stop();
        log::info!("clipboard monitor shut down");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, AppPaths};
    use crate::playback::mock::MockOutput;
    use crate::playback::AudioOutput;
    use crate::synth::{MockSynthEngine, SynthEngine};
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::tempdir;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Scripted clipboard: yields queued results, then repeats the last one.
    struct FakeClipboard {
        queue: Arc<Mutex<VecDeque<Result<Option<String>, ClipboardError>>>>,
        current: Result<Option<String>, ClipboardError>,
    }

    impl FakeClipboard {
        fn new() -> (Self, Arc<Mutex<VecDeque<Result<Option<String>, ClipboardError>>>>) {
            let queue = Arc::new(Mutex::new(VecDeque::new()));
            (
                Self {
                    queue: Arc::clone(&queue),
                    current: Ok(None),
                },
                queue,
            )
        }
    }

    impl ClipboardSource for FakeClipboard {
        fn read_text(&mut self) -> Result<Option<String>, ClipboardError> {
            if let Some(next) = self.queue.lock().unwrap().pop_front() {
                self.current = next;
            }
            self.current.clone()
        }
    }

    fn push(
        queue: &Arc<Mutex<VecDeque<Result<Option<String>, ClipboardError>>>>,
        entry: Result<Option<String>, ClipboardError>,
    ) {
        queue.lock().unwrap().push_back(entry);
    }

    struct Fixture {
        monitor: ClipboardMonitor<FakeClipboard>,
        queue: Arc<Mutex<VecDeque<Result<Option<String>, ClipboardError>>>>,
        synth: Arc<MockSynthEngine>,
        _dir: tempfile::TempDir,
    }

    fn fixture(synth: MockSynthEngine) -> Fixture {
        let dir = tempdir().expect("temp dir");
        let synth = Arc::new(synth);
        let output = Arc::new(MockOutput::auto_completing());
        let playback = Arc::new(PlaybackController::new(
            Arc::clone(&output) as Arc<dyn AudioOutput>
        ));
        let runner = Arc::new(PipelineRunner::new(
            AppConfig::default(),
            AppPaths::for_dir(dir.path()),
            Arc::clone(&synth) as Arc<dyn SynthEngine>,
            Arc::clone(&playback),
            Notifier::new(false),
        ));

        let (source, queue) = FakeClipboard::new();
        let mut monitor = ClipboardMonitor::new(source, runner, playback, Notifier::new(false));
        monitor.start();

        Fixture {
            monitor,
            queue,
            synth,
            _dir: dir,
        }
    }

    async fn wait_until_idle(monitor: &ClipboardMonitor<FakeClipboard>) {
        while monitor.busy.load(Ordering::SeqCst) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // -----------------------------------------------------------------------
    // poll_tick decision logic
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn new_text_triggers_exactly_once() {
        let mut fx = fixture(MockSynthEngine::ok(&[1, 2]));
        push(&fx.queue, Ok(Some("hello".into())));

        assert_eq!(fx.monitor.poll_tick(), Some("hello".into()));
        // Same clipboard content on the next tick: no re-trigger.
        assert_eq!(fx.monitor.poll_tick(), None);
    }

    #[tokio::test]
    async fn empty_clipboard_produces_no_action() {
        let mut fx = fixture(MockSynthEngine::ok(&[1, 2]));
        assert_eq!(fx.monitor.poll_tick(), None);
    }

    #[tokio::test]
    async fn read_errors_are_retried_next_tick() {
        let mut fx = fixture(MockSynthEngine::ok(&[1, 2]));
        push(&fx.queue, Err(ClipboardError::Access("held elsewhere".into())));
        push(&fx.queue, Ok(Some("recovered".into())));

        assert_eq!(fx.monitor.poll_tick(), None);
        assert_eq!(fx.monitor.poll_tick(), Some("recovered".into()));
    }

    #[tokio::test]
    async fn stopped_monitor_ignores_ticks_but_keeps_novelty() {
        let mut fx = fixture(MockSynthEngine::ok(&[1, 2]));
        push(&fx.queue, Ok(Some("before".into())));
        assert_eq!(fx.monitor.poll_tick(), Some("before".into()));

        fx.monitor.stop();
        assert_eq!(fx.monitor.poll_tick(), None);

        // Restarting does not reset the last-spoken value: the same text
        // still on the clipboard does not re-trigger.
        fx.monitor.start();
        assert_eq!(fx.monitor.poll_tick(), None);
        push(&fx.queue, Ok(Some("after".into())));
        assert_eq!(fx.monitor.poll_tick(), Some("after".into()));
    }

    // -----------------------------------------------------------------------
    // Busy guard
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn ticks_while_busy_are_dropped_not_queued() {
        let mut fx = fixture(
            MockSynthEngine::ok(&[1, 2]).with_delay(Duration::from_millis(50)),
        );

        push(&fx.queue, Ok(Some("first".into())));
        let text = fx.monitor.poll_tick().expect("first change triggers");
        fx.monitor.spawn_run(text);

        // Two ticks arrive while the run is still in flight: both dropped.
        push(&fx.queue, Ok(Some("second".into())));
        assert_eq!(fx.monitor.poll_tick(), None);
        assert_eq!(fx.monitor.poll_tick(), None);

        wait_until_idle(&fx.monitor).await;
        assert_eq!(fx.synth.call_count(), 1);
        assert_eq!(
            fx.synth.last_request().expect("one request").text,
            "first"
        );

        // The dropped text was never recorded: if it is still on the
        // clipboard at the next idle tick it is re-evaluated as novel.
        assert_eq!(fx.monitor.poll_tick(), Some("second".into()));
    }

    #[tokio::test]
    async fn busy_flag_clears_after_a_failed_run() {
        let mut fx = fixture(MockSynthEngine::failing(
            crate::synth::SynthError::Spawn("boom".into()),
        ));

        push(&fx.queue, Ok(Some("text".into())));
        let text = fx.monitor.poll_tick().expect("change triggers");
        fx.monitor.spawn_run(text);

        wait_until_idle(&fx.monitor).await;
        assert!(!fx.monitor.busy.load(Ordering::SeqCst));
        assert_eq!(fx.synth.call_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Run loop
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn shutdown_event_ends_the_run_loop() {
        let fx = fixture(MockSynthEngine::ok(&[1, 2]));
        let (tx, rx) = mpsc::channel(4);

        tx.send(ControlEvent::Shutdown).await.expect("send");
        // run() must return promptly instead of polling forever.
        fx.monitor.run(rx).await;
    }

    #[tokio::test]
    async fn closed_control_channel_ends_the_run_loop() {
        let fx = fixture(MockSynthEngine::ok(&[1, 2]));
        let (tx, rx) = mpsc::channel::<ControlEvent>(4);
        drop(tx);

        fx.monitor.run(rx).await;
    }

    #[tokio::test(start_paused = true)]
    async fn loop_speaks_a_change_then_shuts_down() {
        let fx = fixture(MockSynthEngine::ok(&[1, 2]));
        push(&fx.queue, Ok(Some("spoken by the loop".into())));

        let (tx, rx) = mpsc::channel(4);
        let synth = Arc::clone(&fx.synth);

        let loop_task = tokio::spawn(fx.monitor.run(rx));

        // Give the loop a few ticks to pick up the change and finish.
        tokio::time::sleep(Duration::from_secs(3)).await;
        tx.send(ControlEvent::Shutdown).await.expect("send");
        loop_task.await.expect("join");

        assert_eq!(synth.call_count(), 1);
        assert_eq!(
            synth.last_request().expect("one request").text,
            "spoken by the loop"
        );
    }
}
