//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` has no graceful shutdown API. Dropping the
//! [`HotkeyListener`] sets a stop flag so the callback silently discards
//! further events; the OS thread itself remains blocked in the rdev event
//! loop until the process exits, which is safe — rdev holds no resources
//! that need explicit cleanup.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use crate::monitor::ControlEvent;

use super::STOP_KEY;

/// Handle to a running hotkey listener thread.
///
/// Construct one with [`HotkeyListener::start`]. Drop it to stop
/// forwarding events.
pub struct HotkeyListener {
    /// Shared stop flag — set `true` on [`Drop`].
    stop: Arc<AtomicBool>,
    /// Kept alive so the thread is not detached prematurely; never joined
    /// because `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn a dedicated OS thread watching for Alt+[`STOP_KEY`] and
    /// forward [`ControlEvent::StopPlayback`] on `tx` each time it fires.
    ///
    /// The background thread uses `blocking_send` so it works from a
    /// non-async context.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(tx: mpsc::Sender<ControlEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                // Modifier state is tracked manually; rdev reports plain
                // key transitions only.
                let mut alt_held = false;

                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }

                    match event.event_type {
                        rdev::EventType::KeyPress(rdev::Key::Alt)
                        | rdev::EventType::KeyPress(rdev::Key::AltGr) => {
                            alt_held = true;
                        }
                        rdev::EventType::KeyRelease(rdev::Key::Alt)
                        | rdev::EventType::KeyRelease(rdev::Key::AltGr) => {
                            alt_held = false;
                        }
                        rdev::EventType::KeyPress(key) if key == STOP_KEY && alt_held => {
                            let _ = tx.blocking_send(ControlEvent::StopPlayback);
                        }
                        _ => {}
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for HotkeyListener {
    /// Set the stop flag so the rdev callback stops forwarding events.
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
