//! Global stop-playback hotkey (Alt+Q), backed by `rdev`.
//!
//! `rdev::listen()` is a blocking OS-level call that never returns while
//! the process is alive, so it runs on a dedicated OS thread. The callback
//! forwards a single [`ControlEvent::StopPlayback`] onto the monitor's
//! control channel — the same message a tray-menu stop action would send —
//! so the playback controller never knows which collaborator asked.
//!
//! [`ControlEvent::StopPlayback`]: crate::monitor::ControlEvent::StopPlayback

pub mod listener;

pub use listener::HotkeyListener;

/// The key that, together with Alt, stops playback.
pub const STOP_KEY: rdev::Key = rdev::Key::KeyQ;
