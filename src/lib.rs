//! Piper Tray — clipboard-to-speech for the desktop.
//!
//! Watches the system clipboard for new text and speaks it aloud by piping
//! the text through the external `piper` synthesis binary and streaming
//! the resulting raw PCM to the default audio output.
//!
//! # Architecture
//!
//! ```text
//! ClipboardMonitor ──1s tick──▶ PipelineRunner
//!                                 ├─ Dictionaries (hot-reloaded)
//!                                 ├─ sanitize()
//!                                 ├─ SynthEngine (piper subprocess)
//!                                 └─ PlaybackController (rodio)
//!                                        ▲
//! HotkeyListener ── StopPlayback ────────┘
//! ```
//!
//! Data flows strictly downward; control flows back only as completion
//! signals and the unified stop event. At most one pipeline run is in
//! flight at a time — clipboard changes observed while busy are dropped,
//! never queued.

pub mod config;
pub mod dict;
pub mod hotkey;
pub mod logging;
pub mod monitor;
pub mod notify;
pub mod pipeline;
pub mod playback;
pub mod sanitize;
pub mod synth;
