//! Desktop notifications via notify-rust.
//!
//! Notifications are best-effort: a failure to reach the notification
//! service is logged at `warn` and otherwise ignored.

use notify_rust::Notification;

const TIMEOUT_MS: i32 = 3000;

/// Thin, cloneable wrapper around `notify_rust`.
///
/// Construct with `Notifier::new(false)` in tests to make every call a
/// no-op.
#[derive(Debug, Clone)]
pub struct Notifier {
    enabled: bool,
}

impl Notifier {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Informational one-shot notification (monitoring started/stopped).
    pub fn info(&self, summary: &str, body: &str) {
        self.show(summary, body, "audio-volume-high");
    }

    /// Error notification (fatal startup problems, unexpected run failures).
    pub fn error(&self, summary: &str, body: &str) {
        self.show(summary, body, "dialog-error");
    }

    fn show(&self, summary: &str, body: &str, icon: &str) {
        if !self.enabled {
            return;
        }

        log::debug!("notification: {summary}: {body}");

        if let Err(e) = Notification::new()
            .summary(summary)
            .body(body)
            .icon(icon)
            .timeout(TIMEOUT_MS)
            .show()
        {
            log::warn!("failed to show notification: {e}");
        }
    }
}
