//! Logging setup: `env_logger` to stderr, optionally teed into the log file.
//!
//! When file logging is enabled in [`AppConfig`](crate::config::AppConfig),
//! every formatted log line (env_logger's default format, timestamp included)
//! is also appended to the log file. File writes are best-effort: a full disk
//! or permission problem must never take the application down, so those
//! errors are swallowed.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use env_logger::{Env, Target};

/// Initialise the global logger.
///
/// `RUST_LOG` still controls the filter; the default level is `info`.
/// Call once at startup, before any log statement.
pub fn init(file_log: bool, log_file: &Path) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));

    let mut open_error = None;
    if file_log {
        match OpenOptions::new().create(true).append(true).open(log_file) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(Tee::new(file))));
            }
            Err(e) => open_error = Some(e),
        }
    }

    builder.init();

    if let Some(e) = open_error {
        log::warn!(
            "could not open log file {} ({e}); logging to stderr only",
            log_file.display()
        );
    }
}

// ---------------------------------------------------------------------------
// Tee
// ---------------------------------------------------------------------------

/// Writer that duplicates log output to stderr and the log file.
///
/// stderr errors propagate (env_logger ignores them anyway); file errors are
/// swallowed so diagnostics never become fatal.
struct Tee {
    file: File,
}

impl Tee {
    fn new(file: File) -> Self {
        Self { file }
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let _ = self.file.write_all(buf);
        io::stderr().write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = self.file.flush();
        io::stderr().flush()
    }
}
