//! Application paths using the `dirs` crate.
//!
//! Layout of the config dir (settings, dictionaries, log file):
//!
//!   Windows: %APPDATA%\piper-tray\
//!   macOS:   ~/Library/Application Support/piper-tray/
//!   Linux:   ~/.config/piper-tray/
//!
//! The `piper` binary itself is looked up next to the executable first
//! (portable install), then in the config dir.

use std::path::{Path, PathBuf};

/// Holds all resolved application directory/file paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Directory for `settings.conf`, the dictionaries and the log file.
    pub config_dir: PathBuf,
    /// Full path to `settings.conf`.
    pub settings_file: PathBuf,
    /// Full path to `ignore.dict` (one word per line).
    pub ignore_file: PathBuf,
    /// Full path to `banned.dict` (one word per line).
    pub banned_file: PathBuf,
    /// Full path to `replace.dict` (`key=value` per line).
    pub replace_file: PathBuf,
    /// Full path to the append-only log file.
    pub log_file: PathBuf,
}

impl AppPaths {
    const APP_NAME: &'static str = "piper-tray";

    /// Name of the synthesis binary on this platform.
    #[cfg(windows)]
    const PIPER_BINARY: &'static str = "piper.exe";
    #[cfg(not(windows))]
    const PIPER_BINARY: &'static str = "piper";

    /// Resolves all paths using the `dirs` crate.
    ///
    /// Falls back to the current directory if the platform cannot provide a
    /// standard path (should be extremely rare in practice).
    pub fn new() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_NAME);
        Self::for_dir(&config_dir)
    }

    /// Build an `AppPaths` rooted at an explicit directory (useful for tests).
    pub fn for_dir(dir: &Path) -> Self {
        Self {
            config_dir: dir.to_path_buf(),
            settings_file: dir.join("settings.conf"),
            ignore_file: dir.join("ignore.dict"),
            banned_file: dir.join("banned.dict"),
            replace_file: dir.join("replace.dict"),
            log_file: dir.join("piper-tray.log"),
        }
    }

    /// Locate the `piper` binary.
    ///
    /// Checked in order: the directory containing the current executable,
    /// then the config dir. Returns `None` when neither exists — the caller
    /// treats that as fatal at startup.
    pub fn piper_binary(&self) -> Option<PathBuf> {
        let mut candidates = Vec::with_capacity(2);

        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join(Self::PIPER_BINARY));
            }
        }
        candidates.push(self.config_dir.join(Self::PIPER_BINARY));

        candidates.into_iter().find(|p| p.is_file())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}
