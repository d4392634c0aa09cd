//! Application settings parsed from the plain-text `settings.conf`.
//!
//! The file format is one `Key=Value` pair per line with three recognized
//! keys: `Model`, `Speed` and `Logging`. Anything else is ignored. A missing
//! or unreadable file yields the defaults — configuration is never a fatal
//! error.

use std::path::Path;

use super::AppPaths;

/// Voice model shipped with the application, used when `Model` is not set.
pub const DEFAULT_MODEL: &str = "en_US-libritts_r-medium.onnx";

/// Length-scale passed to the synthesis engine when `Speed` is not set or
/// does not parse as a positive number.
pub const DEFAULT_SPEED: f32 = 1.0;

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

/// Top-level application configuration.
///
/// ```
/// use piper_tray::config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.speed, 1.0);
/// assert!(!config.logging);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Voice model file name passed to the synthesis engine via `--model`.
    pub model: String,
    /// Length-scale (speech speed) passed via `--length-scale`.
    ///
    /// Always finite and positive; invalid values in the file fall back to
    /// [`DEFAULT_SPEED`].
    pub speed: f32,
    /// Whether log lines are additionally appended to the log file.
    pub logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            speed: DEFAULT_SPEED,
            logging: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from `settings.conf`.
    ///
    /// A missing or unreadable file yields `Default` so callers never need
    /// to special-case a first run.
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                log::debug!(
                    "settings file not read ({}): {e}; using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }

    /// Parse the `Key=Value` content of a settings file.
    ///
    /// Unrecognized keys and malformed lines are skipped; a `Speed` value
    /// that is not a finite positive number falls back to the default.
    fn parse(content: &str) -> Self {
        let mut config = Self::default();

        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "Model" => {
                    if !value.is_empty() {
                        config.model = value.to_string();
                    }
                }
                "Speed" => {
                    if let Ok(speed) = value.parse::<f32>() {
                        if speed.is_finite() && speed > 0.0 {
                            config.speed = speed;
                        } else {
                            log::warn!("ignoring non-positive Speed value: {value}");
                        }
                    } else {
                        log::warn!("ignoring unparseable Speed value: {value}");
                    }
                }
                "Logging" => {
                    config.logging = value.eq_ignore_ascii_case("true");
                }
                _ => {}
            }
        }

        config
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_shipped_values() {
        let config = AppConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.speed, DEFAULT_SPEED);
        assert!(!config.logging);
    }

    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.conf");

        let config = AppConfig::load_from(&path);
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn parses_all_recognized_keys() {
        let config = AppConfig::parse("Model=en_GB-alba-medium.onnx\nSpeed=1.5\nLogging=true\n");
        assert_eq!(config.model, "en_GB-alba-medium.onnx");
        assert_eq!(config.speed, 1.5);
        assert!(config.logging);
    }

    #[test]
    fn values_are_trimmed() {
        let config = AppConfig::parse("Model = voice.onnx \n Speed = 0.8 \nLogging = TRUE\n");
        assert_eq!(config.model, "voice.onnx");
        assert_eq!(config.speed, 0.8);
        assert!(config.logging);
    }

    #[test]
    fn invalid_speed_falls_back_to_default() {
        assert_eq!(AppConfig::parse("Speed=fast").speed, DEFAULT_SPEED);
        assert_eq!(AppConfig::parse("Speed=0").speed, DEFAULT_SPEED);
        assert_eq!(AppConfig::parse("Speed=-2.0").speed, DEFAULT_SPEED);
        assert_eq!(AppConfig::parse("Speed=inf").speed, DEFAULT_SPEED);
    }

    #[test]
    fn unknown_keys_and_garbage_lines_are_ignored() {
        let config = AppConfig::parse("Volume=11\nnot a key value pair\nSpeed=2.0\n");
        assert_eq!(config.speed, 2.0);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn logging_is_case_insensitive_but_strict() {
        assert!(AppConfig::parse("Logging=True").logging);
        assert!(!AppConfig::parse("Logging=yes").logging);
        assert!(!AppConfig::parse("Logging=false").logging);
    }

    #[test]
    fn load_from_reads_a_real_file() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.conf");
        std::fs::write(&path, "Model=m.onnx\nSpeed=1.2\n").expect("write");

        let config = AppConfig::load_from(&path);
        assert_eq!(config.model, "m.onnx");
        assert_eq!(config.speed, 1.2);
        assert!(!config.logging);
    }
}
