//! Configuration: settings file parsing and application paths.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{AppConfig, DEFAULT_MODEL, DEFAULT_SPEED};
