//! The clipboard-to-speech pipeline.
//!
//! One pipeline run takes a captured clipboard value through
//! Sanitize → Synthesize → Play. The clipboard monitor guarantees at most
//! one run is in flight; see [`crate::monitor`].

pub mod runner;

pub use runner::{PipelineError, PipelineRunner};
