//! Parameter definitions with units and documented semantics.
//!
//! Tunable numbers live here with:
//! - Units (decibels, world units, milliseconds, etc.)
//! - Documented ranges and meanings
//! - A `validate()` for anything that can be set from outside

mod audio;
mod particles;
mod render;

// Re-export all types
pub use audio::{AnalyserConfig, BeatParams};
pub use particles::ParticleFieldParams;
pub use render::{RecordingConfig, RenderConfig};
