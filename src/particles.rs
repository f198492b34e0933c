//! Audio-reactive particle cloud.
//!
//! Particles keep an immutable base position on a spherical shell; every
//! frame their position and color are recomputed from that anchor, the
//! selected [`PatternMode`], elapsed time and the current audio features.
//! Nothing is carried over from the previous frame.

mod field;
mod pattern;

// Re-export public types
pub use field::{shell_point, ParticleField, ParticleInstance};
pub use pattern::{color, point_size, position, FrameTerms, PatternMode};
