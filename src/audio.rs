//! Audio playback/capture and spectrum analysis.
//!
//! The audio thread pushes what it plays (or records) into a [`SpectrumTap`];
//! the frame loop reads a byte spectrum out of it through a
//! [`FrequencyAnalyser`] and reduces that to [`AudioFeatures`]. Offline
//! renders read a [`TrackSpectrum`] positioned by the frame clock instead.

mod analyser;
mod decode;
mod offline;
mod spectrum;
mod system;

// Re-export public types
pub use analyser::{AudioFeatures, FrequencyAnalyser, FrequencySource};
pub use decode::DecodedTrack;
pub use offline::TrackSpectrum;
pub use spectrum::{blackman_window, decibels_to_byte, ByteSpectrum, SpectrumTap};
pub use system::{AudioSystem, LoopedTrack};
