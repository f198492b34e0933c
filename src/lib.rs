//! Pulsefield library - Audio-reactive particle visualizer

pub mod audio;
pub mod background;
pub mod beat;
pub mod camera;
pub mod cli;
pub mod error;
pub mod frame;
pub mod params;
pub mod particles;
pub mod rendering;

pub use error::{Error, Result};
