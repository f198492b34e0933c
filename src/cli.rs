//! Command-line argument parsing.

use clap::Parser;
use log::warn;
use std::path::PathBuf;

use crate::background::BackgroundPattern;
use crate::error::Result;
use crate::params::{ParticleFieldParams, RecordingConfig};
use crate::particles::PatternMode;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "Pulsefield")]
#[command(about = "Audio-reactive particle visualizer", long_about = None)]
pub struct Args {
    /// Audio file to play (looped) and visualize: WAV, MP3, OGG, FLAC, ...
    #[arg(long, value_name = "FILE", conflicts_with = "input")]
    pub audio: Option<PathBuf>,

    /// Visualize the default input device instead of a file
    #[arg(long)]
    pub input: bool,

    /// Particle pattern: idle (default), spiral, waves
    #[arg(long, value_name = "PATTERN", default_value = "idle")]
    pub pattern: String,

    /// Background moiré: rings (default), diagonal, grid, or 0..2
    #[arg(long, value_name = "PATTERN", default_value = "rings")]
    pub background: String,

    /// Number of particles
    #[arg(long, value_name = "COUNT", default_value_t = 4000)]
    pub particles: usize,

    /// Seed for the particle cloud layout
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Record frames to PNG (duration in seconds)
    #[arg(long, value_name = "SECONDS")]
    pub record: Option<f32>,
}

impl Args {
    /// Initial particle pattern; unknown names fall back to idle
    pub fn parse_pattern(&self) -> PatternMode {
        self.pattern.parse().unwrap_or_else(|e| {
            warn!("{}, using {}", e, PatternMode::default());
            PatternMode::default()
        })
    }

    /// Initial background; unknown names fall back to rings
    pub fn parse_background(&self) -> BackgroundPattern {
        self.background.parse().unwrap_or_else(|e| {
            warn!("{}, using {}", e, BackgroundPattern::default());
            BackgroundPattern::default()
        })
    }

    /// Particle field parameters with command-line overrides applied
    pub fn particle_params(&self) -> ParticleFieldParams {
        ParticleFieldParams {
            count: self.particles,
            seed: self.seed,
            ..ParticleFieldParams::default()
        }
    }

    /// Create recording configuration if recording mode is enabled
    pub fn create_recording_config(&self) -> Result<Option<RecordingConfig>> {
        let Some(duration) = self.record else {
            return Ok(None);
        };

        let config = RecordingConfig::new(duration);
        config.validate()?;

        // Create output directories
        std::fs::create_dir_all(config.frames_dir())?;

        Ok(Some(config))
    }
}
