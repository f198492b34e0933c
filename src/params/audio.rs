//! Spectrum analysis and beat detection parameters.

use crate::error::{Error, Result};

/// Spectrum analyser configuration, modelled on a Web Audio `AnalyserNode`
#[derive(Debug, Clone)]
pub struct AnalyserConfig {
    /// FFT window size in samples (must be power of 2)
    /// Yields `fft_size / 2` frequency bins
    pub fft_size: usize,

    /// Temporal smoothing between successive spectra (0 = none, 1 = frozen)
    pub smoothing_time_constant: f32,

    /// Level mapped to byte 0 (dBFS)
    pub min_decibels: f32,

    /// Level mapped to byte 255 (dBFS)
    pub max_decibels: f32,

    /// Number of lowest bins averaged into the bass feature
    /// At 44.1 kHz and 2048 samples, 20 bins ≈ 0-430 Hz
    pub bass_bins: usize,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            smoothing_time_constant: 0.8,
            min_decibels: -100.0,
            max_decibels: -30.0,
            bass_bins: 20,
        }
    }
}

impl AnalyserConfig {
    /// Number of frequency bins in each snapshot
    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Validate configuration (FFT size must be power of 2, etc.)
    pub fn validate(&self) -> Result<()> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(Error::Config(format!(
                "FFT size must be a power of 2 of at least 32, got {}",
                self.fft_size
            )));
        }
        if !(0.0..=1.0).contains(&self.smoothing_time_constant) {
            return Err(Error::Config(format!(
                "smoothing time constant must be within [0, 1], got {}",
                self.smoothing_time_constant
            )));
        }
        if self.min_decibels >= self.max_decibels {
            return Err(Error::Config(format!(
                "min decibels ({}) must be below max decibels ({})",
                self.min_decibels, self.max_decibels
            )));
        }
        if self.bass_bins == 0 || self.bass_bins > self.frequency_bin_count() {
            return Err(Error::Config(format!(
                "bass bins must be within 1..={}, got {}",
                self.frequency_bin_count(),
                self.bass_bins
            )));
        }
        Ok(())
    }
}

/// Beat detector coefficients
#[derive(Debug, Clone)]
pub struct BeatParams {
    /// Weight kept from the previous energy baseline each frame
    pub baseline_retain: f32,

    /// Weight given to the current frame's energy
    pub baseline_gain: f32,

    /// Bass must exceed `baseline * trigger_ratio` to fire
    pub trigger_ratio: f32,

    /// Absolute bass floor; keeps silence from triggering
    pub bass_floor: f32,

    /// Per-frame multiplicative decay of the pulse
    pub pulse_decay: f32,
}

impl Default for BeatParams {
    fn default() -> Self {
        Self {
            baseline_retain: 0.95,
            baseline_gain: 0.05,
            trigger_ratio: 1.4,
            bass_floor: 0.15,
            pulse_decay: 0.9,
        }
    }
}

impl BeatParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.pulse_decay) {
            return Err(Error::Config(format!(
                "pulse decay must be within [0, 1), got {}",
                self.pulse_decay
            )));
        }
        if self.baseline_retain < 0.0 || self.baseline_gain < 0.0 {
            return Err(Error::Config(
                "baseline weights must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_analyser_config_is_valid() {
        let config = AnalyserConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.frequency_bin_count(), 1024);
    }

    #[test]
    fn test_analyser_config_rejects_bad_values() {
        let config = AnalyserConfig {
            fft_size: 1000,
            ..AnalyserConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyserConfig {
            min_decibels: -30.0,
            max_decibels: -100.0,
            ..AnalyserConfig::default()
        };
        assert!(config.validate().is_err());

        let config = AnalyserConfig {
            fft_size: 32,
            bass_bins: 20,
            ..AnalyserConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_beat_params_validate() {
        assert!(BeatParams::default().validate().is_ok());
        let params = BeatParams {
            pulse_decay: 1.0,
            ..BeatParams::default()
        };
        assert!(params.validate().is_err());
    }
}
