//! Beat detection against a smoothed energy baseline.

use crate::audio::AudioFeatures;
use crate::params::BeatParams;

/// Beat detector state
///
/// The baseline follows overall `energy`; the trigger watches `bass`.
#[derive(Debug, Clone)]
pub struct BeatDetector {
    params: BeatParams,
    energy_average: f32,
    pulse: f32,
}

impl BeatDetector {
    pub fn new(params: BeatParams) -> Self {
        Self::with_state(params, 0.0, 0.0)
    }

    /// Start from an explicit baseline and pulse
    pub fn with_state(params: BeatParams, energy_average: f32, pulse: f32) -> Self {
        Self {
            params,
            energy_average,
            pulse,
        }
    }

    /// Smoothed running mean of `energy`
    pub fn energy_average(&self) -> f32 {
        self.energy_average
    }

    /// Current beat pulse in [0, 1]
    pub fn pulse(&self) -> f32 {
        self.pulse
    }

    /// Advance one frame, returning whether a beat fired
    ///
    /// Order: baseline update, trigger check, then unconditional decay, so a
    /// pulse that fires this frame already reads `1.0 * pulse_decay`.
    pub fn update(&mut self, features: AudioFeatures) -> bool {
        let p = &self.params;
        self.energy_average =
            self.energy_average * p.baseline_retain + features.energy * p.baseline_gain;

        let threshold = self.energy_average * p.trigger_ratio;
        let fired = features.bass > threshold && features.bass > p.bass_floor;
        if fired {
            self.pulse = 1.0;
        }

        self.pulse *= p.pulse_decay;
        fired
    }
}

impl Default for BeatDetector {
    fn default() -> Self {
        Self::new(BeatParams::default())
    }
}
