//! Spectrum of a decoded track read at frame-clock time.
//!
//! Used when frames are rendered slower or faster than real time: the window
//! for frame `n` is cut from the track at `n / fps`, not from whatever the
//! device happens to have played.

use super::analyser::FrequencySource;
use super::decode::DecodedTrack;
use super::spectrum::{ByteSpectrum, SpectrumTap};
use crate::params::AnalyserConfig;

/// Byte spectrum over a looping mono mix of a track, positioned by `seek`
pub struct TrackSpectrum {
    mono: Vec<f32>,
    sample_rate: u32,
    tap: SpectrumTap,
    spectrum: ByteSpectrum,
    window: Vec<f32>,
}

impl TrackSpectrum {
    pub fn new(track: &DecodedTrack, config: &AnalyserConfig) -> Self {
        let tap = SpectrumTap::new(config.fft_size);
        Self {
            mono: track.to_mono(),
            sample_rate: track.sample_rate(),
            spectrum: ByteSpectrum::new(tap.clone(), config),
            window: vec![0.0; tap.window_len()],
            tap,
        }
    }

    /// Fill the window with the samples played just before `time_ms`
    ///
    /// Before the start the window is silent; past the end the track loops.
    fn fill_window(&mut self, time_ms: f64) {
        let end = (time_ms.max(0.0) * 0.001 * self.sample_rate as f64).round() as usize;
        let len = self.window.len();
        let total = self.mono.len();

        for (k, slot) in self.window.iter_mut().enumerate() {
            // Absolute sample index of slot k is end - len + k
            *slot = match (end + k).checked_sub(len) {
                Some(index) => self.mono[index % total],
                None => 0.0,
            };
        }

        self.tap.clear();
        self.tap.push_samples(&self.window);
    }
}

impl FrequencySource for TrackSpectrum {
    fn bin_count(&self) -> usize {
        self.spectrum.bin_count()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.spectrum.byte_frequency_data(out);
    }

    fn seek(&mut self, time_ms: f64) {
        self.fill_window(time_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp(len: usize, sample_rate: u32) -> DecodedTrack {
        DecodedTrack::new((0..len).map(|n| n as f32).collect(), 1, sample_rate).unwrap()
    }

    fn window_at(source: &mut TrackSpectrum, time_ms: f64) -> Vec<f32> {
        source.seek(time_ms);
        let mut out = vec![0.0; source.tap.window_len()];
        source.tap.copy_window(&mut out);
        out
    }

    #[test]
    fn test_window_ends_at_frame_time() {
        let config = AnalyserConfig::default();
        let mut source = TrackSpectrum::new(&ramp(10_000, 1_000), &config);

        // 3 s at 1 kHz: the window holds samples 952..3000
        let window = window_at(&mut source, 3_000.0);
        assert_eq!(window.len(), 2048);
        assert_eq!(window[0], 952.0);
        assert_eq!(window[2047], 2999.0);
    }

    #[test]
    fn test_window_is_silent_before_start() {
        let config = AnalyserConfig::default();
        let mut source = TrackSpectrum::new(&ramp(10_000, 1_000), &config);

        let window = window_at(&mut source, 100.0);
        assert!(window[..1948].iter().all(|&s| s == 0.0));
        assert_eq!(window[1948], 0.0);
        assert_eq!(window[2047], 99.0);
    }

    #[test]
    fn test_window_loops_past_end() {
        let config = AnalyserConfig::default();
        let mut source = TrackSpectrum::new(&ramp(3_000, 1_000), &config);

        // 4 s into a 3 s track is 1 s into the second pass
        let window = window_at(&mut source, 4_000.0);
        assert_eq!(window[2047], 999.0);
        assert_eq!(window[1047], 2999.0);
    }

    #[test]
    fn test_same_time_same_window() {
        let config = AnalyserConfig::default();
        let mut source = TrackSpectrum::new(&ramp(10_000, 1_000), &config);

        let first = window_at(&mut source, 5_000.0);
        window_at(&mut source, 9_000.0);
        assert_eq!(window_at(&mut source, 5_000.0), first);
    }
}
