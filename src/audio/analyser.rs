//! Per-frame reduction of a byte spectrum to energy and bass features.

use crate::params::AnalyserConfig;

/// Scalar audio features for one frame, both in [0, 1]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AudioFeatures {
    /// Mean magnitude over all bins
    pub energy: f32,
    /// Mean magnitude over the lowest bins
    pub bass: f32,
}

impl AudioFeatures {
    pub const SILENT: Self = Self {
        energy: 0.0,
        bass: 0.0,
    };

    /// Reduce a byte spectrum to features
    ///
    /// An empty snapshot is silent. `bass_bins` is clamped to the snapshot length.
    pub fn from_snapshot(snapshot: &[u8], bass_bins: usize) -> Self {
        if snapshot.is_empty() {
            return Self::SILENT;
        }

        let total: u32 = snapshot.iter().map(|&b| b as u32).sum();
        let energy = total as f32 / snapshot.len() as f32 / 255.0;

        let bass_len = bass_bins.min(snapshot.len());
        let bass = if bass_len == 0 {
            0.0
        } else {
            let bass_total: u32 = snapshot[..bass_len].iter().map(|&b| b as u32).sum();
            bass_total as f32 / bass_len as f32 / 255.0
        };

        Self { energy, bass }
    }
}

/// Anything that can fill a byte frequency snapshot on demand
pub trait FrequencySource {
    /// Number of bins this source produces
    fn bin_count(&self) -> usize;

    /// Overwrite `out` (length `bin_count()`) with the current magnitudes
    fn byte_frequency_data(&mut self, out: &mut [u8]);

    /// Move the analysis window to `time_ms` on the frame clock
    ///
    /// Live sources follow the device and ignore this.
    fn seek(&mut self, _time_ms: f64) {}
}

/// Frequency analyser owning the per-frame snapshot
///
/// With no source connected, [`sample`](Self::sample) returns silent features.
pub struct FrequencyAnalyser {
    source: Option<Box<dyn FrequencySource>>,
    snapshot: Vec<u8>,
    bass_bins: usize,
}

impl FrequencyAnalyser {
    /// Create an analyser with no source connected
    pub fn new(config: &AnalyserConfig) -> Self {
        Self {
            source: None,
            snapshot: Vec::new(),
            bass_bins: config.bass_bins,
        }
    }

    /// Attach a source, replacing any previous one
    pub fn connect(&mut self, source: Box<dyn FrequencySource>) {
        self.snapshot.clear();
        self.snapshot.resize(source.bin_count(), 0);
        self.source = Some(source);
    }

    /// Detach the current source; subsequent samples are silent
    pub fn disconnect(&mut self) -> Option<Box<dyn FrequencySource>> {
        self.snapshot.clear();
        self.source.take()
    }

    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Most recent snapshot (empty while disconnected)
    pub fn snapshot(&self) -> &[u8] {
        &self.snapshot
    }

    /// Forward the frame time to the connected source
    pub fn seek(&mut self, time_ms: f64) {
        if let Some(source) = self.source.as_mut() {
            source.seek(time_ms);
        }
    }

    /// Refresh the snapshot and reduce it to features
    pub fn sample(&mut self) -> AudioFeatures {
        match self.source.as_mut() {
            Some(source) => {
                source.byte_frequency_data(&mut self.snapshot);
                AudioFeatures::from_snapshot(&self.snapshot, self.bass_bins)
            }
            None => AudioFeatures::SILENT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ConstantSource {
        bins: usize,
        low: u8,
        high: u8,
    }

    impl FrequencySource for ConstantSource {
        fn bin_count(&self) -> usize {
            self.bins
        }

        fn byte_frequency_data(&mut self, out: &mut [u8]) {
            for (i, b) in out.iter_mut().enumerate() {
                *b = if i < 20 { self.low } else { self.high };
            }
        }
    }

    #[test]
    fn test_disconnected_analyser_is_silent() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default());
        assert!(!analyser.is_connected());
        assert_eq!(analyser.sample(), AudioFeatures::SILENT);
        assert!(analyser.snapshot().is_empty());
    }

    #[test]
    fn test_features_from_connected_source() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default());
        analyser.connect(Box::new(ConstantSource {
            bins: 1024,
            low: 255,
            high: 0,
        }));

        let features = analyser.sample();
        assert_eq!(analyser.snapshot().len(), 1024);
        assert!((features.bass - 1.0).abs() < 1e-6);
        assert!((features.energy - 20.0 / 1024.0).abs() < 1e-6);
    }

    #[test]
    fn test_disconnect_returns_to_silence() {
        let mut analyser = FrequencyAnalyser::new(&AnalyserConfig::default());
        analyser.connect(Box::new(ConstantSource {
            bins: 64,
            low: 128,
            high: 128,
        }));
        assert!(analyser.sample().energy > 0.0);

        assert!(analyser.disconnect().is_some());
        assert_eq!(analyser.sample(), AudioFeatures::SILENT);
    }

    #[test]
    fn test_bass_bins_clamped_to_snapshot() {
        let features = AudioFeatures::from_snapshot(&[255; 8], 20);
        assert!((features.bass - 1.0).abs() < 1e-6);
        assert!((features.energy - 1.0).abs() < 1e-6);
        assert_eq!(AudioFeatures::from_snapshot(&[], 20), AudioFeatures::SILENT);
    }
}
