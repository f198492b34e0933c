//! Sample tap and Web-Audio-style byte spectrum.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::{Arc, Mutex, PoisonError};

use super::analyser::FrequencySource;
use crate::params::AnalyserConfig;

/// Fixed-size ring of the most recent mono samples
struct SampleRing {
    data: Vec<f32>,
    head: usize,
}

impl SampleRing {
    fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
            head: 0,
        }
    }

    fn push(&mut self, sample: f32) {
        self.data[self.head] = sample;
        self.head = (self.head + 1) % self.data.len();
    }

    /// Copy contents oldest-first into `out`
    fn copy_ordered(&self, out: &mut [f32]) {
        let (newer, older) = self.data.split_at(self.head);
        out[..older.len()].copy_from_slice(older);
        out[older.len()..].copy_from_slice(newer);
    }

    fn clear(&mut self) {
        self.data.fill(0.0);
        self.head = 0;
    }
}

/// Shared handle the audio thread writes samples into
///
/// Clones share the same ring.
#[derive(Clone)]
pub struct SpectrumTap {
    ring: Arc<Mutex<SampleRing>>,
    len: usize,
}

impl SpectrumTap {
    /// Create a tap holding the latest `window_len` samples
    pub fn new(window_len: usize) -> Self {
        let len = window_len.max(1);
        Self {
            ring: Arc::new(Mutex::new(SampleRing::new(len))),
            len,
        }
    }

    pub fn window_len(&self) -> usize {
        self.len
    }

    /// Push mono samples
    pub fn push_samples(&self, samples: &[f32]) {
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        for &s in samples {
            ring.push(s);
        }
    }

    /// Push interleaved frames, downmixed to mono by averaging channels
    pub fn push_interleaved(&self, samples: &[f32], channels: usize) {
        if channels <= 1 {
            self.push_samples(samples);
            return;
        }
        let mut ring = self.ring.lock().unwrap_or_else(PoisonError::into_inner);
        let scale = 1.0 / channels as f32;
        for frame in samples.chunks_exact(channels) {
            ring.push(frame.iter().sum::<f32>() * scale);
        }
    }

    /// Replace the window with silence
    pub fn clear(&self) {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub(crate) fn copy_window(&self, out: &mut [f32]) {
        self.ring
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .copy_ordered(out);
    }
}

/// Byte frequency spectrum over a [`SpectrumTap`]
///
/// Blackman window, magnitude scaled by `1 / fft_size`, linear smoothing
/// across calls, then decibels mapped onto 0..=255.
pub struct ByteSpectrum {
    tap: SpectrumTap,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
}

impl ByteSpectrum {
    /// Build a spectrum reader; the tap's window length must equal `config.fft_size`
    pub fn new(tap: SpectrumTap, config: &AnalyserConfig) -> Self {
        let fft_size = tap.window_len();
        debug_assert_eq!(fft_size, config.fft_size);

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            tap,
            fft,
            window: blackman_window(fft_size),
            time_domain: vec![0.0; fft_size],
            fft_buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            smoothed: vec![0.0; fft_size / 2],
            smoothing: config.smoothing_time_constant,
            min_decibels: config.min_decibels,
            max_decibels: config.max_decibels,
        }
    }

    /// Smoothed linear magnitudes from the last call
    pub fn smoothed_magnitudes(&self) -> &[f32] {
        &self.smoothed
    }
}

impl FrequencySource for ByteSpectrum {
    fn bin_count(&self) -> usize {
        self.smoothed.len()
    }

    fn byte_frequency_data(&mut self, out: &mut [u8]) {
        self.tap.copy_window(&mut self.time_domain);

        for ((slot, &sample), &w) in self
            .fft_buffer
            .iter_mut()
            .zip(&self.time_domain)
            .zip(&self.window)
        {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft
            .process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        let scale = 1.0 / self.time_domain.len() as f32;
        let tau = self.smoothing;

        for (k, (smoothed, byte)) in self.smoothed.iter_mut().zip(out.iter_mut()).enumerate() {
            let magnitude = self.fft_buffer[k].norm() * scale;
            let next = tau * *smoothed + (1.0 - tau) * magnitude;
            *smoothed = if next.is_finite() { next } else { 0.0 };
            *byte = decibels_to_byte(
                linear_to_decibels(*smoothed),
                self.min_decibels,
                self.max_decibels,
            );
        }
    }
}

/// Blackman window (α = 0.16) over `size` samples
pub fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..size)
        .map(|i| {
            let x = i as f32 / size as f32;
            a0 - a1 * (2.0 * PI * x).cos() + a2 * (4.0 * PI * x).cos()
        })
        .collect()
}

fn linear_to_decibels(linear: f32) -> f32 {
    if linear <= 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// Map a level in dB onto 0..=255 across `[min_db, max_db]`
pub fn decibels_to_byte(db: f32, min_db: f32, max_db: f32) -> u8 {
    let scaled = 255.0 * (db - min_db) / (max_db - min_db);
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, 255.0) as u8
}
