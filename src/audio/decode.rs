//! Audio file decoding, band-limited resampling and soundtrack export.

use log::{debug, warn};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::fs::File;
use std::io;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Error, Result};

/// Fully decoded track, interleaved `f32` samples
#[derive(Debug, Clone)]
pub struct DecodedTrack {
    samples: Vec<f32>,
    channels: usize,
    sample_rate: u32,
}

impl DecodedTrack {
    /// Build a track from interleaved samples; a trailing partial frame is dropped
    pub fn new(mut samples: Vec<f32>, channels: usize, sample_rate: u32) -> Result<Self> {
        if channels == 0 || sample_rate == 0 {
            return Err(Error::Config(format!(
                "track needs channels and a sample rate, got {} ch @ {} Hz",
                channels, sample_rate
            )));
        }
        if samples.len() < channels {
            return Err(Error::Config("track contains no audio frames".to_string()));
        }
        samples.truncate(samples.len() / channels * channels);

        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Decode any container/codec symphonia recognises (WAV, MP3, OGG, FLAC, ...)
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension() {
            hint.with_extension(&ext.to_string_lossy());
        }

        let detected = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = detected.format;

        let track = format
            .default_track()
            .ok_or_else(|| Error::Config(format!("{} has no audio track", path.display())))?;
        let track_id = track.id;
        let mut channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(0);
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);

        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    channels = spec.channels.count();
                    sample_rate = spec.rate;

                    let mut buffer = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => warn!("Skipping corrupt packet: {}", e),
                Err(e) => return Err(e.into()),
            }
        }

        debug!(
            "Decoded {}: {} samples, {} ch @ {} Hz",
            path.display(),
            samples.len(),
            channels,
            sample_rate
        );
        Self::new(samples, channels, sample_rate)
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.channels
    }

    pub fn duration_secs(&self) -> f32 {
        self.frame_count() as f32 / self.sample_rate as f32
    }

    /// Channel average per frame
    pub fn to_mono(&self) -> Vec<f32> {
        let scale = 1.0 / self.channels as f32;
        self.samples
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect()
    }

    /// Windowed-sinc conversion to `to_rate` (anti-aliased)
    pub fn resample(&self, to_rate: u32) -> Result<Self> {
        if to_rate == self.sample_rate {
            return Ok(self.clone());
        }
        if to_rate == 0 {
            return Err(Error::Config("cannot resample to 0 Hz".to_string()));
        }

        let frames = self.frame_count();
        let planar: Vec<Vec<f32>> = (0..self.channels)
            .map(|c| {
                self.samples
                    .iter()
                    .skip(c)
                    .step_by(self.channels)
                    .copied()
                    .collect()
            })
            .collect();

        let ratio = to_rate as f64 / self.sample_rate as f64;
        let params = SincInterpolationParameters {
            sinc_len: 128,
            f_cutoff: 0.95,
            interpolation: SincInterpolationType::Linear,
            oversampling_factor: 128,
            window: WindowFunction::Blackman,
        };

        let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, frames, self.channels)
            .map_err(|e| Error::Resample(e.to_string()))?;
        let mut output = resampler
            .process(&planar, None)
            .map_err(|e| Error::Resample(e.to_string()))?;

        // Flush the filter tail so the end of the track is not cut short
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| Error::Resample(e.to_string()))?;
        for (channel, rest) in output.iter_mut().zip(tail) {
            channel.extend(rest);
        }

        let delay = resampler.output_delay();
        let out_frames = (frames as f64 * ratio).round() as usize;
        let mut samples = Vec::with_capacity(out_frames * self.channels);
        for i in 0..out_frames {
            for channel in &output {
                samples.push(channel.get(delay + i).copied().unwrap_or(0.0));
            }
        }

        Self::new(samples, self.channels, to_rate)
    }

    /// Write `duration_secs` of the track, looping as playback does, as a float WAV
    pub fn write_wav(&self, path: &Path, duration_secs: f32) -> Result<()> {
        let spec = hound::WavSpec {
            channels: self.channels as u16,
            sample_rate: self.sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec)?;

        let total_frames = (duration_secs.max(0.0) as f64 * self.sample_rate as f64).round() as usize;
        let frames = self.frame_count();
        for n in 0..total_frames {
            let start = (n % frames) * self.channels;
            for &sample in &self.samples[start..start + self.channels] {
                writer.write_sample(sample)?;
            }
        }

        writer.finalize()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::TAU;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pulsefield-{}-{}", std::process::id(), name))
    }

    fn sine(freq: f32, sample_rate: u32, frames: usize) -> DecodedTrack {
        let samples = (0..frames)
            .map(|n| (TAU * freq * n as f32 / sample_rate as f32).sin())
            .collect();
        DecodedTrack::new(samples, 1, sample_rate).unwrap()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn test_rejects_empty_input() {
        assert!(DecodedTrack::new(vec![], 2, 44100).is_err());
        assert!(DecodedTrack::new(vec![0.0; 4], 0, 44100).is_err());
        assert!(DecodedTrack::new(vec![0.0; 4], 2, 0).is_err());
    }

    #[test]
    fn test_partial_frames_truncated() {
        let track = DecodedTrack::new(vec![0.0; 5], 2, 44100).unwrap();
        assert_eq!(track.frame_count(), 2);
    }

    #[test]
    fn test_open_sniffs_content_not_extension() {
        // A WAV under an unknown extension still decodes by content sniffing
        let path = temp_path("sniffed.track");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        {
            let mut writer = hound::WavWriter::create(&path, spec).unwrap();
            for _ in 0..100 {
                writer.write_sample(16384i16).unwrap();
                writer.write_sample(-16384i16).unwrap();
            }
            writer.finalize().unwrap();
        }

        let track = DecodedTrack::open(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(track.channels(), 2);
        assert_eq!(track.sample_rate(), 22050);
        assert_eq!(track.frame_count(), 100);
        assert!((track.samples()[0] - 0.5).abs() < 1e-6);
        assert!((track.samples()[1] + 0.5).abs() < 1e-6);
        assert!(track.to_mono().iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn test_open_rejects_non_audio() {
        let path = temp_path("garbage.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        let result = DecodedTrack::open(&path);
        std::fs::remove_file(&path).ok();
        assert!(result.is_err());
    }

    #[test]
    fn test_resample_removes_content_above_output_nyquist() {
        // 30 kHz only exists at 96 kHz; at 44.1 kHz it must vanish, not fold down
        let track = sine(30_000.0, 96_000, 96_000);
        let out = track.resample(44_100).unwrap();

        assert_eq!(out.sample_rate(), 44_100);
        assert_eq!(out.frame_count(), 44_100);
        let middle = &out.samples()[2_000..42_000];
        assert!(rms(middle) < 0.01, "aliased rms {}", rms(middle));
    }

    #[test]
    fn test_resample_keeps_audible_content() {
        let track = sine(1_000.0, 48_000, 48_000);
        let out = track.resample(44_100).unwrap();

        let middle = &out.samples()[2_000..42_000];
        assert!((rms(middle) - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.02);
    }

    #[test]
    fn test_resample_same_rate_is_identity() {
        let track = sine(440.0, 44_100, 1_000);
        let out = track.resample(44_100).unwrap();
        assert_eq!(out.samples(), track.samples());
    }

    #[test]
    fn test_write_wav_loops_to_duration() {
        let path = temp_path("soundtrack.wav");
        let track = DecodedTrack::new(vec![0.1, 0.2, 0.3], 1, 10).unwrap();
        track.write_wav(&path, 0.5).unwrap();

        let mut reader = hound::WavReader::open(&path).unwrap();
        let written: Vec<f32> = reader.samples::<f32>().map(|s| s.unwrap()).collect();
        std::fs::remove_file(&path).ok();

        assert_eq!(written, vec![0.1, 0.2, 0.3, 0.1, 0.2]);
    }
}
