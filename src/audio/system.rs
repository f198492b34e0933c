//! Audio system managing playback/capture and the spectrum tap.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use log::{error, info};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::decode::DecodedTrack;
use super::spectrum::SpectrumTap;
use crate::error::{Error, Result};

/// Track played on a loop, already at the device sample rate
#[derive(Debug, Clone)]
pub struct LoopedTrack {
    track: DecodedTrack,
    /// Next frame to play
    position: usize,
}

impl LoopedTrack {
    pub fn new(track: DecodedTrack) -> Self {
        Self { track, position: 0 }
    }

    pub fn sample_rate(&self) -> u32 {
        self.track.sample_rate()
    }

    /// Fill one output frame (any channel count), then advance, wrapping at the end
    pub fn next_frame(&mut self, out: &mut [f32]) {
        let channels = self.track.channels();
        let start = self.position * channels;
        let frame = &self.track.samples()[start..start + channels];

        for (c, slot) in out.iter_mut().enumerate() {
            *slot = frame[c.min(channels - 1)];
        }

        self.position = (self.position + 1) % self.track.frame_count();
    }
}

/// Callback-side view of the pause flag
///
/// The first callback that sees the flag set clears the tap, so a buffer
/// pushed by a callback already in flight when `pause` was called cannot
/// outlive the pause.
#[derive(Debug, Default)]
struct PauseLatch {
    was_paused: bool,
}

impl PauseLatch {
    /// Returns whether the stream is paused
    fn observe(&mut self, paused: bool, tap: &SpectrumTap) -> bool {
        if paused && !self.was_paused {
            tap.clear();
        }
        self.was_paused = paused;
        paused
    }
}

/// Audio system feeding the spectrum tap from a device stream
pub struct AudioSystem {
    /// Device stream (kept alive)
    _stream: cpal::Stream,

    /// Pause flag shared with the stream callback
    paused: Arc<AtomicBool>,

    description: String,
}

impl AudioSystem {
    /// Decode an audio file and play it on a loop through the default output device
    pub fn from_file(path: &Path, tap: SpectrumTap) -> Result<Self> {
        let track = DecodedTrack::open(path)?;
        info!(
            "Loaded {} ({} ch @ {} Hz, {:.1}s)",
            path.display(),
            track.channels(),
            track.sample_rate(),
            track.duration_secs()
        );
        Self::from_track(track_label(path), &track, tap)
    }

    /// Play a decoded track on a loop through the default output device
    pub fn from_track(label: String, track: &DecodedTrack, tap: SpectrumTap) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| Error::AudioDevice("no audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| Error::AudioDevice(format!("failed to get output config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(Error::AudioStream(format!(
                "unsupported output sample format {:?}",
                config.sample_format()
            )));
        }

        let device_rate = config.sample_rate().0;
        let channels = config.channels() as usize;
        info!(
            "Audio out: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            device_rate
        );

        // Convert once up front; the callback only copies frames
        let mut track = LoopedTrack::new(track.resample(device_rate)?);
        let paused = Arc::new(AtomicBool::new(false));
        let paused_cb = Arc::clone(&paused);
        let mut latch = PauseLatch::default();

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    if latch.observe(paused_cb.load(Ordering::Relaxed), &tap) {
                        data.fill(0.0);
                        return;
                    }
                    for frame in data.chunks_mut(channels) {
                        track.next_frame(frame);
                    }
                    tap.push_interleaved(data, channels);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioStream(format!("failed to build output stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::AudioStream(format!("failed to start output stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            paused,
            description: label,
        })
    }

    /// Capture the default input device
    pub fn from_default_input(tap: SpectrumTap) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| Error::AudioDevice("no audio input device found".to_string()))?;

        let config = device
            .default_input_config()
            .map_err(|e| Error::AudioDevice(format!("failed to get input config: {}", e)))?;

        if config.sample_format() != cpal::SampleFormat::F32 {
            return Err(Error::AudioStream(format!(
                "unsupported input sample format {:?}",
                config.sample_format()
            )));
        }

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        info!("Audio in: {} @ {}Hz", name, config.sample_rate().0);

        let channels = config.channels() as usize;
        let paused = Arc::new(AtomicBool::new(false));
        let paused_cb = Arc::clone(&paused);
        let mut latch = PauseLatch::default();

        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !latch.observe(paused_cb.load(Ordering::Relaxed), &tap) {
                        tap.push_interleaved(data, channels);
                    }
                },
                |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioStream(format!("failed to build input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| Error::AudioStream(format!("failed to start input stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            paused,
            description: format!("input: {}", name),
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Silence output; the stream callback clears the analysis window
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
    }

    /// Toggle playback, returning whether audio is now playing
    pub fn toggle(&self) -> bool {
        if self.is_paused() {
            self.resume();
            true
        } else {
            self.pause();
            false
        }
    }
}

fn track_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
