//! Rendering and recording configuration.

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Rendering configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Window width (pixels)
    pub window_width: u32,

    /// Window height (pixels)
    pub window_height: u32,

    /// Vertical field of view (degrees)
    pub fov_degrees: f32,

    /// Near clipping plane (world units)
    pub near_plane: f32,

    /// Far clipping plane (world units)
    pub far_plane: f32,

    /// Camera distance from the cloud center along +Z (world units)
    pub camera_distance: f32,

    /// Particle sprite opacity
    pub particle_opacity: f32,

    /// Background plane: distance behind the cloud center (world units)
    pub background_depth: f32,

    /// Background plane: edge length (world units)
    pub background_size: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            window_width: 1280,
            window_height: 720,
            fov_degrees: 60.0,
            near_plane: 0.1,
            far_plane: 200.0,
            camera_distance: 40.0,
            particle_opacity: 0.9,
            background_depth: 10.0,
            background_size: 90.0,
        }
    }
}

impl RenderConfig {
    /// Half-height of the visible region at the background plane, as a
    /// fraction of the plane's half-size
    pub fn background_extent(&self) -> f32 {
        let half_fov = (self.fov_degrees * 0.5).to_radians();
        let distance = self.camera_distance + self.background_depth;
        distance * half_fov.tan() / (self.background_size * 0.5)
    }
}

/// Recording mode configuration
#[derive(Debug, Clone)]
pub struct RecordingConfig {
    /// Duration to record (seconds)
    pub duration_secs: f32,

    /// Output directory for frames
    pub output_dir: PathBuf,

    /// Frame rate (FPS)
    pub fps: u32,
}

impl RecordingConfig {
    pub fn new(duration_secs: f32) -> Self {
        Self {
            duration_secs,
            output_dir: PathBuf::from("recording"),
            fps: 60,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.duration_secs.is_finite() || self.duration_secs <= 0.0 {
            return Err(Error::Config(format!(
                "recording duration must be positive, got {}",
                self.duration_secs
            )));
        }
        if self.fps == 0 {
            return Err(Error::Config("recording fps must be > 0".to_string()));
        }
        Ok(())
    }

    /// Total number of frames to capture
    pub fn total_frames(&self) -> usize {
        (self.duration_secs * self.fps as f32).ceil() as usize
    }

    /// Time between captured frames (milliseconds)
    pub fn frame_period_ms(&self) -> f64 {
        1000.0 / self.fps.max(1) as f64
    }

    /// Frame directory path
    pub fn frames_dir(&self) -> PathBuf {
        self.output_dir.join("frames")
    }

    /// Soundtrack written next to the frames
    pub fn audio_path(&self) -> PathBuf {
        self.output_dir.join("audio.wav")
    }

    /// Path of a single captured frame
    pub fn frame_path(&self, frame_num: usize) -> PathBuf {
        self.frames_dir().join(format!("frame_{:05}.png", frame_num))
    }
}
