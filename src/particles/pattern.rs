//! Pattern kinematics: base position + time + audio → current position/color.

use glam::Vec3;
use std::fmt;
use std::str::FromStr;

use crate::audio::AudioFeatures;
use crate::error::{Error, Result};

/// Spatial arrangement the particle cloud is driven into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PatternMode {
    /// Breathing orb
    #[default]
    Idle,
    /// Orb sheared into a rotating spiral
    Spiral,
    /// Orb rippled by traveling sine waves
    Waves,
}

impl PatternMode {
    pub const ALL: [PatternMode; 3] = [PatternMode::Idle, PatternMode::Spiral, PatternMode::Waves];

    pub fn index(self) -> usize {
        match self {
            PatternMode::Idle => 0,
            PatternMode::Spiral => 1,
            PatternMode::Waves => 2,
        }
    }

    /// Look up by index; anything out of range is `Idle`
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => PatternMode::Spiral,
            2 => PatternMode::Waves,
            _ => PatternMode::Idle,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PatternMode::Idle => "idle",
            PatternMode::Spiral => "spiral",
            PatternMode::Waves => "waves",
        }
    }
}

impl fmt::Display for PatternMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PatternMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "idle" | "orb" => Ok(PatternMode::Idle),
            "spiral" => Ok(PatternMode::Spiral),
            "waves" | "wave" => Ok(PatternMode::Waves),
            other => Err(Error::Config(format!("unknown particle pattern '{}'", other))),
        }
    }
}

/// Per-frame terms shared by every particle
#[derive(Debug, Clone, Copy)]
pub struct FrameTerms {
    time_ms: f64,
    /// Elapsed seconds
    t: f32,
    /// Radial bass push, `1 + bass * 0.8`
    pulse: f32,
    /// Slow Z sway, `sin(t) * 0.2`
    wobble: f32,
    /// Energy part of the scale, `1 + energy * 0.5`
    energy_scale: f32,
}

impl FrameTerms {
    pub fn new(time_ms: f64, features: AudioFeatures) -> Self {
        let seconds = time_ms * 0.001;
        Self {
            time_ms,
            t: seconds as f32,
            pulse: 1.0 + features.bass * 0.8,
            wobble: (seconds.sin() * 0.2) as f32,
            energy_scale: 1.0 + features.energy * 0.5,
        }
    }

    /// Per-particle scale: energy growth plus a small index-phased shimmer
    pub fn scale(&self, index: usize) -> f32 {
        let noise = ((self.time_ms * 0.002 + index as f64 * 0.05).sin() * 0.6) as f32;
        self.energy_scale + noise * 0.02
    }
}

/// Current position of particle `index` anchored at `base`
pub fn position(mode: PatternMode, base: Vec3, index: usize, terms: &FrameTerms) -> Vec3 {
    let scale = terms.scale(index);
    let radial = scale * terms.pulse;
    let sway = terms.wobble * 4.0;

    match mode {
        PatternMode::Idle => Vec3::new(base.x * radial, base.y * radial, (base.z + sway) * scale),
        PatternMode::Spiral => {
            let angle = terms.t * 0.6 + index as f32 * 0.005;
            let (sin_a, cos_a) = angle.sin_cos();
            let sx = base.x * cos_a - base.z * sin_a;
            let sz = base.x * sin_a + base.z * cos_a;
            let lift = (terms.t + index as f32 * 0.01).sin() * 2.5;
            Vec3::new(sx * radial, base.y * radial + lift, sz * scale + sway)
        }
        PatternMode::Waves => {
            let wave_x = (base.x * 0.3 + terms.t * 2.4).sin() * 2.2;
            let wave_y = (base.y * 0.3 - terms.t * 2.1).cos() * 2.2;
            Vec3::new(
                base.x * radial + wave_x,
                base.y * radial + wave_y,
                (base.z + sway) * scale,
            )
        }
    }
}

/// Particle color (linear RGB), shared by all particles and modes
pub fn color(features: AudioFeatures) -> Vec3 {
    let hue_shift = 0.2 + features.energy * 0.6;
    Vec3::new(0.1 + hue_shift * 0.6, 0.3 + features.bass * 0.7, 0.9)
}

/// Sprite size (world units)
pub fn point_size(features: AudioFeatures) -> f32 {
    0.25 + features.energy * 0.6 + features.bass * 0.4
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: Vec3 = Vec3::new(3.0, -7.0, 11.0);

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).abs().max_element() < 1e-5
    }

    #[test]
    fn test_idle_at_rest_is_base_position() {
        let terms = FrameTerms::new(0.0, AudioFeatures::SILENT);
        assert!(approx(position(PatternMode::Idle, BASE, 0, &terms), BASE));
    }

    #[test]
    fn test_spiral_at_rest_is_base_position() {
        let terms = FrameTerms::new(0.0, AudioFeatures::SILENT);
        assert!(approx(position(PatternMode::Spiral, BASE, 0, &terms), BASE));
    }

    #[test]
    fn test_spiral_rotates_about_y() {
        // Quarter turn: angle = t * 0.6 = π/2
        let time_ms = std::f64::consts::FRAC_PI_2 / 0.6 * 1000.0;
        let terms = FrameTerms::new(time_ms, AudioFeatures::SILENT);
        let p = position(PatternMode::Spiral, Vec3::new(10.0, 0.0, 0.0), 0, &terms);

        let scale = terms.scale(0);
        let sway = terms.wobble * 4.0;
        assert!(p.x.abs() < 1e-3);
        assert!((p.z - (10.0 * scale + sway)).abs() < 1e-3);
    }

    #[test]
    fn test_bass_pushes_xy_outward_only() {
        let quiet = FrameTerms::new(0.0, AudioFeatures::SILENT);
        let loud = FrameTerms::new(
            0.0,
            AudioFeatures {
                energy: 0.0,
                bass: 1.0,
            },
        );
        let a = position(PatternMode::Idle, BASE, 0, &quiet);
        let b = position(PatternMode::Idle, BASE, 0, &loud);
        assert!((b.x - a.x * 1.8).abs() < 1e-4);
        assert!((b.y - a.y * 1.8).abs() < 1e-4);
        assert!((b.z - a.z).abs() < 1e-6);
    }

    #[test]
    fn test_waves_offsets_follow_base_coordinates() {
        let terms = FrameTerms::new(0.0, AudioFeatures::SILENT);
        let p = position(PatternMode::Waves, Vec3::ZERO, 0, &terms);
        // sin(0) * 2.2 on X, cos(0) * 2.2 on Y
        assert!(approx(p, Vec3::new(0.0, 2.2, 0.0)));
    }

    #[test]
    fn test_color_formula() {
        let c = color(AudioFeatures {
            energy: 0.5,
            bass: 0.2,
        });
        assert!(approx(c, Vec3::new(0.4, 0.44, 0.9)));

        let idle = color(AudioFeatures::SILENT);
        assert!(approx(idle, Vec3::new(0.22, 0.3, 0.9)));
    }

    #[test]
    fn test_point_size_formula() {
        assert!((point_size(AudioFeatures::SILENT) - 0.25).abs() < 1e-6);
        let size = point_size(AudioFeatures {
            energy: 1.0,
            bass: 1.0,
        });
        assert!((size - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_pattern_parsing() {
        assert_eq!("spiral".parse::<PatternMode>().unwrap(), PatternMode::Spiral);
        assert_eq!(" Waves ".parse::<PatternMode>().unwrap(), PatternMode::Waves);
        assert_eq!("orb".parse::<PatternMode>().unwrap(), PatternMode::Idle);
        assert!("vortex".parse::<PatternMode>().is_err());
    }

    #[test]
    fn test_out_of_range_index_is_idle() {
        for mode in PatternMode::ALL {
            assert_eq!(PatternMode::from_index(mode.index()), mode);
        }
        assert_eq!(PatternMode::from_index(7), PatternMode::Idle);
    }
}
