//! Moiré background selection and shader inputs.

use bytemuck::{Pod, Zeroable};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Background interference pattern variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPattern {
    /// Concentric rings with an angular swirl
    #[default]
    Rings,
    /// Crossed diagonal gratings with a radial ripple
    Diagonal,
    /// Axis-aligned grid over rings
    Grid,
}

impl BackgroundPattern {
    pub const ALL: [BackgroundPattern; 3] = [
        BackgroundPattern::Rings,
        BackgroundPattern::Diagonal,
        BackgroundPattern::Grid,
    ];

    pub fn index(self) -> usize {
        match self {
            BackgroundPattern::Rings => 0,
            BackgroundPattern::Diagonal => 1,
            BackgroundPattern::Grid => 2,
        }
    }

    /// Look up by index; anything out of range is `Rings`
    pub fn from_index(index: usize) -> Self {
        match index {
            1 => BackgroundPattern::Diagonal,
            2 => BackgroundPattern::Grid,
            _ => BackgroundPattern::Rings,
        }
    }

    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len())
    }

    pub fn name(self) -> &'static str {
        match self {
            BackgroundPattern::Rings => "rings",
            BackgroundPattern::Diagonal => "diagonal",
            BackgroundPattern::Grid => "grid",
        }
    }
}

impl fmt::Display for BackgroundPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BackgroundPattern {
    type Err = Error;

    /// Accepts a name or an index (`0`, `1`, `2`)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "rings" | "0" => Ok(BackgroundPattern::Rings),
            "diagonal" | "1" => Ok(BackgroundPattern::Diagonal),
            "grid" | "2" => Ok(BackgroundPattern::Grid),
            other => Err(Error::Config(format!(
                "unknown background pattern '{}'",
                other
            ))),
        }
    }
}

/// Background shader inputs (matches `Params` in background.wgsl)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct BackgroundUniforms {
    /// Elapsed seconds
    pub time: f32,
    /// Beat pulse in [0, 1]
    pub beat: f32,
    /// Overall energy in [0, 1]
    pub energy: f32,
    /// Pattern index as float (0, 1, 2)
    pub pattern: f32,
}

impl BackgroundUniforms {
    pub fn new(time_ms: f64, beat: f32, energy: f32, pattern: BackgroundPattern) -> Self {
        Self {
            time: (time_ms * 0.001) as f32,
            beat,
            energy,
            pattern: pattern.index() as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_visits_every_pattern() {
        let mut pattern = BackgroundPattern::default();
        let mut seen = Vec::new();
        for _ in 0..3 {
            seen.push(pattern);
            pattern = pattern.next();
        }
        assert_eq!(seen, BackgroundPattern::ALL.to_vec());
        assert_eq!(pattern, BackgroundPattern::Rings);
    }

    #[test]
    fn test_parse_names_and_indices() {
        assert_eq!("1".parse::<BackgroundPattern>().unwrap(), BackgroundPattern::Diagonal);
        assert_eq!("GRID".parse::<BackgroundPattern>().unwrap(), BackgroundPattern::Grid);
        assert!("3".parse::<BackgroundPattern>().is_err());
        assert_eq!(BackgroundPattern::from_index(3), BackgroundPattern::Rings);
    }

    #[test]
    fn test_uniforms_layout() {
        assert_eq!(std::mem::size_of::<BackgroundUniforms>(), 16);
        let u = BackgroundUniforms::new(2500.0, 0.9, 0.3, BackgroundPattern::Grid);
        assert_eq!(u.time, 2.5);
        assert_eq!(u.pattern, 2.0);
    }
}
