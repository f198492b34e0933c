//! Particle cloud layout parameters.

use crate::error::{Error, Result};

/// Particle field allocation parameters
#[derive(Debug, Clone)]
pub struct ParticleFieldParams {
    /// Number of particles (fixed for the lifetime of the field)
    pub count: usize,

    /// Inner radius of the spawn shell (world units)
    pub shell_inner_radius: f32,

    /// Shell thickness (world units); radii fall in `inner..inner + thickness`
    pub shell_thickness: f32,

    /// PRNG seed for the spawn shell, `None` = seeded from the OS
    pub seed: Option<u64>,

    /// Point size before the first frame is computed (world units)
    pub initial_point_size: f32,

    /// Color before the first frame is computed (linear RGB)
    pub initial_color: [f32; 3],
}

impl Default for ParticleFieldParams {
    fn default() -> Self {
        Self {
            count: 4000,
            shell_inner_radius: 12.0,
            shell_thickness: 8.0,
            seed: None,
            initial_point_size: 0.3,
            initial_color: [0.2, 0.7, 1.0],
        }
    }
}

impl ParticleFieldParams {
    pub fn validate(&self) -> Result<()> {
        if self.count == 0 {
            return Err(Error::Config("particle count must be > 0".to_string()));
        }
        if self.count > u32::MAX as usize {
            return Err(Error::Config(format!(
                "particle count {} exceeds the GPU instance limit",
                self.count
            )));
        }
        if self.shell_inner_radius <= 0.0 || self.shell_thickness < 0.0 {
            return Err(Error::Config(format!(
                "invalid spawn shell: inner radius {}, thickness {}",
                self.shell_inner_radius, self.shell_thickness
            )));
        }
        Ok(())
    }
}
