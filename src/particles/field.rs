//! Particle storage: immutable anchors plus per-frame instance data.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use super::pattern::{self, FrameTerms, PatternMode};
use crate::audio::AudioFeatures;
use crate::error::Result;
use crate::params::ParticleFieldParams;

/// Per-particle GPU instance data (position + color)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

/// Fixed-size particle cloud
pub struct ParticleField {
    /// Spawn anchors, never mutated
    base: Vec<Vec3>,
    /// Current positions and colors, rewritten every frame
    instances: Vec<ParticleInstance>,
    point_size: f32,
}

impl ParticleField {
    /// Allocate `params.count` particles on a random spherical shell
    pub fn spawn(params: &ParticleFieldParams) -> Result<Self> {
        params.validate()?;

        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let base = (0..params.count)
            .map(|_| shell_point(&mut rng, params.shell_inner_radius, params.shell_thickness))
            .collect();

        debug!(
            "Spawned {} particles on a {}..{} shell",
            params.count,
            params.shell_inner_radius,
            params.shell_inner_radius + params.shell_thickness
        );

        Ok(Self::from_base_positions(
            base,
            params.initial_color,
            params.initial_point_size,
        ))
    }

    /// Build a field from explicit anchors; particles start at their anchors
    pub fn from_base_positions(base: Vec<Vec3>, color: [f32; 3], point_size: f32) -> Self {
        let instances = base
            .iter()
            .map(|p| ParticleInstance {
                position: p.to_array(),
                color,
            })
            .collect();

        Self {
            base,
            instances,
            point_size,
        }
    }

    pub fn len(&self) -> usize {
        self.base.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn base_positions(&self) -> &[Vec3] {
        &self.base
    }

    /// Instance data ready for upload
    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    pub fn point_size(&self) -> f32 {
        self.point_size
    }

    /// Recompute every particle from its anchor
    pub fn update(&mut self, mode: PatternMode, time_ms: f64, features: AudioFeatures) {
        let terms = FrameTerms::new(time_ms, features);
        let color = pattern::color(features).to_array();

        for (index, (instance, &base)) in self.instances.iter_mut().zip(&self.base).enumerate() {
            instance.position = pattern::position(mode, base, index, &terms).to_array();
            instance.color = color;
        }

        self.point_size = pattern::point_size(features);
    }
}

/// Uniformly distributed direction at a radius in `inner..inner + thickness`
pub fn shell_point<R: Rng + ?Sized>(rng: &mut R, inner: f32, thickness: f32) -> Vec3 {
    let r = inner + rng.gen::<f32>() * thickness;
    let theta = rng.gen::<f32>() * TAU;
    let phi = (2.0 * rng.gen::<f32>() - 1.0).acos();
    Vec3::new(
        r * phi.sin() * theta.cos(),
        r * phi.sin() * theta.sin(),
        r * phi.cos(),
    )
}
