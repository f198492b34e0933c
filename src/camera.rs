//! Fixed camera and the audio-driven spin of the point cloud.

use glam::{EulerRot, Mat4, Vec3};
use std::f32::consts::TAU;

use crate::audio::AudioFeatures;
use crate::params::RenderConfig;

/// Camera parked on +Z looking at the cloud center
pub struct CameraSystem {
    eye: Vec3,
    target: Vec3,
    fov_radians: f32,
    near: f32,
    far: f32,
}

impl CameraSystem {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, config.camera_distance),
            target: Vec3::ZERO,
            fov_radians: config.fov_degrees.to_radians(),
            near: config.near_plane,
            far: config.far_plane,
        }
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_radians, aspect_ratio, self.near, self.far)
    }

    /// World size of one sprite unit at unit distance: `tan(fov / 2)`
    ///
    /// Scales point sizes so they shrink with depth like attenuated GL points.
    pub fn sprite_scale(&self) -> f32 {
        (self.fov_radians * 0.5).tan()
    }
}

/// Accumulated rotation of the point cloud (radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CloudRotation {
    pub x: f32,
    pub y: f32,
}

impl CloudRotation {
    /// Spin a little every frame, faster with energy (Y) and bass (X)
    pub fn advance(&mut self, features: AudioFeatures) {
        self.y = (self.y + 0.001 + features.energy * 0.01).rem_euclid(TAU);
        self.x = (self.x + 0.0005 + features.bass * 0.006).rem_euclid(TAU);
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_euler(EulerRot::XYZ, self.x, self.y, 0.0)
    }
}
