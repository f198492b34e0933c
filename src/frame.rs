//! Per-frame pipeline: analyser → beat detector → particle field.
//!
//! [`FrameContext`] owns all mutable visual state. A [`FrameScheduler`] drives
//! it from a [`Clock`], which is real time in the window and a fixed step in
//! recordings and tests.

use glam::Mat4;
use log::debug;
use std::time::Instant;

use crate::audio::{AudioFeatures, FrequencyAnalyser};
use crate::background::{BackgroundPattern, BackgroundUniforms};
use crate::beat::BeatDetector;
use crate::camera::CloudRotation;
use crate::particles::{ParticleField, PatternMode};

/// Time source for the frame loop
pub trait Clock {
    /// Milliseconds since the clock started
    fn now_ms(&mut self) -> f64;
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now_ms(&mut self) -> f64 {
        (**self).now_ms()
    }
}

/// Monotonic wall clock
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&mut self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock that advances a fixed step per reading: `0, step, 2·step, …`
pub struct FixedStepClock {
    step_ms: f64,
    next_ms: f64,
}

impl FixedStepClock {
    pub fn new(step_ms: f64) -> Self {
        Self {
            step_ms,
            next_ms: 0.0,
        }
    }
}

impl Clock for FixedStepClock {
    fn now_ms(&mut self) -> f64 {
        let now = self.next_ms;
        self.next_ms += self.step_ms;
        now
    }
}

/// Everything a frame produces besides the particle buffers
#[derive(Debug, Clone, Copy)]
pub struct FrameOutput {
    pub time_ms: f64,
    pub features: AudioFeatures,
    pub beat_pulse: f32,
    pub beat_fired: bool,
    pub point_size: f32,
    pub background: BackgroundUniforms,
    /// Point-cloud model transform
    pub model: Mat4,
}

/// Owned visual state, created once at startup
pub struct FrameContext {
    analyser: FrequencyAnalyser,
    beat: BeatDetector,
    field: ParticleField,
    rotation: CloudRotation,
    pattern: PatternMode,
    background: BackgroundPattern,
}

impl FrameContext {
    pub fn new(analyser: FrequencyAnalyser, beat: BeatDetector, field: ParticleField) -> Self {
        Self {
            analyser,
            beat,
            field,
            rotation: CloudRotation::default(),
            pattern: PatternMode::default(),
            background: BackgroundPattern::default(),
        }
    }

    pub fn pattern(&self) -> PatternMode {
        self.pattern
    }

    pub fn set_pattern(&mut self, pattern: PatternMode) {
        self.pattern = pattern;
    }

    pub fn set_background(&mut self, background: BackgroundPattern) {
        self.background = background;
    }

    /// Step to the next background variant, returning it
    pub fn cycle_background(&mut self) -> BackgroundPattern {
        self.background = self.background.next();
        self.background
    }

    pub fn analyser_mut(&mut self) -> &mut FrequencyAnalyser {
        &mut self.analyser
    }

    pub fn beat(&self) -> &BeatDetector {
        &self.beat
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    /// Sample the analyser at `time_ms` and advance one frame
    pub fn advance(&mut self, time_ms: f64) -> FrameOutput {
        self.analyser.seek(time_ms);
        let features = self.analyser.sample();
        self.advance_with(time_ms, features)
    }

    /// Advance one frame from externally supplied features
    pub fn advance_with(&mut self, time_ms: f64, features: AudioFeatures) -> FrameOutput {
        let beat_fired = self.beat.update(features);
        if beat_fired {
            debug!(
                "Beat at {:.0}ms (bass {:.2}, baseline {:.2})",
                time_ms,
                features.bass,
                self.beat.energy_average()
            );
        }

        self.field.update(self.pattern, time_ms, features);
        self.rotation.advance(features);

        FrameOutput {
            time_ms,
            features,
            beat_pulse: self.beat.pulse(),
            beat_fired,
            point_size: self.field.point_size(),
            background: BackgroundUniforms::new(
                time_ms,
                self.beat.pulse(),
                features.energy,
                self.background,
            ),
            model: self.rotation.model_matrix(),
        }
    }
}

/// Frame loop over an injectable clock
pub struct FrameScheduler<C: Clock> {
    clock: C,
    frame: u64,
}

impl<C: Clock> FrameScheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, frame: 0 }
    }

    /// Frames produced so far
    pub fn frame_index(&self) -> u64 {
        self.frame
    }

    /// Read the clock and advance the context one frame
    pub fn tick(&mut self, context: &mut FrameContext) -> FrameOutput {
        let now = self.clock.now_ms();
        self.frame += 1;
        context.advance(now)
    }

    /// Run `frames` frames back to back, handing each result to `sink`
    pub fn run<F>(&mut self, context: &mut FrameContext, frames: u64, mut sink: F)
    where
        F: FnMut(u64, &FrameContext, &FrameOutput),
    {
        for _ in 0..frames {
            let index = self.frame;
            let output = self.tick(context);
            sink(index, context, &output);
        }
    }
}
