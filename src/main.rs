//! Pulsefield - an audio-reactive particle cloud
//!
//! A few thousand points breathe, spiral and ripple with the music while a
//! moiré field pulses behind them on every beat.

use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::*,
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use pulsefield::audio::{
    AudioSystem, ByteSpectrum, DecodedTrack, FrequencyAnalyser, SpectrumTap, TrackSpectrum,
};
use pulsefield::beat::BeatDetector;
use pulsefield::camera::CameraSystem;
use pulsefield::cli::Args;
use pulsefield::frame::{Clock, FixedStepClock, FrameContext, FrameScheduler, SystemClock};
use pulsefield::params::*;
use pulsefield::particles::{ParticleField, PatternMode};
use pulsefield::rendering::{self, RenderSystem};

/// Main application state
struct App {
    // Window and rendering
    window: Option<Arc<Window>>,
    render_system: Option<RenderSystem>,

    // Visual state
    context: FrameContext,
    scheduler: FrameScheduler<Box<dyn Clock>>,
    camera: CameraSystem,
    audio: Option<AudioSystem>,

    // Configuration
    render_config: RenderConfig,
    recording_config: Option<RecordingConfig>,
}

impl App {
    fn new(args: &Args) -> anyhow::Result<Self> {
        let render_config = RenderConfig::default();
        let analyser_config = AnalyserConfig::default();
        let beat_params = BeatParams::default();
        analyser_config.validate()?;
        beat_params.validate()?;

        let recording_config = args
            .create_recording_config()
            .context("failed to set up recording")?;

        let field = ParticleField::spawn(&args.particle_params())?;
        let mut analyser = FrequencyAnalyser::new(&analyser_config);
        let audio = open_audio(
            args,
            &analyser_config,
            recording_config.as_ref(),
            &mut analyser,
        );

        let mut context = FrameContext::new(analyser, BeatDetector::new(beat_params), field);
        context.set_pattern(args.parse_pattern());
        context.set_background(args.parse_background());

        // Recordings step time at exactly the output frame rate
        let clock: Box<dyn Clock> = match &recording_config {
            Some(config) => {
                info!(
                    "Recording {:.1}s ({} frames) to {}",
                    config.duration_secs,
                    config.total_frames(),
                    config.frames_dir().display()
                );
                Box::new(FixedStepClock::new(config.frame_period_ms()))
            }
            None => Box::new(SystemClock::new()),
        };

        Ok(Self {
            window: None,
            render_system: None,
            context,
            scheduler: FrameScheduler::new(clock),
            camera: CameraSystem::new(&render_config),
            audio,
            render_config,
            recording_config,
        })
    }
}

/// Open the requested audio source and connect it to the analyser.
///
/// Failures are logged and leave the analyser disconnected, so the cloud
/// just idles.
fn open_audio(
    args: &Args,
    config: &AnalyserConfig,
    recording: Option<&RecordingConfig>,
    analyser: &mut FrequencyAnalyser,
) -> Option<AudioSystem> {
    if let (Some(path), Some(recording)) = (&args.audio, recording) {
        if let Err(e) = open_offline(path, config, recording, analyser) {
            warn!("Audio unavailable, recording without it: {}", e);
        }
        return None;
    }

    let tap = SpectrumTap::new(config.fft_size);
    let result = match (&args.audio, args.input) {
        (Some(path), _) => AudioSystem::from_file(path, tap.clone()),
        (None, true) => {
            if recording.is_some() {
                warn!("Live input follows the wall clock; recorded frames will drift from it");
            }
            AudioSystem::from_default_input(tap.clone())
        }
        (None, false) => {
            info!("No audio source given (use --audio FILE or --input)");
            return None;
        }
    };

    match result {
        Ok(audio) => {
            info!("Audio: {}", audio.description());
            analyser.connect(Box::new(ByteSpectrum::new(tap, config)));
            Some(audio)
        }
        Err(e) => {
            warn!("Audio unavailable, running without it: {}", e);
            None
        }
    }
}

/// Recording with a file: analyse the track at frame times and write its soundtrack
fn open_offline(
    path: &Path,
    config: &AnalyserConfig,
    recording: &RecordingConfig,
    analyser: &mut FrequencyAnalyser,
) -> anyhow::Result<()> {
    let track = DecodedTrack::open(path)
        .with_context(|| format!("failed to decode {}", path.display()))?;

    track
        .write_wav(&recording.audio_path(), recording.duration_secs)
        .context("failed to write soundtrack")?;
    info!(
        "Soundtrack: {} ({:.1}s)",
        recording.audio_path().display(),
        recording.duration_secs
    );

    analyser.connect(Box::new(TrackSpectrum::new(&track, config)));
    Ok(())
}

impl ApplicationHandler for App {
    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return; // Already initialized
        }

        // Create window
        let window_attributes = Window::default_attributes()
            .with_title("Pulsefield")
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.render_config.window_width,
                self.render_config.window_height,
            ));

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        // Initialize rendering system
        let render_system = match pollster::block_on(RenderSystem::new(
            Arc::clone(&window),
            self.context.field().instances(),
            self.recording_config.clone(),
        )) {
            Ok(render_system) => render_system,
            Err(e) => {
                error!("Failed to initialize renderer: {}", e);
                event_loop.exit();
                return;
            }
        };

        info!("Pulsefield is running!");
        info!("1/2/3: idle/spiral/waves, B: background, Space: play/pause, Esc: quit");

        self.window = Some(window);
        self.render_system = Some(render_system);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(render_system) = &mut self.render_system {
                    render_system.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(key),
                        repeat: false,
                        ..
                    },
                ..
            } => self.handle_key(event_loop, key),
            WindowEvent::RedrawRequested => {
                self.render_frame(event_loop);
            }
            _ => {}
        }
    }
}

impl App {
    fn handle_key(&mut self, event_loop: &ActiveEventLoop, key: KeyCode) {
        match key {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::Digit1 => self.select_pattern(PatternMode::Idle),
            KeyCode::Digit2 => self.select_pattern(PatternMode::Spiral),
            KeyCode::Digit3 => self.select_pattern(PatternMode::Waves),
            KeyCode::KeyB => {
                let background = self.context.cycle_background();
                info!("Background: {}", background);
            }
            KeyCode::Space => match &self.audio {
                Some(audio) => {
                    let playing = audio.toggle();
                    info!("Audio {}", if playing { "playing" } else { "paused" });
                }
                None => info!("No audio source to toggle"),
            },
            _ => {}
        }
    }

    fn select_pattern(&mut self, pattern: PatternMode) {
        if self.context.pattern() != pattern {
            self.context.set_pattern(pattern);
            info!("Pattern: {}", pattern);
        }
    }

    /// Advance the visuals one frame and draw them
    fn render_frame(&mut self, event_loop: &ActiveEventLoop) {
        let Some(ref render_system) = self.render_system else {
            return;
        };

        if let Some(ref config) = self.recording_config {
            if self.scheduler.frame_index() as usize >= config.total_frames() {
                info!("Recording complete: {} frames", config.total_frames());
                event_loop.exit();
                return;
            }
        }

        let frame_num = self.scheduler.frame_index() as usize;
        let output = self.scheduler.tick(&mut self.context);

        // Upload particle instances
        render_system.update_instances(self.context.field().instances());

        // Update particle uniforms
        let uniforms = rendering::particle_uniforms(
            self.camera.view_matrix(),
            self.camera.projection_matrix(render_system.aspect_ratio()),
            output.model,
            output.point_size,
            self.camera.sprite_scale(),
            &self.render_config,
        );
        render_system.update_particle_uniforms(&uniforms);

        // Update background uniforms
        let background = rendering::background_uniforms(
            output.background,
            render_system.aspect_ratio(),
            &self.render_config,
        );
        render_system.update_background_uniforms(&background);

        // Render
        match render_system.render(frame_num) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                render_system.reconfigure();
            }
            Err(e) => error!("Render error: {:?}", e),
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!("Pulsefield - audio-reactive particle visualizer");
    info!("Initializing systems...");

    let mut app = App::new(&args)?;
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop
        .run_app(&mut app)
        .context("event loop terminated with an error")?;

    Ok(())
}
