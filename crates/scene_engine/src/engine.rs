//! Core engine implementation
//!
//! The [`Engine`] owns the scene, the resources and the render targets and
//! runs the single-threaded loop: poll events, handle each one, then update
//! the application, camera and scene before rendering and presenting.

use thiserror::Error;

use crate::application::{AppError, Application};
use crate::assets::ResourceManager;
use crate::config::ConfigError;
use crate::core::EngineConfig;
use crate::foundation::time::{FrameStats, Stopwatch, Timer};
use crate::input::{Event, EventBackend, InputMode, InputState, Keycode, MouseButton};
use crate::render::{
    HeadlessDevice, HeadlessRenderer, RenderStats, RenderTargetError, RenderTargetManager, SceneRenderer,
    TextureDevice,
};
use crate::scene::SceneManager;

/// Speed multiplier while left shift is held
const FAST_MOVE_SCALE: f32 = 4.0;

/// Engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// A subsystem failed before the loop started
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Render target setup failed
    #[error("Render target error: {0}")]
    RenderTarget(#[from] RenderTargetError),

    /// The application reported an error
    #[error("Application error: {0}")]
    Application(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingResize {
    width: u32,
    height: u32,
    deadline: f32,
}

/// Main engine struct
///
/// The engine coordinates all subsystems and drives the main loop.
pub struct Engine {
    config: EngineConfig,
    scene: SceneManager,
    resources: ResourceManager,
    render_targets: RenderTargetManager,
    renderer: Box<dyn SceneRenderer>,
    timer: Timer,
    frame_stats: FrameStats,
    last_render_stats: RenderStats,
    clock: f32,
    pending_resize: Option<PendingResize>,
    running: bool,
}

impl Engine {
    /// Create an engine with explicit GPU collaborators
    pub fn new(
        config: EngineConfig,
        device: Box<dyn TextureDevice>,
        renderer: Box<dyn SceneRenderer>,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!("Initializing engine...");
        Ok(Self {
            scene: SceneManager::new(&config.render),
            resources: ResourceManager::new(),
            render_targets: RenderTargetManager::new(device, &config.render),
            renderer,
            timer: Timer::new(),
            frame_stats: FrameStats::new(),
            last_render_stats: RenderStats::default(),
            clock: 0.0,
            pending_resize: None,
            running: false,
            config,
        })
    }

    /// Create an engine that renders without a GPU
    pub fn headless(config: EngineConfig) -> Result<Self, EngineError> {
        Self::new(config, Box::new(HeadlessDevice::new()), Box::new(HeadlessRenderer::new()))
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scene manager
    pub fn scene(&self) -> &SceneManager {
        &self.scene
    }

    /// Mutable scene manager
    pub fn scene_mut(&mut self) -> &mut SceneManager {
        &mut self.scene
    }

    /// Resource manager
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// Mutable resource manager
    pub fn resources_mut(&mut self) -> &mut ResourceManager {
        &mut self.resources
    }

    /// Scene and resources together, for opening saved scenes
    pub fn scene_and_resources(&mut self) -> (&mut SceneManager, &ResourceManager) {
        (&mut self.scene, &self.resources)
    }

    /// Render target manager
    pub fn render_targets(&self) -> &RenderTargetManager {
        &self.render_targets
    }

    /// Averaged frame statistics
    pub fn frame_stats(&self) -> &FrameStats {
        &self.frame_stats
    }

    /// Draw counts of the last rendered frame
    pub fn last_render_stats(&self) -> RenderStats {
        self.last_render_stats
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether a resize is waiting for its debounce delay
    pub fn is_resize_pending(&self) -> bool {
        self.pending_resize.is_some()
    }

    /// Request the loop to stop at the next iteration boundary
    pub fn close(&mut self) {
        self.running = false;
    }

    /// Open the window, build the render targets and an initial scene.
    ///
    /// Failures here keep the loop from ever starting.
    pub fn initialize(&mut self, backend: &mut dyn EventBackend) -> Result<(), EngineError> {
        let window = &self.config.window;
        backend.set_window_title(&window.title);
        backend
            .create_window(window.width, window.height, window.fullscreen)
            .map_err(|error| {
                log::error!("Backend initialization failed: {error}");
                EngineError::InitializationFailed(error.to_string())
            })?;

        let (width, height) = backend.size();
        self.render_targets.create_rendertargets(width, height)?;
        self.renderer.resize(width, height);

        if self.scene.state() == crate::scene::SceneState::Empty {
            self.scene.new_scene();
        }
        if let Some(camera) = self.scene.main_camera_mut() {
            camera.apply_config(&self.config.camera);
        }
        self.scene.update_camera_projection(None, Some(aspect_ratio(width, height)));
        self.timer = Timer::new();
        self.running = true;
        Ok(())
    }

    /// Run the main loop until the backend or the engine closes
    pub fn run<B: EventBackend, A: Application>(&mut self, backend: &mut B, app: &mut A) -> Result<(), EngineError> {
        self.initialize(backend)?;
        app.initialize(self)
            .map_err(|error| EngineError::Application(format!("App initialization: {error}")))?;

        log::info!("Starting main loop...");
        let mut result = Ok(());
        backend.run(|backend, events| {
            for event in &events {
                self.update_event(backend, event);
                app.handle_event(self, event);
            }
            if self.running {
                if let Err(error) = self.update(backend, app) {
                    result = Err(error);
                    self.running = false;
                }
            }
            if !self.running {
                backend.close();
            }
        });

        app.cleanup(self);
        backend.quit();
        log::info!("Engine shutdown complete");
        result
    }

    /// React to one host event
    pub fn update_event(&mut self, backend: &mut dyn EventBackend, event: &Event) {
        match event {
            Event::Quit => self.close(),
            Event::VideoResize { width, height } => {
                self.pending_resize = Some(PendingResize {
                    width: *width,
                    height: *height,
                    deadline: self.clock + self.config.frame.resize_debounce,
                });
            }
            Event::KeyUp { keycode } => self.handle_key_up(backend, *keycode),
            _ => {}
        }
    }

    fn handle_key_up(&mut self, backend: &mut dyn EventBackend, keycode: Keycode) {
        match (backend.input_mode(), keycode) {
            (InputMode::None, Keycode::Escape) => {
                if self.scene.selected_object().is_some() {
                    self.scene.set_selected_object(None);
                } else {
                    self.close();
                }
            }
            (InputMode::None, Keycode::Tab) => backend.toggle_mouse_grab(),
            (InputMode::None, Keycode::G) => {
                if self.scene.selected_object().is_some() {
                    backend.set_input_mode(InputMode::EditObjectTransform);
                }
            }
            (InputMode::None, Keycode::Delete) => self.scene.clear_actors(),
            (InputMode::EditObjectTransform | InputMode::GamePlay, Keycode::Escape) => {
                backend.set_input_mode(InputMode::None);
            }
            _ => {}
        }
    }

    /// Fly the main camera from the held keys and mouse movement
    pub fn update_camera(&mut self, input: &InputState, delta: f32) {
        let Some(camera) = self.scene.main_camera_mut() else {
            return;
        };
        let mut move_speed = camera.move_speed * delta;
        let mut pan_speed = camera.pan_speed * delta;
        let rotation_speed = camera.rotation_speed;
        if input.is_key_pressed(Keycode::LShift) {
            move_speed *= FAST_MOVE_SCALE;
            pan_speed *= FAST_MOVE_SCALE;
        }

        let mouse_delta = input.mouse_delta();
        let transform = &mut camera.transform;
        if input.is_button_pressed(MouseButton::Middle) {
            transform.move_left(-mouse_delta.x * pan_speed);
            transform.move_up(-mouse_delta.y * pan_speed);
        } else if input.is_button_pressed(MouseButton::Right) {
            transform.rotation_pitch(mouse_delta.y * rotation_speed);
            transform.rotation_yaw(-mouse_delta.x * rotation_speed);
        }

        if input.is_key_pressed(Keycode::Z) {
            transform.rotation_roll(-rotation_speed * delta);
        } else if input.is_key_pressed(Keycode::C) {
            transform.rotation_roll(rotation_speed * delta);
        }

        if input.is_key_pressed(Keycode::W) || input.wheel_up() {
            transform.move_front(-move_speed);
        } else if input.is_key_pressed(Keycode::S) || input.wheel_down() {
            transform.move_front(move_speed);
        }

        if input.is_key_pressed(Keycode::A) {
            transform.move_left(-move_speed);
        } else if input.is_key_pressed(Keycode::D) {
            transform.move_left(move_speed);
        }

        if input.is_key_pressed(Keycode::Q) {
            transform.move_up(-move_speed);
        } else if input.is_key_pressed(Keycode::E) {
            transform.move_up(move_speed);
        }

        if input.is_key_pressed(Keycode::Space) {
            transform.reset_transform();
        }
    }

    /// Advance one frame by wall-clock time.
    ///
    /// With vsync on, frames arriving faster than the target rate are
    /// skipped.
    pub fn update<A: Application>(&mut self, backend: &mut dyn EventBackend, app: &mut A) -> Result<(), EngineError> {
        let delta = self.timer.pending_delta();
        let limit_delta = 1.0 / self.config.frame.target_fps;
        if delta <= 0.0 || (self.config.window.vsync && delta < limit_delta) {
            return Ok(());
        }
        self.timer.update();
        self.advance_frame(backend, app, self.timer.delta_time())
    }

    /// Advance one frame by `delta` seconds
    pub fn advance_frame<A: Application>(
        &mut self,
        backend: &mut dyn EventBackend,
        app: &mut A,
        delta: f32,
    ) -> Result<(), EngineError> {
        self.clock += delta;
        let logic = Stopwatch::start_new();

        if let Some(resize) = self.pending_resize {
            if resize.deadline <= self.clock {
                self.pending_resize = None;
                self.resize(resize.width, resize.height);
            }
        }

        app.update(self, delta)?;

        if backend.input_mode() != InputMode::GamePlay {
            self.update_camera(backend.input(), delta);
        }
        self.scene.update_scene(delta);
        let logic_ms = logic.elapsed_millis();

        let render = Stopwatch::start_new();
        if self.pending_resize.is_none() {
            match self.renderer.render_scene(&self.scene, &mut self.render_targets) {
                Ok(stats) => self.last_render_stats = stats,
                Err(error) => log::error!("Render failed: {error}"),
            }
            backend.flip();
        }
        let render_ms = render.elapsed_millis();

        if self.frame_stats.record(delta, logic_ms, render_ms) {
            let stats = &self.frame_stats;
            log::debug!(
                "{:.2} fps, {:.2} ms (min {:.2}, max {:.2}), logic {:.2} ms, render {:.2} ms",
                stats.avg_fps,
                stats.avg_ms,
                stats.min_ms,
                stats.max_ms,
                stats.avg_logic_ms,
                stats.avg_render_ms
            );
        }
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        log::info!("Resize to {width}x{height}");
        if let Err(error) = self.render_targets.create_rendertargets(width, height) {
            log::error!("Failed to recreate render targets: {error}");
        }
        self.renderer.resize(width, height);
        self.scene.update_camera_projection(None, Some(aspect_ratio(width, height)));
    }
}

#[allow(clippy::cast_precision_loss)]
fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

impl From<AppError> for EngineError {
    fn from(error: AppError) -> Self {
        Self::Application(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HeadlessBackend;
    use crate::render::RenderTargetNames;
    use crate::scene::actor::tests::cube_model;
    use crate::scene::ActorSaveData;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct CountingApp {
        initialized: bool,
        updates: u32,
        events: u32,
        cleaned_up: bool,
    }

    impl Application for CountingApp {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            engine
                .scene_mut()
                .add_object_here(cube_model("box", 0, false));
            self.initialized = true;
            Ok(())
        }

        fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.updates += 1;
            Ok(())
        }

        fn handle_event(&mut self, _engine: &mut Engine, _event: &Event) {
            self.events += 1;
        }

        fn cleanup(&mut self, _engine: &mut Engine) {
            self.cleaned_up = true;
        }
    }

    fn config() -> EngineConfig {
        EngineConfig::new().with_window_size(640, 480).with_vsync(false)
    }

    fn started() -> (Engine, HeadlessBackend) {
        let mut engine = Engine::headless(config()).unwrap();
        let mut backend = HeadlessBackend::new();
        engine.initialize(&mut backend).unwrap();
        (engine, backend)
    }

    #[test]
    fn test_initialize_builds_targets_and_scene() {
        let (engine, backend) = started();
        assert_eq!(backend.title(), config().window.title);
        assert_eq!(engine.render_targets().size(), (640, 480));
        assert!(engine.render_targets().get_rendertarget(RenderTargetNames::BACKBUFFER).is_some());
        assert!(engine.scene().main_camera().is_some());
        assert_relative_eq!(engine.scene().main_camera().unwrap().aspect, 640.0 / 480.0);
        assert!(engine.is_running());
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = EngineConfig::new().with_window_size(0, 0);
        assert!(matches!(Engine::headless(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn test_quit_event_closes() {
        let (mut engine, mut backend) = started();
        engine.update_event(&mut backend, &Event::Quit);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_escape_releases_selection_then_closes() {
        let (mut engine, mut backend) = started();
        engine
            .scene_mut()
            .add_object(cube_model("box", 0, false), ActorSaveData::default());
        engine.scene_mut().set_selected_object(Some("box"));

        let escape = Event::KeyUp { keycode: Keycode::Escape };
        engine.update_event(&mut backend, &escape);
        assert_eq!(engine.scene().selected_object(), None);
        assert!(engine.is_running());
        engine.update_event(&mut backend, &escape);
        assert!(!engine.is_running());
    }

    #[test]
    fn test_tab_toggles_grab() {
        let (mut engine, mut backend) = started();
        engine.update_event(&mut backend, &Event::KeyUp { keycode: Keycode::Tab });
        assert!(backend.mouse_grab());
    }

    #[test]
    fn test_resize_is_debounced() {
        let (mut engine, mut backend) = started();
        let mut app = CountingApp::default();
        engine.update_event(&mut backend, &Event::VideoResize { width: 800, height: 600 });
        assert!(engine.is_resize_pending());

        engine.advance_frame(&mut backend, &mut app, 0.1).unwrap();
        assert!(engine.is_resize_pending());
        assert_eq!(engine.render_targets().size(), (640, 480));
        assert_eq!(backend.flipped_frames(), 0);

        engine.advance_frame(&mut backend, &mut app, 0.5).unwrap();
        assert!(!engine.is_resize_pending());
        assert_eq!(engine.render_targets().size(), (800, 600));
        assert_relative_eq!(engine.scene().main_camera().unwrap().aspect, 800.0 / 600.0);
        assert_eq!(backend.flipped_frames(), 1);
    }

    #[test]
    fn test_camera_moves_forward_with_w() {
        let (mut engine, _) = started();
        let mut input = InputState::new(640, 480);
        input.begin_tick();
        input.apply(&Event::KeyDown { keycode: Keycode::W });
        input.end_tick();

        let camera = engine.scene().main_camera().unwrap();
        let start = camera.transform.get_pos();
        let front = camera.transform.front();
        let speed = camera.move_speed;
        engine.update_camera(&input, 0.5);
        let moved = engine.scene().main_camera().unwrap().transform.get_pos();
        assert_relative_eq!(moved, start - front * speed * 0.5, epsilon = 1e-5);

        input.begin_tick();
        input.apply(&Event::KeyDown { keycode: Keycode::Space });
        input.end_tick();
        engine.update_camera(&input, 0.5);
        assert_relative_eq!(
            engine.scene().main_camera().unwrap().transform.get_pos(),
            crate::foundation::math::Vec3::zeros()
        );
    }

    #[test]
    fn test_run_until_frame_limit() {
        let mut engine = Engine::headless(config()).unwrap();
        let mut backend = HeadlessBackend::new().with_frame_limit(5);
        backend.push_frame(vec![Event::KeyDown { keycode: Keycode::D }]);
        let mut app = CountingApp::default();
        engine.run(&mut backend, &mut app).unwrap();

        assert!(app.initialized);
        assert!(app.cleaned_up);
        assert!(!engine.is_running());
        assert!(!backend.is_running());
        assert!(app.events >= 2);
        assert_eq!(engine.scene().actor_count(), 1);
    }
}
