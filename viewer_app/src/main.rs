//! Scene viewer
//!
//! Loads the mesh files and directories given on the command line, places
//! each model in front of the camera and flies around them.
//!
//! ```text
//! scene_viewer [--config engine.toml] [--scene scene.ron] [--frames N] <mesh|dir>...
//! ```
//!
//! Keys: WASD/QE move, right mouse looks, middle mouse pans, Tab grabs the
//! mouse, N selects the next actor, F focuses it, P toggles playback and
//! F5 writes the scene next to the binary as `saved_scene.ron`.

use std::path::PathBuf;

use scene_engine::prelude::*;
use scene_engine::scene::SceneState;
use clap::Parser;
use thiserror::Error;

const SAVED_SCENE: &str = "saved_scene.ron";

#[derive(Error, Debug)]
enum ViewerError {
    #[error(transparent)]
    Config(#[from] scene_engine::core::ConfigError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Command line arguments
#[derive(Parser, Debug, Default)]
#[command(name = "scene_viewer", about = "Load meshes into a scene and fly around them")]
struct Args {
    /// Engine configuration file (TOML or RON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Saved scene to open after loading the meshes
    #[arg(short, long, value_name = "FILE")]
    scene: Option<PathBuf>,

    /// Run headless for this many frames instead of opening a window
    #[arg(short, long, value_name = "N")]
    frames: Option<u64>,

    /// Mesh files or directories to load
    #[arg(value_name = "MESH")]
    inputs: Vec<PathBuf>,
}

struct Viewer {
    inputs: Vec<PathBuf>,
    scene: Option<PathBuf>,
    actors: Vec<ActorHandle>,
    selected: Option<usize>,
}

impl Viewer {
    fn new(args: &Args) -> Self {
        Self {
            inputs: args.inputs.clone(),
            scene: args.scene.clone(),
            actors: Vec::new(),
            selected: None,
        }
    }

    fn select_next(&mut self, engine: &mut Engine) {
        if self.actors.is_empty() {
            return;
        }
        let next = self.selected.map_or(0, |index| (index + 1) % self.actors.len());
        self.selected = Some(next);
        let name = engine.scene().actor(self.actors[next]).map(|actor| actor.name().to_string());
        engine.scene_mut().set_selected_object(name.as_deref());
    }

    fn toggle_playback(engine: &mut Engine) {
        let scene = engine.scene_mut();
        let result = if scene.state() == SceneState::Playing { scene.pause() } else { scene.play() };
        if let Err(error) = result {
            log::warn!("{error}");
        }
    }
}

impl Application for Viewer {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        for input in &self.inputs {
            let models = if input.is_dir() {
                engine.resources_mut().load_directory(input)?
            } else {
                vec![engine.resources_mut().load_mesh_file(input)?]
            };
            for model in models {
                log::info!("Placing {}", model.name());
                self.actors.push(engine.scene_mut().add_object_here(model));
            }
        }

        if let Some(path) = &self.scene {
            let data = SceneSaveData::load_from_file(path)?;
            let name = path
                .file_stem()
                .map_or_else(|| "scene".to_string(), |stem| stem.to_string_lossy().into_owned());
            let (scene, resources) = engine.scene_and_resources();
            scene.open_scene(name, &data, resources);
            self.actors = scene.actors().map(|(handle, _)| handle).collect();
        }

        engine.scene_mut().play()?;
        log::info!("Viewer ready with {} actors", engine.scene().actor_count());
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        self.actors.retain(|handle| engine.scene().actor(*handle).is_some());
        if self.selected.is_some_and(|index| index >= self.actors.len()) {
            self.selected = None;
        }
        Ok(())
    }

    fn handle_event(&mut self, engine: &mut Engine, event: &Event) {
        let Event::KeyUp { keycode } = event else {
            return;
        };
        match keycode {
            Keycode::N => self.select_next(engine),
            Keycode::F => {
                if let Some(name) = engine.scene().selected_object().map(str::to_string) {
                    engine.scene_mut().set_object_focus(&name);
                }
            }
            Keycode::P => Self::toggle_playback(engine),
            Keycode::F5 => match engine.scene().save_data().save_to_file(SAVED_SCENE) {
                Ok(()) => log::info!("Saved scene to {SAVED_SCENE}"),
                Err(error) => log::error!("Failed to save scene: {error}"),
            },
            _ => {}
        }
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        log::info!("Closing viewer at {:.1} fps", engine.frame_stats().avg_fps);
    }
}

#[cfg(feature = "glfw")]
fn run_windowed(engine: &mut Engine, viewer: &mut Viewer) -> Result<(), EngineError> {
    let mut backend = scene_engine::input::GlfwBackend::new()
        .map_err(|error| EngineError::InitializationFailed(error.to_string()))?;
    engine.run(&mut backend, viewer)
}

#[cfg(not(feature = "glfw"))]
fn run_windowed(engine: &mut Engine, viewer: &mut Viewer) -> Result<(), EngineError> {
    log::warn!("Built without a window backend, running headless");
    engine.run(&mut HeadlessBackend::new().with_frame_limit(1), viewer)
}

fn run() -> Result<(), ViewerError> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default("engine.toml")?,
    };

    let mut engine = Engine::headless(config)?;
    let mut viewer = Viewer::new(&args);
    match args.frames {
        Some(frames) => engine.run(&mut HeadlessBackend::new().with_frame_limit(frames), &mut viewer)?,
        None => run_windowed(&mut engine, &mut viewer)?,
    }
    Ok(())
}

fn main() {
    scene_engine::foundation::logging::init();
    if let Err(error) = run() {
        log::error!("{error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("scene_viewer").chain(list.iter().copied()))
    }

    #[test]
    fn test_parse_args() {
        let parsed = args(&["--frames", "10", "cube.obj", "--scene", "demo.ron", "models"]).unwrap();
        assert_eq!(parsed.frames, Some(10));
        assert_eq!(parsed.scene, Some(PathBuf::from("demo.ron")));
        assert_eq!(parsed.inputs, vec![PathBuf::from("cube.obj"), PathBuf::from("models")]);
        assert!(parsed.config.is_none());
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(args(&["--config"]).is_err());
        assert!(args(&["--frames", "ten"]).is_err());
        assert!(args(&["--scnee", "demo.ron"]).is_err());
    }

    #[test]
    fn test_help_is_not_a_mesh_path() {
        let error = args(&["--help"]).unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_headless_run_without_inputs() {
        let mut engine = Engine::headless(EngineConfig::default().with_vsync(false)).unwrap();
        let mut viewer = Viewer::new(&Args::default());
        let mut backend = HeadlessBackend::new().with_frame_limit(3);
        engine.run(&mut backend, &mut viewer).unwrap();
        assert_eq!(engine.scene().state(), SceneState::Playing);
        assert_eq!(engine.scene().actor_count(), 0);
    }
}
