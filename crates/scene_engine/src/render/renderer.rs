//! Scene renderer
//!
//! The core loop hands the updated [`SceneManager`] and the render target
//! manager to a [`SceneRenderer`] once per frame. [`HeadlessRenderer`] walks
//! the same passes without a GPU: it resolves the targets each pass writes,
//! counts the queued draws and demotes the shadow pass after repeated
//! failures.

use thiserror::Error;

use super::render_target::{RenderTargetError, RenderTargetManager, RenderTargetNames};
use crate::scene::SceneManager;

/// Consecutive shadow pass failures before the pass is disabled
const MAX_SHADOW_FAILURES: u32 = 3;

/// Rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A render target operation failed
    #[error("Render target error: {0}")]
    RenderTarget(#[from] RenderTargetError),

    /// A pass needs a target that does not exist
    #[error("Missing render target: {0}")]
    MissingTarget(String),
}

/// Draw counts of one frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Opaque draws, static and skinned
    pub solid_draws: usize,
    /// Translucent draws, static and skinned
    pub translucent_draws: usize,
    /// Shadow map draws
    pub shadow_draws: usize,
    /// Selection outline draws
    pub selected_draws: usize,
    /// Point lights submitted
    pub point_lights: usize,
    /// Temporary targets used by post-processing
    pub temporary_targets: usize,
}

impl RenderStats {
    /// Total draw calls
    pub fn draw_calls(&self) -> usize {
        self.solid_draws + self.translucent_draws + self.shadow_draws + self.selected_draws
    }
}

/// Draws an updated scene into the render targets
pub trait SceneRenderer {
    /// React to a new screen size; targets are already recreated
    fn resize(&mut self, width: u32, height: u32);

    /// Render one frame
    fn render_scene(
        &mut self,
        scene: &SceneManager,
        targets: &mut RenderTargetManager,
    ) -> Result<RenderStats, RenderError>;
}

/// Renderer that resolves targets and counts draws without a GPU
#[derive(Debug)]
pub struct HeadlessRenderer {
    width: u32,
    height: u32,
    shadow_enabled: bool,
    shadow_failures: u32,
    frame_count: u64,
    last_stats: RenderStats,
}

impl Default for HeadlessRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessRenderer {
    /// Create a renderer with every pass enabled
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            shadow_enabled: true,
            shadow_failures: 0,
            frame_count: 0,
            last_stats: RenderStats::default(),
        }
    }

    /// Screen size from the last resize
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the shadow pass still runs
    pub fn is_shadow_enabled(&self) -> bool {
        self.shadow_enabled
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Counts of the last rendered frame
    pub fn last_stats(&self) -> RenderStats {
        self.last_stats
    }

    fn render_shadow(&mut self, scene: &SceneManager, targets: &RenderTargetManager) -> usize {
        if !self.shadow_enabled {
            return 0;
        }
        if targets.get_rendertarget(RenderTargetNames::STATIC_SHADOWMAP).is_none() {
            self.shadow_failures += 1;
            log::error!("Shadow pass failed ({} in a row)", self.shadow_failures);
            if self.shadow_failures >= MAX_SHADOW_FAILURES {
                log::warn!("Shadow pass disabled");
                self.shadow_enabled = false;
            }
            return 0;
        }
        self.shadow_failures = 0;
        let queues = scene.render_queues();
        queues.static_shadow.len() + queues.skeleton_shadow.len()
    }

    fn render_bloom(targets: &mut RenderTargetManager) -> usize {
        let mut reference = RenderTargetNames::HDR.to_string();
        let mut used = 0;
        for level in 0..3 {
            let name = format!("BLOOM_DOWNSAMPLE_{level}");
            if targets.get_temporary(&name, &reference, 0.5).is_none() {
                break;
            }
            used += 1;
            reference = name;
        }
        used
    }
}

impl SceneRenderer for HeadlessRenderer {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        log::debug!("Renderer resized to {width}x{height}");
    }

    fn render_scene(
        &mut self,
        scene: &SceneManager,
        targets: &mut RenderTargetManager,
    ) -> Result<RenderStats, RenderError> {
        for required in [RenderTargetNames::BACKBUFFER, RenderTargetNames::HDR] {
            if targets.get_rendertarget(required).is_none() {
                return Err(RenderError::MissingTarget(required.to_string()));
            }
        }

        let shadow_draws = self.render_shadow(scene, targets);
        let queues = scene.render_queues();
        let temporary_targets = Self::render_bloom(targets);
        targets.clear_temporary();

        let stats = RenderStats {
            solid_draws: queues.static_solid.len() + queues.skeleton_solid.len(),
            translucent_draws: queues.static_translucent.len() + queues.skeleton_translucent.len(),
            shadow_draws,
            selected_draws: queues.selected.len(),
            point_lights: scene.point_light_count(),
            temporary_targets,
        };
        self.frame_count += 1;
        self.last_stats = stats;
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RenderConfig;
    use crate::render::device::HeadlessDevice;
    use crate::scene::actor::tests::cube_model;

    fn targets() -> RenderTargetManager {
        let mut targets = RenderTargetManager::new(Box::new(HeadlessDevice::new()), &RenderConfig::default());
        targets.create_rendertargets(640, 480).unwrap();
        targets
    }

    #[test]
    fn test_render_counts_queues() {
        let mut scene = SceneManager::default();
        scene.new_scene();
        scene.add_object_here(cube_model("box", 0, false));
        scene.add_object_here(cube_model("glass", 1, true));
        scene.update_scene(0.016);

        let mut targets = targets();
        let mut renderer = HeadlessRenderer::new();
        let stats = renderer.render_scene(&scene, &mut targets).unwrap();
        assert_eq!(stats.solid_draws, 1);
        assert_eq!(stats.translucent_draws, 1);
        assert_eq!(stats.temporary_targets, 3);
        assert_eq!(targets.temporary_count(), 0);
        assert_eq!(renderer.frame_count(), 1);
        assert_eq!(renderer.last_stats(), stats);
    }

    #[test]
    fn test_missing_backbuffer() {
        let scene = SceneManager::default();
        let mut targets = RenderTargetManager::new(Box::new(HeadlessDevice::new()), &RenderConfig::default());
        let mut renderer = HeadlessRenderer::new();
        assert_eq!(
            renderer.render_scene(&scene, &mut targets),
            Err(RenderError::MissingTarget(RenderTargetNames::BACKBUFFER.to_string()))
        );
    }

    #[test]
    fn test_shadow_pass_demoted_after_failures() {
        let mut scene = SceneManager::default();
        scene.new_scene();
        scene.update_scene(0.0);
        let mut targets = RenderTargetManager::new(Box::new(HeadlessDevice::new()), &RenderConfig::default());
        let desc = crate::render::RenderTargetDesc::texture_2d(64, 64, crate::render::InternalFormat::Rgba8);
        targets.create_rendertarget(RenderTargetNames::BACKBUFFER, desc.clone()).unwrap();
        targets.create_rendertarget(RenderTargetNames::HDR, desc).unwrap();

        let mut renderer = HeadlessRenderer::new();
        for _ in 0..MAX_SHADOW_FAILURES {
            assert!(renderer.is_shadow_enabled());
            renderer.render_scene(&scene, &mut targets).unwrap();
        }
        assert!(!renderer.is_shadow_enabled());
    }
}
