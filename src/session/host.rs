//! Host-application side of the bridge.

use crate::buffer::passes::RenderPassDescriptor;
use crate::engine::progress::RenderJobProgress;
use crate::engine::scene::{CameraParams, SceneObject, SceneSnapshot};
use crate::foundation::core::Rgba;
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::framebuffer::backplate::Backplate;
use crate::session::config::RenderConfig;

/// Turns the host scene graph into engine-side scene data.
///
/// The stages map onto the interactive build sequence: translate (twice), non-geometry build,
/// geometry build, backplate, then baking.
pub trait SceneTranslator {
    /// Translate or refresh the host scene snapshot.
    fn translate(&mut self, config: &RenderConfig) -> BridgeResult<()>;

    /// Derive camera parameters, failing with [`BridgeError::Camera`] when the host view has none.
    fn camera(&self, config: &RenderConfig) -> BridgeResult<CameraParams>;

    /// Fill in everything except geometry: environment, lights, integrator settings.
    fn build_scene(&self, scene: &mut SceneSnapshot) -> BridgeResult<()>;

    /// Fill in geometry.
    fn build_geometry(&self, scene: &mut SceneSnapshot) -> BridgeResult<()>;

    /// Backplate bitmap for this job, loaded from the configured path by default.
    fn backplate(&self, config: &RenderConfig) -> BridgeResult<Option<Backplate>> {
        config
            .backplate
            .as_deref()
            .map(Backplate::load)
            .transpose()
    }

    /// Queue textures that need baking and return how many were queued.
    fn queue_bakes(&mut self) -> usize {
        0
    }

    /// Advance baking by one iteration. Returns `true` once nothing is left to bake.
    fn bake_step(&mut self) -> bool {
        true
    }

    /// Return `true` when the scene changed since the host framebuffer was last updated.
    fn scene_changed(&self) -> bool {
        false
    }

    /// Host render elements, as extra pass descriptors with sinks.
    fn render_elements(&self) -> Vec<RenderPassDescriptor> {
        Vec::new()
    }
}

/// Host hooks polled by the offline render loop.
pub trait RenderMonitor {
    /// Return `true` once the user asked to stop the render.
    fn is_cancelled(&self) -> bool {
        false
    }

    /// Progress of eye `eye_index`, reported on every poll.
    fn on_progress(&mut self, _eye_index: u32, _progress: &RenderJobProgress) {}
}

/// Monitor that never cancels and ignores progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullMonitor;

impl RenderMonitor for NullMonitor {}

/// Translator over a fixed list of scene objects.
#[derive(Clone, Debug)]
pub struct StaticSceneTranslator {
    objects: Vec<SceneObject>,
    environment: Rgba,
    light_intensity: f32,
    camera: Option<CameraParams>,
    elements: Vec<RenderPassDescriptor>,
    bake_iterations: u32,
    bakes_left: u32,
    translations: usize,
    changed: bool,
}

impl StaticSceneTranslator {
    /// Translator for `objects` with a default camera.
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self {
            objects,
            environment: Rgba::new(0.45, 0.6, 0.85, 1.0),
            light_intensity: 1.0,
            camera: Some(CameraParams::default()),
            elements: Vec::new(),
            bake_iterations: 0,
            bakes_left: 0,
            translations: 0,
            changed: false,
        }
    }

    /// Three discs at different depths, with the front one moving.
    pub fn demo() -> Self {
        Self::new(vec![
            SceneObject {
                name: "back".to_string(),
                center: [0.3, 0.4],
                radius: 0.25,
                depth: 6.0,
                color: Rgba::new(0.2, 0.35, 0.9, 1.0),
                velocity: [0.0, 0.0],
            },
            SceneObject {
                name: "middle".to_string(),
                center: [0.65, 0.55],
                radius: 0.2,
                depth: 3.0,
                color: Rgba::new(0.9, 0.75, 0.2, 1.0),
                velocity: [0.0, 0.0],
            },
            SceneObject {
                name: "front".to_string(),
                center: [0.45, 0.7],
                radius: 0.12,
                depth: 1.5,
                color: Rgba::new(0.85, 0.15, 0.1, 1.0),
                velocity: [0.08, 0.0],
            },
        ])
    }

    /// Replace the camera; `None` makes camera derivation fail.
    pub fn with_camera(mut self, camera: Option<CameraParams>) -> Self {
        self.camera = camera;
        self
    }

    /// Pretend every translation leaves `n` bake iterations to run.
    pub fn with_bake_iterations(mut self, n: u32) -> Self {
        self.bake_iterations = n;
        self
    }

    /// Expose `element` as a host render element.
    pub fn with_render_element(mut self, element: RenderPassDescriptor) -> Self {
        self.elements.push(element);
        self
    }

    /// Flag the scene as edited; cleared by the next translation.
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    /// Number of translations performed.
    pub fn translations(&self) -> usize {
        self.translations
    }

    /// Scene objects.
    pub fn objects_mut(&mut self) -> &mut Vec<SceneObject> {
        &mut self.objects
    }
}

impl SceneTranslator for StaticSceneTranslator {
    fn translate(&mut self, _config: &RenderConfig) -> BridgeResult<()> {
        self.translations += 1;
        self.changed = false;
        Ok(())
    }

    fn camera(&self, _config: &RenderConfig) -> BridgeResult<CameraParams> {
        self.camera
            .ok_or_else(|| BridgeError::camera("scene has no active camera"))
    }

    fn build_scene(&self, scene: &mut SceneSnapshot) -> BridgeResult<()> {
        scene.environment = self.environment;
        scene.light_intensity = self.light_intensity;
        Ok(())
    }

    fn build_geometry(&self, scene: &mut SceneSnapshot) -> BridgeResult<()> {
        scene.objects = self.objects.clone();
        Ok(())
    }

    fn queue_bakes(&mut self) -> usize {
        self.bakes_left = self.bake_iterations;
        self.bakes_left as usize
    }

    fn bake_step(&mut self) -> bool {
        self.bakes_left = self.bakes_left.saturating_sub(1);
        self.bakes_left == 0
    }

    fn scene_changed(&self) -> bool {
        self.changed
    }

    fn render_elements(&self) -> Vec<RenderPassDescriptor> {
        self.elements.clone()
    }
}
