use crate::buffer::passes::RenderPassDescriptor;
use crate::engine::event::{CancelToken, TileEventSender};
use crate::engine::scene::SceneSnapshot;
use crate::foundation::core::{Point2D, Rect2D};
use crate::foundation::error::BridgeResult;
use crate::stereo::layout::StereoEye;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Compute device the engine renders on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderDevice {
    /// Device name as reported by the engine.
    pub name: String,
    /// Worker threads the device uses.
    pub threads: usize,
}

/// Buffer layout a session renders into for one pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferParams {
    /// Full render resolution of one pass.
    pub full: Point2D,
    /// Crop region inside `full`, top-down.
    pub region: Rect2D,
    /// Passes the engine should produce.
    pub passes: Vec<RenderPassDescriptor>,
    /// Refine the whole frame sample by sample instead of finishing tiles one at a time.
    pub progressive: bool,
    /// Edge length of engine tiles.
    pub tile_size: i32,
}

/// One render-engine session.
///
/// Sessions run their work on engine-owned worker threads and publish tiles through the
/// [`TileEventSender`] they were created with.
pub trait EngineSession: Send {
    /// Reset the session for a new pass with `params` and `samples` samples per pixel.
    fn reset(&mut self, params: &BufferParams, samples: u32);

    /// Select the camera eye for the next pass.
    fn set_stereo_eye(&mut self, eye: StereoEye);

    /// Render the background as transparent (alpha 0) instead of opaque.
    fn set_transparent_background(&mut self, transparent: bool);

    /// Start rendering on the worker thread. The worker polls `cancel` between tiles.
    fn start(&mut self, cancel: CancelToken) -> BridgeResult<()>;

    /// Ask the worker to stop and wake anything it is blocked on. Does not wait.
    fn cancel(&mut self);

    /// Return `true` while the worker thread is alive.
    fn is_running(&self) -> bool;

    /// Block until the worker thread has exited and release its resources.
    fn join(&mut self);

    /// Free-text status line, decoded by [`RenderJobProgress::parse`](crate::RenderJobProgress::parse).
    fn status(&self) -> String;
}

/// Factory side of a render engine.
pub trait RenderEngine: Send + Sync {
    /// Engine name for logs.
    fn name(&self) -> &str;

    /// Resolve the requested device, or the default one when `requested` is `None`.
    fn resolve_device(&self, requested: Option<&str>) -> Option<RenderDevice>;

    /// Create a session for `scene` that publishes tiles to `events`.
    fn create_session(
        &self,
        scene: Arc<SceneSnapshot>,
        events: TileEventSender,
    ) -> BridgeResult<Box<dyn EngineSession>>;
}
