use crate::buffer::compositor::TileRect;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Whether a tile event carries refinable or final pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileEventKind {
    /// Partial result; more refinement of the same tile will follow.
    Partial,
    /// Final result; the tile will not be touched again this pass.
    Final,
}

/// Pixels of one pass for one tile.
#[derive(Clone, Debug, PartialEq)]
pub struct TilePass {
    /// Pass name, matched against the job's pass descriptors.
    pub name: String,
    /// Channels per pixel.
    pub channels: usize,
    /// Row-major pixels, bottom row first.
    pub pixels: Vec<f32>,
}

/// One tile update delivered by the engine worker.
#[derive(Clone, Debug, PartialEq)]
pub struct TileEvent {
    /// Partial or final.
    pub kind: TileEventKind,
    /// Tile placement in engine space.
    pub tile: TileRect,
    /// Per-pass pixel rows.
    pub passes: Vec<TilePass>,
}

impl TileEvent {
    /// Pixels for the pass called `name`, if the engine produced it.
    pub fn pass(&self, name: &str) -> Option<&TilePass> {
        self.passes.iter().find(|p| p.name == name)
    }
}

/// Sending half of the tile event queue, owned by the engine worker.
pub type TileEventSender = crossbeam_channel::Sender<TileEvent>;
/// Receiving half of the tile event queue, drained on the orchestration thread.
pub type TileEventReceiver = crossbeam_channel::Receiver<TileEvent>;

/// Create an unbounded tile event queue.
pub fn tile_event_channel() -> (TileEventSender, TileEventReceiver) {
    crossbeam_channel::unbounded()
}

/// Cooperative cancellation flag shared between the orchestrator and an engine worker.
///
/// The worker checks it at tile boundaries.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token in the "not cancelled" state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Return `true` once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
