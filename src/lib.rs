//! tracebridge connects a host 3D application to a tile-based path tracer.
//!
//! The crate owns the render-session side of the bridge:
//!
//! - A multi-pass [`AccumulationBuffer`] that engine tiles are composited into, with stereo
//!   placement and anaglyph channel masking
//! - A [`RenderSessionAdapter`] wrapping one engine session and its buffer
//! - Copy-back to a [`HostFrameBuffer`] with tone mapping and backplates
//! - The [`InteractiveSession`] state machine and the [`OfflineRender`] job driver
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Accumulation buffer, tile compositing and highlighting.
pub mod buffer;
/// Render engine contracts and the built-in procedural engine.
pub mod engine;
/// Host framebuffer copy-back.
pub mod framebuffer;
/// Session orchestration.
pub mod session;
/// Stereoscopic layouts.
pub mod stereo;

pub use crate::foundation::core::{Point2D, Rect2D, Rgba};
pub use crate::foundation::error::{BridgeError, BridgeResult};

pub use crate::buffer::accum::{AccumulationBuffer, PassView, PassViewMut};
pub use crate::buffer::compositor::{TilePlacement, TileRect, TileSource};
pub use crate::buffer::highlight::TileHighlightColorAssigner;
pub use crate::buffer::passes::{COMBINED_PASS_NAME, PassKind, RenderPassDescriptor};
pub use crate::engine::event::{CancelToken, TileEvent, TileEventKind, TilePass};
pub use crate::engine::procedural::{ProceduralEngine, ProceduralEngineOpts};
pub use crate::engine::progress::RenderJobProgress;
pub use crate::engine::scene::{CameraParams, SceneObject, SceneSnapshot};
pub use crate::engine::session::{BufferParams, EngineSession, RenderDevice, RenderEngine};
pub use crate::framebuffer::backplate::Backplate;
pub use crate::framebuffer::reader::{AccumBufferReader, ConstantColorReader, FrameBufferReader};
pub use crate::framebuffer::sink::{HostFrameBuffer, InMemoryFrameBuffer, PassSink};
pub use crate::framebuffer::tonemap::{ToneMapConfig, ToneMapOperator, ToneMapper};
pub use crate::session::adapter::RenderSessionAdapter;
pub use crate::session::config::{MotionBlur, RenderConfig};
pub use crate::session::host::{
    NullMonitor, RenderMonitor, SceneTranslator, StaticSceneTranslator,
};
pub use crate::session::interactive::{InteractiveSession, SessionState};
pub use crate::session::offline::{FrameOutcome, OfflineRender, RenderStats, render_frame};
pub use crate::session::timer::BufferUpdateTimer;
pub use crate::stereo::layout::{AnaglyphMode, ResolutionPair, StereoEye, StereoLayout};
