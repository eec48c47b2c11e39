//! Owner of one engine session and its accumulation buffer.
//!
//! Tile events are drained on the calling (orchestration) thread, so the buffer has a single
//! writer. Teardown still cancels and joins the engine worker before the buffer is released.

use crate::buffer::accum::AccumulationBuffer;
use crate::buffer::compositor::{
    TilePlacement, TileSource, copy_combined_tile, copy_pass_tile, eye_offset,
};
use crate::buffer::highlight::{TileHighlightColorAssigner, overlay_border};
use crate::buffer::passes::RenderPassDescriptor;
use crate::engine::event::{
    CancelToken, TileEvent, TileEventKind, TileEventReceiver, tile_event_channel,
};
use crate::engine::progress::RenderJobProgress;
use crate::engine::scene::SceneSnapshot;
use crate::engine::session::{BufferParams, EngineSession, RenderEngine};
use crate::foundation::core::{Rect2D, Rgba};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::framebuffer::backplate::Backplate;
use crate::framebuffer::reader::{AccumBufferReader, stream_to_host};
use crate::framebuffer::sink::HostFrameBuffer;
use crate::session::config::RenderConfig;
use crate::stereo::layout::{ResolutionPair, StereoEye};
use std::sync::Arc;

/// Wraps one engine session together with the accumulation buffer it renders into.
pub struct RenderSessionAdapter {
    config: Arc<RenderConfig>,
    resolution: ResolutionPair,
    region: Rect2D,
    passes: Vec<RenderPassDescriptor>,

    session: Box<dyn EngineSession>,
    events: TileEventReceiver,
    cancel: CancelToken,

    accum: Option<AccumulationBuffer>,
    highlight: Option<TileHighlightColorAssigner>,
    backplate: Option<Backplate>,
    eye_index: u32,
    cached: Option<(BufferParams, u32)>,

    tiles_composited: u64,
    tiles_dropped: u64,
    pass_fallbacks: u64,
}

impl RenderSessionAdapter {
    /// Create an engine session for `scene`. The buffer is allocated on the first
    /// [`start`](Self::start).
    pub fn new(
        engine: &dyn RenderEngine,
        scene: Arc<SceneSnapshot>,
        config: Arc<RenderConfig>,
        passes: Vec<RenderPassDescriptor>,
    ) -> BridgeResult<Self> {
        let (tx, rx) = tile_event_channel();
        let session = engine.create_session(scene, tx)?;
        let highlight = (config.highlight_tiles && config.progressive)
            .then(TileHighlightColorAssigner::new);
        tracing::debug!(engine = engine.name(), passes = passes.len(), "render session created");
        Ok(Self {
            resolution: config.resolution(),
            region: config.render_region(),
            config,
            passes,
            session,
            events: rx,
            cancel: CancelToken::new(),
            accum: None,
            highlight,
            backplate: None,
            eye_index: 0,
            cached: None,
            tiles_composited: 0,
            tiles_dropped: 0,
            pass_fallbacks: 0,
        })
    }

    /// Buffer parameters for one eye, derived from the frozen configuration.
    pub fn buffer_params(&self) -> BufferParams {
        BufferParams {
            full: self.resolution.render,
            region: self.region,
            passes: self.passes.clone(),
            progressive: self.config.progressive,
            tile_size: self.config.tile_size,
        }
    }

    /// Output and per-eye render resolution.
    pub fn get_render_resolution(&self) -> ResolutionPair {
        self.resolution
    }

    /// Set or clear the backplate composited on copy-back.
    pub fn set_backplate_bitmap(&mut self, backplate: Option<Backplate>) {
        self.backplate = backplate;
    }

    /// Select the camera eye for the next start.
    pub fn set_stereo_eye(&mut self, eye: StereoEye) {
        self.session.set_stereo_eye(eye);
    }

    /// Reset the engine session and remember the parameters for later eyes.
    pub fn reset_and_cache(&mut self, params: BufferParams, samples: u32) {
        self.session.reset(&params, samples);
        self.cached = Some((params, samples));
    }

    /// Reset the engine session with the parameters of the last
    /// [`reset_and_cache`](Self::reset_and_cache).
    pub fn reset_with_cache(&mut self) -> BridgeResult<()> {
        let (params, samples) = self
            .cached
            .as_ref()
            .ok_or_else(|| BridgeError::engine("no cached buffer parameters to reset with"))?;
        self.session.reset(params, *samples);
        Ok(())
    }

    /// Allocate the buffer on first use and start rendering eye `eye_index`.
    #[tracing::instrument(skip(self))]
    pub fn start(&mut self, eye_index: u32) -> BridgeResult<()> {
        if self.accum.is_none() {
            self.accum = Some(AccumulationBuffer::new(
                self.resolution.output,
                &self.passes,
            )?);
        }
        self.eye_index = eye_index;
        self.session
            .set_transparent_background(self.backplate.is_some());
        self.cancel = CancelToken::new();
        self.session.start(self.cancel.clone())
    }

    /// Signal the engine to stop without waiting for it or touching the buffer.
    pub fn end_session_thread(&mut self) {
        tracing::debug!("ending engine session thread");
        self.cancel.cancel();
        self.session.cancel();
    }

    /// Return `true` while the engine worker is alive.
    pub fn is_session_running(&self) -> bool {
        self.session.is_running()
    }

    /// Block until the engine worker exited, then composite whatever it queued last.
    #[tracing::instrument(skip(self))]
    pub fn wait_for_session_end(&mut self) -> BridgeResult<usize> {
        self.session.join();
        self.process_events()
    }

    /// Progress decoded from the engine status line.
    pub fn progress(&self) -> RenderJobProgress {
        RenderJobProgress::parse(&self.session.status())
    }

    /// Composite every queued tile event. Returns the number of events handled.
    pub fn process_events(&mut self) -> BridgeResult<usize> {
        let mut handled = 0;
        while let Ok(event) = self.events.try_recv() {
            self.composite(event)?;
            handled += 1;
        }
        Ok(handled)
    }

    fn composite(&mut self, event: TileEvent) -> BridgeResult<()> {
        let Some(accum) = self.accum.as_mut() else {
            return Err(BridgeError::engine("tile arrived before the session started"));
        };
        let placement = TilePlacement {
            resolution: self.resolution,
            tile: event.tile,
            region: self.region,
            layout: self.config.stereo,
            eye_index: self.eye_index,
        };

        for mut pass in event.passes {
            let known = accum.find_pass(&pass.name);
            let index = match known {
                Some(i) => i,
                None => {
                    self.pass_fallbacks += 1;
                    accum.resolve_pass(&pass.name)
                }
            };
            let mut dst = accum.pass_at_mut(index);

            // Fallback passes land in the combined pass but never get a border.
            if event.kind == TileEventKind::Partial
                && known == Some(0)
                && let Some(assigner) = &self.highlight
            {
                let color = assigner.color_for(event.tile.x, event.tile.y);
                overlay_border(
                    &mut pass.pixels,
                    event.tile.width.max(0) as usize,
                    event.tile.height.max(0) as usize,
                    color,
                );
            }

            let src = TileSource {
                channels: pass.channels,
                pixels: &pass.pixels,
            };
            let copied = if index == 0 {
                copy_combined_tile(&mut dst, src, &placement)
            } else {
                copy_pass_tile(&mut dst, src, &placement)
            };
            if let Err(err) = copied {
                self.tiles_dropped += 1;
                tracing::warn!(pass = %pass.name, tile = ?event.tile, %err, "dropping tile pass");
            }
        }
        self.tiles_composited += 1;
        Ok(())
    }

    /// Stream the current buffer to `host`, plus every auxiliary pass with a registered sink
    /// when `copy_all_passes` is set.
    ///
    /// Returns the number of colour pixels delivered.
    #[tracing::instrument(skip(self, host))]
    pub fn copy_accum_buffer(
        &mut self,
        host: &mut dyn HostFrameBuffer,
        copy_all_passes: bool,
    ) -> BridgeResult<usize> {
        self.process_events()?;
        let Some(accum) = self.accum.as_ref() else {
            return Ok(0);
        };

        let offset = eye_offset(self.config.stereo, self.eye_index, self.resolution);
        let mut region = self.region.translate(offset);
        if let Some(host_region) = host.region() {
            region = region.intersect(&host_region);
        }

        let reader = AccumBufferReader::new(accum.combined(), region, &self.config.tone_mapping)
            .with_backplate(self.backplate.as_ref());
        let written = stream_to_host(&reader, host)?;

        if copy_all_passes {
            for index in 1..accum.pass_count() {
                let view = accum.pass_at(index);
                let desc = view.descriptor();
                let key = desc.sink.as_deref().unwrap_or(&desc.name);
                let Some(sink) = host.pass_sink(key) else {
                    continue;
                };
                let x = region.begin.x.max(0) as usize;
                let width = region.width() as usize;
                for y in region.begin.y.max(0)..region.end.y {
                    if let Some(span) = view.span(y as usize, x, width) {
                        sink.put_row(y, x as i32, view.channels(), span)?;
                    }
                }
            }
        }
        Ok(written)
    }

    /// Accumulation buffer, once allocated.
    pub fn accum_buffer(&self) -> Option<&AccumulationBuffer> {
        self.accum.as_ref()
    }

    /// Tile events composited so far.
    pub fn tiles_composited(&self) -> u64 {
        self.tiles_composited
    }

    /// Tile passes that could not be placed.
    pub fn tiles_dropped(&self) -> u64 {
        self.tiles_dropped
    }

    /// Tile passes whose name was unknown and fell back to the combined pass.
    pub fn pass_fallbacks(&self) -> u64 {
        self.pass_fallbacks
    }

    /// Pixel of the combined pass at output coordinates, for diagnostics.
    pub fn combined_pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        self.accum.as_ref()?.combined().rgba(x, y)
    }
}

impl Drop for RenderSessionAdapter {
    fn drop(&mut self) {
        self.end_session_thread();
        self.session.join();
        debug_assert!(!self.session.is_running());
        let discarded = self.events.try_iter().count();
        if discarded > 0 {
            tracing::debug!(discarded, "discarding tile events of a finished session");
        }
        drop(self.accum.take());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/adapter.rs"]
mod tests;
