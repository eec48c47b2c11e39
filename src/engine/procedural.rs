//! Built-in reference engine.
//!
//! Renders a screen-space disc scene tile by tile on its own worker thread, publishing tile
//! events and status lines in the same shape an external path tracer does. Per-tile shading
//! fans out over rayon.

use crate::buffer::compositor::TileRect;
use crate::buffer::passes::{PassKind, RenderPassDescriptor};
use crate::engine::event::{CancelToken, TileEvent, TileEventKind, TileEventSender, TilePass};
use crate::engine::scene::{SceneObject, SceneSnapshot};
use crate::engine::session::{BufferParams, EngineSession, RenderDevice, RenderEngine};
use crate::foundation::core::{Rect2D, Rgba};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::stereo::layout::StereoEye;
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

const BACKGROUND_DEPTH: f32 = 1.0e4;

/// Options for [`ProceduralEngine`].
#[derive(Clone, Debug)]
pub struct ProceduralEngineOpts {
    /// Devices the engine offers; the first one is the default.
    pub devices: Vec<RenderDevice>,
    /// Sleep after every tile, to make progressive refinement observable.
    pub tile_delay: Duration,
    /// Stop with an engine error when this sample is reached.
    pub fail_at_sample: Option<u32>,
}

impl Default for ProceduralEngineOpts {
    fn default() -> Self {
        Self {
            devices: vec![RenderDevice {
                name: "CPU".to_string(),
                threads: rayon::current_num_threads(),
            }],
            tile_delay: Duration::ZERO,
            fail_at_sample: None,
        }
    }
}

/// Reference [`RenderEngine`] backed by a procedural disc renderer.
#[derive(Clone, Debug, Default)]
pub struct ProceduralEngine {
    opts: ProceduralEngineOpts,
}

impl ProceduralEngine {
    /// Engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with explicit options.
    pub fn with_opts(opts: ProceduralEngineOpts) -> Self {
        Self { opts }
    }
}

impl RenderEngine for ProceduralEngine {
    fn name(&self) -> &str {
        "procedural"
    }

    fn resolve_device(&self, requested: Option<&str>) -> Option<RenderDevice> {
        match requested {
            None => self.opts.devices.first().cloned(),
            Some(name) => self
                .opts
                .devices
                .iter()
                .find(|d| d.name.eq_ignore_ascii_case(name))
                .cloned(),
        }
    }

    fn create_session(
        &self,
        scene: Arc<SceneSnapshot>,
        events: TileEventSender,
    ) -> BridgeResult<Box<dyn EngineSession>> {
        Ok(Box::new(ProceduralSession::new(
            scene,
            events,
            self.opts.clone(),
        )))
    }
}

#[derive(Default)]
struct Shared {
    status: Mutex<String>,
    running: AtomicBool,
}

impl Shared {
    fn set_status(&self, s: impl Into<String>) {
        *self.status.lock() = s.into();
    }
}

// Clears `running` when the worker exits, even by panic.
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::Release);
    }
}

/// Session of the [`ProceduralEngine`].
pub struct ProceduralSession {
    scene: Arc<SceneSnapshot>,
    events: TileEventSender,
    opts: ProceduralEngineOpts,

    params: Option<BufferParams>,
    samples: u32,
    eye: StereoEye,
    transparent: bool,

    shared: Arc<Shared>,
    cancel: Option<CancelToken>,
    worker: Option<JoinHandle<()>>,
}

impl ProceduralSession {
    fn new(scene: Arc<SceneSnapshot>, events: TileEventSender, opts: ProceduralEngineOpts) -> Self {
        Self {
            scene,
            events,
            opts,
            params: None,
            samples: 1,
            eye: StereoEye::Mono,
            transparent: false,
            shared: Arc::new(Shared::default()),
            cancel: None,
            worker: None,
        }
    }
}

impl EngineSession for ProceduralSession {
    fn reset(&mut self, params: &BufferParams, samples: u32) {
        if self.is_running() {
            tracing::warn!("procedural session reset while running; applies to the next start");
        }
        self.params = Some(params.clone());
        self.samples = samples.max(1);
        self.shared.set_status("");
    }

    fn set_stereo_eye(&mut self, eye: StereoEye) {
        self.eye = eye;
    }

    fn set_transparent_background(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    fn start(&mut self, cancel: CancelToken) -> BridgeResult<()> {
        if self.is_running() {
            return Err(BridgeError::engine("session is already rendering"));
        }
        // Reap a worker that already finished.
        self.join();

        let params = self
            .params
            .clone()
            .ok_or_else(|| BridgeError::engine("session started before reset"))?;

        let job = WorkerJob {
            scene: Arc::clone(&self.scene),
            params,
            samples: self.samples,
            eye: self.eye,
            transparent: self.transparent,
            cancel: cancel.clone(),
            events: self.events.clone(),
            tile_delay: self.opts.tile_delay,
            fail_at_sample: self.opts.fail_at_sample,
        };

        self.shared.running.store(true, Ordering::Release);
        self.shared.set_status("Path Tracing Sample 0/0");
        let shared = Arc::clone(&self.shared);
        let handle = std::thread::Builder::new()
            .name("tracebridge-engine".to_string())
            .spawn(move || {
                let _guard = RunningGuard(Arc::clone(&shared));
                job.run(&shared);
            })
            .map_err(|e| {
                self.shared.running.store(false, Ordering::Release);
                BridgeError::engine(format!("failed to spawn engine worker: {e}"))
            })?;

        self.cancel = Some(cancel);
        self.worker = Some(handle);
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(cancel) = &self.cancel {
            cancel.cancel();
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    fn join(&mut self) {
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            tracing::error!("procedural engine worker panicked");
            self.shared.set_status("Cancel | error: engine worker panicked");
        }
    }

    fn status(&self) -> String {
        self.shared.status.lock().clone()
    }
}

impl Drop for ProceduralSession {
    fn drop(&mut self) {
        self.cancel();
        self.join();
    }
}

struct WorkerJob {
    scene: Arc<SceneSnapshot>,
    params: BufferParams,
    samples: u32,
    eye: StereoEye,
    transparent: bool,
    cancel: CancelToken,
    events: TileEventSender,
    tile_delay: Duration,
    fail_at_sample: Option<u32>,
}

enum Flow {
    Continue,
    Stop,
}

impl WorkerJob {
    fn run(&self, shared: &Shared) {
        let tiles = self.tiles();
        let n = tiles.len();
        let total = self.samples;
        tracing::debug!(tiles = n, samples = total, eye = ?self.eye, "engine worker started");

        if self.params.progressive {
            for sample in 1..=total {
                for (i, tile) in tiles.iter().enumerate() {
                    let kind = if sample == total {
                        TileEventKind::Final
                    } else {
                        TileEventKind::Partial
                    };
                    if let Flow::Stop = self.render_tile(shared, *tile, sample, kind) {
                        return;
                    }
                    shared.set_status(format!(
                        "Path Tracing Tile {}/{n}, Sample {sample}/{total}",
                        i + 1
                    ));
                }
                shared.set_status(format!("Path Tracing Sample {sample}/{total}"));
            }
        } else {
            for (i, tile) in tiles.iter().enumerate() {
                if let Flow::Stop = self.render_tile(shared, *tile, total, TileEventKind::Final) {
                    return;
                }
                shared.set_status(format!("Path Tracing Tile {}/{n}", i + 1));
            }
        }

        shared.set_status("Finished");
        tracing::debug!("engine worker finished");
    }

    fn render_tile(&self, shared: &Shared, tile: TileRect, sample: u32, kind: TileEventKind) -> Flow {
        if self.cancel.is_cancelled() {
            shared.set_status("Cancel");
            return Flow::Stop;
        }
        if self.fail_at_sample.is_some_and(|f| sample >= f) {
            shared.set_status(format!(
                "Cancel | Render error: injected failure at sample {sample}"
            ));
            return Flow::Stop;
        }

        let event = TileEvent {
            kind,
            tile,
            passes: self.shade_tile(tile, sample),
        };
        if self.events.send(event).is_err() {
            // Nobody is listening any more.
            shared.set_status("Cancel");
            return Flow::Stop;
        }
        if !self.tile_delay.is_zero() {
            std::thread::sleep(self.tile_delay);
        }
        Flow::Continue
    }

    // Tiles covering the crop region, bottom-up in render space.
    fn tiles(&self) -> Vec<TileRect> {
        let full = self.params.full;
        let region = self.params.region.intersect(&Rect2D::from_size(full));
        let ts = self.params.tile_size.max(1);
        let (w, h) = (region.width(), region.height());
        let y_base = full.y - region.end.y;

        let mut out = Vec::new();
        let mut ty = 0;
        while ty < h {
            let mut tx = 0;
            while tx < w {
                out.push(TileRect::new(
                    tx,
                    y_base + ty,
                    ts.min(w - tx),
                    ts.min(h - ty),
                ));
                tx += ts;
            }
            ty += ts;
        }
        out
    }

    fn shade_tile(&self, tile: TileRect, sample: u32) -> Vec<TilePass> {
        let full = self.params.full;
        let region_x = self.params.region.begin.x;
        let (tw, th) = (tile.width as usize, tile.height as usize);

        let shaded: Vec<Shaded> = (0..tw * th)
            .into_par_iter()
            .map(|i| {
                let (c, r) = ((i % tw) as i32, (i / tw) as i32);
                let px = region_x + tile.x + c;
                let py = full.y - 1 - (tile.y + r);
                self.shade(px, py, sample)
            })
            .collect();

        self.params
            .passes
            .iter()
            .map(|desc| pass_pixels(desc, &shaded))
            .collect()
    }

    fn shade(&self, px: i32, py: i32, sample: u32) -> Shaded {
        let full = self.params.full;
        let (w, h) = (full.x.max(1) as f32, full.y.max(1) as f32);
        let aspect = w / h;
        let u = (px as f32 + 0.5) / w;
        let v = (py as f32 + 0.5) / h;

        let scene = &self.scene;
        let sky = scene.environment * (1.0 - 0.5 * v);
        let background = if self.transparent {
            Rgba::TRANSPARENT
        } else {
            Rgba::new(sky.r, sky.g, sky.b, 1.0)
        };

        let parallax_sign = match self.eye {
            StereoEye::Mono => 0.0,
            StereoEye::Left => 1.0,
            StereoEye::Right => -1.0,
        };

        let mut best: Option<(&SceneObject, f32, [f32; 3])> = None;
        for obj in &scene.objects {
            let shift = parallax_sign * scene.camera.interocular / obj.depth.max(0.1);
            let mut hits = 0usize;
            let mut normal = [0.0f32; 3];
            for &t in &scene.motion_times {
                let cx = obj.center[0] + shift + obj.velocity[0] * t;
                let cy = obj.center[1] + obj.velocity[1] * t;
                let dx = (u - cx) * aspect / obj.radius.max(1e-4);
                let dy = (v - cy) / obj.radius.max(1e-4);
                let d2 = dx * dx + dy * dy;
                if d2 < 1.0 {
                    hits += 1;
                    normal = [dx, -dy, (1.0 - d2).sqrt()];
                }
            }
            if hits == 0 {
                continue;
            }
            let coverage = hits as f32 / scene.motion_times.len().max(1) as f32;
            if best.is_none_or(|(b, _, _)| obj.depth < b.depth) {
                best = Some((obj, coverage, normal));
            }
        }

        let noise = (hash01(px, py, sample) - 0.5) * 0.25 / sample as f32;
        match best {
            Some((obj, coverage, normal)) => {
                let lit = (0.35 + 0.65 * normal[2]) * scene.light_intensity;
                let surface = Rgba::new(
                    (obj.color.r * lit + noise).max(0.0),
                    (obj.color.g * lit + noise).max(0.0),
                    (obj.color.b * lit + noise).max(0.0),
                    1.0,
                );
                Shaded {
                    color: surface * coverage + background * (1.0 - coverage),
                    depth: obj.depth,
                    normal,
                    albedo: obj.color,
                    coverage,
                }
            }
            None => Shaded {
                color: background,
                depth: BACKGROUND_DEPTH,
                normal: [0.0, 0.0, 0.0],
                albedo: Rgba::TRANSPARENT,
                coverage: 0.0,
            },
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Shaded {
    color: Rgba,
    depth: f32,
    normal: [f32; 3],
    albedo: Rgba,
    coverage: f32,
}

fn pass_pixels(desc: &RenderPassDescriptor, shaded: &[Shaded]) -> TilePass {
    let channels = usize::from(desc.channels);
    let mut pixels = Vec::with_capacity(shaded.len() * channels);
    for s in shaded {
        let px: [f32; 4] = match desc.kind {
            PassKind::Combined => s.color.to_array(),
            PassKind::Depth => [s.depth; 4],
            PassKind::Normal => [s.normal[0], s.normal[1], s.normal[2], 1.0],
            PassKind::Albedo => s.albedo.to_array(),
            PassKind::Shadow => [1.0 - 0.5 * s.coverage; 4],
            PassKind::AmbientOcclusion => [1.0 - 0.25 * s.coverage; 4],
            PassKind::Emission | PassKind::Custom => [0.0, 0.0, 0.0, 1.0],
        };
        pixels.extend_from_slice(&px[..channels.min(4)]);
    }
    TilePass {
        name: desc.name.clone(),
        channels,
        pixels,
    }
}

// Deterministic per-pixel, per-sample value in [0, 1).
fn hash01(x: i32, y: i32, sample: u32) -> f32 {
    let mut h = (x as u32).wrapping_mul(0x8da6_b343)
        ^ (y as u32).wrapping_mul(0xd816_3841)
        ^ sample.wrapping_mul(0xcb1a_b31f);
    h ^= h >> 13;
    h = h.wrapping_mul(0x5bd1_e995);
    h ^= h >> 15;
    (h >> 8) as f32 / (1u32 << 24) as f32
}

#[cfg(test)]
#[path = "../../tests/unit/engine/procedural.rs"]
mod tests;
