use crate::engine::scene::SceneSnapshot;
use crate::engine::session::RenderEngine;
use crate::foundation::core::Rgba;
use crate::foundation::error::BridgeResult;
use crate::framebuffer::reader::{ConstantColorReader, stream_to_host};
use crate::framebuffer::sink::HostFrameBuffer;
use crate::session::adapter::RenderSessionAdapter;
use crate::session::config::RenderConfig;
use crate::session::host::{RenderMonitor, SceneTranslator};
use crate::session::interactive::{merge_render_elements, no_device};
use crate::session::timer::BufferUpdateTimer;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// How an offline frame ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Every eye rendered to completion.
    Completed,
    /// The host cancelled the render.
    Cancelled,
    /// The engine stopped with an error.
    EngineError(String),
    /// Translation failed; a constant error frame was written instead.
    Fallback(String),
}

/// Statistics of one offline frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Eyes that were started.
    pub eyes_rendered: u32,
    /// Copy-backs to the host, progress and final.
    pub copies: u64,
    /// Tile events composited.
    pub tiles_composited: u64,
    /// Pixels delivered by the final copy-back of the last eye.
    pub final_pixels: usize,
    /// Wall-clock time of the frame.
    pub elapsed: Duration,
}

/// Finite render job: translate once, then render every eye the stereo layout needs.
pub struct OfflineRender {
    engine: Arc<dyn RenderEngine>,
    config: Arc<RenderConfig>,
    adapter: Option<RenderSessionAdapter>,
    translate_error: Option<String>,
    frame_was_cancelled: bool,
    stats: RenderStats,
}

impl OfflineRender {
    /// Job over `engine`. The configuration is validated and frozen here.
    pub fn new(engine: Arc<dyn RenderEngine>, config: RenderConfig) -> BridgeResult<Self> {
        config.validate()?;
        Ok(Self {
            engine,
            config: Arc::new(config),
            adapter: None,
            translate_error: None,
            frame_was_cancelled: false,
            stats: RenderStats::default(),
        })
    }

    /// Frozen job configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Statistics of the last frame.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Return `true` when the last frame was cancelled by the host.
    pub fn frame_was_cancelled(&self) -> bool {
        self.frame_was_cancelled
    }

    /// Render session, once translated.
    pub fn adapter(&self) -> Option<&RenderSessionAdapter> {
        self.adapter.as_ref()
    }

    /// Build the full engine scene and its render session.
    ///
    /// On failure the error is remembered and [`run_frame`](Self::run_frame) writes the
    /// constant fallback frame.
    #[tracing::instrument(skip_all)]
    pub fn translate(&mut self, translator: &mut dyn SceneTranslator) -> BridgeResult<()> {
        self.adapter = None;
        self.translate_error = None;
        match self.build(translator) {
            Ok(adapter) => {
                self.adapter = Some(adapter);
                Ok(())
            }
            Err(err) => {
                tracing::error!(%err, "scene translation failed");
                self.translate_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn build(&self, translator: &mut dyn SceneTranslator) -> BridgeResult<RenderSessionAdapter> {
        let cfg = &self.config;
        translator.translate(cfg)?;
        let device = self
            .engine
            .resolve_device(cfg.device.as_deref())
            .ok_or_else(|| no_device(cfg))?;
        let camera = translator.camera(cfg)?;

        let mut scene = SceneSnapshot::new(device, camera);
        scene.motion_times = cfg.motion_blur.sample_times();
        translator.build_scene(&mut scene)?;
        translator.build_geometry(&mut scene)?;
        tracing::debug!(
            objects = scene.objects.len(),
            motion_samples = scene.motion_times.len(),
            "offline scene built"
        );

        let mut passes = cfg.pass_descriptors();
        merge_render_elements(&mut passes, translator.render_elements());

        let mut adapter = RenderSessionAdapter::new(
            self.engine.as_ref(),
            Arc::new(scene),
            Arc::clone(&self.config),
            passes,
        )?;
        adapter.set_backplate_bitmap(translator.backplate(cfg)?);
        Ok(adapter)
    }

    /// Render every eye into `host`, polling `monitor` for cancellation.
    #[tracing::instrument(skip_all)]
    pub fn run_frame(
        &mut self,
        host: &mut dyn HostFrameBuffer,
        monitor: &mut dyn RenderMonitor,
    ) -> BridgeResult<FrameOutcome> {
        let started = Instant::now();
        self.stats = RenderStats::default();
        self.frame_was_cancelled = false;

        let Some(adapter) = self.adapter.as_mut() else {
            let reason = self
                .translate_error
                .clone()
                .unwrap_or_else(|| "scene was not translated".to_string());
            tracing::error!(%reason, "writing error frame");
            let reader = ConstantColorReader::new(host.resolution(), Rgba::ERROR_RED);
            self.stats.final_pixels = stream_to_host(&reader, host)?;
            self.stats.copies = 1;
            self.stats.elapsed = started.elapsed();
            return Ok(FrameOutcome::Fallback(reason));
        };

        let cfg = &self.config;
        let mut outcome = FrameOutcome::Completed;
        for eye in 0..cfg.stereo.eye_count() {
            adapter.set_stereo_eye(cfg.stereo.camera_eye(eye, cfg.swap_eyes));
            if eye == 0 {
                let params = adapter.buffer_params();
                adapter.reset_and_cache(params, cfg.samples);
            } else {
                adapter.reset_with_cache()?;
            }
            adapter.start(eye)?;
            self.stats.eyes_rendered += 1;
            tracing::info!(eye, "rendering eye");

            let mut timer = BufferUpdateTimer::new();
            loop {
                adapter.process_events()?;
                let progress = adapter.progress();
                monitor.on_progress(eye, &progress);

                if progress.errored {
                    tracing::error!(
                        eye,
                        message = %progress.error_message,
                        "engine reported a render error"
                    );
                    outcome = FrameOutcome::EngineError(progress.error_message);
                    break;
                }
                if progress.complete {
                    break;
                }
                if monitor.is_cancelled() {
                    tracing::info!(eye, "render cancelled by host");
                    adapter.end_session_thread();
                    self.frame_was_cancelled = true;
                    outcome = FrameOutcome::Cancelled;
                    break;
                }
                if !adapter.is_session_running() {
                    break;
                }
                if timer.should_update() {
                    adapter.copy_accum_buffer(host, false)?;
                    self.stats.copies += 1;
                }
                std::thread::sleep(cfg.poll_interval());
            }

            adapter.wait_for_session_end()?;
            self.stats.final_pixels = adapter.copy_accum_buffer(host, true)?;
            self.stats.copies += 1;
            if outcome != FrameOutcome::Completed {
                break;
            }
        }

        adapter.wait_for_session_end()?;
        self.stats.tiles_composited = adapter.tiles_composited();
        self.stats.elapsed = started.elapsed();
        tracing::info!(?outcome, stats = ?self.stats, "offline frame done");
        Ok(outcome)
    }

    /// Stop any running engine work and release the render session.
    pub fn end_render(&mut self) {
        if let Some(mut adapter) = self.adapter.take() {
            adapter.end_session_thread();
        }
    }
}

impl Drop for OfflineRender {
    fn drop(&mut self) {
        self.end_render();
    }
}

/// Translate and render one frame, returning its outcome and statistics.
///
/// Translation failures are not errors here: they produce [`FrameOutcome::Fallback`].
pub fn render_frame(
    engine: Arc<dyn RenderEngine>,
    config: RenderConfig,
    translator: &mut dyn SceneTranslator,
    host: &mut dyn HostFrameBuffer,
    monitor: &mut dyn RenderMonitor,
) -> BridgeResult<(FrameOutcome, RenderStats)> {
    let mut job = OfflineRender::new(engine, config)?;
    if let Err(err) = job.translate(translator)
        && !err.is_setup_failure()
    {
        tracing::warn!(%err, "translation failed for a non-setup reason");
    }
    let outcome = job.run_frame(host, monitor)?;
    let stats = job.stats();
    job.end_render();
    Ok((outcome, stats))
}

#[cfg(test)]
#[path = "../../tests/unit/session/offline.rs"]
mod tests;
