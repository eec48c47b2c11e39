use crate::buffer::passes::RenderPassDescriptor;
use crate::engine::scene::SceneSnapshot;
use crate::engine::session::RenderEngine;
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::framebuffer::backplate::Backplate;
use crate::framebuffer::sink::HostFrameBuffer;
use crate::session::adapter::RenderSessionAdapter;
use crate::session::config::RenderConfig;
use crate::session::host::SceneTranslator;
use crate::stereo::layout::StereoEye;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Minimum time between two copy-backs while refining.
pub const INTERACTIVE_COPY_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle state of an [`InteractiveSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// Translate the host scene.
    ReadyToTranslate,
    /// Translate a second time to settle dependent host data.
    Retranslate,
    /// Tear down the previous render session.
    PrepareForBuild,
    /// Build camera, environment, lights and integrator settings.
    BuildStage1,
    /// Build geometry.
    BuildStage2,
    /// Attach the backplate.
    BuildStage3,
    /// Queue textures that need baking.
    ReadyToBake,
    /// Bake one iteration per tick, then start rendering.
    Baking,
    /// Poll, copy back and watch for scene edits.
    Rendering,
    /// Tear down and start over.
    Aborting,
    /// Render finished; wait for the next scene edit.
    Complete,
}

/// Continuously refreshed viewport render, advanced one step per host update tick.
pub struct InteractiveSession<S: SceneTranslator> {
    engine: Arc<dyn RenderEngine>,
    translator: S,
    pending: RenderConfig,
    frozen: Arc<RenderConfig>,

    state: SessionState,
    scene: Option<SceneSnapshot>,
    backplate: Option<Backplate>,
    adapter: Option<RenderSessionAdapter>,

    last_copy: Option<Instant>,
    copies: u64,
    last_error: Option<String>,
}

impl<S: SceneTranslator> InteractiveSession<S> {
    /// Session over `engine` and `translator`, starting in [`SessionState::ReadyToTranslate`].
    pub fn new(engine: Arc<dyn RenderEngine>, translator: S, config: RenderConfig) -> Self {
        let frozen = Arc::new(config.clone());
        Self {
            engine,
            translator,
            pending: config,
            frozen,
            state: SessionState::ReadyToTranslate,
            scene: None,
            backplate: None,
            adapter: None,
            last_copy: None,
            copies: 0,
            last_error: None,
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Replace the configuration. The running job keeps its frozen copy; the new one applies
    /// from the next translation.
    pub fn update_config(&mut self, config: RenderConfig) {
        self.pending = config;
    }

    /// Configuration of the current job.
    pub fn active_config(&self) -> &RenderConfig {
        &self.frozen
    }

    /// Host translator.
    pub fn translator(&self) -> &S {
        &self.translator
    }

    /// Mutable host translator, for scene edits.
    pub fn translator_mut(&mut self) -> &mut S {
        &mut self.translator
    }

    /// Live render session, while rendering or complete.
    pub fn adapter(&self) -> Option<&RenderSessionAdapter> {
        self.adapter.as_ref()
    }

    /// Copy-backs delivered to the host so far.
    pub fn copies(&self) -> u64 {
        self.copies
    }

    /// Message of the last failure that aborted a build or render.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// [`tick_at`](Self::tick_at) with the current time.
    pub fn tick(&mut self, host: &mut dyn HostFrameBuffer) -> bool {
        self.tick_at(Instant::now(), host)
    }

    /// Advance the state machine by one step. Returns `true` when rendering is done for this
    /// cycle.
    pub fn tick_at(&mut self, now: Instant, host: &mut dyn HostFrameBuffer) -> bool {
        let before = self.state;
        let done = match self.step(now, host) {
            Ok(done) => done,
            Err(err) => {
                tracing::error!(state = ?before, %err, "interactive render aborted");
                self.last_error = Some(err.to_string());
                if let Some(adapter) = self.adapter.as_mut() {
                    adapter.end_session_thread();
                }
                self.state = SessionState::Aborting;
                false
            }
        };
        if self.state != before {
            tracing::debug!(from = ?before, to = ?self.state, "interactive state change");
        }
        done
    }

    fn step(&mut self, now: Instant, host: &mut dyn HostFrameBuffer) -> BridgeResult<bool> {
        match self.state {
            SessionState::ReadyToTranslate => {
                self.frozen = Arc::new(self.pending.clone());
                self.frozen.validate()?;
                self.translator.translate(&self.frozen)?;
                self.state = SessionState::Retranslate;
            }
            SessionState::Retranslate => {
                self.translator.translate(&self.frozen)?;
                self.state = SessionState::PrepareForBuild;
            }
            SessionState::PrepareForBuild => {
                self.adapter = None;
                self.scene = None;
                self.state = SessionState::BuildStage1;
            }
            SessionState::BuildStage1 => {
                let device = self
                    .engine
                    .resolve_device(self.frozen.device.as_deref())
                    .ok_or_else(|| no_device(&self.frozen))?;
                let camera = self.translator.camera(&self.frozen)?;
                let mut scene = SceneSnapshot::new(device, camera);
                scene.motion_times = self.frozen.motion_blur.sample_times();
                self.translator.build_scene(&mut scene)?;
                self.scene = Some(scene);
                self.state = SessionState::BuildStage2;
            }
            SessionState::BuildStage2 => {
                let scene = self
                    .scene
                    .as_mut()
                    .ok_or_else(|| BridgeError::engine("geometry build without a scene"))?;
                self.translator.build_geometry(scene)?;
                self.state = SessionState::BuildStage3;
            }
            SessionState::BuildStage3 => {
                self.backplate = match self.translator.backplate(&self.frozen) {
                    Ok(bp) => bp,
                    Err(err) => {
                        tracing::warn!(%err, "backplate unavailable, rendering without it");
                        None
                    }
                };
                self.state = SessionState::ReadyToBake;
            }
            SessionState::ReadyToBake => {
                let queued = self.translator.queue_bakes();
                tracing::debug!(queued, "textures queued for baking");
                self.state = SessionState::Baking;
            }
            SessionState::Baking => {
                if self.translator.bake_step() {
                    self.start_render()?;
                    self.state = SessionState::Rendering;
                }
            }
            SessionState::Rendering => return self.poll_render(now, host),
            SessionState::Aborting => {
                self.adapter = None;
                self.scene = None;
                self.state = SessionState::ReadyToTranslate;
            }
            SessionState::Complete => {
                if !self.translator.scene_changed() {
                    return Ok(true);
                }
                if let Some(adapter) = self.adapter.as_mut() {
                    adapter.end_session_thread();
                }
                self.adapter = None;
                self.state = SessionState::ReadyToTranslate;
            }
        }
        Ok(false)
    }

    fn start_render(&mut self) -> BridgeResult<()> {
        let scene = self
            .scene
            .take()
            .ok_or_else(|| BridgeError::engine("render start without a scene"))?;

        let mut passes = self.frozen.pass_descriptors();
        merge_render_elements(&mut passes, self.translator.render_elements());

        let mut adapter = RenderSessionAdapter::new(
            self.engine.as_ref(),
            Arc::new(scene),
            Arc::clone(&self.frozen),
            passes,
        )?;
        adapter.set_backplate_bitmap(self.backplate.take());
        // The viewport never renders stereo.
        adapter.set_stereo_eye(StereoEye::Mono);
        let params = adapter.buffer_params();
        adapter.reset_and_cache(params, self.frozen.samples);
        adapter.start(0)?;

        self.adapter = Some(adapter);
        self.last_copy = None;
        Ok(())
    }

    fn poll_render(&mut self, now: Instant, host: &mut dyn HostFrameBuffer) -> BridgeResult<bool> {
        let adapter = self
            .adapter
            .as_mut()
            .ok_or_else(|| BridgeError::engine("rendering without a session"))?;
        adapter.process_events()?;
        let progress = adapter.progress();

        if self.translator.scene_changed() {
            tracing::debug!("scene changed, restarting interactive render");
            adapter.end_session_thread();
            self.state = SessionState::Aborting;
            return Ok(false);
        }

        if progress.complete {
            adapter.wait_for_session_end()?;
            adapter.copy_accum_buffer(host, true)?;
            self.copies += 1;
            if progress.errored {
                tracing::error!(message = %progress.error_message, "engine reported a render error");
                self.last_error = Some(progress.error_message);
            }
            self.state = SessionState::Complete;
            return Ok(true);
        }

        let due = match self.last_copy {
            None => true,
            Some(last) => {
                now.saturating_duration_since(last) >= INTERACTIVE_COPY_INTERVAL
                    && progress.samples_rendered > 1
            }
        };
        if due {
            adapter.copy_accum_buffer(host, false)?;
            self.copies += 1;
            self.last_copy = Some(now);
        }
        Ok(false)
    }
}

impl<S: SceneTranslator> Drop for InteractiveSession<S> {
    fn drop(&mut self) {
        if let Some(adapter) = self.adapter.as_mut() {
            adapter.end_session_thread();
        }
    }
}

pub(crate) fn no_device(config: &RenderConfig) -> BridgeError {
    match &config.device {
        Some(name) => BridgeError::device(format!("render device \"{name}\" is not available")),
        None => BridgeError::device("engine offers no render device"),
    }
}

/// Append host render elements whose names are not configured already.
pub(crate) fn merge_render_elements(
    passes: &mut Vec<RenderPassDescriptor>,
    elements: Vec<RenderPassDescriptor>,
) {
    for el in elements {
        if el.is_combined() || passes.iter().any(|p| p.name == el.name) {
            continue;
        }
        passes.push(el);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/interactive.rs"]
mod tests;
