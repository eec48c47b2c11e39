use crate::buffer::passes::RenderPassDescriptor;
use crate::engine::scene::motion_sample_times;
use crate::foundation::core::{Point2D, Rect2D};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::framebuffer::tonemap::ToneMapConfig;
use crate::stereo::layout::{ResolutionPair, StereoLayout, plan};
use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest number of motion-blur samples allowed on either side of the frame time.
pub const MAX_MOTION_SAMPLES: u32 = 64;

/// Motion-blur sampling around the frame time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionBlur {
    /// Samples taken before the frame time.
    pub before: u32,
    /// Samples taken after the frame time.
    pub after: u32,
    /// Shutter length in frames.
    pub shutter: f32,
}

impl Default for MotionBlur {
    fn default() -> Self {
        Self {
            before: 0,
            after: 0,
            shutter: 0.5,
        }
    }
}

impl MotionBlur {
    /// Sample times relative to the frame, sorted, always containing `0.0`.
    pub fn sample_times(&self) -> Vec<f32> {
        motion_sample_times(self.before, self.after, self.shutter)
    }
}

/// Render-job configuration.
///
/// Orchestrators take one by value and freeze a copy when a job starts, so later host edits
/// never reach a running job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Output width in pixels (both eyes for spatial stereo layouts).
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Stereoscopic layout.
    pub stereo: StereoLayout,
    /// Swap left and right cameras.
    pub swap_eyes: bool,
    /// Samples per pixel.
    pub samples: u32,
    /// Refine the whole frame progressively instead of tile by tile.
    pub progressive: bool,
    /// Outline in-flight tiles while refining.
    pub highlight_tiles: bool,
    /// Motion-blur sampling.
    pub motion_blur: MotionBlur,
    /// Crop region in render space, top-down.
    pub crop: Option<Rect2D>,
    /// Render device name; `None` picks the engine default.
    pub device: Option<String>,
    /// Engine tile edge length.
    pub tile_size: i32,
    /// Delay between status polls of the offline loop, in milliseconds.
    pub poll_interval_ms: u64,
    /// Tone mapping applied on copy-back.
    pub tone_mapping: ToneMapConfig,
    /// Backplate image composited behind the render.
    pub backplate: Option<PathBuf>,
    /// Auxiliary passes rendered next to the combined pass.
    pub passes: Vec<RenderPassDescriptor>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            stereo: StereoLayout::None,
            swap_eyes: false,
            samples: 16,
            progressive: true,
            highlight_tiles: false,
            motion_blur: MotionBlur::default(),
            crop: None,
            device: None,
            tile_size: 64,
            poll_interval_ms: 10,
            tone_mapping: ToneMapConfig::default(),
            backplate: None,
            passes: Vec::new(),
        }
    }
}

impl RenderConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(s: &str) -> BridgeResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| BridgeError::serde(format!("parse render config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read render config '{}'", path.display()))?;
        Self::from_json(&text)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> BridgeResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| BridgeError::serde(format!("serialize render config: {e}")))
    }

    /// Check the configuration for values no job can run with.
    pub fn validate(&self) -> BridgeResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(BridgeError::validation(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.width > i32::MAX as u32 || self.height > i32::MAX as u32 {
            return Err(BridgeError::validation("resolution is too large"));
        }
        if self.samples == 0 {
            return Err(BridgeError::validation("samples must be non-zero"));
        }
        if self.tile_size <= 0 {
            return Err(BridgeError::validation(format!(
                "tile_size must be > 0, got {}",
                self.tile_size
            )));
        }
        if self.motion_blur.shutter.is_nan() || self.motion_blur.shutter < 0.0 {
            return Err(BridgeError::validation("motion blur shutter must be >= 0"));
        }
        let MotionBlur { before, after, .. } = self.motion_blur;
        if before > MAX_MOTION_SAMPLES || after > MAX_MOTION_SAMPLES {
            return Err(BridgeError::validation(format!(
                "motion blur takes at most {MAX_MOTION_SAMPLES} samples per side, \
                 got {before} before and {after} after"
            )));
        }

        let res = self.resolution();
        if res.render.x == 0 || res.render.y == 0 {
            return Err(BridgeError::validation(format!(
                "{} layout leaves no pixels per eye at {}x{}",
                self.stereo, self.width, self.height
            )));
        }
        if let Some(crop) = self.crop
            && (crop.is_empty() || !Rect2D::from_size(res.render).contains_rect(&crop))
        {
            return Err(BridgeError::validation(format!(
                "crop {crop:?} must be non-empty and inside the {}x{} render area",
                res.render.x, res.render.y
            )));
        }

        let mut names = HashSet::new();
        for p in self.pass_descriptors() {
            if p.channels != 1 && p.channels != 4 {
                return Err(BridgeError::validation(format!(
                    "pass \"{}\" has {} channels; only 1 or 4 are supported",
                    p.name, p.channels
                )));
            }
            if !names.insert(p.name.clone()) {
                return Err(BridgeError::validation(format!(
                    "duplicate pass name \"{}\"",
                    p.name
                )));
            }
        }
        Ok(())
    }

    /// Output and per-eye render resolution.
    pub fn resolution(&self) -> ResolutionPair {
        plan(self.width as i32, self.height as i32, self.stereo)
    }

    /// Crop region in render space, the whole render area when unset.
    pub fn render_region(&self) -> Rect2D {
        let full = Rect2D::from_size(self.resolution().render);
        self.crop.map_or(full, |c| c.intersect(&full))
    }

    /// Combined pass followed by the configured auxiliary passes.
    pub fn pass_descriptors(&self) -> Vec<RenderPassDescriptor> {
        std::iter::once(RenderPassDescriptor::combined())
            .chain(self.passes.iter().filter(|p| !p.is_combined()).cloned())
            .collect()
    }

    /// Status poll interval of the offline loop.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Output size.
    pub fn output_size(&self) -> Point2D {
        Point2D::new(self.width as i32, self.height as i32)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/config.rs"]
mod tests;
