use crate::engine::session::RenderDevice;
use crate::foundation::core::Rgba;
use serde::{Deserialize, Serialize};

/// Camera parameters derived from the host view.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    /// Horizontal field of view in degrees.
    pub fov_degrees: f32,
    /// Eye separation, as a fraction of frame width.
    pub interocular: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            interocular: 0.03,
        }
    }
}

/// Screen-space disc, the only primitive the built-in engine understands.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    /// Object name.
    pub name: String,
    /// Centre in normalized frame coordinates, top-left origin.
    pub center: [f32; 2],
    /// Radius as a fraction of frame height.
    pub radius: f32,
    /// Camera distance, also drives stereo parallax.
    pub depth: f32,
    /// Surface colour.
    pub color: Rgba,
    /// Screen-space motion per frame, sampled at the motion-blur times.
    #[serde(default)]
    pub velocity: [f32; 2],
}

/// Engine-side scene built from a host translation.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSnapshot {
    /// Device the scene renders on.
    pub device: RenderDevice,
    /// Camera parameters.
    pub camera: CameraParams,
    /// Environment colour at the top of the frame.
    pub environment: Rgba,
    /// Key light intensity multiplier.
    pub light_intensity: f32,
    /// Geometry, filled by the geometry build stage.
    pub objects: Vec<SceneObject>,
    /// Motion-blur sample times relative to the frame, in frames.
    pub motion_times: Vec<f32>,
}

impl SceneSnapshot {
    /// Empty scene on `device` seen through `camera`.
    pub fn new(device: RenderDevice, camera: CameraParams) -> Self {
        Self {
            device,
            camera,
            environment: Rgba::new(0.45, 0.6, 0.85, 1.0),
            light_intensity: 1.0,
            objects: Vec::new(),
            motion_times: vec![0.0],
        }
    }
}

/// Motion-blur sample times for `before` samples ahead of the frame and `after` behind it.
///
/// Times are evenly spaced on each side of `0.0` out to `±shutter / 2` and sorted. No samples
/// on either side gives just `[0.0]`.
pub fn motion_sample_times(before: u32, after: u32, shutter: f32) -> Vec<f32> {
    let half = shutter.max(0.0) * 0.5;
    let mut times = Vec::with_capacity(before as usize + after as usize + 1);
    for i in (1..=before).rev() {
        times.push(-half * i as f32 / before as f32);
    }
    times.push(0.0);
    for i in 1..=after {
        times.push(half * i as f32 / after as f32);
    }
    times
}
