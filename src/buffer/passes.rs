use serde::{Deserialize, Serialize};

/// Name of the always-present colour pass.
pub const COMBINED_PASS_NAME: &str = "Combined";

/// Semantic kind of a render pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassKind {
    /// Beauty colour with alpha.
    Combined,
    /// Camera depth.
    Depth,
    /// Shading normal.
    Normal,
    /// Diffuse albedo.
    Albedo,
    /// Emission.
    Emission,
    /// Shadow catcher factor.
    Shadow,
    /// Ambient occlusion.
    AmbientOcclusion,
    /// Host-defined auxiliary output.
    Custom,
}

impl PassKind {
    /// Channel count the engine produces for this kind.
    pub fn default_channels(self) -> u8 {
        match self {
            PassKind::Depth | PassKind::Shadow | PassKind::AmbientOcclusion => 1,
            PassKind::Combined
            | PassKind::Normal
            | PassKind::Albedo
            | PassKind::Emission
            | PassKind::Custom => 4,
        }
    }
}

/// One named channel group of render output.
///
/// The list of descriptors is fixed for a render job and defines the accumulation buffer
/// layout.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderPassDescriptor {
    /// Semantic kind.
    pub kind: PassKind,
    /// Channels per pixel, 1 or 4.
    pub channels: u8,
    /// Stable pass name used to match engine output.
    pub name: String,
    /// Host-side render element that receives this pass on a full copy-back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sink: Option<String>,
}

impl RenderPassDescriptor {
    /// Descriptor with the kind's default channel count and no host sink.
    pub fn new(kind: PassKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            channels: kind.default_channels(),
            name: name.into(),
            sink: None,
        }
    }

    /// The combined colour pass.
    pub fn combined() -> Self {
        Self::new(PassKind::Combined, COMBINED_PASS_NAME)
    }

    /// Route this pass to the named host render element.
    pub fn with_sink(mut self, sink: impl Into<String>) -> Self {
        self.sink = Some(sink.into());
        self
    }

    /// Return `true` for the combined colour pass.
    pub fn is_combined(&self) -> bool {
        self.kind == PassKind::Combined
    }

    /// Default value of every channel of a freshly allocated pixel.
    pub(crate) fn default_pixel(&self) -> &'static [f32] {
        if self.channels == 4 {
            &[0.0, 0.0, 0.0, 1.0]
        } else {
            &[0.0]
        }
    }
}
