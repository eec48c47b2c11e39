use crate::foundation::core::Rgba;
use serde::{Deserialize, Serialize};

/// Host-supplied tone-mapping function applied on copy-back.
pub trait ToneMapper: Send + Sync {
    /// Map one linear pixel. Alpha is left to the caller.
    fn map(&self, px: Rgba) -> Rgba;

    /// Return `true` when the operator should run after backplate compositing, so the
    /// background is tone mapped too.
    fn processes_background(&self) -> bool {
        false
    }
}

/// Built-in tone-mapping operators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapOperator {
    /// Identity.
    #[default]
    Linear,
    /// Scale by `2^stops`.
    Exposure {
        /// Exposure adjustment in stops.
        stops: f32,
    },
    /// `x / (1 + x)` per channel.
    Reinhard,
    /// Filmic curve (Narkowicz ACES fit), clamped to `[0, 1]`.
    Filmic,
}

/// Tone-mapping settings carried by the render configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapConfig {
    /// Operator to apply.
    pub operator: ToneMapOperator,
    /// Apply the operator after backplate compositing.
    pub process_background: bool,
}

impl ToneMapper for ToneMapConfig {
    fn map(&self, px: Rgba) -> Rgba {
        let f = |c: f32| match self.operator {
            ToneMapOperator::Linear => c,
            ToneMapOperator::Exposure { stops } => c * stops.exp2(),
            ToneMapOperator::Reinhard => {
                let c = c.max(0.0);
                c / (1.0 + c)
            }
            ToneMapOperator::Filmic => {
                let c = c.max(0.0);
                ((c * (2.51 * c + 0.03)) / (c * (2.43 * c + 0.59) + 0.14)).clamp(0.0, 1.0)
            }
        };
        Rgba::new(f(px.r), f(px.g), f(px.b), px.a)
    }

    fn processes_background(&self) -> bool {
        self.process_background
    }
}
