use crate::foundation::core::{Point2D, Rgba};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Hand-picked saturated colours spanning primary, secondary and tertiary hues.
pub const HIGHLIGHT_PALETTE: [Rgba; 12] = [
    Rgba::new(1.0, 0.0, 0.0, 1.0),
    Rgba::new(0.0, 1.0, 0.0, 1.0),
    Rgba::new(0.0, 0.0, 1.0, 1.0),
    Rgba::new(1.0, 1.0, 0.0, 1.0),
    Rgba::new(0.0, 1.0, 1.0, 1.0),
    Rgba::new(1.0, 0.0, 1.0, 1.0),
    Rgba::new(1.0, 0.5, 0.0, 1.0),
    Rgba::new(0.5, 1.0, 0.0, 1.0),
    Rgba::new(0.0, 1.0, 0.5, 1.0),
    Rgba::new(0.0, 0.5, 1.0, 1.0),
    Rgba::new(0.5, 0.0, 1.0, 1.0),
    Rgba::new(1.0, 0.0, 0.5, 1.0),
];

/// Width in pixels of the highlighted tile border.
pub const HIGHLIGHT_BORDER: usize = 2;

struct AssignerState {
    colors: HashMap<Point2D, Rgba>,
    rng: fastrand::Rng,
}

/// Stable-but-arbitrary highlight colour per in-flight tile origin.
///
/// One instance lives for one render session; coordinates mean nothing across sessions.
pub struct TileHighlightColorAssigner {
    state: Mutex<AssignerState>,
}

impl Default for TileHighlightColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl TileHighlightColorAssigner {
    /// Create an assigner with a randomly seeded generator.
    pub fn new() -> Self {
        Self::with_rng(fastrand::Rng::new())
    }

    /// Create an assigner with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(fastrand::Rng::with_seed(seed))
    }

    fn with_rng(rng: fastrand::Rng) -> Self {
        Self {
            state: Mutex::new(AssignerState {
                colors: HashMap::new(),
                rng,
            }),
        }
    }

    /// Colour for the tile whose origin is `(x, y)`, picking one on first use.
    pub fn color_for(&self, x: i32, y: i32) -> Rgba {
        let mut state = self.state.lock();
        let AssignerState { colors, rng } = &mut *state;
        *colors
            .entry(Point2D::new(x, y))
            .or_insert_with(|| HIGHLIGHT_PALETTE[rng.usize(..HIGHLIGHT_PALETTE.len())])
    }

    /// Number of tile origins seen so far.
    pub fn assigned(&self) -> usize {
        self.state.lock().colors.len()
    }
}

/// Paint a [`HIGHLIGHT_BORDER`]-pixel frame of `color` over a 4-channel tile in place.
///
/// The top and bottom rows and the left and right columns are replaced at full opacity.
pub fn overlay_border(pixels: &mut [f32], width: usize, height: usize, color: Rgba) {
    let channels = 4;
    if pixels.len() < width * height * channels {
        return;
    }
    let px = [color.r, color.g, color.b, 1.0];
    for y in 0..height {
        let edge_row = y < HIGHLIGHT_BORDER || y + HIGHLIGHT_BORDER >= height;
        for x in 0..width {
            let edge_col = x < HIGHLIGHT_BORDER || x + HIGHLIGHT_BORDER >= width;
            if edge_row || edge_col {
                let i = (y * width + x) * channels;
                pixels[i..i + channels].copy_from_slice(&px);
            }
        }
    }
}
