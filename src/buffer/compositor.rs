//! Placement of rendered tiles into the accumulation buffer.
//!
//! Engine tiles are addressed bottom-up in render space while the accumulation buffer is
//! stored top-down at output resolution. Each copy flips rows, shifts columns by the crop
//! region, offsets by the eye's slot for spatial stereo layouts and applies the anaglyph
//! channel mask.

use crate::buffer::accum::PassViewMut;
use crate::foundation::core::{Point2D, Rect2D};
use crate::foundation::error::{BridgeError, BridgeResult};
use crate::stereo::channels::{ChannelMask, channels_for};
use crate::stereo::layout::{ResolutionPair, StereoLayout};
use serde::{Deserialize, Serialize};

/// Pixel placement of one engine tile.
///
/// `x` is relative to the left edge of the crop region; `y` is measured bottom-up in full
/// render space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRect {
    /// Column offset inside the crop region.
    pub x: i32,
    /// Bottom-up row offset in render space.
    pub y: i32,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl TileRect {
    /// Create a tile rectangle.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Tile origin, used as the highlight colour key.
    pub fn origin(&self) -> Point2D {
        Point2D::new(self.x, self.y)
    }
}

/// Borrowed tile pixels, row-major with a `channels * width` stride.
#[derive(Clone, Copy, Debug)]
pub struct TileSource<'a> {
    /// Channels per pixel.
    pub channels: usize,
    /// Pixel data, first row is the bottom-most row of the tile.
    pub pixels: &'a [f32],
}

/// Everything needed to address one tile inside the accumulation buffer.
#[derive(Clone, Copy, Debug)]
pub struct TilePlacement {
    /// Output and render resolution of the job.
    pub resolution: ResolutionPair,
    /// Engine tile rectangle.
    pub tile: TileRect,
    /// Crop region requested by the host, in render space.
    pub region: Rect2D,
    /// Stereo layout of the job.
    pub layout: StereoLayout,
    /// Engine pass index (0 = first eye).
    pub eye_index: u32,
}

/// Destination offset of an eye's slot in the output buffer.
///
/// The buffer is top-down. Side-by-side moves odd eyes right by one render width; top-bottom
/// moves odd eyes down by one render height, so the first eye fills the top half. Other
/// layouts share the same pixels.
pub fn eye_offset(layout: StereoLayout, eye_index: u32, resolution: ResolutionPair) -> Point2D {
    match layout {
        StereoLayout::SideBySide if eye_index % 2 == 1 => Point2D::new(resolution.render.x, 0),
        StereoLayout::TopBottom if eye_index % 2 == 1 => Point2D::new(0, resolution.render.y),
        _ => Point2D::new(0, 0),
    }
}

/// Copy a 4-channel combined-pass tile.
///
/// Returns the number of destination rows written.
pub fn copy_combined_tile(
    dst: &mut PassViewMut<'_>,
    src: TileSource<'_>,
    placement: &TilePlacement,
) -> BridgeResult<usize> {
    if src.channels != 4 || dst.channels() != 4 {
        return Err(BridgeError::validation(format!(
            "combined tile copy expects 4 channels, got source {} destination {}",
            src.channels,
            dst.channels()
        )));
    }
    copy_pass_tile(dst, src, placement)
}

/// Copy an N-channel tile into its pass.
///
/// The anaglyph channel mask only applies to 4-channel passes; single-channel passes are
/// always copied whole. Rows or columns that fall outside the buffer are clipped.
pub fn copy_pass_tile(
    dst: &mut PassViewMut<'_>,
    src: TileSource<'_>,
    placement: &TilePlacement,
) -> BridgeResult<usize> {
    let channels = dst.channels();
    if src.channels != channels {
        return Err(BridgeError::validation(format!(
            "tile has {} channels but pass \"{}\" has {}",
            src.channels,
            dst.descriptor().name,
            channels
        )));
    }

    let tile = placement.tile;
    if tile.width <= 0 || tile.height <= 0 {
        return Ok(0);
    }
    let tile_w = tile.width as usize;
    let stride = tile_w * channels;
    let needed = stride * tile.height as usize;
    if src.pixels.len() < needed {
        return Err(BridgeError::validation(format!(
            "tile {}x{} needs {needed} floats, got {}",
            tile.width,
            tile.height,
            src.pixels.len()
        )));
    }

    let mask = if channels == 4 {
        channels_for(placement.layout, placement.eye_index)
    } else {
        ChannelMask::ALL
    };
    let offset = eye_offset(placement.layout, placement.eye_index, placement.resolution);
    let render_h = placement.resolution.render.y;

    let dst_x = placement.region.begin.x + tile.x + offset.x;
    // Clip columns against the buffer once; every row shares the same span.
    let col_begin = (-dst_x).max(0) as usize;
    let col_end = (dst.width() as i64 - i64::from(dst_x)).clamp(0, tile_w as i64) as usize;
    if col_begin >= col_end {
        return Ok(0);
    }
    let count = col_end - col_begin;
    let x0 = (dst_x + col_begin as i32) as usize;

    let mut written = 0usize;
    for row in 0..tile.height {
        let dst_y = render_h - 1 - (row + tile.y) + offset.y;
        if dst_y < 0 {
            continue;
        }
        let Some(dst_span) = dst.span_mut(dst_y as usize, x0, count) else {
            continue;
        };
        let row_start = row as usize * stride + col_begin * channels;
        let src_span = &src.pixels[row_start..row_start + count * channels];

        if mask.is_full() {
            dst_span.copy_from_slice(src_span);
        } else {
            let sel = mask.as_array();
            for (d, s) in dst_span
                .chunks_exact_mut(channels)
                .zip(src_span.chunks_exact(channels))
            {
                for ((dc, &sc), keep) in d.iter_mut().zip(s).zip(sel) {
                    if keep {
                        *dc = sc;
                    }
                }
            }
        }
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/compositor.rs"]
mod tests;
