//! Row readers that feed the host framebuffer.
//!
//! Readers work in output space, top-down. The accumulation buffer is already stored top-down
//! (tiles are flipped once when composited), so rows are read as-is.

use crate::buffer::accum::PassView;
use crate::foundation::core::{Point2D, Rect2D, Rgba};
use crate::foundation::error::BridgeResult;
use crate::framebuffer::backplate::Backplate;
use crate::framebuffer::sink::HostFrameBuffer;
use crate::framebuffer::tonemap::ToneMapper;

/// Row-oriented pixel source.
pub trait FrameBufferReader {
    /// Size of the frame being read.
    fn resolution(&self) -> Point2D;

    /// Area that should be streamed to the host.
    fn region(&self) -> Rect2D;

    /// Fill `out` with the pixels of row `y` starting at column `x_start`.
    ///
    /// Pixels outside the frame read as transparent.
    fn row_into(&self, y: i32, x_start: i32, out: &mut [Rgba]);

    /// `count` pixels of row `y` starting at column `x_start`.
    fn row(&self, y: i32, x_start: i32, count: usize) -> Vec<Rgba> {
        let mut out = vec![Rgba::TRANSPARENT; count];
        self.row_into(y, x_start, &mut out);
        out
    }
}

/// Reader that returns the same colour everywhere.
#[derive(Clone, Copy, Debug)]
pub struct ConstantColorReader {
    resolution: Point2D,
    color: Rgba,
}

impl ConstantColorReader {
    /// Full-frame reader of `color`.
    pub fn new(resolution: Point2D, color: Rgba) -> Self {
        Self { resolution, color }
    }
}

impl FrameBufferReader for ConstantColorReader {
    fn resolution(&self) -> Point2D {
        self.resolution
    }

    fn region(&self) -> Rect2D {
        Rect2D::from_size(self.resolution)
    }

    fn row_into(&self, _y: i32, _x_start: i32, out: &mut [Rgba]) {
        out.fill(self.color);
    }
}

/// Reader over the combined pass of an accumulation buffer.
pub struct AccumBufferReader<'a> {
    combined: PassView<'a>,
    region: Rect2D,
    backplate: Option<&'a Backplate>,
    tone: &'a dyn ToneMapper,
}

impl<'a> AccumBufferReader<'a> {
    /// Read `region` of `combined`, tone mapped with `tone`.
    pub fn new(combined: PassView<'a>, region: Rect2D, tone: &'a dyn ToneMapper) -> Self {
        let full = Rect2D::from_size(Point2D::new(
            combined.width() as i32,
            combined.height() as i32,
        ));
        Self {
            combined,
            region: region.intersect(&full),
            backplate: None,
            tone,
        }
    }

    /// Composite `backplate` behind the render.
    pub fn with_backplate(mut self, backplate: Option<&'a Backplate>) -> Self {
        self.backplate = backplate;
        self
    }

    fn process(&self, src: Rgba, x: i32, y: i32) -> Rgba {
        let Some(bp) = self.backplate else {
            let mapped = self.tone.map(src);
            return Rgba { a: src.a, ..mapped };
        };
        let behind = bp.sample_wrapped(x, y) * (1.0 - src.a);
        if self.tone.processes_background() {
            self.tone.map(src + behind)
        } else {
            self.tone.map(src) + behind
        }
    }
}

impl FrameBufferReader for AccumBufferReader<'_> {
    fn resolution(&self) -> Point2D {
        Point2D::new(self.combined.width() as i32, self.combined.height() as i32)
    }

    fn region(&self) -> Rect2D {
        self.region
    }

    fn row_into(&self, y: i32, x_start: i32, out: &mut [Rgba]) {
        for (i, px) in out.iter_mut().enumerate() {
            let x = x_start + i as i32;
            *px = if x < 0 || y < 0 {
                Rgba::TRANSPARENT
            } else {
                match self.combined.rgba(x as usize, y as usize) {
                    Some(src) => self.process(src, x, y),
                    None => Rgba::TRANSPARENT,
                }
            };
        }
    }
}

/// Stream `reader`'s region into `host`, row by row, then ask the host to refresh.
///
/// Returns the number of pixels delivered.
pub fn stream_to_host(
    reader: &dyn FrameBufferReader,
    host: &mut dyn HostFrameBuffer,
) -> BridgeResult<usize> {
    let region = reader
        .region()
        .intersect(&Rect2D::from_size(host.resolution()));
    let width = region.width() as usize;
    let mut row = vec![Rgba::TRANSPARENT; width];
    let mut written = 0;
    for y in region.begin.y..region.end.y {
        reader.row_into(y, region.begin.x, &mut row);
        host.put_row(y, region.begin.x, &row)?;
        written += width;
    }
    host.refresh();
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/unit/framebuffer/reader.rs"]
mod tests;
