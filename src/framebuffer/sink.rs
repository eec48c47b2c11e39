use crate::foundation::core::{Point2D, Rect2D, Rgba};
use crate::foundation::error::{BridgeError, BridgeResult};
use anyhow::Context as _;
use std::collections::BTreeMap;
use std::path::Path;

/// Host-side destination for one auxiliary render pass.
pub trait PassSink: Send {
    /// Write `data` (`channels` floats per pixel) into row `y` starting at column `x`.
    fn put_row(&mut self, y: i32, x: i32, channels: usize, data: &[f32]) -> BridgeResult<()>;
}

/// The host application's framebuffer.
///
/// Rows are top-down in output space.
pub trait HostFrameBuffer: Send {
    /// Output resolution the host expects.
    fn resolution(&self) -> Point2D;

    /// Sub-area the host wants updated, or `None` for the whole frame.
    fn region(&self) -> Option<Rect2D> {
        None
    }

    /// Receive one row of pixels.
    fn put_row(&mut self, y: i32, x_start: i32, pixels: &[Rgba]) -> BridgeResult<()>;

    /// Sink registered for the pass called `name`, if any.
    fn pass_sink(&mut self, _name: &str) -> Option<&mut dyn PassSink> {
        None
    }

    /// Called once after a full copy-back so the host can redraw.
    fn refresh(&mut self) {}
}

/// [`PassSink`] that keeps a full-resolution float image in memory.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPassSink {
    size: Point2D,
    channels: usize,
    data: Vec<f32>,
}

impl InMemoryPassSink {
    fn new(size: Point2D) -> Self {
        Self {
            size,
            channels: 0,
            data: Vec::new(),
        }
    }

    /// Pass size in pixels.
    pub fn size(&self) -> Point2D {
        self.size
    }

    /// Row-major, top-down pass data; empty until the first row arrives.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Channels per pixel, zero until the first row arrives.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Pixel at `(x, y)`, if written.
    pub fn pixel(&self, x: i32, y: i32) -> Option<&[f32]> {
        if self.channels == 0 || !Rect2D::from_size(self.size).contains(Point2D::new(x, y)) {
            return None;
        }
        let at = (y as usize * self.size.x as usize + x as usize) * self.channels;
        self.data.get(at..at + self.channels)
    }
}

impl PassSink for InMemoryPassSink {
    fn put_row(&mut self, y: i32, x: i32, channels: usize, data: &[f32]) -> BridgeResult<()> {
        if self.channels == 0 {
            self.channels = channels;
            self.data = vec![0.0; self.size.pixel_count() * channels];
        } else if self.channels != channels {
            return Err(BridgeError::validation(format!(
                "pass sink holds {} channels, row has {channels}",
                self.channels
            )));
        }
        if y < 0 || y >= self.size.y || x < 0 || x > self.size.x {
            return Err(BridgeError::validation(format!("pass row ({x}, {y}) out of bounds")));
        }
        let at = (y as usize * self.size.x as usize + x as usize) * channels;
        let row_end = (y as usize + 1) * self.size.x as usize * channels;
        let n = data.len().min(row_end.saturating_sub(at));
        self.data[at..at + n].copy_from_slice(&data[..n]);
        Ok(())
    }
}

/// In-memory host framebuffer for tests and the CLI.
#[derive(Clone, Debug)]
pub struct InMemoryFrameBuffer {
    size: Point2D,
    region: Option<Rect2D>,
    pixels: Vec<Rgba>,
    pixels_written: usize,
    refreshes: usize,
    pass_sinks: BTreeMap<String, InMemoryPassSink>,
}

impl InMemoryFrameBuffer {
    /// Transparent framebuffer of `width x height`.
    pub fn new(width: u32, height: u32) -> Self {
        let size = Point2D::new(width as i32, height as i32);
        Self {
            size,
            region: None,
            pixels: vec![Rgba::TRANSPARENT; size.pixel_count()],
            pixels_written: 0,
            refreshes: 0,
            pass_sinks: BTreeMap::new(),
        }
    }

    /// Restrict copy-back to `region`.
    pub fn with_region(mut self, region: Rect2D) -> Self {
        self.region = Some(region);
        self
    }

    /// Register a sink for the pass called `name`.
    pub fn with_pass_sink(mut self, name: impl Into<String>) -> Self {
        self.pass_sinks
            .insert(name.into(), InMemoryPassSink::new(self.size));
        self
    }

    /// Pixel at `(x, y)`.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        if !Rect2D::from_size(self.size).contains(Point2D::new(x, y)) {
            return None;
        }
        Some(self.pixels[y as usize * self.size.x as usize + x as usize])
    }

    /// All pixels, row-major and top-down.
    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Total pixels received through `put_row` since creation.
    pub fn pixels_written(&self) -> usize {
        self.pixels_written
    }

    /// Number of refresh notifications received.
    pub fn refreshes(&self) -> usize {
        self.refreshes
    }

    /// Captured pass, if a sink was registered for it.
    pub fn pass(&self, name: &str) -> Option<&InMemoryPassSink> {
        self.pass_sinks.get(name)
    }

    /// 8-bit RGBA copy of the frame.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_rgba8()).collect()
    }

    /// Write the frame as a PNG.
    pub fn save_png(&self, path: &Path) -> BridgeResult<()> {
        image::save_buffer_with_format(
            path,
            &self.to_rgba8(),
            self.size.x as u32,
            self.size.y as u32,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

impl HostFrameBuffer for InMemoryFrameBuffer {
    fn resolution(&self) -> Point2D {
        self.size
    }

    fn region(&self) -> Option<Rect2D> {
        self.region
    }

    fn put_row(&mut self, y: i32, x_start: i32, pixels: &[Rgba]) -> BridgeResult<()> {
        if y < 0 || y >= self.size.y || x_start < 0 || x_start > self.size.x {
            return Err(BridgeError::validation(format!(
                "host row ({x_start}, {y}) outside {}x{}",
                self.size.x, self.size.y
            )));
        }
        let n = pixels.len().min((self.size.x - x_start) as usize);
        let at = y as usize * self.size.x as usize + x_start as usize;
        self.pixels[at..at + n].copy_from_slice(&pixels[..n]);
        self.pixels_written += n;
        Ok(())
    }

    fn pass_sink(&mut self, name: &str) -> Option<&mut dyn PassSink> {
        self.pass_sinks
            .get_mut(name)
            .map(|s| s as &mut dyn PassSink)
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}
