use crate::foundation::core::{Point2D, Rgba};
use crate::foundation::error::{BridgeError, BridgeResult};
use anyhow::Context as _;
use std::path::Path;

/// Static background image composited behind transparent render results.
///
/// Sampling wraps, so a backplate smaller than the frame tiles across it.
#[derive(Clone, Debug, PartialEq)]
pub struct Backplate {
    size: Point2D,
    pixels: Vec<Rgba>,
}

impl Backplate {
    /// Build from row-major, top-down pixels.
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba>) -> BridgeResult<Self> {
        if width == 0 || height == 0 {
            return Err(BridgeError::validation("backplate must be non-empty"));
        }
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(BridgeError::validation(format!(
                "backplate {width}x{height} needs {expected} pixels, got {}",
                pixels.len()
            )));
        }
        Ok(Self {
            size: Point2D::new(width as i32, height as i32),
            pixels,
        })
    }

    /// Single-colour backplate.
    pub fn solid(width: u32, height: u32, color: Rgba) -> BridgeResult<Self> {
        Self::from_pixels(width, height, vec![color; width as usize * height as usize])
    }

    /// Decode an image file.
    pub fn load(path: &Path) -> BridgeResult<Self> {
        let img = image::open(path)
            .with_context(|| format!("open backplate '{}'", path.display()))?;
        Self::from_image(&img)
    }

    /// Convert a decoded image, normalizing channels to `[0, 1]`.
    pub fn from_image(img: &image::DynamicImage) -> BridgeResult<Self> {
        let rgba = img.to_rgba32f();
        let (w, h) = rgba.dimensions();
        let pixels = rgba.pixels().map(|p| Rgba::from_slice(&p.0)).collect();
        Self::from_pixels(w, h, pixels)
    }

    /// Backplate size in pixels.
    pub fn size(&self) -> Point2D {
        self.size
    }

    /// Pixel at `(x, y)`, wrapping outside the image.
    pub fn sample_wrapped(&self, x: i32, y: i32) -> Rgba {
        let x = x.rem_euclid(self.size.x) as usize;
        let y = y.rem_euclid(self.size.y) as usize;
        self.pixels[y * self.size.x as usize + x]
    }
}
