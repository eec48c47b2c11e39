use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

/// Integer 2D point, used for resolutions, offsets and tile origins.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2D {
    /// Horizontal component.
    pub x: i32,
    /// Vertical component.
    pub y: i32,
}

impl Point2D {
    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Number of pixels covered by a resolution of this size (zero for negative extents).
    pub fn pixel_count(self) -> usize {
        (self.x.max(0) as usize).saturating_mul(self.y.max(0) as usize)
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

/// Axis-aligned integer rectangle, `begin` inclusive and `end` exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect2D {
    /// Inclusive top-left corner.
    pub begin: Point2D,
    /// Exclusive bottom-right corner.
    pub end: Point2D,
}

impl Rect2D {
    /// Create a rectangle from its corners.
    pub const fn new(begin: Point2D, end: Point2D) -> Self {
        Self { begin, end }
    }

    /// Rectangle anchored at the origin covering `size`.
    pub const fn from_size(size: Point2D) -> Self {
        Self {
            begin: Point2D::new(0, 0),
            end: size,
        }
    }

    /// Width in pixels (zero when inverted).
    pub fn width(&self) -> i32 {
        (self.end.x - self.begin.x).max(0)
    }

    /// Height in pixels (zero when inverted).
    pub fn height(&self) -> i32 {
        (self.end.y - self.begin.y).max(0)
    }

    /// Size as a point.
    pub fn size(&self) -> Point2D {
        Point2D::new(self.width(), self.height())
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Return `true` when `p` lies inside `[begin, end)`.
    pub fn contains(&self, p: Point2D) -> bool {
        p.x >= self.begin.x && p.y >= self.begin.y && p.x < self.end.x && p.y < self.end.y
    }

    /// Return `true` when `other` lies fully inside this rectangle.
    pub fn contains_rect(&self, other: &Rect2D) -> bool {
        other.begin.x >= self.begin.x
            && other.begin.y >= self.begin.y
            && other.end.x <= self.end.x
            && other.end.y <= self.end.y
    }

    /// Shift both corners by `offset`.
    pub fn translate(&self, offset: Point2D) -> Rect2D {
        Rect2D {
            begin: self.begin + offset,
            end: self.end + offset,
        }
    }

    /// Overlap of two rectangles; empty rectangles collapse to `begin == end`.
    pub fn intersect(&self, other: &Rect2D) -> Rect2D {
        let begin = Point2D::new(
            self.begin.x.max(other.begin.x),
            self.begin.y.max(other.begin.y),
        );
        let end = Point2D::new(
            self.end.x.min(other.end.x).max(begin.x),
            self.end.y.min(other.end.y).max(begin.y),
        );
        Rect2D { begin, end }
    }
}

/// Linear float RGBA pixel as stored in the accumulation buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Rgba {
    /// Fully transparent black.
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque black, the default value of a 4-channel pass.
    pub const BLACK: Rgba = Rgba::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque red, written when a job cannot be set up.
    pub const ERROR_RED: Rgba = Rgba::new(1.0, 0.0, 0.0, 1.0);

    /// Create a pixel.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Build from the first four floats of a channel slice.
    ///
    /// Missing channels read as `0.0` except alpha, which reads as `1.0`.
    pub fn from_slice(px: &[f32]) -> Self {
        Self {
            r: px.first().copied().unwrap_or(0.0),
            g: px.get(1).copied().unwrap_or(0.0),
            b: px.get(2).copied().unwrap_or(0.0),
            a: px.get(3).copied().unwrap_or(1.0),
        }
    }

    /// Channels as an array.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantize to straight RGBA8, clamping each channel into `[0, 1]`.
    pub fn to_rgba8(self) -> [u8; 4] {
        fn q(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Build from RGBA8 bytes.
    pub fn from_rgba8(px: [u8; 4]) -> Self {
        Self::new(
            f32::from(px[0]) / 255.0,
            f32::from(px[1]) / 255.0,
            f32::from(px[2]) / 255.0,
            f32::from(px[3]) / 255.0,
        )
    }
}

impl Add for Rgba {
    type Output = Rgba;

    fn add(self, rhs: Rgba) -> Rgba {
        Rgba::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl Mul<f32> for Rgba {
    type Output = Rgba;

    fn mul(self, k: f32) -> Rgba {
        Rgba::new(self.r * k, self.g * k, self.b * k, self.a * k)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
