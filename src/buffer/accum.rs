use crate::buffer::passes::{PassKind, RenderPassDescriptor};
use crate::foundation::core::{Point2D, Rgba};
use crate::foundation::error::{BridgeError, BridgeResult};
use std::collections::HashSet;

#[derive(Clone, Debug)]
struct PassSlot {
    desc: RenderPassDescriptor,
    // Float offset of the pass in `data`.
    offset: usize,
}

/// Persistent multi-pass float store that render tiles are composited into.
///
/// One contiguous allocation sized to the output resolution, split into passes laid out
/// back to back. The combined pass always comes first with 4 channels. Never resized after
/// construction.
#[derive(Debug)]
pub struct AccumulationBuffer {
    resolution: Point2D,
    slots: Vec<PassSlot>,
    data: Vec<f32>,
}

impl AccumulationBuffer {
    /// Allocate and default-fill a buffer for `passes` at `resolution`.
    ///
    /// The combined pass is moved to the front (or inserted when missing). One-channel passes
    /// start at `0.0`, four-channel passes at `(0, 0, 0, 1)`.
    pub fn new(resolution: Point2D, passes: &[RenderPassDescriptor]) -> BridgeResult<Self> {
        if resolution.x < 0 || resolution.y < 0 {
            return Err(BridgeError::validation(format!(
                "accumulation buffer resolution must be non-negative, got {}x{}",
                resolution.x, resolution.y
            )));
        }

        let mut ordered = Vec::with_capacity(passes.len() + 1);
        let combined = passes
            .iter()
            .find(|p| p.kind == PassKind::Combined)
            .cloned()
            .map(|mut p| {
                p.channels = 4;
                p
            })
            .unwrap_or_else(RenderPassDescriptor::combined);
        ordered.push(combined);
        ordered.extend(passes.iter().filter(|p| !p.is_combined()).cloned());

        let mut seen = HashSet::new();
        for p in &ordered {
            if p.channels != 1 && p.channels != 4 {
                return Err(BridgeError::validation(format!(
                    "pass \"{}\" has {} channels; only 1 or 4 are supported",
                    p.name, p.channels
                )));
            }
            if !seen.insert(p.name.as_str()) {
                return Err(BridgeError::validation(format!(
                    "duplicate pass name \"{}\"",
                    p.name
                )));
            }
        }

        let pixels = resolution.pixel_count();
        let mut slots = Vec::with_capacity(ordered.len());
        let mut total = 0usize;
        for desc in ordered {
            let len = pixels
                .checked_mul(usize::from(desc.channels))
                .ok_or_else(|| BridgeError::allocation("pass size overflows usize"))?;
            slots.push(PassSlot {
                desc,
                offset: total,
            });
            total = total
                .checked_add(len)
                .ok_or_else(|| BridgeError::allocation("buffer size overflows usize"))?;
        }

        let mut data = Vec::new();
        data.try_reserve_exact(total).map_err(|e| {
            BridgeError::allocation(format!("failed to allocate {total} floats: {e}"))
        })?;
        for slot in &slots {
            let px = slot.desc.default_pixel();
            for _ in 0..pixels {
                data.extend_from_slice(px);
            }
        }

        tracing::debug!(
            width = resolution.x,
            height = resolution.y,
            passes = slots.len(),
            floats = total,
            "allocated accumulation buffer"
        );

        Ok(Self {
            resolution,
            slots,
            data,
        })
    }

    /// Output resolution the buffer was sized for.
    pub fn resolution(&self) -> Point2D {
        self.resolution
    }

    /// Pass descriptors in storage order (combined first).
    pub fn passes(&self) -> impl Iterator<Item = &RenderPassDescriptor> {
        self.slots.iter().map(|s| &s.desc)
    }

    /// Number of passes.
    pub fn pass_count(&self) -> usize {
        self.slots.len()
    }

    /// Index of the pass called `name`, if configured.
    pub fn find_pass(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.desc.name == name)
    }

    /// Index of the pass called `name`, falling back to the combined pass when unknown.
    pub fn resolve_pass(&self, name: &str) -> usize {
        self.find_pass(name).unwrap_or_else(|| {
            tracing::trace!(pass = name, "unknown pass name, using combined pass");
            0
        })
    }

    /// Float offset of the named pass from the start of the buffer.
    pub fn pass_offset(&self, name: &str) -> usize {
        self.slots[self.resolve_pass(name)].offset
    }

    /// Read view of the named pass (combined pass when unknown).
    pub fn pass(&self, name: &str) -> PassView<'_> {
        self.pass_at(self.resolve_pass(name))
    }

    /// Write view of the named pass (combined pass when unknown).
    pub fn pass_mut(&mut self, name: &str) -> PassViewMut<'_> {
        let idx = self.resolve_pass(name);
        self.pass_at_mut(idx)
    }

    /// Read view of the combined pass.
    pub fn combined(&self) -> PassView<'_> {
        self.pass_at(0)
    }

    /// Read view of pass `index` in storage order.
    ///
    /// Panics when `index >= pass_count()`.
    pub fn pass_at(&self, index: usize) -> PassView<'_> {
        let slot = &self.slots[index];
        let len = self.pass_len(slot);
        PassView {
            desc: &slot.desc,
            width: self.resolution.x.max(0) as usize,
            height: self.resolution.y.max(0) as usize,
            data: &self.data[slot.offset..slot.offset + len],
        }
    }

    /// Write view of pass `index` in storage order.
    ///
    /// Panics when `index >= pass_count()`.
    pub fn pass_at_mut(&mut self, index: usize) -> PassViewMut<'_> {
        let slot = &self.slots[index];
        let len = self.pass_len(slot);
        PassViewMut {
            desc: &slot.desc,
            width: self.resolution.x.max(0) as usize,
            height: self.resolution.y.max(0) as usize,
            data: &mut self.data[slot.offset..slot.offset + len],
        }
    }

    /// Whole backing store.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    fn pass_len(&self, slot: &PassSlot) -> usize {
        self.resolution.pixel_count() * usize::from(slot.desc.channels)
    }
}

/// Read-only, bounds-checked view of one pass.
#[derive(Clone, Copy, Debug)]
pub struct PassView<'a> {
    desc: &'a RenderPassDescriptor,
    width: usize,
    height: usize,
    data: &'a [f32],
}

impl<'a> PassView<'a> {
    /// Descriptor of the viewed pass.
    pub fn descriptor(&self) -> &'a RenderPassDescriptor {
        self.desc
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        usize::from(self.desc.channels)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw pass data, row-major top-down.
    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    /// `count` pixels of row `y` starting at column `x`.
    pub fn span(&self, y: usize, x: usize, count: usize) -> Option<&'a [f32]> {
        let (start, end) = span_range(self.width, self.height, self.channels(), y, x, count)?;
        Some(&self.data[start..end])
    }

    /// Full row `y`.
    pub fn row(&self, y: usize) -> Option<&'a [f32]> {
        self.span(y, 0, self.width)
    }

    /// Channels of pixel `(x, y)`.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&'a [f32]> {
        self.span(y, x, 1)
    }

    /// Pixel `(x, y)` read as RGBA (1-channel passes broadcast into grey).
    pub fn rgba(&self, x: usize, y: usize) -> Option<Rgba> {
        let px = self.pixel(x, y)?;
        Some(if px.len() == 1 {
            Rgba::new(px[0], px[0], px[0], 1.0)
        } else {
            Rgba::from_slice(px)
        })
    }
}

/// Mutable, bounds-checked view of one pass.
#[derive(Debug)]
pub struct PassViewMut<'a> {
    desc: &'a RenderPassDescriptor,
    width: usize,
    height: usize,
    data: &'a mut [f32],
}

impl PassViewMut<'_> {
    /// Descriptor of the viewed pass.
    pub fn descriptor(&self) -> &RenderPassDescriptor {
        self.desc
    }

    /// Channels per pixel.
    pub fn channels(&self) -> usize {
        usize::from(self.desc.channels)
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Mutable `count` pixels of row `y` starting at column `x`.
    pub fn span_mut(&mut self, y: usize, x: usize, count: usize) -> Option<&mut [f32]> {
        let (start, end) = span_range(self.width, self.height, self.channels(), y, x, count)?;
        Some(&mut self.data[start..end])
    }

    /// Mutable channels of pixel `(x, y)`.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> Option<&mut [f32]> {
        self.span_mut(y, x, 1)
    }
}

fn span_range(
    width: usize,
    height: usize,
    channels: usize,
    y: usize,
    x: usize,
    count: usize,
) -> Option<(usize, usize)> {
    if y >= height || x.checked_add(count)? > width {
        return None;
    }
    let start = (y * width + x) * channels;
    Some((start, start + count * channels))
}

#[cfg(test)]
#[path = "../../tests/unit/buffer/accum.rs"]
mod tests;
