use crate::stereo::layout::{AnaglyphMode, StereoLayout};

/// Which RGBA channels of a rendered tile overwrite the accumulation buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelMask {
    /// Copy red.
    pub r: bool,
    /// Copy green.
    pub g: bool,
    /// Copy blue.
    pub b: bool,
    /// Copy alpha.
    pub a: bool,
}

impl ChannelMask {
    /// Every channel selected.
    pub const ALL: ChannelMask = ChannelMask::new(true, true, true, true);

    /// Create a mask.
    pub const fn new(r: bool, g: bool, b: bool, a: bool) -> Self {
        Self { r, g, b, a }
    }

    /// Return `true` when all four channels are selected.
    pub fn is_full(self) -> bool {
        self.r && self.g && self.b && self.a
    }

    /// Mask as a per-channel array in RGBA order.
    pub fn as_array(self) -> [bool; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Return `true` when the two masks share a channel.
    pub fn overlaps(self, other: ChannelMask) -> bool {
        self.as_array()
            .iter()
            .zip(other.as_array())
            .any(|(&a, b)| a && b)
    }
}

/// Channels an eye contributes for `layout`.
///
/// Non-anaglyph layouts always copy every channel. Anaglyph layouts split colour channels by
/// eye parity and never composite alpha, so both eyes land in disjoint channels of the same
/// pixels.
pub fn channels_for(layout: StereoLayout, eye_index: u32) -> ChannelMask {
    let StereoLayout::Anaglyph(mode) = layout else {
        return ChannelMask::ALL;
    };
    let first_eye = eye_index % 2 == 0;
    match (mode, first_eye) {
        (AnaglyphMode::RedCyan, true) => ChannelMask::new(true, false, false, false),
        (AnaglyphMode::RedCyan, false) => ChannelMask::new(false, true, true, false),
        (AnaglyphMode::GreenMagenta, true) => ChannelMask::new(false, true, false, false),
        (AnaglyphMode::GreenMagenta, false) => ChannelMask::new(true, false, true, false),
        (AnaglyphMode::YellowBlue, true) => ChannelMask::new(true, true, false, false),
        (AnaglyphMode::YellowBlue, false) => ChannelMask::new(false, false, true, false),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/stereo/channels.rs"]
mod tests;
