use crate::foundation::core::Point2D;
use crate::foundation::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Colour split used by anaglyph stereo output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnaglyphMode {
    /// Left eye in red, right eye in green + blue.
    RedCyan,
    /// Left eye in green, right eye in red + blue.
    GreenMagenta,
    /// Left eye in red + green, right eye in blue.
    YellowBlue,
}

/// How two-eye output is arranged in the host framebuffer.
///
/// Chosen once per session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoLayout {
    /// Mono rendering.
    #[default]
    None,
    /// Render the left eye only.
    LeftEye,
    /// Render the right eye only.
    RightEye,
    /// Both eyes blended into disjoint colour channels of the same pixels.
    Anaglyph(AnaglyphMode),
    /// Eyes placed next to each other, each at half width.
    SideBySide,
    /// Eyes stacked vertically, each at half height.
    TopBottom,
}

impl StereoLayout {
    /// Number of engine passes a job needs for this layout.
    pub fn eye_count(self) -> u32 {
        match self {
            StereoLayout::None | StereoLayout::LeftEye | StereoLayout::RightEye => 1,
            StereoLayout::Anaglyph(_) | StereoLayout::SideBySide | StereoLayout::TopBottom => 2,
        }
    }

    /// Return `true` for the anaglyph variants.
    pub fn is_anaglyph(self) -> bool {
        matches!(self, StereoLayout::Anaglyph(_))
    }

    /// Decode the integer layout code used by host parameter blocks.
    ///
    /// Unknown codes yield `None`; callers treat that as "nothing to composite".
    pub fn from_host_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => StereoLayout::None,
            1 => StereoLayout::Anaglyph(AnaglyphMode::RedCyan),
            2 => StereoLayout::Anaglyph(AnaglyphMode::GreenMagenta),
            3 => StereoLayout::Anaglyph(AnaglyphMode::YellowBlue),
            4 => StereoLayout::SideBySide,
            5 => StereoLayout::TopBottom,
            6 => StereoLayout::LeftEye,
            7 => StereoLayout::RightEye,
            _ => return None,
        })
    }

    /// Which camera eye renders pass `eye_index`, honoring a host eye swap.
    pub fn camera_eye(self, eye_index: u32, swap_eyes: bool) -> StereoEye {
        let eye = match self {
            StereoLayout::None => return StereoEye::Mono,
            StereoLayout::LeftEye => StereoEye::Left,
            StereoLayout::RightEye => StereoEye::Right,
            StereoLayout::Anaglyph(_) | StereoLayout::SideBySide | StereoLayout::TopBottom => {
                if eye_index % 2 == 0 {
                    StereoEye::Left
                } else {
                    StereoEye::Right
                }
            }
        };
        if swap_eyes { eye.swapped() } else { eye }
    }
}

impl fmt::Display for StereoLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StereoLayout::None => "none",
            StereoLayout::LeftEye => "left",
            StereoLayout::RightEye => "right",
            StereoLayout::Anaglyph(AnaglyphMode::RedCyan) => "anaglyph-red-cyan",
            StereoLayout::Anaglyph(AnaglyphMode::GreenMagenta) => "anaglyph-green-magenta",
            StereoLayout::Anaglyph(AnaglyphMode::YellowBlue) => "anaglyph-yellow-blue",
            StereoLayout::SideBySide => "side-by-side",
            StereoLayout::TopBottom => "top-bottom",
        };
        f.write_str(s)
    }
}

impl FromStr for StereoLayout {
    type Err = BridgeError;

    fn from_str(s: &str) -> BridgeResult<Self> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "none" | "mono" => StereoLayout::None,
            "left" => StereoLayout::LeftEye,
            "right" => StereoLayout::RightEye,
            "anaglyph-red-cyan" | "red-cyan" => StereoLayout::Anaglyph(AnaglyphMode::RedCyan),
            "anaglyph-green-magenta" | "green-magenta" => {
                StereoLayout::Anaglyph(AnaglyphMode::GreenMagenta)
            }
            "anaglyph-yellow-blue" | "yellow-blue" => {
                StereoLayout::Anaglyph(AnaglyphMode::YellowBlue)
            }
            "side-by-side" | "sbs" => StereoLayout::SideBySide,
            "top-bottom" | "tb" => StereoLayout::TopBottom,
            other => {
                return Err(BridgeError::validation(format!(
                    "unknown stereo layout \"{other}\""
                )));
            }
        })
    }
}

/// Camera eye a single engine pass renders from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StereoEye {
    /// No stereo offset.
    #[default]
    Mono,
    /// Left eye.
    Left,
    /// Right eye.
    Right,
}

impl StereoEye {
    /// Opposite eye; mono stays mono.
    pub fn swapped(self) -> Self {
        match self {
            StereoEye::Mono => StereoEye::Mono,
            StereoEye::Left => StereoEye::Right,
            StereoEye::Right => StereoEye::Left,
        }
    }
}

/// Output resolution (what the host framebuffer holds) versus per-pass render resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResolutionPair {
    /// Full, possibly combined-eye, resolution the host expects.
    pub output: Point2D,
    /// Resolution requested from the engine for one pass.
    pub render: Point2D,
}

/// Split a requested frame size into output and render resolution for `layout`.
///
/// Side-by-side halves the render width, top-bottom halves the render height (integer
/// division); every other layout renders at the output size.
pub fn plan(final_width: i32, final_height: i32, layout: StereoLayout) -> ResolutionPair {
    let output = Point2D::new(final_width, final_height);
    let render = match layout {
        StereoLayout::SideBySide => Point2D::new(final_width / 2, final_height),
        StereoLayout::TopBottom => Point2D::new(final_width, final_height / 2),
        StereoLayout::None
        | StereoLayout::LeftEye
        | StereoLayout::RightEye
        | StereoLayout::Anaglyph(_) => output,
    };
    ResolutionPair { output, render }
}

#[cfg(test)]
#[path = "../../tests/unit/stereo/layout.rs"]
mod tests;
