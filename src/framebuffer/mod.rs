//! Copy-back from the accumulation buffer to the host framebuffer.

/// Backplate images.
pub mod backplate;
pub mod reader;
/// Host framebuffer and pass sink contracts.
pub mod sink;
/// Tone-mapping operators.
pub mod tonemap;
