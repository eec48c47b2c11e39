/// Multi-pass accumulation buffer with typed pass views.
pub mod accum;
pub mod compositor;
/// Per-tile highlight colours for progressive refinement.
pub mod highlight;
/// Render pass descriptors.
pub mod passes;
