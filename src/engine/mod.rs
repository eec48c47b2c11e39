//! Engine-facing side of the bridge: sessions, tile events and status decoding.

/// Tile events and cooperative cancellation.
pub mod event;
pub mod procedural;
/// Status-line progress decoding.
pub mod progress;
/// Engine-side scene snapshot.
pub mod scene;
/// Engine and session contracts.
pub mod session;
