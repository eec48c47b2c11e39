/// Anaglyph channel selection per eye.
pub mod channels;
/// Stereo layouts, camera eyes and resolution planning.
pub mod layout;
