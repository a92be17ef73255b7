//! Encoding sinks.
//!
//! Sinks consume rendered frames in timeline order. The MP4 path encodes video through the
//! system `ffmpeg` and muxes the mixed audio in a separate step; the preview path writes a
//! looping GIF.

/// `ffmpeg`-based video encoding and muxing.
pub mod ffmpeg;
/// Looping GIF preview.
pub mod preview;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
