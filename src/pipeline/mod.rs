//! End-to-end rendering: sampling the timeline into frames, encoding, muxing, and the job that
//! wires statistics, scenes, audio and output together.

pub(crate) mod job;
pub(crate) mod render;
