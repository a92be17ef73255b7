//! Shared primitives: canvas/fps types, colors, blend math and the crate error type.

pub(crate) mod core;
pub(crate) mod error;
pub(crate) mod math;
