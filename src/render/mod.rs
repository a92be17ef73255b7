//! CPU compositing of resolved scene layers into premultiplied RGBA8 frames.

pub(crate) mod composite;
pub(crate) mod compositor;
pub(crate) mod frame;
pub(crate) mod text;
