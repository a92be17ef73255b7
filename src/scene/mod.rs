//! Scene descriptions and the builder that derives them from a [`StatSnapshot`].
//!
//! [`StatSnapshot`]: crate::stats::snapshot::StatSnapshot

pub(crate) mod builder;
pub(crate) mod model;
pub(crate) mod theme;
