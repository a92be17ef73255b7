//! Animation evaluation.
//!
//! Every function here is a pure function of a layer description and a scene-local time, so
//! frames can be evaluated in any order and on any thread.

pub(crate) mod anim;
pub(crate) mod ease;
