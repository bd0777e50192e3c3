//! Per-stage pass encoders. Each begins its stage's render pass through the
//! target registry, records one draw kind, and ends the pass on return.

pub mod fullscreen;
pub mod geometry;
pub mod skybox;
