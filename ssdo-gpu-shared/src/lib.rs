//! GPU-independent data shared by the SSDO renderer: uniform layouts,
//! embedded WGSL, sample kernels and the mesh reader.

pub mod mesh_format;
pub mod sampling;
pub mod shaders;
pub mod uniforms;

pub use mesh_format::{MeshData, MeshFormatError};
