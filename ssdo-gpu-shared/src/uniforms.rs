use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};

/// Capacity of the kernel uniform array (matches `MAX_KERNEL_SIZE` in the WGSL).
pub const MAX_KERNEL_SIZE: usize = 64;

/// Largest linear depth the geometry pass stores. 1.0 marks "no geometry",
/// and this must stay below it in a 16-bit float target too.
pub const MAX_STORED_DEPTH: f32 = 0.999;

/// Geometry pass per-frame data (group 0, binding 0).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GeometryFrameUniforms {
    pub projection: [[f32; 4]; 4],
    pub near: f32,
    pub far: f32,
    pub max_depth: f32,
    pub _pad1: f32,
}

impl GeometryFrameUniforms {
    pub fn new(projection: Mat4, near: f32, far: f32, max_depth: f32) -> Self {
        Self {
            projection: projection.to_cols_array_2d(),
            near,
            far,
            max_depth,
            _pad1: 0.0,
        }
    }
}

/// Per-object data: model-view matrix, normal matrix columns and albedo.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct PerObjectUniforms {
    pub model_view: [[f32; 4]; 4],
    pub normal_matrix_col0: [f32; 4],
    pub normal_matrix_col1: [f32; 4],
    pub normal_matrix_col2: [f32; 4],
    pub albedo: [f32; 4],
}

impl PerObjectUniforms {
    /// Normal matrix is the inverse-transpose of the upper 3x3 of `model_view`.
    pub fn new(model_view: Mat4, albedo: Vec4) -> Self {
        let normal = normal_matrix(model_view);
        Self {
            model_view: model_view.to_cols_array_2d(),
            normal_matrix_col0: normal.x_axis.extend(0.0).to_array(),
            normal_matrix_col1: normal.y_axis.extend(0.0).to_array(),
            normal_matrix_col2: normal.z_axis.extend(0.0).to_array(),
            albedo: albedo.to_array(),
        }
    }
}

pub fn normal_matrix(model_view: Mat4) -> Mat3 {
    Mat3::from_mat4(model_view).inverse().transpose()
}

/// Point light in view space for the Phong pass.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightingUniforms {
    pub position: [f32; 4],
    pub color: [f32; 4],
    pub constant_term: f32,
    pub linear_term: f32,
    pub quadratic_term: f32,
    pub ambient: f32,
}

/// Sample kernel shared by both SSDO passes. Written once at initialization.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct KernelUniforms {
    pub samples: [[f32; 4]; MAX_KERNEL_SIZE],
    pub kernel_size: u32,
    pub _pad1: u32,
    pub _pad2: u32,
    pub _pad3: u32,
}

impl KernelUniforms {
    /// Samples past `MAX_KERNEL_SIZE` are dropped.
    pub fn from_kernel(kernel: &[Vec3]) -> Self {
        let mut uniforms = Self::zeroed();
        let count = kernel.len().min(MAX_KERNEL_SIZE);
        for (slot, sample) in uniforms.samples.iter_mut().zip(kernel) {
            *slot = sample.extend(0.0).to_array();
        }
        uniforms.kernel_size = count as u32;
        uniforms
    }
}

/// Per-frame SSDO parameters (direct and indirect passes).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SsdoUniforms {
    pub projection: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub radius: f32,
    pub bias: f32,
    pub strength: f32,
    pub _pad1: f32,
}

/// Box blur parameters.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct BlurParams {
    pub texel_size: [f32; 2],
    pub half_extent: i32,
    pub _pad1: f32,
}

/// Skybox: rotation-only view + projection.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct SkyboxUniforms {
    pub view_rotation: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
}

impl SkyboxUniforms {
    /// Strips the translation from `view`.
    pub fn new(view: Mat4, projection: Mat4) -> Self {
        Self {
            view_rotation: Mat4::from_mat3(Mat3::from_mat4(view)).to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
        }
    }
}

/// Mixer parameters: composite mode index + weights for the combined modes.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct MixerParams {
    pub mode: u32,
    pub lighting_weight: f32,
    pub direct_weight: f32,
    pub indirect_weight: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_sizes_are_16_byte_multiples() {
        assert_eq!(std::mem::size_of::<GeometryFrameUniforms>(), 80);
        assert_eq!(std::mem::size_of::<PerObjectUniforms>(), 128);
        assert_eq!(std::mem::size_of::<LightingUniforms>(), 48);
        assert_eq!(std::mem::size_of::<KernelUniforms>(), MAX_KERNEL_SIZE * 16 + 16);
        assert_eq!(std::mem::size_of::<SsdoUniforms>(), 144);
        assert_eq!(std::mem::size_of::<BlurParams>(), 16);
        assert_eq!(std::mem::size_of::<SkyboxUniforms>(), 128);
        assert_eq!(std::mem::size_of::<MixerParams>(), 16);
    }

    #[test]
    fn test_max_stored_depth_below_sentinel_in_half_float() {
        // 0.9999 rounds up to 1.0 in f16 and would read as background.
        assert_eq!(half::f16::from_f32(0.9999).to_f32(), 1.0);
        let stored = half::f16::from_f32(MAX_STORED_DEPTH).to_f32();
        assert!(stored < 1.0, "{stored}");
        assert!(MAX_STORED_DEPTH < 1.0);
    }

    #[test]
    fn test_kernel_uniforms_truncate() {
        let kernel = vec![Vec3::new(0.1, 0.2, 0.3); MAX_KERNEL_SIZE + 10];
        let u = KernelUniforms::from_kernel(&kernel);
        assert_eq!(u.kernel_size as usize, MAX_KERNEL_SIZE);
        assert_eq!(u.samples[MAX_KERNEL_SIZE - 1], [0.1, 0.2, 0.3, 0.0]);

        let u = KernelUniforms::from_kernel(&kernel[..3]);
        assert_eq!(u.kernel_size, 3);
        assert_eq!(u.samples[3], [0.0; 4]);
    }

    #[test]
    fn test_normal_matrix_under_non_uniform_scale() {
        let mv = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let n = normal_matrix(mv);
        // A plane tilted 45 degrees keeps its normal perpendicular after scaling.
        let tangent = mv.transform_vector3(Vec3::new(1.0, -1.0, 0.0));
        let normal = n * Vec3::new(1.0, 1.0, 0.0);
        assert!(tangent.dot(normal).abs() < 1e-5);
    }

    #[test]
    fn test_skybox_strips_translation() {
        let view = Mat4::from_translation(Vec3::new(4.0, 5.0, 6.0));
        let u = SkyboxUniforms::new(view, Mat4::IDENTITY);
        assert_eq!(u.view_rotation[3], [0.0, 0.0, 0.0, 1.0]);
    }
}
