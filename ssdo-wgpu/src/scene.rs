//! Scene collaborator: drawable objects and the single point light.

use glam::{Mat4, Vec3, Vec4};
use ssdo_gpu_shared::uniforms::{LightingUniforms, PerObjectUniforms};

use crate::backend::GpuMesh;
use crate::settings::PointLightSettings;

/// One drawable instance: mesh, transform, albedo and its uniform block.
pub struct SceneObject {
    pub mesh: GpuMesh,
    pub transform: Mat4,
    pub albedo: Vec4,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl SceneObject {
    pub fn uniforms(&self, view: Mat4) -> PerObjectUniforms {
        PerObjectUniforms::new(view * self.transform, self.albedo)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl From<PointLightSettings> for PointLight {
    fn from(s: PointLightSettings) -> Self {
        Self {
            position: s.position,
            color: s.color,
            constant: s.constant,
            linear: s.linear,
            quadratic: s.quadratic,
        }
    }
}

impl PointLight {
    /// Lighting block with the position moved into view space.
    pub fn uniforms(&self, view: Mat4, ambient: f32) -> LightingUniforms {
        LightingUniforms {
            position: view.transform_point3(self.position).extend(1.0).to_array(),
            color: self.color.extend(1.0).to_array(),
            constant_term: self.constant,
            linear_term: self.linear,
            quadratic_term: self.quadratic,
            ambient,
        }
    }
}

pub struct Scene {
    pub objects: Vec<SceneObject>,
    pub light: PointLight,
    /// Radius of the loaded geometry; drives camera framing and navigation speed.
    pub scale: f32,
}

impl Scene {
    pub fn new(light: PointLight) -> Self {
        Self {
            objects: Vec::new(),
            light,
            scale: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_moves_into_view_space() {
        let light = PointLight::from(PointLightSettings::default());
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -3.0));
        let u = light.uniforms(view, 0.1);
        assert_eq!(u.position, [0.0, 0.0, 2.0, 1.0]);
        assert_eq!(u.color, [0.8, 0.8, 0.6, 1.0]);
        assert_eq!(u.quadratic_term, 0.032);
        assert_eq!(u.ambient, 0.1);
    }
}
