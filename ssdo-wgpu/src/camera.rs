use glam::{EulerRot, Mat4, Quat, Vec3};

/// Orbit-less viewer camera: a translated, rotated frame with a perspective lens.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub translation: Vec3,
    /// Euler angles (radians), applied X then Y then Z.
    pub rotation: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    /// Frames a mesh of radius `scale` centred on the origin.
    pub fn framing(scale: f32, aspect: f32) -> Self {
        Self {
            translation: Vec3::new(0.0, 0.0, 3.0 * scale),
            rotation: Vec3::ZERO,
            fov_y: 45f32.to_radians(),
            aspect,
            near: scale / 100.0,
            far: 6.0 * scale,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn orientation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z)
    }

    /// World to view: inverse of the camera's translate-then-rotate frame.
    pub fn compute_view_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.orientation(), self.translation).inverse()
    }

    /// Right-handed perspective with a [0, 1] depth range.
    pub fn compute_projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, self.aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::framing(1.0, 4.0 / 3.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_defaults() {
        let cam = Camera::framing(2.0, 1.5);
        assert_eq!(cam.translation, Vec3::new(0.0, 0.0, 6.0));
        assert!((cam.near - 0.02).abs() < 1e-6);
        assert!((cam.far - 12.0).abs() < 1e-6);
        assert!((cam.fov_y - 45f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn test_view_places_origin_in_front() {
        let cam = Camera::framing(1.0, 1.0);
        let p = cam.compute_view_matrix().transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 0.0, -3.0)).length() < 1e-5);
    }

    #[test]
    fn test_projection_depth_range() {
        let cam = Camera::framing(1.0, 1.0);
        let proj = cam.compute_projection_matrix();
        let near = proj.project_point3(Vec3::new(0.0, 0.0, -cam.near));
        let far = proj.project_point3(Vec3::new(0.0, 0.0, -cam.far));
        assert!(near.z.abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_aspect_ignores_zero_size() {
        let mut cam = Camera::default();
        cam.set_aspect(800, 400);
        assert_eq!(cam.aspect, 2.0);
        cam.set_aspect(0, 400);
        assert_eq!(cam.aspect, 2.0);
    }
}
