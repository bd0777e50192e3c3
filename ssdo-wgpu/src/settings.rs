//! Render configuration. Validated once at initialisation.

use glam::{Vec3, Vec4};
use ssdo_gpu_shared::sampling::{DEFAULT_KERNEL_SIZE, DEFAULT_NOISE_SIZE};
use ssdo_gpu_shared::uniforms::MAX_KERNEL_SIZE;

use crate::error::{RenderError, Result};

/// Point light, given in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLightSettings {
    pub position: Vec3,
    pub color: Vec3,
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Default for PointLightSettings {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            color: Vec3::new(0.8, 0.8, 0.6),
            constant: 1.0,
            linear: 0.09,
            quadratic: 0.032,
        }
    }
}

/// Weights used by the `Combined` and `Final` composite modes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompositeWeights {
    pub lighting: f32,
    pub direct: f32,
    pub indirect: f32,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            lighting: 1.0,
            direct: 0.5,
            indirect: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderSettings {
    pub kernel_size: usize,
    /// Must be a perfect square; the noise tile side is its root.
    pub noise_size: usize,
    pub ssdo_radius: f32,
    pub ssdo_bias: f32,
    pub direct_strength: f32,
    pub indirect_strength: f32,
    /// Box blur covers `2 * blur_half_extent` texels per axis.
    pub blur_half_extent: i32,
    pub clear_color: Vec3,
    pub albedo: Vec4,
    pub ambient: f32,
    pub light: PointLightSettings,
    pub weights: CompositeWeights,
    pub window_width: u32,
    pub window_height: u32,
    pub window_title: String,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            kernel_size: DEFAULT_KERNEL_SIZE,
            noise_size: DEFAULT_NOISE_SIZE,
            ssdo_radius: 0.5,
            ssdo_bias: 0.025,
            direct_strength: 1.0,
            indirect_strength: 4.0,
            blur_half_extent: 2,
            clear_color: Vec3::splat(0.2),
            albedo: Vec4::new(0.9, 0.9, 0.9, 1.0),
            ambient: 0.1,
            light: PointLightSettings::default(),
            weights: CompositeWeights::default(),
            window_width: 1024,
            window_height: 768,
            window_title: "SSDO".to_string(),
        }
    }
}

impl RenderSettings {
    /// Side length of the square noise tile.
    pub fn noise_side(&self) -> u32 {
        (self.noise_size as f64).sqrt().round() as u32
    }

    pub fn validate(&self) -> Result<()> {
        if self.kernel_size == 0 || self.kernel_size > MAX_KERNEL_SIZE {
            return Err(RenderError::Settings(format!(
                "kernel size {} outside 1..={MAX_KERNEL_SIZE}",
                self.kernel_size
            )));
        }
        let side = self.noise_side() as usize;
        if self.noise_size == 0 || side * side != self.noise_size {
            return Err(RenderError::Settings(format!(
                "noise size {} is not a non-zero perfect square",
                self.noise_size
            )));
        }
        if !(self.ssdo_radius > 0.0) {
            return Err(RenderError::Settings(format!(
                "SSDO radius must be positive, got {}",
                self.ssdo_radius
            )));
        }
        if self.blur_half_extent < 1 {
            return Err(RenderError::Settings(format!(
                "blur half extent must be at least 1, got {}",
                self.blur_half_extent
            )));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(RenderError::Settings("window size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let s = RenderSettings::default();
        s.validate().unwrap();
        assert_eq!(s.kernel_size, 64);
        assert_eq!(s.noise_side(), 4);
        assert_eq!((s.window_width, s.window_height), (1024, 768));
    }

    #[test]
    fn test_rejects_oversized_kernel() {
        let s = RenderSettings {
            kernel_size: MAX_KERNEL_SIZE + 1,
            ..Default::default()
        };
        assert!(matches!(s.validate(), Err(RenderError::Settings(_))));
    }

    #[test]
    fn test_rejects_non_square_noise() {
        for noise_size in [0, 15, 18] {
            let s = RenderSettings {
                noise_size,
                ..Default::default()
            };
            assert!(s.validate().is_err(), "noise size {noise_size} accepted");
        }
        let s = RenderSettings {
            noise_size: 9,
            ..Default::default()
        };
        s.validate().unwrap();
        assert_eq!(s.noise_side(), 3);
    }

    #[test]
    fn test_rejects_zero_radius_and_blur() {
        let s = RenderSettings {
            ssdo_radius: 0.0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
        let s = RenderSettings {
            blur_half_extent: 0,
            ..Default::default()
        };
        assert!(s.validate().is_err());
    }
}
