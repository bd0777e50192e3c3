//! Sample kernels for the SSDO estimators.
//! Hemisphere kernel (weighted toward the origin) and the disk rotation-noise tile.

use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;

/// Default number of hemisphere samples uploaded to the SSDO passes.
pub const DEFAULT_KERNEL_SIZE: usize = 64;
/// Default number of rotation vectors in the noise tile (4x4 texture).
pub const DEFAULT_NOISE_SIZE: usize = 16;

/// Uniform point on the +z unit hemisphere.
///
/// The polar cosine is drawn on [-1, 1) and folded to its absolute value
/// instead of rejecting negative draws.
pub fn uniform_hemisphere<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let z = 2.0 * rng.gen::<f32>() - 1.0;
    let theta = 2.0 * PI * rng.gen::<f32>();
    let r = (1.0 - z * z).max(0.0).sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), z.abs())
}

/// Uniform point inside the unit disk, z = 0.
pub fn uniform_disk<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = 2.0 * PI * rng.gen::<f32>();
    let r = rng.gen::<f32>().sqrt();
    Vec3::new(r * theta.cos(), r * theta.sin(), 0.0)
}

/// Ease-in quadratic scale for kernel index `i` out of `count`: lerp(0.1, 1.0, (i/count)^2).
pub fn kernel_scale(i: usize, count: usize) -> f32 {
    if count == 0 {
        return 0.1;
    }
    let t = i as f32 / count as f32;
    lerp(0.1, 1.0, t * t)
}

/// Hemisphere kernel of `count` samples drawn from `rng`.
pub fn generate_kernel_with<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Vec3> {
    (0..count)
        .map(|i| uniform_hemisphere(rng) * kernel_scale(i, count))
        .collect()
}

/// Hemisphere kernel from the thread-local generator. Values differ between runs.
pub fn generate_kernel(count: usize) -> Vec<Vec3> {
    generate_kernel_with(count, &mut rand::thread_rng())
}

/// Rotation-noise tile of `count` disk samples drawn from `rng`.
pub fn generate_noise_with<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<Vec3> {
    (0..count).map(|_| uniform_disk(rng)).collect()
}

/// Rotation-noise tile from the thread-local generator.
pub fn generate_noise(count: usize) -> Vec<Vec3> {
    generate_noise_with(count, &mut rand::thread_rng())
}

fn lerp(a: f32, b: f32, f: f32) -> f32 {
    a + f * (b - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_kernel_length_matches_count() {
        let mut rng = StdRng::seed_from_u64(7);
        for count in [0, 1, 2, 16, 64, 129] {
            assert_eq!(generate_kernel_with(count, &mut rng).len(), count);
        }
    }

    #[test]
    fn test_kernel_empty_for_zero() {
        assert!(generate_kernel(0).is_empty());
        assert!(generate_noise(0).is_empty());
    }

    #[test]
    fn test_kernel_upper_hemisphere_and_bounded() {
        let mut rng = StdRng::seed_from_u64(11);
        let kernel = generate_kernel_with(512, &mut rng);
        for s in &kernel {
            assert!(s.z >= 0.0, "negative z in {s:?}");
            assert!(s.length() <= 1.0 + EPS, "sample outside unit ball: {s:?}");
        }
    }

    #[test]
    fn test_kernel_sample_length_equals_scale() {
        // Hemisphere points are unit length, so each sample's length is its scale.
        let mut rng = StdRng::seed_from_u64(3);
        let kernel = generate_kernel_with(64, &mut rng);
        for (i, s) in kernel.iter().enumerate() {
            assert!((s.length() - kernel_scale(i, 64)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_kernel_scale_monotonic() {
        for count in [2, 3, 16, 64] {
            for i in 0..count - 1 {
                assert!(kernel_scale(i, count) <= kernel_scale(i + 1, count));
            }
            assert!((kernel_scale(0, count) - 0.1).abs() < EPS);
            assert!(kernel_scale(count - 1, count) < 1.0);
        }
    }

    #[test]
    fn test_noise_on_disk() {
        let mut rng = StdRng::seed_from_u64(5);
        let noise = generate_noise_with(256, &mut rng);
        assert_eq!(noise.len(), 256);
        for n in &noise {
            assert_eq!(n.z, 0.0);
            assert!(n.truncate().length() <= 1.0 + EPS);
        }
    }

    #[test]
    fn test_repeated_generation_same_shape_different_values() {
        let mut a = StdRng::seed_from_u64(1);
        let mut b = StdRng::seed_from_u64(2);
        let ka = generate_kernel_with(DEFAULT_KERNEL_SIZE, &mut a);
        let kb = generate_kernel_with(DEFAULT_KERNEL_SIZE, &mut b);
        assert_eq!(ka.len(), kb.len());
        assert_ne!(ka, kb);

        let na = generate_noise(DEFAULT_NOISE_SIZE);
        let nb = generate_noise(DEFAULT_NOISE_SIZE);
        assert_eq!(na.len(), nb.len());
        assert!(na.iter().chain(&nb).all(|v| v.z == 0.0));
    }

    #[test]
    fn test_hemisphere_covers_both_x_signs() {
        // Folding z must not bias the azimuth.
        let mut rng = StdRng::seed_from_u64(99);
        let samples: Vec<Vec3> = (0..1000).map(|_| uniform_hemisphere(&mut rng)).collect();
        let positive = samples.iter().filter(|s| s.x > 0.0).count();
        assert!((350..650).contains(&positive), "skewed azimuth: {positive}/1000");
        let mean_z = samples.iter().map(|s| s.z).sum::<f32>() / samples.len() as f32;
        assert!((mean_z - 0.5).abs() < 0.05, "mean z {mean_z}");
    }
}
