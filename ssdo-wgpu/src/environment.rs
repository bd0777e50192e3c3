//! Environment cubemap: six skybox faces from disk, or a procedural gradient
//! sky when any face is missing.

use std::path::{Path, PathBuf};

use crate::error::{RenderError, Result};

/// Face file stems in cube-layer order (+X, -X, +Y, -Y, +Z, -Z).
pub const FACE_NAMES: [&str; 6] = ["right", "left", "top", "bottom", "back", "front"];
pub const PROCEDURAL_FACE_SIZE: u32 = 64;
const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

pub struct EnvironmentMap {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub face_size: u32,
}

impl EnvironmentMap {
    /// Loads `<dir>/<face>.jpg` for every face, falling back to the procedural
    /// sky (with a warning) when any face cannot be read.
    pub fn load_or_procedural(device: &wgpu::Device, queue: &wgpu::Queue, dir: &Path) -> Self {
        let paths = face_paths(dir, "jpg");
        match Self::from_faces(device, queue, &paths) {
            Ok(env) => {
                log::info!("Loaded skybox from {} ({}px faces)", dir.display(), env.face_size);
                env
            }
            Err(e) => {
                log::warn!("{e}; using procedural sky");
                Self::procedural(device, queue, PROCEDURAL_FACE_SIZE)
            }
        }
    }

    /// Six square faces of equal size.
    pub fn from_faces(device: &wgpu::Device, queue: &wgpu::Queue, paths: &[PathBuf; 6]) -> Result<Self> {
        let mut faces = Vec::with_capacity(6);
        for path in paths {
            let img = image::open(path).map_err(|e| RenderError::Environment {
                path: path.clone(),
                message: e.to_string(),
            })?;
            faces.push(img.to_rgba8());
        }
        let size = faces[0].width();
        for (path, face) in paths.iter().zip(&faces) {
            if face.width() != size || face.height() != size {
                return Err(RenderError::Environment {
                    path: path.clone(),
                    message: format!(
                        "face is {}x{}, expected {size}x{size}",
                        face.width(),
                        face.height()
                    ),
                });
            }
        }
        let data: Vec<&[u8]> = faces.iter().map(|f| f.as_raw().as_slice()).collect();
        Ok(Self::upload(device, queue, size, "Skybox Cubemap", &data))
    }

    /// Gradient sky: horizon white to zenith blue, dark ground.
    pub fn procedural(device: &wgpu::Device, queue: &wgpu::Queue, size: u32) -> Self {
        let faces: Vec<Vec<u8>> = (0..6).map(|face| procedural_face(face, size)).collect();
        let data: Vec<&[u8]> = faces.iter().map(Vec::as_slice).collect();
        Self::upload(device, queue, size, "Procedural Sky Cubemap", &data)
    }

    fn upload(device: &wgpu::Device, queue: &wgpu::Queue, size: u32, label: &str, faces: &[&[u8]]) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: 6,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (face, data) in faces.iter().enumerate() {
            queue.write_texture(
                wgpu::ImageCopyTexture {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: face as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                data,
                wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * size),
                    rows_per_image: Some(size),
                },
                wgpu::Extent3d {
                    width: size,
                    height: size,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            dimension: Some(wgpu::TextureViewDimension::Cube),
            ..Default::default()
        });

        Self {
            texture,
            view,
            face_size: size,
        }
    }
}

pub fn face_paths(dir: &Path, extension: &str) -> [PathBuf; 6] {
    FACE_NAMES.map(|name| dir.join(format!("{name}.{extension}")))
}

/// RGBA8 texels of one procedural sky face.
pub fn procedural_face(face: u32, size: u32) -> Vec<u8> {
    let mut face_data = vec![0u8; (size * size * 4) as usize];
    for y in 0..size {
        for x in 0..size {
            let up = cubemap_direction(face, x, y, size)[1];
            let (r, g, b) = if up > 0.0 {
                (lerp(0.8, 0.3, up), lerp(0.85, 0.5, up), 0.9)
            } else {
                let t = (-up).min(1.0);
                (lerp(0.5, 0.2, t), lerp(0.5, 0.2, t), lerp(0.5, 0.2, t))
            };
            let idx = ((y * size + x) * 4) as usize;
            face_data[idx] = (r * 255.0) as u8;
            face_data[idx + 1] = (g * 255.0) as u8;
            face_data[idx + 2] = (b * 255.0) as u8;
            face_data[idx + 3] = 255;
        }
    }
    face_data
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Unit direction through texel (x, y) of cube face `face`.
pub fn cubemap_direction(face: u32, x: u32, y: u32, size: u32) -> [f32; 3] {
    let u = (x as f32 + 0.5) / size as f32 * 2.0 - 1.0;
    let v = (y as f32 + 0.5) / size as f32 * 2.0 - 1.0;

    let dir = match face {
        0 => [1.0, -v, -u],
        1 => [-1.0, -v, u],
        2 => [u, 1.0, v],
        3 => [u, -1.0, -v],
        4 => [u, -v, 1.0],
        _ => [-u, -v, -1.0],
    };

    let len = (dir[0] * dir[0] + dir[1] * dir[1] + dir[2] * dir[2]).sqrt();
    [dir[0] / len, dir[1] / len, dir[2] / len]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_paths_order() {
        let paths = face_paths(Path::new("sky"), "jpg");
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_stem().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["right", "left", "top", "bottom", "back", "front"]);
        assert!(paths[0].ends_with("right.jpg"));
    }

    #[test]
    fn test_cubemap_direction_face_axes() {
        let centre = |face| cubemap_direction(face, 1, 1, 3);
        assert_eq!(centre(0), [1.0, 0.0, 0.0]);
        assert_eq!(centre(1), [-1.0, 0.0, 0.0]);
        assert_eq!(centre(2), [0.0, 1.0, 0.0]);
        assert_eq!(centre(3), [0.0, -1.0, 0.0]);
        assert_eq!(centre(4), [0.0, 0.0, 1.0]);
        assert_eq!(centre(5), [0.0, 0.0, -1.0]);
    }

    #[test]
    fn test_procedural_sky_brighter_above() {
        let size = 8;
        let top = procedural_face(2, size);
        let bottom = procedural_face(3, size);
        assert_eq!(top.len(), (size * size * 4) as usize);
        // Zenith is blue-dominant, ground grey.
        assert!(top[2] > top[0]);
        assert!(bottom[0] == bottom[1] && bottom[1] == bottom[2]);
        assert!(top.iter().skip(3).step_by(4).all(|&a| a == 255));
    }
}
