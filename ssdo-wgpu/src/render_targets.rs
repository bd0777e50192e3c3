//! Offscreen target registry for the SSDO pipeline.
//! Every intermediate buffer is allocated here, sized to the framebuffer,
//! and bound to render passes through `FramebufferBinding`s that are checked
//! for completeness before use.

use glam::Vec3;
use thiserror::Error;

use crate::graph::{Attachment, PassStage};

/// View-space position + linear depth. 32-bit so the 1.0 "no geometry"
/// sentinel stays distinguishable from the nearest stored depth.
pub const POSITION_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
/// Used for position+depth on adapters that cannot render 32-bit float.
/// Stored depth is clamped to `MAX_STORED_DEPTH`, which f16 keeps below 1.0.
pub const POSITION_DEPTH_FALLBACK_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
/// Normals and every lit intermediate.
pub const HDR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const ALBEDO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
/// Rotation-noise tile. Read with `textureLoad`, so never filtered.
pub const NOISE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TargetId {
    PositionDepth,
    Normal,
    Albedo,
    GeometryDepth,
    Lighting,
    Direct,
    DirectBlur,
    Indirect,
    IndirectBlur,
    Skybox,
    SkyboxDepth,
}

impl TargetId {
    pub const COUNT: usize = 11;

    /// Allocation order; also the index into the registry.
    pub const ALL: [TargetId; Self::COUNT] = [
        Self::PositionDepth,
        Self::Normal,
        Self::Albedo,
        Self::GeometryDepth,
        Self::Lighting,
        Self::Direct,
        Self::DirectBlur,
        Self::Indirect,
        Self::IndirectBlur,
        Self::Skybox,
        Self::SkyboxDepth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::PositionDepth => "GBuffer Position+Depth",
            Self::Normal => "GBuffer Normal",
            Self::Albedo => "GBuffer Albedo",
            Self::GeometryDepth => "GBuffer Depth",
            Self::Lighting => "Lighting",
            Self::Direct => "SSDO Direct",
            Self::DirectBlur => "SSDO Direct Blur",
            Self::Indirect => "SSDO Indirect",
            Self::IndirectBlur => "SSDO Indirect Blur",
            Self::Skybox => "Skybox",
            Self::SkyboxDepth => "Skybox Depth",
        }
    }

    /// Preferred format. The allocated one comes from `FormatSupport::target_format`.
    pub fn format(self) -> wgpu::TextureFormat {
        match self {
            Self::PositionDepth => POSITION_DEPTH_FORMAT,
            Self::Albedo => ALBEDO_FORMAT,
            Self::GeometryDepth | Self::SkyboxDepth => DEPTH_FORMAT,
            _ => HDR_FORMAT,
        }
    }

    pub fn is_depth(self) -> bool {
        self.format().is_depth_stencil_format()
    }

    /// Clear colour when bound as a colour attachment. Position+depth clears
    /// alpha to 1.0, the far sentinel every later stage tests against.
    pub fn clear_color(self) -> wgpu::Color {
        match self {
            Self::PositionDepth => wgpu::Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: 1.0,
            },
            _ => wgpu::Color::TRANSPARENT,
        }
    }
}

/// One GPU-resident offscreen buffer.
pub struct RenderTarget {
    pub id: TargetId,
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

impl RenderTarget {
    pub fn desc(&self) -> AttachmentDesc {
        AttachmentDesc {
            label: self.id.label(),
            format: self.format,
            width: self.width,
            height: self.height,
        }
    }
}

/// Render-attachment support of the active adapter, per format. Formats that
/// were never queried fall back to the WebGPU guarantees for `features`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormatSupport {
    features: wgpu::Features,
    reported: Vec<(wgpu::TextureFormat, wgpu::TextureUsages)>,
}

impl FormatSupport {
    /// Every format the registry may allocate.
    /// Every format the registry may allocate. The position+depth fallback
    /// shares `HDR_FORMAT`.
    pub const TARGET_FORMATS: [wgpu::TextureFormat; 4] =
        [POSITION_DEPTH_FORMAT, HDR_FORMAT, ALBEDO_FORMAT, DEPTH_FORMAT];

    pub fn guaranteed(features: wgpu::Features) -> Self {
        Self {
            features,
            reported: Vec::new(),
        }
    }

    /// Queries `adapter` for the target formats plus `extra` (the surface format).
    pub fn from_adapter(
        adapter: &wgpu::Adapter,
        features: wgpu::Features,
        extra: &[wgpu::TextureFormat],
    ) -> Self {
        Self::TARGET_FORMATS
            .iter()
            .chain(extra)
            .fold(Self::guaranteed(features), |support, &format| {
                support.with_usages(format, adapter.get_texture_format_features(format).allowed_usages)
            })
    }

    /// Records the usages the adapter reports for `format`.
    pub fn with_usages(mut self, format: wgpu::TextureFormat, usages: wgpu::TextureUsages) -> Self {
        self.reported.retain(|(f, _)| *f != format);
        self.reported.push((format, usages));
        self
    }

    /// Usages both guaranteed for the device features and reported by the adapter.
    pub fn allowed_usages(&self, format: wgpu::TextureFormat) -> wgpu::TextureUsages {
        let guaranteed = format.guaranteed_format_features(self.features).allowed_usages;
        match self.reported.iter().find(|(f, _)| *f == format) {
            Some(&(_, reported)) => guaranteed & reported,
            None => guaranteed,
        }
    }

    pub fn is_renderable(&self, format: wgpu::TextureFormat) -> bool {
        self.allowed_usages(format)
            .contains(wgpu::TextureUsages::RENDER_ATTACHMENT)
    }

    /// Format `id` is allocated with on this adapter.
    pub fn target_format(&self, id: TargetId) -> wgpu::TextureFormat {
        let preferred = id.format();
        if id == TargetId::PositionDepth
            && !self.is_renderable(preferred)
            && self.is_renderable(POSITION_DEPTH_FALLBACK_FORMAT)
        {
            POSITION_DEPTH_FALLBACK_FORMAT
        } else {
            preferred
        }
    }
}

/// Create a 2D render target with a specific format. A format the adapter
/// cannot render is allocated for sampling only; the stage writing it is then
/// reported incomplete by `FramebufferBinding::check`.
pub fn create_target(
    device: &wgpu::Device,
    id: TargetId,
    format: wgpu::TextureFormat,
    support: &FormatSupport,
    width: u32,
    height: u32,
) -> RenderTarget {
    let mut usage = wgpu::TextureUsages::TEXTURE_BINDING;
    if !format.is_depth_stencil_format() {
        usage |= wgpu::TextureUsages::COPY_SRC;
    }
    if support.is_renderable(format) {
        usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
    } else {
        log::warn!("{}: format {format:?} is not renderable on this adapter", id.label());
    }

    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(id.label()),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage,
        view_formats: &[],
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        log::warn!("Failed to allocate {} ({format:?}): {err}", id.label());
    }
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    RenderTarget {
        id,
        texture,
        view,
        format,
        width,
        height,
    }
}

/// Owns every offscreen target. Indexed by `TargetId`.
pub struct RenderTargetRegistry {
    targets: Vec<RenderTarget>,
    support: FormatSupport,
    width: u32,
    height: u32,
}

impl RenderTargetRegistry {
    pub fn new(device: &wgpu::Device, support: FormatSupport, width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1), height.max(1));
        let targets = TargetId::ALL
            .iter()
            .map(|&id| create_target(device, id, support.target_format(id), &support, width, height))
            .collect::<Vec<_>>();
        if targets[TargetId::PositionDepth as usize].format != POSITION_DEPTH_FORMAT {
            log::warn!(
                "{:?} is not renderable; storing position+depth as {:?}",
                POSITION_DEPTH_FORMAT,
                targets[TargetId::PositionDepth as usize].format
            );
        }
        log::info!("Allocated {} render targets ({}x{})", TargetId::COUNT, width, height);
        Self {
            targets,
            support,
            width,
            height,
        }
    }

    pub fn support(&self) -> &FormatSupport {
        &self.support
    }

    /// Targets whose allocated format the adapter cannot render to.
    pub fn unrenderable(&self) -> Vec<TargetId> {
        self.targets
            .iter()
            .filter(|t| !self.support.is_renderable(t.format))
            .map(|t| t.id)
            .collect()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, id: TargetId) -> &RenderTarget {
        &self.targets[id as usize]
    }

    pub fn view(&self, id: TargetId) -> &wgpu::TextureView {
        &self.get(id).view
    }

    /// Reallocates every target at the new size. Returns `false` (and keeps
    /// the old targets) for a zero-sized or unchanged request.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if width == 0 || height == 0 || (width, height) == (self.width, self.height) {
            return false;
        }
        for target in &mut self.targets {
            *target = create_target(device, target.id, target.format, &self.support, width, height);
        }
        self.width = width;
        self.height = height;
        log::info!("Render targets resized to {}x{}", width, height);
        true
    }

    /// Attachment set `stage` would bind, described from the allocated textures.
    pub fn binding(&self, stage: &PassStage, screen: AttachmentDesc) -> FramebufferBinding {
        let colors = stage
            .outputs
            .iter()
            .map(|a| match a {
                Attachment::Target(id) => self.get(*id).desc(),
                Attachment::Screen => screen,
            })
            .collect();
        FramebufferBinding {
            stage: stage.name,
            colors,
            depth: stage.depth.map(|id| self.get(id).desc()),
        }
    }

    /// Begins `stage`'s render pass on its declared attachments. Every
    /// attachment is cleared; the pass ends when the returned value drops.
    pub fn bind<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        stage: &PassStage,
        screen: &wgpu::TextureView,
        screen_clear: wgpu::Color,
    ) -> wgpu::RenderPass<'e> {
        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = stage
            .outputs
            .iter()
            .map(|a| {
                let (view, clear) = match a {
                    Attachment::Target(id) => (self.view(*id), id.clear_color()),
                    Attachment::Screen => (screen, screen_clear),
                };
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                })
            })
            .collect();

        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(stage.name),
            color_attachments: &color_attachments,
            depth_stencil_attachment: stage.depth.map(|id| wgpu::RenderPassDepthStencilAttachment {
                view: self.view(id),
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            ..Default::default()
        })
    }
}

/// Format and size of one attachment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttachmentDesc {
    pub label: &'static str,
    pub format: wgpu::TextureFormat,
    pub width: u32,
    pub height: u32,
}

/// What a pipeline was built to write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AttachmentLayout {
    pub colors: Vec<wgpu::TextureFormat>,
    pub depth: Option<wgpu::TextureFormat>,
}

/// The attachments actually bound for one stage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FramebufferBinding {
    pub stage: &'static str,
    pub colors: Vec<AttachmentDesc>,
    pub depth: Option<AttachmentDesc>,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Incompleteness {
    #[error("no colour or depth attachment")]
    NoAttachments,
    #[error("{actual} colour attachments bound, pipeline writes {expected}")]
    AttachmentCount { expected: usize, actual: usize },
    #[error("{label}: format {actual:?}, pipeline expects {expected:?}")]
    FormatMismatch {
        label: &'static str,
        expected: wgpu::TextureFormat,
        actual: wgpu::TextureFormat,
    },
    #[error("{label}: format {format:?} is not renderable")]
    NotRenderable {
        label: &'static str,
        format: wgpu::TextureFormat,
    },
    #[error("{label}: depth format {format:?} in a colour slot")]
    DepthInColorSlot {
        label: &'static str,
        format: wgpu::TextureFormat,
    },
    #[error("{label}: depth slot holds colour format {format:?}")]
    ColorInDepthSlot {
        label: &'static str,
        format: wgpu::TextureFormat,
    },
    #[error("depth attachment {present}, pipeline expects {expected}")]
    DepthPresence { expected: bool, present: bool },
    #[error("{label}: {width}x{height} differs from {expected_width}x{expected_height}")]
    SizeMismatch {
        label: &'static str,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },
}

impl FramebufferBinding {
    /// Completeness against the pipeline's expected layout on the adapter
    /// described by `support`.
    pub fn check(
        &self,
        expected: &AttachmentLayout,
        support: &FormatSupport,
    ) -> Result<(), Incompleteness> {
        if self.colors.is_empty() && self.depth.is_none() {
            return Err(Incompleteness::NoAttachments);
        }
        if self.colors.len() != expected.colors.len() {
            return Err(Incompleteness::AttachmentCount {
                expected: expected.colors.len(),
                actual: self.colors.len(),
            });
        }
        for (a, &want) in self.colors.iter().zip(&expected.colors) {
            if a.format.is_depth_stencil_format() {
                return Err(Incompleteness::DepthInColorSlot {
                    label: a.label,
                    format: a.format,
                });
            }
            if !support.is_renderable(a.format) {
                return Err(Incompleteness::NotRenderable {
                    label: a.label,
                    format: a.format,
                });
            }
            if a.format != want {
                return Err(Incompleteness::FormatMismatch {
                    label: a.label,
                    expected: want,
                    actual: a.format,
                });
            }
        }
        match (&self.depth, expected.depth) {
            (Some(d), Some(want)) => {
                if !d.format.is_depth_stencil_format() {
                    return Err(Incompleteness::ColorInDepthSlot {
                        label: d.label,
                        format: d.format,
                    });
                }
                if !support.is_renderable(d.format) {
                    return Err(Incompleteness::NotRenderable {
                        label: d.label,
                        format: d.format,
                    });
                }
                if d.format != want {
                    return Err(Incompleteness::FormatMismatch {
                        label: d.label,
                        expected: want,
                        actual: d.format,
                    });
                }
            }
            (None, None) => {}
            (present, expected) => {
                return Err(Incompleteness::DepthPresence {
                    expected: expected.is_some(),
                    present: present.is_some(),
                })
            }
        }
        let mut all = self.colors.iter().chain(&self.depth);
        if let Some(first) = all.next() {
            if let Some(odd) = all.find(|a| (a.width, a.height) != (first.width, first.height)) {
                return Err(Incompleteness::SizeMismatch {
                    label: odd.label,
                    width: odd.width,
                    height: odd.height,
                    expected_width: first.width,
                    expected_height: first.height,
                });
            }
        }
        Ok(())
    }
}

/// Upload the rotation-noise tile as a `side`x`side` texture.
pub fn create_noise_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    noise: &[Vec3],
    side: u32,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texel_count = (side * side) as usize;
    let mut noise_data: Vec<f32> = Vec::with_capacity(texel_count * 4);
    for v in noise.iter().chain(std::iter::repeat(&Vec3::X)).take(texel_count) {
        noise_data.extend_from_slice(&[v.x, v.y, v.z, 0.0]);
    }

    let size = wgpu::Extent3d {
        width: side,
        height: side,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("SSDO Noise"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: NOISE_FORMAT,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        bytemuck::cast_slice(&noise_data),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(16 * side),
            rows_per_image: Some(side),
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Unit cube as 36 non-indexed positions, for the skybox draw.
pub fn create_skybox_cube_vbo(device: &wgpu::Device) -> wgpu::Buffer {
    use wgpu::util::DeviceExt;

    #[rustfmt::skip]
    let vertices: [f32; 108] = [
        -1.0,  1.0, -1.0,  -1.0, -1.0, -1.0,   1.0, -1.0, -1.0,
         1.0, -1.0, -1.0,   1.0,  1.0, -1.0,  -1.0,  1.0, -1.0,

        -1.0, -1.0,  1.0,  -1.0, -1.0, -1.0,  -1.0,  1.0, -1.0,
        -1.0,  1.0, -1.0,  -1.0,  1.0,  1.0,  -1.0, -1.0,  1.0,

         1.0, -1.0, -1.0,   1.0, -1.0,  1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,   1.0,  1.0, -1.0,   1.0, -1.0, -1.0,

        -1.0, -1.0,  1.0,  -1.0,  1.0,  1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,   1.0, -1.0,  1.0,  -1.0, -1.0,  1.0,

        -1.0,  1.0, -1.0,   1.0,  1.0, -1.0,   1.0,  1.0,  1.0,
         1.0,  1.0,  1.0,  -1.0,  1.0,  1.0,  -1.0,  1.0, -1.0,

        -1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0, -1.0,
         1.0, -1.0, -1.0,  -1.0, -1.0,  1.0,   1.0, -1.0,  1.0,
    ];

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Skybox Cube VBO"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
    })
}

/// Vertex count of the skybox cube buffer.
pub const SKYBOX_VERTEX_COUNT: u32 = 36;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{stage, StageId};

    fn desc(label: &'static str, format: wgpu::TextureFormat, w: u32, h: u32) -> AttachmentDesc {
        AttachmentDesc {
            label,
            format,
            width: w,
            height: h,
        }
    }

    fn support() -> FormatSupport {
        FormatSupport::guaranteed(wgpu::Features::empty())
    }

    /// An adapter that samples 32-bit float but cannot render to it.
    fn downlevel_support() -> FormatSupport {
        support().with_usages(
            POSITION_DEPTH_FORMAT,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
        )
    }

    fn geometry_layout() -> AttachmentLayout {
        AttachmentLayout {
            colors: vec![POSITION_DEPTH_FORMAT, HDR_FORMAT, ALBEDO_FORMAT],
            depth: Some(DEPTH_FORMAT),
        }
    }

    fn geometry_binding() -> FramebufferBinding {
        FramebufferBinding {
            stage: "Geometry",
            colors: vec![
                desc("pd", POSITION_DEPTH_FORMAT, 64, 64),
                desc("n", HDR_FORMAT, 64, 64),
                desc("a", ALBEDO_FORMAT, 64, 64),
            ],
            depth: Some(desc("d", DEPTH_FORMAT, 64, 64)),
        }
    }

    #[test]
    fn test_matching_binding_is_complete() {
        geometry_binding()
            .check(&geometry_layout(), &support())
            .unwrap();
    }

    #[test]
    fn test_empty_binding_incomplete() {
        let b = FramebufferBinding {
            stage: "Empty",
            colors: vec![],
            depth: None,
        };
        assert_eq!(
            b.check(&AttachmentLayout::default(), &support()),
            Err(Incompleteness::NoAttachments)
        );
    }

    #[test]
    fn test_unrenderable_format_reported() {
        let mut b = geometry_binding();
        b.colors[1].format = wgpu::TextureFormat::Rgb9e5Ufloat;
        assert!(matches!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::NotRenderable { label: "n", .. })
        ));
    }

    #[test]
    fn test_format_rejected_by_adapter_reported() {
        // Guaranteed renderable, but this adapter says otherwise.
        assert!(support().is_renderable(POSITION_DEPTH_FORMAT));
        assert!(!downlevel_support().is_renderable(POSITION_DEPTH_FORMAT));
        assert_eq!(
            geometry_binding().check(&geometry_layout(), &downlevel_support()),
            Err(Incompleteness::NotRenderable {
                label: "pd",
                format: POSITION_DEPTH_FORMAT
            })
        );
    }

    #[test]
    fn test_rejected_depth_format_reported() {
        let s = support().with_usages(DEPTH_FORMAT, wgpu::TextureUsages::TEXTURE_BINDING);
        assert!(matches!(
            geometry_binding().check(&geometry_layout(), &s),
            Err(Incompleteness::NotRenderable { label: "d", .. })
        ));
    }

    #[test]
    fn test_position_depth_falls_back_to_half_float() {
        assert_eq!(support().target_format(TargetId::PositionDepth), POSITION_DEPTH_FORMAT);
        let s = downlevel_support();
        assert_eq!(s.target_format(TargetId::PositionDepth), POSITION_DEPTH_FALLBACK_FORMAT);
        for id in TargetId::ALL.into_iter().filter(|&id| id != TargetId::PositionDepth) {
            assert_eq!(s.target_format(id), id.format(), "{id:?}");
        }

        // No fallback either: keep the preferred format and let the check report it.
        let none = s.with_usages(POSITION_DEPTH_FALLBACK_FORMAT, wgpu::TextureUsages::TEXTURE_BINDING);
        assert_eq!(none.target_format(TargetId::PositionDepth), POSITION_DEPTH_FORMAT);
    }

    #[test]
    fn test_count_and_format_mismatch_reported() {
        let mut b = geometry_binding();
        b.colors.pop();
        assert_eq!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::AttachmentCount {
                expected: 3,
                actual: 2
            })
        );

        let mut b = geometry_binding();
        b.colors[2].format = HDR_FORMAT;
        assert!(matches!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::FormatMismatch { label: "a", .. })
        ));
    }

    #[test]
    fn test_depth_slot_rules() {
        let mut b = geometry_binding();
        b.colors[0].format = DEPTH_FORMAT;
        assert!(matches!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::DepthInColorSlot { .. })
        ));

        let mut b = geometry_binding();
        b.depth = Some(desc("d", HDR_FORMAT, 64, 64));
        assert!(matches!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::ColorInDepthSlot { .. })
        ));

        let mut b = geometry_binding();
        b.depth = None;
        assert_eq!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::DepthPresence {
                expected: true,
                present: false
            })
        );
    }

    #[test]
    fn test_size_mismatch_reported() {
        let mut b = geometry_binding();
        b.depth = Some(desc("d", DEPTH_FORMAT, 32, 64));
        assert!(matches!(
            b.check(&geometry_layout(), &support()),
            Err(Incompleteness::SizeMismatch { label: "d", width: 32, .. })
        ));
    }

    #[test]
    fn test_declared_stage_formats_are_renderable() {
        for id in TargetId::ALL {
            let format = id.format();
            assert!(support().is_renderable(format), "{id:?}");
            assert_eq!(id.is_depth(), matches!(id, TargetId::GeometryDepth | TargetId::SkyboxDepth));
        }
        // The geometry stage writes exactly the G-buffer formats.
        let g = stage(StageId::Geometry);
        let formats: Vec<_> = g
            .outputs
            .iter()
            .filter_map(|a| match a {
                Attachment::Target(id) => Some(id.format()),
                Attachment::Screen => None,
            })
            .collect();
        assert_eq!(formats, geometry_layout().colors);
    }

    #[test]
    fn test_target_index_matches_declaration() {
        for (i, id) in TargetId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, i);
        }
    }
}
