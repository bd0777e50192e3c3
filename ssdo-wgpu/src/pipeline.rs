//! Render pipeline creation for the SSDO passes.
//! Full-screen stages derive their bind-group layout from the declared pass
//! graph, so a stage's input unit is the binding slot its shader reads.

use ssdo_gpu_shared::shaders;

use crate::error::{RenderError, Result};
use crate::graph::{Attachment, InputSource, PassStage};
use crate::render_targets::{AttachmentLayout, FormatSupport, RenderTargetRegistry, DEPTH_FORMAT};

/// Shared fullscreen vertex state (vertex-index full-screen triangle).
fn fullscreen_vertex_state(module: &wgpu::ShaderModule) -> wgpu::VertexState<'_> {
    wgpu::VertexState {
        module,
        entry_point: Some("vs_main"),
        compilation_options: wgpu::PipelineCompilationOptions::default(),
        buffers: &[],
    }
}

/// Standard depth state for the geometry pass.
fn depth_stencil_rw() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: true,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// Skybox sits exactly on the far plane, so equality must pass.
fn depth_stencil_skybox() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::LessEqual,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

fn color_targets(layout: &AttachmentLayout) -> Vec<Option<wgpu::ColorTargetState>> {
    layout
        .colors
        .iter()
        .map(|&format| {
            Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })
        })
        .collect()
}

/// Formats `stage` writes, as allocated in `targets`. `screen_format` stands
/// in for `Attachment::Screen`.
pub fn attachment_layout(
    stage: &PassStage,
    screen_format: wgpu::TextureFormat,
    targets: &RenderTargetRegistry,
) -> AttachmentLayout {
    AttachmentLayout {
        colors: stage
            .outputs
            .iter()
            .map(|a| match a {
                Attachment::Target(id) => targets.get(*id).format,
                Attachment::Screen => screen_format,
            })
            .collect(),
        depth: stage.depth.map(|id| targets.get(id).format),
    }
}

/// Whether every attachment in `layout` can be rendered on this adapter.
/// Building a pipeline for anything else is a validation error.
pub fn layout_renderable(layout: &AttachmentLayout, support: &FormatSupport) -> bool {
    layout
        .colors
        .iter()
        .chain(&layout.depth)
        .all(|&format| support.is_renderable(format))
}

/// Run `create` inside a validation error scope; a captured error is fatal.
pub fn with_validation<T>(device: &wgpu::Device, label: &str, create: impl FnOnce() -> T) -> Result<T> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(err) => Err(RenderError::Pipeline {
            label: label.to_string(),
            message: err.to_string(),
        }),
    }
}

pub fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

/// Single-uniform layout (geometry frame/object blocks, sample kernel).
pub fn create_uniform_bgl(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[uniform_entry(0, visibility)],
    })
}

/// Layout entries for a stage: 0 = uniform, 1..=N = declared inputs,
/// N+1 = nearest sampler, N+2 = linear sampler.
pub fn stage_layout_entries(stage: &PassStage) -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = vec![uniform_entry(
        0,
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
    )];

    for input in stage.inputs {
        let (sample_type, view_dimension) = match input.source {
            // Offscreen targets include 32-bit float formats: sampled unfiltered.
            InputSource::Target(_) | InputSource::Noise => (
                wgpu::TextureSampleType::Float { filterable: false },
                wgpu::TextureViewDimension::D2,
            ),
            InputSource::Environment => (
                wgpu::TextureSampleType::Float { filterable: true },
                wgpu::TextureViewDimension::Cube,
            ),
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: input.unit,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type,
                view_dimension,
                multisampled: false,
            },
            count: None,
        });
    }

    let first_sampler = stage.inputs.len() as u32 + 1;
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: first_sampler,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering),
        count: None,
    });
    entries.push(wgpu::BindGroupLayoutEntry {
        binding: first_sampler + 1,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    });
    entries
}

pub fn create_stage_bgl(device: &wgpu::Device, stage: &PassStage) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(&format!("{} BGL", stage.name)),
        entries: &stage_layout_entries(stage),
    })
}

// ============================================================
// Geometry Pipeline
// ============================================================

pub fn create_geometry_pipeline(
    device: &wgpu::Device,
    frame_bgl: &wgpu::BindGroupLayout,
    object_bgl: &wgpu::BindGroupLayout,
    layout: &AttachmentLayout,
    polygon_mode: wgpu::PolygonMode,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Geometry Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::GEOMETRY_SHADER.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Geometry Pipeline Layout"),
        bind_group_layouts: &[frame_bgl, object_bgl],
        push_constant_ranges: &[],
    });

    let label = match polygon_mode {
        wgpu::PolygonMode::Fill => "Geometry Pipeline",
        _ => "Geometry Wireframe Pipeline",
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[
                // location 0: position vec3
                wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 0,
                    }],
                },
                // location 1: normal vec3
                wgpu::VertexBufferLayout {
                    array_stride: 12,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[wgpu::VertexAttribute {
                        format: wgpu::VertexFormat::Float32x3,
                        offset: 0,
                        shader_location: 1,
                    }],
                },
            ],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &color_targets(layout),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_rw()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Full-screen stages (lighting, SSDO, blur, mixer)
// ============================================================

pub fn create_fullscreen_pipeline(
    device: &wgpu::Device,
    label: &str,
    frag_source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
    layout: &AttachmentLayout,
) -> wgpu::RenderPipeline {
    let vert_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Fullscreen Vert"),
        source: wgpu::ShaderSource::Wgsl(shaders::FULLSCREEN_QUAD_VERT.into()),
    });

    let frag_module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(frag_source.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(&format!("{label} Layout")),
        bind_group_layouts,
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: fullscreen_vertex_state(&vert_module),
        fragment: Some(wgpu::FragmentState {
            module: &frag_module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &color_targets(layout),
        }),
        primitive: wgpu::PrimitiveState::default(),
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

// ============================================================
// Skybox Pipeline
// ============================================================

pub fn create_skybox_pipeline(
    device: &wgpu::Device,
    bgl: &wgpu::BindGroupLayout,
    layout: &AttachmentLayout,
) -> wgpu::RenderPipeline {
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Skybox Shader"),
        source: wgpu::ShaderSource::Wgsl(shaders::SKYBOX_SHADER.into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Skybox Pipeline Layout"),
        bind_group_layouts: &[bgl],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Skybox Pipeline"),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: &module,
            entry_point: Some("vs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: 12,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    format: wgpu::VertexFormat::Float32x3,
                    offset: 0,
                    shader_location: 0,
                }],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &module,
            entry_point: Some("fs_main"),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            targets: &color_targets(layout),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            cull_mode: None,
            ..Default::default()
        },
        depth_stencil: Some(depth_stencil_skybox()),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{stage, StageId, STAGES};
    use crate::render_targets::{ALBEDO_FORMAT, HDR_FORMAT, POSITION_DEPTH_FORMAT};

    #[test]
    fn test_stage_layout_slots_follow_declaration() {
        for s in &STAGES {
            let entries = stage_layout_entries(s);
            let n = s.inputs.len();
            assert_eq!(entries.len(), n + 3, "{}", s.name);
            for (slot, entry) in entries.iter().enumerate() {
                assert_eq!(entry.binding as usize, slot);
            }
            assert!(matches!(
                entries[n + 1].ty,
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::NonFiltering)
            ));
            assert!(matches!(
                entries[n + 2].ty,
                wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering)
            ));
        }
    }

    #[test]
    fn test_environment_binds_as_cube() {
        let entries = stage_layout_entries(stage(StageId::SsdoDirect));
        assert!(matches!(
            entries[4].ty,
            wgpu::BindingType::Texture {
                view_dimension: wgpu::TextureViewDimension::Cube,
                ..
            }
        ));
        assert!(matches!(
            entries[3].ty,
            wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: false },
                view_dimension: wgpu::TextureViewDimension::D2,
                ..
            }
        ));
    }

    #[test]
    fn test_layout_renderable_checks_every_attachment() {
        let geometry = AttachmentLayout {
            colors: vec![POSITION_DEPTH_FORMAT, HDR_FORMAT, ALBEDO_FORMAT],
            depth: Some(DEPTH_FORMAT),
        };
        let support = FormatSupport::guaranteed(wgpu::Features::empty());
        assert!(layout_renderable(&geometry, &support));

        let no_f32 = support.clone().with_usages(POSITION_DEPTH_FORMAT, wgpu::TextureUsages::TEXTURE_BINDING);
        assert!(!layout_renderable(&geometry, &no_f32));

        let no_depth = support.with_usages(DEPTH_FORMAT, wgpu::TextureUsages::TEXTURE_BINDING);
        assert!(!layout_renderable(&geometry, &no_depth));

        // A mixer layout never touches position+depth.
        let mixer = AttachmentLayout {
            colors: vec![wgpu::TextureFormat::Rgba8Unorm],
            depth: None,
        };
        assert!(layout_renderable(&mixer, &no_f32));
    }
}
