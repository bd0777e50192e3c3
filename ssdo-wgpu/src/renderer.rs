//! Frame driver for the SSDO pass pipeline.
//!
//! Owns every pipeline, layout, uniform buffer and bind group. Each frame it
//! writes the per-frame uniforms, then walks `graph::STAGES` in order: check
//! the stage's framebuffer binding, begin its pass, draw. An incomplete
//! binding is logged and that stage is skipped; the frame carries on.

use glam::{Mat4, Vec4};
use ssdo_gpu_shared::sampling;
use ssdo_gpu_shared::shaders;
use ssdo_gpu_shared::uniforms::{
    BlurParams, GeometryFrameUniforms, KernelUniforms, LightingUniforms, MixerParams,
    PerObjectUniforms, SkyboxUniforms, SsdoUniforms, MAX_STORED_DEPTH,
};
use ssdo_gpu_shared::MeshData;
use wgpu::util::DeviceExt;

use crate::backend::GpuMesh;
use crate::context::RenderContext;
use crate::environment::EnvironmentMap;
use crate::error::Result;
use crate::graph::{self, DrawKind, InputSource, PassStage, StageId, STAGES};
use crate::passes;
use crate::pipeline;
use crate::render_targets::{self, AttachmentDesc, AttachmentLayout, Incompleteness, RenderTargetRegistry};
use crate::scene::{Scene, SceneObject};
use crate::settings::RenderSettings;

fn uniform_buffer<T>(device: &wgpu::Device, label: &str) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: std::mem::size_of::<T>() as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn fragment_source(id: StageId) -> &'static str {
    match id {
        StageId::Lighting => shaders::LIGHTING_FRAG,
        StageId::SsdoDirect => shaders::SSDO_DIRECT_FRAG,
        StageId::SsdoIndirect => shaders::SSDO_INDIRECT_FRAG,
        StageId::DirectBlur | StageId::IndirectBlur => shaders::BLUR_FRAG,
        StageId::Mixer => shaders::MIXER_FRAG,
        StageId::Geometry => shaders::GEOMETRY_SHADER,
        StageId::Skybox => shaders::SKYBOX_SHADER,
    }
}

struct UniformBuffers {
    frame: wgpu::Buffer,
    lighting: wgpu::Buffer,
    ssdo_direct: wgpu::Buffer,
    ssdo_indirect: wgpu::Buffer,
    blur: wgpu::Buffer,
    skybox: wgpu::Buffer,
    mixer: wgpu::Buffer,
}

impl UniformBuffers {
    fn new(device: &wgpu::Device) -> Self {
        Self {
            frame: uniform_buffer::<GeometryFrameUniforms>(device, "Geometry Frame Uniforms"),
            lighting: uniform_buffer::<LightingUniforms>(device, "Lighting Uniforms"),
            ssdo_direct: uniform_buffer::<SsdoUniforms>(device, "SSDO Direct Uniforms"),
            ssdo_indirect: uniform_buffer::<SsdoUniforms>(device, "SSDO Indirect Uniforms"),
            blur: uniform_buffer::<BlurParams>(device, "Blur Params"),
            skybox: uniform_buffer::<SkyboxUniforms>(device, "Skybox Uniforms"),
            mixer: uniform_buffer::<MixerParams>(device, "Mixer Params"),
        }
    }

    /// Slot-0 uniform block of `id`. Both blur stages share one.
    fn for_stage(&self, id: StageId) -> &wgpu::Buffer {
        match id {
            StageId::Geometry => &self.frame,
            StageId::Lighting => &self.lighting,
            StageId::SsdoDirect => &self.ssdo_direct,
            StageId::SsdoIndirect => &self.ssdo_indirect,
            StageId::DirectBlur | StageId::IndirectBlur => &self.blur,
            StageId::Skybox => &self.skybox,
            StageId::Mixer => &self.mixer,
        }
    }
}

/// Pipeline and bind-group layout of one non-geometry stage.
struct StagePipeline {
    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
}

pub struct SsdoRenderer {
    settings: RenderSettings,

    frame_bgl: wgpu::BindGroupLayout,
    object_bgl: wgpu::BindGroupLayout,
    /// `None` when the adapter cannot render the geometry attachments.
    geometry_pipeline: Option<wgpu::RenderPipeline>,
    wireframe_pipeline: Option<wgpu::RenderPipeline>,
    /// Indexed like `STAGES`; `None` for the geometry stage and for stages
    /// writing a format the adapter cannot render.
    stage_pipelines: Vec<Option<StagePipeline>>,
    /// Attachment formats each stage's pipeline was built for.
    expected: Vec<AttachmentLayout>,

    uniforms: UniformBuffers,
    kernel_bg: wgpu::BindGroup,

    noise_texture: wgpu::Texture,
    noise_view: wgpu::TextureView,
    noise_side: u32,
    environment: EnvironmentMap,
    nearest_sampler: wgpu::Sampler,
    linear_sampler: wgpu::Sampler,
    cube_vbo: wgpu::Buffer,

    frame_bg: wgpu::BindGroup,
    stage_bgs: Vec<Option<wgpu::BindGroup>>,
    /// Last reported completeness failure per stage.
    incomplete: Vec<Option<Incompleteness>>,
}

impl SsdoRenderer {
    /// Builds every pipeline and uploads the kernel and noise tile.
    /// Shader or pipeline failures are returned as fatal errors.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ctx: &RenderContext,
        screen_format: wgpu::TextureFormat,
        environment: EnvironmentMap,
        settings: RenderSettings,
    ) -> Result<Self> {
        settings.validate()?;
        graph::validate(&STAGES)?;

        let kernel = sampling::generate_kernel(settings.kernel_size);
        let noise = sampling::generate_noise(settings.noise_size);
        let noise_side = settings.noise_side();
        log::info!(
            "Generated SSDO kernel ({} samples) and noise tile ({}x{})",
            kernel.len(),
            noise_side,
            noise_side
        );

        let features = device.features();
        let support = ctx.targets.support();
        let kernel_uniforms = KernelUniforms::from_kernel(&kernel);
        let kernel_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("SSDO Kernel"),
            contents: bytemuck::bytes_of(&kernel_uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });
        let (noise_texture, noise_view) =
            render_targets::create_noise_texture(device, queue, &noise, noise_side);

        let frame_bgl = pipeline::create_uniform_bgl(
            device,
            "Geometry Frame BGL",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let object_bgl = pipeline::create_uniform_bgl(
            device,
            "Per-Object BGL",
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        );
        let kernel_bgl =
            pipeline::create_uniform_bgl(device, "SSDO Kernel BGL", wgpu::ShaderStages::FRAGMENT);

        let expected: Vec<AttachmentLayout> = STAGES
            .iter()
            .map(|s| pipeline::attachment_layout(s, screen_format, &ctx.targets))
            .collect();
        let renderable: Vec<bool> = expected
            .iter()
            .zip(&STAGES)
            .map(|(layout, s)| {
                let ok = pipeline::layout_renderable(layout, support);
                if !ok {
                    log::warn!("{} writes a format this adapter cannot render; stage disabled", s.name);
                }
                ok
            })
            .collect();

        let geometry_layout = &expected[StageId::Geometry as usize];
        let geometry_pipeline = if renderable[StageId::Geometry as usize] {
            log::info!("Creating Geometry pipeline...");
            Some(pipeline::with_validation(device, "Geometry", || {
                pipeline::create_geometry_pipeline(
                    device,
                    &frame_bgl,
                    &object_bgl,
                    geometry_layout,
                    wgpu::PolygonMode::Fill,
                )
            })?)
        } else {
            None
        };
        let wireframe_pipeline = if geometry_pipeline.is_some()
            && features.contains(wgpu::Features::POLYGON_MODE_LINE)
        {
            log::info!("Creating Geometry wireframe pipeline...");
            Some(pipeline::with_validation(device, "Geometry Wireframe", || {
                pipeline::create_geometry_pipeline(
                    device,
                    &frame_bgl,
                    &object_bgl,
                    geometry_layout,
                    wgpu::PolygonMode::Line,
                )
            })?)
        } else {
            None
        };

        let mut stage_pipelines = Vec::with_capacity(STAGES.len());
        for ((s, layout), &ok) in STAGES.iter().zip(&expected).zip(&renderable) {
            let built = match s.draw {
                DrawKind::SceneMesh => None,
                _ if !ok => None,
                DrawKind::FullscreenTriangle => {
                    log::info!("Creating {} pipeline...", s.name);
                    let bgl = pipeline::create_stage_bgl(device, s);
                    let pipeline = pipeline::with_validation(device, s.name, || {
                        let mut layouts = vec![&bgl];
                        if s.uses_kernel {
                            layouts.push(&kernel_bgl);
                        }
                        pipeline::create_fullscreen_pipeline(
                            device,
                            s.name,
                            fragment_source(s.id),
                            &layouts,
                            layout,
                        )
                    })?;
                    Some(StagePipeline { pipeline, bgl })
                }
                DrawKind::SkyboxCube => {
                    log::info!("Creating {} pipeline...", s.name);
                    let bgl = pipeline::create_stage_bgl(device, s);
                    let pipeline = pipeline::with_validation(device, s.name, || {
                        pipeline::create_skybox_pipeline(device, &bgl, layout)
                    })?;
                    Some(StagePipeline { pipeline, bgl })
                }
            };
            stage_pipelines.push(built);
        }
        log::info!("All pipelines created successfully.");

        let kernel_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SSDO Kernel Bind Group"),
            layout: &kernel_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: kernel_buffer.as_entire_binding(),
            }],
        });

        let nearest_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Nearest Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let uniforms = UniformBuffers::new(device);
        let frame_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Geometry Frame Bind Group"),
            layout: &frame_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniforms.frame.as_entire_binding(),
            }],
        });

        let mut renderer = Self {
            settings,
            frame_bgl,
            object_bgl,
            geometry_pipeline,
            wireframe_pipeline,
            stage_pipelines,
            expected,
            uniforms,
            kernel_bg,
            noise_texture,
            noise_view,
            noise_side,
            environment,
            nearest_sampler,
            linear_sampler,
            cube_vbo: render_targets::create_skybox_cube_vbo(device),
            frame_bg,
            stage_bgs: Vec::new(),
            incomplete: vec![None; STAGES.len()],
        };
        renderer.stage_bgs = renderer.create_stage_bind_groups(device, &ctx.targets);
        log::info!(
            "SSDO pipeline created ({}x{})",
            ctx.targets.size().0,
            ctx.targets.size().1
        );
        Ok(renderer)
    }

    pub fn noise_side(&self) -> u32 {
        self.noise_side
    }

    pub fn noise_texture(&self) -> &wgpu::Texture {
        &self.noise_texture
    }

    pub fn supports_wireframe(&self) -> bool {
        self.wireframe_pipeline.is_some()
    }

    /// Uploads `mesh` and adds it to `scene` with its own uniform block.
    pub fn upload_object(
        &self,
        device: &wgpu::Device,
        scene: &mut Scene,
        mesh: &MeshData,
        transform: Mat4,
        albedo: Vec4,
    ) {
        let uniform_buffer = uniform_buffer::<PerObjectUniforms>(device, "Per-Object Uniforms");
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Per-Object Bind Group"),
            layout: &self.object_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        scene.objects.push(SceneObject {
            mesh: GpuMesh::upload(device, mesh),
            transform,
            albedo,
            uniform_buffer,
            bind_group,
        });
    }

    /// Rebuilds every bind group that references a target view. Call after
    /// `RenderContext::resize` reallocated the targets.
    pub fn on_targets_resized(&mut self, device: &wgpu::Device, targets: &RenderTargetRegistry) {
        self.stage_bgs = self.create_stage_bind_groups(device, targets);
        self.incomplete.iter_mut().for_each(|i| *i = None);
    }

    fn create_stage_bind_groups(
        &self,
        device: &wgpu::Device,
        targets: &RenderTargetRegistry,
    ) -> Vec<Option<wgpu::BindGroup>> {
        STAGES
            .iter()
            .zip(&self.stage_pipelines)
            .map(|(s, sp)| {
                sp.as_ref()
                    .map(|sp| self.create_stage_bind_group(device, targets, s, &sp.bgl))
            })
            .collect()
    }

    /// Bind group for `stage` in declaration order: uniform, inputs, samplers.
    fn create_stage_bind_group(
        &self,
        device: &wgpu::Device,
        targets: &RenderTargetRegistry,
        stage: &PassStage,
        layout: &wgpu::BindGroupLayout,
    ) -> wgpu::BindGroup {
        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: self.uniforms.for_stage(stage.id).as_entire_binding(),
        }];
        for input in stage.inputs {
            let view = match input.source {
                InputSource::Target(id) => targets.view(id),
                InputSource::Noise => &self.noise_view,
                InputSource::Environment => &self.environment.view,
            };
            entries.push(wgpu::BindGroupEntry {
                binding: input.unit,
                resource: wgpu::BindingResource::TextureView(view),
            });
        }
        let first_sampler = stage.inputs.len() as u32 + 1;
        entries.push(wgpu::BindGroupEntry {
            binding: first_sampler,
            resource: wgpu::BindingResource::Sampler(&self.nearest_sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: first_sampler + 1,
            resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
        });

        device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} Bind Group", stage.name)),
            layout,
            entries: &entries,
        })
    }

    fn write_uniforms(&self, queue: &wgpu::Queue, ctx: &RenderContext) {
        let s = &self.settings;
        let view = ctx.camera.compute_view_matrix();
        let projection = ctx.camera.compute_projection_matrix();
        let (width, height) = ctx.targets.size();

        let frame = GeometryFrameUniforms::new(projection, ctx.camera.near, ctx.camera.far, MAX_STORED_DEPTH);
        queue.write_buffer(&self.uniforms.frame, 0, bytemuck::bytes_of(&frame));
        for object in &ctx.scene.objects {
            queue.write_buffer(&object.uniform_buffer, 0, bytemuck::bytes_of(&object.uniforms(view)));
        }

        let light = ctx.scene.light.uniforms(view, s.ambient);
        queue.write_buffer(&self.uniforms.lighting, 0, bytemuck::bytes_of(&light));

        let ssdo = |strength: f32| SsdoUniforms {
            projection: projection.to_cols_array_2d(),
            inv_view: view.inverse().to_cols_array_2d(),
            radius: s.ssdo_radius,
            bias: s.ssdo_bias,
            strength,
            _pad1: 0.0,
        };
        queue.write_buffer(
            &self.uniforms.ssdo_direct,
            0,
            bytemuck::bytes_of(&ssdo(s.direct_strength)),
        );
        queue.write_buffer(
            &self.uniforms.ssdo_indirect,
            0,
            bytemuck::bytes_of(&ssdo(s.indirect_strength)),
        );

        let blur = BlurParams {
            texel_size: [1.0 / width as f32, 1.0 / height as f32],
            half_extent: s.blur_half_extent,
            _pad1: 0.0,
        };
        queue.write_buffer(&self.uniforms.blur, 0, bytemuck::bytes_of(&blur));

        let skybox = SkyboxUniforms::new(view, projection);
        queue.write_buffer(&self.uniforms.skybox, 0, bytemuck::bytes_of(&skybox));

        let mixer = MixerParams {
            mode: ctx.composite.index(),
            lighting_weight: s.weights.lighting,
            direct_weight: s.weights.direct,
            indirect_weight: s.weights.indirect,
        };
        queue.write_buffer(&self.uniforms.mixer, 0, bytemuck::bytes_of(&mixer));
    }

    /// Logs a completeness failure once per change. Returns whether the
    /// stage may be drawn.
    fn report_completeness(&mut self, index: usize, result: std::result::Result<(), Incompleteness>) -> bool {
        let name = STAGES[index].name;
        match result {
            Ok(()) => {
                if self.incomplete[index].take().is_some() {
                    log::info!("Framebuffer for stage {name} is complete again");
                }
                true
            }
            Err(reason) => {
                if self.incomplete[index].as_ref() != Some(&reason) {
                    log::warn!("Framebuffer incomplete for stage {name}: {reason}; skipping stage");
                    self.incomplete[index] = Some(reason);
                }
                false
            }
        }
    }

    /// Records all eight stages into `encoder`, ending with the mixer writing `screen`.
    pub fn render_frame(
        &mut self,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        ctx: &RenderContext,
        screen: &wgpu::Texture,
    ) {
        self.write_uniforms(queue, ctx);

        let screen_view = screen.create_view(&wgpu::TextureViewDescriptor::default());
        let screen_desc = AttachmentDesc {
            label: "Screen",
            format: screen.format(),
            width: screen.width(),
            height: screen.height(),
        };
        let clear = self.settings.clear_color;
        let screen_clear = wgpu::Color {
            r: clear.x as f64,
            g: clear.y as f64,
            b: clear.z as f64,
            a: 1.0,
        };

        for (index, stage) in STAGES.iter().enumerate() {
            let binding = ctx.targets.binding(stage, screen_desc);
            let complete = binding.check(&self.expected[index], ctx.targets.support());
            if !self.report_completeness(index, complete) {
                continue;
            }

            match stage.draw {
                DrawKind::SceneMesh => {
                    let pipeline = match (&self.wireframe_pipeline, &self.geometry_pipeline, ctx.wireframe) {
                        (Some(wireframe), _, true) => wireframe,
                        (_, Some(fill), _) => fill,
                        _ => continue,
                    };
                    passes::geometry::render_geometry_pass(
                        encoder,
                        &ctx.targets,
                        stage,
                        &screen_view,
                        pipeline,
                        &self.frame_bg,
                        &ctx.scene.objects,
                    );
                }
                DrawKind::FullscreenTriangle => {
                    let (Some(sp), Some(bg)) = (&self.stage_pipelines[index], &self.stage_bgs[index]) else {
                        continue;
                    };
                    passes::fullscreen::render_fullscreen_pass(
                        encoder,
                        &ctx.targets,
                        stage,
                        &screen_view,
                        screen_clear,
                        &sp.pipeline,
                        bg,
                        stage.uses_kernel.then_some(&self.kernel_bg),
                    );
                }
                DrawKind::SkyboxCube => {
                    let (Some(sp), Some(bg)) = (&self.stage_pipelines[index], &self.stage_bgs[index]) else {
                        continue;
                    };
                    passes::skybox::render_skybox_pass(
                        encoder,
                        &ctx.targets,
                        stage,
                        &screen_view,
                        &sp.pipeline,
                        bg,
                        &self.cube_vbo,
                    );
                }
            }
        }
    }

    /// Encodes and submits one frame.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        ctx: &RenderContext,
        screen: &wgpu::Texture,
    ) {
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("SSDO Frame Encoder"),
        });
        self.render_frame(queue, &mut encoder, ctx, screen);
        queue.submit(std::iter::once(encoder.finish()));
    }
}
